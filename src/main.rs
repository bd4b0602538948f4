use anyhow::Result;

use go_pairing::cli::{Cli, Command};
use go_pairing::{
    handle_completions, handle_import, handle_list, handle_pair, handle_register, handle_result, handle_standings,
    handle_unpair, interpret,
};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let cli = interpret();
    execute_command(cli)
}

fn execute_command(cli: Cli) -> Result<()> {
    let store = cli.store;
    match cli.command {
        Command::Import { file } => handle_import(store, &file),
        Command::List => handle_list(store),
        Command::Register { tournament, document } => handle_register(store, tournament, &document),
        Command::Pair {
            tournament,
            round,
            pairables,
        } => handle_pair(store, tournament, round, pairables),
        Command::Unpair { tournament, round } => handle_unpair(store, tournament, round),
        Command::Result {
            tournament,
            round,
            game,
            result,
        } => handle_result(store, tournament, round, game, &result),
        Command::Standings { tournament, round } => handle_standings(store, tournament, round),
        Command::Completions { shell } => handle_completions(shell),
    }
}

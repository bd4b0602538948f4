use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::domain::Id;

#[derive(Parser, Debug)]
#[command(author, version, about = "Go tournament pairing engine")]
pub struct Cli {
    /// Directory of stored tournaments (defaults to $PAIRING_STORE_PATH, then ./tournaments)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Import a tournament from a JSON document
    Import {
        /// Path of the document
        file: PathBuf,
    },
    /// List stored tournaments
    List,
    /// Register a player, or a team in team tournaments, from inline JSON
    Register {
        #[arg(short, long)]
        tournament: Id,
        /// JSON document, e.g. '{"name":"Doe","firstname":"Jane","rating":1500,"rank":"3k","country":"FR","club":"Paris"}'
        document: String,
    },
    /// Pair a round
    Pair {
        #[arg(short, long)]
        tournament: Id,
        #[arg(short, long)]
        round: u32,
        /// Comma separated ids to pair (defaults to every available competitor)
        #[arg(short, long, value_delimiter = ',')]
        pairables: Option<Vec<Id>>,
    },
    /// Delete the games of the last round
    Unpair {
        #[arg(short, long)]
        tournament: Id,
        #[arg(short, long)]
        round: u32,
    },
    /// Record the result of a game
    Result {
        #[arg(short, long)]
        tournament: Id,
        #[arg(short, long)]
        round: u32,
        #[arg(short, long)]
        game: Id,
        /// black, white, jigo, cancelled, both_win, both_loss or none
        result: String,
    },
    /// Show standings after a round
    Standings {
        #[arg(short, long)]
        tournament: Id,
        /// Round number (optional, defaults to the last paired round)
        #[arg(short, long)]
        round: Option<u32>,
    },
    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_pool_is_comma_separated() {
        let cli = Cli::parse_from(["go_pairing", "--store", "/tmp/t", "pair", "-t", "3", "-r", "2", "-p", "4,5,9"]);
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/t")));
        assert_eq!(
            cli.command,
            Command::Pair {
                tournament: 3,
                round: 2,
                pairables: Some(vec![4, 5, 9])
            }
        );
    }

    #[test]
    fn test_standings_round_is_optional() {
        let cli = Cli::parse_from(["go_pairing", "standings", "--tournament", "1"]);
        assert_eq!(cli.store, None);
        assert_eq!(cli.command, Command::Standings { tournament: 1, round: None });
    }
}

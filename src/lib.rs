pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod events;
pub mod pairing;
pub mod services;
pub mod store;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use cli::Cli;
use colored::Colorize;
use serde_json::Value;

use crate::config::settings::AppConfig;
use crate::domain::{display_rank, Game, GameResult, Id, Tournament, BYE_ID};
use crate::errors::parse_context;
use crate::events::LogSink;
use crate::services::TournamentService;
use crate::store::{FileStore, Store};

pub fn interpret() -> Cli {
    Cli::parse()
}

fn open_service(store: Option<PathBuf>) -> Result<TournamentService<FileStore>> {
    let config = AppConfig::new().with_store_path(store);
    let store = FileStore::open(&config.store.path)?;
    Ok(TournamentService::new(store, Box::new(LogSink), config.pairing))
}

pub fn handle_import(store: Option<PathBuf>, file: &Path) -> Result<()> {
    let service = open_service(store)?;
    let json = std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let doc: Value = serde_json::from_str(&json).with_context(|| parse_context("tournament document"))?;
    let id = service.import(doc)?;
    println!("{} tournament #{}", "Imported".green().bold(), id);
    Ok(())
}

pub fn handle_list(store: Option<PathBuf>) -> Result<()> {
    let service = open_service(store)?;
    for id in service.store().list()? {
        let tournament = service.tournament(id)?;
        println!(
            "{:>4}  {}  ({}/{} rounds paired)",
            id,
            tournament.info.name.bold(),
            tournament.last_round(),
            tournament.rounds
        );
    }
    Ok(())
}

pub fn handle_register(store: Option<PathBuf>, tournament_id: Id, document: &str) -> Result<()> {
    let service = open_service(store)?;
    let doc: Value = serde_json::from_str(document).with_context(|| parse_context("registration"))?;
    if service.tournament(tournament_id)?.is_team() {
        let team = service.add_team(tournament_id, &doc)?;
        println!("{} team #{}", "Registered".green().bold(), team["id"]);
    } else {
        let player = service.add_player(tournament_id, &doc)?;
        println!(
            "{} player #{} {} ({})",
            "Registered".green().bold(),
            player.id,
            player.name_seed(" "),
            display_rank(player.rank)
        );
    }
    Ok(())
}

pub fn handle_pair(store: Option<PathBuf>, tournament_id: Id, round: u32, pairables: Option<Vec<Id>>) -> Result<()> {
    let service = open_service(store)?;
    let games = service.pair(tournament_id, round, pairables)?;
    let tournament = service.tournament(tournament_id)?;
    println!("{} {} games in round {}", "Paired".green().bold(), games.len(), round);
    print_games(&tournament, &games);
    Ok(())
}

pub fn handle_unpair(store: Option<PathBuf>, tournament_id: Id, round: u32) -> Result<()> {
    let service = open_service(store)?;
    let games = service.unpair(tournament_id, round)?;
    println!("{} {} games of round {}", "Deleted".yellow().bold(), games.len(), round);
    Ok(())
}

pub fn handle_result(store: Option<PathBuf>, tournament_id: Id, round: u32, game_id: Id, result: &str) -> Result<()> {
    let service = open_service(store)?;
    service.set_result(tournament_id, round, game_id, parse_result(result)?)?;
    println!("{} result of game #{}", "Recorded".green().bold(), game_id);
    Ok(())
}

pub fn handle_standings(store: Option<PathBuf>, tournament_id: Id, round: Option<u32>) -> Result<()> {
    let service = open_service(store)?;
    let tournament = service.tournament(tournament_id)?;
    let round = round.unwrap_or_else(|| tournament.last_round());
    let standings = service.standings(tournament_id, round)?;

    let criteria: Vec<String> = tournament.criteria().iter().map(|c| format!("{:?}", c).to_uppercase()).collect();
    println!("{:>5}  {:<30} {}", "#", "Name", criteria.join("\t").bold());
    for row in standings {
        let values: Vec<String> = row.values.iter().map(|v| format!("{}", v)).collect();
        println!("{:>5}  {:<30} {}", row.place, row.name, values.join("\t"));
    }
    Ok(())
}

pub fn handle_completions(shell: Shell) -> Result<()> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
    Ok(())
}

/// Accepts result tokens case-insensitively, `none` clearing the result
fn parse_result(token: &str) -> Result<Option<GameResult>> {
    if token.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    let result = serde_json::from_value(Value::String(token.to_uppercase()))
        .with_context(|| format!("Unknown game result: {}", token))?;
    Ok(Some(result))
}

fn print_games(tournament: &Tournament, games: &[Game]) {
    let label = |id: Id| -> String {
        if id == BYE_ID {
            return "bye".dimmed().to_string();
        }
        tournament
            .pairable(id)
            .map(|p| format!("#{} {}", id, p.name_seed(" ")))
            .unwrap_or_else(|_| format!("#{}", id))
    };
    let mut games = games.to_vec();
    games.sort_by_key(|g| (g.table == 0, g.table));
    for game in games {
        let handicap = if game.handicap > 0 {
            format!(" h{}", game.handicap)
        } else {
            String::new()
        };
        println!(
            "{:>4}  {} (W) - {} (B){}",
            game.table,
            label(game.white),
            label(game.black),
            handicap
        );
    }
}

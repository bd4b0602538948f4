use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{json, Value};

use go_pairing::config::settings::PairingSettings;
use go_pairing::domain::{GameResult, Id, BYE_ID};
use go_pairing::events::{Event, RecordingSink};
use go_pairing::services::TournamentService;
use go_pairing::store::MemoryStore;

fn service() -> (TournamentService<MemoryStore>, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let service = TournamentService::new(MemoryStore::new(), Box::new(sink.clone()), PairingSettings::default());
    (service, sink)
}

fn tournament(pairing: Value, rounds: u32) -> Value {
    json!({
        "type": "INDIVIDUAL",
        "name": "Autumn Open",
        "shortName": "autumn",
        "startDate": "2024-10-12",
        "endDate": "2024-10-13",
        "country": "FR",
        "location": "Toulouse",
        "timeSystem": {"type": "CANADIAN", "mainTime": 3600, "byoyomi": 300, "stones": 15},
        "rounds": rounds,
        "pairing": pairing
    })
}

fn register(service: &TournamentService<MemoryStore>, id: Id, ranks: &[&str]) -> Vec<Id> {
    ranks
        .iter()
        .enumerate()
        .map(|(index, rank)| {
            let doc = json!({
                "name": format!("Player{}", index),
                "firstname": "Test",
                "rating": 1500,
                "rank": rank,
                "country": "FR",
                "club": format!("club{}", index)
            });
            service.add_player(id, &doc).unwrap().id
        })
        .collect()
}

/// Pairs every round, white winning every real game
fn play_out(service: &TournamentService<MemoryStore>, id: Id, rounds: u32) -> Vec<(Id, Id)> {
    let mut pairs = Vec::new();
    for round in 1..=rounds {
        let games = service.pair(id, round, None).unwrap();
        for game in games {
            service.set_result(id, round, game.id, Some(GameResult::White)).unwrap();
            pairs.push((game.black.min(game.white), game.black.max(game.white)));
        }
    }
    pairs
}

#[test]
fn swiss_rounds_never_repeat_a_pairing() {
    let (service, sink) = service();
    let id = service.import(tournament(json!({"system": {"type": "SWISS"}}), 3)).unwrap();
    register(&service, id, &["5k", "4k", "3k", "2k", "1k", "1d"]);

    let pairs = play_out(&service, id, 3);
    assert_eq!(pairs.len(), 9);
    let distinct: HashSet<_> = pairs.iter().collect();
    assert_eq!(distinct.len(), 9);

    let standings = service.standings(id, 3).unwrap();
    assert_eq!(standings.len(), 6);
    assert_eq!(standings[0].place, 1);
    assert!(standings.windows(2).all(|w| w[0].place <= w[1].place));
    let wins: f64 = standings.iter().map(|row| row.values[0]).sum();
    assert_eq!(wins, 9.0);

    let added = sink.events().iter().filter(|e| **e == Event::GamesAdded).count();
    assert_eq!(added, 3);
}

#[test]
fn the_bye_goes_to_a_different_player_each_round() {
    let (service, _) = service();
    let id = service.import(tournament(json!({"system": {"type": "SWISS"}}), 3)).unwrap();
    register(&service, id, &["5k", "4k", "3k", "2k", "1k"]);

    let pairs = play_out(&service, id, 3);
    let bye_receivers: Vec<Id> = pairs
        .iter()
        .filter(|(a, _)| *a == BYE_ID)
        .map(|(_, b)| *b)
        .collect();
    assert_eq!(bye_receivers.len(), 3);
    assert_eq!(bye_receivers.iter().collect::<HashSet<_>>().len(), 3);

    let tournament = service.tournament(id).unwrap();
    for round in 1..=3 {
        let games = tournament.games(round).unwrap();
        let bye = games.values().find(|g| g.is_bye()).unwrap();
        assert_eq!(bye.table, 0);
        assert_eq!(bye.black, BYE_ID);
        let mut tables: Vec<u32> = games.values().filter(|g| !g.is_bye()).map(|g| g.table).collect();
        tables.sort();
        assert_eq!(tables, vec![1, 2]);
    }
}

#[test]
fn mcmahon_groups_players_by_bar() {
    let (service, _) = service();
    let pairing = json!({"system": {"type": "MCMAHON", "mmFloor": -20, "mmBar": 0, "mmsCorrection": 0}});
    let id = service.import(tournament(pairing, 2)).unwrap();
    let ids = register(&service, id, &["3d", "2d", "10k", "12k"]);

    let games = service.pair(id, 1, None).unwrap();
    assert_eq!(games.len(), 2);
    for game in &games {
        let strong = ids[..2].contains(&game.black) && ids[..2].contains(&game.white);
        let weak = ids[2..].contains(&game.black) && ids[2..].contains(&game.white);
        assert!(strong || weak, "{:?} crosses the bar", game);
    }
}

#[test]
fn partial_round_completes_the_same_round() {
    let (service, _) = service();
    let id = service.import(tournament(json!({"system": {"type": "SWISS"}}), 2)).unwrap();
    let ids = register(&service, id, &["5k", "4k", "3k", "2k"]);

    let first = service.pair(id, 1, Some(ids[..2].to_vec())).unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].table, 1);

    let rest = service.pair(id, 1, None).unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].table, 2);
    assert!(rest[0].involves(ids[2]) && rest[0].involves(ids[3]));

    let err = service.pair(id, 1, Some(vec![ids[0]])).unwrap_err();
    assert!(err.to_string().contains("already paired"));
    assert_eq!(service.tournament(id).unwrap().games(1).unwrap().len(), 2);
}

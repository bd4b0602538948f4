use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::game::Game;
use super::pairable::{Id, Player, Team, BYE_ID};
use super::params::PairingConfig;
use super::tournament::{Tournament, TournamentInfo};
use crate::errors::{PairingError, PairingResult};

const PLAYER_REQUIRED: [&str; 6] = ["name", "firstname", "rating", "rank", "country", "club"];
const TEAM_REQUIRED: [&str; 2] = ["name", "players"];

/// Key/value form of a tournament, used for storage and exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentDocument {
    #[serde(default)]
    pub id: Id,
    #[serde(flatten)]
    pub info: TournamentInfo,
    pub rounds: u32,
    pub pairing: PairingConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub players: Vec<Player>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub teams: Vec<Team>,
    /// Games of each paired round, round 1 first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub games: Vec<Vec<Game>>,
}

impl TryFrom<TournamentDocument> for Tournament {
    type Error = PairingError;

    fn try_from(doc: TournamentDocument) -> PairingResult<Self> {
        let mut tournament = Tournament::new(doc.id, doc.info, doc.rounds, doc.pairing)?;
        if !tournament.is_team() && !doc.teams.is_empty() {
            return Err(PairingError::config(format!(
                "{:?} tournaments have no teams",
                tournament.info.kind
            )));
        }
        for player in doc.players {
            tournament.add_player(player)?;
        }
        for team in doc.teams {
            tournament.add_team(team)?;
        }

        if doc.games.len() > tournament.rounds as usize {
            return Err(PairingError::bad_document("more paired rounds than configured rounds"));
        }
        for round_games in doc.games {
            let mut round = BTreeMap::new();
            for game in round_games {
                for side in [game.black, game.white] {
                    if side != BYE_ID {
                        tournament.pairable(side)?;
                    }
                }
                round.insert(game.id, game);
            }
            tournament.games.push(round);
        }
        Ok(tournament)
    }
}

impl From<Tournament> for TournamentDocument {
    fn from(tournament: Tournament) -> Self {
        let players = tournament.players().cloned().collect();
        let teams = tournament.teams().cloned().collect();
        let games = tournament
            .games
            .iter()
            .map(|round| round.values().cloned().collect())
            .collect();
        Self {
            id: tournament.id,
            info: tournament.info,
            rounds: tournament.rounds,
            pairing: tournament.pairing,
            players,
            teams,
            games,
        }
    }
}

/// Overlays `doc` on the document of `default`, forces `id` and checks
/// that every required field ended up present.
fn merge_document<T: Serialize>(
    doc: &Value,
    default: Option<&T>,
    id: Id,
    required: &[&str],
) -> PairingResult<Value> {
    let fields = doc
        .as_object()
        .ok_or_else(|| PairingError::bad_document("expecting an object"))?;

    let mut merged = match default {
        Some(previous) => serde_json::to_value(previous)?,
        None => Value::Object(Map::new()),
    };
    let target = merged
        .as_object_mut()
        .ok_or_else(|| PairingError::bad_document("expecting an object"))?;
    for (key, value) in fields {
        if key != "id" {
            target.insert(key.clone(), value.clone());
        }
    }
    target.insert("id".to_string(), Value::from(id));

    if let Some(missing) = required.iter().find(|key| !target.contains_key(**key)) {
        return Err(PairingError::bad_document(format!("missing required field: {}", missing)));
    }
    Ok(merged)
}

impl Player {
    /// Creates a player from `doc`, or updates `default` with the fields
    /// present in `doc`.
    pub fn from_document(doc: &Value, default: Option<&Player>, id: Id) -> PairingResult<Player> {
        let merged = merge_document(doc, default, id, &PLAYER_REQUIRED)?;
        Ok(serde_json::from_value(merged)?)
    }
}

impl Team {
    /// Same as [`Player::from_document`]; member ids are checked by the
    /// tournament when the team is registered.
    pub fn from_document(doc: &Value, default: Option<&Team>, id: Id) -> PairingResult<Team> {
        let merged = merge_document(doc, default, id, &TEAM_REQUIRED)?;
        Ok(serde_json::from_value(merged)?)
    }
}

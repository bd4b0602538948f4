use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::{PairingError, PairingResult};

pub type Id = i32;

/// Rank of a 30 kyu
pub const MIN_RANK: i32 = -30;
pub const MAX_RANK: i32 = 20;

/// Id reserved for the bye sentinel, never allocated by the store
pub const BYE_ID: Id = 0;

/// Rating and rank a team reports while it has no members
pub const TEAM_DEFAULT_RATING: i32 = 0;
pub const TEAM_DEFAULT_RANK: i32 = 0;

/// External rating databases a player can be registered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseId {
    Aga,
    Egf,
    Ffg,
}

/// An individual competitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: Id,
    pub name: String,
    pub firstname: String,
    pub rating: i32,
    #[serde(deserialize_with = "deserialize_rank")]
    pub rank: i32,
    pub country: String,
    pub club: String,
    /// Rounds the player asked not to be paired in
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub skip: BTreeSet<u32>,
    #[serde(flatten)]
    pub external_ids: BTreeMap<DatabaseId, String>,
}

impl Player {
    pub fn name_seed(&self, separator: &str) -> String {
        format!("{}{}{}", self.name, separator, self.firstname)
    }
}

/// A team of registered players, competing as one pairable.
///
/// Only the member ids are stored. Rating, rank, club and country are
/// derived from the members every time they are read, see [`Pairable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: Id,
    pub name: String,
    pub players: BTreeSet<Id>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub skip: BTreeSet<u32>,
}

/// Borrowed view over anything that can sit on one side of a board.
#[derive(Debug, Clone)]
pub enum Pairable<'a> {
    Player(&'a Player),
    Team {
        team: &'a Team,
        members: Vec<&'a Player>,
    },
    Bye,
}

impl<'a> Pairable<'a> {
    pub fn id(&self) -> Id {
        match self {
            Pairable::Player(player) => player.id,
            Pairable::Team { team, .. } => team.id,
            Pairable::Bye => BYE_ID,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Pairable::Player(player) => &player.name,
            Pairable::Team { team, .. } => &team.name,
            Pairable::Bye => "bye",
        }
    }

    pub fn is_bye(&self) -> bool {
        matches!(self, Pairable::Bye)
    }

    pub fn rating(&self) -> i32 {
        match self {
            Pairable::Player(player) => player.rating,
            Pairable::Team { members, .. } => {
                mean_rounded(members.iter().map(|p| p.rating)).unwrap_or(TEAM_DEFAULT_RATING)
            }
            Pairable::Bye => 0,
        }
    }

    pub fn rank(&self) -> i32 {
        match self {
            Pairable::Player(player) => player.rank,
            Pairable::Team { members, .. } => {
                mean_rounded(members.iter().map(|p| p.rank)).unwrap_or(TEAM_DEFAULT_RANK)
            }
            // The bye always ranks below everybody
            Pairable::Bye => MIN_RANK - 1,
        }
    }

    pub fn club(&self) -> Option<&str> {
        match self {
            Pairable::Player(player) => Some(&player.club),
            Pairable::Team { members, .. } => unanimous(members.iter().map(|p| p.club.as_str())),
            Pairable::Bye => None,
        }
    }

    pub fn country(&self) -> Option<&str> {
        match self {
            Pairable::Player(player) => Some(&player.country),
            Pairable::Team { members, .. } => {
                unanimous(members.iter().map(|p| p.country.as_str()))
            }
            Pairable::Bye => None,
        }
    }

    pub fn skips(&self, round: u32) -> bool {
        match self {
            Pairable::Player(player) => player.skip.contains(&round),
            Pairable::Team { team, .. } => team.skip.contains(&round),
            Pairable::Bye => false,
        }
    }

    pub fn name_seed(&self, separator: &str) -> String {
        match self {
            Pairable::Player(player) => player.name_seed(separator),
            _ => self.name().to_string(),
        }
    }

    /// Document form of the pairable, teams carrying their derived fields.
    /// Fails for the bye, which only exists to even out a round's pool.
    pub fn to_document(&self) -> PairingResult<Value> {
        match self {
            Pairable::Player(player) => Ok(serde_json::to_value(player)?),
            Pairable::Team { team, .. } => {
                let mut doc = serde_json::to_value(team)?;
                if let Value::Object(fields) = &mut doc {
                    fields.insert("rating".to_string(), self.rating().into());
                    fields.insert("rank".to_string(), self.rank().into());
                    fields.insert("club".to_string(), self.club().into());
                    fields.insert("country".to_string(), self.country().into());
                }
                Ok(doc)
            }
            Pairable::Bye => Err(PairingError::NotSerializable),
        }
    }
}

impl PartialEq for Pairable<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Pairable<'_> {}

/// Round half up, in both directions: -1.5 gives -1, 1.5 gives 2.
pub fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

fn mean_rounded(values: impl Iterator<Item = i32>) -> Option<i32> {
    let (sum, count) = values.fold((0i64, 0usize), |(sum, count), v| (sum + v as i64, count + 1));
    if count == 0 {
        return None;
    }
    Some(round_half_up(sum as f64 / count as f64))
}

fn unanimous<'s>(mut values: impl Iterator<Item = &'s str>) -> Option<&'s str> {
    let first = values.next()?;
    values.all(|v| v == first).then_some(first)
}

// Rank notation

fn rank_regex() -> PairingResult<&'static Regex> {
    static RANK_REGEX: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    RANK_REGEX
        .get_or_init(|| Regex::new(r"^(\d+)([kKdD])$"))
        .as_ref()
        .map_err(|e| PairingError::invariant(format!("Failed to compile rank regex: {}", e)))
}

fn check_rank_bounds(rank: i32, shown: &dyn std::fmt::Display) -> PairingResult<i32> {
    if (MIN_RANK..=MAX_RANK).contains(&rank) {
        Ok(rank)
    } else {
        Err(PairingError::bad_document(format!(
            "rank {} outside {}..={}",
            shown, MIN_RANK, MAX_RANK
        )))
    }
}

/// Parse a rank such as `"5k"` or `"3d"` into its integer form.
///
/// Kyu grades map to `-digits`, dan grades to `digits - 1`; dan grades
/// are limited to single digits.
pub fn parse_rank(rank: &str) -> PairingResult<i32> {
    let invalid = || PairingError::bad_document(format!("invalid rank: {}", rank));
    let captures = rank_regex()?.captures(rank.trim()).ok_or_else(invalid)?;
    let level: i32 = captures[1].parse().map_err(|_| invalid())?;
    match &captures[2] {
        "k" | "K" => check_rank_bounds(-level, &rank),
        _ if (1..=9).contains(&level) => Ok(level - 1),
        _ => Err(invalid()),
    }
}

pub fn display_rank(rank: i32) -> String {
    if rank < 0 {
        format!("{}k", -rank)
    } else {
        format!("{}d", rank + 1)
    }
}

/// Accepts either the integer rank or its `"5k"` / `"1d"` notation.
pub fn rank_from_value(value: &Value) -> PairingResult<i32> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| PairingError::bad_document(format!("invalid rank: {}", n)))
            .and_then(|rank| check_rank_bounds(rank, n)),
        Value::String(s) => parse_rank(s),
        other => Err(PairingError::bad_document(format!("invalid rank: {}", other))),
    }
}

fn deserialize_rank<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    rank_from_value(&value).map_err(serde::de::Error::custom)
}

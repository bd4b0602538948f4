use serde::{Deserialize, Serialize};

use super::pairable::{Id, BYE_ID};

/// Outcome of a played game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameResult {
    Black,
    White,
    Jigo,
    Cancelled,
    BothWin,
    BothLoss,
}

/// One board of one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: Id,
    /// Board number, starting at 1; bye games use 0
    pub table: u32,
    pub black: Id,
    pub white: Id,
    #[serde(default)]
    pub handicap: u32,
    #[serde(default)]
    pub result: Option<GameResult>,
}

impl Game {
    pub fn new(id: Id, table: u32, black: Id, white: Id, handicap: u32) -> Self {
        Self {
            id,
            table,
            black,
            white,
            handicap,
            result: None,
        }
    }

    pub fn involves(&self, id: Id) -> bool {
        self.black == id || self.white == id
    }

    pub fn is_bye(&self) -> bool {
        self.involves(BYE_ID)
    }

    /// The other side of the board, if `id` plays in this game
    pub fn opponent_of(&self, id: Id) -> Option<Id> {
        if self.black == id {
            Some(self.white)
        } else if self.white == id {
            Some(self.black)
        } else {
            None
        }
    }

    /// Id of the winner, for decided games only
    pub fn winner(&self) -> Option<Id> {
        match self.result {
            Some(GameResult::Black) => Some(self.black),
            Some(GameResult::White) => Some(self.white),
            _ => None,
        }
    }
}

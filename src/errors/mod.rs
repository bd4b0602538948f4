use thiserror::Error;

use crate::domain::Id;

/// Errors raised by the pairing engine and the tournament model.
///
/// Every variant except [`PairingError::Invariant`] is caller-facing: the
/// operation was rejected and the tournament was left untouched.
/// `Invariant` reports a defect in the engine itself and must never be
/// silently recovered from.
#[derive(Debug, Error)]
pub enum PairingError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Precondition(String),

    #[error("{kind} #{id} not found")]
    Lookup { kind: &'static str, id: Id },

    #[error("invalid document: {0}")]
    Serialization(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("bye player should never be serialized")]
    NotSerializable,

    #[error("store conflict: {0}")]
    Store(String),

    #[error("internal invariant violated: {0}")]
    Invariant(String),
}

impl PairingError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    pub fn bad_document(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    pub fn unknown_player(id: Id) -> Self {
        Self::Lookup { kind: "player", id }
    }

    pub fn unknown_team(id: Id) -> Self {
        Self::Lookup { kind: "team", id }
    }

    pub fn unknown_game(id: Id) -> Self {
        Self::Lookup { kind: "game", id }
    }

    pub fn unknown_tournament(id: Id) -> Self {
        Self::Lookup { kind: "tournament", id }
    }

    /// True when the error denotes an engine defect rather than a rejected request.
    pub fn is_defect(&self) -> bool {
        matches!(self, Self::Invariant(_))
    }
}

pub type PairingResult<T> = Result<T, PairingError>;

/// Add context to store errors
pub fn store_context(operation: &str, id: Id) -> String {
    format!("Failed to {} tournament #{}", operation, id)
}

/// Add context to parse errors
pub fn parse_context(data_type: &str) -> String {
    format!("Failed to parse {}", data_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_invariants_are_defects() {
        assert!(PairingError::invariant("odd pool").is_defect());
        assert!(!PairingError::precondition("too many rounds").is_defect());
        assert!(!PairingError::unknown_player(3).is_defect());
    }

    #[test]
    fn test_lookup_message() {
        let err = PairingError::unknown_team(12);
        assert_eq!(err.to_string(), "team #12 not found");
    }
}

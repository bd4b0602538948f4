pub mod document;
pub mod game;
pub mod pairable;
pub mod params;
pub mod tournament;

pub use document::TournamentDocument;
pub use game::{Game, GameResult};
pub use pairable::{
    display_rank, parse_rank, round_half_up, DatabaseId, Id, Pairable, Player, Team, BYE_ID,
    MAX_RANK, MIN_RANK,
};
pub use params::{
    BaseCritParams, Criterion, GeographicalParams, HandicapParams, LonePairablePolicy,
    MainCritParams, PairingConfig, PairingParams, PairingSystem, PlacementParams,
};
pub use tournament::{Roster, Rules, Standing, TimeSystem, Tournament, TournamentInfo, TournamentType};

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::{BTreeMap, BTreeSet};

    use super::{Id, Player};

    pub fn player(id: Id, rank: i32, club: &str, country: &str) -> Player {
        Player {
            id,
            name: format!("Player{}", id),
            firstname: "Test".to_string(),
            rating: 1000 + rank * 100,
            rank,
            country: country.to_string(),
            club: club.to_string(),
            skip: BTreeSet::new(),
            external_ids: BTreeMap::new(),
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::errors::{PairingError, PairingResult};

/// Pairing system of a tournament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PairingSystem {
    Swiss,
    #[serde(rename = "MCMAHON", rename_all = "camelCase")]
    McMahon {
        mm_floor: i32,
        mm_bar: i32,
        /// Tournament specific shift applied to every McMahon base score
        #[serde(default)]
        mms_correction: f64,
    },
}

impl PairingSystem {
    pub fn validate(&self) -> PairingResult<()> {
        match self {
            PairingSystem::Swiss => Ok(()),
            PairingSystem::McMahon { mm_floor, mm_bar, .. } if mm_bar <= mm_floor => Err(
                PairingError::config(format!("McMahon bar ({}) must be above floor ({})", mm_bar, mm_floor)),
            ),
            PairingSystem::McMahon { .. } => Ok(()),
        }
    }
}

/// Standings and placement criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Criterion {
    /// Number of wins
    Nbw,
    /// McMahon score
    Mms,
    Sos,
    Sosos,
    Sodos,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BaseCritParams {
    /// Added when both sides already met
    pub avoid_duplicating_game: f64,
    /// Added per unit of shared color imbalance
    pub color_balance_weight: f64,
}

impl Default for BaseCritParams {
    fn default() -> Self {
        Self {
            avoid_duplicating_game: 5e8,
            color_balance_weight: 5e3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MainCritParams {
    /// Per point of main score difference
    pub score_weight: f64,
    /// Per step of placement distance
    pub placement_weight: f64,
    /// Per step away from a split-and-slip pairing inside a score group,
    /// kept below `placement_weight`
    pub seeding_weight: f64,
    /// Main score credited for each round a competitor did not play (McMahon)
    pub mms_value_absent: f64,
}

impl Default for MainCritParams {
    fn default() -> Self {
        Self {
            score_weight: 1e5,
            placement_weight: 1e3,
            seeding_weight: 1e2,
            mms_value_absent: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeographicalParams {
    pub same_club_weight: f64,
    pub same_country_weight: f64,
}

impl Default for GeographicalParams {
    fn default() -> Self {
        Self {
            same_club_weight: 1e2,
            same_country_weight: 5e1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HandicapParams {
    /// Per handicap stone given
    pub weight: f64,
    /// Derive pseudo ranks from the main score instead of the declared rank
    pub use_mms: bool,
    /// Ranks above the threshold count as the threshold
    pub rank_threshold: i32,
    /// Rank difference granted before handicap stones start
    pub correction: i32,
    /// Maximum handicap; 0 disables handicap games
    pub ceiling: u32,
}

impl Default for HandicapParams {
    fn default() -> Self {
        Self {
            weight: 1e4,
            use_mms: false,
            rank_threshold: 0,
            correction: 1,
            ceiling: 0,
        }
    }
}

impl HandicapParams {
    pub fn enabled(&self) -> bool {
        self.ceiling > 0
    }

    /// Stones given between two pseudo ranks
    pub fn handicap(&self, rank_a: i32, rank_b: i32) -> u32 {
        if !self.enabled() {
            return 0;
        }
        let a = rank_a.min(self.rank_threshold);
        let b = rank_b.min(self.rank_threshold);
        let stones = ((a - b).abs() - self.correction).max(0) as u32;
        stones.min(self.ceiling)
    }
}

/// What to do with a round whose pool holds a single competitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LonePairablePolicy {
    /// Commit the game against the bye
    #[default]
    ByeGame,
    /// Commit an empty round
    NoGame,
}

/// Weights and rules shared by every solver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PairingParams {
    pub base: BaseCritParams,
    pub main: MainCritParams,
    pub geo: GeographicalParams,
    pub handicap: HandicapParams,
    pub lone_pairable: LonePairablePolicy,
}

/// Largest weight a document may set; keeps summed edge weights inside the
/// matching's integer range
pub const MAX_WEIGHT: f64 = 1e9;

impl PairingParams {
    pub fn validate(&self) -> PairingResult<()> {
        let weights = [
            ("avoidDuplicatingGame", self.base.avoid_duplicating_game),
            ("colorBalanceWeight", self.base.color_balance_weight),
            ("scoreWeight", self.main.score_weight),
            ("placementWeight", self.main.placement_weight),
            ("seedingWeight", self.main.seeding_weight),
            ("mmsValueAbsent", self.main.mms_value_absent),
            ("sameClubWeight", self.geo.same_club_weight),
            ("sameCountryWeight", self.geo.same_country_weight),
            ("handicap weight", self.handicap.weight),
        ];
        for (name, value) in weights {
            if !value.is_finite() || !(0.0..=MAX_WEIGHT).contains(&value) {
                return Err(PairingError::config(format!(
                    "{} must lie in 0..={:e}, got {}",
                    name, MAX_WEIGHT, value
                )));
            }
        }
        Ok(())
    }
}

/// Criteria used to place competitors and to build standings
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementParams {
    pub criteria: Vec<Criterion>,
}

impl PlacementParams {
    /// Criteria are fixed by the pairing system
    pub fn for_system(system: &PairingSystem) -> Self {
        let main = match system {
            PairingSystem::McMahon { .. } => Criterion::Mms,
            PairingSystem::Swiss => Criterion::Nbw,
        };
        Self {
            criteria: vec![main, Criterion::Sos, Criterion::Sosos],
        }
    }
}

/// Pairing section of a tournament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingConfig {
    pub system: PairingSystem,
    #[serde(flatten)]
    pub params: PairingParams,
}

impl PairingConfig {
    pub fn new(system: PairingSystem) -> Self {
        Self {
            system,
            params: PairingParams::default(),
        }
    }

    pub fn validate(&self) -> PairingResult<()> {
        self.system.validate()?;
        self.params.validate()
    }

    pub fn placement(&self) -> PlacementParams {
        PlacementParams::for_system(&self.system)
    }
}

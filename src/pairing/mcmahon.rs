use crate::domain::{round_half_up, Pairable, MIN_RANK};
use crate::errors::{PairingError, PairingResult};
use crate::pairing::solver::{BaseSolver, Solver, SolverContext};

/// Offset lifting every McMahon score above zero
pub const MMS_ZERO: f64 = 30.0;

/// Margins of the admissible main score range around floor and bar
const SCORE_MIN_OFFSET: i32 = -1;
const SCORE_MAX_OFFSET: i32 = 2;

/// McMahon system: competitors start from a score banded by their rank
pub struct McMahonSolver<'a> {
    base: BaseSolver<'a>,
    mm_floor: i32,
    mm_bar: i32,
    mms_correction: f64,
}

impl<'a> McMahonSolver<'a> {
    pub fn new(context: SolverContext<'a>, mm_floor: i32, mm_bar: i32, mms_correction: f64) -> PairingResult<Self> {
        if mm_bar <= mm_floor {
            return Err(PairingError::config(format!(
                "McMahon bar ({}) must be above floor ({})",
                mm_bar, mm_floor
            )));
        }

        let round = context.round;
        let absent_value = context.params.main.mms_value_absent;
        let base = BaseSolver::new(context, |pairable, history| {
            let id = pairable.id();
            mm_base(pairable.rank(), mm_floor, mm_bar, mms_correction)
                + history.score(id) as f64
                + history.missed_rounds(id, round) as f64 * absent_value
        });

        let solver = Self {
            base,
            mm_floor,
            mm_bar,
            mms_correction,
        };
        solver.base.check_limits(solver.main_limits());
        Ok(solver)
    }

    /// Starting score of a competitor of the given rank
    pub fn mm_base(&self, rank: i32) -> f64 {
        mm_base(rank, self.mm_floor, self.mm_bar, self.mms_correction)
    }

    pub fn mms(&self, pairable: &Pairable) -> f64 {
        self.base.score(pairable)
    }
}

fn mm_base(rank: i32, mm_floor: i32, mm_bar: i32, mms_correction: f64) -> f64 {
    rank.clamp(mm_floor, mm_bar) as f64 + MMS_ZERO + mms_correction
}

impl<'a> Solver<'a> for McMahonSolver<'a> {
    fn base(&self) -> &BaseSolver<'a> {
        &self.base
    }

    fn main_limits(&self) -> (f64, f64) {
        let round = self.base.round() as i32;
        let min = self.mm_floor + SCORE_MIN_OFFSET - MIN_RANK;
        let max = self.mm_bar + SCORE_MAX_OFFSET + (round - 1) - MIN_RANK;
        (min as f64, max as f64)
    }

    fn pseudo_rank(&self, pairable: &Pairable) -> i32 {
        if self.base.params().handicap.use_mms {
            round_half_up(self.mms(pairable)) + MIN_RANK
        } else {
            pairable.rank()
        }
    }
}

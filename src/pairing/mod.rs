pub mod history;
pub mod matching;
pub mod mcmahon;
pub mod solver;
pub mod swiss;

pub use history::HistoryStats;
pub use matching::min_weight_perfect_matching;
pub use mcmahon::McMahonSolver;
pub use solver::{BaseSolver, Matching, Solver, SolverContext};
pub use swiss::SwissSolver;

use crate::domain::PairingSystem;
use crate::errors::PairingResult;

/// Builds the solver implementing `system`
pub fn solver_for<'a>(system: &PairingSystem, context: SolverContext<'a>) -> PairingResult<Box<dyn Solver<'a> + 'a>> {
    match *system {
        PairingSystem::Swiss => Ok(Box::new(SwissSolver::new(context))),
        PairingSystem::McMahon {
            mm_floor,
            mm_bar,
            mms_correction,
        } => Ok(Box::new(McMahonSolver::new(context, mm_floor, mm_bar, mms_correction)?)),
    }
}

use crate::pairing::solver::{BaseSolver, Solver, SolverContext};

/// Swiss system: the main score is the number of wins
pub struct SwissSolver<'a> {
    base: BaseSolver<'a>,
}

impl<'a> SwissSolver<'a> {
    pub fn new(context: SolverContext<'a>) -> Self {
        let base = BaseSolver::new(context, |pairable, history| history.score(pairable.id()) as f64);
        let solver = Self { base };
        solver.base.check_limits(solver.main_limits());
        solver
    }
}

impl<'a> Solver<'a> for SwissSolver<'a> {
    fn base(&self) -> &BaseSolver<'a> {
        &self.base
    }

    fn main_limits(&self) -> (f64, f64) {
        (0.0, self.base.round().saturating_sub(1) as f64)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::domain::fixtures::player;
    use crate::domain::{Game, GameResult, Id, Pairable, PairingParams, Player};
    use crate::pairing::history::HistoryStats;
    use crate::store::IdAllocator;

    fn context<'a>(
        round: u32,
        history: &[Vec<Game>],
        players: &'a [Player],
        params: &'a PairingParams,
    ) -> SolverContext<'a> {
        SolverContext {
            round,
            history: HistoryStats::new(history),
            pairables: players.iter().map(Pairable::Player).collect(),
            params,
            used_tables: BTreeSet::new(),
        }
    }

    fn pair_ids(solver: &SwissSolver) -> Vec<(Id, Id)> {
        let pool = solver.base().pairables();
        let mut pairs: Vec<(Id, Id)> = solver
            .matching()
            .unwrap()
            .pairs
            .iter()
            .map(|&(i, j)| {
                let (a, b) = (pool[i].id(), pool[j].id());
                (a.min(b), a.max(b))
            })
            .collect();
        pairs.sort();
        pairs
    }

    /// A and B are 5k, C and D are 1d
    fn equal_rank_pool() -> Vec<Player> {
        vec![
            player(1, -5, "Club A", "AA"),
            player(2, -5, "Club B", "BB"),
            player(3, 0, "Club C", "CC"),
            player(4, 0, "Club D", "DD"),
        ]
    }

    #[test]
    fn test_first_round_pairs_equal_ranks() {
        let players = equal_rank_pool();
        let params = PairingParams::default();
        let solver = SwissSolver::new(context(1, &[], &players, &params));

        assert_eq!(pair_ids(&solver), vec![(1, 2), (3, 4)]);
        let matching = solver.matching().unwrap();
        // Two adjacent placements in a group of four, nothing else applies
        assert_eq!(
            matching.total_weight,
            2.0 * (params.main.placement_weight + params.main.seeding_weight)
        );
    }

    #[test]
    fn test_every_pairable_plays_once() {
        let players: Vec<Player> = (1..=10).map(|id| player(id, -(id % 7), "", "")).collect();
        let params = PairingParams::default();
        let solver = SwissSolver::new(context(1, &[], &players, &params));
        let games = solver.pair(&IdAllocator::new()).unwrap();

        assert_eq!(games.len(), 5);
        let mut seen: Vec<Id> = games.iter().flat_map(|g| [g.black, g.white]).collect();
        seen.sort();
        assert_eq!(seen, (1..=10).collect::<Vec<Id>>());
    }

    fn rematch_history() -> Vec<Vec<Game>> {
        // A beat B; C and D did not play
        let mut game = Game::new(1, 1, 1, 2, 0);
        game.result = Some(GameResult::Black);
        vec![vec![game]]
    }

    fn rematch_pool() -> Vec<Player> {
        vec![
            player(1, 0, "Club A", "AA"),
            player(2, 0, "Club B", "BB"),
            player(3, -5, "Club C", "CC"),
            player(4, -5, "Club D", "DD"),
        ]
    }

    #[test]
    fn test_avoids_rematch() {
        let players = rematch_pool();
        let params = PairingParams::default();
        let solver = SwissSolver::new(context(2, &rematch_history(), &players, &params));
        assert!(!pair_ids(&solver).contains(&(1, 2)));
    }

    #[test]
    fn test_rematch_penalty_raises_total_weight() {
        let players = rematch_pool();
        let history = rematch_history();

        let mut free = PairingParams::default();
        free.base.avoid_duplicating_game = 0.0;
        let lenient = SwissSolver::new(context(2, &history, &players, &free));
        assert!(pair_ids(&lenient).contains(&(1, 2)));
        let lenient_weight = lenient.matching().unwrap().total_weight;

        let strict_params = PairingParams::default();
        let strict = SwissSolver::new(context(2, &history, &players, &strict_params));
        let strict_weight = strict.matching().unwrap().total_weight;

        assert!(strict_weight > lenient_weight);
    }

    #[test]
    fn test_identical_input_gives_identical_games() {
        let players: Vec<Player> = (1..=8).map(|id| player(id, -(id / 2), "", "")).collect();
        let params = PairingParams::default();
        let first = SwissSolver::new(context(1, &[], &players, &params))
            .pair(&IdAllocator::new())
            .unwrap();
        let second = SwissSolver::new(context(1, &[], &players, &params))
            .pair(&IdAllocator::new())
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_main_limits() {
        let players = equal_rank_pool();
        let params = PairingParams::default();
        let solver = SwissSolver::new(context(4, &[], &players, &params));
        assert_eq!(solver.main_limits(), (0.0, 3.0));
    }
}

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::domain::{Game, Id};

/// Per-competitor aggregates derived from the games of past rounds.
///
/// Built once at the start of a pairing or standings computation and
/// dropped with it, so a committed round can never leave stale values
/// behind. Games against the bye only count in the played-pairs set.
#[derive(Debug, Clone, Default)]
pub struct HistoryStats {
    rounds: u32,
    played: HashSet<(Id, Id)>,
    color_balance: HashMap<Id, i32>,
    score: HashMap<Id, i32>,
    sos: HashMap<Id, i32>,
    sosos: HashMap<Id, i32>,
    sodos: HashMap<Id, i32>,
    participation: HashMap<Id, BTreeSet<u32>>,
}

impl HistoryStats {
    /// `history` yields the games of each completed round, round 1 first.
    pub fn new<'g, R, G>(history: R) -> Self
    where
        R: IntoIterator<Item = G>,
        G: IntoIterator<Item = &'g Game>,
    {
        let mut stats = Self::default();
        let mut real_games = Vec::new();

        for (index, round_games) in history.into_iter().enumerate() {
            let round = index as u32 + 1;
            stats.rounds = round;
            for game in round_games {
                stats.played.insert(pair_key(game.black, game.white));
                if game.is_bye() {
                    continue;
                }
                real_games.push(game);
                for id in [game.black, game.white] {
                    stats.participation.entry(id).or_default().insert(round);
                }
            }
        }

        stats.compute_colors_and_scores(&real_games);
        stats.compute_strength_of_schedule(&real_games);
        stats
    }

    fn compute_colors_and_scores(&mut self, games: &[&Game]) {
        for game in games {
            *self.color_balance.entry(game.white).or_insert(0) += 1;
            *self.color_balance.entry(game.black).or_insert(0) -= 1;
            if let Some(winner) = game.winner() {
                *self.score.entry(winner).or_insert(0) += 1;
            }
        }
    }

    fn compute_strength_of_schedule(&mut self, games: &[&Game]) {
        for game in games {
            for id in [game.black, game.white] {
                let Some(opponent) = game.opponent_of(id) else {
                    continue;
                };
                let opponent_score = self.score(opponent);
                *self.sos.entry(id).or_insert(0) += opponent_score;
                if game.winner() == Some(id) {
                    *self.sodos.entry(id).or_insert(0) += opponent_score;
                }
            }
        }

        // Needs every sos to be complete first
        for game in games {
            for id in [game.black, game.white] {
                if let Some(opponent) = game.opponent_of(id) {
                    let opponent_sos = self.sos(opponent);
                    *self.sosos.entry(id).or_insert(0) += opponent_sos;
                }
            }
        }
    }

    /// Number of rounds the statistics were built from
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn played(&self, p: Id, q: Id) -> bool {
        self.played.contains(&pair_key(p, q))
    }

    /// Games played as white minus games played as black
    pub fn color_balance(&self, id: Id) -> i32 {
        self.color_balance.get(&id).copied().unwrap_or(0)
    }

    /// Number of wins
    pub fn score(&self, id: Id) -> i32 {
        self.score.get(&id).copied().unwrap_or(0)
    }

    pub fn sos(&self, id: Id) -> i32 {
        self.sos.get(&id).copied().unwrap_or(0)
    }

    pub fn sosos(&self, id: Id) -> i32 {
        self.sosos.get(&id).copied().unwrap_or(0)
    }

    pub fn sodos(&self, id: Id) -> i32 {
        self.sodos.get(&id).copied().unwrap_or(0)
    }

    /// Rounds before `round` in which the competitor had no real game
    pub fn missed_rounds(&self, id: Id, round: u32) -> u32 {
        let played = self
            .participation
            .get(&id)
            .map(|rounds| rounds.range(..round).count() as u32)
            .unwrap_or(0);
        round.saturating_sub(1).min(self.rounds).saturating_sub(played)
    }
}

fn pair_key(p: Id, q: Id) -> (Id, Id) {
    if p <= q {
        (p, q)
    } else {
        (q, p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GameResult, BYE_ID};

    fn decided(id: Id, black: Id, white: Id, result: GameResult) -> Game {
        let mut game = Game::new(id, 1, black, white, 0);
        game.result = Some(result);
        game
    }

    fn sample_history() -> Vec<Vec<Game>> {
        vec![
            vec![
                decided(1, 1, 2, GameResult::Black),
                decided(2, 3, 4, GameResult::White),
            ],
            vec![
                decided(3, 4, 1, GameResult::Black),
                decided(4, 2, 3, GameResult::Jigo),
            ],
        ]
    }

    #[test]
    fn test_empty_history_is_all_zero() {
        let stats = HistoryStats::new(&Vec::<Vec<Game>>::new());
        assert_eq!(stats.rounds(), 0);
        for id in 1..5 {
            assert_eq!(stats.score(id), 0);
            assert_eq!(stats.sos(id), 0);
            assert_eq!(stats.sosos(id), 0);
            assert_eq!(stats.sodos(id), 0);
            assert_eq!(stats.color_balance(id), 0);
        }
    }

    #[test]
    fn test_scores_and_colors() {
        let stats = HistoryStats::new(&sample_history());
        assert_eq!(stats.score(1), 1);
        assert_eq!(stats.score(2), 0);
        assert_eq!(stats.score(3), 0);
        assert_eq!(stats.score(4), 2);

        // 1: black then white
        assert_eq!(stats.color_balance(1), 0);
        // 4: white then black
        assert_eq!(stats.color_balance(4), 0);
        // 2: white then black
        assert_eq!(stats.color_balance(2), 0);
        // 3: black then white
        assert_eq!(stats.color_balance(3), 0);

        assert!(stats.played(1, 2));
        assert!(stats.played(2, 1));
        assert!(!stats.played(1, 3));
    }

    #[test]
    fn test_unbalanced_colors() {
        // 1 takes black twice, 2 and 3 white once each
        let history = vec![
            vec![decided(1, 1, 2, GameResult::White)],
            vec![decided(2, 1, 3, GameResult::Black)],
        ];
        let stats = HistoryStats::new(&history);
        assert_eq!(stats.color_balance(1), -2);
        assert_eq!(stats.color_balance(2), 1);
        assert_eq!(stats.color_balance(3), 1);
    }

    #[test]
    fn test_strength_of_schedule_family() {
        let stats = HistoryStats::new(&sample_history());
        // 1 met 2 (0 wins) and 4 (2 wins)
        assert_eq!(stats.sos(1), 2);
        // 2 met 1 (1) and 3 (0)
        assert_eq!(stats.sos(2), 1);
        // 3 met 4 (2) and 2 (0)
        assert_eq!(stats.sos(3), 2);
        // 4 met 3 (0) and 1 (1)
        assert_eq!(stats.sos(4), 1);

        assert_eq!(stats.sosos(1), stats.sos(2) + stats.sos(4));
        assert_eq!(stats.sosos(4), stats.sos(3) + stats.sos(1));

        // 1 beat 2; 4 beat 3 and 1
        assert_eq!(stats.sodos(1), 0);
        assert_eq!(stats.sodos(4), 1);
        assert_eq!(stats.sodos(3), 0);
    }

    #[test]
    fn test_recomputation_is_stable() {
        let history = sample_history();
        let first = HistoryStats::new(&history);
        let second = HistoryStats::new(&history);
        for id in 1..5 {
            assert_eq!(first.score(id), second.score(id));
            assert_eq!(first.sos(id), second.sos(id));
            assert_eq!(first.sosos(id), second.sosos(id));
            assert_eq!(first.sodos(id), second.sodos(id));
        }
    }

    #[test]
    fn test_bye_games_only_mark_pairs() {
        let history = vec![vec![Game::new(1, 1, BYE_ID, 7, 0)]];
        let stats = HistoryStats::new(&history);
        assert!(stats.played(7, BYE_ID));
        assert_eq!(stats.color_balance(7), 0);
        assert_eq!(stats.missed_rounds(7, 2), 1);
    }

    #[test]
    fn test_missed_rounds() {
        let stats = HistoryStats::new(&sample_history());
        assert_eq!(stats.missed_rounds(1, 3), 0);
        assert_eq!(stats.missed_rounds(1, 2), 0);
        // Never played in either round
        assert_eq!(stats.missed_rounds(9, 3), 2);
        assert_eq!(stats.missed_rounds(9, 1), 0);
    }
}

use std::sync::atomic::{AtomicI32, Ordering};

use crate::domain::{Id, Tournament};

/// Monotonic id sequences for tournaments, pairables and games.
///
/// Ids start at 1; 0 is reserved for the bye.
#[derive(Debug)]
pub struct IdAllocator {
    tournament: AtomicI32,
    pairable: AtomicI32,
    game: AtomicI32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            tournament: AtomicI32::new(1),
            pairable: AtomicI32::new(1),
            game: AtomicI32::new(1),
        }
    }

    pub fn next_tournament_id(&self) -> Id {
        self.tournament.fetch_add(1, Ordering::SeqCst)
    }

    /// Players and teams share one sequence
    pub fn next_pairable_id(&self) -> Id {
        self.pairable.fetch_add(1, Ordering::SeqCst)
    }

    pub fn next_game_id(&self) -> Id {
        self.game.fetch_add(1, Ordering::SeqCst)
    }

    /// Moves every sequence past the ids already used by `tournament`
    pub fn observe(&self, tournament: &Tournament) {
        bump(&self.tournament, tournament.id);
        for id in tournament.pairable_ids() {
            bump(&self.pairable, id);
        }
        for game in tournament.all_games() {
            bump(&self.game, game.id);
        }
    }
}

fn bump(counter: &AtomicI32, used: Id) {
    counter.fetch_max(used + 1, Ordering::SeqCst);
}

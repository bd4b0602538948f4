use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use log::{debug, info, warn};
use ndarray::Array2;

use crate::domain::{Criterion, Game, Id, Pairable, PairingParams, BYE_ID};
use crate::errors::{PairingError, PairingResult};
use crate::pairing::history::HistoryStats;
use crate::pairing::matching::{min_weight_perfect_matching, total_weight};
use crate::store::IdAllocator;

/// Everything a solver needs to pair one round
pub struct SolverContext<'a> {
    pub round: u32,
    /// Statistics over the rounds before `round`
    pub history: HistoryStats,
    pub pairables: Vec<Pairable<'a>>,
    pub params: &'a PairingParams,
    /// Boards already taken in `round`
    pub used_tables: BTreeSet<u32>,
}

/// Optimal pairs as indices into [`BaseSolver::pairables`]
#[derive(Debug, Clone, PartialEq)]
pub struct Matching {
    pub pairs: Vec<(usize, usize)>,
    pub total_weight: f64,
}

/// State shared by every pairing system.
///
/// Pairables are kept in placement order: main score first, then rank,
/// rating and id. The bye, when present, always comes last.
pub struct BaseSolver<'a> {
    round: u32,
    history: HistoryStats,
    pairables: Vec<Pairable<'a>>,
    params: &'a PairingParams,
    used_tables: BTreeSet<u32>,
    scores: HashMap<Id, f64>,
    placement: HashMap<Id, usize>,
    place_in_group: HashMap<Id, (usize, usize)>,
    lowest_score: f64,
    real_count: usize,
}

impl<'a> BaseSolver<'a> {
    pub fn new<F>(context: SolverContext<'a>, score: F) -> Self
    where
        F: Fn(&Pairable<'a>, &HistoryStats) -> f64,
    {
        let SolverContext {
            round,
            history,
            pairables,
            params,
            used_tables,
        } = context;

        let (mut pairables, byes): (Vec<_>, Vec<_>) = pairables.into_iter().partition(|p| !p.is_bye());
        let scores: HashMap<Id, f64> = pairables.iter().map(|p| (p.id(), score(p, &history))).collect();

        pairables.sort_by(|p, q| compare_placement(p, q, &scores));
        let real_count = pairables.len();
        let place_in_group = group_places(&pairables, &scores);
        let lowest_score = scores.values().copied().fold(f64::INFINITY, f64::min);
        pairables.extend(byes.into_iter().take(1));
        let placement = pairables.iter().enumerate().map(|(index, p)| (p.id(), index)).collect();

        Self {
            round,
            history,
            pairables,
            params,
            used_tables,
            scores,
            placement,
            place_in_group,
            lowest_score: if lowest_score.is_finite() { lowest_score } else { 0.0 },
            real_count,
        }
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn history(&self) -> &HistoryStats {
        &self.history
    }

    pub fn params(&self) -> &PairingParams {
        self.params
    }

    /// Pairables in placement order, the bye last
    pub fn pairables(&self) -> &[Pairable<'a>] {
        &self.pairables
    }

    /// Main score; the bye has none
    pub fn score(&self, pairable: &Pairable) -> f64 {
        self.scores.get(&pairable.id()).copied().unwrap_or(0.0)
    }

    /// 0-based rank among the pool
    pub fn placement(&self, pairable: &Pairable) -> usize {
        self.placement.get(&pairable.id()).copied().unwrap_or(self.pairables.len())
    }

    /// Index among the pairables sharing the same score, and that group's size
    pub fn place_in_group(&self, pairable: &Pairable) -> (usize, usize) {
        self.place_in_group.get(&pairable.id()).copied().unwrap_or((0, 1))
    }

    /// How far `p` and `q` are from sitting half a score group apart; 0
    /// across groups
    pub fn seeding_distance(&self, p: &Pairable, q: &Pairable) -> f64 {
        if self.score(p) != self.score(q) {
            return 0.0;
        }
        let ((place_p, size), (place_q, _)) = (self.place_in_group(p), self.place_in_group(q));
        (place_p.abs_diff(place_q) as f64 - size as f64 / 2.0).abs()
    }

    pub fn criterion(&self, pairable: &Pairable, criterion: Criterion) -> f64 {
        let id = pairable.id();
        match criterion {
            Criterion::Nbw => self.history.score(id) as f64,
            Criterion::Mms => self.score(pairable),
            Criterion::Sos => self.history.sos(id) as f64,
            Criterion::Sosos => self.history.sosos(id) as f64,
            Criterion::Sodos => self.history.sodos(id) as f64,
        }
    }

    /// Cost of giving the bye to `pairable`: cheapest for the lowest placed
    /// competitor who never had one.
    pub fn bye_weight(&self, pairable: &Pairable) -> f64 {
        let params = self.params;
        let mut weight = 0.0;
        if self.history.played(pairable.id(), BYE_ID) {
            weight += params.base.avoid_duplicating_game;
        }
        weight += params.main.score_weight * (self.score(pairable) - self.lowest_score);
        let last_place = self.real_count.saturating_sub(1);
        weight += params.main.placement_weight * last_place.saturating_sub(self.placement(pairable)) as f64;
        weight
    }

    /// Warns about main scores falling outside the admissible range
    pub(crate) fn check_limits(&self, (min, max): (f64, f64)) {
        for pairable in &self.pairables[..self.real_count] {
            let score = self.score(pairable);
            if score < min || score > max {
                warn!(
                    "Main score {} of #{} is outside [{}, {}] in round {}",
                    score,
                    pairable.id(),
                    min,
                    max,
                    self.round
                );
            }
        }
    }

    fn free_tables(&self) -> impl Iterator<Item = u32> + '_ {
        (1..).filter(move |table| !self.used_tables.contains(table))
    }
}

fn compare_placement(p: &Pairable, q: &Pairable, scores: &HashMap<Id, f64>) -> Ordering {
    let score = |x: &Pairable| scores.get(&x.id()).copied().unwrap_or(0.0);
    score(q)
        .total_cmp(&score(p))
        .then_with(|| q.rank().cmp(&p.rank()))
        .then_with(|| q.rating().cmp(&p.rating()))
        .then_with(|| p.id().cmp(&q.id()))
}

fn group_places(sorted: &[Pairable], scores: &HashMap<Id, f64>) -> HashMap<Id, (usize, usize)> {
    let mut places = HashMap::new();
    let score = |x: &Pairable| scores.get(&x.id()).copied().unwrap_or(0.0);
    let mut start = 0;
    while start < sorted.len() {
        let group_score = score(&sorted[start]);
        let end = sorted[start..]
            .iter()
            .position(|p| score(p) != group_score)
            .map_or(sorted.len(), |offset| start + offset);
        for (index, pairable) in sorted[start..end].iter().enumerate() {
            places.insert(pairable.id(), (index, end - start));
        }
        start = end;
    }
    places
}

/// A pairing system: supplies the main score and the pair costs, the
/// matching and game construction are shared.
pub trait Solver<'a> {
    fn base(&self) -> &BaseSolver<'a>;

    /// Admissible range of the main score in the current round
    fn main_limits(&self) -> (f64, f64);

    /// Rank used for handicap computations
    fn pseudo_rank(&self, pairable: &Pairable) -> i32 {
        pairable.rank()
    }

    fn handicap(&self, p: &Pairable, q: &Pairable) -> u32 {
        if p.is_bye() || q.is_bye() {
            return 0;
        }
        self.base().params().handicap.handicap(self.pseudo_rank(p), self.pseudo_rank(q))
    }

    /// Cost of pairing `p` with `q`, lower is better
    fn weight(&self, p: &Pairable, q: &Pairable) -> f64 {
        let base = self.base();
        if q.is_bye() {
            return base.bye_weight(p);
        }
        if p.is_bye() {
            return base.bye_weight(q);
        }
        let params = base.params();
        let history = base.history();
        let mut weight = 0.0;

        if history.played(p.id(), q.id()) {
            weight += params.base.avoid_duplicating_game;
        }

        weight += params.main.score_weight * (base.score(p) - base.score(q)).abs();
        weight += params.main.placement_weight * base.placement(p).abs_diff(base.placement(q)) as f64;
        weight += params.main.seeding_weight * base.seeding_distance(p, q);

        let (balance_p, balance_q) = (history.color_balance(p.id()), history.color_balance(q.id()));
        if balance_p * balance_q > 0 {
            weight += params.base.color_balance_weight * balance_p.abs().min(balance_q.abs()) as f64;
        }

        if let (Some(a), Some(b)) = (p.club(), q.club()) {
            if !a.is_empty() && a == b {
                weight += params.geo.same_club_weight;
            }
        }
        if let (Some(a), Some(b)) = (p.country(), q.country()) {
            if !a.is_empty() && a == b {
                weight += params.geo.same_country_weight;
            }
        }

        if params.handicap.enabled() {
            weight += params.handicap.weight * self.handicap(p, q) as f64;
        }
        weight
    }

    /// Returns (black, white) for two pairables, `p` being the better placed
    fn colors<'p>(&self, p: &'p Pairable<'a>, q: &'p Pairable<'a>) -> (&'p Pairable<'a>, &'p Pairable<'a>) {
        if q.is_bye() {
            return (q, p);
        }
        if p.is_bye() {
            return (p, q);
        }
        if self.handicap(p, q) > 0 {
            return if self.pseudo_rank(p) < self.pseudo_rank(q) { (p, q) } else { (q, p) };
        }
        let history = self.base().history();
        match history.color_balance(p.id()).cmp(&history.color_balance(q.id())) {
            Ordering::Greater => (p, q),
            Ordering::Less => (q, p),
            Ordering::Equal if self.base().round() % 2 == 1 => (q, p),
            Ordering::Equal => (p, q),
        }
    }

    /// Minimum total weight perfect matching of the pool
    fn matching(&self) -> PairingResult<Matching> {
        let pool = self.base().pairables();
        let n = pool.len();
        if n % 2 != 0 {
            return Err(PairingError::invariant(format!(
                "expecting an even number of pairables, got {}",
                n
            )));
        }

        let mut weights = Array2::<f64>::zeros((n, n));
        for i in 0..n {
            for j in i + 1..n {
                let weight = 0.5 * (self.weight(&pool[i], &pool[j]) + self.weight(&pool[j], &pool[i]));
                weights[[i, j]] = weight;
                weights[[j, i]] = weight;
            }
        }

        let pairs = min_weight_perfect_matching(&weights)?;
        let total_weight = total_weight(&weights, &pairs);
        debug!("Round {} matching weight: {}", self.base().round(), total_weight);
        Ok(Matching { pairs, total_weight })
    }

    /// Games of the round, boards numbered by the best placement of each pair
    fn pair(&self, ids: &IdAllocator) -> PairingResult<Vec<Game>> {
        let base = self.base();
        let pool = base.pairables();
        info!("Pairing round {} with {} pairables", base.round(), pool.len());

        let matching = self.matching()?;
        let mut tables = base.free_tables();
        let mut games = Vec::with_capacity(matching.pairs.len());
        for &(i, j) in &matching.pairs {
            let (p, q) = (&pool[i], &pool[j]);
            let (black, white) = self.colors(p, q);
            let table = if black.is_bye() || white.is_bye() {
                0
            } else {
                tables.next().unwrap_or(0)
            };
            games.push(Game::new(
                ids.next_game_id(),
                table,
                black.id(),
                white.id(),
                self.handicap(black, white),
            ));
        }

        info!(
            "Paired round {}: {} games, total weight {}",
            base.round(),
            games.len(),
            matching.total_weight
        );
        Ok(games)
    }
}

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::document::TournamentDocument;
use super::game::{Game, GameResult};
use super::pairable::{Id, Pairable, Player, Team, BYE_ID};
use super::params::{Criterion, LonePairablePolicy, PairingConfig};
use crate::errors::{PairingError, PairingResult};
use crate::pairing::{solver_for, HistoryStats, SolverContext};
use crate::store::IdAllocator;

/// Competition format; fixes how many players form one pairable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TournamentType {
    Individual,
    Pairgo,
    Rengo2,
    Rengo3,
    Team2,
    Team3,
    Team4,
    Team5,
}

impl TournamentType {
    pub fn players_number(&self) -> usize {
        match self {
            TournamentType::Individual => 1,
            TournamentType::Pairgo | TournamentType::Rengo2 | TournamentType::Team2 => 2,
            TournamentType::Rengo3 | TournamentType::Team3 => 3,
            TournamentType::Team4 => 4,
            TournamentType::Team5 => 5,
        }
    }

    /// Whether each board is scored on its own
    pub fn individual(&self) -> bool {
        !matches!(
            self,
            TournamentType::Pairgo | TournamentType::Rengo2 | TournamentType::Rengo3
        )
    }

    pub fn is_team(&self) -> bool {
        self.players_number() > 1
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rules {
    #[default]
    French,
    Japanese,
    Aga,
    Chinese,
}

/// Clock settings, durations in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeSystem {
    #[serde(rename_all = "camelCase")]
    Canadian {
        main_time: u32,
        byoyomi: u32,
        stones: u32,
    },
    #[serde(rename_all = "camelCase")]
    Fischer {
        main_time: u32,
        increment: u32,
        #[serde(default)]
        max_time: Option<u32>,
    },
    /// Japanese byo-yomi
    #[serde(rename_all = "camelCase")]
    Standard {
        main_time: u32,
        byoyomi: u32,
        periods: u32,
    },
    #[serde(rename_all = "camelCase")]
    SuddenDeath { main_time: u32 },
}

fn default_goban_size() -> u32 {
    19
}

fn default_komi() -> f64 {
    7.5
}

/// Descriptive fields of a tournament, no influence on pairing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentInfo {
    #[serde(rename = "type")]
    pub kind: TournamentType,
    pub name: String,
    pub short_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub country: String,
    pub location: String,
    #[serde(default)]
    pub online: bool,
    pub time_system: TimeSystem,
    #[serde(default)]
    pub rules: Rules,
    #[serde(default = "default_goban_size")]
    pub goban_size: u32,
    #[serde(default = "default_komi")]
    pub komi: f64,
}

/// Registered competitors. Team tournaments pair teams and keep the
/// underlying players apart.
#[derive(Debug, Clone, PartialEq)]
pub enum Roster {
    Individual {
        players: BTreeMap<Id, Player>,
    },
    Team {
        players: BTreeMap<Id, Player>,
        teams: BTreeMap<Id, Team>,
    },
}

impl Roster {
    pub fn for_type(kind: TournamentType) -> Self {
        if kind.is_team() {
            Roster::Team {
                players: BTreeMap::new(),
                teams: BTreeMap::new(),
            }
        } else {
            Roster::Individual {
                players: BTreeMap::new(),
            }
        }
    }

    pub fn players(&self) -> &BTreeMap<Id, Player> {
        match self {
            Roster::Individual { players } | Roster::Team { players, .. } => players,
        }
    }

    fn players_mut(&mut self) -> &mut BTreeMap<Id, Player> {
        match self {
            Roster::Individual { players } | Roster::Team { players, .. } => players,
        }
    }
}

/// One row of the standings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    /// 1-based, shared on ties
    pub place: u32,
    pub id: Id,
    pub name: String,
    /// Criteria values, in the tournament criteria order
    pub values: Vec<f64>,
}

/// A tournament and its rounds.
///
/// Rounds are stored as `games[round - 1]`; a round exists once it has
/// been paired, possibly empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TournamentDocument", into = "TournamentDocument")]
pub struct Tournament {
    pub id: Id,
    pub info: TournamentInfo,
    pub rounds: u32,
    pub pairing: PairingConfig,
    pub(crate) roster: Roster,
    pub(crate) games: Vec<BTreeMap<Id, Game>>,
}

impl Tournament {
    pub fn new(id: Id, info: TournamentInfo, rounds: u32, pairing: PairingConfig) -> PairingResult<Self> {
        if rounds == 0 {
            return Err(PairingError::config("a tournament needs at least one round"));
        }
        if info.name.trim().is_empty() {
            return Err(PairingError::config("missing tournament name"));
        }
        pairing.validate()?;
        Ok(Self {
            id,
            roster: Roster::for_type(info.kind),
            info,
            rounds,
            pairing,
            games: Vec::new(),
        })
    }

    pub fn is_team(&self) -> bool {
        matches!(self.roster, Roster::Team { .. })
    }

    /// Standings criteria, fixed by the pairing system
    pub fn criteria(&self) -> Vec<Criterion> {
        self.pairing.placement().criteria
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.roster.players().values()
    }

    pub fn teams(&self) -> impl Iterator<Item = &Team> {
        let teams = match &self.roster {
            Roster::Team { teams, .. } => Some(teams.values()),
            Roster::Individual { .. } => None,
        };
        teams.into_iter().flatten()
    }

    pub fn player(&self, id: Id) -> PairingResult<&Player> {
        self.roster.players().get(&id).ok_or(PairingError::unknown_player(id))
    }

    pub fn team(&self, id: Id) -> PairingResult<&Team> {
        match &self.roster {
            Roster::Team { teams, .. } => teams.get(&id).ok_or(PairingError::unknown_team(id)),
            Roster::Individual { .. } => Err(PairingError::unknown_team(id)),
        }
    }

    /// Ids of every registered player and team
    pub fn pairable_ids(&self) -> Vec<Id> {
        self.players().map(|p| p.id).chain(self.teams().map(|t| t.id)).collect()
    }

    /// The competitors: players, or teams in a team tournament
    pub fn pairables(&self) -> Vec<Pairable<'_>> {
        match &self.roster {
            Roster::Individual { players } => players.values().map(Pairable::Player).collect(),
            Roster::Team { players, teams } => teams
                .values()
                .map(|team| team_view(team, players))
                .collect(),
        }
    }

    pub fn pairable(&self, id: Id) -> PairingResult<Pairable<'_>> {
        match &self.roster {
            Roster::Individual { players } => players
                .get(&id)
                .map(Pairable::Player)
                .ok_or(PairingError::unknown_player(id)),
            Roster::Team { players, teams } => teams
                .get(&id)
                .map(|team| team_view(team, players))
                .ok_or(PairingError::unknown_team(id)),
        }
    }

    // Roster edition

    pub fn add_player(&mut self, player: Player) -> PairingResult<()> {
        self.check_new_id(player.id)?;
        debug!("Adding player #{} to tournament #{}", player.id, self.id);
        self.roster.players_mut().insert(player.id, player);
        Ok(())
    }

    /// Replaces a registered player, returning the previous version
    pub fn replace_player(&mut self, player: Player) -> PairingResult<Player> {
        let slot = self
            .roster
            .players_mut()
            .get_mut(&player.id)
            .ok_or(PairingError::unknown_player(player.id))?;
        Ok(std::mem::replace(slot, player))
    }

    pub fn remove_player(&mut self, id: Id) -> PairingResult<Player> {
        self.player(id)?;
        if let Some(team) = self.teams().find(|team| team.players.contains(&id)) {
            return Err(PairingError::precondition(format!(
                "player #{} belongs to team #{}",
                id, team.id
            )));
        }
        self.check_no_games(id)?;
        self.roster
            .players_mut()
            .remove(&id)
            .ok_or(PairingError::unknown_player(id))
    }

    pub fn add_team(&mut self, team: Team) -> PairingResult<()> {
        self.check_new_id(team.id)?;
        self.check_members(&team)?;
        match &mut self.roster {
            Roster::Team { teams, .. } => {
                debug!("Adding team #{} to tournament #{}", team.id, self.id);
                teams.insert(team.id, team);
                Ok(())
            }
            Roster::Individual { .. } => Err(not_a_team_tournament(self.id)),
        }
    }

    pub fn replace_team(&mut self, team: Team) -> PairingResult<Team> {
        self.team(team.id)?;
        self.check_members(&team)?;
        match &mut self.roster {
            Roster::Team { teams, .. } => teams
                .insert(team.id, team)
                .ok_or(PairingError::invariant("team vanished during replacement")),
            Roster::Individual { .. } => Err(not_a_team_tournament(self.id)),
        }
    }

    pub fn remove_team(&mut self, id: Id) -> PairingResult<Team> {
        self.team(id)?;
        self.check_no_games(id)?;
        match &mut self.roster {
            Roster::Team { teams, .. } => teams.remove(&id).ok_or(PairingError::unknown_team(id)),
            Roster::Individual { .. } => Err(not_a_team_tournament(self.id)),
        }
    }

    fn check_new_id(&self, id: Id) -> PairingResult<()> {
        if id == BYE_ID {
            return Err(PairingError::precondition("id 0 is reserved for the bye"));
        }
        if self.pairable_ids().contains(&id) {
            return Err(PairingError::precondition(format!("id #{} is already registered", id)));
        }
        Ok(())
    }

    fn check_members(&self, team: &Team) -> PairingResult<()> {
        for &member in &team.players {
            self.player(member)?;
        }
        Ok(())
    }

    fn check_no_games(&self, id: Id) -> PairingResult<()> {
        if self.all_games().any(|game| game.involves(id)) {
            return Err(PairingError::precondition(format!("#{} already has games", id)));
        }
        Ok(())
    }

    // Rounds

    /// Number of the last paired round, 0 before the first pairing
    pub fn last_round(&self) -> u32 {
        self.games.len() as u32
    }

    pub fn games(&self, round: u32) -> Option<&BTreeMap<Id, Game>> {
        let index = (round as usize).checked_sub(1)?;
        self.games.get(index)
    }

    pub fn all_games(&self) -> impl Iterator<Item = &Game> {
        self.games.iter().flat_map(|round| round.values())
    }

    pub fn set_result(&mut self, round: u32, game_id: Id, result: Option<GameResult>) -> PairingResult<()> {
        let game = (round as usize)
            .checked_sub(1)
            .and_then(|index| self.games.get_mut(index))
            .and_then(|games| games.get_mut(&game_id))
            .ok_or(PairingError::unknown_game(game_id))?;
        game.result = result;
        Ok(())
    }

    /// Statistics over rounds `1..round`
    fn history_before(&self, round: u32) -> HistoryStats {
        let completed = round.saturating_sub(1) as usize;
        HistoryStats::new(self.games.iter().take(completed).map(|games| games.values()))
    }

    fn playing_in(&self, round: u32) -> HashSet<Id> {
        self.games(round)
            .map(|games| games.values().flat_map(|g| [g.black, g.white]).collect())
            .unwrap_or_default()
    }

    fn used_tables(&self, round: u32) -> BTreeSet<u32> {
        self.games(round)
            .map(|games| games.values().map(|g| g.table).filter(|&t| t > 0).collect())
            .unwrap_or_default()
    }

    /// Competitors still available in `round`: not skipping it and not
    /// already given a game in it
    pub fn default_pool(&self, round: u32) -> Vec<Id> {
        let playing = self.playing_in(round);
        self.pairables()
            .iter()
            .filter(|p| !p.skips(round) && !playing.contains(&p.id()))
            .map(Pairable::id)
            .collect()
    }

    /// Pairs `pool` in `round` and commits the new games.
    ///
    /// The round must be the next one or the last paired one; an odd pool
    /// gets the bye. Nothing is committed when pairing fails.
    pub fn pair(&mut self, round: u32, pool: &[Id], ids: &IdAllocator) -> PairingResult<Vec<Game>> {
        self.pairing.validate()?;
        if round == 0 {
            return Err(PairingError::precondition("round numbers start at 1"));
        }
        if round > self.last_round() + 1 {
            return Err(PairingError::precondition("previous round not paired"));
        }
        if round > self.rounds {
            return Err(PairingError::precondition("too many rounds"));
        }
        if pool.is_empty() {
            return Err(PairingError::precondition(format!("nobody to pair in round {}", round)));
        }

        let games = {
            let playing = self.playing_in(round);
            let mut seen = HashSet::new();
            let mut pairables = Vec::with_capacity(pool.len() + 1);
            for &id in pool {
                if !seen.insert(id) {
                    return Err(PairingError::precondition(format!("#{} appears twice in the pool", id)));
                }
                let pairable = self.pairable(id)?;
                if playing.contains(&id) {
                    return Err(PairingError::precondition(format!(
                        "#{} is already paired in round {}",
                        id, round
                    )));
                }
                if pairable.skips(round) {
                    return Err(PairingError::precondition(format!("#{} skips round {}", id, round)));
                }
                pairables.push(pairable);
            }

            if pairables.len() == 1 && self.pairing.params.lone_pairable == LonePairablePolicy::NoGame {
                info!("Round {} of tournament #{} has a single pairable, no game", round, self.id);
                Vec::new()
            } else {
                if pairables.len() % 2 == 1 {
                    if self.games(round).is_some_and(|games| games.values().any(Game::is_bye)) {
                        return Err(PairingError::precondition(format!(
                            "round {} already has a bye, pair an even number of competitors",
                            round
                        )));
                    }
                    debug!("Adding the bye to round {}", round);
                    pairables.push(Pairable::Bye);
                }
                let context = SolverContext {
                    round,
                    history: self.history_before(round),
                    pairables,
                    params: &self.pairing.params,
                    used_tables: self.used_tables(round),
                };
                solver_for(&self.pairing.system, context)?.pair(ids)?
            }
        };

        self.commit(round, &games);
        Ok(games)
    }

    fn commit(&mut self, round: u32, games: &[Game]) {
        if round as usize > self.games.len() {
            self.games.push(BTreeMap::new());
        }
        let index = round as usize - 1;
        self.games[index].extend(games.iter().map(|game| (game.id, game.clone())));
        info!(
            "Committed {} games in round {} of tournament #{}",
            games.len(),
            round,
            self.id
        );
    }

    /// Deletes the games of the last paired round
    pub fn unpair(&mut self, round: u32) -> PairingResult<Vec<Game>> {
        let last = self.last_round();
        if last == 0 {
            return Err(PairingError::precondition("no round paired yet"));
        }
        if round != last {
            return Err(PairingError::precondition(format!(
                "only the last round ({}) can be unpaired",
                last
            )));
        }
        let removed = self.games.pop().unwrap_or_default();
        info!("Unpaired round {} of tournament #{}", round, self.id);
        Ok(removed.into_values().collect())
    }

    /// Standings after `round`, best first
    pub fn standings(&self, round: u32) -> PairingResult<Vec<Standing>> {
        if round == 0 || round > self.last_round() {
            return Err(PairingError::precondition(format!("round {} is not paired", round)));
        }
        let context = SolverContext {
            round: round + 1,
            history: self.history_before(round + 1),
            pairables: self.pairables(),
            params: &self.pairing.params,
            used_tables: BTreeSet::new(),
        };
        let solver = solver_for(&self.pairing.system, context)?;
        let base = solver.base();
        let criteria = self.criteria();

        let mut rows: Vec<Standing> = base
            .pairables()
            .iter()
            .map(|p| Standing {
                place: 0,
                id: p.id(),
                name: p.name_seed(" "),
                values: criteria.iter().map(|&c| base.criterion(p, c)).collect(),
            })
            .collect();
        rows.sort_by(|a, b| compare_values(&b.values, &a.values).then(a.id.cmp(&b.id)));

        let mut place = 0;
        for index in 0..rows.len() {
            if index == 0 || rows[index].values != rows[index - 1].values {
                place = index as u32 + 1;
            }
            rows[index].place = place;
        }
        Ok(rows)
    }
}

fn team_view<'a>(team: &'a Team, players: &'a BTreeMap<Id, Player>) -> Pairable<'a> {
    Pairable::Team {
        team,
        members: team.players.iter().filter_map(|id| players.get(id)).collect(),
    }
}

fn not_a_team_tournament(id: Id) -> PairingError {
    PairingError::precondition(format!("tournament #{} is not a team tournament", id))
}

fn compare_values(a: &[f64], b: &[f64]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.total_cmp(y))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::player;
    use crate::domain::PairingSystem;

    fn info(kind: TournamentType) -> TournamentInfo {
        TournamentInfo {
            kind,
            name: "Spring Open".to_string(),
            short_name: "spring".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            country: "FR".to_string(),
            location: "Paris".to_string(),
            online: false,
            time_system: TimeSystem::SuddenDeath { main_time: 3600 },
            rules: Rules::French,
            goban_size: 19,
            komi: 7.5,
        }
    }

    fn swiss(rounds: u32, players: usize) -> Tournament {
        let mut tournament =
            Tournament::new(1, info(TournamentType::Individual), rounds, PairingConfig::new(PairingSystem::Swiss))
                .unwrap();
        for id in 1..=players as Id {
            tournament
                .add_player(player(id, -(id % 5), &format!("club{}", id), "FR"))
                .unwrap();
        }
        tournament
    }

    fn all(tournament: &Tournament, round: u32) -> Vec<Id> {
        tournament.default_pool(round)
    }

    #[test]
    fn test_round_sequence_is_enforced() {
        let mut tournament = swiss(2, 4);
        let ids = IdAllocator::new();
        let pool = all(&tournament, 2);

        let err = tournament.pair(2, &pool, &ids).unwrap_err();
        assert_eq!(err.to_string(), "previous round not paired");
        assert_eq!(tournament.last_round(), 0);

        tournament.pair(1, &pool, &ids).unwrap();
        tournament.pair(2, &all(&tournament, 2), &ids).unwrap();
        let err = tournament.pair(3, &pool, &ids).unwrap_err();
        assert_eq!(err.to_string(), "too many rounds");
        assert_eq!(tournament.last_round(), 2);
    }

    #[test]
    fn test_odd_pool_gets_one_bye() {
        let mut tournament = swiss(3, 5);
        let ids = IdAllocator::new();
        let games = tournament.pair(1, &all(&tournament, 1), &ids).unwrap();
        assert_eq!(games.len(), 3);
        assert_eq!(games.iter().filter(|g| g.is_bye()).count(), 1);
        assert_eq!(tournament.games(1).unwrap().len(), 3);
    }

    #[test]
    fn test_partial_rounds_merge() {
        let mut tournament = swiss(3, 6);
        let ids = IdAllocator::new();
        let first = tournament.pair(1, &[1, 2, 3, 4], &ids).unwrap();
        assert_eq!(first.len(), 2);

        assert_eq!(tournament.default_pool(1), vec![5, 6]);
        let err = tournament.pair(1, &[1, 5], &ids).unwrap_err();
        assert!(matches!(err, PairingError::Precondition(_)));

        let second = tournament.pair(1, &[5, 6], &ids).unwrap();
        assert_eq!(second[0].table, 3);
        assert_eq!(tournament.games(1).unwrap().len(), 3);
    }

    #[test]
    fn test_round_gets_at_most_one_bye() {
        let mut tournament = swiss(3, 6);
        let ids = IdAllocator::new();
        tournament.pair(1, &[1, 2, 3], &ids).unwrap();

        let err = tournament.pair(1, &[4, 5, 6], &ids).unwrap_err();
        assert!(matches!(err, PairingError::Precondition(_)));
        assert_eq!(tournament.games(1).unwrap().len(), 2);

        tournament.pair(1, &[4, 5], &ids).unwrap();
        assert!(tournament.pair(1, &[6], &ids).is_err());
        assert_eq!(tournament.games(1).unwrap().len(), 3);
    }

    #[test]
    fn test_oversized_weights_are_config_errors() {
        let mut pairing = PairingConfig::new(PairingSystem::Swiss);
        pairing.params.base.avoid_duplicating_game = 1e13;
        let err = Tournament::new(1, info(TournamentType::Individual), 3, pairing).unwrap_err();
        assert!(matches!(err, PairingError::Config(_)));

        let mut tournament = swiss(3, 4);
        tournament.pairing.params.base.avoid_duplicating_game = 1e13;
        let err = tournament.pair(1, &all(&tournament, 1), &IdAllocator::new()).unwrap_err();
        assert!(matches!(err, PairingError::Config(_)));
        assert_eq!(tournament.last_round(), 0);
    }

    #[test]
    fn test_rejections_leave_state_untouched() {
        let mut tournament = swiss(3, 4);
        let ids = IdAllocator::new();
        assert!(matches!(tournament.pair(1, &[], &ids), Err(PairingError::Precondition(_))));
        assert!(matches!(
            tournament.pair(1, &[1, 99], &ids),
            Err(PairingError::Lookup { kind: "player", id: 99 })
        ));
        assert!(matches!(tournament.pair(1, &[1, 1], &ids), Err(PairingError::Precondition(_))));
        assert_eq!(tournament.last_round(), 0);
    }

    #[test]
    fn test_lone_pairable_policy() {
        let mut tournament = swiss(2, 1);
        let ids = IdAllocator::new();
        let games = tournament.pair(1, &[1], &ids).unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!((games[0].black, games[0].white), (BYE_ID, 1));

        let mut quiet = swiss(2, 1);
        quiet.pairing.params.lone_pairable = LonePairablePolicy::NoGame;
        assert!(quiet.pair(1, &[1], &ids).unwrap().is_empty());
        assert_eq!(quiet.last_round(), 1);
        assert!(quiet.games(1).unwrap().is_empty());
    }

    #[test]
    fn test_unpair_only_last_round() {
        let mut tournament = swiss(3, 4);
        let ids = IdAllocator::new();
        assert!(tournament.unpair(1).is_err());
        tournament.pair(1, &all(&tournament, 1), &ids).unwrap();
        tournament.pair(2, &all(&tournament, 2), &ids).unwrap();

        assert!(tournament.unpair(1).is_err());
        let removed = tournament.unpair(2).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(tournament.last_round(), 1);
    }

    #[test]
    fn test_skipping_player_is_left_out() {
        let mut tournament = swiss(3, 5);
        let mut skipper = tournament.player(5).unwrap().clone();
        skipper.skip.insert(1);
        tournament.replace_player(skipper).unwrap();

        assert_eq!(tournament.default_pool(1), vec![1, 2, 3, 4]);
        let ids = IdAllocator::new();
        assert!(tournament.pair(1, &[1, 2, 3, 4, 5], &ids).is_err());
    }

    #[test]
    fn test_standings_share_places_on_ties() {
        let mut tournament = swiss(3, 4);
        let ids = IdAllocator::new();
        let games = tournament.pair(1, &all(&tournament, 1), &ids).unwrap();
        for game in &games {
            tournament.set_result(1, game.id, Some(GameResult::Black)).unwrap();
        }

        let standings = tournament.standings(1).unwrap();
        assert_eq!(standings.len(), 4);
        assert_eq!(standings[0].values[0], 1.0);
        assert_eq!(standings[0].place, 1);
        assert_eq!(standings[1].place, 1);
        assert_eq!(standings[2].place, 3);
        assert_eq!(standings[3].place, 3);
        assert!(tournament.standings(2).is_err());
    }

    #[test]
    fn test_team_roster() {
        let mut tournament = Tournament::new(
            7,
            info(TournamentType::Team2),
            3,
            PairingConfig::new(PairingSystem::Swiss),
        )
        .unwrap();
        tournament.add_player(player(1, -3, "Paris", "FR")).unwrap();
        tournament.add_player(player(2, 0, "Paris", "FR")).unwrap();

        let bad = Team {
            id: 10,
            name: "Ghosts".to_string(),
            players: [1, 42].into_iter().collect(),
            skip: BTreeSet::new(),
        };
        assert!(matches!(
            tournament.add_team(bad),
            Err(PairingError::Lookup { kind: "player", id: 42 })
        ));

        let team = Team {
            id: 10,
            name: "Paris".to_string(),
            players: [1, 2].into_iter().collect(),
            skip: BTreeSet::new(),
        };
        tournament.add_team(team).unwrap();
        let pairables = tournament.pairables();
        assert_eq!(pairables.len(), 1);
        assert_eq!(pairables[0].rank(), -1);
        assert!(tournament.remove_player(1).is_err());
        assert_eq!(tournament.pairable_ids(), vec![1, 2, 10]);
    }

    #[test]
    fn test_individual_tournament_has_no_teams() {
        let mut tournament = swiss(1, 2);
        let team = Team {
            id: 10,
            name: "Nope".to_string(),
            players: [1].into_iter().collect(),
            skip: BTreeSet::new(),
        };
        assert!(tournament.add_team(team).is_err());
        assert!(tournament.add_player(player(1, 0, "", "")).is_err());
    }

    #[test]
    fn test_mcmahon_criteria() {
        let system = PairingSystem::McMahon {
            mm_floor: -20,
            mm_bar: 0,
            mms_correction: 0.0,
        };
        let tournament = Tournament::new(1, info(TournamentType::Individual), 3, PairingConfig::new(system)).unwrap();
        assert_eq!(tournament.criteria(), vec![Criterion::Mms, Criterion::Sos, Criterion::Sosos]);

        let broken = PairingSystem::McMahon {
            mm_floor: 0,
            mm_bar: -5,
            mms_correction: 0.0,
        };
        assert!(matches!(
            Tournament::new(1, info(TournamentType::Individual), 3, PairingConfig::new(broken)),
            Err(PairingError::Config(_))
        ));
    }

    #[test]
    fn test_type_tokens() {
        assert_eq!(TournamentType::Rengo3.players_number(), 3);
        assert!(!TournamentType::Pairgo.individual());
        assert!(TournamentType::Team4.individual());
        let kind: TournamentType = serde_json::from_str("\"RENGO2\"").unwrap();
        assert_eq!(kind, TournamentType::Rengo2);
        assert!(serde_json::from_str::<TournamentType>("\"TEAM9\"").is_err());
    }
}

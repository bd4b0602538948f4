use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use log::info;
use serde_json::{json, Value};

use crate::config::settings::PairingSettings;
use crate::domain::{Game, GameResult, Id, PairingConfig, Player, Standing, Team, Tournament};
use crate::errors::{parse_context, PairingError, PairingResult};
use crate::events::{Event, EventSink, Notification};
use crate::store::{IdAllocator, Store};

/// Entry point for every operation on stored tournaments.
///
/// Mutations of one tournament run one at a time: each loads the
/// tournament, applies the change and writes it back while holding that
/// tournament's lock. Notifications go out only after the write.
pub struct TournamentService<S: Store> {
    store: S,
    events: Box<dyn EventSink>,
    defaults: PairingSettings,
    locks: Mutex<HashMap<Id, Arc<Mutex<()>>>>,
}

impl<S: Store> TournamentService<S> {
    pub fn new(store: S, events: Box<dyn EventSink>, defaults: PairingSettings) -> Self {
        Self {
            store,
            events,
            defaults,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stores a tournament document, allocating its id when absent
    pub fn import(&self, mut doc: Value) -> Result<Id> {
        let fields = doc
            .as_object_mut()
            .ok_or_else(|| PairingError::bad_document("expecting an object"))?;
        if !fields.contains_key("pairing") {
            let mut pairing = PairingConfig::new(self.defaults.system.clone());
            pairing.params = self.defaults.params.clone();
            fields.insert("pairing".to_string(), serde_json::to_value(pairing)?);
        }
        let id = match fields.get("id").and_then(Value::as_i64) {
            Some(id) if id > 0 => Id::try_from(id)
                .map_err(|_| PairingError::bad_document(format!("tournament id {} is out of range", id)))?,
            _ => self.store.ids().next_tournament_id(),
        };
        fields.insert("id".to_string(), Value::from(id));

        let tournament: Tournament =
            serde_json::from_value(doc).with_context(|| parse_context("tournament document"))?;
        self.store.add(&tournament)?;
        info!("Imported tournament #{} ({})", id, tournament.info.name);
        Ok(id)
    }

    pub fn tournament(&self, id: Id) -> Result<Tournament> {
        self.store
            .get(id)?
            .ok_or_else(|| PairingError::unknown_tournament(id).into())
    }

    pub fn delete_tournament(&self, id: Id) -> Result<()> {
        self.store.delete(id)?;
        self.locks.lock().map_err(|_| anyhow!("lock table poisoned"))?.remove(&id);
        Ok(())
    }

    fn lock_for(&self, id: Id) -> Result<Arc<Mutex<()>>> {
        let mut locks = self.locks.lock().map_err(|_| anyhow!("lock table poisoned"))?;
        Ok(locks.entry(id).or_default().clone())
    }

    /// Applies `change` to tournament `id` and saves the result. A failed
    /// change leaves the stored tournament as it was.
    fn mutate<T, F>(&self, id: Id, change: F) -> Result<T>
    where
        F: FnOnce(&mut Tournament, &IdAllocator) -> PairingResult<T>,
    {
        let lock = self.lock_for(id)?;
        let _guard = lock.lock().map_err(|_| anyhow!("tournament #{} lock poisoned", id))?;
        let mut tournament = self.tournament(id)?;
        let value = change(&mut tournament, self.store.ids())?;
        self.store.replace(&tournament)?;
        Ok(value)
    }

    fn notify(&self, event: Event, tournament: Id, data: Value) {
        self.events.dispatch(Notification::new(event, tournament, data));
    }

    // Players

    pub fn add_player(&self, tournament_id: Id, doc: &Value) -> Result<Player> {
        let player = self.mutate(tournament_id, |tournament, ids| {
            let player = Player::from_document(doc, None, ids.next_pairable_id())?;
            tournament.add_player(player.clone())?;
            Ok(player)
        })?;
        self.notify(Event::PlayerAdded, tournament_id, serde_json::to_value(&player)?);
        Ok(player)
    }

    pub fn update_player(&self, tournament_id: Id, player_id: Id, doc: &Value) -> Result<Player> {
        let (player, teams) = self.mutate(tournament_id, |tournament, _| {
            let previous = tournament.player(player_id)?;
            let player = Player::from_document(doc, Some(previous), player_id)?;
            tournament.replace_player(player.clone())?;
            // Teams derive their fields from members
            let teams = tournament
                .teams()
                .filter(|team| team.players.contains(&player_id))
                .map(|team| tournament.pairable(team.id)?.to_document())
                .collect::<PairingResult<Vec<Value>>>()?;
            Ok((player, teams))
        })?;
        self.notify(Event::PlayerUpdated, tournament_id, serde_json::to_value(&player)?);
        for team in teams {
            self.notify(Event::TeamUpdated, tournament_id, team);
        }
        Ok(player)
    }

    pub fn delete_player(&self, tournament_id: Id, player_id: Id) -> Result<()> {
        self.mutate(tournament_id, |tournament, _| tournament.remove_player(player_id))?;
        self.notify(Event::PlayerDeleted, tournament_id, json!({ "id": player_id }));
        Ok(())
    }

    // Teams

    pub fn add_team(&self, tournament_id: Id, doc: &Value) -> Result<Value> {
        let team = self.mutate(tournament_id, |tournament, ids| {
            let team = Team::from_document(doc, None, ids.next_pairable_id())?;
            let id = team.id;
            tournament.add_team(team)?;
            tournament.pairable(id)?.to_document()
        })?;
        self.notify(Event::TeamAdded, tournament_id, team.clone());
        Ok(team)
    }

    pub fn update_team(&self, tournament_id: Id, team_id: Id, doc: &Value) -> Result<Value> {
        let team = self.mutate(tournament_id, |tournament, _| {
            let previous = tournament.team(team_id)?;
            let team = Team::from_document(doc, Some(previous), team_id)?;
            tournament.replace_team(team)?;
            tournament.pairable(team_id)?.to_document()
        })?;
        self.notify(Event::TeamUpdated, tournament_id, team.clone());
        Ok(team)
    }

    pub fn delete_team(&self, tournament_id: Id, team_id: Id) -> Result<()> {
        self.mutate(tournament_id, |tournament, _| tournament.remove_team(team_id))?;
        self.notify(Event::TeamDeleted, tournament_id, json!({ "id": team_id }));
        Ok(())
    }

    // Rounds

    /// Pairs `round`; without an explicit pool every available competitor
    /// is paired.
    pub fn pair(&self, tournament_id: Id, round: u32, pool: Option<Vec<Id>>) -> Result<Vec<Game>> {
        let games = self.mutate(tournament_id, |tournament, ids| {
            let pool = pool.unwrap_or_else(|| tournament.default_pool(round));
            tournament.pair(round, &pool, ids)
        })?;
        self.notify(
            Event::GamesAdded,
            tournament_id,
            json!({ "round": round, "games": games }),
        );
        Ok(games)
    }

    pub fn unpair(&self, tournament_id: Id, round: u32) -> Result<Vec<Game>> {
        let games = self.mutate(tournament_id, |tournament, _| tournament.unpair(round))?;
        self.notify(
            Event::GamesDeleted,
            tournament_id,
            json!({ "round": round, "games": games }),
        );
        Ok(games)
    }

    pub fn set_result(&self, tournament_id: Id, round: u32, game_id: Id, result: Option<GameResult>) -> Result<()> {
        self.mutate(tournament_id, |tournament, _| tournament.set_result(round, game_id, result))
    }

    pub fn standings(&self, tournament_id: Id, round: u32) -> Result<Vec<Standing>> {
        Ok(self.tournament(tournament_id)?.standings(round)?)
    }
}

use std::collections::BTreeMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use log::debug;

use super::{IdAllocator, Store};
use crate::domain::{Id, Tournament};
use crate::errors::PairingError;

/// Tournaments kept in memory, lost on exit
#[derive(Debug, Default)]
pub struct MemoryStore {
    ids: IdAllocator,
    tournaments: RwLock<BTreeMap<Id, Tournament>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> anyhow::Error {
    anyhow!("tournament map lock poisoned")
}

impl Store for MemoryStore {
    fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    fn list(&self) -> Result<Vec<Id>> {
        let tournaments = self.tournaments.read().map_err(|_| poisoned())?;
        Ok(tournaments.keys().copied().collect())
    }

    fn get(&self, id: Id) -> Result<Option<Tournament>> {
        let tournaments = self.tournaments.read().map_err(|_| poisoned())?;
        Ok(tournaments.get(&id).cloned())
    }

    fn add(&self, tournament: &Tournament) -> Result<()> {
        let mut tournaments = self.tournaments.write().map_err(|_| poisoned())?;
        if tournaments.contains_key(&tournament.id) {
            return Err(PairingError::Store(format!("tournament #{} already exists", tournament.id)).into());
        }
        self.ids.observe(tournament);
        tournaments.insert(tournament.id, tournament.clone());
        debug!("Stored tournament #{}", tournament.id);
        Ok(())
    }

    fn replace(&self, tournament: &Tournament) -> Result<()> {
        let mut tournaments = self.tournaments.write().map_err(|_| poisoned())?;
        let slot = tournaments
            .get_mut(&tournament.id)
            .ok_or_else(|| PairingError::Store(format!("tournament #{} does not exist", tournament.id)))?;
        *slot = tournament.clone();
        self.ids.observe(tournament);
        Ok(())
    }

    fn delete(&self, id: Id) -> Result<()> {
        let mut tournaments = self.tournaments.write().map_err(|_| poisoned())?;
        tournaments
            .remove(&id)
            .ok_or_else(|| PairingError::Store(format!("tournament #{} does not exist", id)))?;
        debug!("Deleted tournament #{}", id);
        Ok(())
    }
}

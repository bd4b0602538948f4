use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use log::{info, warn};

use super::{IdAllocator, Store};
use crate::domain::{Id, Tournament};
use crate::errors::{parse_context, store_context, PairingError};

/// One pretty-printed JSON document per tournament, named `<id>.json`
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    ids: IdAllocator,
    /// Serializes writes so that conflict checks and writes stay atomic
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Opens (creating if needed) the store directory and moves the id
    /// sequences past every stored tournament.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create store directory {}", dir.display()))?;

        let store = Self {
            dir,
            ids: IdAllocator::new(),
            write_lock: Mutex::new(()),
        };
        let stored = store.list()?;
        for id in &stored {
            if let Some(tournament) = store.get(*id)? {
                store.ids.observe(&tournament);
            }
        }
        info!("Opened store {} with {} tournaments", store.dir.display(), stored.len());
        Ok(store)
    }

    fn build_path(&self, id: Id) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    fn write_json(&self, path: &Path, tournament: &Tournament) -> Result<()> {
        let json = serde_json::to_string_pretty(tournament).context("Failed to serialize tournament")?;
        // Write aside then rename, a crash never leaves half a document
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, path).with_context(|| format!("Failed to move {} into place", tmp.display()))?;
        Ok(())
    }

    fn read_json_opt(&self, path: &Path) -> Result<Option<Tournament>> {
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let tournament = serde_json::from_str(&json).with_context(|| {
            format!(
                "{} from {:?}. First 200 chars: {}",
                parse_context("tournament"),
                path,
                json.chars().take(200).collect::<String>()
            )
        })?;
        Ok(Some(tournament))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock.lock().map_err(|_| anyhow!("store write lock poisoned"))
    }
}

impl Store for FileStore {
    fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    fn list(&self) -> Result<Vec<Id>> {
        let entries = fs::read_dir(&self.dir).with_context(|| format!("Failed to list {}", self.dir.display()))?;
        let mut ids = BTreeSet::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()).map(str::parse::<Id>) {
                Some(Ok(id)) => {
                    ids.insert(id);
                }
                _ => warn!("Ignoring stray file {}", path.display()),
            }
        }
        Ok(ids.into_iter().collect())
    }

    fn get(&self, id: Id) -> Result<Option<Tournament>> {
        self.read_json_opt(&self.build_path(id))
            .with_context(|| store_context("load", id))
    }

    fn add(&self, tournament: &Tournament) -> Result<()> {
        let _guard = self.lock()?;
        let path = self.build_path(tournament.id);
        if path.exists() {
            return Err(PairingError::Store(format!("tournament #{} already exists", tournament.id)).into());
        }
        self.write_json(&path, tournament)
            .with_context(|| store_context("add", tournament.id))?;
        self.ids.observe(tournament);
        info!("Saved tournament #{} to {}", tournament.id, path.display());
        Ok(())
    }

    fn replace(&self, tournament: &Tournament) -> Result<()> {
        let _guard = self.lock()?;
        let path = self.build_path(tournament.id);
        if !path.exists() {
            return Err(PairingError::Store(format!("tournament #{} does not exist", tournament.id)).into());
        }
        self.write_json(&path, tournament)
            .with_context(|| store_context("replace", tournament.id))?;
        self.ids.observe(tournament);
        info!("Saved tournament #{} to {}", tournament.id, path.display());
        Ok(())
    }

    fn delete(&self, id: Id) -> Result<()> {
        let _guard = self.lock()?;
        let path = self.build_path(id);
        if !path.exists() {
            return Err(PairingError::Store(format!("tournament #{} does not exist", id)).into());
        }
        fs::remove_file(&path).with_context(|| store_context("delete", id))?;
        info!("Deleted tournament #{}", id);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::fixtures::player;
    use crate::domain::{PairingConfig, PairingSystem, Rules, TimeSystem, TournamentInfo, TournamentType};

    pub fn sample(id: Id) -> Tournament {
        let info = TournamentInfo {
            kind: TournamentType::Individual,
            name: format!("Tournament {}", id),
            short_name: format!("t{}", id),
            start_date: NaiveDate::from_ymd_opt(2024, 5, 4).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 5, 5).unwrap(),
            country: "FR".to_string(),
            location: "Lyon".to_string(),
            online: false,
            time_system: TimeSystem::Canadian {
                main_time: 2400,
                byoyomi: 300,
                stones: 15,
            },
            rules: Rules::Japanese,
            goban_size: 19,
            komi: 6.5,
        };
        let mut tournament = Tournament::new(id, info, 4, PairingConfig::new(PairingSystem::Swiss)).unwrap();
        for pid in 1..=4 {
            tournament.add_player(player(pid, -pid, "Lyon", "FR")).unwrap();
        }
        tournament
    }

    #[test]
    fn test_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let mut tournament = sample(5);
        store.add(&tournament).unwrap();

        tournament.pair(1, &tournament.default_pool(1), store.ids()).unwrap();
        store.replace(&tournament).unwrap();

        let loaded = store.get(5).unwrap().unwrap();
        assert_eq!(loaded, tournament);
        assert_eq!(store.list().unwrap(), vec![5]);
    }

    #[test]
    fn test_reopen_recovers_ids() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::open(dir.path()).unwrap();
            let mut tournament = sample(2);
            tournament.pair(1, &tournament.default_pool(1), store.ids()).unwrap();
            store.add(&tournament).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "not a tournament").unwrap();

        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.ids().next_tournament_id(), 3);
        assert_eq!(store.ids().next_pairable_id(), 5);
        assert_eq!(store.ids().next_game_id(), 3);
    }

    #[test]
    fn test_conflicts_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.add(&sample(1)).unwrap();

        let err = store.add(&sample(1)).unwrap_err();
        assert!(matches!(err.downcast_ref::<PairingError>(), Some(PairingError::Store(_))));
        assert!(store.replace(&sample(8)).is_err());
        assert!(store.delete(8).is_err());

        store.delete(1).unwrap();
        assert!(store.get(1).unwrap().is_none());
    }

    #[test]
    fn test_corrupted_document_reports_context() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("4.json"), "{ not json").unwrap();
        let err = FileStore::open(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to load tournament #4"));
    }
}

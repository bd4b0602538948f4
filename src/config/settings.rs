use std::path::PathBuf;

use crate::domain::{PairingParams, PairingSystem};

pub const STORE_PATH_VAR: &str = "PAIRING_STORE_PATH";

pub struct StoreSettings {
    /// Directory holding one JSON document per tournament
    pub path: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: std::env::var(STORE_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("tournaments")),
        }
    }
}

/// Used for imported tournaments lacking a `pairing` section
pub struct PairingSettings {
    pub system: PairingSystem,
    pub params: PairingParams,
}

impl Default for PairingSettings {
    fn default() -> Self {
        Self {
            system: PairingSystem::Swiss,
            params: PairingParams::default(),
        }
    }
}

pub struct AppConfig {
    pub store: StoreSettings,
    pub pairing: PairingSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            store: StoreSettings::default(),
            pairing: PairingSettings::default(),
        }
    }

    /// Command line override of the store directory
    pub fn with_store_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.store.path = path;
        }
        self
    }
}

//! Export/import settings
//!
//! Non-sensitive configuration in a plain JSON file. Every field has a
//! default, so a missing or partial file is fine.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::crypto::DEFAULT_ITERATIONS;
use crate::error::{Result, VaultError};
use crate::wallet::AppInfo;

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// PBKDF2 iterations for newly exported wallets
    pub kdf_iterations: u32,
    /// PBKDF2 iterations for per-entry blobs under the master password
    pub entry_kdf_iterations: u32,
    /// Application name written into wallet metadata
    pub app_name: String,
    /// Application version written into wallet metadata
    pub app_version: String,
    /// Version tag of the inner `{version, entries}` document
    pub payload_version: String,
    /// Accept wallets that carry no signature or encryption
    pub allow_unsigned_import: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            kdf_iterations: DEFAULT_ITERATIONS,
            entry_kdf_iterations: DEFAULT_ITERATIONS,
            app_name: "password-managment".to_string(),
            app_version: "1.0".to_string(),
            payload_version: "1.0".to_string(),
            allow_unsigned_import: true,
        }
    }
}

impl Settings {
    /// Load settings from file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings file found, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| VaultError::Config(format!("cannot read {:?}: {}", path, e)))?;
        let settings: Settings = serde_json::from_str(&contents)
            .map_err(|e| VaultError::Config(format!("invalid settings file {:?}: {}", path, e)))?;
        settings.validate()?;

        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Reject values no cipher operation could run with
    pub fn validate(&self) -> Result<()> {
        if self.kdf_iterations == 0 {
            return Err(VaultError::contract("kdfIterations must be at least 1"));
        }
        if self.entry_kdf_iterations == 0 {
            return Err(VaultError::contract("entryKdfIterations must be at least 1"));
        }
        Ok(())
    }

    pub fn app(&self) -> AppInfo {
        AppInfo {
            name: self.app_name.clone(),
            version: self.app_version.clone(),
        }
    }
}

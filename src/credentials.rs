//! Credential Store
//!
//! File-backed key-value area. The bridge credential lives under the fixed
//! key [`USERNAME_KEY`] so later runs skip re-registration.

use crate::error::HueResult;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const USERNAME_KEY: &str = "username";

#[derive(Debug, Clone)]
pub struct CredentialStore {
    dir: PathBuf,
}

impl CredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the default data directory
    pub fn open_default() -> Self {
        Self::new(crate::config::data_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn exists(&self, key: &str) -> bool {
        self.dir.join(key).exists()
    }

    pub fn read(&self, key: &str) -> HueResult<Option<String>> {
        let path = self.dir.join(key);
        if !path.exists() {
            return Ok(None);
        }
        let value = std::fs::read_to_string(path)?;
        let value = value.trim_matches(|c| c == ' ' || c == '\n').to_string();
        Ok(if value.is_empty() { None } else { Some(value) })
    }

    pub fn write(&self, key: &str, value: &str) -> HueResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.dir.join(key), value)?;
        debug!("Stored '{}' in {:?}", key, self.dir);
        Ok(())
    }

    pub fn username(&self) -> HueResult<Option<String>> {
        self.read(USERNAME_KEY)
    }

    pub fn save_username(&self, username: &str) -> HueResult<()> {
        self.write(USERNAME_KEY, username)
    }
}

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::model::User;

/// An authenticated session: the backend token plus the user it belongs to.
///
/// Populated on login/register success, cleared on logout, read at startup
/// to decide whether weather calls carry an `Authorization` header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Disk-backed store for the current [`Session`].
///
/// Callers pass the loaded session around explicitly; nothing in the crate
/// reads it through a global.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store at the platform config location, next to `config.toml`.
    pub fn open() -> Result<Self> {
        let dirs = ProjectDirs::from("dev", "gdash", "gdash-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(Self { path: dirs.config_dir().join("session.toml") })
    }

    /// Store at an explicit path.
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the current session, or `None` when nobody is signed in.
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file: {}", self.path.display()))?;

        let session: Session = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse session file: {}", self.path.display()))?;

        Ok(Some(session))
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create session directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(session).context("Failed to serialize session")?;

        fs::write(&self.path, toml)
            .with_context(|| format!("Failed to write session file: {}", self.path.display()))?;

        Ok(())
    }

    /// Forget the session. Removing an already-absent file is not an error.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| {
                format!("Failed to remove session file: {}", self.path.display())
            }),
        }
    }
}

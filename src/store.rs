//! Durable session-state storage.
//!
//! One JSON file per `(kind, name)` identity, namespaced by kind:
//! `<root>/chromium/default_fairy.json`. The store is deliberately dumb —
//! save overwrites, load reads, no merging — and knows nothing about
//! liveness; stale-record sweeping lives in [`crate::resolver::Registry`].

use crate::errors::{FairyError, Result};
use crate::types::{BrowserIdentity, BrowserKind, SessionState};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Keyed persistence for [`SessionState`] records.
///
/// Implementations must round-trip every field exactly and keep at most one
/// record per identity.
pub trait StateStore {
    fn save(&self, state: &SessionState) -> Result<()>;
    fn load(&self, identity: &BrowserIdentity) -> Result<SessionState>;
    fn delete(&self, identity: &BrowserIdentity) -> Result<()>;
    /// Every stored record across all kinds, sorted by `(kind, name)` so
    /// enumeration order is deterministic. No liveness filtering.
    fn list(&self) -> Result<Vec<SessionState>>;
}

/// Directory-of-files implementation of [`StateStore`].
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted in the per-user local data directory.
    pub fn default_location() -> Result<Self> {
        let base = dirs::data_local_dir().ok_or_else(|| {
            FairyError::IoError(io::Error::new(
                io::ErrorKind::NotFound,
                "no local data directory on this host",
            ))
        })?;
        Ok(Self::new(base.join("fairybrowser").join("sessions")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, identity: &BrowserIdentity) -> Result<PathBuf> {
        validate_name(&identity.name)?;
        Ok(self
            .root
            .join(identity.kind.as_str())
            .join(format!("{}.json", identity.name)))
    }

    fn read_entry(&self, path: &Path, identity: &BrowserIdentity) -> Result<SessionState> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(FairyError::NotFound(identity.clone()));
            }
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_str::<SessionState>(&raw) {
            Ok(state) => {
                if state.name != identity.name || state.kind != identity.kind {
                    return Err(FairyError::InvalidIdentity(format!(
                        "record at {} claims {}/{}, expected {}",
                        path.display(),
                        state.kind,
                        state.name,
                        identity
                    )));
                }
                Ok(state)
            }
            Err(err) => {
                // Corrupt records are removed and reported as absent.
                warn!(path = %path.display(), error = %err, "removing unreadable session record");
                let _ = fs::remove_file(path);
                Err(FairyError::NotFound(identity.clone()))
            }
        }
    }
}

impl StateStore for FileStore {
    fn save(&self, state: &SessionState) -> Result<()> {
        let path = self.entry_path(&state.identity())?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string(state)?)?;
        Ok(())
    }

    fn load(&self, identity: &BrowserIdentity) -> Result<SessionState> {
        let path = self.entry_path(identity)?;
        self.read_entry(&path, identity)
    }

    fn delete(&self, identity: &BrowserIdentity) -> Result<()> {
        let path = self.entry_path(identity)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn list(&self) -> Result<Vec<SessionState>> {
        let mut result = Vec::new();
        for kind in [BrowserKind::Chromium, BrowserKind::Edge] {
            let dir = self.root.join(kind.as_str());
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            };
            for entry in entries {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let identity = BrowserIdentity::new(stem, kind);
                match self.read_entry(&path, &identity) {
                    Ok(state) => result.push(state),
                    // Unreadable entries were already removed by read_entry.
                    Err(FairyError::NotFound(_)) => continue,
                    Err(err) => return Err(err),
                }
            }
        }
        result.sort_by(|a, b| (a.kind.as_str(), &a.name).cmp(&(b.kind.as_str(), &b.name)));
        Ok(result)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(FairyError::InvalidIdentity(format!(
            "session name {:?} is not usable as a storage key",
            name
        )));
    }
    Ok(())
}

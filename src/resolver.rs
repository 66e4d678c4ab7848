//! The reuse-or-launch decision point.
//!
//! [`Registry`] layers liveness reconciliation over a raw [`StateStore`]:
//! reading through it sweeps stale records out of storage. [`SessionResolver`]
//! then collapses "give me a running browser" into one call that either
//! returns a validated existing session or launches a new one.

use crate::errors::Result;
use crate::launcher::{Launch, LauncherConfig, ProcessLauncher};
use crate::liveness::{LivenessProbe, OsLiveness};
use crate::store::{FileStore, StateStore};
use crate::types::{BrowserIdentity, SessionState};
use tracing::{debug, info};

/// Liveness-aware view of a [`StateStore`].
pub struct Registry<S: StateStore, P: LivenessProbe> {
    store: S,
    probe: P,
}

impl<S: StateStore, P: LivenessProbe> Registry<S, P> {
    pub fn new(store: S, probe: P) -> Self {
        Self { store, probe }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Every live session, across all kinds. Records that fail the liveness
    /// check are deleted on the way through — this is the sweep point for
    /// stale entries.
    pub fn list_all(&self) -> Result<Vec<SessionState>> {
        let mut live = Vec::new();
        for state in self.store.list()? {
            if self.probe.is_live(&state) {
                live.push(state);
            } else {
                info!(session = %state, "dropping stale session record");
                self.store.delete(&state.identity())?;
            }
        }
        Ok(live)
    }

    /// Whether a live session exists for `identity`. A present-but-stale
    /// record is deleted and reported as absent.
    pub fn exists_live(&self, identity: &BrowserIdentity) -> Result<bool> {
        match self.store.load(identity) {
            Ok(state) => {
                if self.probe.is_live(&state) {
                    Ok(true)
                } else {
                    info!(session = %state, "dropping stale session record");
                    self.store.delete(identity)?;
                    Ok(false)
                }
            }
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// Resolves an optional identity to one authoritative live session.
pub struct SessionResolver<S: StateStore, P: LivenessProbe, L: Launch> {
    registry: Registry<S, P>,
    launcher: L,
}

impl<S: StateStore, P: LivenessProbe, L: Launch> SessionResolver<S, P, L> {
    pub fn new(registry: Registry<S, P>, launcher: L) -> Self {
        Self { registry, launcher }
    }

    pub fn registry(&self) -> &Registry<S, P> {
        &self.registry
    }

    /// Reuse the identity's live session if one exists, otherwise launch.
    ///
    /// With no identity, any live session will do (first in enumeration
    /// order); only when none exists is the default identity launched.
    /// Callers that need a specific session must pass its identity.
    pub fn resolve(&self, identity: Option<&BrowserIdentity>) -> Result<SessionState> {
        match identity {
            Some(identity) => {
                if self.registry.exists_live(identity)? {
                    let state = self.registry.store.load(identity)?;
                    debug!(session = %state, "reusing live session");
                    Ok(state)
                } else {
                    info!(%identity, "no live session, launching");
                    self.launcher.launch(identity)
                }
            }
            None => match self.registry.list_all()?.into_iter().next() {
                Some(state) => {
                    debug!(session = %state, "reusing first live session");
                    Ok(state)
                }
                None => {
                    let identity = BrowserIdentity::default();
                    info!(%identity, "no live sessions at all, launching default");
                    self.launcher.launch(&identity)
                }
            },
        }
    }
}

/// The stack used outside of tests: file-backed store in the user data
/// directory, OS liveness, real process launcher.
pub type DefaultResolver =
    SessionResolver<FileStore, OsLiveness, ProcessLauncher<FileStore>>;

pub fn default_resolver() -> Result<DefaultResolver> {
    resolver_with_config(LauncherConfig::default())
}

pub fn resolver_with_config(config: LauncherConfig) -> Result<DefaultResolver> {
    let store = FileStore::default_location()?;
    let launcher = ProcessLauncher::new(store.clone(), config);
    Ok(SessionResolver::new(
        Registry::new(store, OsLiveness),
        launcher,
    ))
}

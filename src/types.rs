use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which locally-installed browser family a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    #[default]
    Chromium,
    Edge,
}

impl BrowserKind {
    /// Stable lowercase token, also used as the state-directory name.
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chromium => "chromium",
            BrowserKind::Edge => "edge",
        }
    }

    /// First port tried when launching this kind. The ranges are disjoint
    /// so Chromium and Edge sessions never contend for the same port.
    pub fn port_scan_start(&self) -> u16 {
        match self {
            BrowserKind::Chromium => 13456,
            BrowserKind::Edge => 14456,
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowserKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" => Ok(BrowserKind::Chromium),
            "edge" => Ok(BrowserKind::Edge),
            other => Err(format!("unknown browser kind: {}", other)),
        }
    }
}

pub const DEFAULT_SESSION_NAME: &str = "default_fairy";

/// Logical identity of one independently-launchable browser session.
///
/// Identities are lookup keys: equality is `(name, kind)` and values are
/// never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BrowserIdentity {
    pub name: String,
    pub kind: BrowserKind,
}

impl BrowserIdentity {
    pub fn new(name: impl Into<String>, kind: BrowserKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Named Chromium identity.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, BrowserKind::Chromium)
    }
}

impl Default for BrowserIdentity {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_NAME, BrowserKind::Chromium)
    }
}

impl fmt::Display for BrowserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// One observed running session: a browser process reachable through its
/// remote-debugging port.
///
/// A persisted `SessionState` is a claim, not a guarantee — the process may
/// have exited or the port been reassigned since the record was written, so
/// it must be re-validated against the OS before being trusted
/// (see [`crate::liveness::is_live`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: BrowserKind,
    pub port: u16,
    pub pid: u32,
}

impl SessionState {
    pub fn identity(&self) -> BrowserIdentity {
        BrowserIdentity::new(self.name.clone(), self.kind)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} (port {}, pid {})",
            self.kind, self.name, self.port, self.pid
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_lowercase_token() {
        for kind in [BrowserKind::Chromium, BrowserKind::Edge] {
            assert_eq!(kind.as_str().parse::<BrowserKind>().unwrap(), kind);
        }
        assert!("safari".parse::<BrowserKind>().is_err());
    }

    #[test]
    fn session_state_uses_the_on_disk_field_names() {
        let state = SessionState {
            name: "default_fairy".to_string(),
            kind: BrowserKind::Chromium,
            port: 13456,
            pid: 4242,
        };

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "default_fairy",
                "type": "chromium",
                "port": 13456,
                "pid": 4242,
            })
        );

        let back: SessionState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn identity_equality_is_name_and_kind() {
        let a = BrowserIdentity::named("t1");
        let b = BrowserIdentity::new("t1", BrowserKind::Chromium);
        let c = BrowserIdentity::new("t1", BrowserKind::Edge);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn port_scan_starts_are_disjoint() {
        assert_ne!(
            BrowserKind::Chromium.port_scan_start(),
            BrowserKind::Edge.port_scan_start()
        );
    }
}

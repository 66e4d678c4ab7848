use crate::types::{BrowserIdentity, BrowserKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FairyError {
    #[error("no stored session for {0}")]
    NotFound(BrowserIdentity),

    #[error("no {0} executable found on this host")]
    ExecutableNotFound(BrowserKind),

    #[error("debugging port {port} not connectable after {waited_ms} ms")]
    LaunchTimeout { port: u16, waited_ms: u64 },

    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("devtools connection failed: {0}")]
    ConnectionFailed(String),

    #[error("devtools protocol error: {0}")]
    ProtocolError(String),

    #[error("browser spawn failed: {0}")]
    SpawnFailed(String),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FairyError>;

impl FairyError {
    /// True for conditions the resolver recovers from by launching a fresh
    /// session instead of surfacing the failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FairyError::NotFound(_))
    }
}

//! Devtools capture interfaces.
//!
//! The capture pipeline itself — enabling `Network`/`Runtime` on a page
//! session, following redirect chains, fetching response bodies — plugs in
//! behind [`TrafficCollector`]. This module owns the seam and the on-disk
//! log formats ([`models`]), which is everything the rest of the crate
//! needs to know about it.

pub mod models;

pub use models::{BodyPayload, CommunicationRecord, ConsoleArg, ConsoleMessage};

use crate::errors::Result;
use headless_chrome::Tab;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A capture pipeline: attaches to a page's devtools session and writes
/// one log file per completed exchange under `output_dir`.
pub trait TrafficCollector {
    fn attach(&mut self, tab: &Arc<Tab>, output_dir: &Path) -> Result<()>;
}

/// Timestamped default output folder for a capture run, e.g.
/// `debug_20260806143000`.
pub fn default_output_dir() -> PathBuf {
    PathBuf::from(format!(
        "debug_{}",
        chrono::Local::now().format("%Y%m%d%H%M%S")
    ))
}

/// File stem for one captured exchange. Request ids are protocol-supplied
/// strings, so anything outside `[A-Za-z0-9_-]` is replaced; ids too long
/// for a comfortable filename are hashed instead.
pub fn record_file_stem(request_id: &str) -> String {
    let sanitized: String = request_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.len() <= 50 {
        return sanitized;
    }
    let mut hasher = DefaultHasher::new();
    request_id.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

pub mod devtools;
pub mod errors;
pub mod input;
pub mod launcher;
pub mod liveness;
pub mod ports;
pub mod resolver;
pub mod session;
pub mod store;
pub mod types;
pub mod windows;

pub use errors::{FairyError, Result};
pub use launcher::{find_executable, Launch, LauncherConfig, ProcessLauncher};
pub use resolver::{default_resolver, DefaultResolver, Registry, SessionResolver};
pub use session::{acquire_page, connect, PageCandidate, PageWindowState};
pub use store::{FileStore, StateStore};
pub use types::{BrowserIdentity, BrowserKind, SessionState, DEFAULT_SESSION_NAME};
pub use windows::{NoWindows, WindowEnumerator, WindowInfo};

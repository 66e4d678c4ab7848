//! OS window collaborator interfaces.
//!
//! Window enumeration and foregrounding are platform services this crate
//! consumes, not implements. Callers on a desktop host plug in an
//! implementation backed by their window system; headless hosts use
//! [`NoWindows`] and rely on the blank-page fallback in
//! [`crate::session::acquire_page`].

use crate::errors::Result;
use std::collections::HashSet;

/// One visible top-level window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    /// Opaque native handle, for implementations that need to act on the
    /// window later.
    pub handle: u64,
    pub title: String,
    /// Pid of the process owning the window.
    pub pid: u32,
}

/// Supplies the currently visible windows, in front-to-back order where the
/// platform can provide one.
pub trait WindowEnumerator {
    fn visible_windows(&self) -> Vec<WindowInfo>;
}

/// Brings a process's window to the foreground, optionally maximizing it.
pub trait WindowActivator {
    fn to_foreground(&self, pid: u32, maximize: bool) -> Result<()>;
}

/// Enumerator for hosts without a window system: sees nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWindows;

impl WindowEnumerator for NoWindows {
    fn visible_windows(&self) -> Vec<WindowInfo> {
        Vec::new()
    }
}

/// First visible window owned by any pid in `family`. This is how a
/// session's window is found: browsers hand their windows to renderer and
/// helper subprocesses, so the owner is matched against the whole process
/// family rather than the launched pid alone.
pub fn front_window<'a>(
    windows: &'a [WindowInfo],
    family: &HashSet<u32>,
) -> Option<&'a WindowInfo> {
    windows.iter().find(|w| family.contains(&w.pid))
}

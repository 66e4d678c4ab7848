//! Devtools attachment and active-page selection.
//!
//! Connecting is the easy half: the debugging endpoint advertises its
//! websocket URL over HTTP and [`headless_chrome`] takes it from there.
//! The interesting half is deciding which open page the user is actually
//! looking at. There is no identifier shared between the window manager
//! and the devtools target list, so the correlation is heuristic: find a
//! visible OS window owned by the session's process family, then the first
//! on-screen page whose document title prefixes the window title.

use crate::errors::{FairyError, Result};
use crate::launcher::Launch;
use crate::liveness::{self, LivenessProbe};
use crate::ports;
use crate::resolver::SessionResolver;
use crate::store::StateStore;
use crate::types::{BrowserIdentity, SessionState};
use crate::windows::{front_window, WindowEnumerator};
use headless_chrome::protocol::cdp::Browser as BrowserDomain;
use headless_chrome::{Browser, Tab};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Attach to a resolved session's debugging endpoint.
pub fn connect(state: &SessionState) -> Result<Browser> {
    let version_url = format!(
        "http://{}:{}/json/version",
        ports::DEFAULT_HOST,
        state.port
    );
    let payload: serde_json::Value = reqwest::blocking::get(&version_url)
        .and_then(|response| response.json())
        .map_err(|e| FairyError::ConnectionFailed(format!("{}: {}", version_url, e)))?;

    let ws_url = payload
        .get("webSocketDebuggerUrl")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            FairyError::ConnectionFailed(format!("no webSocketDebuggerUrl at {}", version_url))
        })?;
    let parsed = url::Url::parse(ws_url)
        .map_err(|e| FairyError::ConnectionFailed(format!("bad debugger url {}: {}", ws_url, e)))?;
    if parsed.scheme() != "ws" {
        return Err(FairyError::ConnectionFailed(format!(
            "unexpected debugger url scheme: {}",
            ws_url
        )));
    }

    debug!(session = %state, %ws_url, "attaching over devtools");
    Browser::connect(ws_url.to_string())
        .map_err(|e| FairyError::ConnectionFailed(e.to_string()))
}

/// On-screen state of the native window hosting a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageWindowState {
    Normal,
    Minimized,
    Maximized,
    Fullscreen,
}

impl PageWindowState {
    fn is_on_screen(self) -> bool {
        matches!(self, PageWindowState::Normal | PageWindowState::Maximized)
    }
}

/// What active-page selection knows about one open page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCandidate {
    pub title: String,
    pub window_state: PageWindowState,
}

/// Pick the page backing the window titled `window_title`: the first
/// candidate that is on screen and whose document title is a prefix of the
/// window title (browsers decorate the document title with their own
/// suffix). Returns the candidate index, or `None` when nothing matches.
pub fn pick_active_page(window_title: &str, candidates: &[PageCandidate]) -> Option<usize> {
    candidates
        .iter()
        .position(|c| c.window_state.is_on_screen() && window_title.starts_with(&c.title))
}

/// Resolve a session and return its browser handle plus the page matching
/// the session's visible window. With no identifiable page the fallback is
/// a fresh blank page — callers always get something usable.
pub fn acquire_page<S, P, L>(
    resolver: &SessionResolver<S, P, L>,
    windows: &dyn WindowEnumerator,
    identity: Option<&BrowserIdentity>,
) -> Result<(Browser, Arc<Tab>)>
where
    S: StateStore,
    P: LivenessProbe,
    L: Launch,
{
    let state = resolver.resolve(identity)?;
    let browser = connect(&state)?;

    match active_page(&browser, &state, windows)? {
        Some(tab) => Ok((browser, tab)),
        None => {
            warn!(
                session = %state,
                "no devtools page matched a visible window, opening a blank page"
            );
            let tab = browser
                .new_tab()
                .map_err(|e| FairyError::ProtocolError(e.to_string()))?;
            Ok((browser, tab))
        }
    }
}

/// The page behind the session's foremost visible window, if one can be
/// identified.
pub fn active_page(
    browser: &Browser,
    state: &SessionState,
    windows: &dyn WindowEnumerator,
) -> Result<Option<Arc<Tab>>> {
    let visible = windows.visible_windows();
    let family = liveness::process_family(state.pid);
    let Some(window) = front_window(&visible, &family) else {
        debug!(session = %state, "no visible window owned by the session's processes");
        return Ok(None);
    };

    let tabs = settled_tabs(browser);
    let candidates: Vec<PageCandidate> = tabs.iter().map(probe_tab).collect();
    Ok(pick_active_page(&window.title, &candidates).map(|i| Arc::clone(&tabs[i])))
}

/// Ask the browser where a tab's window is. Some Chromium derivatives do
/// not answer `Browser.getWindowForTarget` over a page session; a tab that
/// is reachable but unqueryable is treated as on screen.
fn probe_tab(tab: &Arc<Tab>) -> PageCandidate {
    let window_state = match tab.call_method(BrowserDomain::GetWindowForTarget { target_id: None })
    {
        Ok(info) => match info.bounds.window_state {
            Some(BrowserDomain::WindowState::Minimized) => PageWindowState::Minimized,
            Some(BrowserDomain::WindowState::Maximized) => PageWindowState::Maximized,
            Some(BrowserDomain::WindowState::Fullscreen) => PageWindowState::Fullscreen,
            Some(BrowserDomain::WindowState::Normal) | None => PageWindowState::Normal,
        },
        Err(_) => PageWindowState::Normal,
    };

    PageCandidate {
        title: tab.get_title().unwrap_or_default(),
        window_state,
    }
}

/// The target list fills in asynchronously after attaching; wait briefly
/// for it instead of reporting an empty browser.
fn settled_tabs(browser: &Browser) -> Vec<Arc<Tab>> {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        let tabs = browser
            .get_tabs()
            .lock()
            .map(|tabs| tabs.clone())
            .unwrap_or_default();
        if !tabs.is_empty() || Instant::now() >= deadline {
            return tabs;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

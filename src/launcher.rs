//! Browser process launching.
//!
//! Spawns the requested browser kind with a remote-debugging port and an
//! isolated per-identity profile directory, waits for the port to come up,
//! and records the resulting session before handing it back.
//!
//! Launching is not serialized across processes. Two concurrent launches
//! for the same identity will both spawn a browser and race on the saved
//! record; the later save wins and the other process is orphaned.

use crate::errors::{FairyError, Result};
use crate::ports;
use crate::store::StateStore;
use crate::types::{BrowserIdentity, BrowserKind, SessionState};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Flags that suppress first-run UI, the default-browser nag and info bars
/// on every launch.
const NOISE_FLAGS: &[&str] = &[
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-infobars",
];

/// Locate the executable for `kind` among the usual install locations.
pub fn find_executable(kind: BrowserKind) -> Option<PathBuf> {
    let candidates: Vec<PathBuf> = if cfg!(target_os = "windows") {
        let mut paths: Vec<PathBuf> = match kind {
            BrowserKind::Chromium => vec![
                PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
                PathBuf::from(r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe"),
            ],
            BrowserKind::Edge => vec![
                PathBuf::from(r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe"),
                PathBuf::from(r"C:\Program Files\Microsoft\Edge\Application\msedge.exe"),
            ],
        };
        if kind == BrowserKind::Chromium {
            if let Ok(local) = std::env::var("LOCALAPPDATA") {
                paths.push(PathBuf::from(format!(
                    r"{}\Google\Chrome\Application\chrome.exe",
                    local
                )));
            }
        }
        paths
    } else if cfg!(target_os = "macos") {
        match kind {
            BrowserKind::Chromium => vec![
                PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
                PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
            ],
            BrowserKind::Edge => vec![PathBuf::from(
                "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
            )],
        }
    } else {
        match kind {
            BrowserKind::Chromium => vec![
                PathBuf::from("/usr/bin/chromium"),
                PathBuf::from("/usr/bin/chromium-browser"),
                PathBuf::from("/usr/bin/google-chrome"),
                PathBuf::from("/usr/bin/google-chrome-stable"),
            ],
            BrowserKind::Edge => vec![
                PathBuf::from("/usr/bin/microsoft-edge"),
                PathBuf::from("/usr/bin/microsoft-edge-stable"),
                PathBuf::from("/usr/bin/microsoft-edge-dev"),
            ],
        }
    };

    candidates.into_iter().find(|p| p.exists())
}

/// Launch tuning. Defaults are good for interactive use; tests shorten the
/// timeout and add flags like `--headless=new`.
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    /// How long to wait for the debugging port to become connectable.
    pub launch_timeout: Duration,
    /// Delay between connect probes while waiting.
    pub poll_interval: Duration,
    /// Parent directory for per-identity profile directories.
    pub profile_root: PathBuf,
    /// Explicit executable, overriding discovery.
    pub executable: Option<PathBuf>,
    /// Extra flags appended after the fixed set.
    pub extra_args: Vec<String>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            launch_timeout: Duration::from_secs(20),
            poll_interval: Duration::from_millis(200),
            profile_root: std::env::temp_dir().join("fairybrowser").join("profiles"),
            executable: None,
            extra_args: Vec::new(),
        }
    }
}

impl LauncherConfig {
    pub fn launch_timeout(mut self, timeout: Duration) -> Self {
        self.launch_timeout = timeout;
        self
    }

    pub fn profile_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.profile_root = root.into();
        self
    }

    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    pub fn extra_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }
}

/// Something that can produce a fresh live session for an identity. The
/// resolver depends on this seam rather than on [`ProcessLauncher`]
/// directly so its decision logic is testable without spawning browsers.
pub trait Launch {
    fn launch(&self, identity: &BrowserIdentity) -> Result<SessionState>;
}

/// Launches real browser processes and records them in a [`StateStore`].
pub struct ProcessLauncher<S: StateStore> {
    store: S,
    config: LauncherConfig,
}

impl<S: StateStore> ProcessLauncher<S> {
    pub fn new(store: S, config: LauncherConfig) -> Self {
        Self { store, config }
    }

    fn profile_dir(&self, identity: &BrowserIdentity) -> PathBuf {
        self.config
            .profile_root
            .join(identity.kind.as_str())
            .join(&identity.name)
    }
}

impl<S: StateStore> Launch for ProcessLauncher<S> {
    fn launch(&self, identity: &BrowserIdentity) -> Result<SessionState> {
        let executable = match &self.config.executable {
            Some(path) => path.clone(),
            None => find_executable(identity.kind)
                .ok_or(FairyError::ExecutableNotFound(identity.kind))?,
        };

        let port = ports::find_available(
            None,
            ports::DEFAULT_HOST,
            identity.kind.port_scan_start(),
            65535,
        )?;

        let profile_dir = self.profile_dir(identity);
        std::fs::create_dir_all(&profile_dir)?;

        let args = build_args(port, &profile_dir, &self.config.extra_args);
        debug!(exe = %executable.display(), ?args, "spawning browser");

        let child = Command::new(&executable)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| FairyError::SpawnFailed(format!("{}: {}", executable.display(), e)))?;
        let pid = child.id();

        let started = Instant::now();
        while !ports::can_connect(port, ports::DEFAULT_HOST) {
            if started.elapsed() >= self.config.launch_timeout {
                // The spawned process is intentionally left running; killing
                // a half-started browser is the caller's call.
                return Err(FairyError::LaunchTimeout {
                    port,
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }
            std::thread::sleep(self.config.poll_interval);
        }

        let state = SessionState {
            name: identity.name.clone(),
            kind: identity.kind,
            port,
            pid,
        };
        self.store.save(&state)?;
        info!(session = %state, "launched browser session");
        Ok(state)
    }
}

/// The command line handed to the browser executable: debugging port and
/// isolated profile first, then the fixed noise-suppression set, then any
/// caller extras.
fn build_args(port: u16, profile_dir: &Path, extra: &[String]) -> Vec<String> {
    let mut args = vec![
        format!("--remote-debugging-port={}", port),
        format!("--user-data-dir={}", profile_dir.display()),
    ];
    args.extend(NOISE_FLAGS.iter().map(|f| f.to_string()));
    args.extend(extra.iter().cloned());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_carry_port_profile_and_noise_flags() {
        let profile = PathBuf::from("/tmp/fairy/profiles/chromium/t1");
        let args = build_args(13500, &profile, &["--headless=new".to_string()]);

        assert_eq!(args[0], "--remote-debugging-port=13500");
        assert_eq!(
            args[1],
            format!("--user-data-dir={}", profile.display())
        );
        for flag in NOISE_FLAGS {
            assert!(args.iter().any(|a| a == flag), "missing {}", flag);
        }
        assert_eq!(args.last().unwrap(), "--headless=new");
    }

    #[test]
    fn profile_dirs_are_namespaced_per_identity() {
        let store = crate::store::FileStore::new("/tmp/unused");
        let launcher = ProcessLauncher::new(
            store,
            LauncherConfig::default().profile_root("/tmp/fairy-profiles"),
        );

        let a = launcher.profile_dir(&BrowserIdentity::named("alpha"));
        let b = launcher.profile_dir(&BrowserIdentity::new("alpha", BrowserKind::Edge));
        assert_ne!(a, b);
        assert!(a.ends_with("chromium/alpha"));
        assert!(b.ends_with("edge/alpha"));
    }

    #[test]
    fn unspawnable_executable_override_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let store = crate::store::FileStore::new(dir.path().join("sessions"));
        let launcher = ProcessLauncher::new(
            store,
            LauncherConfig::default()
                .profile_root(dir.path().join("profiles"))
                .executable("/definitely/not/a/browser"),
        );

        let err = launcher
            .launch(&BrowserIdentity::named("t_missing"))
            .unwrap_err();
        assert!(matches!(err, FairyError::SpawnFailed(_)));
    }
}

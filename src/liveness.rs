//! Session liveness reconciliation.
//!
//! A persisted [`SessionState`] only describes a usable session while its
//! process is still running and its debugging port is still held open.
//! Either condition failing means the record is stale. The checks here are
//! pure observations; deleting stale records is the caller's decision
//! (see [`crate::resolver::Registry`]).

use crate::ports;
use crate::types::SessionState;
use std::collections::{HashMap, HashSet};
use sysinfo::{Pid, ProcessesToUpdate, System};

/// Whether the OS process table currently contains `pid`. Pid 0 is never a
/// session's process and is always reported dead.
pub fn pid_is_alive(pid: u32) -> bool {
    if pid == 0 {
        return false;
    }
    let target = Pid::from_u32(pid);
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[target]), true);
    sys.process(target).is_some()
}

/// Whether `state` still describes a live session: its process is running
/// and its debugging port is occupied by some listener.
pub fn is_live(state: &SessionState) -> bool {
    pid_is_alive(state.pid) && !ports::is_free(state.port, ports::DEFAULT_HOST)
}

/// `root` plus the transitive child set of `root` in the process table.
///
/// Browsers fan out into renderer and helper subprocesses, and OS windows
/// are frequently owned by a descendant rather than the pid that was
/// spawned, so window matching needs the whole family.
pub fn process_family(root: u32) -> HashSet<u32> {
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::All, true);

    let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
    for (pid, process) in sys.processes() {
        if let Some(parent) = process.parent() {
            children
                .entry(parent.as_u32())
                .or_default()
                .push(pid.as_u32());
        }
    }

    let mut family = HashSet::from([root]);
    let mut queue = vec![root];
    while let Some(pid) = queue.pop() {
        for &child in children.get(&pid).into_iter().flatten() {
            if family.insert(child) {
                queue.push(child);
            }
        }
    }
    family
}

/// Injectable liveness decision, so the resolver can be exercised without
/// real processes behind the records.
pub trait LivenessProbe {
    fn is_live(&self, state: &SessionState) -> bool;
}

/// The real thing: OS process table plus a local bind probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsLiveness;

impl LivenessProbe for OsLiveness {
    fn is_live(&self, state: &SessionState) -> bool {
        is_live(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BrowserKind;
    use std::net::TcpListener;

    fn state_with(port: u16, pid: u32) -> SessionState {
        SessionState {
            name: "t_liveness".to_string(),
            kind: BrowserKind::Chromium,
            port,
            pid,
        }
    }

    #[test]
    fn own_pid_is_alive() {
        assert!(pid_is_alive(std::process::id()));
    }

    #[test]
    fn bogus_pids_are_dead() {
        assert!(!pid_is_alive(0));
        assert!(!pid_is_alive(999_999));
    }

    #[test]
    fn live_requires_running_pid_and_occupied_port() {
        let listener = TcpListener::bind((ports::DEFAULT_HOST, 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        let own_pid = std::process::id();

        assert!(is_live(&state_with(port, own_pid)));
        assert!(!is_live(&state_with(port, 999_999)));

        drop(listener);
        assert!(!is_live(&state_with(port, own_pid)));
    }

    #[test]
    fn process_family_contains_the_root() {
        let own_pid = std::process::id();
        assert!(process_family(own_pid).contains(&own_pid));
    }
}

//! Local TCP port probing.
//!
//! Probes answer "is anything listening here right now" style questions and
//! never reserve anything: a result can be invalidated by a concurrent bind
//! the moment it is returned, so callers must treat it as a hint, not a
//! lease.

use std::io;
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

pub const DEFAULT_HOST: &str = "127.0.0.1";

const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

/// Whether `(host, port)` can currently be bound.
///
/// The probe socket is closed immediately; `std` listeners carry
/// `SO_REUSEADDR` on Unix, so a port freed by a previous probe is
/// immediately bindable again.
pub fn is_free(port: u16, host: &str) -> bool {
    TcpListener::bind((host, port)).is_ok()
}

/// Whether a listener on `(host, port)` accepts a connection within a short
/// timeout. Connect success implies a listener is present, which is the
/// signal used to confirm a freshly launched browser has opened its
/// debugging port.
pub fn can_connect(port: u16, host: &str) -> bool {
    let addrs = match (host, port).to_socket_addrs() {
        Ok(addrs) => addrs,
        Err(_) => return false,
    };
    for addr in addrs {
        if TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).is_ok() {
            return true;
        }
    }
    false
}

/// Find a currently-free port.
///
/// `preferred` entries are tried first, in order; port 0 is not a real port
/// and is skipped rather than rejected. With no preferred hit, the range
/// `[start, end]` is scanned ascending and the lowest free port wins. If
/// the whole range is occupied the OS is asked for an ephemeral port.
pub fn find_available(
    preferred: Option<&[u16]>,
    host: &str,
    start: u16,
    end: u16,
) -> io::Result<u16> {
    if let Some(candidates) = preferred {
        for &port in candidates {
            if port == 0 {
                continue;
            }
            if is_free(port, host) {
                return Ok(port);
            }
        }
    }

    for port in start..=end {
        if port == 0 {
            continue;
        }
        if is_free(port, host) {
            return Ok(port);
        }
    }

    // Last resort: have the OS assign an ephemeral port.
    let listener = TcpListener::bind((host, 0))?;
    Ok(listener.local_addr()?.port())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bound_port_is_not_free_until_released() {
        let listener = TcpListener::bind((DEFAULT_HOST, 0)).unwrap();
        let port = listener.local_addr().unwrap().port();

        assert!(!is_free(port, DEFAULT_HOST));
        drop(listener);
        assert!(is_free(port, DEFAULT_HOST));
    }

    #[test]
    fn can_connect_reflects_listener_presence() {
        let listener = TcpListener::bind((DEFAULT_HOST, 0)).unwrap();
        let port = listener.local_addr().unwrap().port();

        assert!(can_connect(port, DEFAULT_HOST));
        drop(listener);
        assert!(!can_connect(port, DEFAULT_HOST));
    }

    #[test]
    fn preferred_port_wins_when_free() {
        let listener = TcpListener::bind((DEFAULT_HOST, 0)).unwrap();
        let free_port = listener.local_addr().unwrap().port();
        drop(listener);

        let picked =
            find_available(Some(&[free_port]), DEFAULT_HOST, 1024, 65535).unwrap();
        assert_eq!(picked, free_port);
    }

    #[test]
    fn occupied_preferred_port_falls_through_to_the_scan() {
        let listener = TcpListener::bind((DEFAULT_HOST, 0)).unwrap();
        let busy_port = listener.local_addr().unwrap().port();

        let picked =
            find_available(Some(&[0, busy_port]), DEFAULT_HOST, 20000, 65535).unwrap();
        assert_ne!(picked, busy_port);
        assert!((20000..=65535).contains(&picked));
    }

    #[test]
    fn scan_result_stays_in_range() {
        let picked = find_available(None, DEFAULT_HOST, 30000, 40000).unwrap();
        assert!((30000..=40000).contains(&picked));
    }
}

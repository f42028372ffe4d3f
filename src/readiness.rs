//! Readiness probing for background services
//!
//! A service counts as ready once its port accepts a TCP connection. Probing
//! is bounded: callers get a `ReadinessTimeout` error after the deadline.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{BootstrapError, Result};
use crate::settings::ReadinessSettings;

/// Per-attempt connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

/// Poll `ready` every `interval` until it returns true or `timeout` elapses.
/// Always evaluates the predicate at least once. A timeout too large to
/// represent as an instant means no deadline.
pub fn wait_until<F>(mut ready: F, timeout: Duration, interval: Duration) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now().checked_add(timeout);
    loop {
        if ready() {
            return true;
        }
        let pause = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return false;
                }
                interval.min(deadline - now)
            }
            None => interval,
        };
        thread::sleep(pause);
    }
}

/// Whether `host:port` accepts a TCP connection right now
pub fn port_accepts(host: &str, port: u16) -> bool {
    let Ok(mut addrs) = (host, port).to_socket_addrs() else {
        return false;
    };
    addrs.any(|addr: SocketAddr| TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).is_ok())
}

/// Block until `service` listens on `host:port`, or fail after the deadline
pub fn wait_for_port(
    service: &str,
    host: &str,
    port: u16,
    settings: &ReadinessSettings,
) -> Result<()> {
    let timeout = Duration::from_secs(settings.timeout_secs);
    let interval = Duration::from_millis(settings.interval_ms.max(1));

    if wait_until(|| port_accepts(host, port), timeout, interval) {
        Ok(())
    } else {
        Err(BootstrapError::ReadinessTimeout {
            service: service.to_string(),
            address: format!("{host}:{port}"),
            timeout_secs: settings.timeout_secs,
        })
    }
}

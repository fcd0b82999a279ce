// src/config/model.rs

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::TickerdError;
use crate::trigger::CronSchedule;

/// What the binary was asked to do.
#[derive(Debug, Clone)]
pub enum Invocation {
    /// Supervise a command (the normal mode).
    Supervise(Config),
    /// `--healthcheck`: query a running instance and exit with its status.
    Probe(HealthMode),
}

/// Fully resolved supervisor configuration.
///
/// Built once at startup from [`crate::cli::CliArgs`] and never mutated.
#[derive(Debug, Clone)]
pub struct Config {
    /// Program and arguments; never empty.
    pub command: Vec<String>,
    /// Fixed re-run period. `None` when unset or zero.
    pub interval: Option<Duration>,
    pub cron: Option<CronSchedule>,
    /// Per-run timeout. `None` when unset or zero.
    pub timeout: Option<Duration>,
    pub watch_path: Option<PathBuf>,
    pub health: HealthMode,
    /// Skip the startup run. Always true when `cron` is set.
    pub skip_initial: bool,
}

impl Config {
    /// Build a configuration for `command` with every trigger disabled.
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            interval: None,
            cron: None,
            timeout: None,
            watch_path: None,
            health: HealthMode::Disabled,
            skip_initial: false,
        }
    }

    /// Whether the initial run happens, taking the cron rule into account.
    pub fn runs_initially(&self) -> bool {
        !self.skip_initial && self.cron.is_none()
    }
}

/// How the outcome of the last run is exposed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HealthMode {
    #[default]
    Disabled,
    /// Sentinel file holding the last error; absent when healthy.
    File(PathBuf),
    /// One-byte TCP status endpoint.
    Tcp(HealthAddr),
}

/// Address of the TCP health endpoint.
///
/// Accepts `host:port` or `:port`. The bare-port form listens on every
/// interface and is dialed through the loopback interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthAddr {
    listen: SocketAddr,
    dial: SocketAddr,
}

impl HealthAddr {
    pub fn parse(input: &str) -> Result<Self, TickerdError> {
        let trimmed = input.trim();
        let usage = |reason: &str| {
            TickerdError::Usage(format!("invalid health-check address {input:?}: {reason}"))
        };

        if let Some(port) = trimmed.strip_prefix(':') {
            let port: u16 = port.parse().map_err(|_| usage("bad port"))?;
            return Ok(Self {
                listen: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
                dial: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port),
            });
        }

        let listen = match trimmed.parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(_) => trimmed
                .to_socket_addrs()
                .map_err(|e| usage(&e.to_string()))?
                .next()
                .ok_or_else(|| usage("host did not resolve"))?,
        };

        let dial = match listen.ip() {
            IpAddr::V4(ip) if ip.is_unspecified() => {
                SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), listen.port())
            }
            IpAddr::V6(ip) if ip.is_unspecified() => {
                SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), listen.port())
            }
            _ => listen,
        };

        Ok(Self { listen, dial })
    }

    pub fn from_socket_addr(addr: SocketAddr) -> Self {
        Self {
            listen: addr,
            dial: addr,
        }
    }

    /// Address the status listener binds to.
    pub fn listen_addr(&self) -> SocketAddr {
        self.listen
    }

    /// Address the probe client connects to.
    pub fn dial_addr(&self) -> SocketAddr {
        self.dial
    }
}

impl fmt::Display for HealthAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.listen)
    }
}

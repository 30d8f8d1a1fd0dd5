//! Server configuration.

use std::time::Duration;

use mastermind_core::GameTimings;

/// Address the server binds to when none is configured.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Settings for a [`MastermindServer`](crate::MastermindServer).
///
/// Usually assembled through
/// [`MastermindServerBuilder`](crate::MastermindServerBuilder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `host:port` to listen on. Port `0` picks a free one.
    pub bind_addr: String,

    /// Panic window, CPU think time and speed-run limit.
    pub timings: GameTimings,

    /// Drop a connection that sends nothing for this long.
    /// `None` keeps idle connections open forever.
    pub idle_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            timings: GameTimings::default(),
            idle_timeout: Some(Duration::from_secs(600)),
        }
    }
}

//! Defaults and discovery configuration.

use std::{
    net::{Ipv4Addr, SocketAddrV4},
    path::PathBuf,
    time::Duration,
};

/// Multicast group used for discovery.
pub const DISCOVERY_GROUP: Ipv4Addr = Ipv4Addr::new(239, 0, 0, 1);

/// Port of the discovery group.
pub const DISCOVERY_PORT: u16 = 5000;

/// Wait between discovery resends, and listener cancellation granularity.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Payload capacity of the listener's receive buffer.
pub const LISTENER_BUFFER_SIZE: usize = 1024;

/// Payload capacity of the asker's receive buffer.
pub const ASKER_BUFFER_SIZE: usize = 2000;

/// Backlog passed to `listen(2)`.
pub const LISTEN_BACKLOG: i32 = 3;

/// Directory holding local socket files.
pub const DEFAULT_LOCAL_DIR: &str = "/tmp";

/// Prefix of local socket file names.
pub const LOCAL_PREFIX: &str = "p_";

/// Local socket path for `name` under `dir`.
pub fn local_path(dir: &std::path::Path, name: &str) -> PathBuf {
    dir.join(format!("{LOCAL_PREFIX}{name}"))
}

/// Discovery configuration
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Multicast group and port
    pub group: SocketAddrV4,
    /// Listener poll timeout and asker resend interval
    pub poll_interval: Duration,
    /// Listener receive buffer payload capacity
    pub listener_buffer: usize,
    /// Asker receive buffer payload capacity
    pub asker_buffer: usize,
    /// Stop asking after this many requests
    pub max_attempts: Option<u32>,
    /// Stop asking after this much time
    pub deadline: Option<Duration>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            group: SocketAddrV4::new(DISCOVERY_GROUP, DISCOVERY_PORT),
            poll_interval: DEFAULT_POLL_INTERVAL,
            listener_buffer: LISTENER_BUFFER_SIZE,
            asker_buffer: ASKER_BUFFER_SIZE,
            max_attempts: None,
            deadline: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn defaults() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.group.to_string(), "239.0.0.1:5000");
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert!(config.max_attempts.is_none());
        assert!(config.deadline.is_none());
    }

    #[test]
    fn local_path_layout() {
        assert_eq!(local_path(Path::new("/tmp"), "Bob"), PathBuf::from("/tmp/p_Bob"));
    }
}

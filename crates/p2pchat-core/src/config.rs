//! Process configuration for the directory and node roles

use std::net::SocketAddr;
use std::time::Duration;

use crate::chat::DEFAULT_INBOX_CAPACITY;

/// Default directory bind address
pub const DEFAULT_DIRECTORY_ADDR: &str = "127.0.0.1:8080";
/// Default node control-plane bind address
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8081";
/// Default directory URL used by nodes
pub const DEFAULT_DIRECTORY_URL: &str = "http://127.0.0.1:8080";
/// Default username
pub const DEFAULT_USERNAME: &str = "userA";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a directory process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryConfig {
    pub bind_addr: SocketAddr,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

/// Configuration for a node process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// Username to register under
    pub username: String,
    /// Bind address of the local control plane
    pub http_addr: SocketAddr,
    /// Base URL of the directory
    pub directory_url: String,
    /// Bootstrap peers, `<transport>/p2p/<endpoint-id>`
    pub bootstrap: Vec<String>,
    /// Use the default relay servers; disabled for loopback-only setups
    pub relay_enabled: bool,
    /// Bound on every directory HTTP request
    pub directory_timeout: Duration,
    /// Bound on dial + stream open
    pub dial_timeout: Duration,
    /// Bound on stream write + finish
    pub write_timeout: Duration,
    /// Bound on reading one inbound stream to its end
    pub read_timeout: Duration,
    /// Maximum number of messages kept in the inbox
    pub inbox_capacity: usize,
    /// How long to wait for the endpoint to learn its local addresses
    pub addr_wait: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            http_addr: SocketAddr::from(([127, 0, 0, 1], 8081)),
            directory_url: DEFAULT_DIRECTORY_URL.to_string(),
            bootstrap: Vec::new(),
            relay_enabled: true,
            directory_timeout: DEFAULT_TIMEOUT,
            dial_timeout: DEFAULT_TIMEOUT,
            write_timeout: DEFAULT_TIMEOUT,
            read_timeout: DEFAULT_TIMEOUT,
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
            addr_wait: Duration::from_secs(2),
        }
    }
}

impl NodeConfig {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    pub fn with_http_addr(mut self, addr: SocketAddr) -> Self {
        self.http_addr = addr;
        self
    }

    pub fn with_directory_url(mut self, url: impl Into<String>) -> Self {
        self.directory_url = url.into();
        self
    }

    pub fn with_bootstrap(mut self, peers: Vec<String>) -> Self {
        self.bootstrap = peers;
        self
    }

    pub fn with_relay(mut self, enabled: bool) -> Self {
        self.relay_enabled = enabled;
        self
    }

    pub fn with_timeouts(mut self, directory: Duration, dial: Duration, write: Duration) -> Self {
        self.directory_timeout = directory;
        self.dial_timeout = dial;
        self.write_timeout = write;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_inbox_capacity(mut self, capacity: usize) -> Self {
        self.inbox_capacity = capacity;
        self
    }

    pub fn with_addr_wait(mut self, wait: Duration) -> Self {
        self.addr_wait = wait;
        self
    }

    /// Split a comma-separated bootstrap list, dropping blank entries.
    pub fn parse_bootstrap(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

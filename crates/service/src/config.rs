use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::scan_monitor::{MonitorConfig, DEFAULT_POLL_INTERVAL, DEFAULT_SETTLE_DELAY};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:4000";
pub const DEFAULT_HTTP_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Config {
    // http server configuration
    /// address for the console api to listen on.
    ///  if not set then 127.0.0.1:8080 will be used
    pub http_listen_addr: Option<SocketAddr>,

    // dashboard backend
    /// where the connector directory, search and scan
    ///  endpoints live
    pub backend_url: Url,
    /// forwarded as a cookie on every backend call
    pub session_id: Option<String>,
    /// give up on a backend call after this long.
    ///  if not set requests may wait indefinitely
    pub request_timeout: Option<Duration>,

    // scan monitoring
    pub poll_interval: Duration,
    pub settle_delay: Duration,

    // data store configuration
    /// a path to the json state file, if not set then
    ///  state only lives in memory
    pub state_path: Option<PathBuf>,

    // misc
    pub log_level: tracing::Level,
}

impl Config {
    pub fn new(backend_url: Url) -> Self {
        Self {
            http_listen_addr: Some(default_listen_addr()),
            backend_url,
            session_id: None,
            request_timeout: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
            state_path: None,
            log_level: tracing::Level::INFO,
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.http_listen_addr.unwrap_or_else(default_listen_addr)
    }

    pub fn monitor(&self) -> MonitorConfig {
        MonitorConfig {
            poll_interval: self.poll_interval,
            settle_delay: self.settle_delay,
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_HTTP_PORT)
}

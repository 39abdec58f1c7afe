use std::net::SocketAddr;

#[derive(Debug)]
pub struct Config {
    // Listen address
    pub listen_addr: SocketAddr,
    // log level for http tracing
    pub log_level: tracing::Level,
}

impl Config {
    pub fn new(listen_addr: SocketAddr, log_level: tracing::Level) -> Self {
        Self {
            listen_addr,
            log_level,
        }
    }
}

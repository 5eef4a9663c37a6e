use std::net::SocketAddr;

/// Per-listener HTTP configuration, derived from the service config by
/// the process runner. The API and gateway servers each get their own.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
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

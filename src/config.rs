use std::time::Duration;

pub const DEFAULT_CHAT_PORT: u16 = 5000;
pub const DEFAULT_DISCOVERY_PORT: u16 = 5001;

pub struct ServerConfig {
    pub listen_addr: String,
    pub discovery_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: format!("0.0.0.0:{}", DEFAULT_CHAT_PORT),
            discovery_port: DEFAULT_DISCOVERY_PORT,
        }
    }
}

impl ServerConfig {
    /// Positional overrides: listen address, then discovery port.
    pub fn from_args(mut args: impl Iterator<Item = String>) -> Self {
        let mut cfg = Self::default();

        if let Some(addr) = args.next() {
            cfg.listen_addr = addr;
        }
        if let Some(port) = args.next().and_then(|p| p.parse().ok()) {
            cfg.discovery_port = port;
        }

        cfg
    }
}

pub struct ClientConfig {
    pub probe_addr: String,
    pub chat_port: u16,
    pub discovery_wait: Duration,
    pub retry_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            probe_addr: format!("255.255.255.255:{}", DEFAULT_DISCOVERY_PORT),
            chat_port: DEFAULT_CHAT_PORT,
            discovery_wait: Duration::from_secs(5),
            retry_delay: Duration::from_secs(2),
        }
    }
}

impl ClientConfig {
    /// Positional override: probe address (handy for 127.0.0.1 testing).
    pub fn from_args(mut args: impl Iterator<Item = String>) -> Self {
        let mut cfg = Self::default();

        if let Some(addr) = args.next() {
            cfg.probe_addr = addr;
        }

        cfg
    }
}

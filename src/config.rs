use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ServerError;

/// Tunables for a [`LocalServer`](crate::server::LocalServer).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind; the port is always chosen by the OS.
    pub bind_addr: IpAddr,
    /// Upper bound on waiting for the listener to report its port.
    pub startup_timeout_ms: u64,
    /// How long a connection may take to send its request.
    pub read_timeout_ms: u64,
    /// Size of the single read issued per connection.
    pub max_request_bytes: usize,
    /// Worker threads of the server's private runtime.
    pub worker_threads: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            startup_timeout_ms: 500,
            read_timeout_ms: 10_000,
            max_request_bytes: 64 * 1024,
            worker_threads: 2,
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, 0)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ServerError> {
        if self.max_request_bytes == 0 {
            return Err(ServerError::Config("max_request_bytes must be at least 1".into()));
        }
        if self.worker_threads == 0 {
            return Err(ServerError::Config("worker_threads must be at least 1".into()));
        }
        if self.startup_timeout_ms == 0 {
            return Err(ServerError::Config("startup_timeout_ms must be non-zero".into()));
        }
        Ok(())
    }
}

/// Configuration for the standalone binary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Directory to serve.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Document the launch URL points at.
    #[serde(default = "default_entry")]
    pub entry: String,
    /// Opaque query string appended to the launch URL.
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_root() -> PathBuf {
    PathBuf::from("web")
}

fn default_entry() -> String {
    "/index.html".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: default_root(),
            entry: default_entry(),
            query: String::new(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ServerError> {
        let config: Config =
            serde_yaml::from_str(yaml).map_err(|e| ServerError::Config(e.to_string()))?;
        config.server.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&yaml)
    }
}

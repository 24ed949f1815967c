use dockyard_engine::DEFAULT_IMAGE;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid DOCKYARD_LISTEN_ADDR {value:?}: {source}")]
    InvalidListenAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Image every created container runs.
    pub image: String,
    pub static_dir: PathBuf,
    pub index_file: PathBuf,
    /// Explicit TCP engine endpoint, e.g. `http://10.0.0.5:2375`.
    /// Unset means bollard's local defaults, which honour `DOCKER_HOST`.
    pub docker_host: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            image: DEFAULT_IMAGE.to_string(),
            static_dir: PathBuf::from("./static"),
            index_file: PathBuf::from("index.html"),
            docker_host: None,
        }
    }
}

impl ServerConfig {
    /// Reads `DOCKYARD_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let listen_addr = match lookup("DOCKYARD_LISTEN_ADDR") {
            Some(value) => value
                .parse()
                .map_err(|source| ConfigError::InvalidListenAddr { value, source })?,
            None => defaults.listen_addr,
        };

        Ok(Self {
            listen_addr,
            image: lookup("DOCKYARD_IMAGE").unwrap_or(defaults.image),
            static_dir: lookup("DOCKYARD_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            index_file: lookup("DOCKYARD_INDEX_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.index_file),
            docker_host: lookup("DOCKYARD_DOCKER_HOST").filter(|value| !value.is_empty()),
        })
    }
}

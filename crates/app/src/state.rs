use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use service::{ServiceConfig, DEFAULT_BACKEND_URL, DEFAULT_HTTP_PORT};

pub const APP_NAME: &str = "dspm";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const STATE_FILE_NAME: &str = "state.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where the console API listens
    pub listen_addr: String,
    /// Dashboard backend holding connectors and scans
    pub backend_url: String,
    /// Session cookie forwarded to the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub poll_interval_secs: u64,
    pub settle_delay_ms: u64,
    /// Unset means backend calls never time out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: format!("127.0.0.1:{}", DEFAULT_HTTP_PORT),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            session_id: None,
            poll_interval_secs: 300,
            settle_delay_ms: 1000,
            request_timeout_secs: None,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn listen_addr(&self) -> Result<SocketAddr, StateError> {
        self.listen_addr
            .parse()
            .map_err(|_| StateError::InvalidConfig(format!("listen_addr: {}", self.listen_addr)))
    }

    /// Url the CLI uses to reach the console started from this config
    pub fn console_url(&self) -> Result<Url, StateError> {
        let addr = self.listen_addr()?;
        // a wildcard bind is still reached over loopback
        let ip = if addr.ip().is_unspecified() {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            addr.ip()
        };
        Url::parse(&format!("http://{}", SocketAddr::new(ip, addr.port())))
            .map_err(|e| StateError::InvalidConfig(format!("listen_addr: {}", e)))
    }

    /// Build the service configuration, keeping state in `state_path`
    pub fn service_config(&self, state_path: &Path) -> Result<ServiceConfig, StateError> {
        let backend_url = Url::parse(&self.backend_url)
            .map_err(|e| StateError::InvalidConfig(format!("backend_url: {}", e)))?;
        let log_level = self
            .log_level
            .parse::<tracing::Level>()
            .map_err(|_| StateError::InvalidConfig(format!("log_level: {}", self.log_level)))?;

        let mut config = ServiceConfig::new(backend_url);
        config.http_listen_addr = Some(self.listen_addr()?);
        config.session_id = self.session_id.clone();
        config.request_timeout = self.request_timeout_secs.map(Duration::from_secs);
        config.poll_interval = Duration::from_secs(self.poll_interval_secs);
        config.settle_delay = Duration::from_millis(self.settle_delay_ms);
        config.state_path = Some(state_path.to_path_buf());
        config.log_level = log_level;
        Ok(config)
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the dspm directory (~/.dspm)
    pub dspm_dir: PathBuf,
    /// Durable scan and search state
    pub state_path: PathBuf,
    pub config_path: PathBuf,
    pub config: AppConfig,
}

impl AppState {
    pub fn dspm_dir() -> Result<PathBuf, StateError> {
        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    pub fn default_console_url() -> Result<Url, StateError> {
        AppConfig::default().console_url()
    }

    /// Initialize a new dspm directory
    pub fn init(config: AppConfig) -> Result<Self, StateError> {
        Self::init_at(Self::dspm_dir()?, config)
    }

    pub fn load() -> Result<Self, StateError> {
        Self::load_from(Self::dspm_dir()?)
    }

    fn init_at(dspm_dir: PathBuf, config: AppConfig) -> Result<Self, StateError> {
        if dspm_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }
        // reject a config the service could not start with
        config.service_config(Path::new(STATE_FILE_NAME))?;

        fs::create_dir_all(&dspm_dir)?;

        let config_path = dspm_dir.join(CONFIG_FILE_NAME);
        fs::write(&config_path, toml::to_string_pretty(&config)?)?;

        // the service fills this in as scans run
        let state_path = dspm_dir.join(STATE_FILE_NAME);
        fs::write(&state_path, "{}")?;

        Ok(Self {
            dspm_dir,
            state_path,
            config_path,
            config,
        })
    }

    fn load_from(dspm_dir: PathBuf) -> Result<Self, StateError> {
        if !dspm_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_path = dspm_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }
        let config: AppConfig = toml::from_str(&fs::read_to_string(&config_path)?)?;

        Ok(Self {
            state_path: dspm_dir.join(STATE_FILE_NAME),
            dspm_dir,
            config_path,
            config,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("dspm directory not initialized. Run 'dspm init' first")]
    NotInitialized,

    #[error("dspm directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid config value {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(".dspm");
        let config = AppConfig {
            session_id: Some("session=abc".to_string()),
            request_timeout_secs: Some(30),
            ..Default::default()
        };

        let state = AppState::init_at(dir.clone(), config.clone()).unwrap();
        assert!(state.state_path.exists());
        assert!(matches!(
            AppState::init_at(dir.clone(), config.clone()),
            Err(StateError::AlreadyInitialized)
        ));

        let loaded = AppState::load_from(dir).unwrap();
        assert_eq!(loaded.config, config);

        let service = loaded.config.service_config(&loaded.state_path).unwrap();
        assert_eq!(service.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(service.poll_interval, Duration::from_secs(300));
        assert_eq!(service.state_path.as_deref(), Some(loaded.state_path.as_path()));
    }

    #[test]
    fn test_load_without_init() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            AppState::load_from(tmp.path().join("missing")),
            Err(StateError::NotInitialized)
        ));
    }

    #[test]
    fn test_wildcard_listen_addr_is_reached_over_loopback() {
        let config = AppConfig {
            listen_addr: "0.0.0.0:9000".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.console_url().unwrap().as_str(),
            "http://127.0.0.1:9000/"
        );
    }

    #[test]
    fn test_bad_values_are_rejected() {
        let config = AppConfig {
            log_level: "loud".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.service_config(Path::new("state.json")),
            Err(StateError::InvalidConfig(_))
        ));
    }
}

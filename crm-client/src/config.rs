use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the JSON API, including the `/api` prefix.
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/api".to_string(),
            timeout_secs: 30,
        }
    }
}

const DEFAULT_CONFIG: &str = r#"
base_url = "http://127.0.0.1:8080/api"
timeout_secs = 30
"#;

impl ClientConfig {
    /// Loads `client.toml`, writing defaults on first run. `CRM_BASE_URL` and
    /// `CRM_TIMEOUT_SECS` override file values.
    pub fn load(path_override: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = path_override
            .map(Path::to_path_buf)
            .unwrap_or_else(get_config_path);

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        if !config_path.exists() {
            std::fs::write(&config_path, DEFAULT_CONFIG).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        Config::builder()
            .add_source(File::from(config_path))
            .add_source(Environment::with_prefix("CRM").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

fn crm_config_dir() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join("crm"),
        None => PathBuf::from("."),
    }
}

pub fn get_config_path() -> PathBuf {
    crm_config_dir().join("client.toml")
}

pub fn get_session_path() -> PathBuf {
    crm_config_dir().join("session.json")
}

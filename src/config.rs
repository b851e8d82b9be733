use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, error};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// CORS allowed origins, comma separated. Unset mirrors the request origin.
    pub cors_origins: Option<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Database URL
    pub db_url: Option<String>,

    /// Per-room broadcast channel capacity
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,

    /// Autosave period of an open note
    #[serde(default = "default_autosave_interval_ms")]
    pub autosave_interval_ms: u64,

    /// Delay between client reconnect attempts
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Re-issue `note-open` for the current note after a client reconnect
    #[serde(default)]
    pub rejoin_on_reconnect: bool,

    /// Base URL of the notes REST API, used by clients
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// WebSocket URL of the collaboration endpoint, used by clients
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        Self::from_iter(std::env::vars())
    }

    /// Build the configuration from an explicit set of variables
    pub fn from_iter<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        match envy::from_iter::<_, Config>(vars) {
            Ok(config) => {
                info!("✅ Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                error!("❌ Failed to load configuration: {}", e);
                Err(ConfigError::EnvError(e))
            }
        }
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn autosave_period(&self) -> Duration {
        Duration::from_millis(self.autosave_interval_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Parsed list of allowed CORS origins, empty when unset
    pub fn allowed_origins(&self) -> Vec<String> {
        self.cors_origins
            .as_deref()
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment.to_lowercase() == "dev" || self.environment.to_lowercase() == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            cors_origins: None,
            service_name: default_service_name(),
            db_url: None,
            broadcast_capacity: default_broadcast_capacity(),
            autosave_interval_ms: default_autosave_interval_ms(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            rejoin_on_reconnect: false,
            api_base_url: default_api_base_url(),
            ws_url: default_ws_url(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    EnvError(envy::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EnvError(e) => write!(f, "Environment variable error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "note-collab".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_broadcast_capacity() -> usize {
    100
}

fn default_autosave_interval_ms() -> u64 {
    5_000
}

fn default_reconnect_delay_ms() -> u64 {
    1_000
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_ws_url() -> String {
    "ws://127.0.0.1:3000/ws".to_string()
}

use serde::Deserialize;
use std::path::PathBuf;

/// Auth backend base URL baked in at build time, if provided.
const BUILD_API_URL: Option<&str> = option_env!("PORTAL_API_URL");

const LOCAL_API_URL: &str = "http://localhost:5000/api";

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Settings {
    #[serde(default)]
    pub auth_service: AuthServiceSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub session: SessionOptions,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AuthServiceSettings {
    /// Base URL the `/auth/*` paths are appended to.
    #[serde(default = "default_api_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AuthServiceSettings {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_url() -> String {
    BUILD_API_URL.unwrap_or(LOCAL_API_URL).to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Deserialize, Clone, Debug)]
pub struct StorageSettings {
    /// JSON file holding the persisted `token`/`user` keys.
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(".h1b-portal").join("session.json")
}

/// Behaviour switches for session restoration.
#[derive(Deserialize, Clone, Debug)]
pub struct SessionOptions {
    /// Restore a stored token that has no stored user as a placeholder
    /// demo identity. Off unless explicitly enabled.
    #[serde(default)]
    pub demo_mode: bool,
    /// Drop stored JWTs whose `exp` claim is in the past.
    #[serde(default = "default_true")]
    pub reject_expired_tokens: bool,
    /// Ask the backend (`GET /auth/me`) whether a stored token is still good.
    #[serde(default)]
    pub verify_with_backend: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            demo_mode: false,
            reject_expired_tokens: true,
            verify_with_backend: false,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Clone, Debug)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP/gRPC collector; spans are only exported when set.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Read settings from an optional `session.{yaml,toml,json}` file and
/// `APP_`-prefixed environment variables.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    portal_core::config::load_layered("session")
}

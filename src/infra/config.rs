//! Usage: Client configuration (schema, sanitize, read/write helpers).

use crate::shared::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_REFRESH_PATH: &str = "/refresh-token";
pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_EXCLUDED_PATHS: [&str; 3] = ["/login", "/register", "/public-route"];
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u32 = 0;
const DEFAULT_CONNECT_TIMEOUT_SECONDS: u32 = 10;
const MAX_REQUEST_TIMEOUT_SECONDS: u32 = 24 * 60 * 60;
const MAX_CONNECT_TIMEOUT_SECONDS: u32 = 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub refresh_path: String,
    pub login_path: String,
    // Substrings; a request path containing any of them never gets a bearer credential.
    pub excluded_paths: Vec<String>,
    // 0 disables the per-request timeout.
    pub request_timeout_seconds: u32,
    pub connect_timeout_seconds: u32,
    pub user_agent: String,
    pub single_flight_refresh: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            excluded_paths: DEFAULT_EXCLUDED_PATHS
                .iter()
                .map(|v| v.to_string())
                .collect(),
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
            connect_timeout_seconds: DEFAULT_CONNECT_TIMEOUT_SECONDS,
            user_agent: concat!("api-session-client/", env!("CARGO_PKG_VERSION")).to_string(),
            single_flight_refresh: false,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Clamp out-of-range values in place. Returns `true` when anything changed.
    pub fn sanitize(&mut self) -> bool {
        let mut changed = false;

        if self.request_timeout_seconds > MAX_REQUEST_TIMEOUT_SECONDS {
            tracing::warn!(
                value = self.request_timeout_seconds,
                max = MAX_REQUEST_TIMEOUT_SECONDS,
                "request_timeout_seconds out of range; clamped"
            );
            self.request_timeout_seconds = MAX_REQUEST_TIMEOUT_SECONDS;
            changed = true;
        }
        if self.connect_timeout_seconds > MAX_CONNECT_TIMEOUT_SECONDS {
            tracing::warn!(
                value = self.connect_timeout_seconds,
                max = MAX_CONNECT_TIMEOUT_SECONDS,
                "connect_timeout_seconds out of range; clamped"
            );
            self.connect_timeout_seconds = MAX_CONNECT_TIMEOUT_SECONDS;
            changed = true;
        }

        let before = self.excluded_paths.len();
        self.excluded_paths.retain(|v| !v.trim().is_empty());
        changed |= before != self.excluded_paths.len();

        if !self.refresh_path.starts_with('/') {
            self.refresh_path = format!("/{}", self.refresh_path.trim());
            changed = true;
        }

        changed
    }

    pub fn validate(&self) -> ClientResult<()> {
        let url = reqwest::Url::parse(self.base_url.trim())
            .map_err(|e| ClientError::Config(format!("base_url is invalid: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "base_url must use http or https, got scheme={}",
                url.scheme()
            )));
        }
        if self.refresh_path.trim().is_empty() {
            return Err(ClientError::Config("refresh_path must not be empty".into()));
        }
        Ok(())
    }

    pub fn from_json_str(content: &str) -> ClientResult<Self> {
        let mut config: ClientConfig = serde_json::from_str(content)
            .map_err(|e| ClientError::Config(format!("config json invalid: {e}")))?;
        config.sanitize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> ClientResult<Self> {
        let mut config: ClientConfig = toml::from_str(content)
            .map_err(|e| ClientError::Config(format!("config toml invalid: {e}")))?;
        config.sanitize();
        config.validate()?;
        Ok(config)
    }
}

/// Load a config file; `.toml` files are parsed as TOML, anything else as JSON.
pub fn read(path: &Path) -> ClientResult<ClientConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ClientError::Config(format!("failed to read config {}: {e}", path.display()))
    })?;

    let is_toml = path
        .extension()
        .and_then(|v| v.to_str())
        .is_some_and(|v| v.eq_ignore_ascii_case("toml"));
    if is_toml {
        ClientConfig::from_toml_str(&content)
    } else {
        ClientConfig::from_json_str(&content)
    }
}

/// Write the config as pretty JSON, replacing any existing file atomically.
pub fn write(path: &Path, config: &ClientConfig) -> ClientResult<ClientConfig> {
    let mut config = config.clone();
    config.sanitize();
    config.validate()?;

    let content = serde_json::to_vec_pretty(&config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {e}")))?;
    crate::infra::fs_atomic::replace_file(path, &content).map_err(ClientError::Config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ClientConfig::default();
        assert_eq!(config.refresh_path, "/refresh-token");
        assert_eq!(config.login_path, "/login");
        assert_eq!(
            config.excluded_paths,
            vec!["/login", "/register", "/public-route"]
        );
        assert_eq!(config.request_timeout_seconds, 0);
        assert!(!config.single_flight_refresh);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config =
            ClientConfig::from_json_str(r#"{ "base_url": "https://api.example.com/v1" }"#)
                .expect("parse");
        assert_eq!(config.base_url, "https://api.example.com/v1");
        assert_eq!(config.refresh_path, "/refresh-token");
        assert_eq!(config.connect_timeout_seconds, 10);
    }

    #[test]
    fn toml_config_is_supported() {
        let config = ClientConfig::from_toml_str(
            r#"
base_url = "https://api.example.com"
excluded_paths = ["/login", "/health"]
single_flight_refresh = true
"#,
        )
        .expect("parse toml");
        assert_eq!(config.excluded_paths, vec!["/login", "/health"]);
        assert!(config.single_flight_refresh);
    }

    #[test]
    fn sanitize_clamps_timeouts_and_drops_blank_fragments() {
        let mut config = ClientConfig {
            request_timeout_seconds: u32::MAX,
            connect_timeout_seconds: u32::MAX,
            excluded_paths: vec!["/login".into(), "  ".into()],
            refresh_path: "refresh-token".into(),
            ..ClientConfig::default()
        };
        assert!(config.sanitize());
        assert_eq!(config.request_timeout_seconds, MAX_REQUEST_TIMEOUT_SECONDS);
        assert_eq!(config.connect_timeout_seconds, MAX_CONNECT_TIMEOUT_SECONDS);
        assert_eq!(config.excluded_paths, vec!["/login"]);
        assert_eq!(config.refresh_path, "/refresh-token");
        assert!(!config.sanitize());
    }

    #[test]
    fn validate_rejects_non_http_base_url() {
        let err = ClientConfig::with_base_url("ftp://files.example.com")
            .validate()
            .unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
        assert!(ClientConfig::with_base_url("not a url").validate().is_err());
    }

    #[test]
    fn write_then_read_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("client.json");
        let config = ClientConfig {
            single_flight_refresh: true,
            ..ClientConfig::with_base_url("https://api.example.com")
        };

        write(&path, &config).expect("write");
        let loaded = read(&path).expect("read");
        assert_eq!(loaded, config);
    }
}

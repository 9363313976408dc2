//! Configuration types for download-tracker

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Environment variable naming an optional JSON configuration file
pub const CONFIG_PATH_ENV: &str = "DOWNLOAD_TRACKER_CONFIG";

/// Main configuration for the tracker
///
/// Every field has a default, so an empty JSON object is a valid configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Data storage
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Job lifecycle engine timing and result naming
    #[serde(default)]
    pub engine: EngineConfig,

    /// Which locators are accepted and how they are named
    #[serde(default)]
    pub locator: LocatorConfig,

    /// Account and session settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Log output settings (read by the binary)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// API and external server integration
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PersistenceConfig {
    /// Database path (default: "./download-tracker.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Job lifecycle engine configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct EngineConfig {
    /// Wall-clock delay between progress increments, in milliseconds (default: 1000)
    #[serde(default = "default_tick_interval", with = "duration_ms_serde")]
    #[schema(value_type = u64)]
    pub tick_interval: Duration,

    /// Percentage points added per increment (default: 10)
    #[serde(default = "default_progress_step")]
    pub progress_step: u8,

    /// Directory prefix of result locations (default: "uploads")
    #[serde(default = "default_result_dir")]
    pub result_dir: PathBuf,

    /// Extension of result locations (default: "jpg")
    #[serde(default = "default_result_extension")]
    pub result_extension: String,

    /// How long shutdown waits for in-flight job tasks, in seconds (default: 30)
    #[serde(default = "default_shutdown_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub shutdown_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval(),
            progress_step: default_progress_step(),
            result_dir: default_result_dir(),
            result_extension: default_result_extension(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

/// Locator acceptance and naming rules
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LocatorConfig {
    /// Hosts (and their subdomains) a locator may point at (default: ["freepik.com"])
    #[serde(default = "default_allowed_hosts")]
    pub allowed_hosts: Vec<String>,

    /// Display name used when the locator does not carry one (default: "freepik-image")
    #[serde(default = "default_fallback_name")]
    pub fallback_name: String,

    /// Maximum locator length in bytes (default: 2048)
    #[serde(default = "default_max_locator_len")]
    pub max_length: usize,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: default_allowed_hosts(),
            fallback_name: default_fallback_name(),
            max_length: default_max_locator_len(),
        }
    }
}

/// Account and session configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthConfig {
    /// Session lifetime in seconds (default: 7 days)
    #[serde(default = "default_session_ttl", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub session_ttl: Duration,

    /// Minimum password length (default: 6)
    #[serde(default = "default_min_password_len")]
    pub min_password_len: usize,

    /// Maximum password length in bytes (default: 72, the most bcrypt reads)
    #[serde(default = "default_max_password_len")]
    pub max_password_len: usize,

    /// bcrypt work factor for stored passwords (default: 12)
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl: default_session_ttl(),
            min_password_len: default_min_password_len(),
            max_password_len: default_max_password_len(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

/// Log output configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output (default: false)
    #[serde(default)]
    pub json_format: bool,

    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default)]
    pub filter: Option<String>,
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:3001)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: the local front-end dev servers)
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Rate limiting configuration
///
/// Each client IP may make `max_requests` requests per `window`, refilled
/// continuously.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RateLimitConfig {
    /// Enable rate limiting (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Window length in milliseconds (default: 15 minutes)
    #[serde(default = "default_rate_window", with = "duration_ms_serde")]
    #[schema(value_type = u64)]
    pub window: Duration,

    /// Requests allowed per window and IP (default: 100)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Endpoints exempt from rate limiting
    #[serde(default = "default_exempt_paths")]
    pub exempt_paths: Vec<String>,

    /// IPs exempt from rate limiting
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub exempt_ips: Vec<std::net::IpAddr>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window: default_rate_window(),
            max_requests: default_max_requests(),
            exempt_paths: default_exempt_paths(),
            exempt_ips: vec![],
        }
    }
}

impl Config {
    /// Load configuration for the binary
    ///
    /// Reads `.env` if present, then the JSON file named by
    /// [`CONFIG_PATH_ENV`] (defaults otherwise), applies environment overrides
    /// and validates the result.
    pub fn load() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv()
            && !e.not_found()
        {
            tracing::warn!(error = %e, "Failed to read .env file");
        }

        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Config::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;

        serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
            key: None,
        })
    }

    /// Apply overrides from environment-style variables
    ///
    /// `lookup` returns the value of a variable, if set.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(addr) = lookup("BIND_ADDRESS") {
            self.server.api.bind_address = parse_env("BIND_ADDRESS", &addr)?;
        }
        if let Some(port) = lookup("PORT") {
            self.server.api.bind_address.set_port(parse_env("PORT", &port)?);
        }
        if let Some(path) = lookup("DATABASE_PATH") {
            self.persistence.database_path = PathBuf::from(path);
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            self.server.api.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(window) = lookup("RATE_LIMIT_WINDOW_MS") {
            self.server.api.rate_limit.window =
                Duration::from_millis(parse_env("RATE_LIMIT_WINDOW_MS", &window)?);
        }
        if let Some(max) = lookup("RATE_LIMIT_MAX_REQUESTS") {
            self.server.api.rate_limit.max_requests = parse_env("RATE_LIMIT_MAX_REQUESTS", &max)?;
        }
        if let Some(ttl) = lookup("SESSION_TTL_SECS") {
            self.auth.session_ttl = Duration::from_secs(parse_env("SESSION_TTL_SECS", &ttl)?);
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.json_format = format.eq_ignore_ascii_case("json");
        }

        Ok(())
    }

    /// Reject values the engine or API cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.engine.progress_step == 0 || self.engine.progress_step > 100 {
            return Err(invalid(
                "engine.progress_step",
                "must be between 1 and 100",
            ));
        }
        if self.engine.tick_interval.is_zero() {
            return Err(invalid("engine.tick_interval", "must be greater than zero"));
        }
        if self.locator.allowed_hosts.is_empty() {
            return Err(invalid(
                "locator.allowed_hosts",
                "at least one host is required",
            ));
        }
        if self.auth.min_password_len > self.auth.max_password_len {
            return Err(invalid(
                "auth.min_password_len",
                "must not exceed auth.max_password_len",
            ));
        }
        if self.auth.max_password_len > 72 {
            return Err(invalid(
                "auth.max_password_len",
                "must not exceed 72 bytes",
            ));
        }
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err(invalid("auth.bcrypt_cost", "must be between 4 and 31"));
        }
        let rate_limit = &self.server.api.rate_limit;
        if rate_limit.enabled && (rate_limit.window.is_zero() || rate_limit.max_requests == 0) {
            return Err(invalid(
                "server.api.rate_limit",
                "window and max_requests must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> Error {
    Error::Config {
        message: format!("{key} {message}"),
        key: Some(key.to_string()),
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| Error::Config {
        message: format!("invalid value for {key}: {e}"),
        key: Some(key.to_string()),
    })
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./download-tracker.db")
}

fn default_tick_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_progress_step() -> u8 {
    10
}

fn default_result_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_result_extension() -> String {
    "jpg".to_string()
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_allowed_hosts() -> Vec<String> {
    vec!["freepik.com".to_string()]
}

fn default_fallback_name() -> String {
    "freepik-image".to_string()
}

fn default_max_locator_len() -> usize {
    2048
}

fn default_session_ttl() -> Duration {
    Duration::from_secs(7 * 24 * 60 * 60)
}

fn default_min_password_len() -> usize {
    6
}

fn default_max_password_len() -> usize {
    72
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3001))
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:3000".to_string(),
    ]
}

fn default_rate_window() -> Duration {
    Duration::from_secs(15 * 60)
}

fn default_max_requests() -> u32 {
    100
}

fn default_exempt_paths() -> Vec<String> {
    vec![
        "/events".to_string(), // SSE is long-lived
        "/health".to_string(), // Health checks should always work
    ]
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

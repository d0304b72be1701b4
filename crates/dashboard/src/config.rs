//! Dashboard configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; defaults reproduce a local development setup.
//!
//! ## Server
//! - `DASHBOARD_HOST` - Bind address (default: 127.0.0.1)
//! - `DASHBOARD_PORT` - Listen port (default: 8050)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//!
//! ## Salesforce
//! - `SALESFORCE_CREDENTIALS_FILE` - Three-line credentials file (default: salesforce_login.txt)
//! - `SALESFORCE_QUERIES_DIR` - Directory with the stored SOQL queries (default: queries)
//! - `SALESFORCE_LOGIN_URL` - Login host (default: <https://login.salesforce.com>)
//! - `SALESFORCE_API_VERSION` - API version (default: 59.0)
//! - `SALESFORCE_TIMEOUT_SECS` - HTTP timeout in seconds (default: 30)
//!
//! ## Dashboard defaults
//! - `DEFAULT_SELLER` - Initially selected seller (default: Schrottwolf GmbH)
//! - `DEFAULT_CATEGORY` - Initially selected category (default: Kupfer)
//! - `DEFAULT_DISTANCE_KM` - Initial radius (default: 200)
//! - `MAP_TILE_URL` - Basemap tile template (default: OpenStreetMap)
//! - `BACKGROUND_IMAGE_URL` - Optional page background image
//!
//! ## Error tracking
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Largest radius the distance slider offers, in kilometres.
pub const MAX_DISTANCE_KM: f64 = 3000.0;

const DEFAULT_LOGIN_URL: &str = "https://login.salesforce.com";
const DEFAULT_API_VERSION: &str = "59.0";
const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Dashboard application configuration.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Emit JSON logs instead of human-readable text
    pub json_logs: bool,
    /// Salesforce connection settings
    pub salesforce: SalesforceConfig,
    /// Initial widget values and page styling
    pub defaults: DashboardDefaults,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Salesforce connection settings.
///
/// Contains no secrets: the username, password and security token live in the
/// credentials file, not in the environment.
#[derive(Debug, Clone)]
pub struct SalesforceConfig {
    /// Path to the three-line credentials file
    pub credentials_file: PathBuf,
    /// Directory containing `accounts_query`, `materials_query`, ...
    pub queries_dir: PathBuf,
    /// Login host, e.g. <https://test.salesforce.com> for sandboxes
    pub login_url: String,
    /// API version without the leading `v`, e.g. `59.0`
    pub api_version: String,
    /// Per-request HTTP timeout
    pub timeout: Duration,
}

/// Initial widget values and page styling.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardDefaults {
    pub seller: Option<String>,
    pub category: Option<String>,
    pub distance_km: f64,
    pub tile_url: String,
    pub background_image_url: Option<String>,
}

impl Default for DashboardDefaults {
    fn default() -> Self {
        Self {
            seller: Some("Schrottwolf GmbH".to_string()),
            category: Some("Kupfer".to_string()),
            distance_km: 200.0,
            tile_url: DEFAULT_TILE_URL.to_string(),
            background_image_url: None,
        }
    }
}

impl DashboardConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("DASHBOARD_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("DASHBOARD_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("DASHBOARD_PORT", "8050")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("DASHBOARD_PORT".to_string(), e.to_string()))?;
        let json_logs = get_optional_env("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));

        let salesforce = SalesforceConfig::from_env()?;
        let defaults = DashboardDefaults::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            json_logs,
            salesforce,
            defaults,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl SalesforceConfig {
    /// Load Salesforce settings from environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` for an unparseable timeout or an
    /// API version that is not of the form `NN.N`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs = get_env_or_default("SALESFORCE_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SALESFORCE_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        let api_version = get_env_or_default("SALESFORCE_API_VERSION", DEFAULT_API_VERSION);
        validate_api_version(&api_version)?;

        Ok(Self {
            credentials_file: get_env_or_default("SALESFORCE_CREDENTIALS_FILE", "salesforce_login.txt")
                .into(),
            queries_dir: get_env_or_default("SALESFORCE_QUERIES_DIR", "queries").into(),
            login_url: get_env_or_default("SALESFORCE_LOGIN_URL", DEFAULT_LOGIN_URL)
                .trim_end_matches('/')
                .to_string(),
            api_version,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl DashboardDefaults {
    fn from_env() -> Result<Self, ConfigError> {
        let fallback = Self::default();

        let distance_km = match get_optional_env("DEFAULT_DISTANCE_KM") {
            Some(raw) => parse_distance(&raw)?,
            None => fallback.distance_km,
        };

        Ok(Self {
            seller: get_optional_env("DEFAULT_SELLER")
                .map_or(fallback.seller, non_empty),
            category: get_optional_env("DEFAULT_CATEGORY")
                .map_or(fallback.category, non_empty),
            distance_km,
            tile_url: get_env_or_default("MAP_TILE_URL", DEFAULT_TILE_URL),
            background_image_url: get_optional_env("BACKGROUND_IMAGE_URL").and_then(non_empty),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// An empty value clears a default instead of selecting "".
fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_distance(raw: &str) -> Result<f64, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("DEFAULT_DISTANCE_KM".to_string(), reason);
    let km = raw.trim().parse::<f64>().map_err(|e| invalid(e.to_string()))?;
    if !(0.0..=MAX_DISTANCE_KM).contains(&km) {
        return Err(invalid(format!("must be within 0..={MAX_DISTANCE_KM}")));
    }
    Ok(km)
}

fn validate_api_version(version: &str) -> Result<(), ConfigError> {
    let valid = version
        .split_once('.')
        .is_some_and(|(major, minor)| {
            !major.is_empty()
                && !minor.is_empty()
                && major.chars().all(|c| c.is_ascii_digit())
                && minor.chars().all(|c| c.is_ascii_digit())
        });
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidEnvVar(
            "SALESFORCE_API_VERSION".to_string(),
            format!("expected a version like 59.0, got '{version}'"),
        ))
    }
}

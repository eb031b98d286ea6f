//! Console configuration
//!
//! Settings are layered, later sources overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. `casedesk.toml` in the working directory, or the file named by
//!    `CASEDESK_CONFIG` (optional)
//! 3. Environment variables prefixed with `CASEDESK_`, using `__` between
//!    section and key (e.g. `CASEDESK_API__BASE_URL`)
//!
//! A `.env` file is loaded into the environment before anything else.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "casedesk.toml";

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "CASEDESK_CONFIG";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_ROTATIONS: &[&str] = &["daily", "hourly", "minutely", "never"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub listing: ListingConfig,
    pub feedback: FeedbackConfig,
    pub preferences: PreferencesConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend root, e.g. `http://localhost:8000`.
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Treat a failed two-factor status check as "not enabled" and continue
    /// with password login.
    pub two_factor_fail_open: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            two_factor_fail_open: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub page_size: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: casedesk_listing::DEFAULT_PAGE_SIZE.get(),
        }
    }
}

impl ListingConfig {
    /// Falls back to the default size when the configured size is zero.
    pub fn page_size(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.page_size).unwrap_or(casedesk_listing::DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// How long success/failure banners stay visible.
    pub banner_seconds: u64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self { banner_seconds: 3 }
    }
}

impl FeedbackConfig {
    pub fn banner_ttl(&self) -> Duration {
        Duration::from_secs(self.banner_seconds)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesConfig {
    pub path: Option<PathBuf>,
}

impl PreferencesConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| data_dir().join("preferences.json"))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub path: Option<PathBuf>,
}

impl SessionConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| data_dir().join("session.json"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    pub file_enabled: bool,
    pub file_directory: String,
    pub file_prefix: String,
    /// `daily`, `hourly`, `minutely` or `never`
    pub file_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
            file_enabled: false,
            file_directory: "logs".to_string(),
            file_prefix: "casedesk".to_string(),
            file_rotation: "daily".to_string(),
        }
    }
}

fn data_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("casedesk"))
        .unwrap_or_else(|| PathBuf::from(".casedesk"))
}

impl Config {
    /// Load configuration from `.env`, the config file and the environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load_from(Path::new(&path), true),
            None => Self::load_from(Path::new(DEFAULT_CONFIG_FILE), false),
        }
    }

    /// Load configuration layering `path` and the environment over defaults.
    pub fn load_from(path: &Path, required: bool) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(required))
            .add_source(
                config::Environment::with_prefix("CASEDESK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Apply command-line overrides, which take precedence over every other
    /// layer. Call before [`Config::validate`].
    pub fn apply_overrides(&mut self, base_url: Option<&str>) {
        if let Some(base_url) = base_url {
            self.api.base_url = base_url.to_string();
        }
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        let base = self.api.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(format!(
                "api.base_url must be an http(s) URL, got '{}'",
                self.api.base_url
            ));
        }
        if self.api.timeout_seconds == 0 {
            return Err("api.timeout_seconds must be greater than 0".to_string());
        }
        if self.listing.page_size == 0 {
            return Err("listing.page_size must be greater than 0".to_string());
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(format!(
                "logging.level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.logging.level
            ));
        }
        if !LOG_ROTATIONS.contains(&self.logging.file_rotation.as_str()) {
            return Err(format!(
                "logging.file_rotation must be one of {}, got '{}'",
                LOG_ROTATIONS.join(", "),
                self.logging.file_rotation
            ));
        }
        Ok(())
    }
}

//! Service configuration.

use std::path::Path;

use config::{Config as ConfigLoader, Environment, File, Map};
use serde::{Deserialize, Deserializer};

/// Google's public keys for Firebase ID tokens.
pub const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub identity: IdentityConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub admins: AdminsConfig,
}

/// Identity authority (Firebase project) settings.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Firebase project id. Used as token audience and issuer suffix.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Service-account JSON; its `project_id` is used when `project_id` is unset.
    #[serde(default)]
    pub credentials_file: Option<String>,
    #[serde(default = "default_jwks_url")]
    pub jwks_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// `*` or a comma-separated list of origins.
    #[serde(default = "default_cors_origins")]
    pub origins: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: default_cors_origins(),
        }
    }
}

/// Phone numbers that are granted super-admin rights.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminsConfig {
    /// A TOML array, or a comma-separated string when set from the environment.
    #[serde(default, deserialize_with = "phone_list")]
    pub phone_numbers: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PhoneList {
    Joined(String),
    Items(Vec<String>),
}

fn phone_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match PhoneList::deserialize(deserializer)? {
        PhoneList::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        PhoneList::Items(items) => items,
    };
    Ok(items
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
    #[error("Invalid credentials file {path}: {reason}")]
    InvalidCredentials { path: String, reason: String },
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8001
}
fn default_jwks_url() -> String {
    DEFAULT_JWKS_URL.to_string()
}
fn default_database_url() -> String {
    "sqlite:./data/food_cart.db".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_cors_origins() -> String {
    "*".to_string()
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (FOOD_CART__SECTION__KEY format)
    /// 2. config.toml file (if present)
    /// 3. Built-in defaults
    ///
    /// Environment values are kept as strings (no numeric parsing), so phone
    /// numbers keep their leading `+`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(environment(None))
    }

    fn load_with(env: Environment) -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .set_default("host", default_host())?
            .set_default("port", default_port() as i64)?
            .set_default("identity.jwks_url", default_jwks_url())?
            .add_source(File::with_name("config").required(false))
            .add_source(env)
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

/// `FOOD_CART__SECTION__KEY` variables, read from `vars` instead of the
/// process environment when given.
fn environment(vars: Option<Map<String, String>>) -> Environment {
    Environment::with_prefix("FOOD_CART")
        .separator("__")
        .source(vars)
}

#[derive(Deserialize)]
struct ServiceAccount {
    project_id: String,
}

impl IdentityConfig {
    /// The Firebase project id, read from the credentials file if not set directly.
    pub fn resolve_project_id(&self) -> Result<String, ConfigError> {
        if let Some(project_id) = self.project_id.as_deref().filter(|p| !p.is_empty()) {
            return Ok(project_id.to_string());
        }

        let path = self
            .credentials_file
            .as_deref()
            .ok_or(ConfigError::Missing("identity.project_id"))?;

        read_project_id(Path::new(path)).map_err(|reason| ConfigError::InvalidCredentials {
            path: path.to_string(),
            reason,
        })
    }
}

fn read_project_id(path: &Path) -> Result<String, String> {
    let raw = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let account: ServiceAccount = serde_json::from_str(&raw).map_err(|e| e.to_string())?;
    if account.project_id.is_empty() {
        return Err("project_id is empty".to_string());
    }
    Ok(account.project_id)
}

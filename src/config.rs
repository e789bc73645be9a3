//! Configuration types.
//!
//! Everything is read from the environment once at startup and handed to the
//! handler as plain structs.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default team granted full access to staff profiles.
pub const DEFAULT_ADMIN_TEAM: &str = "admin";

/// Platform credentials and resource identifiers.
#[derive(Debug, Clone)]
pub struct OnboardConfig {
    /// Platform API base URL, e.g. `https://cloud.appwrite.io/v1`.
    pub endpoint: String,
    pub project_id: String,
    /// Administrative API key.
    pub api_key: SecretString,
    pub database_id: String,
    pub staff_collection_id: String,
    /// Web application base URL; the reset-password link hangs off it.
    pub web_app_url: String,
    /// Team whose members may read, update and delete staff profiles.
    pub admin_team: String,
}

impl OnboardConfig {
    /// Build config from environment variables.
    ///
    /// Missing values are left empty rather than rejected: the first
    /// platform call will fail and the request reports a server error.
    /// Use [`OnboardConfig::missing_vars`] to warn about them at startup.
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).unwrap_or_default();

        Self {
            endpoint: var("APPWRITE_ENDPOINT"),
            project_id: var("APPWRITE_PROJECT_ID"),
            api_key: SecretString::from(var("APPWRITE_API_KEY")),
            database_id: var("DB_ID"),
            staff_collection_id: var("COLL_STAFF"),
            web_app_url: var("WEB_APP_URL"),
            admin_team: std::env::var("ADMIN_TEAM_ROLE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ADMIN_TEAM.to_string()),
        }
    }

    /// Names of required environment variables that resolved to empty values.
    pub fn missing_vars(&self) -> Vec<&'static str> {
        use secrecy::ExposeSecret;

        [
            ("APPWRITE_ENDPOINT", self.endpoint.as_str()),
            ("APPWRITE_PROJECT_ID", self.project_id.as_str()),
            ("APPWRITE_API_KEY", self.api_key.expose_secret()),
            ("DB_ID", self.database_id.as_str()),
            ("COLL_STAFF", self.staff_collection_id.as_str()),
            ("WEB_APP_URL", self.web_app_url.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| key)
        .collect()
    }

    /// Destination of the password-recovery link sent to new staff.
    pub fn reset_password_url(&self) -> String {
        format!("{}/reset-password", self.web_app_url.trim_end_matches('/'))
    }
}

/// Which platform implementation backs the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformBackend {
    /// Remote Appwrite REST API.
    Appwrite,
    /// In-process platform for local development.
    Memory,
}

impl std::str::FromStr for PlatformBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "appwrite" => Ok(Self::Appwrite),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub backend: PlatformBackend,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            backend: PlatformBackend::Appwrite,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".to_string(),
                message: format!("'{raw}' is not a valid port"),
            })?,
            Err(_) => defaults.port,
        };

        let backend = match std::env::var("PLATFORM_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.backend,
        };

        Ok(Self { port, backend })
    }
}

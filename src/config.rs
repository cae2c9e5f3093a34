//! Process configuration from the environment

use crate::sheets::{KeyFileError, ServiceAccountKey};
use crate::telegram::DEFAULT_API_BASE;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("Cannot load service account credentials from {}: {source}", .path.display())]
    Credentials {
        path: PathBuf,
        #[source]
        source: KeyFileError,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub spreadsheet_id: String,
    pub credentials_path: PathBuf,
    /// Overrides the key's `client_email` in remediation messages
    pub service_account_email: Option<String>,
    pub telegram_api_base: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        Ok(Self {
            bot_token: require("BOT_TOKEN")?,
            spreadsheet_id: require("SPREADSHEET_ID")?,
            credentials_path: PathBuf::from(require("GOOGLE_APPLICATION_CREDENTIALS")?),
            service_account_email: get("SERVICE_ACCOUNT_EMAIL"),
            telegram_api_base: get("TELEGRAM_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        })
    }

    pub fn load_credentials(&self) -> Result<ServiceAccountKey, ConfigError> {
        load_credentials(&self.credentials_path)
    }
}

fn load_credentials(path: &Path) -> Result<ServiceAccountKey, ConfigError> {
    ServiceAccountKey::from_file(path).map_err(|source| ConfigError::Credentials {
        path: path.to_path_buf(),
        source,
    })
}

use std::collections::HashMap;

use chrono::{Duration, Utc};
use config::{Config, Environment};
use serde::Deserialize;

use crate::controllers::credentials::CredentialEntry;
use crate::core::error::ConfigError;

const ENV_PREFIX: &str = "PROXY";

#[derive(Debug, Deserialize, Clone)]
pub(crate) struct Args {
    pub(crate) jwt_secret_key: String,
    pub(crate) jwt_access_token_expire_minutes: i64,
    pub(crate) default_token_limit: u32,
    pub(crate) api_users_json: Option<String>,
    pub(crate) api_admin_password: String,
    pub(crate) smartcover_api_base: String,
    pub(crate) smartcover_jwt: String,
    pub(crate) upstream_timeout_secs: u64,
    pub(crate) upstream_max_requests: usize,
    pub(crate) upstream_window_secs: u64,
    pub(crate) sweep_interval_secs: u64,
    pub(crate) requests_per_second: u64,
    pub(crate) log_level: String,
    pub(crate) port: u16,
}

impl Args {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("jwt_secret_key", "change-me-in-production")?
            .set_default("jwt_access_token_expire_minutes", 60)?
            .set_default("default_token_limit", 0)?
            .set_default("api_admin_password", "admin123")?
            .set_default("smartcover_api_base", "https://www.mysmartcover.com/api")?
            .set_default("upstream_timeout_secs", 30)?
            .set_default("upstream_max_requests", 50)?
            .set_default("upstream_window_secs", 10)?
            .set_default("sweep_interval_secs", 0)?
            .set_default("requests_per_second", 10)?
            .set_default("log_level", "info")?
            .set_default("port", 8000)?
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        Ok(config.try_deserialize::<Args>()?)
    }

    /// Token lifetime, which must be positive and small enough that an expiry
    /// timestamp can still be computed from it.
    pub(crate) fn token_lifetime(&self) -> Result<Duration, ConfigError> {
        let minutes = self.jwt_access_token_expire_minutes;

        Duration::try_minutes(minutes)
            .filter(|lifetime| *lifetime > Duration::zero())
            .filter(|lifetime| Utc::now().checked_add_signed(*lifetime).is_some())
            .ok_or_else(|| ConfigError::InvalidSetting {
                key: "jwt_access_token_expire_minutes",
                reason: format!("{} minutes is not a usable token lifetime", minutes),
            })
    }

    /// Credential entries from `api_users_json`, or a lone admin user when the
    /// variable is missing or unparseable.
    pub(crate) fn api_users(&self) -> HashMap<String, CredentialEntry> {
        if let Some(users_json) = &self.api_users_json {
            match parse_api_users(users_json) {
                Ok(users) => return users,
                Err(e) => {
                    tracing::warn!(
                        "Invalid API_USERS_JSON, falling back to default admin user: {}",
                        e
                    );
                }
            }
        }

        HashMap::from([(
            "admin".to_owned(),
            CredentialEntry::admin(&self.api_admin_password, self.default_token_limit),
        )])
    }
}

/// Parses the user table entry by entry so one malformed entry does not take
/// the whole table down with it.
pub(crate) fn parse_api_users(
    users_json: &str,
) -> Result<HashMap<String, CredentialEntry>, serde_json::Error> {
    let raw = serde_json::from_str::<HashMap<String, serde_json::Value>>(users_json)?;

    Ok(raw
        .into_iter()
        .filter_map(
            |(username, value)| match serde_json::from_value::<CredentialEntry>(value) {
                Ok(entry) => Some((username, entry)),
                Err(e) => {
                    tracing::warn!("Skipping malformed user entry {}: {}", username, e);
                    None
                }
            },
        )
        .collect())
}

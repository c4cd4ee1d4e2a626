//! Client configuration.

use crate::storage::StorageScope;
use serde_derive::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use url::Url;

/// Sessions end after an hour without user activity.
pub const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(60 * 60);

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Config {
    /// The backend's root URL. Every [`Paths`] entry is resolved against it.
    pub base_url: Url,
    pub paths: Paths,
    #[serde(rename = "inactivity_timeout_secs", with = "seconds")]
    pub inactivity_timeout: Duration,
    pub storage: StorageScope,
    pub user_agent: String,
}

impl Config {
    pub fn new(base_url: Url) -> Self {
        Config {
            base_url,
            ..Config::default()
        }
    }

    /// Load a JSON config file. Anything it leaves out takes its default.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::Read {
                path: path.display().to_string(),
                inner: e,
            }
        })?;

        Config::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(ConfigError::Parse)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: Url::parse(DEFAULT_BASE_URL)
                .expect("The default base URL is always valid"),
            paths: Paths::default(),
            inactivity_timeout: DEFAULT_INACTIVITY_TIMEOUT,
            storage: StorageScope::default(),
            user_agent: crate::DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Where each backend resource lives. The backend has moved these around,
/// so none of them are hard-coded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub login: String,
    pub verify_mfa: String,
    pub logout: String,
    /// The per-user collection, `{users}/{email}/password` is used for
    /// password resets.
    pub users: String,
    pub roles: String,
    pub invitations: String,
    pub clients: String,
}

impl Default for Paths {
    fn default() -> Self {
        Paths {
            login: String::from("/api/user/login"),
            verify_mfa: String::from("/api/user/verify-mfa"),
            logout: String::from("/api/user/logout"),
            users: String::from("/api/user"),
            roles: String::from("/api/roles"),
            invitations: String::from("/api/invitation"),
            clients: String::from("/api/client"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unable to read \"{}\"", path)]
    Read {
        path: String,
        #[source]
        inner: std::io::Error,
    },
    #[error("Unable to parse the config")]
    Parse(#[source] serde_json::Error),
}

mod seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Duration, ser: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        ser.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D>(de: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(de).map(Duration::from_secs)
    }
}

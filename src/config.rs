//! Configuration file structures for wfalert.
//!
//! The configuration is read from a YAML file, then overridden by environment
//! variables prefixed with `WFALERT_`. Nested keys are separated by `__`, e.g.
//! `WFALERT_SCHEDULE__POLLING_INTERVAL=300`. Every key has a default, so an absent
//! file yields a working configuration.
//!
//! # Configuration File Format
//!
//! ```yaml
//! api:
//!   # Base URL of the Warframe status API
//!   url: "https://api.warframestat.us"
//!   # Request timeout in seconds
//!   timeout: 10
//!
//! schedule:
//!   # Seconds between two automatic refreshes
//!   polling_interval: 600
//!   # Seconds between two sweeps of the expired alerts
//!   cleanup_interval: 3600
//!
//! # Platform applied on first start when none is stored yet
//! default_platform: pc
//! ```

use std::{path::Path, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::Deserialize;

use crate::store::Platform;

/// Prefix of the environment variables overriding the file.
const ENV_PREFIX: &str = "WFALERT_";

/// Root configuration structure.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Warframe status API settings
    pub api: Api,
    /// Background job intervals
    pub schedule: Schedule,
    /// Platform applied when the store has none
    pub default_platform: Option<Platform>,
}

/// Warframe status API settings.
///
/// # YAML Section
///
/// ```yaml
/// api:
///   url: "https://api.warframestat.us"
///   timeout: 10
/// ```
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Api {
    /// Base URL of the API.
    ///
    /// Should include the protocol (http/https). A trailing slash is ignored.
    pub url: String,

    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for Api {
    fn default() -> Self {
        Api {
            url: "https://api.warframestat.us".to_owned(),
            timeout: 10,
        }
    }
}

impl Api {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Intervals of the background jobs, in seconds.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Schedule {
    /// Seconds between two automatic alert refreshes
    pub polling_interval: u64,
    /// Seconds between two expired alert sweeps
    pub cleanup_interval: u64,
}

impl Default for Schedule {
    fn default() -> Self {
        Schedule {
            polling_interval: 600,
            cleanup_interval: 3600,
        }
    }
}

impl Schedule {
    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval.max(1))
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval.max(1))
    }
}

impl Config {
    /// Loads the configuration from the YAML file at `path` and the `WFALERT_`
    /// environment variables. Environment variables take precedence.
    ///
    /// A missing file is not an error: the defaults and the environment apply.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the file is not valid YAML or a value has the
    /// wrong type, e.g. an unknown platform name.
    pub fn load(path: impl AsRef<Path>) -> Result<Config, figment::Error> {
        Figment::new()
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
    }
}

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tabguard_core::{EngineOptions, ParseSeedPolicyError, SeedPolicy, DEFAULT_CHECK_TIMEOUT};
use thiserror::Error;

const ENV_STORE: &str = "TABGUARD_STORE";
const ENV_SEED_POLICY: &str = "TABGUARD_SEED_POLICY";
const ENV_CHECK_TIMEOUT_MS: &str = "TABGUARD_CHECK_TIMEOUT_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TABGUARD_SEED_POLICY: {0}")]
    SeedPolicy(#[from] ParseSeedPolicyError),
    #[error("TABGUARD_CHECK_TIMEOUT_MS must be a whole number of milliseconds, got {0:?}")]
    CheckTimeout(String),
    #[error("cannot resolve default store path: {0}")]
    StorePath(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub store_path: PathBuf,
    pub seed_policy: SeedPolicy,
    pub check_timeout: Option<Duration>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let store_path = match lookup(ENV_STORE) {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => default_store_path()?,
        };
        let seed_policy = match lookup(ENV_SEED_POLICY) {
            Some(value) => value.parse()?,
            None => SeedPolicy::default(),
        };
        let check_timeout = match lookup(ENV_CHECK_TIMEOUT_MS) {
            Some(value) => parse_timeout_ms(&value)?,
            None => Some(DEFAULT_CHECK_TIMEOUT),
        };

        Ok(Self {
            store_path,
            seed_policy,
            check_timeout,
        })
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            seed_policy: self.seed_policy,
            check_timeout: self.check_timeout,
        }
    }
}

fn parse_timeout_ms(value: &str) -> Result<Option<Duration>, ConfigError> {
    let millis: u64 = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::CheckTimeout(value.to_owned()))?;
    Ok((millis > 0).then(|| Duration::from_millis(millis)))
}

fn default_store_path() -> Result<PathBuf, std::io::Error> {
    #[cfg(target_os = "macos")]
    {
        if let Some(home) = env::var_os("HOME") {
            return Ok(PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("Tabguard")
                .join("settings.json"));
        }
    }

    #[cfg(not(target_os = "macos"))]
    {
        if let Some(config_home) = env::var_os("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(config_home)
                .join("tabguard")
                .join("settings.json"));
        }
        if let Some(home) = env::var_os("HOME") {
            return Ok(PathBuf::from(home)
                .join(".config")
                .join("tabguard")
                .join("settings.json"));
        }
    }

    let cwd = env::current_dir()?;
    Ok(cwd.join("target").join("tabguard-settings.json"))
}

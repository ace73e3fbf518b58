use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{LimitConfig, OptionError, SettingValue, OPTION_KEYS};

pub const DEFAULT_OPTIONS_KEY: &str = "defaultOptions";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid persisted data: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SetOptionError {
    #[error(transparent)]
    Invalid(#[from] OptionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    // Missing keys are omitted from the result.
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError>;

    async fn set(&self, items: Map<String, Value>) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Map<String, Value>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Map<String, Value>>, StoreError> {
        self.items
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_owned()))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError> {
        let items = self.lock()?;
        Ok(keys
            .iter()
            .filter_map(|key| items.get(*key).map(|value| ((*key).to_owned(), value.clone())))
            .collect())
    }

    async fn set(&self, items: Map<String, Value>) -> Result<(), StoreError> {
        self.lock()?.extend(items);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedPolicy {
    #[default]
    IfMissing,
    Overwrite,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown seed policy {0:?}, expected `if-missing` or `overwrite`")]
pub struct ParseSeedPolicyError(String);

impl FromStr for SeedPolicy {
    type Err = ParseSeedPolicyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "if-missing" => Ok(Self::IfMissing),
            "overwrite" => Ok(Self::Overwrite),
            other => Err(ParseSeedPolicyError(other.to_owned())),
        }
    }
}

pub struct SettingsProvider<S> {
    store: S,
    defaults: LimitConfig,
}

impl<S: KeyValueStore> SettingsProvider<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            defaults: LimitConfig::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn seed(&self, policy: SeedPolicy) -> Result<bool, StoreError> {
        if policy == SeedPolicy::IfMissing {
            let existing = self.store.get(&[DEFAULT_OPTIONS_KEY]).await?;
            if existing.contains_key(DEFAULT_OPTIONS_KEY) {
                debug!("default options already seeded");
                return Ok(false);
            }
        }

        let mut items = Map::new();
        items.insert(
            DEFAULT_OPTIONS_KEY.to_owned(),
            Value::Object(self.defaults.to_record()?),
        );
        self.store.set(items).await?;
        info!(?policy, "seeded default options");
        Ok(true)
    }

    pub async fn load(&self) -> LimitConfig {
        match self.try_load().await {
            Ok(config) => config,
            Err(error) => {
                warn!(%error, "failed to read options; using built-in defaults");
                self.defaults.clone()
            }
        }
    }

    pub async fn try_load(&self) -> Result<LimitConfig, StoreError> {
        let pointer = self.store.get(&[DEFAULT_OPTIONS_KEY]).await?;
        let defaults = match pointer.get(DEFAULT_OPTIONS_KEY) {
            Some(Value::Object(record)) => self.defaults.overlay(record),
            Some(other) => {
                warn!(value = %other, "default options record is not an object");
                self.defaults.clone()
            }
            None => self.defaults.clone(),
        };

        let overrides = self.store.get(&OPTION_KEYS).await?;
        Ok(defaults.overlay(&overrides))
    }

    pub async fn save_options(&self, config: &LimitConfig) -> Result<(), StoreError> {
        self.store.set(config.to_record()?).await
    }

    pub async fn set_option(&self, key: &str, value: Value) -> Result<SettingValue, SetOptionError> {
        let setting = SettingValue::parse(key, &value)?;
        let mut items = Map::new();
        items.insert(key.to_owned(), setting.to_json());
        self.store.set(items).await?;
        Ok(setting)
    }
}

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::ser::Error as _;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::admission::AdmissionTag;

pub const MAX_TOTAL_KEY: &str = "maxTotal";
pub const MAX_WINDOW_KEY: &str = "maxWindow";
pub const DISPLAY_ALERT_KEY: &str = "displayAlert";
pub const DISPLAY_BADGE_KEY: &str = "displayBadge";
pub const ALERT_MESSAGE_KEY: &str = "alertMessage";

pub const OPTION_KEYS: [&str; 5] = [
    MAX_TOTAL_KEY,
    MAX_WINDOW_KEY,
    DISPLAY_ALERT_KEY,
    DISPLAY_BADGE_KEY,
    ALERT_MESSAGE_KEY,
];

pub const DEFAULT_MAX_TOTAL: i64 = 33;
pub const DEFAULT_MAX_WINDOW: i64 = 11;
pub const DEFAULT_ALERT_MESSAGE: &str =
    "You decided not to open more than { maxWhich } tabs in { which }";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitConfig {
    pub max_total: i64,
    pub max_window: i64,
    pub display_alert: bool,
    pub display_badge: bool,
    pub alert_message: String,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_total: DEFAULT_MAX_TOTAL,
            max_window: DEFAULT_MAX_WINDOW,
            display_alert: true,
            display_badge: true,
            alert_message: DEFAULT_ALERT_MESSAGE.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("unknown option: {0}")]
    Unknown(String),
    #[error("option {key} expects a {expected}, got {value}")]
    Mistyped {
        key: String,
        expected: &'static str,
        value: Value,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl Display for SettingValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl SettingValue {
    pub fn parse(key: &str, value: &Value) -> Result<Self, OptionError> {
        let (parsed, expected) = match key {
            MAX_TOTAL_KEY | MAX_WINDOW_KEY => (value.as_i64().map(Self::Int), "integer"),
            DISPLAY_ALERT_KEY | DISPLAY_BADGE_KEY => (value.as_bool().map(Self::Bool), "boolean"),
            ALERT_MESSAGE_KEY => (value.as_str().map(|text| Self::Text(text.to_owned())), "string"),
            _ => return Err(OptionError::Unknown(key.to_owned())),
        };
        parsed.ok_or_else(|| OptionError::Mistyped {
            key: key.to_owned(),
            expected,
            value: value.clone(),
        })
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(value) => Value::from(*value),
            Self::Int(value) => Value::from(*value),
            Self::Text(value) => Value::from(value.as_str()),
        }
    }
}

impl LimitConfig {
    // A zero total limit must never close the last tab.
    pub fn effective_max_total(&self) -> i64 {
        self.max_total.max(1)
    }

    pub fn threshold(&self, tag: AdmissionTag) -> i64 {
        match tag {
            AdmissionTag::Window => self.max_window,
            AdmissionTag::Total => self.effective_max_total(),
        }
    }

    pub fn field(&self, key: &str) -> Option<SettingValue> {
        match key {
            MAX_TOTAL_KEY => Some(SettingValue::Int(self.max_total)),
            MAX_WINDOW_KEY => Some(SettingValue::Int(self.max_window)),
            DISPLAY_ALERT_KEY => Some(SettingValue::Bool(self.display_alert)),
            DISPLAY_BADGE_KEY => Some(SettingValue::Bool(self.display_badge)),
            ALERT_MESSAGE_KEY => Some(SettingValue::Text(self.alert_message.clone())),
            _ => None,
        }
    }

    pub fn to_record(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(record) => Ok(record),
            other => Err(serde_json::Error::custom(format!(
                "options serialized to {other}, expected an object"
            ))),
        }
    }

    // Unknown keys are skipped; mistyped values keep the current value.
    pub fn overlay(&self, record: &Map<String, Value>) -> Self {
        let mut config = self.clone();
        for (key, value) in record {
            match SettingValue::parse(key, value) {
                Ok(setting) => config.set(key, setting),
                Err(OptionError::Unknown(_)) => {}
                Err(error) => warn!(%error, "ignoring stored option"),
            }
        }
        config
    }

    fn set(&mut self, key: &str, value: SettingValue) {
        match (key, value) {
            (MAX_TOTAL_KEY, SettingValue::Int(value)) => self.max_total = value,
            (MAX_WINDOW_KEY, SettingValue::Int(value)) => self.max_window = value,
            (DISPLAY_ALERT_KEY, SettingValue::Bool(value)) => self.display_alert = value,
            (DISPLAY_BADGE_KEY, SettingValue::Bool(value)) => self.display_badge = value,
            (ALERT_MESSAGE_KEY, SettingValue::Text(value)) => self.alert_message = value,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn total_threshold_is_floored_at_one() {
        let mut config = LimitConfig {
            max_total: 0,
            ..LimitConfig::default()
        };
        assert_eq!(config.effective_max_total(), 1);
        assert_eq!(config.threshold(AdmissionTag::Total), 1);

        config.max_total = -4;
        assert_eq!(config.effective_max_total(), 1);

        config.max_total = 12;
        assert_eq!(config.effective_max_total(), 12);
    }

    #[test]
    fn window_threshold_is_not_floored() {
        let config = LimitConfig {
            max_window: 0,
            ..LimitConfig::default()
        };
        assert_eq!(config.threshold(AdmissionTag::Window), 0);
    }

    #[test]
    fn overlay_applies_known_keys_and_skips_mistyped_values() {
        let record = json!({
            "maxTotal": 5,
            "maxWindow": "ten",
            "displayAlert": false,
            "alertMessage": "stop at {maxWhich}",
            "unrelated": 1,
        });
        let record = record.as_object().expect("object literal");

        let config = LimitConfig::default().overlay(record);

        assert_eq!(config.max_total, 5);
        assert_eq!(config.max_window, DEFAULT_MAX_WINDOW);
        assert!(!config.display_alert);
        assert!(config.display_badge);
        assert_eq!(config.alert_message, "stop at {maxWhich}");
    }

    #[test]
    fn record_uses_storage_keys_and_round_trips_through_overlay() {
        let config = LimitConfig {
            max_total: 4,
            max_window: 0,
            display_alert: false,
            display_badge: true,
            alert_message: "at most {maxWhich}".to_owned(),
        };
        let record = config.to_record().expect("record");

        let mut keys: Vec<&str> = record.keys().map(String::as_str).collect();
        let mut expected = OPTION_KEYS.to_vec();
        keys.sort_unstable();
        expected.sort_unstable();
        assert_eq!(keys, expected);
        assert_eq!(record.get("maxWindow"), Some(&json!(0)));
        assert_eq!(LimitConfig::default().overlay(&record), config);
    }

    #[test]
    fn parse_rejects_unknown_and_mistyped_options() {
        assert_eq!(
            SettingValue::parse("maxWindow", &json!(4)),
            Ok(SettingValue::Int(4))
        );
        assert_eq!(
            SettingValue::parse("maxwindow", &json!(4)),
            Err(OptionError::Unknown("maxwindow".to_owned()))
        );
        assert!(matches!(
            SettingValue::parse("displayAlert", &json!("yes")),
            Err(OptionError::Mistyped { expected: "boolean", .. })
        ));
    }

    #[test]
    fn field_lookup_is_case_sensitive() {
        let config = LimitConfig::default();
        assert_eq!(config.field("maxTotal"), Some(SettingValue::Int(33)));
        assert_eq!(config.field("maxtotal"), None);
        assert_eq!(
            config.field("displayBadge").map(|value| value.to_string()),
            Some("true".to_owned())
        );
    }
}

pub mod admission;
pub mod badge;
pub mod config;
pub mod engine;
pub mod enforcement;
pub mod event;
pub mod host;
pub mod ids;
pub mod settings;
pub mod template;

pub use admission::{check_admission, check_admission_within, AdmissionTag};
pub use badge::{badge_text, BadgeUpdater};
pub use config::{LimitConfig, OptionError, SettingValue, DISPLAY_BADGE_KEY, OPTION_KEYS};
pub use engine::{Engine, EngineOptions, DEFAULT_CHECK_TIMEOUT};
pub use enforcement::{enforce, Enforcement, EnforcementReport};
pub use event::TabEvent;
pub use host::{AlertSink, HostError, TabHost, TabQuery, WindowScope};
pub use ids::{TabId, WindowId};
pub use settings::{
    KeyValueStore, MemoryStore, ParseSeedPolicyError, SeedPolicy, SetOptionError, SettingsProvider,
    StoreError, DEFAULT_OPTIONS_KEY,
};
pub use template::render_alert;

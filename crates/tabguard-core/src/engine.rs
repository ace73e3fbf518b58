use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::admission::check_admission_within;
use crate::badge::BadgeUpdater;
use crate::config::{LimitConfig, SettingValue, DISPLAY_BADGE_KEY};
use crate::enforcement::{enforce, Enforcement};
use crate::event::TabEvent;
use crate::host::{AlertSink, TabHost};
use crate::ids::{TabId, WindowId};
use crate::settings::{KeyValueStore, SeedPolicy, SetOptionError, SettingsProvider};

pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub seed_policy: SeedPolicy,
    // `None` waits indefinitely.
    pub check_timeout: Option<Duration>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            seed_policy: SeedPolicy::default(),
            check_timeout: Some(DEFAULT_CHECK_TIMEOUT),
        }
    }
}

pub struct Engine<H, A, S> {
    host: H,
    alerts: A,
    settings: SettingsProvider<S>,
    badge: BadgeUpdater,
    options: EngineOptions,
}

impl<H, A, S> Engine<H, A, S>
where
    H: TabHost,
    A: AlertSink,
    S: KeyValueStore,
{
    pub fn new(host: H, alerts: A, store: S, options: EngineOptions) -> Self {
        Self {
            host,
            alerts,
            settings: SettingsProvider::new(store),
            badge: BadgeUpdater::new(false),
            options,
        }
    }

    pub fn settings(&self) -> &SettingsProvider<S> {
        &self.settings
    }

    pub fn badge(&self) -> &BadgeUpdater {
        &self.badge
    }

    pub async fn startup(&self) -> LimitConfig {
        if let Err(error) = self.settings.seed(self.options.seed_policy).await {
            warn!(%error, "failed to seed default options");
        }

        let config = self.settings.load().await;
        self.badge.set_enabled(config.display_badge);
        if config.display_badge {
            self.badge.refresh(&self.host).await;
        }
        info!(
            max_total = config.max_total,
            max_window = config.max_window,
            display_alert = config.display_alert,
            display_badge = config.display_badge,
            "tab limiter started"
        );
        config
    }

    pub async fn handle_event(&self, event: TabEvent) -> Option<Enforcement> {
        debug!(tab_id = %event.tab_id(), window_id = %event.window_id(), ?event, "tab event");
        match event {
            TabEvent::Created { tab_id, window_id } => {
                let (_, enforcement) =
                    tokio::join!(self.refresh_badge(), self.admit(tab_id, window_id));
                enforcement
            }
            TabEvent::Removed { .. } => {
                self.refresh_badge().await;
                None
            }
        }
    }

    pub async fn admit(&self, tab_id: TabId, window_id: WindowId) -> Option<Enforcement> {
        let config = self.settings.load().await;
        let tag =
            check_admission_within(&self.host, &config, window_id, self.options.check_timeout)
                .await?;

        let enforcement = Enforcement::plan(tab_id, tag, &config);
        let report = enforce(&self.host, &self.alerts, &enforcement).await;
        info!(
            %tab_id,
            %tag,
            alerted = report.alerted,
            closed = report.closed,
            "tab rejected"
        );
        Some(enforcement)
    }

    pub async fn refresh_badge(&self) -> Option<String> {
        self.badge.refresh(&self.host).await
    }

    pub async fn update_option(
        &self,
        key: &str,
        value: Value,
    ) -> Result<SettingValue, SetOptionError> {
        let setting = self.settings.set_option(key, value).await?;
        if key == DISPLAY_BADGE_KEY {
            if let SettingValue::Bool(enabled) = setting {
                self.set_badge_enabled(enabled).await;
            }
        }
        Ok(setting)
    }

    pub async fn set_badge_enabled(&self, enabled: bool) {
        let was_enabled = self.badge.set_enabled(enabled);
        if enabled && !was_enabled {
            self.badge.refresh(&self.host).await;
        }
    }
}

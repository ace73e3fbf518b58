use tracing::{debug, warn};

use crate::admission::AdmissionTag;
use crate::config::LimitConfig;
use crate::host::{AlertSink, TabHost};
use crate::ids::TabId;
use crate::template::render_alert;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enforcement {
    pub tab_id: TabId,
    pub tag: AdmissionTag,
    pub alert: Option<String>,
}

impl Enforcement {
    pub fn plan(tab_id: TabId, tag: AdmissionTag, config: &LimitConfig) -> Self {
        let alert = config
            .display_alert
            .then(|| render_alert(&config.alert_message, tag, config));
        Self { tab_id, tag, alert }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnforcementReport {
    pub alerted: bool,
    pub closed: bool,
}

pub async fn enforce<H, A>(host: &H, alerts: &A, enforcement: &Enforcement) -> EnforcementReport
where
    H: TabHost + ?Sized,
    A: AlertSink + ?Sized,
{
    let mut report = EnforcementReport::default();

    if let Some(message) = &enforcement.alert {
        match alerts.alert(message).await {
            Ok(()) => report.alerted = true,
            Err(error) => warn!(tab_id = %enforcement.tab_id, %error, "failed to show alert"),
        }
    }

    match host.close_tab(enforcement.tab_id).await {
        Ok(()) => {
            report.closed = true;
            debug!(tab_id = %enforcement.tab_id, "closed tab over limit");
        }
        Err(error) => warn!(tab_id = %enforcement.tab_id, %error, "failed to close tab"),
    }

    report
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::host::mock::{HostCall, MockHost};
    use crate::host::HostError;

    struct BrokenAlerts;

    #[async_trait]
    impl AlertSink for BrokenAlerts {
        async fn alert(&self, _message: &str) -> Result<(), HostError> {
            Err(HostError::Native("no modal available".to_owned()))
        }
    }

    #[test]
    fn plan_renders_alert_only_when_enabled() {
        let mut config = LimitConfig {
            max_total: 2,
            max_window: 5,
            alert_message: "Limit: {which}/{maxWhich}".to_owned(),
            ..LimitConfig::default()
        };

        let plan = Enforcement::plan(TabId(3), AdmissionTag::Total, &config);
        assert_eq!(plan.alert.as_deref(), Some("Limit: total/2"));

        config.display_alert = false;
        let plan = Enforcement::plan(TabId(3), AdmissionTag::Total, &config);
        assert_eq!(plan.alert, None);
    }

    #[tokio::test]
    async fn alert_precedes_close() {
        let host = MockHost::default();
        let plan = Enforcement {
            tab_id: TabId(9),
            tag: AdmissionTag::Window,
            alert: Some("too many".to_owned()),
        };

        let report = enforce(&host, &host, &plan).await;

        assert_eq!(
            report,
            EnforcementReport {
                alerted: true,
                closed: true
            }
        );
        assert_eq!(
            host.calls(),
            vec![
                HostCall::Alert("too many".to_owned()),
                HostCall::Closed(TabId(9)),
            ]
        );
    }

    #[tokio::test]
    async fn tab_is_closed_even_if_alert_fails() {
        let host = MockHost::default();
        let plan = Enforcement {
            tab_id: TabId(4),
            tag: AdmissionTag::Total,
            alert: Some("over".to_owned()),
        };

        let report = enforce(&host, &BrokenAlerts, &plan).await;

        assert!(!report.alerted);
        assert!(report.closed);
        assert_eq!(host.calls(), vec![HostCall::Closed(TabId(4))]);
    }
}

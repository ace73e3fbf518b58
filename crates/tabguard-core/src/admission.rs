use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::{LimitConfig, MAX_TOTAL_KEY, MAX_WINDOW_KEY};
use crate::host::{TabHost, TabQuery};
use crate::ids::WindowId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdmissionTag {
    Window,
    Total,
}

impl AdmissionTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Window => "window",
            Self::Total => "total",
        }
    }

    pub fn limit_key(self) -> &'static str {
        match self {
            Self::Window => MAX_WINDOW_KEY,
            Self::Total => MAX_TOTAL_KEY,
        }
    }

    pub fn scope_label(self) -> &'static str {
        match self {
            Self::Window => "one window",
            Self::Total => "total",
        }
    }

    fn query(self, window_id: WindowId) -> TabQuery {
        match self {
            Self::Window => TabQuery::in_window(window_id),
            Self::Total => TabQuery::all_windows(),
        }
    }
}

impl Display for AdmissionTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

pub async fn check_admission<H>(
    host: &H,
    config: &LimitConfig,
    window_id: WindowId,
) -> Option<AdmissionTag>
where
    H: TabHost + ?Sized,
{
    let window = limit_reached(host, config, AdmissionTag::Window, window_id);
    let total = limit_reached(host, config, AdmissionTag::Total, window_id);

    // Same-poll resolution reports the window limit.
    tokio::select! {
        biased;
        Some(tag) = window => Some(tag),
        Some(tag) = total => Some(tag),
        else => None,
    }
}

pub async fn check_admission_within<H>(
    host: &H,
    config: &LimitConfig,
    window_id: WindowId,
    timeout: Option<Duration>,
) -> Option<AdmissionTag>
where
    H: TabHost + ?Sized,
{
    let Some(timeout) = timeout else {
        return check_admission(host, config, window_id).await;
    };
    match tokio::time::timeout(timeout, check_admission(host, config, window_id)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(timeout_ms = timeout.as_millis() as u64, "admission check timed out");
            None
        }
    }
}

async fn limit_reached<H>(
    host: &H,
    config: &LimitConfig,
    tag: AdmissionTag,
    window_id: WindowId,
) -> Option<AdmissionTag>
where
    H: TabHost + ?Sized,
{
    let threshold = config.threshold(tag);
    match host.count_tabs(tag.query(window_id)).await {
        Ok(count) => {
            let count = i64::try_from(count).unwrap_or(i64::MAX);
            let reached = count >= threshold;
            debug!(%tag, count, threshold, reached, "tab count observed");
            reached.then_some(tag)
        }
        Err(error) => {
            warn!(%tag, %error, "tab query failed; admitting");
            None
        }
    }
}

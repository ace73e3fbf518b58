use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::host::{TabHost, TabQuery};

#[derive(Debug, Default)]
pub struct BadgeUpdater {
    enabled: AtomicBool,
}

impl BadgeUpdater {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) -> bool {
        self.enabled.swap(enabled, Ordering::AcqRel)
    }

    pub async fn refresh<H>(&self, host: &H) -> Option<String>
    where
        H: TabHost + ?Sized,
    {
        if !self.is_enabled() {
            return None;
        }

        let (window, total) = tokio::join!(
            host.count_tabs(TabQuery::current_window()),
            host.count_tabs(TabQuery::all_windows()),
        );
        let window = match window {
            Ok(count) => count,
            Err(error) => {
                warn!(%error, "badge refresh skipped");
                return None;
            }
        };
        match total {
            Ok(total) => debug!(window, total, "badge counts"),
            Err(error) => debug!(window, %error, "total count unavailable"),
        }

        let text = badge_text(window);
        if let Err(error) = host.set_badge_text(&text).await {
            warn!(%error, "failed to set badge text");
            return None;
        }
        Some(text)
    }
}

pub fn badge_text(count: usize) -> String {
    count.to_string()
}

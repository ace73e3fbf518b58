use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::ids::{TabId, WindowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowScope {
    All,
    Focused,
    Window(WindowId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabQuery {
    pub pinned: bool,
    pub scope: WindowScope,
}

impl TabQuery {
    pub const fn all_windows() -> Self {
        Self {
            pinned: false,
            scope: WindowScope::All,
        }
    }

    pub const fn current_window() -> Self {
        Self {
            pinned: false,
            scope: WindowScope::Focused,
        }
    }

    pub const fn in_window(window_id: WindowId) -> Self {
        Self {
            pinned: false,
            scope: WindowScope::Window(window_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("tab query failed: {0}")]
    Query(String),
    #[error("tab not found: {0}")]
    TabNotFound(TabId),
    #[error("{0}")]
    Native(String),
}

#[async_trait]
pub trait TabHost: Send + Sync {
    async fn count_tabs(&self, query: TabQuery) -> Result<usize, HostError>;

    async fn close_tab(&self, tab_id: TabId) -> Result<(), HostError>;

    async fn set_badge_text(&self, text: &str) -> Result<(), HostError>;
}

#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn alert(&self, message: &str) -> Result<(), HostError>;
}

#[async_trait]
impl<T: TabHost + ?Sized> TabHost for Arc<T> {
    async fn count_tabs(&self, query: TabQuery) -> Result<usize, HostError> {
        (**self).count_tabs(query).await
    }

    async fn close_tab(&self, tab_id: TabId) -> Result<(), HostError> {
        (**self).close_tab(tab_id).await
    }

    async fn set_badge_text(&self, text: &str) -> Result<(), HostError> {
        (**self).set_badge_text(text).await
    }
}

#[async_trait]
impl<T: AlertSink + ?Sized> AlertSink for Arc<T> {
    async fn alert(&self, message: &str) -> Result<(), HostError> {
        (**self).alert(message).await
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{AlertSink, HostError, TabHost, TabQuery, WindowScope};
    use crate::ids::TabId;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum HostCall {
        Closed(TabId),
        Badge(String),
        Alert(String),
    }

    #[derive(Debug, Default)]
    pub struct MockHost {
        pub window_tabs: usize,
        pub total_tabs: usize,
        pub window_latency: Duration,
        pub total_latency: Duration,
        pub fail_window_query: bool,
        pub fail_total_query: bool,
        calls: Mutex<Vec<HostCall>>,
        queries: Mutex<Vec<TabQuery>>,
    }

    impl MockHost {
        pub fn with_counts(window_tabs: usize, total_tabs: usize) -> Self {
            Self {
                window_tabs,
                total_tabs,
                ..Self::default()
            }
        }

        pub fn latencies(mut self, window: Duration, total: Duration) -> Self {
            self.window_latency = window;
            self.total_latency = total;
            self
        }

        pub fn calls(&self) -> Vec<HostCall> {
            self.calls.lock().expect("mock host lock").clone()
        }

        pub fn queries(&self) -> Vec<TabQuery> {
            self.queries.lock().expect("mock host lock").clone()
        }

        fn record(&self, call: HostCall) {
            self.calls.lock().expect("mock host lock").push(call);
        }
    }

    #[async_trait]
    impl TabHost for MockHost {
        async fn count_tabs(&self, query: TabQuery) -> Result<usize, HostError> {
            self.queries.lock().expect("mock host lock").push(query);
            let (latency, fail, count) = match query.scope {
                WindowScope::All => (self.total_latency, self.fail_total_query, self.total_tabs),
                WindowScope::Focused | WindowScope::Window(_) => {
                    (self.window_latency, self.fail_window_query, self.window_tabs)
                }
            };
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            if fail {
                return Err(HostError::Query("scripted failure".to_owned()));
            }
            Ok(count)
        }

        async fn close_tab(&self, tab_id: TabId) -> Result<(), HostError> {
            self.record(HostCall::Closed(tab_id));
            Ok(())
        }

        async fn set_badge_text(&self, text: &str) -> Result<(), HostError> {
            self.record(HostCall::Badge(text.to_owned()));
            Ok(())
        }
    }

    #[async_trait]
    impl AlertSink for MockHost {
        async fn alert(&self, message: &str) -> Result<(), HostError> {
            self.record(HostCall::Alert(message.to_owned()));
            Ok(())
        }
    }
}

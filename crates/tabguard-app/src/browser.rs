use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tabguard_core::{
    AlertSink, HostError, TabEvent, TabHost, TabId, TabQuery, WindowId, WindowScope,
};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::command::WindowTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SimTab {
    window_id: WindowId,
    pinned: bool,
}

#[derive(Debug)]
struct BrowserTable {
    windows: BTreeMap<WindowId, Vec<TabId>>,
    tabs: BTreeMap<TabId, SimTab>,
    focused: Option<WindowId>,
    badge: String,
    next_window_id: u64,
    next_tab_id: u64,
}

impl BrowserTable {
    fn allocate_window(&mut self) -> WindowId {
        let window_id = WindowId(self.next_window_id);
        self.next_window_id += 1;
        self.windows.insert(window_id, Vec::new());
        window_id
    }

    fn allocate_tab(&mut self, window_id: WindowId, pinned: bool) -> TabId {
        let tab_id = TabId(self.next_tab_id);
        self.next_tab_id += 1;
        self.tabs.insert(tab_id, SimTab { window_id, pinned });
        self.windows.entry(window_id).or_default().push(tab_id);
        tab_id
    }
}

pub struct SimulatedBrowser {
    table: Mutex<BrowserTable>,
    events: UnboundedSender<TabEvent>,
    transcript: Mutex<Vec<String>>,
    echo: bool,
}

impl SimulatedBrowser {
    pub fn new(events: UnboundedSender<TabEvent>, echo: bool) -> Self {
        let mut table = BrowserTable {
            windows: BTreeMap::new(),
            tabs: BTreeMap::new(),
            focused: None,
            badge: String::new(),
            next_window_id: 1,
            next_tab_id: 1,
        };
        let window_id = table.allocate_window();
        table.allocate_tab(window_id, false);
        table.focused = Some(window_id);

        Self {
            table: Mutex::new(table),
            events,
            transcript: Mutex::new(Vec::new()),
            echo,
        }
    }

    pub fn open_tab(&self, target: WindowTarget, pinned: bool) -> Result<TabId, HostError> {
        let (tab_id, window_id) = {
            let mut table = self.table()?;
            let window_id = match target {
                WindowTarget::Focused => match table.focused {
                    Some(window_id) => window_id,
                    None => table.allocate_window(),
                },
                WindowTarget::New => table.allocate_window(),
                WindowTarget::Existing(window_id) => {
                    if !table.windows.contains_key(&window_id) {
                        return Err(HostError::Native(format!("no such window: {window_id}")));
                    }
                    window_id
                }
            };
            table.focused = Some(window_id);
            (table.allocate_tab(window_id, pinned), window_id)
        };

        debug!(%tab_id, %window_id, pinned, "tab opened");
        self.emit(TabEvent::Created { tab_id, window_id });
        Ok(tab_id)
    }

    pub fn remove_tab(&self, tab_id: TabId) -> Result<(), HostError> {
        let window_id = {
            let mut table = self.table()?;
            let tab = table.tabs.remove(&tab_id).ok_or(HostError::TabNotFound(tab_id))?;
            let window_id = tab.window_id;
            let window_empty = match table.windows.get_mut(&window_id) {
                Some(order) => {
                    order.retain(|id| *id != tab_id);
                    order.is_empty()
                }
                None => false,
            };
            if window_empty {
                table.windows.remove(&window_id);
                if table.focused == Some(window_id) {
                    table.focused = table.windows.keys().next().copied();
                }
            }
            window_id
        };

        debug!(%tab_id, %window_id, "tab removed");
        self.emit(TabEvent::Removed { tab_id, window_id });
        Ok(())
    }

    pub fn focus(&self, window_id: WindowId) -> Result<(), HostError> {
        let mut table = self.table()?;
        if !table.windows.contains_key(&window_id) {
            return Err(HostError::Native(format!("no such window: {window_id}")));
        }
        table.focused = Some(window_id);
        Ok(())
    }

    #[cfg(test)]
    pub fn has_tab(&self, tab_id: TabId) -> bool {
        self.table()
            .map(|table| table.tabs.contains_key(&tab_id))
            .unwrap_or(false)
    }

    pub fn tab_count(&self) -> usize {
        self.table().map(|table| table.tabs.len()).unwrap_or(0)
    }

    pub fn window_count(&self) -> usize {
        self.table().map(|table| table.windows.len()).unwrap_or(0)
    }

    pub fn badge(&self) -> String {
        self.table()
            .map(|table| table.badge.clone())
            .unwrap_or_default()
    }

    pub fn describe(&self) -> String {
        let Ok(table) = self.table() else {
            return "browser state unavailable".to_owned();
        };
        let mut out = String::new();
        for (window_id, order) in &table.windows {
            let marker = if table.focused == Some(*window_id) { "*" } else { " " };
            let _ = write!(out, "{marker}{window_id}:");
            for tab_id in order {
                let pinned = table.tabs.get(tab_id).is_some_and(|tab| tab.pinned);
                let _ = write!(out, " {}{}", tab_id.0, if pinned { "p" } else { "" });
            }
            out.push('\n');
        }
        let _ = write!(out, "badge={:?}", table.badge);
        out
    }

    pub fn say(&self, line: impl Into<String>) {
        let line = line.into();
        if self.echo {
            println!("{line}");
        }
        if let Ok(mut transcript) = self.transcript.lock() {
            transcript.push(line);
        }
    }

    pub fn transcript(&self) -> Vec<String> {
        self.transcript
            .lock()
            .map(|transcript| transcript.clone())
            .unwrap_or_default()
    }

    fn emit(&self, event: TabEvent) {
        if self.events.send(event).is_err() {
            debug!(?event, "runtime is gone; dropping tab event");
        }
    }

    fn table(&self) -> Result<MutexGuard<'_, BrowserTable>, HostError> {
        self.table
            .lock()
            .map_err(|_| HostError::Native("browser table lock poisoned".to_owned()))
    }
}

#[async_trait]
impl TabHost for SimulatedBrowser {
    async fn count_tabs(&self, query: TabQuery) -> Result<usize, HostError> {
        let table = self.table()?;
        let focused = table.focused;
        Ok(table
            .tabs
            .values()
            .filter(|tab| tab.pinned == query.pinned)
            .filter(|tab| match query.scope {
                WindowScope::All => true,
                WindowScope::Focused => Some(tab.window_id) == focused,
                WindowScope::Window(window_id) => tab.window_id == window_id,
            })
            .count())
    }

    async fn close_tab(&self, tab_id: TabId) -> Result<(), HostError> {
        self.remove_tab(tab_id)
    }

    async fn set_badge_text(&self, text: &str) -> Result<(), HostError> {
        self.table()?.badge = text.to_owned();
        self.say(format!("[badge] {text}"));
        Ok(())
    }
}

#[async_trait]
impl AlertSink for SimulatedBrowser {
    async fn alert(&self, message: &str) -> Result<(), HostError> {
        self.say(format!("[alert] {message}"));
        Ok(())
    }
}

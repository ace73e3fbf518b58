use std::sync::Arc;

use serde_json::Value;
use tabguard_core::{
    Engine, EngineOptions, HostError, KeyValueStore, LimitConfig, SetOptionError, TabEvent,
    DISPLAY_BADGE_KEY,
};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::browser::SimulatedBrowser;
use crate::command::{CommandError, ShellCommand};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("host error: {0}")]
    Host(#[from] HostError),
    #[error("option not saved: {0}")]
    Option(#[from] SetOptionError),
    #[error("invalid command: {0}")]
    Command(#[from] CommandError),
    #[error("input error: {0}")]
    Input(#[from] std::io::Error),
}

pub type AppEngine<S> = Engine<Arc<SimulatedBrowser>, Arc<SimulatedBrowser>, S>;

pub struct AppRuntime<S: KeyValueStore + 'static> {
    engine: Arc<AppEngine<S>>,
    browser: Arc<SimulatedBrowser>,
    events: UnboundedReceiver<TabEvent>,
    tasks: JoinSet<()>,
    startup_config: LimitConfig,
}

impl<S: KeyValueStore + 'static> AppRuntime<S> {
    pub async fn bootstrap(store: S, options: EngineOptions, echo: bool) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        let browser = Arc::new(SimulatedBrowser::new(tx, echo));
        let engine = Arc::new(Engine::new(browser.clone(), browser.clone(), store, options));
        let startup_config = engine.startup().await;

        Self {
            engine,
            browser,
            events,
            tasks: JoinSet::new(),
            startup_config,
        }
    }

    pub fn browser(&self) -> &SimulatedBrowser {
        &self.browser
    }

    #[cfg(test)]
    pub fn engine(&self) -> &AppEngine<S> {
        &self.engine
    }

    pub fn startup_config(&self) -> &LimitConfig {
        &self.startup_config
    }

    pub async fn run<R>(&mut self, input: R) -> Result<(), RuntimeError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match line.parse::<ShellCommand>() {
                Ok(ShellCommand::Quit) => break,
                Ok(command) => {
                    if let Err(error) = self.apply(command).await {
                        self.browser.say(format!("error: {error}"));
                    }
                }
                Err(error) => self.browser.say(format!("error: {}", RuntimeError::from(error))),
            }
            self.drain().await;
        }

        self.drain().await;
        Ok(())
    }

    pub async fn apply(&mut self, command: ShellCommand) -> Result<(), RuntimeError> {
        match command {
            ShellCommand::Open { target, pinned } => {
                let tab_id = self.browser.open_tab(target, pinned)?;
                self.browser.say(format!("opened {tab_id}"));
            }
            ShellCommand::Close { tab_id } => {
                self.browser.remove_tab(tab_id)?;
                self.browser.say(format!("closed {tab_id}"));
            }
            ShellCommand::Focus { window_id } => self.browser.focus(window_id)?,
            ShellCommand::Badge { enabled } => {
                self.update_option(DISPLAY_BADGE_KEY, Value::from(enabled)).await?;
            }
            ShellCommand::Set { key, value } => self.update_option(&key, value).await?,
            ShellCommand::Show => {
                self.browser.say(format!(
                    "windows={} tabs={}",
                    self.browser.window_count(),
                    self.browser.tab_count()
                ));
                self.browser.say(self.browser.describe());
            }
            ShellCommand::Quit => {}
        }
        Ok(())
    }

    pub async fn drain(&mut self) {
        loop {
            while let Ok(event) = self.events.try_recv() {
                self.dispatch(event);
            }
            if self.tasks.is_empty() {
                break;
            }
            tokio::select! {
                Some(event) = self.events.recv() => self.dispatch(event),
                Some(result) = self.tasks.join_next() => {
                    if let Err(error) = result {
                        warn!(%error, "tab event task failed");
                    }
                }
                else => break,
            }
        }
    }

    fn dispatch(&mut self, event: TabEvent) {
        let engine = Arc::clone(&self.engine);
        self.tasks.spawn(async move {
            if let Some(enforcement) = engine.handle_event(event).await {
                debug!(tab_id = %enforcement.tab_id, tag = %enforcement.tag, "tab rejected");
            }
        });
    }

    async fn update_option(&self, key: &str, value: Value) -> Result<(), RuntimeError> {
        let setting = self.engine.update_option(key, value).await?;
        self.browser.say(format!("set {key} = {setting}"));
        Ok(())
    }
}

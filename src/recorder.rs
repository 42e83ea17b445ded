//! Interaction recording: turns capture messages from the page into
//! persisted test steps.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dom::ElementSnapshot;
use crate::errors::{Result, WebtrailError};
use crate::listeners::{ListenerHost, ListenerTable};
use crate::selector;
use crate::store::Store;
use crate::types::{ActionKind, TestStep};

/// Message the page sends for every observed interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureMessage {
    pub kind: ActionKind,
    /// Lineage of the event target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementSnapshot>,
    /// Typed text or pressed key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Page URL, sent on unload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl CaptureMessage {
    pub fn parse(payload: &str) -> Result<Self> {
        serde_json::from_str(payload)
            .map_err(|e| WebtrailError::serialization("capture message", e))
    }
}

/// Page lifecycle events that require listeners to be installed again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSignal {
    Load,
    DomContentLoaded,
}

/// Build the step for a capture message, `None` when it carries too little
pub fn step_from_message(message: CaptureMessage) -> Option<TestStep> {
    let target = message
        .element
        .as_ref()
        .and_then(ElementSnapshot::target)
        .map(|el| selector::synthesize_string(&el));

    match message.kind {
        ActionKind::PageRefresh => Some(TestStep::new(
            ActionKind::PageRefresh,
            message.url.unwrap_or_default(),
            None,
        )),
        ActionKind::KeyDown => {
            let key = message.value?;
            Some(TestStep::new(
                ActionKind::KeyDown,
                target.unwrap_or_else(|| "body".to_string()),
                Some(key),
            ))
        }
        ActionKind::Type => Some(TestStep::new(
            ActionKind::Type,
            target?,
            Some(message.value.unwrap_or_default()),
        )),
        ActionKind::Unsupported(name) => {
            warn!("Ignoring capture of unsupported action '{}'", name);
            None
        }
        kind => Some(TestStep::new(kind, target?, None)),
    }
}

/// Steps recorded during one automation run
pub struct RecordingSession {
    steps: Vec<TestStep>,
    counter: u64,
    enabled: bool,
    store: Arc<dyn Store>,
    key: String,
}

impl RecordingSession {
    /// Start an enabled session persisting to `key` in `store`
    pub fn new(store: Arc<dyn Store>, key: impl Into<String>) -> Self {
        RecordingSession {
            steps: Vec::new(),
            counter: 0,
            enabled: true,
            store,
            key: key.into(),
        }
    }

    pub fn steps(&self) -> &[TestStep] {
        &self.steps
    }

    /// Number of steps recorded so far, never decreases
    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Append a step and rewrite the whole log
    ///
    /// Returns `false` without touching anything when recording is off.
    pub fn record(&mut self, step: TestStep) -> Result<bool> {
        if !self.enabled {
            return Ok(false);
        }

        self.steps.push(step);
        self.counter += 1;
        self.persist()?;
        Ok(true)
    }

    /// Turn a capture message into a step and record it
    pub fn capture(&mut self, message: CaptureMessage) -> Result<Option<TestStep>> {
        if !self.enabled {
            return Ok(None);
        }

        let Some(step) = step_from_message(message) else {
            return Ok(None);
        };

        self.record(step.clone())?;
        info!(
            "Test step recorded: {} {} {}",
            step.action,
            step.target,
            step.value.as_deref().unwrap_or("")
        );
        Ok(Some(step))
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string(&self.steps)
            .map_err(|e| WebtrailError::serialization("test steps", e))?;
        self.store.write(&self.key, &json)
    }
}

/// Capture side of the controller: keeps listeners installed and feeds
/// capture messages into the session
pub struct CaptureController<H: ListenerHost> {
    host: H,
    table: ListenerTable,
    session: RecordingSession,
}

impl<H: ListenerHost> CaptureController<H> {
    pub fn new(host: H, table: ListenerTable, session: RecordingSession) -> Self {
        CaptureController {
            host,
            table,
            session,
        }
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_session(self) -> RecordingSession {
        self.session
    }

    /// Reinstall listeners after the document changed
    pub async fn on_page_signal(&mut self, signal: PageSignal) -> Result<()> {
        debug!("Page signal {:?}, reinstalling listeners", signal);
        self.table.reinstall(&self.host).await?;
        Ok(())
    }

    /// Record one capture message
    pub fn on_capture(&mut self, message: CaptureMessage) -> Result<Option<TestStep>> {
        self.session.capture(message)
    }

    /// Process page signals and capture messages until shutdown or until
    /// both channels close
    ///
    /// Listener installation failures are logged and retried on the next
    /// signal; persisting a step is fatal.
    pub async fn run<F>(
        &mut self,
        mut signals: mpsc::Receiver<PageSignal>,
        mut captures: mpsc::Receiver<CaptureMessage>,
        shutdown: F,
    ) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut signals_open = true;
        let mut captures_open = true;

        while signals_open || captures_open {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Recording stopped");
                    break;
                }
                signal = signals.recv(), if signals_open => match signal {
                    Some(signal) => {
                        if let Err(e) = self.on_page_signal(signal).await {
                            warn!("Failed to install listeners: {:#}", e);
                        }
                    }
                    None => signals_open = false,
                },
                message = captures.recv(), if captures_open => match message {
                    Some(message) => {
                        if let Err(e) = self.on_capture(message) {
                            error!("Failed to persist test step: {}", e);
                            return Err(e);
                        }
                    }
                    None => captures_open = false,
                },
            }
        }

        info!("Recorded {} steps", self.session.counter());
        Ok(())
    }
}

#[cfg(test)]
#[path = "recorder_test.rs"]
mod recorder_test;

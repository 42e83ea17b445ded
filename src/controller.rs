//! Drives one page through a recording or a replay.

use std::future::Future;
use tokio::sync::mpsc;
use tracing::info;

use crate::driver::BrowserDriver;
use crate::errors::{Result, WebtrailError};
use crate::listeners::{ListenerHost, ListenerTable};
use crate::recorder::{CaptureController, CaptureMessage, PageSignal, RecordingSession};
use crate::replay::{ReplayReport, Replayer};
use crate::store::Store;

/// What the controller is doing with its page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerMode {
    Idle,
    Capturing,
    Replaying,
}

/// Page event streams a recording listens to
pub struct RecordingChannels {
    pub signals: mpsc::Receiver<PageSignal>,
    pub captures: mpsc::Receiver<CaptureMessage>,
}

/// Owns a page and runs exactly one recording or replay on it
pub struct Controller<P> {
    page: P,
    mode: ControllerMode,
}

impl<P> Controller<P>
where
    P: BrowserDriver + ListenerHost + Clone,
{
    pub fn new(page: P) -> Self {
        Controller {
            page,
            mode: ControllerMode::Idle,
        }
    }

    pub fn mode(&self) -> ControllerMode {
        self.mode
    }

    fn enter(&mut self, mode: ControllerMode) -> Result<()> {
        if self.mode != ControllerMode::Idle {
            return Err(WebtrailError::Other(anyhow::anyhow!(
                "Controller is already {:?}",
                self.mode
            )));
        }
        self.mode = mode;
        Ok(())
    }

    /// Open `url` and record interactions until `shutdown` or the page goes away
    ///
    /// `channels` must be subscribed before navigation so the first load
    /// installs the listeners.
    pub async fn record<F>(
        &mut self,
        url: &str,
        channels: RecordingChannels,
        table: ListenerTable,
        session: RecordingSession,
        shutdown: F,
    ) -> Result<RecordingSession>
    where
        F: Future<Output = ()>,
    {
        self.enter(ControllerMode::Capturing)?;

        if let Err(e) = self.page.goto(url).await {
            self.mode = ControllerMode::Idle;
            return Err(WebtrailError::Driver(format!("{:#}", e)));
        }
        info!("Recording on {}. Press Ctrl-C to stop", url);

        let mut capture = CaptureController::new(self.page.clone(), table, session);
        let result = capture
            .run(channels.signals, channels.captures, shutdown)
            .await;
        self.mode = ControllerMode::Idle;
        result?;
        Ok(capture.into_session())
    }

    /// Open `url` and replay the log stored under `key`
    pub async fn replay(&mut self, url: &str, store: &dyn Store, key: &str) -> Result<ReplayReport> {
        self.enter(ControllerMode::Replaying)?;

        let result = async {
            self.page
                .goto(url)
                .await
                .map_err(|e| WebtrailError::Driver(format!("{:#}", e)))?;
            Replayer::new(&self.page).replay_from(store, key).await
        }
        .await;

        self.mode = ControllerMode::Idle;
        result
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;

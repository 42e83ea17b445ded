//! Replay of recorded test steps against a browser driver.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::driver::BrowserDriver;
use crate::errors::{Result, WebtrailError};
use crate::store::Store;
use crate::types::{ActionKind, MouseButton, TestStep};

/// What happened to one step during replay
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The browser action completed
    Dispatched,
    /// Nothing to dispatch, the page was given time to settle
    Settled,
    /// Unknown action kind, skipped
    Unsupported,
    /// The driver rejected the action, replay moved on
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub action: ActionKind,
    pub target: String,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// Result of a replay run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplayReport {
    /// No recorded log was found, nothing was replayed
    pub log_missing: bool,
    pub steps: Vec<StepReport>,
}

impl ReplayReport {
    fn count(&self, pred: impl Fn(&StepOutcome) -> bool) -> usize {
        self.steps.iter().filter(|s| pred(&s.outcome)).count()
    }

    pub fn dispatched(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::Dispatched))
    }

    pub fn unsupported(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::Unsupported))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::Failed { .. }))
    }
}

/// Read the recorded steps, `None` when the log does not exist
pub fn load_steps(store: &dyn Store, key: &str) -> Result<Option<Vec<TestStep>>> {
    let Some(json) = store.read(key)? else {
        return Ok(None);
    };
    let steps = serde_json::from_str(&json)
        .map_err(|e| WebtrailError::serialization(store.locate(key), e))?;
    Ok(Some(steps))
}

/// Script that fires a bubbling `change` event on the matched element
pub fn change_event_script(selector: &str) -> String {
    // JSON string literals are valid JavaScript string literals.
    let quoted = serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "(() => {{ const input = document.querySelector({}); \
         if (!input) return false; \
         input.dispatchEvent(new Event('change', {{ bubbles: true }})); \
         return true; }})()",
        quoted
    )
}

/// Drives a browser through recorded steps one at a time
pub struct Replayer<'a, D: BrowserDriver + ?Sized> {
    driver: &'a D,
}

impl<'a, D: BrowserDriver + ?Sized> Replayer<'a, D> {
    pub fn new(driver: &'a D) -> Self {
        Replayer { driver }
    }

    /// Replay the log stored under `key`
    ///
    /// A missing log is reported and yields an empty report; a malformed log
    /// aborts before any action is dispatched.
    pub async fn replay_from(&self, store: &dyn Store, key: &str) -> Result<ReplayReport> {
        match load_steps(store, key)? {
            Some(steps) => Ok(self.replay(&steps).await),
            None => {
                warn!("{}", WebtrailError::LogMissing(store.locate(key).into()));
                Ok(ReplayReport {
                    log_missing: true,
                    steps: Vec::new(),
                })
            }
        }
    }

    /// Replay steps in order, each one completing before the next starts
    pub async fn replay(&self, steps: &[TestStep]) -> ReplayReport {
        info!("Replaying {} steps", steps.len());
        let mut report = ReplayReport::default();

        for (index, step) in steps.iter().enumerate() {
            let outcome = self.play(step).await;
            match &outcome {
                StepOutcome::Failed { reason } => {
                    warn!("Step {} ({} {}) failed: {}", index, step.action, step.target, reason)
                }
                StepOutcome::Unsupported => {
                    warn!("Unsupported action: {}", step.action)
                }
                _ => debug!("Step {} ({} {}) done", index, step.action, step.target),
            }
            report.steps.push(StepReport {
                index,
                action: step.action.clone(),
                target: step.target.clone(),
                outcome,
            });
        }

        info!(
            "Replay finished: {} dispatched, {} unsupported, {} failed",
            report.dispatched(),
            report.unsupported(),
            report.failed()
        );
        report
    }

    async fn play(&self, step: &TestStep) -> StepOutcome {
        let target = step.target.as_str();
        let result = match &step.action {
            ActionKind::Click => self.driver.click(target, MouseButton::Primary).await,
            ActionKind::Type => {
                self.driver
                    .type_text(target, step.value.as_deref().unwrap_or(""))
                    .await
            }
            ActionKind::FileUpload => self
                .driver
                .evaluate(&change_event_script(target))
                .await
                .map(|_| ()),
            ActionKind::Hover => self.driver.hover(target).await,
            ActionKind::RightClick => self.driver.click(target, MouseButton::Secondary).await,
            ActionKind::KeyDown => match step.value.as_deref() {
                Some(key) if !key.is_empty() => self.driver.press_key(key).await,
                _ => {
                    return StepOutcome::Failed {
                        reason: "keyDown step has no key".to_string(),
                    };
                }
            },
            ActionKind::PageRefresh => {
                return match self.driver.settle().await {
                    Ok(()) => StepOutcome::Settled,
                    Err(e) => StepOutcome::Failed {
                        reason: format!("{:#}", e),
                    },
                };
            }
            ActionKind::Unsupported(_) => return StepOutcome::Unsupported,
        };

        if let Err(e) = result {
            return StepOutcome::Failed {
                reason: format!("{:#}", e),
            };
        }

        if let Err(e) = self.driver.settle().await {
            debug!("Page did not settle after {}: {:#}", step.action, e);
        }
        StepOutcome::Dispatched
    }
}

#[cfg(test)]
#[path = "replay_test.rs"]
mod replay_test;

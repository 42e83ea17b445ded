// Unit tests for the controller

use super::*;
use crate::dom::{Document, ElementSnapshot, ElementSpec};
use crate::listeners::{ListenerHandle, ListenerKind};
use crate::store::MemoryStore;
use crate::types::{ActionKind, MouseButton};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

const STEPS: &str = "test_steps.json";

/// Page stand-in logging navigation, actions and listener changes
#[derive(Clone, Default)]
struct FakePage {
    log: Arc<Mutex<Vec<String>>>,
    unreachable: bool,
}

impl FakePage {
    fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn push(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl BrowserDriver for FakePage {
    async fn goto(&self, url: &str) -> anyhow::Result<()> {
        if self.unreachable {
            anyhow::bail!("net::ERR_NAME_NOT_RESOLVED at {}", url);
        }
        self.push(format!("goto {}", url));
        Ok(())
    }

    async fn click(&self, selector: &str, button: MouseButton) -> anyhow::Result<()> {
        self.push(format!("click {:?} {}", button, selector));
        Ok(())
    }

    async fn type_text(&self, selector: &str, text: &str) -> anyhow::Result<()> {
        self.push(format!("type {} {}", selector, text));
        Ok(())
    }

    async fn hover(&self, selector: &str) -> anyhow::Result<()> {
        self.push(format!("hover {}", selector));
        Ok(())
    }

    async fn press_key(&self, key: &str) -> anyhow::Result<()> {
        self.push(format!("key {}", key));
        Ok(())
    }

    async fn evaluate(&self, _script: &str) -> anyhow::Result<serde_json::Value> {
        Ok(serde_json::Value::Null)
    }
}

#[async_trait]
impl ListenerHost for FakePage {
    async fn install_runtime(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn attach(&self, kind: ListenerKind, handle: ListenerHandle) -> anyhow::Result<()> {
        self.push(format!("attach {} {}", kind.event_name(), handle.0));
        Ok(())
    }

    async fn detach(&self, kind: ListenerKind, handle: ListenerHandle) -> anyhow::Result<()> {
        self.push(format!("detach {} {}", kind.event_name(), handle.0));
        Ok(())
    }
}

fn login_form_messages() -> Vec<CaptureMessage> {
    let mut doc = Document::new("html");
    let body = doc.append(doc.root(), ElementSpec::new("body"));
    let form = doc.append(body, ElementSpec::new("form"));
    let email = doc.append(form, ElementSpec::new("input").class("field email"));
    let submit = doc.append(form, ElementSpec::new("button"));

    let snap = |id| Some(ElementSnapshot::capture(&doc.element(id)));
    vec![
        CaptureMessage {
            kind: ActionKind::Type,
            element: snap(email),
            value: Some("ada@example.com".into()),
            url: None,
        },
        CaptureMessage {
            kind: ActionKind::KeyDown,
            element: snap(email),
            value: Some("Tab".into()),
            url: None,
        },
        CaptureMessage {
            kind: ActionKind::Click,
            element: snap(submit),
            value: None,
            url: None,
        },
    ]
}

#[tokio::test]
async fn test_record_then_replay() {
    let store = Arc::new(MemoryStore::new());
    let page = FakePage::default();
    let mut controller = Controller::new(page.clone());

    let (signal_tx, signals) = mpsc::channel(8);
    let (capture_tx, captures) = mpsc::channel(8);
    signal_tx.send(PageSignal::Load).await.unwrap();
    for message in login_form_messages() {
        capture_tx.send(message).await.unwrap();
    }
    drop(signal_tx);
    drop(capture_tx);

    let session = controller
        .record(
            "https://app.test/login",
            RecordingChannels { signals, captures },
            ListenerTable::with_kinds(vec![ListenerKind::Click]),
            RecordingSession::new(store.clone(), STEPS),
            std::future::pending(),
        )
        .await
        .unwrap();

    assert_eq!(session.counter(), 3);
    assert_eq!(controller.mode(), ControllerMode::Idle);
    let recorded = page.entries();
    assert_eq!(recorded[0], "goto https://app.test/login");
    assert!(recorded.contains(&"attach click 1".to_string()));

    let replay_page = FakePage::default();
    let report = Controller::new(replay_page.clone())
        .replay("https://app.test/login", store.as_ref(), STEPS)
        .await
        .unwrap();

    assert_eq!(report.dispatched(), 3);
    assert_eq!(
        replay_page.entries(),
        vec![
            "goto https://app.test/login",
            "type .field.email ada@example.com",
            "key Tab",
            "click Primary html > body > form > button",
        ]
    );
}

#[tokio::test]
async fn test_navigation_failure_is_a_driver_error() {
    let page = FakePage {
        unreachable: true,
        ..FakePage::default()
    };
    let store = MemoryStore::new();
    let mut controller = Controller::new(page.clone());

    let err = controller
        .replay("https://nowhere.invalid", &store, STEPS)
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 4);
    assert_eq!(controller.mode(), ControllerMode::Idle);
    assert!(page.entries().is_empty());
}

#[tokio::test]
async fn test_replay_with_missing_log_only_navigates() {
    let page = FakePage::default();
    let store = MemoryStore::new();

    let report = Controller::new(page.clone())
        .replay("https://app.test", &store, STEPS)
        .await
        .unwrap();

    assert!(report.log_missing);
    assert_eq!(page.entries(), vec!["goto https://app.test"]);
}

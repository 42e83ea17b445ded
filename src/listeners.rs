//! In-page interaction listeners and the host-side table tracking them.
//!
//! The page script installs a small runtime on `window.__webtrail` that can
//! attach and detach one listener per kind. Each listener snapshots the
//! event target's lineage and hands a [`CaptureMessage`] to the host through
//! the capture binding. The host keeps a [`ListenerTable`] of the handle it
//! registered for every kind and swaps them on each page load, so a kind is
//! never listened to twice.
//!
//! [`CaptureMessage`]: crate::recorder::CaptureMessage

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

/// Name of the CDP binding the page calls with capture messages
pub const CAPTURE_BINDING: &str = "__webtrailCapture";

/// Runtime injected into every document before listeners are attached
pub const PAGE_SCRIPT: &str = r#"
(() => {
    if (window.__webtrail) return true;

    const snapshot = (el) => {
        const lineage = [];
        let node = el;
        while (node && node.nodeType === 1) {
            const parent = node.parentElement;
            const level = {
                tag: node.tagName,
                id: node.id || null,
                className: typeof node.className === 'string'
                    ? node.className
                    : node.getAttribute('class'),
            };
            if (parent) {
                const children = Array.from(parent.children);
                level.siblings = children.map(c => c.tagName);
                level.index = children.indexOf(node);
            }
            lineage.push(level);
            node = parent;
        }
        return { lineage };
    };

    const send = (message) => {
        if (typeof window.__webtrailCapture === 'function') {
            window.__webtrailCapture(JSON.stringify(message));
        }
    };

    const isTextInput = (el) => {
        const tag = el.tagName.toLowerCase();
        return tag === 'input' || tag === 'textarea';
    };

    const handlers = {
        click: (e) => {
            if (e.target && e.target.nodeType === 1) {
                send({ kind: 'click', element: snapshot(e.target) });
            }
        },
        input: (e) => {
            const t = e.target;
            if (t && t.nodeType === 1 && isTextInput(t)) {
                send({ kind: 'type', element: snapshot(t), value: t.value || '' });
            }
        },
        contextmenu: (e) => {
            if (e.target && e.target.nodeType === 1) {
                send({ kind: 'rightClick', element: snapshot(e.target) });
            }
        },
        keydown: (e) => {
            const t = e.target && e.target.nodeType === 1 ? e.target : null;
            send({ kind: 'keyDown', element: t ? snapshot(t) : null, value: e.key });
        },
        change: (e) => {
            const t = e.target;
            if (t && t.type === 'file') {
                send({ kind: 'fileUpload', element: snapshot(t) });
            }
        },
        mouseover: (e) => {
            if (e.target && e.target.nodeType === 1) {
                send({ kind: 'hover', element: snapshot(e.target) });
            }
        },
        beforeunload: () => {
            send({ kind: 'pageRefresh', url: window.location.href });
        },
    };

    const targetFor = (event) => (event === 'beforeunload' ? window : document);
    const registry = {};

    window.__webtrail = {
        attach(event, handle) {
            const previous = registry[event];
            if (previous) {
                targetFor(event).removeEventListener(event, previous.fn, true);
            }
            const fn = (e) => handlers[event](e);
            targetFor(event).addEventListener(event, fn, true);
            registry[event] = { handle, fn };
            return true;
        },
        detach(event, handle) {
            const entry = registry[event];
            if (!entry || entry.handle !== handle) return false;
            targetFor(event).removeEventListener(event, entry.fn, true);
            delete registry[event];
            return true;
        },
    };
    return true;
})()
"#;

/// DOM event a listener is registered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Click,
    Input,
    ContextMenu,
    KeyDown,
    Change,
    Hover,
    Unload,
}

impl ListenerKind {
    /// DOM event name
    pub fn event_name(&self) -> &'static str {
        match self {
            ListenerKind::Click => "click",
            ListenerKind::Input => "input",
            ListenerKind::ContextMenu => "contextmenu",
            ListenerKind::KeyDown => "keydown",
            ListenerKind::Change => "change",
            ListenerKind::Hover => "mouseover",
            ListenerKind::Unload => "beforeunload",
        }
    }

    /// Expression attaching this listener with the given handle
    pub fn attach_script(&self, handle: ListenerHandle) -> String {
        format!(
            "window.__webtrail.attach('{}', {})",
            self.event_name(),
            handle.0
        )
    }

    /// Expression detaching the listener registered under `handle`
    pub fn detach_script(&self, handle: ListenerHandle) -> String {
        format!(
            "window.__webtrail && window.__webtrail.detach('{}', {})",
            self.event_name(),
            handle.0
        )
    }
}

/// Identifier of one attached listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(pub u64);

/// Something listeners can be installed into, normally a live page
#[async_trait]
pub trait ListenerHost: Send + Sync {
    /// Make sure the listener runtime exists in the current document
    async fn install_runtime(&self) -> Result<()>;

    async fn attach(&self, kind: ListenerKind, handle: ListenerHandle) -> Result<()>;

    async fn detach(&self, kind: ListenerKind, handle: ListenerHandle) -> Result<()>;
}

/// Host-owned record of the listener currently registered per kind
#[derive(Debug)]
pub struct ListenerTable {
    kinds: Vec<ListenerKind>,
    active: HashMap<ListenerKind, ListenerHandle>,
    next_handle: u64,
}

impl ListenerTable {
    /// Table for the default kinds, plus hover when requested
    pub fn new(record_hover: bool) -> Self {
        let mut kinds = vec![
            ListenerKind::Click,
            ListenerKind::Input,
            ListenerKind::ContextMenu,
            ListenerKind::KeyDown,
            ListenerKind::Change,
            ListenerKind::Unload,
        ];
        if record_hover {
            kinds.push(ListenerKind::Hover);
        }
        Self::with_kinds(kinds)
    }

    pub fn with_kinds(kinds: Vec<ListenerKind>) -> Self {
        ListenerTable {
            kinds,
            active: HashMap::new(),
            next_handle: 1,
        }
    }

    pub fn kinds(&self) -> &[ListenerKind] {
        &self.kinds
    }

    /// Handle currently registered for `kind`
    pub fn active(&self, kind: ListenerKind) -> Option<ListenerHandle> {
        self.active.get(&kind).copied()
    }

    /// Detach every registered listener and attach a fresh one per kind
    pub async fn reinstall<H: ListenerHost + ?Sized>(&mut self, host: &H) -> Result<()> {
        host.install_runtime().await?;

        for kind in self.kinds.clone() {
            if let Some(old) = self.active(kind) {
                host.detach(kind, old).await?;
                self.active.remove(&kind);
            }
            let handle = ListenerHandle(self.next_handle);
            self.next_handle += 1;
            host.attach(kind, handle).await?;
            self.active.insert(kind, handle);
        }

        debug!("Installed {} listeners", self.kinds.len());
        Ok(())
    }
}

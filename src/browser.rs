//! Chromium over the DevTools protocol.
//!
//! [`Browser`] owns the Chromium process and the chromiumoxide handler task.
//! [`Page`] is the only type that talks CDP: it implements [`BrowserDriver`]
//! for replay and [`ListenerHost`] for recording, and turns CDP events into
//! channels the controller loop can `select!` over.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, MouseButton as CdpMouseButton,
};
use chromiumoxide::cdp::browser_protocol::network::{self, EventRequestWillBeSent};
use chromiumoxide::cdp::browser_protocol::page::{EventDomContentEventFired, EventLoadEventFired};
use chromiumoxide::cdp::js_protocol::runtime::{AddBindingParams, EventBindingCalled};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde_json::Value;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::capture::ObservedRequest;
use crate::config::BrowserConfig;
use crate::driver::BrowserDriver;
use crate::listeners::{CAPTURE_BINDING, ListenerHandle, ListenerHost, ListenerKind, PAGE_SCRIPT};
use crate::recorder::{CaptureMessage, PageSignal};
use crate::types::MouseButton;

const CHANNEL_CAPACITY: usize = 256;

/// A running Chromium instance
pub struct Browser {
    inner: CdpBrowser,
    handler: JoinHandle<()>,
    config: BrowserConfig,
    // Removed from disk when the browser is dropped
    _temp_profile: Option<TempDir>,
}

impl Browser {
    /// Launch Chromium and start driving its event loop
    pub async fn launch(config: BrowserConfig) -> Result<Self> {
        let (user_data_dir, temp_profile) = match &config.user_data_dir {
            Some(dir) => (dir.clone(), None),
            None => {
                let temp = tempfile::Builder::new()
                    .prefix("webtrail-profile-")
                    .tempdir()
                    .context("Failed to create temporary browser profile")?;
                (temp.path().to_path_buf(), Some(temp))
            }
        };

        let mut builder = CdpConfig::builder()
            .no_sandbox()
            .user_data_dir(&user_data_dir);

        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(path) = &config.executable {
            builder = builder.chrome_executable(path);
        }

        builder = match &config.viewport {
            Some(size) => builder.window_size(size.width, size.height).viewport(Viewport {
                width: size.width,
                height: size.height,
                ..Viewport::default()
            }),
            // Let a visible window size the page itself
            None if !config.headless => builder.viewport(None),
            None => builder,
        };

        let cdp_config = builder
            .build()
            .map_err(anyhow::Error::msg)
            .context("Invalid Chrome launch configuration")?;

        let (inner, mut handler) = CdpBrowser::launch(cdp_config)
            .await
            .context("Failed to launch Chrome. Is Chrome or Chromium installed? Use --chrome to point at it")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler stopped: {}", e);
                    break;
                }
            }
        });

        info!(
            "Chrome started ({}, profile {})",
            if config.headless { "headless" } else { "visible" },
            user_data_dir.display()
        );

        Ok(Browser {
            inner,
            handler,
            config,
            _temp_profile: temp_profile,
        })
    }

    /// Open a blank page
    pub async fn new_page(&self) -> Result<Page> {
        let inner = self
            .inner
            .new_page("about:blank")
            .await
            .context("Failed to open a browser page")?;
        Ok(Page {
            inner,
            navigation_timeout: self.config.navigation_timeout,
        })
    }

    /// Close Chromium and wait for the handler to finish
    pub async fn close(mut self) -> Result<()> {
        if let Err(e) = self.inner.close().await {
            warn!("Error closing browser: {}", e);
        }
        if let Err(e) = self.inner.wait().await {
            debug!("Error waiting for browser exit: {}", e);
        }
        self.handler.abort();
        Ok(())
    }
}

/// One browser tab
#[derive(Clone)]
pub struct Page {
    inner: CdpPage,
    navigation_timeout: Duration,
}

impl Page {
    /// Let the page call `window.<name>(payload)` to reach the host
    pub async fn expose_binding(&self, name: &str) -> Result<()> {
        self.inner
            .execute(AddBindingParams::new(name))
            .await
            .with_context(|| format!("Failed to add binding {}", name))?;
        Ok(())
    }

    /// Load and DOMContentLoaded events, merged in arrival order
    pub async fn load_events(&self) -> Result<mpsc::Receiver<PageSignal>> {
        let loads = self
            .inner
            .event_listener::<EventLoadEventFired>()
            .await?
            .map(|_| PageSignal::Load);
        let dom_ready = self
            .inner
            .event_listener::<EventDomContentEventFired>()
            .await?
            .map(|_| PageSignal::DomContentLoaded);

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let mut merged = Box::pin(futures::stream::select(loads, dom_ready));
        tokio::spawn(async move {
            while let Some(signal) = merged.next().await {
                if tx.send(signal).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }

    /// Capture messages sent through the capture binding
    pub async fn binding_events(&self) -> Result<mpsc::Receiver<CaptureMessage>> {
        self.expose_binding(CAPTURE_BINDING).await?;
        let mut events = self.inner.event_listener::<EventBindingCalled>().await?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.name != CAPTURE_BINDING {
                    continue;
                }
                match CaptureMessage::parse(&event.payload) {
                    Ok(message) => {
                        if tx.send(message).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Dropping capture message: {}", e),
                }
            }
        });
        Ok(rx)
    }

    /// Every request the page is about to send
    pub async fn request_events(&self) -> Result<mpsc::Receiver<ObservedRequest>> {
        self.inner
            .execute(network::EnableParams::default())
            .await
            .context("Failed to enable network events")?;
        let mut events = self.inner.event_listener::<EventRequestWillBeSent>().await?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let Some(request) = observed_request(&event) else {
                    continue;
                };
                if tx.send(request).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }

    async fn ready_state_complete(&self) -> bool {
        self.inner
            .evaluate("document.readyState === 'complete'")
            .await
            .ok()
            .and_then(|result| result.value().and_then(Value::as_bool))
            .unwrap_or(false)
    }

    /// Poll `document.readyState` until complete or `timeout` passes
    async fn wait_ready(&self, timeout: Duration) {
        let polls = (timeout.as_millis() / 100).max(1);
        for _ in 0..polls {
            if self.ready_state_complete().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        debug!("Page not complete after {:?}", timeout);
    }

    async fn center_of(&self, selector: &str) -> Result<(f64, f64)> {
        let element = self
            .inner
            .find_element(selector)
            .await
            .with_context(|| format!("Element not found: {}", selector))?;
        element.scroll_into_view().await?;
        let point = element
            .clickable_point()
            .await
            .with_context(|| format!("Element is not visible: {}", selector))?;
        Ok((point.x, point.y))
    }

    async fn mouse(
        &self,
        kind: DispatchMouseEventType,
        x: f64,
        y: f64,
        button: CdpMouseButton,
    ) -> Result<()> {
        let mut params = DispatchMouseEventParams::builder().r#type(kind.clone()).x(x).y(y);
        if kind != DispatchMouseEventType::MouseMoved {
            params = params.button(button).click_count(1);
        }
        self.inner
            .execute(params.build().map_err(anyhow::Error::msg)?)
            .await?;
        Ok(())
    }

    async fn key(&self, kind: DispatchKeyEventType, key: &str, text: Option<&str>) -> Result<()> {
        let mut params = DispatchKeyEventParams::builder().r#type(kind).key(key.to_string());
        if let Some(text) = text {
            params = params.text(text.to_string());
        }
        self.inner
            .execute(params.build().map_err(anyhow::Error::msg)?)
            .await?;
        Ok(())
    }
}

/// Pull the fields capture needs out of a CDP request event
fn observed_request(event: &EventRequestWillBeSent) -> Option<ObservedRequest> {
    let request = serde_json::to_value(&event.request).ok()?;
    let url = request.get("url")?.as_str()?.to_string();
    let method = request.get("method")?.as_str()?.to_string();
    let headers = request
        .get("headers")
        .and_then(Value::as_object)
        .map(|headers| {
            headers
                .iter()
                .map(|(k, v)| {
                    let value = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                    (k.clone(), value)
                })
                .collect()
        })
        .unwrap_or_default();
    let post_data = request
        .get("postData")
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(ObservedRequest {
        url,
        method,
        headers,
        post_data,
    })
}

/// Text a key produces when typed, for keys that produce any
fn key_text(key: &str) -> Option<&str> {
    match key {
        "Enter" => Some("\r"),
        "Tab" => Some("\t"),
        k if k.chars().count() == 1 => Some(k),
        _ => None,
    }
}

#[async_trait]
impl BrowserDriver for Page {
    async fn goto(&self, url: &str) -> Result<()> {
        info!("Navigating to {}", url);
        self.inner
            .goto(url)
            .await
            .with_context(|| format!("Failed to navigate browser to {}", url))?;
        self.wait_ready(self.navigation_timeout).await;
        Ok(())
    }

    async fn click(&self, selector: &str, button: MouseButton) -> Result<()> {
        let (x, y) = self.center_of(selector).await?;
        let button = match button {
            MouseButton::Primary => CdpMouseButton::Left,
            MouseButton::Secondary => CdpMouseButton::Right,
        };
        self.mouse(DispatchMouseEventType::MouseMoved, x, y, button.clone())
            .await?;
        self.mouse(DispatchMouseEventType::MousePressed, x, y, button.clone())
            .await?;
        self.mouse(DispatchMouseEventType::MouseReleased, x, y, button)
            .await
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        let element = self
            .inner
            .find_element(selector)
            .await
            .with_context(|| format!("Element not found: {}", selector))?;
        element.focus().await?;
        // Recorded values are the whole field content, not a delta
        self.evaluate(&format!(
            "(() => {{ const el = document.querySelector({}); if (el) el.value = ''; }})()",
            serde_json::to_string(selector)?
        ))
        .await?;
        element.type_str(text).await?;
        Ok(())
    }

    async fn hover(&self, selector: &str) -> Result<()> {
        let (x, y) = self.center_of(selector).await?;
        self.mouse(DispatchMouseEventType::MouseMoved, x, y, CdpMouseButton::None)
            .await
    }

    async fn press_key(&self, key: &str) -> Result<()> {
        self.key(DispatchKeyEventType::KeyDown, key, key_text(key)).await?;
        self.key(DispatchKeyEventType::KeyUp, key, None).await
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        let result = self
            .inner
            .evaluate(script)
            .await
            .context("Script evaluation failed")?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn settle(&self) -> Result<()> {
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.wait_ready(Duration::from_secs(2)).await;
        Ok(())
    }
}

#[async_trait]
impl ListenerHost for Page {
    async fn install_runtime(&self) -> Result<()> {
        self.evaluate(PAGE_SCRIPT).await?;
        Ok(())
    }

    async fn attach(&self, kind: ListenerKind, handle: ListenerHandle) -> Result<()> {
        self.evaluate(&kind.attach_script(handle)).await?;
        Ok(())
    }

    async fn detach(&self, kind: ListenerKind, handle: ListenerHandle) -> Result<()> {
        self.evaluate(&kind.detach_script(handle)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_text() {
        assert_eq!(key_text("Enter"), Some("\r"));
        assert_eq!(key_text("a"), Some("a"));
        assert_eq!(key_text("ArrowDown"), None);
    }
}

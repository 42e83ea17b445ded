use anyhow::Result;
use async_trait::async_trait;

use crate::types::MouseButton;

/// Page-level browser commands used by replay
///
/// Every method targets the first element matching a CSS selector on the
/// current page and completes only once the browser acknowledged it.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Navigate the page and wait for it to load
    async fn goto(&self, url: &str) -> Result<()>;

    /// Click an element with the given button
    async fn click(&self, selector: &str, button: MouseButton) -> Result<()>;

    /// Focus an element and type text into it key by key
    async fn type_text(&self, selector: &str, text: &str) -> Result<()>;

    /// Move the pointer onto an element
    async fn hover(&self, selector: &str) -> Result<()>;

    /// Press and release a single key on the focused element
    async fn press_key(&self, key: &str) -> Result<()>;

    /// Evaluate a JavaScript expression in the page
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Wait until the page is done reacting to the previous command
    async fn settle(&self) -> Result<()> {
        Ok(())
    }
}

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a recorded user interaction
///
/// Unknown names read back from disk are kept in `Unsupported` so replay can
/// report them and move on instead of rejecting the whole log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    Click,
    Type,
    FileUpload,
    Hover,
    RightClick,
    KeyDown,
    PageRefresh,
    Unsupported(String),
}

impl ActionKind {
    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::Click => "click",
            ActionKind::Type => "type",
            ActionKind::FileUpload => "fileUpload",
            ActionKind::Hover => "hover",
            ActionKind::RightClick => "rightClick",
            ActionKind::KeyDown => "keyDown",
            ActionKind::PageRefresh => "pageRefresh",
            ActionKind::Unsupported(name) => name,
        }
    }
}

impl From<String> for ActionKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "click" => ActionKind::Click,
            "type" => ActionKind::Type,
            "fileUpload" => ActionKind::FileUpload,
            "hover" => ActionKind::Hover,
            "rightClick" => ActionKind::RightClick,
            "keyDown" => ActionKind::KeyDown,
            "pageRefresh" => ActionKind::PageRefresh,
            _ => ActionKind::Unsupported(name),
        }
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded user action with enough information to replay it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStep {
    /// What the user did
    pub action: ActionKind,
    /// Selector of the element acted on (the page URL for `pageRefresh`)
    pub target: String,
    /// Typed text or pressed key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl TestStep {
    pub fn new(action: ActionKind, target: impl Into<String>, value: Option<String>) -> Self {
        TestStep {
            action,
            target: target.into(),
            value,
        }
    }
}

/// Mouse button used for simulated clicks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Secondary,
}

/// Output format for CLI results
#[derive(Clone, Copy, Debug, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON format for programmatic consumption
    Json,
    /// Human-readable simple format
    Simple,
}

/// Browser viewport dimensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportSize {
    /// Viewport width in pixels
    pub width: u32,
    /// Viewport height in pixels
    pub height: u32,
}

impl ViewportSize {
    /// Parse viewport size from "WIDTHxHEIGHT" format (e.g., "1920x1080")
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('x').collect();
        if parts.len() != 2 {
            anyhow::bail!("Invalid viewport format. Use WIDTHxHEIGHT (e.g., 1920x1080)");
        }

        let width = parts[0]
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("Invalid width in viewport size"))?;
        let height = parts[1]
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("Invalid height in viewport size"))?;

        Ok(ViewportSize { width, height })
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

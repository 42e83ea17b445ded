//! Passive network capture: filters outgoing requests and logs them as curl
//! commands.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::{Result, WebtrailError};
use crate::store::Store;

/// URL fragments that are almost never API calls
pub const DEFAULT_SKIP_KEYWORDS: &str = "dist,assets,embed,Icons,static,auth,constants,locales,dcp-oauth,interaction,.js,.css,.ttf,.pdf,.png,.svg,.jpg,.ico,data:,www.google,analytics.,px.ads,googleads,/t.co";

pub const DEFAULT_METHODS: &str = "POST,PUT,DELETE,GET";

/// Split a comma separated option, dropping empty entries
pub fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Which requests get logged
#[derive(Debug, Clone)]
pub struct RequestFilter {
    pub skip_keywords: Vec<String>,
    /// When non-empty, a URL must contain one of these
    pub include_keywords: Vec<String>,
    /// Upper-case HTTP methods to keep
    pub methods: Vec<String>,
    /// Log every matching request instead of each URL once
    pub collect_all: bool,
}

impl Default for RequestFilter {
    fn default() -> Self {
        RequestFilter {
            skip_keywords: split_list(DEFAULT_SKIP_KEYWORDS),
            include_keywords: Vec::new(),
            methods: split_list(DEFAULT_METHODS),
            collect_all: true,
        }
    }
}

impl RequestFilter {
    /// Whether a request is ignored regardless of what was seen before
    pub fn skips(&self, request: &ObservedRequest) -> bool {
        let url = request.url.as_str();
        if self.skip_keywords.iter().any(|k| url.contains(k.as_str())) {
            return true;
        }
        if !self
            .methods
            .iter()
            .any(|m| m.eq_ignore_ascii_case(&request.method))
        {
            return true;
        }
        !self.include_keywords.is_empty()
            && !self.include_keywords.iter().any(|k| url.contains(k.as_str()))
    }
}

/// Outgoing request as seen by the browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedRequest {
    pub url: String,
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub post_data: Option<String>,
}

/// Quote a value for a POSIX shell
///
/// Values with control characters use `$'...'` so the command stays on one
/// line.
pub fn shell_quote(value: &str) -> String {
    if !value.chars().any(char::is_control) {
        return format!("'{}'", value.replace('\'', r"'\''"));
    }

    let mut quoted = String::from("$'");
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str(r"\\"),
            '\'' => quoted.push_str(r"\'"),
            '\n' => quoted.push_str(r"\n"),
            '\r' => quoted.push_str(r"\r"),
            '\t' => quoted.push_str(r"\t"),
            c if c.is_control() && c.is_ascii() => {
                quoted.push_str(&format!("\\x{:02x}", c as u32));
            }
            c if c.is_control() => quoted.push_str(&format!("\\u{:04x}", c as u32)),
            c => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

impl ObservedRequest {
    /// Render as a one-line curl command
    ///
    /// The body is only written for POST and PUT requests that carry one.
    pub fn to_curl(&self) -> String {
        let mut curl = format!("curl {}", shell_quote(&self.url));
        for (name, value) in &self.headers {
            curl.push_str(" -H ");
            curl.push_str(&shell_quote(&format!("{}: {}", name, value)));
        }

        let sends_body = matches!(self.method.to_ascii_uppercase().as_str(), "POST" | "PUT");
        if sends_body && let Some(body) = &self.post_data {
            curl.push_str(" --data ");
            curl.push_str(&shell_quote(body));
        }
        curl
    }
}

/// Store keys used by a capture run
#[derive(Debug, Clone)]
pub struct CaptureFiles {
    pub curl_commands: String,
    pub urls: String,
}

/// Captured state: the unique URL set and every curl line written
pub struct NetworkCapture {
    filter: RequestFilter,
    store: Arc<dyn Store>,
    files: CaptureFiles,
    unique_urls: Vec<String>,
    seen: HashSet<String>,
    curl_commands: Vec<String>,
}

impl NetworkCapture {
    pub fn new(filter: RequestFilter, store: Arc<dyn Store>, files: CaptureFiles) -> Self {
        NetworkCapture {
            filter,
            store,
            files,
            unique_urls: Vec::new(),
            seen: HashSet::new(),
            curl_commands: Vec::new(),
        }
    }

    pub fn unique_urls(&self) -> &[String] {
        &self.unique_urls
    }

    pub fn curl_commands(&self) -> &[String] {
        &self.curl_commands
    }

    /// Empty both stores for a fresh run
    pub fn reset(&mut self) -> Result<()> {
        self.store.write(&self.files.curl_commands, "")?;
        self.store.write(&self.files.urls, "[]")?;
        self.unique_urls.clear();
        self.seen.clear();
        self.curl_commands.clear();
        Ok(())
    }

    /// Load URLs and curl lines left by an earlier run
    pub fn restore(&mut self) -> Result<()> {
        if let Some(json) = self.store.read(&self.files.urls)? {
            let urls: Vec<String> = serde_json::from_str(&json)
                .map_err(|e| WebtrailError::serialization(self.store.locate(&self.files.urls), e))?;
            for url in urls {
                self.remember(url);
            }
            info!(
                "Loaded {} URLs from {}",
                self.unique_urls.len(),
                self.store.locate(&self.files.urls)
            );
        }

        if let Some(text) = self.store.read(&self.files.curl_commands)? {
            self.curl_commands = text
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string)
                .collect();
            info!(
                "Loaded {} curl commands from {}",
                self.curl_commands.len(),
                self.store.locate(&self.files.curl_commands)
            );
        }
        Ok(())
    }

    fn remember(&mut self, url: String) -> bool {
        if self.seen.insert(url.clone()) {
            self.unique_urls.push(url);
            true
        } else {
            false
        }
    }

    /// Log a request when it passes the filter
    ///
    /// Returns the curl line written, if any.
    pub fn observe(&mut self, request: &ObservedRequest) -> Result<Option<String>> {
        if self.filter.skips(request) {
            return Ok(None);
        }

        let fresh = self.remember(request.url.clone());
        if !fresh && !self.filter.collect_all {
            debug!("Already captured {}", request.url);
            return Ok(None);
        }

        let curl = request.to_curl();
        self.store
            .append(&self.files.curl_commands, &format!("{}\n", curl))?;
        debug!("Captured {} {}", request.method, request.url);
        self.curl_commands.push(curl.clone());
        Ok(Some(curl))
    }

    /// Write the unique URL set
    pub fn flush_urls(&self) -> Result<()> {
        let json = serde_json::to_string(&self.unique_urls)
            .map_err(|e| WebtrailError::serialization("unique urls", e))?;
        self.store.write(&self.files.urls, &json)?;
        info!(
            "Saved {} unique URLs to {}",
            self.unique_urls.len(),
            self.store.locate(&self.files.urls)
        );
        Ok(())
    }

    /// Consume requests until shutdown, flushing the URL set every `interval`
    ///
    /// Flushes are best effort; a final flush always runs before returning.
    pub async fn run<F>(
        &mut self,
        mut requests: mpsc::Receiver<ObservedRequest>,
        interval: Duration,
        shutdown: F,
    ) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Capture stopped");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.flush_urls() {
                        warn!("Periodic URL flush failed: {}", e);
                    }
                }
                request = requests.recv() => match request {
                    Some(request) => {
                        self.observe(&request)?;
                    }
                    None => break,
                },
            }
        }

        self.flush_urls()
    }
}

#[cfg(test)]
#[path = "capture_test.rs"]
mod capture_test;

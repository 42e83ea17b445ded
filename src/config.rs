//! Run configuration: file locations and browser launch options

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::{self, CaptureFiles, RequestFilter};
use crate::openapi::ServerMode;
use crate::postman::PostmanFiles;
use crate::types::ViewportSize;

pub const TEST_STEPS_FILE: &str = "test_steps.json";
pub const CURL_COMMANDS_FILE: &str = "curl_commands.txt";
pub const URLS_FILE: &str = "urls.json";
pub const CURL_JSON_FILE: &str = "curl-to-json.json";
pub const SWAGGER_FILE: &str = "swagger.json";
pub const POSTMAN_COLLECTION_FILE: &str = "postman_collection.json";
pub const POSTMAN_ENVIRONMENT_FILE: &str = "postman_environment.json";

/// Directory every artifact of a run is read from and written to
#[derive(Debug, Clone)]
pub struct RunPaths {
    dir: PathBuf,
}

impl RunPaths {
    /// Paths under `dir`, the current directory when `None`
    pub fn new(dir: Option<PathBuf>) -> Result<Self> {
        let dir = match dir {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };
        Ok(RunPaths { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn capture_files() -> CaptureFiles {
        CaptureFiles {
            curl_commands: CURL_COMMANDS_FILE.to_string(),
            urls: URLS_FILE.to_string(),
        }
    }

    pub fn postman_files() -> PostmanFiles {
        PostmanFiles {
            collection: POSTMAN_COLLECTION_FILE.to_string(),
            environment: POSTMAN_ENVIRONMENT_FILE.to_string(),
        }
    }
}

/// Where artifacts go
#[derive(Args, Debug, Clone)]
pub struct DirectoryArgs {
    /// Directory to read and save files (defaults to the current directory)
    #[arg(short, long)]
    pub directory: Option<PathBuf>,
}

impl DirectoryArgs {
    pub fn paths(&self) -> Result<RunPaths> {
        RunPaths::new(self.directory.clone())
    }
}

/// Browser options shared by every command that opens a page
#[derive(Args, Debug, Clone)]
pub struct BrowserArgs {
    /// Run browser in visible mode (disables headless)
    #[arg(long = "no-headless")]
    pub no_headless: bool,

    /// Set viewport size (WIDTHxHEIGHT, e.g., 1920x1080)
    #[arg(long)]
    pub viewport: Option<String>,

    /// Path to the Chrome or Chromium executable
    #[arg(long)]
    pub chrome: Option<PathBuf>,

    /// Profile to use (temporary if not specified)
    #[arg(short, long)]
    pub profile: Option<String>,
}

/// Resolved browser launch options
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub headless: bool,
    pub viewport: Option<ViewportSize>,
    pub executable: Option<PathBuf>,
    /// Persistent user-data directory, a temporary one when `None`
    pub user_data_dir: Option<PathBuf>,
    /// How long to wait for a navigation to finish
    pub navigation_timeout: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        BrowserConfig {
            headless: true,
            viewport: None,
            executable: None,
            user_data_dir: None,
            navigation_timeout: Duration::from_secs(30),
        }
    }
}

impl BrowserArgs {
    /// Resolve flags into a launch config, looking up the profile if named
    pub fn to_config(&self) -> Result<BrowserConfig> {
        let viewport = self.viewport.as_deref().map(ViewportSize::parse).transpose()?;
        let user_data_dir = match &self.profile {
            Some(name) => Some(crate::profile::ProfileManager::new()?.user_data_dir(name)?),
            None => None,
        };

        Ok(BrowserConfig {
            headless: !self.no_headless,
            viewport,
            executable: self.chrome.clone(),
            user_data_dir,
            ..BrowserConfig::default()
        })
    }
}

/// Request filter and flush options for `capture`
#[derive(Args, Debug, Clone)]
pub struct CaptureArgs {
    /// Comma separated keywords; URLs containing any are skipped
    #[arg(long = "skip-keywords", default_value = capture::DEFAULT_SKIP_KEYWORDS)]
    pub skip_keywords: String,

    /// Comma separated keywords; when set, URLs must contain one
    #[arg(long = "include-keywords", default_value = "")]
    pub include_keywords: String,

    /// Comma separated HTTP methods to capture
    #[arg(short, long, default_value = capture::DEFAULT_METHODS)]
    pub methods: String,

    /// Log every matching request instead of each URL once
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub all: bool,

    /// Seconds between saves of the unique URL list
    #[arg(short, long, default_value = "15")]
    pub interval: u64,

    /// Continue from urls.json and curl_commands.txt of an earlier run
    #[arg(short, long)]
    pub restore: bool,
}

impl CaptureArgs {
    pub fn filter(&self) -> RequestFilter {
        RequestFilter {
            skip_keywords: capture::split_list(&self.skip_keywords),
            include_keywords: capture::split_list(&self.include_keywords),
            methods: capture::split_list(&self.methods)
                .into_iter()
                .map(|m| m.to_uppercase())
                .collect(),
            collect_all: self.all,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval.max(1))
    }
}

/// `servers` options for `openapi`
#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Base URL to list under `servers` (repeatable); overrides detection
    #[arg(long = "server")]
    pub servers: Vec<String>,

    /// List only the first detected origin
    #[arg(long, conflicts_with = "servers")]
    pub single_server: bool,
}

impl ServerArgs {
    pub fn mode(&self) -> ServerMode {
        if !self.servers.is_empty() {
            ServerMode::Explicit(self.servers.clone())
        } else if self.single_server {
            ServerMode::Single
        } else {
            ServerMode::PerOrigin
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        browser: BrowserArgs,
        #[command(flatten)]
        capture: CaptureArgs,
        #[command(flatten)]
        servers: ServerArgs,
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::parse_from(["webtrail"]);
        let config = cli.browser.to_config().unwrap();
        assert!(config.headless);
        assert!(config.viewport.is_none());
        assert!(config.user_data_dir.is_none());

        let filter = cli.capture.filter();
        assert!(filter.collect_all);
        assert_eq!(filter.methods, vec!["POST", "PUT", "DELETE", "GET"]);
        assert!(filter.skip_keywords.contains(&".js".to_string()));
        assert!(filter.include_keywords.is_empty());
        assert_eq!(cli.capture.interval(), Duration::from_secs(15));
        assert_eq!(cli.servers.mode(), ServerMode::PerOrigin);
    }

    #[test]
    fn test_flags() {
        let cli = TestCli::parse_from([
            "webtrail",
            "--no-headless",
            "--viewport",
            "1280x720",
            "--methods",
            "get,post",
            "--all",
            "false",
            "--include-keywords",
            "/api/",
            "--server",
            "https://api.test",
        ]);
        let config = cli.browser.to_config().unwrap();
        assert!(!config.headless);
        assert_eq!(
            config.viewport,
            Some(ViewportSize {
                width: 1280,
                height: 720
            })
        );

        let filter = cli.capture.filter();
        assert!(!filter.collect_all);
        assert_eq!(filter.methods, vec!["GET", "POST"]);
        assert_eq!(filter.include_keywords, vec!["/api/"]);
        assert_eq!(
            cli.servers.mode(),
            ServerMode::Explicit(vec!["https://api.test".into()])
        );
    }

    #[test]
    fn test_bad_viewport() {
        let cli = TestCli::parse_from(["webtrail", "--viewport", "wide"]);
        assert!(cli.browser.to_config().is_err());
    }

    #[test]
    fn test_run_paths() {
        let paths = RunPaths::new(Some(PathBuf::from("/tmp/run"))).unwrap();
        assert_eq!(paths.file(TEST_STEPS_FILE), PathBuf::from("/tmp/run/test_steps.json"));
    }
}

//! # webtrail
#![allow(clippy::uninlined_format_args)]
//!
//! Record and replay browser interactions, capture the API traffic a page
//! makes as curl commands, and turn that traffic into OpenAPI and Postman
//! documents.
//!
//! Chromium is driven over the DevTools protocol. Every artifact is a plain
//! file in the run directory, so each step of the pipeline can be rerun or
//! edited by hand.
//!
//! ## Installation
//!
//! ```bash
//! cargo install webtrail
//! ```
//!
//! ## CLI Usage
//!
//! ### Recording and replaying interactions
//!
//! ```bash
//! # Open a visible browser and record clicks, typing and key presses
//! # to ./test_steps.json until Ctrl-C
//! webtrail record "https://example.com" --no-headless
//!
//! # Also record hovers
//! webtrail record "https://example.com" --no-headless --hover
//!
//! # Replay the recorded steps, JSON report on stdout
//! webtrail replay "https://example.com"
//! ```
//!
//! ### Capturing API traffic
//!
//! ```bash
//! # Log every non-asset request as a curl command to ./curl_commands.txt
//! webtrail capture "https://app.example.com" --no-headless
//!
//! # Only requests whose URL contains /api/, each URL once
//! webtrail capture "https://app.example.com" --include-keywords /api/ --all false
//!
//! # Continue an earlier capture
//! webtrail capture "https://app.example.com" --restore
//! ```
//!
//! ### Generating documentation
//!
//! ```bash
//! # curl_commands.txt -> curl-to-json.json
//! webtrail convert
//!
//! # ... -> swagger.json
//! webtrail openapi --server https://api.example.com
//!
//! # ... -> postman_collection.json and postman_environment.json
//! webtrail postman
//! ```
//!
//! ### Profiles
//!
//! ```bash
//! # Keep cookies between runs, e.g. to stay logged in
//! webtrail profile create shop
//! webtrail record "https://shop.example.com" --profile shop --no-headless
//! webtrail profile list
//! webtrail profile delete shop
//! ```
//!
//! ## Library Usage
//!
//! ```
//! use webtrail::dom::{Document, ElementSpec};
//! use webtrail::selector;
//!
//! let mut doc = Document::new("html");
//! let body = doc.append(doc.root(), ElementSpec::new("body"));
//! let list = doc.append(body, ElementSpec::new("ul"));
//! doc.append(list, ElementSpec::new("li"));
//! let second = doc.append(list, ElementSpec::new("li"));
//!
//! assert_eq!(
//!     selector::synthesize_string(&doc.element(second)),
//!     "html > body > ul > li:nth-of-type(2)"
//! );
//! ```

/// Chromium launch and the CDP-backed page
pub mod browser;

/// Passive request capture as curl commands
pub mod capture;

/// File names and CLI option groups
pub mod config;

/// One recording or replay per page
pub mod controller;

/// curl command parsing
pub mod curl;

/// In-memory documents and lineage snapshots
pub mod dom;

/// Browser commands used by replay
pub mod driver;

/// Error type and exit codes
pub mod errors;

/// In-page listeners and the table tracking them
pub mod listeners;

/// OpenAPI generation
pub mod openapi;

/// Postman generation
pub mod postman;

/// Persistent browser profiles
pub mod profile;

/// Turning captured interactions into test steps
pub mod recorder;

/// Replaying test steps
pub mod replay;

/// Selector synthesis
pub mod selector;

/// Text storage for run artifacts
pub mod store;

/// Shared data types
pub mod types;

pub use browser::{Browser, Page};
pub use config::BrowserConfig;
pub use controller::{Controller, ControllerMode};
pub use driver::BrowserDriver;
pub use errors::WebtrailError;
pub use profile::ProfileManager;
pub use recorder::RecordingSession;
pub use replay::{ReplayReport, Replayer};
pub use selector::{Selector, synthesize, synthesize_string};
pub use store::{FileStore, MemoryStore, Store};
pub use types::{ActionKind, OutputFormat, TestStep, ViewportSize};

use anyhow::Result;
use serde_json::json;
use tracing::info;

use crate::commands::utils;
use webtrail::capture::NetworkCapture;
use webtrail::config::{BrowserArgs, CURL_COMMANDS_FILE, CaptureArgs, DirectoryArgs, RunPaths};
use webtrail::store::Store;
use webtrail::{Browser, BrowserDriver};

pub async fn handle_capture(
    url: String,
    directory: DirectoryArgs,
    browser_args: BrowserArgs,
    capture_args: CaptureArgs,
) -> Result<()> {
    let paths = directory.paths()?;
    let store = utils::open_store(&paths)?;
    let config = browser_args.to_config()?;

    let mut capture = NetworkCapture::new(
        capture_args.filter(),
        store.clone(),
        RunPaths::capture_files(),
    );
    if capture_args.restore {
        capture.restore()?;
    } else {
        capture.reset()?;
    }

    let browser = Browser::launch(config).await?;
    let page = browser.new_page().await?;
    let requests = page.request_events().await?;

    let result = async {
        page.goto(&url).await?;
        info!("Capturing requests from {}. Press Ctrl-C to stop", url);
        capture
            .run(requests, capture_args.interval(), utils::shutdown_signal())
            .await?;
        anyhow::Ok(())
    }
    .await;

    browser.close().await?;
    result?;

    utils::print_json(&json!({
        "file": store.locate(CURL_COMMANDS_FILE),
        "curl_commands": capture.curl_commands().len(),
        "unique_urls": capture.unique_urls().len(),
    }))
}

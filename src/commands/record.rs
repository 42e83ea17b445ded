use anyhow::Result;
use serde_json::json;
use tracing::info;

use crate::commands::utils;
use webtrail::config::{BrowserArgs, DirectoryArgs, TEST_STEPS_FILE};
use webtrail::controller::{Controller, RecordingChannels};
use webtrail::listeners::ListenerTable;
use webtrail::store::Store;
use webtrail::{Browser, RecordingSession};

pub async fn handle_record(
    url: String,
    directory: DirectoryArgs,
    browser_args: BrowserArgs,
    hover: bool,
) -> Result<()> {
    let paths = directory.paths()?;
    let store = utils::open_store(&paths)?;
    let config = browser_args.to_config()?;

    info!("Recording {} into {}", url, paths.file(TEST_STEPS_FILE).display());

    let browser = Browser::launch(config).await?;
    let page = browser.new_page().await?;

    // Subscribe before navigating so the first load installs listeners
    let channels = RecordingChannels {
        signals: page.load_events().await?,
        captures: page.binding_events().await?,
    };

    let session = RecordingSession::new(store.clone(), TEST_STEPS_FILE);
    let result = Controller::new(page)
        .record(
            &url,
            channels,
            ListenerTable::new(hover),
            session,
            utils::shutdown_signal(),
        )
        .await;

    browser.close().await?;
    let session = result?;

    utils::print_json(&json!({
        "file": store.locate(TEST_STEPS_FILE),
        "steps": session.counter(),
    }))
}

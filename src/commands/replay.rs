use anyhow::Result;
use tracing::info;

use crate::commands::utils;
use webtrail::config::{BrowserArgs, DirectoryArgs, TEST_STEPS_FILE};
use webtrail::replay::StepOutcome;
use webtrail::types::OutputFormat;
use webtrail::{Browser, Controller};

pub async fn handle_replay(
    url: String,
    directory: DirectoryArgs,
    browser_args: BrowserArgs,
    format: OutputFormat,
) -> Result<()> {
    let paths = directory.paths()?;
    let store = utils::open_store(&paths)?;
    let config = browser_args.to_config()?;

    info!("Replaying {} on {}", paths.file(TEST_STEPS_FILE).display(), url);

    let browser = Browser::launch(config).await?;
    let page = browser.new_page().await?;
    let result = Controller::new(page)
        .replay(&url, store.as_ref(), TEST_STEPS_FILE)
        .await;
    browser.close().await?;
    let report = result?;

    match format {
        OutputFormat::Json => utils::print_json(&report)?,
        OutputFormat::Simple => {
            if report.log_missing {
                println!("No recorded steps at {}", paths.file(TEST_STEPS_FILE).display());
                return Ok(());
            }
            for step in &report.steps {
                let status = match &step.outcome {
                    StepOutcome::Dispatched => "ok".to_string(),
                    StepOutcome::Settled => "settled".to_string(),
                    StepOutcome::Unsupported => "skipped (unsupported)".to_string(),
                    StepOutcome::Failed { reason } => format!("failed: {}", reason),
                };
                println!("{:>3}. {:<12} {:<50} {}", step.index + 1, step.action.as_str(), step.target, status);
            }
            println!(
                "\n{} dispatched, {} unsupported, {} failed",
                report.dispatched(),
                report.unsupported(),
                report.failed()
            );
        }
    }
    Ok(())
}

#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use crate::commands::profile::ProfileCommands;
use webtrail::config::{BrowserArgs, CaptureArgs, DirectoryArgs, ServerArgs};
use webtrail::errors::WebtrailError;
use webtrail::types::OutputFormat;

const EXIT_SUCCESS: i32 = 0;

#[derive(Parser)]
#[command(name = "webtrail")]
#[command(
    about = "Record and replay browser interactions, capture API calls as curl and generate OpenAPI/Postman docs",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record interactions on a page to test_steps.json
    Record {
        /// URL to open
        url: String,

        /// Also record hovers (noisy on most pages)
        #[arg(long)]
        hover: bool,

        #[command(flatten)]
        directory: DirectoryArgs,

        #[command(flatten)]
        browser: BrowserArgs,
    },

    /// Replay test_steps.json against a page
    Replay {
        /// URL to open before replaying
        url: String,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,

        #[command(flatten)]
        directory: DirectoryArgs,

        #[command(flatten)]
        browser: BrowserArgs,
    },

    /// Capture requests made by a page as curl commands
    Capture {
        /// URL to open
        url: String,

        #[command(flatten)]
        directory: DirectoryArgs,

        #[command(flatten)]
        browser: BrowserArgs,

        #[command(flatten)]
        capture: CaptureArgs,
    },

    /// Convert curl_commands.txt to curl-to-json.json
    Convert {
        #[command(flatten)]
        directory: DirectoryArgs,
    },

    /// Convert captured curl commands and generate swagger.json
    Openapi {
        #[command(flatten)]
        directory: DirectoryArgs,

        #[command(flatten)]
        servers: ServerArgs,
    },

    /// Convert captured curl commands and generate a Postman collection and environment
    Postman {
        #[command(flatten)]
        directory: DirectoryArgs,

        /// Collection name
        #[arg(long, default_value = "Generated Postman Collection")]
        name: String,
    },

    /// Manage browser profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

#[tokio::main]
async fn main() {
    let result = run().await;

    match result {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(err) => {
            let webtrail_err = WebtrailError::from_anyhow(err);

            // Output JSON error to stdout for programmatic consumption
            let error_json = json!({
                "error": true,
                "message": webtrail_err.to_string(),
                "exit_code": webtrail_err.exit_code()
            });
            println!(
                "{}",
                serde_json::to_string(&error_json).unwrap_or_else(|_| "{}".to_string())
            );

            // Also log to stderr for human reading
            eprintln!("Error: {}", webtrail_err);
            std::process::exit(webtrail_err.exit_code());
        }
    }
}

async fn run() -> Result<()> {
    // Logs go to stderr so JSON output on stdout stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webtrail=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Record {
            url,
            hover,
            directory,
            browser,
        } => commands::record::handle_record(url, directory, browser, hover).await,
        Commands::Replay {
            url,
            format,
            directory,
            browser,
        } => commands::replay::handle_replay(url, directory, browser, format).await,
        Commands::Capture {
            url,
            directory,
            browser,
            capture,
        } => commands::capture::handle_capture(url, directory, browser, capture).await,
        Commands::Convert { directory } => commands::convert::handle_convert(directory),
        Commands::Openapi { directory, servers } => {
            commands::convert::handle_openapi(directory, servers)
        }
        Commands::Postman { directory, name } => commands::convert::handle_postman(directory, name),
        Commands::Profile { command } => commands::profile::handle_profile(command),
    }
}

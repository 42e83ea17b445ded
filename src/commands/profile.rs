use anyhow::Result;
use clap::Subcommand;
use tracing::info;

use webtrail::ProfileManager;
use webtrail::types::OutputFormat;

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Create a new profile
    Create {
        /// Profile name
        name: String,
    },

    /// Delete a profile and its browser data
    Delete {
        /// Profile name
        name: String,
    },

    /// List all profiles
    List {
        /// Output format
        #[arg(short, long, default_value = "simple")]
        format: OutputFormat,
    },
}

pub fn handle_profile(command: ProfileCommands) -> Result<()> {
    let manager = ProfileManager::new()?;

    match command {
        ProfileCommands::Create { name } => {
            info!("Creating profile: {}", name);
            manager.create_profile(&name)?;
            println!("✓ Profile '{}' created successfully", name);
            Ok(())
        }

        ProfileCommands::Delete { name } => {
            info!("Deleting profile: {}", name);
            manager.delete_profile(&name)?;
            println!("✓ Profile '{}' deleted", name);
            Ok(())
        }

        ProfileCommands::List { format } => {
            let profiles = manager.list_profiles()?;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&profiles)?);
                }
                OutputFormat::Simple => {
                    if profiles.is_empty() {
                        println!("No profiles found");
                        return Ok(());
                    }
                    println!("{:<24} {:<20} {:<20}", "Name", "Created", "Last Used");
                    println!("{}", "-".repeat(64));
                    for profile in profiles {
                        println!(
                            "{:<24} {:<20} {:<20}",
                            profile.name,
                            profile.created_at.format("%Y-%m-%d %H:%M").to_string(),
                            profile.last_used.format("%Y-%m-%d %H:%M").to_string()
                        );
                    }
                }
            }
            Ok(())
        }
    }
}

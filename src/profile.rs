//! Named Chromium user-data directories kept between runs

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const METADATA_FILE: &str = "metadata.json";
const USER_DATA_DIR: &str = "user-data";

/// Metadata about a browser profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileMetadata {
    /// Profile name
    pub name: String,
    /// When the profile was created
    pub created_at: DateTime<Utc>,
    /// When a run last used the profile
    pub last_used: DateTime<Utc>,
}

/// Manages browser profiles under one root directory
pub struct ProfileManager {
    profiles_dir: PathBuf,
}

fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid {
        anyhow::bail!(
            "Invalid profile name '{}': use letters, digits, '-', '_' or '.'",
            name
        );
    }
    Ok(())
}

impl ProfileManager {
    /// Manager for `~/.webtrail/profiles`
    pub fn new() -> Result<Self> {
        let home_dir = dirs::home_dir().context("Unable to determine home directory")?;
        Self::with_root(home_dir.join(".webtrail").join("profiles"))
    }

    pub fn with_root(profiles_dir: impl Into<PathBuf>) -> Result<Self> {
        let profiles_dir = profiles_dir.into();
        fs::create_dir_all(&profiles_dir).with_context(|| {
            format!(
                "Failed to create profiles directory {}",
                profiles_dir.display()
            )
        })?;
        Ok(ProfileManager { profiles_dir })
    }

    pub fn root(&self) -> &Path {
        &self.profiles_dir
    }

    fn write_metadata(path: &Path, metadata: &ProfileMetadata) -> Result<()> {
        let json = serde_json::to_string_pretty(metadata)?;
        fs::write(path.join(METADATA_FILE), json)?;
        Ok(())
    }

    fn read_metadata(path: &Path) -> Result<ProfileMetadata> {
        let json = fs::read_to_string(path.join(METADATA_FILE))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Corrupt profile metadata in {}", path.display()))
    }

    pub fn create_profile(&self, name: &str) -> Result<ProfileMetadata> {
        validate_name(name)?;
        let profile_path = self.profiles_dir.join(name);

        if profile_path.exists() {
            anyhow::bail!("Profile '{}' already exists", name);
        }

        fs::create_dir_all(profile_path.join(USER_DATA_DIR))?;

        let now = Utc::now();
        let metadata = ProfileMetadata {
            name: name.to_string(),
            created_at: now,
            last_used: now,
        };
        Self::write_metadata(&profile_path, &metadata)?;

        info!("Created profile '{}'", name);
        Ok(metadata)
    }

    pub fn delete_profile(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        let profile_path = self.profiles_dir.join(name);

        if !profile_path.exists() {
            anyhow::bail!("Profile '{}' does not exist", name);
        }

        fs::remove_dir_all(&profile_path)?;
        info!("Deleted profile '{}'", name);
        Ok(())
    }

    /// All profiles, most recently used first
    pub fn list_profiles(&self) -> Result<Vec<ProfileMetadata>> {
        let mut profiles = Vec::new();

        for entry in fs::read_dir(&self.profiles_dir)? {
            let path = entry?.path();
            if path.is_dir() && path.join(METADATA_FILE).exists() {
                match Self::read_metadata(&path) {
                    Ok(metadata) => profiles.push(metadata),
                    Err(e) => debug!("Skipping profile at {}: {:#}", path.display(), e),
                }
            }
        }

        profiles.sort_by(|a, b| b.last_used.cmp(&a.last_used));
        Ok(profiles)
    }

    /// User-data directory of a profile, touching its last-used time
    pub fn user_data_dir(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        let profile_path = self.profiles_dir.join(name);

        if !profile_path.exists() {
            anyhow::bail!(
                "Profile '{}' does not exist. Create it with: webtrail profile create {}",
                name,
                name
            );
        }

        let mut metadata = Self::read_metadata(&profile_path)?;
        metadata.last_used = Utc::now();
        Self::write_metadata(&profile_path, &metadata)?;

        let user_data = profile_path.join(USER_DATA_DIR);
        fs::create_dir_all(&user_data)?;
        Ok(user_data)
    }
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod profile_test;

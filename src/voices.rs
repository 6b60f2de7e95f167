use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::VoicesConfig;

/// Directory of pre-recorded voice notes.
///
/// Nothing is cached: every lookup goes back to the filesystem so files can be
/// dropped in or removed while the bot is running.
#[derive(Debug, Clone)]
pub struct VoiceLibrary {
    directory: PathBuf,
    extension: String,
    designated: String,
}

/// Result of scanning the voice directory
#[derive(Debug, Clone, PartialEq)]
pub enum Listing {
    /// The directory does not exist
    Missing,
    /// Matching files, sorted by name
    Files(Vec<PathBuf>),
}

impl VoiceLibrary {
    pub fn new(
        directory: impl Into<PathBuf>,
        extension: impl Into<String>,
        designated: impl Into<String>,
    ) -> Self {
        let extension = extension.into();
        Self {
            directory: directory.into(),
            extension: extension.trim_start_matches('.').to_string(),
            designated: designated.into(),
        }
    }

    pub fn from_config(config: &VoicesConfig) -> Self {
        Self::new(
            config.directory.clone(),
            config.extension.clone(),
            config.designated_file.clone(),
        )
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn designated_name(&self) -> &str {
        &self.designated
    }

    /// Create the directory if it does not exist yet.
    /// Returns true when it had to be created.
    pub async fn ensure_directory(&self) -> Result<bool> {
        if tokio::fs::metadata(&self.directory).await.is_ok() {
            return Ok(false);
        }

        tokio::fs::create_dir_all(&self.directory)
            .await
            .with_context(|| {
                format!(
                    "Failed to create voices directory: {}",
                    self.directory.display()
                )
            })?;
        info!("Created {} directory", self.directory.display());
        info!(
            "Add your .{} voice files to the {} directory",
            self.extension,
            self.directory.display()
        );
        Ok(true)
    }

    /// Path of the designated voice, if it exists as a regular file.
    pub async fn designated(&self) -> Option<PathBuf> {
        let path = self.directory.join(&self.designated);
        is_present(&path).await.then_some(path)
    }

    /// List every file carrying the voice extension.
    pub async fn list(&self) -> Result<Listing> {
        if tokio::fs::metadata(&self.directory).await.is_err() {
            return Ok(Listing::Missing);
        }

        let mut entries = tokio::fs::read_dir(&self.directory).await.with_context(|| {
            format!(
                "Failed to read voices directory: {}",
                self.directory.display()
            )
        })?;

        let suffix = format!(".{}", self.extension);
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !name.ends_with(&suffix) {
                continue;
            }
            if !entry.file_type().await?.is_file() {
                continue;
            }
            files.push(entry.path());
        }

        files.sort();
        debug!(
            "Found {} voice file(s) in {}",
            files.len(),
            self.directory.display()
        );
        Ok(Listing::Files(files))
    }
}

/// True when `path` exists and is a regular file.
pub async fn is_present(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

/// Pick one file uniformly at random.
pub fn choose<'a, R: Rng + ?Sized>(files: &'a [PathBuf], rng: &mut R) -> Option<&'a PathBuf> {
    files.choose(rng)
}

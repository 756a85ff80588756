//! Backup directory manager for piholesync
//!
//! Lists downloaded teleporter archives by modification time and enforces the
//! retention count. Archive contents are never opened.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};

/// Metadata about one archive on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    /// Archive filename
    pub filename: String,
    /// Full path to the archive
    pub path: PathBuf,
    /// Last modification time
    pub modified: DateTime<Utc>,
    /// Size in bytes
    pub size_bytes: u64,
}

/// Manages the archives stored in one backup directory
#[derive(Debug, Clone)]
pub struct BackupManager {
    /// Path to backup directory
    backup_dir: PathBuf,
}

impl BackupManager {
    /// Create a new BackupManager for a directory
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
        }
    }

    /// Get backup directory path
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// List archives, oldest first
    ///
    /// Ties on modification time are ordered by filename. A missing directory
    /// is treated as empty; subdirectories are skipped.
    pub fn list_sorted_by_age(&self) -> SyncResult<Vec<BackupInfo>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();

        for entry in fs::read_dir(&self.backup_dir).map_err(|e| {
            SyncError::Io(format!(
                "Failed to read backup directory {}: {}",
                self.backup_dir.display(),
                e
            ))
        })? {
            let entry = entry
                .map_err(|e| SyncError::Io(format!("Failed to read directory entry: {}", e)))?;

            let metadata = entry.metadata().map_err(|e| {
                SyncError::Io(format!(
                    "Failed to read metadata for {}: {}",
                    entry.path().display(),
                    e
                ))
            })?;

            if !metadata.is_file() {
                continue;
            }

            let modified = metadata.modified().map_err(|e| {
                SyncError::Io(format!(
                    "Failed to read modification time for {}: {}",
                    entry.path().display(),
                    e
                ))
            })?;

            backups.push(BackupInfo {
                filename: entry.file_name().to_string_lossy().to_string(),
                path: entry.path(),
                modified: DateTime::<Utc>::from(modified),
                size_bytes: metadata.len(),
            });
        }

        backups.sort_by(|a, b| {
            a.modified
                .cmp(&b.modified)
                .then_with(|| a.filename.cmp(&b.filename))
        });

        Ok(backups)
    }

    /// Delete all but the newest `retention` archives
    ///
    /// Nothing is deleted when fewer than `retention` archives exist or when
    /// `retention` is zero. Returns the deleted paths, oldest first.
    pub fn prune(&self, retention: usize) -> SyncResult<Vec<PathBuf>> {
        let backups = self.list_sorted_by_age()?;
        if retention == 0 || backups.len() < retention {
            debug!(
                count = backups.len(),
                retention, "Nothing to prune in {}",
                self.backup_dir.display()
            );
            return Ok(Vec::new());
        }

        let excess = backups.len() - retention;
        let mut deleted = Vec::with_capacity(excess);

        for backup in backups.into_iter().take(excess) {
            info!("Removing backup {}", backup.path.display());
            fs::remove_file(&backup.path).map_err(|e| {
                SyncError::Io(format!(
                    "Failed to delete old backup {}: {}",
                    backup.path.display(),
                    e
                ))
            })?;
            deleted.push(backup.path);
        }

        Ok(deleted)
    }

    /// Get the most recently modified archive
    pub fn latest(&self) -> SyncResult<BackupInfo> {
        self.list_sorted_by_age()?
            .pop()
            .ok_or_else(|| SyncError::archive_not_found(self.backup_dir.display().to_string()))
    }
}

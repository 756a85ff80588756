//! Backup directory management for piholesync
//!
//! Downloaded teleporter archives live in a single local directory. The
//! `BackupManager` lists them by modification time, returns the newest one
//! and enforces the retention count.
//!
//! # Retention Policy
//!
//! After every download the directory is pruned to the `retainbackupfiles`
//! newest archives. A retention of zero disables pruning.
//!
//! # Example
//!
//! ```rust,ignore
//! use piholesync::backup::BackupManager;
//!
//! let manager = BackupManager::new("/var/backups/pihole");
//! let deleted = manager.prune(5)?;
//! let latest = manager.latest()?;
//! println!("Newest archive: {}", latest.path.display());
//! ```

mod manager;

pub use manager::{BackupInfo, BackupManager};

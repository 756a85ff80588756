//! piholesync - Synchronize Pi-hole teleporter backups across instances
//!
//! This library downloads a teleporter backup from a source Pi-hole, keeps a
//! rolling set of archives in a local directory, and restores the newest
//! archive to other Pi-hole instances.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: INI parsing, validation, settings and host records
//! - `error`: Custom error types
//! - `session`: Authenticated admin portal sessions (download/upload)
//! - `backup`: Backup directory listing and retention
//! - `sync`: The backup/sync/restore workflow
//! - `cli`: Command line arguments and handler
//!
//! # Example
//!
//! ```rust,ignore
//! use piholesync::config::Config;
//! use piholesync::sync::{HttpConnector, SyncOrchestrator};
//!
//! let config = Config::load(Path::new("piholesync.ini"))?;
//! let settings = config.settings().clone();
//! let report = SyncOrchestrator::new(&config, settings, HttpConnector).run()?;
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod session;
pub mod sync;

pub use error::{SyncError, SyncResult};

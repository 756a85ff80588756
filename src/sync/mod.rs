//! Backup synchronization workflow
//!
//! The orchestrator runs one of three linear actions:
//!
//! - `backup`: download from the source host, then prune the backup directory
//! - `sync`: `backup`, then upload the newest archive to every other host
//! - `restore`: upload the newest archive to one explicit target host
//!
//! Hosts are reached through the `Connector` and `Portal` traits so the
//! workflow can be exercised without a network.

mod orchestrator;

use std::path::{Path, PathBuf};

use crate::config::HostRecord;
use crate::error::SyncResult;
use crate::session::PortalSession;

pub use orchestrator::{SyncOrchestrator, SyncReport, UploadOutcome};

/// An authenticated connection to one host
pub trait Portal {
    /// Export an archive into `dir`, returning the written path
    fn download(&self, dir: &Path) -> SyncResult<PathBuf>;

    /// Import an archive, returning the host's response body
    fn upload(&self, archive: &Path) -> SyncResult<String>;
}

/// Opens authenticated connections to hosts
pub trait Connector {
    fn connect(&self, host: &HostRecord) -> SyncResult<Box<dyn Portal>>;
}

impl Portal for PortalSession {
    fn download(&self, dir: &Path) -> SyncResult<PathBuf> {
        PortalSession::download(self, dir, None)
    }

    fn upload(&self, archive: &Path) -> SyncResult<String> {
        PortalSession::upload(self, archive)
    }
}

/// Connects over HTTP by logging in to the host's admin portal
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnector;

impl Connector for HttpConnector {
    fn connect(&self, host: &HostRecord) -> SyncResult<Box<dyn Portal>> {
        Ok(Box::new(PortalSession::authenticate(host)?))
    }
}

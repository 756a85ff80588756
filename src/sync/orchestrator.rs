//! Sync orchestrator
//!
//! Sequences downloads, pruning and uploads for a single run. Every
//! precondition is checked before the first host is contacted. A failure
//! part way through a sync stops the run; hosts already updated stay updated.

use std::path::PathBuf;

use tracing::{info, warn};

use super::Connector;
use crate::backup::BackupManager;
use crate::config::{Action, Config, HostRecord, Settings};
use crate::error::{SyncError, SyncResult};

/// Response from one host after an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Host section name
    pub host: String,
    /// Archive that was uploaded
    pub archive: PathBuf,
    /// Response body, uninterpreted
    pub response: String,
}

/// What a run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub action: Action,
    /// Archive downloaded from the source host
    pub downloaded: Option<PathBuf>,
    /// Archives removed by the retention policy
    pub pruned: Vec<PathBuf>,
    /// Uploads in the order they happened
    pub uploads: Vec<UploadOutcome>,
}

impl SyncReport {
    fn new(action: Action) -> Self {
        Self {
            action,
            downloaded: None,
            pruned: Vec::new(),
            uploads: Vec::new(),
        }
    }
}

/// Runs one action against the configured hosts
pub struct SyncOrchestrator<'a, C: Connector> {
    config: &'a Config,
    settings: Settings,
    connector: C,
}

impl<'a, C: Connector> SyncOrchestrator<'a, C> {
    /// Create an orchestrator for the effective (merged) settings
    pub fn new(config: &'a Config, settings: Settings, connector: C) -> Self {
        Self {
            config,
            settings,
            connector,
        }
    }

    /// Run the configured action
    pub fn run(&self) -> SyncResult<SyncReport> {
        let backups = BackupManager::new(&self.settings.backup_dir);

        match self.settings.action {
            Action::Backup => {
                let source = self.source_host()?;
                let mut report = SyncReport::new(Action::Backup);
                self.backup(source, &backups, &mut report)?;
                Ok(report)
            }
            Action::Sync => {
                let source = self.source_host()?;
                let mut report = SyncReport::new(Action::Sync);
                self.backup(source, &backups, &mut report)?;

                let latest = backups.latest()?;
                for host in self.config.hosts().iter().filter(|h| h.name != source.name) {
                    report.uploads.push(self.upload(host, latest.path.clone())?);
                }
                if report.uploads.is_empty() {
                    info!("No other hosts configured, nothing to sync");
                }
                Ok(report)
            }
            Action::Restore => {
                let target = self.restore_target()?;
                let latest = backups.latest()?;

                let mut report = SyncReport::new(Action::Restore);
                report.uploads.push(self.upload(target, latest.path)?);
                Ok(report)
            }
        }
    }

    /// Resolve the source host for backup and sync
    fn source_host(&self) -> SyncResult<&'a HostRecord> {
        if let Some(target) = &self.settings.restore_target {
            warn!(
                "Ignoring '--target {}', it is not supported in '{}' actions.",
                target, self.settings.action
            );
        }
        self.config.host(&self.settings.backup_from)
    }

    /// Resolve the explicit target host for restore
    fn restore_target(&self) -> SyncResult<&'a HostRecord> {
        let target = self.settings.restore_target.as_deref().ok_or_else(|| {
            SyncError::Argument(
                "Unable to restore, not target (-t or --target) was specified".into(),
            )
        })?;
        self.config.host(target)
    }

    fn backup(
        &self,
        source: &HostRecord,
        backups: &BackupManager,
        report: &mut SyncReport,
    ) -> SyncResult<()> {
        info!(
            "Backing up [{}] to {}",
            source.name,
            backups.backup_dir().display()
        );
        let portal = self.connector.connect(source)?;
        report.downloaded = Some(portal.download(backups.backup_dir())?);
        report.pruned = backups.prune(self.settings.retain_backup_files)?;
        Ok(())
    }

    fn upload(&self, host: &HostRecord, archive: PathBuf) -> SyncResult<UploadOutcome> {
        info!("Restoring {} to [{}]", archive.display(), host.name);
        let portal = self.connector.connect(host)?;
        let response = portal.upload(&archive)?;
        Ok(UploadOutcome {
            host: host.name.clone(),
            archive,
            response,
        })
    }
}

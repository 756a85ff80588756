//! Run settings for piholesync
//!
//! `Settings` is built once from the `[DEFAULT]` section and then merged with
//! the command line through `SettingsOverride`. Neither is mutated afterwards.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// What a run should do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Download from the source host and prune the backup directory
    Backup,
    /// Backup, then upload the newest archive to every other host
    Sync,
    /// Upload the newest archive to one explicit target host
    Restore,
}

impl Action {
    /// Whether this action downloads from the source host first
    pub fn downloads(self) -> bool {
        matches!(self, Self::Backup | Self::Sync)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backup => write!(f, "backup"),
            Self::Sync => write!(f, "sync"),
            Self::Restore => write!(f, "restore"),
        }
    }
}

impl FromStr for Action {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "backup" => Ok(Self::Backup),
            "sync" => Ok(Self::Sync),
            "restore" => Ok(Self::Restore),
            other => Err(SyncError::Config(format!(
                "Invalid action '{}', expected one of backup, sync, restore",
                other
            ))),
        }
    }
}

/// Settings taken from the `[DEFAULT]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// Action to perform
    pub action: Action,

    /// Number of newest archives kept in the backup directory
    pub retain_backup_files: usize,

    /// Local directory holding downloaded archives
    pub backup_dir: PathBuf,

    /// Host section to download from
    pub backup_from: String,

    /// Host section to restore to (command line only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restore_target: Option<String>,
}

impl Settings {
    /// Apply command line overrides, field by field
    pub fn merge(self, overrides: SettingsOverride) -> Self {
        Self {
            action: overrides.action.unwrap_or(self.action),
            retain_backup_files: self.retain_backup_files,
            backup_dir: overrides.backup_dir.unwrap_or(self.backup_dir),
            backup_from: overrides.backup_from.unwrap_or(self.backup_from),
            restore_target: overrides.restore_target.or(self.restore_target),
        }
    }
}

/// Optional values supplied on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverride {
    pub action: Option<Action>,
    pub backup_dir: Option<PathBuf>,
    pub backup_from: Option<String>,
    pub restore_target: Option<String>,
}

/// Remove one pair of matching surrounding quotes
pub fn strip_quotes(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Settings {
        Settings {
            action: Action::Backup,
            retain_backup_files: 5,
            backup_dir: PathBuf::from("/var/backups/pihole"),
            backup_from: "pihole1".into(),
            restore_target: None,
        }
    }

    #[test]
    fn test_action_from_str() {
        assert_eq!("backup".parse::<Action>().unwrap(), Action::Backup);
        assert_eq!("SYNC".parse::<Action>().unwrap(), Action::Sync);
        assert_eq!("restore".parse::<Action>().unwrap(), Action::Restore);
        assert!("mirror".parse::<Action>().unwrap_err().is_config());
    }

    #[test]
    fn test_action_downloads() {
        assert!(Action::Backup.downloads());
        assert!(Action::Sync.downloads());
        assert!(!Action::Restore.downloads());
    }

    #[test]
    fn test_merge_without_overrides_keeps_defaults() {
        let merged = defaults().merge(SettingsOverride::default());
        assert_eq!(merged, defaults());
    }

    #[test]
    fn test_merge_prefers_overrides() {
        let merged = defaults().merge(SettingsOverride {
            action: Some(Action::Restore),
            backup_dir: Some(PathBuf::from("/tmp/b")),
            backup_from: None,
            restore_target: Some("pihole2".into()),
        });

        assert_eq!(merged.action, Action::Restore);
        assert_eq!(merged.backup_dir, PathBuf::from("/tmp/b"));
        assert_eq!(merged.backup_from, "pihole1");
        assert_eq!(merged.restore_target.as_deref(), Some("pihole2"));
        assert_eq!(merged.retain_backup_files, 5);
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("'secret'"), "secret");
        assert_eq!(strip_quotes("\"/tmp/b\""), "/tmp/b");
        assert_eq!(strip_quotes("plain"), "plain");
        assert_eq!(strip_quotes("'unbalanced"), "'unbalanced");
        assert_eq!(strip_quotes("'"), "'");
        assert_eq!(strip_quotes("''"), "");
    }

    #[test]
    fn test_settings_serialize_for_logging() {
        let json = serde_json::to_string(&defaults()).unwrap();
        assert!(json.contains("\"action\":\"backup\""));
        assert!(!json.contains("restore_target"));
    }
}

//! Command line arguments
//!
//! Every flag is optional except `--ini`, which has a default. Values given
//! here take precedence over the `[DEFAULT]` section of the INI file.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{Action, SettingsOverride, DEFAULT_INI_FILE};

#[derive(Parser, Debug)]
#[command(
    name = "piholesync",
    version,
    about = "Synchronize Pi-hole teleporter backups across instances",
    long_about = "piholesync downloads a teleporter backup from a source Pi-hole, \
                  keeps a rolling set of archives in a local directory, and can \
                  restore the newest archive to one or all of the other configured \
                  instances."
)]
pub struct Cli {
    /// Action to perform (overrides `action` in the INI file)
    #[arg(short, long, value_enum)]
    pub action: Option<Action>,

    /// Host section to back up from (overrides `backupfrom`)
    #[arg(short, long, value_name = "HOSTKEY")]
    pub source: Option<String>,

    /// Backup directory (overrides `backupdir`)
    #[arg(short, long, value_name = "PATH")]
    pub directory: Option<PathBuf>,

    /// Path to the INI file
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_INI_FILE, env = "PIHOLESYNC_INI")]
    pub ini: PathBuf,

    /// Host section to restore to (restore action only)
    #[arg(short, long, value_name = "HOSTKEY")]
    pub target: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Values that override the INI defaults
    pub fn overrides(&self) -> SettingsOverride {
        SettingsOverride {
            action: self.action,
            backup_dir: self.directory.clone(),
            backup_from: self.source.clone(),
            restore_target: self.target.clone(),
        }
    }
}

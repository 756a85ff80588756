//! Sync command handler
//!
//! Loads the configuration, merges the command line over it, runs the
//! orchestrator and prints what happened.

use tracing::{debug, info};

use super::args::Cli;
use crate::config::Config;
use crate::error::SyncResult;
use crate::sync::{Connector, HttpConnector, SyncOrchestrator, SyncReport};

/// Run the action selected by the INI file and command line over HTTP
pub fn handle_sync_command(cli: &Cli) -> SyncResult<SyncReport> {
    run_with_connector(cli, HttpConnector)
}

/// Run the selected action through an arbitrary connector
pub fn run_with_connector<C: Connector>(cli: &Cli, connector: C) -> SyncResult<SyncReport> {
    let config = Config::load(&cli.ini)?;
    let settings = config.settings().clone().merge(cli.overrides());
    if let Ok(json) = serde_json::to_string(&settings) {
        debug!("Effective settings: {}", json);
    }
    if let Ok(json) = serde_json::to_string(config.hosts()) {
        debug!("Configured hosts: {}", json);
    }

    let orchestrator = SyncOrchestrator::new(&config, settings, connector);
    let report = orchestrator.run()?;

    if let Some(path) = &report.downloaded {
        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        info!("Backup saved: {} ({})", path.display(), format_size(size));
    }
    if !report.pruned.is_empty() {
        info!("Pruned {} old backup(s)", report.pruned.len());
    }
    for upload in &report.uploads {
        info!("[{}] Import finished", upload.host);
        println!("{}", upload.response);
    }

    Ok(report)
}

/// Format a file size in human-readable form
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

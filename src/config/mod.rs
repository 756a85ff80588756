//! Configuration module for piholesync
//!
//! This module provides configuration management including:
//! - INI document parsing
//! - Validation of the `[DEFAULT]` and host sections
//! - Immutable run settings and host records
//!
//! # Validation rules
//!
//! `[DEFAULT]` must declare exactly `action`, `retainbackupfiles`,
//! `backupdir` and `backupfrom`. Every other section must declare exactly
//! `host`, `port`, `proto` and `password`; a host section may also repeat
//! any of the default keys, which are accepted and ignored.

pub mod host;
pub mod ini;
pub mod settings;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub use host::{HostRecord, Protocol};
pub use ini::{IniDocument, IniSection, DEFAULT_SECTION};
pub use settings::{strip_quotes, Action, Settings, SettingsOverride};

use crate::error::{SyncError, SyncResult};

/// Default location of the INI file
pub const DEFAULT_INI_FILE: &str = "piholesync.ini";

/// Keys required in `[DEFAULT]`
pub const DEFAULT_KEYS: [&str; 4] = ["action", "retainbackupfiles", "backupdir", "backupfrom"];

/// Keys required in every host section
pub const HOST_KEYS: [&str; 4] = ["host", "port", "proto", "password"];

/// Validated configuration: run settings plus host records
#[derive(Debug, Clone)]
pub struct Config {
    settings: Settings,
    hosts: Vec<HostRecord>,
}

impl Config {
    /// Load, validate and build the configuration from an INI file
    pub fn load(path: &Path) -> SyncResult<Self> {
        let doc = IniDocument::load(path)?;
        Self::from_document(&doc)
    }

    /// Validate and build the configuration from a parsed document
    pub fn from_document(doc: &IniDocument) -> SyncResult<Self> {
        Self::validate(doc)?;

        let settings = build_settings(doc.defaults())?;
        let hosts = doc
            .sections()
            .iter()
            .map(build_host)
            .collect::<SyncResult<Vec<_>>>()?;

        Ok(Self { settings, hosts })
    }

    /// Check that every section declares exactly the expected keys
    pub fn validate(doc: &IniDocument) -> SyncResult<()> {
        let expected: BTreeSet<&str> = DEFAULT_KEYS.into_iter().collect();
        let declared: BTreeSet<&str> = doc.defaults().own_keys().collect();
        if declared != expected {
            return Err(invalid_section(DEFAULT_SECTION));
        }

        let expected: BTreeSet<&str> = HOST_KEYS.into_iter().collect();
        for section in doc.sections() {
            let declared: BTreeSet<&str> = section
                .own_keys()
                .filter(|key| !DEFAULT_KEYS.contains(key))
                .collect();
            if declared != expected {
                return Err(invalid_section(section.name()));
            }
        }

        Ok(())
    }

    /// Settings from the `[DEFAULT]` section
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Host records in document order
    pub fn hosts(&self) -> &[HostRecord] {
        &self.hosts
    }

    /// Look up a host record by section name
    pub fn host(&self, key: &str) -> SyncResult<&HostRecord> {
        self.hosts
            .iter()
            .find(|h| h.name == key)
            .ok_or_else(|| SyncError::host_not_found(key))
    }

    /// Check if a host section exists
    pub fn has_host(&self, key: &str) -> bool {
        self.hosts.iter().any(|h| h.name == key)
    }
}

fn invalid_section(name: &str) -> SyncError {
    SyncError::Config(format!(
        "Invalid INI file, section [{}] has missing or invalid items.",
        name
    ))
}

fn required<'a>(section: &'a IniSection, key: &str) -> SyncResult<&'a str> {
    section
        .own_value(key)
        .ok_or_else(|| invalid_section(section.name()))
}

fn build_settings(section: &IniSection) -> SyncResult<Settings> {
    let action = strip_quotes(required(section, "action")?).parse::<Action>()?;

    let retain = strip_quotes(required(section, "retainbackupfiles")?);
    let retain_backup_files = retain.parse::<usize>().map_err(|_| {
        SyncError::Config(format!(
            "Invalid value '{}' for retainbackupfiles, expected a non-negative integer",
            retain
        ))
    })?;

    Ok(Settings {
        action,
        retain_backup_files,
        backup_dir: PathBuf::from(strip_quotes(required(section, "backupdir")?)),
        backup_from: strip_quotes(required(section, "backupfrom")?).to_string(),
        restore_target: None,
    })
}

fn build_host(section: &IniSection) -> SyncResult<HostRecord> {
    let port = strip_quotes(required(section, "port")?);
    let port = port.parse::<u16>().map_err(|_| {
        SyncError::Config(format!(
            "Invalid port '{}' in section [{}]",
            port,
            section.name()
        ))
    })?;

    Ok(HostRecord {
        name: section.name().to_string(),
        protocol: strip_quotes(required(section, "proto")?).parse()?,
        host: strip_quotes(required(section, "host")?).to_string(),
        port,
        password: strip_quotes(required(section, "password")?).to_string(),
    })
}

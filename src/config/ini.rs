//! INI file loading
//!
//! Parsing is done by `rust-ini`. This module only reshapes its output into
//! the `piholesync.ini` layout: a `[DEFAULT]` section whose keys are
//! inherited by every named section, followed by one section per host.
//! Keys are case-insensitive and stored lowercased.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ini::{Ini, ParseOption, Properties};

use crate::error::{SyncError, SyncResult};

/// Name of the section whose keys every other section inherits
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// A named section and the keys declared directly in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniSection {
    name: String,
    entries: BTreeMap<String, String>,
}

impl IniSection {
    fn from_properties(name: &str, properties: &Properties) -> SyncResult<Self> {
        let mut entries = BTreeMap::new();
        for (key, value) in properties.iter() {
            let key = key.to_lowercase();
            if entries.insert(key.clone(), value.to_string()).is_some() {
                return Err(SyncError::Config(format!(
                    "Invalid INI file, duplicate key '{}' in section [{}]",
                    key, name
                )));
            }
        }

        Ok(Self {
            name: name.to_string(),
            entries,
        })
    }

    /// Section name as written between the brackets
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Keys declared in this section, excluding inherited defaults
    pub fn own_keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Value declared in this section, excluding inherited defaults
    pub fn own_value(&self, key: &str) -> Option<&str> {
        self.entries.get(&key.to_lowercase()).map(String::as_str)
    }
}

/// A parsed INI document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniDocument {
    defaults: IniSection,
    sections: Vec<IniSection>,
}

impl IniDocument {
    /// Read and parse an INI file from disk
    pub fn load(path: &Path) -> SyncResult<Self> {
        if !path.is_file() {
            return Err(SyncError::NotFound {
                entity_type: "INI file",
                identifier: path.display().to_string(),
            });
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            SyncError::Io(format!("Failed to read INI file {}: {}", path.display(), e))
        })?;

        Self::parse(&contents)
    }

    /// Parse an INI document from text
    ///
    /// Values are kept verbatim: quotes and backslashes are not interpreted.
    pub fn parse(contents: &str) -> SyncResult<Self> {
        let options = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_str_opt(contents, options)
            .map_err(|e| SyncError::Config(format!("Invalid INI file, {}", e)))?;

        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> SyncResult<Self> {
        let mut defaults = IniSection {
            name: DEFAULT_SECTION.to_string(),
            entries: BTreeMap::new(),
        };
        let mut seen_default = false;
        let mut sections: Vec<IniSection> = Vec::new();

        for (name, properties) in ini.iter() {
            let Some(name) = name else {
                if !properties.is_empty() {
                    return Err(SyncError::Config(
                        "Invalid INI file, keys appear before any section header".into(),
                    ));
                }
                continue;
            };

            let duplicate = if name == DEFAULT_SECTION {
                std::mem::replace(&mut seen_default, true)
            } else {
                sections.iter().any(|s| s.name == name)
            };
            if duplicate {
                return Err(SyncError::Config(format!(
                    "Invalid INI file, section [{}] is declared twice",
                    name
                )));
            }

            let section = IniSection::from_properties(name, properties)?;
            if name == DEFAULT_SECTION {
                defaults = section;
            } else {
                sections.push(section);
            }
        }

        Ok(Self { defaults, sections })
    }

    /// The `[DEFAULT]` section; empty when the file has none
    pub fn defaults(&self) -> &IniSection {
        &self.defaults
    }

    /// Named sections in document order
    pub fn sections(&self) -> &[IniSection] {
        &self.sections
    }

    /// Look up a named section
    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections.iter().find(|s| s.name == name)
    }
}

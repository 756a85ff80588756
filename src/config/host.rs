//! Host records
//!
//! One record per named INI section, holding what is needed to reach and log
//! in to one Pi-hole admin portal.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::SyncError;

/// URL scheme used to reach a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Https => write!(f, "https"),
        }
    }
}

impl FromStr for Protocol {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(SyncError::Config(format!(
                "Invalid protocol '{}', expected http or https",
                other
            ))),
        }
    }
}

/// Connection details for one Pi-hole instance
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct HostRecord {
    /// INI section name
    pub name: String,
    pub protocol: Protocol,
    pub host: String,
    pub port: u16,
    /// Admin portal password
    #[serde(skip_serializing)]
    pub password: String,
}

impl HostRecord {
    /// `protocol://host[:port]`, leaving out ports 80 and 443
    pub fn base_address(&self) -> String {
        match self.port {
            80 | 443 => format!("{}://{}", self.protocol, self.host),
            port => format!("{}://{}:{}", self.protocol, self.host, port),
        }
    }
}

// Keep the password out of debug output and logs
impl fmt::Debug for HostRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostRecord")
            .field("name", &self.name)
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &"<redacted>")
            .finish()
    }
}

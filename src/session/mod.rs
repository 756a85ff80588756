//! Remote sessions against Pi-hole admin portals
//!
//! A `PortalSession` authenticates with a host's password and then exports or
//! imports teleporter archives over that session. Sessions are never
//! persisted; each action opens its own and drops it when done.
//!
//! # Example
//!
//! ```rust,ignore
//! use piholesync::session::PortalSession;
//!
//! let session = PortalSession::authenticate(config.host("pihole1")?)?;
//! let archive = session.download(Path::new("/var/backups/pihole"), None)?;
//! ```

mod client;
mod token;

pub use client::{PortalSession, PortalUrls, IMPORT_FLAGS};
pub use token::{HtmlTokenExtractor, TokenExtractor};

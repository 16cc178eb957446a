//! Ancestry.com GEDCOM Download Library
//!
//! Signs in to Ancestry.com, finds one of the account's family trees by name,
//! has the site build a GEDCOM export of it, and downloads the result.
//!
//! # Architecture
//!
//! - [`credentials`] - Username/password from a properties file or the terminal
//! - [`session`] - Cookie-carrying HTTP session and site endpoints
//! - [`trees`] - Owned-tree listing and case-insensitive lookup
//! - [`export`] - Download URL scrape, export job start, status polling, download
//! - [`output`] - File or stdout destination for the downloaded bytes
//! - [`workflow`] - The whole run, step by step

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod credentials;
mod error;
pub mod export;
mod json;
pub mod output;
pub mod session;
pub mod trees;
mod user_agent;
pub mod workflow;

// Re-export commonly used types
pub use credentials::{
    CredentialField, CredentialSource, Credentials, DEFAULT_PROPERTIES_FILE, FixedCredentials,
    PropertiesFile, TerminalPrompt, resolve_credentials,
};
pub use error::GedcomError;
pub use export::{Pause, PollPolicy, TokioPause};
pub use output::{OutputSink, OutputTarget};
pub use session::{Endpoints, SiteSession};
pub use trees::{TreeIndex, TreeInfo};
pub use workflow::{DownloadSummary, GedcomDownload};

//! Error types for the GEDCOM download workflow.
//!
//! Every failure is fatal to the run, so a single enum covers the whole
//! pipeline: credential resolution, the HTTP session, tree lookup, the
//! settings-page scrape and the export job.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while downloading a GEDCOM export.
#[derive(Debug, Error)]
pub enum GedcomError {
    /// Credentials are incomplete and cannot be read interactively.
    #[error("configuration error: {message}")]
    Configuration {
        /// What is missing.
        message: String,
    },

    /// The server answered outside the 1xx-2xx status class.
    #[error("response status code from server: {status} ({url})")]
    HttpStatus {
        /// The requested URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The requested URL.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout requesting {url}")]
    RequestTimeout {
        /// The URL that timed out.
        url: String,
    },

    /// No owned tree has the requested name.
    #[error("cannot find Ancestry.com tree: {name}")]
    TreeNotFound {
        /// The name as given by the user.
        name: String,
    },

    /// The settings page has no line carrying the download URL template.
    #[error("cannot find the GEDCOM download URL pattern on {url}")]
    TemplateNotFound {
        /// The settings page URL.
        url: String,
    },

    /// The export job never reached 100% within the polling budget.
    #[error(
        "Ancestry.com is taking too long to create the GEDCOM file ({attempts} status checks). Investigation required. Aborting download now."
    )]
    ExportTimedOut {
        /// Number of status checks performed.
        attempts: u32,
    },

    /// A JSON response could not be decoded.
    #[error("invalid JSON from {url}: {source}")]
    Decode {
        /// The requested URL.
        url: String,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The export status reported a progress value that is not an integer.
    #[error("invalid export progress value: {value:?}")]
    InvalidProgress {
        /// The raw progress string.
        value: String,
    },

    /// A configured or scraped URL is malformed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// File system or console error.
    #[error("IO error on {path}: {source}")]
    Io {
        /// The path (or stream name) where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl GedcomError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Maps a reqwest error to `RequestTimeout` or `Network`.
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::RequestTimeout { url }
        } else {
            Self::Network { url, source }
        }
    }

    /// Creates a tree-not-found error.
    pub fn tree_not_found(name: impl Into<String>) -> Self {
        Self::TreeNotFound { name: name.into() }
    }

    /// Creates a template-not-found error.
    pub fn template_not_found(url: impl Into<String>) -> Self {
        Self::TemplateNotFound { url: url.into() }
    }

    /// Creates a JSON decode error.
    pub fn decode(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The HTTP status code, for `HttpStatus` errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// No `From<reqwest::Error>` or `From<std::io::Error>`: every variant needs the
// URL or path the source error lacks, so callers go through the constructors.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_display_carries_code_and_url() {
        let error = GedcomError::http_status("https://example.com/api", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(msg.contains("https://example.com/api"), "Expected URL in: {msg}");
        assert_eq!(error.status(), Some(404));
    }

    #[test]
    fn test_tree_not_found_display() {
        let msg = GedcomError::tree_not_found("Smith Family").to_string();
        assert!(msg.contains("Smith Family"), "Expected tree name in: {msg}");
    }

    #[test]
    fn test_export_timed_out_display() {
        let msg = GedcomError::ExportTimedOut { attempts: 120 }.to_string();
        assert!(msg.contains("taking too long"), "Expected timeout text in: {msg}");
        assert!(msg.contains("120"));
    }

    #[test]
    fn test_status_is_none_for_other_variants() {
        assert_eq!(GedcomError::configuration("no console").status(), None);
        assert_eq!(GedcomError::template_not_found("x").status(), None);
    }

    #[test]
    fn test_io_display_includes_path() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let msg = GedcomError::io(PathBuf::from("/tmp/tree.ged"), io_error).to_string();
        assert!(msg.contains("/tmp/tree.ged"), "Expected path in: {msg}");
    }
}

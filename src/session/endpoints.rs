//! Fixed site URLs used by the session.

use url::Url;

use crate::GedcomError;

/// Production site root.
pub const DEFAULT_BASE_URL: &str = "https://www.ancestry.com";

const SIGNIN_PATH: &str = "/account/signin";
const TREES_PATH: &str = "/api/treesui-list/trees";
const EXPORT_PATH: &str = "/family-tree/ExportGedcom.ashx";
const STATUS_PATH: &str = "/family-tree/getexportgedcomstatus.ashx";

/// URLs of every endpoint the workflow talks to, rooted at one base URL.
///
/// Tests point this at a local mock server via [`Endpoints::with_base_url`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Endpoints rooted at a custom base URL (scheme and host, optional path prefix).
    ///
    /// # Errors
    ///
    /// Returns [`GedcomError::InvalidUrl`] if `base_url` is not an absolute HTTP(S) URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, GedcomError> {
        let base_url = base_url.into();
        let parsed = Url::parse(&base_url).map_err(|_| GedcomError::invalid_url(&base_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GedcomError::invalid_url(base_url));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sign-in form target.
    #[must_use]
    pub fn signin(&self) -> String {
        format!("{}{SIGNIN_PATH}", self.base_url)
    }

    /// Owned-trees listing; queried with `rights=own`.
    #[must_use]
    pub fn trees(&self) -> String {
        format!("{}{TREES_PATH}", self.base_url)
    }

    /// Per-tree settings page that embeds the download URL template.
    #[must_use]
    pub fn settings_page(&self, tree_id: &str) -> String {
        format!("{}/family-tree/tree/{tree_id}/settings/info", self.base_url)
    }

    /// Export trigger; queried with `tid` and `uid`.
    #[must_use]
    pub fn export(&self) -> String {
        format!("{}{EXPORT_PATH}", self.base_url)
    }

    /// Export status; queried with `gid` and `uid`.
    #[must_use]
    pub fn export_status(&self) -> String {
        format!("{}{STATUS_PATH}", self.base_url)
    }
}

//! Server-side GEDCOM export: find the download URL pattern, start the job,
//! wait for it to finish, then fetch the file.
//!
//! # Polling
//!
//! The export runs asynchronously on the server. [`wait_for_export`] checks
//! its status up to [`PollPolicy::max_attempts`] times, pausing
//! [`PollPolicy::interval`] before every check (the first one included). With
//! the defaults the worst case is about 49 seconds.
//!
//! ```text
//! Polling --progress >= 100--> Complete --> download
//!    |  ^
//!    |  +--progress < 100 (bounded)
//!    +--attempts exhausted--> TimedOut
//! any HTTP failure ---------> error (no download)
//! ```

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::GedcomError;
use crate::json::string_or_number;
use crate::output::OutputTarget;
use crate::session::SiteSession;
use crate::trees::TreeInfo;

/// Placeholder the site uses for the job id in the download URL pattern.
pub const GID_PLACEHOLDER: &str = "{0}";

/// Default number of status checks before giving up.
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 120;

/// Default pause before each status check.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(409);

/// A whole settings-page line holding a quoted `http...{0}.ged...ged` URL.
#[allow(clippy::expect_used)]
static TEMPLATE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*'(http.*\{0\}\.ged.*\.ged)'.*$").expect("template regex is valid") // Static pattern, safe to panic
});

/// Reply to the export trigger.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportInfo {
    #[serde(default)]
    pub initiate_status: String,
    #[serde(deserialize_with = "string_or_number")]
    pub gid: String,
}

/// Reply to a status check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExportStatus {
    #[serde(default, deserialize_with = "string_or_number")]
    pub uid: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub gid: String,
    #[serde(deserialize_with = "string_or_number")]
    pub progress: String,
}

impl ExportStatus {
    /// Progress as an integer percentage.
    ///
    /// # Errors
    ///
    /// Returns [`GedcomError::InvalidProgress`] if `progress` is not an integer.
    pub fn percent(&self) -> Result<i64, GedcomError> {
        self.progress
            .trim()
            .parse()
            .map_err(|_| GedcomError::InvalidProgress {
                value: self.progress.clone(),
            })
    }
}

/// Bounds of the status polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Delay between status checks. Swapped out in tests to avoid real waiting.
#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Sleeps on the Tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Finds the download URL pattern in a settings page body.
///
/// Returns the first line that matches as a whole; later lines are not examined.
#[must_use]
pub fn scrape_download_template(page: &str) -> Option<String> {
    page.lines().find_map(|line| {
        TEMPLATE_LINE_RE
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Puts the job id into the URL pattern (first placeholder only, no escaping).
#[must_use]
pub fn resolve_download_url(template: &str, gid: &str) -> String {
    template.replacen(GID_PLACEHOLDER, gid, 1)
}

/// Loads the tree's settings page and extracts the download URL pattern.
///
/// # Errors
///
/// Returns [`GedcomError::TemplateNotFound`] if no line matches, or the
/// session's HTTP/transport errors.
#[instrument(skip(session, tree), fields(tree_id = %tree.id))]
pub async fn discover_download_template(
    session: &SiteSession,
    tree: &TreeInfo,
) -> Result<String, GedcomError> {
    let url = session.endpoints().settings_page(&tree.id);
    let page = session.get_text(&url, &[]).await?;
    scrape_download_template(&page).ok_or_else(|| GedcomError::template_not_found(url))
}

/// Asks the server to build the GEDCOM file and returns the job id.
///
/// # Errors
///
/// Returns the session's HTTP/transport/decode errors.
#[instrument(skip(session, tree), fields(tree_id = %tree.id))]
pub async fn start_export(session: &SiteSession, tree: &TreeInfo) -> Result<String, GedcomError> {
    let url = session.endpoints().export();
    let info: ExportInfo = session
        .get_json(
            &url,
            &[("tid", tree.id.as_str()), ("uid", tree.owner_user_id.as_str())],
        )
        .await?;
    debug!(initiate_status = %info.initiate_status, gid = %info.gid, "export started");
    Ok(info.gid)
}

/// Checks job status until it reports 100% or the attempt budget runs out.
///
/// Returns the number of status checks made.
///
/// # Errors
///
/// Returns [`GedcomError::ExportTimedOut`] when the budget is exhausted,
/// [`GedcomError::InvalidProgress`] for a non-numeric progress value, or the
/// session's HTTP/transport/decode errors.
#[instrument(skip(session, tree, policy, pause), fields(max_attempts = policy.max_attempts))]
pub async fn wait_for_export(
    session: &SiteSession,
    tree: &TreeInfo,
    gid: &str,
    policy: &PollPolicy,
    pause: &dyn Pause,
) -> Result<u32, GedcomError> {
    let url = session.endpoints().export_status();
    let query = [("gid", gid), ("uid", tree.owner_user_id.as_str())];

    for attempt in 1..=policy.max_attempts {
        pause.pause(policy.interval).await;

        let status: ExportStatus = session.get_json(&url, &query).await?;
        let progress = status.percent()?;
        info!("Ancestry.com reported GEDCOM file creation progress of: {progress}%...");

        if progress >= 100 {
            debug!(attempt, "export complete");
            return Ok(attempt);
        }
    }

    Err(GedcomError::ExportTimedOut {
        attempts: policy.max_attempts,
    })
}

/// Waits for the job, then downloads the finished file into `output`.
///
/// The download URL is computed before polling starts. The output is only
/// opened once the job is complete, so a timeout never touches it.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// Returns any error from [`wait_for_export`], the download request, or the
/// output sink.
pub async fn poll_and_download(
    session: &SiteSession,
    tree: &TreeInfo,
    gid: &str,
    template: &str,
    policy: &PollPolicy,
    pause: &dyn Pause,
    output: &OutputTarget,
) -> Result<u64, GedcomError> {
    let download_url = resolve_download_url(template, gid);

    wait_for_export(session, tree, gid, policy, pause).await?;
    info!("Will download using this URL: {download_url}");

    let mut sink = output.open().await?;
    session.download(&download_url, &mut sink).await
}

//! The end-to-end run: log in, find the tree, export, download.

use tracing::{info, instrument};

use crate::GedcomError;
use crate::credentials::Credentials;
use crate::export::{self, Pause, PollPolicy};
use crate::output::OutputTarget;
use crate::session::SiteSession;
use crate::trees;

/// One GEDCOM download request.
#[derive(Debug, Clone)]
pub struct GedcomDownload {
    tree_name: String,
    output: OutputTarget,
    poll_policy: PollPolicy,
}

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    pub tree_id: String,
    pub gid: String,
    pub download_url: String,
    pub bytes_written: u64,
}

impl GedcomDownload {
    /// Downloads the tree called `tree_name` (any case) into `output`.
    pub fn new(tree_name: impl Into<String>, output: OutputTarget) -> Self {
        Self {
            tree_name: tree_name.into(),
            output,
            poll_policy: PollPolicy::default(),
        }
    }

    /// Overrides the status polling bounds.
    #[must_use]
    pub fn with_poll_policy(mut self, poll_policy: PollPolicy) -> Self {
        self.poll_policy = poll_policy;
        self
    }

    /// Runs every step in order. The first failure aborts the run.
    ///
    /// # Errors
    ///
    /// Returns the first [`GedcomError`] raised by any step.
    #[instrument(skip(self, session, credentials, pause), fields(tree = %self.tree_name, output = %self.output))]
    pub async fn run(
        &self,
        session: &SiteSession,
        credentials: &Credentials,
        pause: &dyn Pause,
    ) -> Result<DownloadSummary, GedcomError> {
        session.login(credentials).await?;
        info!("Successfully logged in to Ancestry.com.");

        let index = trees::list_trees(session).await?;
        let tree = index.find(&self.tree_name)?;
        info!(
            "Found Ancestry.com tree {}, with ID {} (for account with ID {})",
            tree.name, tree.id, tree.owner_user_id
        );

        let template = export::discover_download_template(session, tree).await?;
        info!("Will use this pattern for the download URL: {template}");

        let gid = export::start_export(session, tree).await?;
        info!("Ancestry.com is creating the GEDCOM file (process ID: {gid})...");

        let bytes_written = export::poll_and_download(
            session,
            tree,
            &gid,
            &template,
            &self.poll_policy,
            pause,
            &self.output,
        )
        .await?;
        info!(bytes = bytes_written, output = %self.output, "GEDCOM download complete");

        Ok(DownloadSummary {
            tree_id: tree.id.clone(),
            download_url: export::resolve_download_url(&template, &gid),
            gid,
            bytes_written,
        })
    }
}

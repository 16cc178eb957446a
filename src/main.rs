//! CLI entry point for the Ancestry.com GEDCOM downloader.

use anyhow::Result;
use clap::Parser;
use gedcom_download_core::{
    Endpoints, GedcomDownload, OutputTarget, PropertiesFile, SiteSession, TerminalPrompt,
    TokioPause, resolve_credentials,
};
use tracing::{debug, info};

mod cli;

use cli::{Args, USAGE};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let mut args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // stdout may carry the GEDCOM itself, so diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let Some(tree_name) = args.take_tree_name() else {
        eprintln!("{USAGE}");
        return Ok(());
    };

    // Credentials are settled before any network traffic.
    let mut properties = PropertiesFile::load(&args.credentials)?;
    let mut terminal = TerminalPrompt;
    let credentials = resolve_credentials(&mut [&mut properties, &mut terminal])?;

    let endpoints = match args.base_url {
        Some(base_url) => Endpoints::with_base_url(base_url)?,
        None => Endpoints::default(),
    };
    let session = SiteSession::with_timeouts(endpoints, args.connect_timeout, args.read_timeout)?;

    let output = OutputTarget::from_path(args.output);
    let summary = GedcomDownload::new(tree_name, output)
        .run(&session, &credentials, &TokioPause)
        .await?;

    debug!(?summary, "run summary");
    info!("Done.");
    Ok(())
}

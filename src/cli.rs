//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use gedcom_download_core::DEFAULT_PROPERTIES_FILE;
use gedcom_download_core::session::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};

/// Usage lines shown when the positional arguments are not `treename [output.ged]`.
pub const USAGE: &str = "usage: ancestry-gedcom-download treename [output.ged]\n\
requires ./.ancestry.properties file with username and password.";

/// Download a GEDCOM export of an Ancestry.com family tree.
///
/// Signs in with the credentials from the properties file (or prompts for
/// them), asks Ancestry.com to build a GEDCOM file of the named tree and
/// writes it to OUTPUT, or to standard output when OUTPUT is omitted.
#[derive(Parser, Debug)]
#[command(name = "ancestry-gedcom-download")]
#[command(author, version, about)]
pub struct Args {
    /// Name of the tree to export (case-insensitive)
    #[arg(value_name = "TREENAME")]
    pub tree_name: Option<String>,

    /// File to write the GEDCOM to (overwritten if present)
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Surplus positional arguments; their presence triggers the usage message
    #[arg(hide = true, value_name = "EXTRA")]
    pub extra: Vec<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Properties file with `username` and `password` keys
    #[arg(long, value_name = "PATH", default_value = DEFAULT_PROPERTIES_FILE)]
    pub credentials: PathBuf,

    /// HTTP connect timeout in seconds (1-600)
    #[arg(long, default_value_t = CONNECT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=600))]
    pub connect_timeout: u64,

    /// Overall HTTP request timeout in seconds, including the download (1-3600)
    #[arg(long, default_value_t = READ_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: u64,

    /// Site root URL
    #[arg(long, hide = true)]
    pub base_url: Option<String>,
}

impl Args {
    /// Takes the tree name when exactly one or two positional arguments were
    /// given; `None` means the usage text should be shown instead.
    pub fn take_tree_name(&mut self) -> Option<String> {
        match self.tree_name.take() {
            Some(tree_name) if self.extra.is_empty() => Some(tree_name),
            _ => None,
        }
    }
}

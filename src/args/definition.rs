//! Command-line argument definition.

use std::path::PathBuf;

use clap::Parser;

/// hierscope - Browse presentation hierarchies with live filtering
#[derive(Parser, Debug)]
#[command(name = "hierscope")]
#[command(version)]
#[command(about = "Browse presentation hierarchies with live filtering", long_about = None)]
pub struct Args {
    /// JSON node document to browse
    pub file: PathBuf,

    /// Ruleset to open (defaults to the settings file, then the first ruleset in the document)
    #[arg(short, long)]
    pub ruleset: Option<String>,

    /// Initial filter text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Print the materialized hierarchy (or, with --filter, the filtered paths) as JSON and exit
    #[arg(long)]
    pub dump: bool,

    /// Set the logging level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Enable verbose output (equivalent to --log-level debug)
    #[arg(short, long)]
    pub verbose: bool,

    /// Settings file to use instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,
}

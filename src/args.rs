use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "shuffle-reel")]
#[command(about = "Scans a rendered page for media candidates and browses them shuffled")]
#[command(version)]
pub struct Args {
    /// Path to the rendered HTML document to scan
    pub document: PathBuf,

    /// Path to a JSON scan configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Poll interval in milliseconds (overrides the configured value)
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Base URL for resolving relative links in the document
    #[arg(short, long)]
    pub base_url: Option<String>,
}

use std::path::PathBuf;

use blkfile_scan::ResyncPolicy;
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "blkfile",
    about = "Scan an archival block file and print every decoded block",
    version,
)]
pub struct Cli {
    /// Block file to scan (e.g. blk00000.dat)
    pub file: PathBuf,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// How to resume scanning after a frame fails to decode
    #[arg(long, default_value = "trust-size")]
    pub resync: ResyncMode,

    /// Stop after this many decoded blocks
    #[arg(long)]
    pub limit: Option<usize>,

    /// Log frame-level diagnostics to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ResyncMode {
    /// Skip past a failed frame using its declared size field
    TrustSize,
    /// Stop the scan at the first failed frame
    Stop,
}

impl From<ResyncMode> for ResyncPolicy {
    fn from(mode: ResyncMode) -> Self {
        match mode {
            ResyncMode::TrustSize => ResyncPolicy::TrustDeclaredSize,
            ResyncMode::Stop => ResyncPolicy::StopOnError,
        }
    }
}

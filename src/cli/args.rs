use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::config::GlobalConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "recon-orchestrator", version, about = "Runs a fixed battery of recon tools against one target")]
pub struct Cli {
    /// Target hostname/domain to scan (required)
    pub target: String,

    /// Config file (default: ./recon.toml, then user and system locations)
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory that holds per-target scan history
    #[arg(long = "base-dir", value_name = "DIR", env = "RECON_BASE_DIR")]
    pub base_dir: Option<PathBuf>,

    /// Per-scan timeout in seconds
    #[arg(long = "timeout", value_name = "SECS", env = "RECON_SCAN_TIMEOUT",
          value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Number of runs to keep per target
    #[arg(long = "max-scans", value_name = "N", env = "RECON_MAX_SCANS",
          value_parser = clap::value_parser!(u64).range(1..))]
    pub max_scans: Option<u64>,

    /// Informational cap on concurrently running light scans
    #[arg(long = "max-parallel-jobs", value_name = "N", env = "RECON_MAX_PARALLEL_JOBS",
          value_parser = clap::value_parser!(u64).range(1..))]
    pub max_parallel_jobs: Option<u64>,

    /// Verbose human output
    #[arg(short = 'v', long = "verbose", action = ArgAction::SetTrue)]
    pub verbose: bool,

    /// Debug logs (implies verbose)
    #[arg(short = 'd', long = "debug", action = ArgAction::SetTrue)]
    pub debug: bool,
}

impl Cli {
    /// Command-line and environment values win over the config file.
    pub fn apply_overrides(&self, config: &mut GlobalConfig) {
        if let Some(dir) = &self.base_dir {
            config.output.base_dir = dir.clone();
        }
        if let Some(secs) = self.timeout {
            config.scan.timeout_secs = secs;
        }
        if let Some(n) = self.max_scans {
            config.retention.max_scans = n as usize;
        }
        if let Some(n) = self.max_parallel_jobs {
            config.concurrency.max_parallel_jobs = n as usize;
        }
    }
}

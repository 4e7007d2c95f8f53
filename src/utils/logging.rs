use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn level_from_cli(cli: &crate::cli::args::Cli) -> tracing::Level {
    if cli.debug {
        tracing::Level::DEBUG
    } else if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    }
}

pub fn init(level: tracing::Level) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("recon_orchestrator={}", level).parse()?)
        .add_directive(level.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

/// Append-only `scan_log.txt` for one run. Every line is mirrored to tracing.
pub struct RunLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl RunLog {
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open run log: {:?}", path))?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self, msg: &str) {
        self.record(Severity::Info, msg);
    }

    pub fn warn(&self, msg: &str) {
        self.record(Severity::Warn, msg);
    }

    pub fn error(&self, msg: &str) {
        self.record(Severity::Error, msg);
    }

    pub fn record(&self, severity: Severity, msg: &str) {
        match severity {
            Severity::Info => tracing::info!("{}", msg),
            Severity::Warn => tracing::warn!("{}", msg),
            Severity::Error => tracing::error!("{}", msg),
        }

        let line = format!(
            "[{}] [{}] {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            severity.label(),
            msg
        );
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        // Losing a log line must not take the run down with it.
        if let Err(e) = file.write_all(line.as_bytes()) {
            tracing::error!("Failed to write run log {:?}: {}", self.path, e);
        }
    }
}

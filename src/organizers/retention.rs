use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;

use anyhow::Result;

use super::archive::archive_path;
use super::layout::{read_history, write_history};
use crate::core::errors::ReconError;
use crate::utils::logging::RunLog;
use crate::utils::time::is_run_id;

#[derive(Debug, Default)]
pub struct RetentionReport {
    pub removed: Vec<String>,
    pub failed: Vec<ReconError>,
}

/// Keeps the newest `max_scans` runs of a target. Stale run directories (and
/// their archives) are removed best-effort; the ledger is always trimmed.
pub fn enforce(target_dir: &Path, max_scans: usize, log: &RunLog) -> Result<RetentionReport> {
    let mut report = RetentionReport::default();
    let (history, malformed): (Vec<String>, Vec<String>) =
        read_history(target_dir)?.into_iter().partition(|id| is_run_id(id));

    // Anything that is not a run id could resolve outside the target dir.
    for entry in &malformed {
        let err = ReconError::RetentionDelete {
            run_id: entry.clone(),
            source: io::Error::new(ErrorKind::InvalidData, "not a run id, dropped from ledger"),
        };
        log.warn(&err.to_string());
        report.failed.push(err);
    }

    if history.len() <= max_scans {
        if !malformed.is_empty() {
            write_history(target_dir, &history)?;
        }
        return Ok(report);
    }

    let excess = history.len() - max_scans;
    let (stale, kept) = history.split_at(excess);

    for run_id in stale {
        let run_dir = target_dir.join(run_id);
        match remove_run(&run_dir) {
            Ok(()) => {
                log.info(&format!("Removed old scan {}", run_id));
                report.removed.push(run_id.clone());
            }
            Err(source) => {
                let err = ReconError::RetentionDelete {
                    run_id: run_id.clone(),
                    source,
                };
                log.warn(&err.to_string());
                report.failed.push(err);
            }
        }
    }

    write_history(target_dir, kept)?;
    Ok(report)
}

fn remove_run(run_dir: &Path) -> std::io::Result<()> {
    match fs::remove_dir_all(run_dir) {
        Ok(()) => {}
        // Already gone counts as removed.
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    match fs::remove_file(archive_path(run_dir)) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

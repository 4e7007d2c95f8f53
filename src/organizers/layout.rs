use crate::core::models::{Category, RunRecord, Target};
use crate::utils::fs::atomic_write;
use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const HISTORY_FILE: &str = "scan_history.txt";
pub const LATEST_LINK: &str = "latest";
pub const SUMMARY_FILE: &str = "scan_summary.txt";
pub const LOG_FILE: &str = "scan_log.txt";

/// Creates `<base>/<target>/<run_id>/{network,web,ssl,dns,mail,misc}`, records the
/// run in the history ledger and repoints `latest` at it.
pub fn create_run(base: &Path, target: &Target, run_id: &str) -> Result<RunRecord> {
    let target_dir = base.join(target.as_str());
    let run_dir = target_dir.join(run_id);

    for category in Category::ALL {
        let dir = run_dir.join(category.dir_name());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory: {:?}", dir))?;
    }

    append_history(&target_dir, run_id)?;
    point_latest(&target_dir, run_id)?;

    Ok(RunRecord {
        target: target.clone(),
        run_id: run_id.to_string(),
        target_dir,
        run_dir,
    })
}

pub fn path_for(record: &RunRecord, category: Category, filename: &str) -> PathBuf {
    record.run_dir.join(category.dir_name()).join(filename)
}

pub fn history_path(target_dir: &Path) -> PathBuf {
    target_dir.join(HISTORY_FILE)
}

/// Run ids in chronological order. A missing ledger is an empty history.
pub fn read_history(target_dir: &Path) -> Result<Vec<String>> {
    let path = history_path(target_dir);
    match fs::read_to_string(&path) {
        Ok(content) => Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e).with_context(|| format!("Failed to read history ledger: {:?}", path)),
    }
}

pub fn write_history(target_dir: &Path, run_ids: &[String]) -> Result<()> {
    let mut content = run_ids.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    atomic_write(history_path(target_dir), content.as_bytes())
}

fn append_history(target_dir: &Path, run_id: &str) -> Result<()> {
    let mut history = read_history(target_dir)?;
    if history.last().map(String::as_str) == Some(run_id) {
        return Ok(());
    }
    history.push(run_id.to_string());
    write_history(target_dir, &history)
}

/// The run id `latest` currently points at, if any.
pub fn read_latest(target_dir: &Path) -> Option<String> {
    let link = target_dir.join(LATEST_LINK);
    #[cfg(unix)]
    let pointed = fs::read_link(&link).ok().map(|p| p.to_string_lossy().into_owned());
    #[cfg(not(unix))]
    let pointed = fs::read_to_string(&link).ok().map(|s| s.trim().to_string());
    pointed
}

fn point_latest(target_dir: &Path, run_id: &str) -> Result<()> {
    if read_latest(target_dir).as_deref() == Some(run_id) {
        return Ok(());
    }
    let link = target_dir.join(LATEST_LINK);
    let staging = target_dir.join(format!(".{}.tmp", LATEST_LINK));
    let _ = fs::remove_file(&staging);

    #[cfg(unix)]
    std::os::unix::fs::symlink(run_id, &staging)
        .with_context(|| format!("Failed to create symlink {:?}", staging))?;
    #[cfg(not(unix))]
    fs::write(&staging, run_id).with_context(|| format!("Failed to write {:?}", staging))?;

    // rename(2) replaces the old link in one step.
    fs::rename(&staging, &link)
        .with_context(|| format!("Failed to repoint {:?} to {}", link, run_id))?;
    Ok(())
}

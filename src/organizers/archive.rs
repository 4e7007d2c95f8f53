use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use crate::core::errors::ReconError;
use crate::core::models::RunRecord;

/// `<run_dir>.tar.gz`, next to the run directory.
pub fn archive_path(run_dir: &Path) -> PathBuf {
    let mut name = run_dir.as_os_str().to_os_string();
    name.push(".tar.gz");
    PathBuf::from(name)
}

/// Compresses the run directory with the configured `tar` command.
pub async fn create_archive(record: &RunRecord, tar_command: &str) -> Result<PathBuf, ReconError> {
    let archive = archive_path(&record.run_dir);
    let words = shell_words::split(tar_command)
        .map_err(|e| ReconError::orchestration("archive", format!("bad tar command: {}", e)))?;
    let (program, base_args) = words
        .split_first()
        .ok_or_else(|| ReconError::orchestration("archive", "empty tar command"))?;

    let output = Command::new(program)
        .args(base_args)
        .arg("-czf")
        .arg(&archive)
        .arg("-C")
        .arg(&record.target_dir)
        .arg(&record.run_id)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| ReconError::orchestration("archive", format!("failed to spawn {}: {}", program, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ReconError::Orchestration {
            stage: "archive",
            message: format!("{} exited with {:?}: {}", program, output.status.code(), stderr.trim()),
            code: output.status.code().filter(|c| *c != 0).unwrap_or(1),
        });
    }

    tracing::info!("Archived run to {:?}", archive);
    Ok(archive)
}

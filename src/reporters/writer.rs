use crate::core::models::RunRecord;
use crate::organizers::layout::SUMMARY_FILE;
use crate::reporters::summary::SummaryArtifact;
use crate::utils::fs::atomic_write;
use anyhow::Result;
use std::path::PathBuf;

pub fn write_summary(record: &RunRecord, summary: &SummaryArtifact) -> Result<PathBuf> {
    let path = record.run_dir.join(SUMMARY_FILE);
    atomic_write(&path, summary.text.as_bytes())?;
    Ok(path)
}

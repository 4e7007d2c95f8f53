use thiserror::Error;

/// Exit code used when the operator interrupts a run.
pub const EXIT_INTERRUPTED: i32 = 130;
pub const EXIT_INVALID_TARGET: i32 = 2;

#[derive(Error, Debug)]
pub enum ReconError {
    #[error("invalid target: {0:?}")]
    InvalidTarget(String),

    /// Recorded as unavailability, never raised past the prober.
    #[error("{protocol} probe failed: {reason}")]
    ProbeFailure { protocol: &'static str, reason: String },

    #[error("{job} timed out after {timeout_secs}s")]
    ScanTimeout { job: String, timeout_secs: u64 },

    #[error("{job} failed (exit code {exit_code:?}): {reason}")]
    ScanExecution {
        job: String,
        exit_code: Option<i32>,
        reason: String,
    },

    #[error("failed to remove stale run {run_id}: {source}")]
    RetentionDelete {
        run_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} failed: {message}")]
    Orchestration {
        stage: &'static str,
        message: String,
        code: i32,
    },

    #[error("interrupted by operator")]
    Interrupted,
}

impl ReconError {
    pub fn orchestration(stage: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Orchestration {
            stage,
            message: err.to_string(),
            code: 1,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidTarget(_) => EXIT_INVALID_TARGET,
            Self::Orchestration { code, .. } => *code,
            Self::Interrupted => EXIT_INTERRUPTED,
            _ => 1,
        }
    }
}

/// Maps any error reaching the top-level boundary to a process exit code.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ReconError>())
        .map(ReconError::exit_code)
        .unwrap_or(1)
}

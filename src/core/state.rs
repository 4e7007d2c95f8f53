use super::models::{ProtocolStatus, RunRecord};
use crate::config::GlobalConfig;
use crate::executors::tracker::ProcessTracker;
use crate::utils::logging::RunLog;

/// Everything a run needs, built once after probing and shared read-only.
pub struct RunContext {
    pub record: RunRecord,
    pub config: GlobalConfig,
    pub protocols: ProtocolStatus,
    pub tracker: ProcessTracker,
    pub log: RunLog,
}

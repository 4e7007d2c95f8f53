use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use super::errors::ReconError;
use super::jobs::{expand_template, Group, JobSpec, JOBS};
use super::models::{ProtocolStatus, ScanOutcome, ScanStatus, Target};
use super::state::RunContext;
use crate::executors::command;
use crate::organizers::layout::path_for;

/// A job that passed its precondition, with its argument resolved.
#[derive(Debug, Clone)]
pub struct PlannedJob {
    pub spec: &'static JobSpec,
    pub argument: String,
}

#[derive(Debug, Default)]
pub struct Schedule {
    pub parallel: Vec<PlannedJob>,
    pub sequential: Vec<PlannedJob>,
    pub skipped: Vec<&'static JobSpec>,
}

impl Schedule {
    pub fn eligible_names(&self) -> Vec<&'static str> {
        self.parallel
            .iter()
            .chain(&self.sequential)
            .map(|job| job.spec.name)
            .collect()
    }
}

/// Partitions the static job table by protocol availability. Performs no I/O.
pub fn schedule(target: &Target, status: &ProtocolStatus) -> Schedule {
    let mut plan = Schedule::default();
    for spec in JOBS {
        let argument = if spec.is_eligible(status) {
            spec.resolve_argument(target, status)
        } else {
            None
        };
        match (argument, spec.group) {
            (Some(argument), Group::Parallel) => plan.parallel.push(PlannedJob { spec, argument }),
            (Some(argument), Group::Sequential) => plan.sequential.push(PlannedJob { spec, argument }),
            (None, _) => plan.skipped.push(spec),
        }
    }
    plan
}

/// Runs the parallel group to completion, then the sequential group one job at
/// a time. Returns one outcome per table entry, in table order.
pub async fn execute(plan: &Schedule, ctx: &Arc<RunContext>) -> Vec<ScanOutcome> {
    let cap = ctx.config.concurrency.max_parallel_jobs;
    if plan.parallel.len() > cap {
        ctx.log.info(&format!(
            "Parallel group has {} jobs, above max_parallel_jobs={}; running all of them",
            plan.parallel.len(),
            cap
        ));
    }

    ctx.log.info(&format!("Phase 1: launching {} parallel scans", plan.parallel.len()));
    let handles: Vec<_> = plan
        .parallel
        .iter()
        .cloned()
        .map(|job| {
            let ctx = Arc::clone(ctx);
            let spec = job.spec;
            let handle = tokio::spawn(async move { run_job(&job, &ctx).await });
            (spec, handle)
        })
        .collect();

    let (specs, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
    let mut outcomes = Vec::with_capacity(JOBS.len());
    for (spec, joined) in specs.into_iter().zip(join_all(handles).await) {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                ctx.log.error(&format!("{} task aborted: {}", spec.name, e));
                outcomes.push(ScanOutcome {
                    job: spec.name.to_string(),
                    status: ScanStatus::Error,
                    output_path: path_for(&ctx.record, spec.category, spec.filename),
                    exit_code: None,
                    elapsed: Duration::ZERO,
                });
            }
        }
    }
    ctx.log.info("Phase 1 complete");

    ctx.log.info(&format!("Phase 2: running {} sequential scans", plan.sequential.len()));
    for job in &plan.sequential {
        outcomes.push(run_job(job, ctx).await);
    }
    ctx.log.info("Phase 2 complete");

    for spec in &plan.skipped {
        ctx.log.info(&format!("{} skipped: precondition not met", spec.name));
        outcomes.push(ScanOutcome::skipped(
            spec.name,
            path_for(&ctx.record, spec.category, spec.filename),
        ));
    }

    let order = |name: &str| JOBS.iter().position(|spec| spec.name == name).unwrap_or(usize::MAX);
    outcomes.sort_by_key(|outcome| order(&outcome.job));
    outcomes
}

async fn run_job(job: &PlannedJob, ctx: &RunContext) -> ScanOutcome {
    let spec = job.spec;
    let template = ctx.config.tools.template(spec.tool);
    let command_line = expand_template(template, &ctx.record.target, &job.argument);
    let output = path_for(&ctx.record, spec.category, spec.filename);
    let deadline = ctx.config.scan.timeout();

    ctx.log.info(&format!("{} started", spec.name));
    let outcome = command::run(spec.name, &command_line, &output, deadline, &ctx.tracker).await;
    match outcome.status {
        ScanStatus::Success => ctx.log.info(&format!(
            "{} completed in {:.1}s",
            spec.name,
            outcome.elapsed.as_secs_f64()
        )),
        ScanStatus::Timeout => ctx.log.warn(
            &ReconError::ScanTimeout {
                job: spec.name.to_string(),
                timeout_secs: deadline.as_secs(),
            }
            .to_string(),
        ),
        _ => ctx.log.error(
            &ReconError::ScanExecution {
                job: spec.name.to_string(),
                exit_code: outcome.exit_code,
                reason: match outcome.exit_code {
                    Some(_) => "non-zero exit".to_string(),
                    None => "could not run to completion".to_string(),
                },
            }
            .to_string(),
        ),
    }
    outcome
}

use crate::{
    cli::args::Cli,
    config::{ConfigLoader, GlobalConfig},
    core::{
        errors::ReconError,
        models::{ProbeResult, ProtocolStatus, RunRecord, ScanOutcome, Target},
        scheduler,
        state::RunContext,
    },
    executors::{toolchain, tracker::ProcessTracker},
    organizers::{archive, layout, retention::{self, RetentionReport}},
    plugins::{http_probe::{self, HttpProbe}, types::HttpCheck},
    reporters::{summary, writer},
    ui::printer,
    utils::{logging::RunLog, time},
};
use anyhow::Result;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

pub struct RunReport {
    pub record: RunRecord,
    pub protocols: ProtocolStatus,
    pub outcomes: Vec<ScanOutcome>,
    pub retention: RetentionReport,
    pub summary_path: PathBuf,
    pub log_path: PathBuf,
    pub archive_path: PathBuf,
}

pub async fn run(cli: Cli, tracker: ProcessTracker) -> Result<()> {
    tracing::info!("Starting recon-orchestrator for target: {}", cli.target);

    // Reject bad input before touching config or disk.
    let target = Target::parse(&cli.target)?;

    let mut config = ConfigLoader::load_with_custom_path(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    ConfigLoader::validate_config(&config)?;

    let prober = HttpProbe::new(&config.probe);
    let report = match &prober {
        Ok(prober) => orchestrate(target, config, Some(prober), tracker).await?,
        Err(e) => {
            tracing::error!("Cannot build HTTP client, treating both protocols as down: {:#}", e);
            orchestrate(target, config, None, tracker).await?
        }
    };

    printer::print_summary(&report);
    Ok(())
}

/// Top-level boundary: races the run against an operator abort. On any
/// failure every scan still running is killed before the error is returned.
pub async fn supervise<R, S>(run: R, shutdown: S, tracker: &ProcessTracker) -> Result<()>
where
    R: Future<Output = Result<()>>,
    S: Future<Output = &'static str>,
{
    let result = tokio::select! {
        res = run => res,
        signal = shutdown => {
            tracing::warn!("Received {}, aborting run", signal);
            Err(ReconError::Interrupted.into())
        }
    };

    if result.is_err() {
        let killed = tracker.kill_all();
        if killed > 0 {
            tracing::warn!("Terminated {} running scan(s)", killed);
        }
    }
    result
}

/// validate → create run → probe → parallel → sequential → summarize → retain → archive.
pub async fn orchestrate(
    target: Target,
    config: GlobalConfig,
    checker: Option<&dyn HttpCheck>,
    tracker: ProcessTracker,
) -> Result<RunReport> {
    let run_id = time::new_run_id();
    let record = layout::create_run(&config.output.base_dir, &target, &run_id)
        .map_err(|e| ReconError::orchestration("create run directory", format!("{:#}", e)))?;
    let log = RunLog::open(&record.run_dir.join(layout::LOG_FILE))
        .map_err(|e| ReconError::orchestration("open run log", format!("{:#}", e)))?;
    log.info(&format!("Scan of {} started, run {}", target, run_id));

    let missing = toolchain::missing_tools(&config.tools);
    if !missing.is_empty() {
        log.warn(&format!("Tools not found on PATH: {}", missing.join(", ")));
    }

    let protocols = match checker {
        Some(checker) => http_probe::probe_protocols(checker, &target, &log).await,
        None => ProtocolStatus {
            http: ProbeResult::failed("no HTTP client"),
            https: ProbeResult::failed("no HTTP client"),
        },
    };

    let plan = scheduler::schedule(&target, &protocols);
    log.info(&format!("Eligible scans: {}", plan.eligible_names().join(", ")));

    let ctx = Arc::new(RunContext {
        record,
        config,
        protocols,
        tracker,
        log,
    });
    let outcomes = scheduler::execute(&plan, &ctx).await;

    let artifact = summary::summarize(&ctx.record, &ctx.protocols, &outcomes)
        .map_err(|e| ReconError::orchestration("render summary", format!("{:#}", e)))?;
    let summary_path = writer::write_summary(&ctx.record, &artifact)
        .map_err(|e| ReconError::orchestration("write summary", format!("{:#}", e)))?;
    ctx.log.info(&format!("Summary written to {:?}", summary_path));

    let retention = match retention::enforce(&ctx.record.target_dir, ctx.config.retention.max_scans, &ctx.log) {
        Ok(report) => report,
        Err(e) => {
            ctx.log.warn(&format!("Retention skipped: {:#}", e));
            RetentionReport::default()
        }
    };

    let archive_path = match archive::create_archive(&ctx.record, &ctx.config.tools.tar).await {
        Ok(path) => path,
        Err(e) => {
            ctx.log.error(&e.to_string());
            return Err(e.into());
        }
    };
    ctx.log.info("Scan complete");

    Ok(RunReport {
        record: ctx.record.clone(),
        protocols: ctx.protocols.clone(),
        outcomes,
        retention,
        summary_path,
        log_path: ctx.log.path().to_path_buf(),
        archive_path,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::core::models::ScanStatus;
    use crate::executors::command;
    use std::time::Duration;
    use crate::organizers::layout::{read_history, read_latest};
    use async_trait::async_trait;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    struct HttpsOnly;

    #[async_trait]
    impl HttpCheck for HttpsOnly {
        fn name(&self) -> &'static str {
            "https_only"
        }

        async fn check(&self, url: &str) -> ProbeResult {
            if url.starts_with("https://") {
                ProbeResult::responded(200)
            } else {
                ProbeResult::failed("connect failed: Connection refused")
            }
        }
    }

    fn config_in(base: &Path) -> GlobalConfig {
        let mut config = GlobalConfig::default();
        config.output.base_dir = base.join("results");
        config
    }

    fn scripted_config(base: &Path) -> GlobalConfig {
        let order = base.join("order.log");
        let order = order.display();
        let mut config = config_in(base);
        let parallel = |name: &str| {
            format!("echo start {name} >> {order}; sleep 0.5; echo {name} {{target}}; echo end {name} >> {order}")
        };
        config.tools.dig = parallel("dig");
        config.tools.mail_probe = parallel("mail");
        config.tools.misc_probe = format!("echo start misc >> {order}; sleep 0.5; echo misc {{url}}; echo end misc >> {order}");
        config.tools.nmap = format!("echo seq nmap >> {order}; echo '443/tcp open https {{target}}'");
        config.tools.sslscan = format!("echo seq sslscan >> {order}; echo 'Vulnerable to BEAST {{target}}'");
        config.tools.testssl = format!("echo seq testssl >> {order}; echo 'all good {{target}}'");
        config.tools.nikto = format!("echo seq nikto >> {order}; echo '+ WARNING: outdated at {{url}}'");
        config.tools.dirb = format!("echo seq dirb >> {order}; echo 'dirb {{url}}'");
        config
    }

    #[tokio::test]
    async fn test_end_to_end_https_only() {
        let base = tempdir().unwrap();
        let config = scripted_config(base.path());
        let target = Target::parse("example.com").unwrap();

        let report = orchestrate(target, config, Some(&HttpsOnly), ProcessTracker::new()).await.unwrap();

        assert_eq!(report.outcomes.len(), 8);
        assert!(report.outcomes.iter().all(|o| o.status == ScanStatus::Success), "{:?}", report.outcomes);

        // Every parallel job starts before any finishes, and all finish before the heavy scans.
        let order = fs::read_to_string(base.path().join("order.log")).unwrap();
        let lines: Vec<_> = order.lines().collect();
        assert_eq!(lines.len(), 11);
        assert!(lines[..3].iter().all(|l| l.starts_with("start ")));
        assert!(lines[3..6].iter().all(|l| l.starts_with("end ")));
        assert_eq!(lines[6..], ["seq nmap", "seq sslscan", "seq testssl", "seq nikto", "seq dirb"]);

        let run_dir = &report.record.run_dir;
        let nikto = fs::read_to_string(run_dir.join("web/nikto_results.txt")).unwrap();
        assert!(nikto.contains("https://example.com"));

        let summary = fs::read_to_string(&report.summary_path).unwrap();
        assert!(summary.contains("HTTP状態: unavailable"));
        assert!(summary.contains("HTTPS状態: 200\n"));
        assert!(summary.contains("443/tcp open https example.com"));
        assert!(summary.contains("Vulnerable to BEAST example.com"));
        assert!(summary.contains("+ WARNING: outdated at https://example.com"));

        let log = fs::read_to_string(run_dir.join("scan_log.txt")).unwrap();
        // The default cap of 2 is informational only.
        assert!(log.contains("[INFO] Parallel group has 3 jobs, above max_parallel_jobs=2"));
        assert!(!log.contains("[WARN] Parallel group"));
        assert!(report.archive_path.is_file());
        assert_eq!(report.archive_path, PathBuf::from(format!("{}.tar.gz", run_dir.display())));
        assert_eq!(read_history(&report.record.target_dir).unwrap(), vec![report.record.run_id.clone()]);
        assert_eq!(read_latest(&report.record.target_dir), Some(report.record.run_id.clone()));
    }

    #[tokio::test]
    async fn test_all_scans_failing_still_summarizes_and_archives() {
        let base = tempdir().unwrap();
        let mut config = config_in(base.path());
        for template in [
            &mut config.tools.dig,
            &mut config.tools.mail_probe,
            &mut config.tools.misc_probe,
            &mut config.tools.nmap,
            &mut config.tools.sslscan,
            &mut config.tools.testssl,
            &mut config.tools.nikto,
            &mut config.tools.dirb,
        ] {
            *template = "exit 7; {target}".to_string();
        }
        let target = Target::parse("example.com").unwrap();

        let report = orchestrate(target, config, Some(&HttpsOnly), ProcessTracker::new()).await.unwrap();

        assert!(report.outcomes.iter().all(|o| o.status == ScanStatus::Error && o.exit_code == Some(7)));
        let summary = fs::read_to_string(&report.summary_path).unwrap();
        assert!(summary.contains("[network: open ports]\nnone found\n"));
        assert!(report.archive_path.is_file());

        let log = fs::read_to_string(&report.log_path).unwrap();
        assert!(log.contains("[ERROR] nmap_full failed (exit code Some(7)): non-zero exit"));
    }

    #[tokio::test]
    async fn test_timeout_does_not_cancel_siblings() {
        let base = tempdir().unwrap();
        let mut config = scripted_config(base.path());
        config.scan.timeout_secs = 1;
        config.tools.mail_probe = "sleep 10; echo {target}".to_string();
        let target = Target::parse("example.com").unwrap();

        let report = orchestrate(target, config, Some(&HttpsOnly), ProcessTracker::new()).await.unwrap();

        let status_of = |job: &str| report.outcomes.iter().find(|o| o.job == job).unwrap().status;
        assert_eq!(status_of("mail_ports"), ScanStatus::Timeout);
        assert_eq!(status_of("dns_records"), ScanStatus::Success);
        assert_eq!(status_of("nmap_full"), ScanStatus::Success);
        let log = fs::read_to_string(&report.log_path).unwrap();
        assert!(log.contains("[WARN] mail_ports timed out after 1s"));
    }

    #[tokio::test]
    async fn test_no_web_protocols_skips_heavy_scans() {
        let base = tempdir().unwrap();
        let config = scripted_config(base.path());
        let target = Target::parse("example.com").unwrap();

        let report = orchestrate(target, config, None, ProcessTracker::new()).await.unwrap();

        let skipped: Vec<_> = report
            .outcomes
            .iter()
            .filter(|o| o.status == ScanStatus::Skipped)
            .map(|o| o.job.as_str())
            .collect();
        assert_eq!(skipped, ["nmap_full", "sslscan", "testssl", "nikto", "dirb"]);
        let summary = fs::read_to_string(&report.summary_path).unwrap();
        assert!(!summary.contains("[network"));
        assert!(!summary.contains("[ssl"));
        assert!(summary.contains("nmap_full: skipped"));
    }

    #[tokio::test]
    async fn test_retention_applied_after_run() {
        let base = tempdir().unwrap();
        let config = scripted_config(base.path());
        let target_dir = config.output.base_dir.join("example.com");
        let old: Vec<String> = (1..=5).map(|i| format!("20000101_00000{}", i)).collect();
        for id in &old {
            fs::create_dir_all(target_dir.join(id)).unwrap();
        }
        layout::write_history(&target_dir, &old).unwrap();
        let target = Target::parse("example.com").unwrap();

        let report = orchestrate(target, config, Some(&HttpsOnly), ProcessTracker::new()).await.unwrap();

        let history = read_history(&target_dir).unwrap();
        assert_eq!(history.len(), 5);
        assert_eq!(history[..4], old[1..]);
        assert_eq!(history[4], report.record.run_id);
        assert!(!target_dir.join(&old[0]).exists());
        assert_eq!(report.retention.removed, vec![old[0].clone()]);
    }

    #[tokio::test]
    async fn test_archive_failure_is_fatal() {
        let base = tempdir().unwrap();
        let mut config = scripted_config(base.path());
        config.tools.tar = "false".to_string();
        let target = Target::parse("example.com").unwrap();

        let err = orchestrate(target, config, Some(&HttpsOnly), ProcessTracker::new())
            .await
            .err()
            .unwrap();

        assert_eq!(crate::core::errors::exit_code_for(&err), 1);
        assert!(err.to_string().contains("archive failed"));
    }

    #[tokio::test]
    async fn test_invalid_target_creates_nothing() {
        let base = tempdir().unwrap();
        let cli = Cli {
            target: "not a host".to_string(),
            config: None,
            base_dir: Some(base.path().join("results")),
            timeout: None,
            max_scans: None,
            max_parallel_jobs: None,
            verbose: false,
            debug: false,
        };

        let err = run(cli, ProcessTracker::new()).await.unwrap_err();

        assert_eq!(crate::core::errors::exit_code_for(&err), 2);
        assert!(!base.path().join("results").exists());
    }

    #[tokio::test]
    async fn test_abort_kills_detached_scans() {
        let dir = tempdir().unwrap();
        let pid_file = dir.path().join("scan.pid");
        let out = dir.path().join("out.txt");
        let tracker = ProcessTracker::new();

        let command_line = format!("sleep 30 & echo $! > {}; wait", pid_file.display());
        let job_tracker = tracker.clone();
        let run = async move {
            // Spawned like the parallel group, so dropping this future leaves it running.
            let _task = tokio::spawn(async move {
                command::run("slow", &command_line, &out, Duration::from_secs(60), &job_tracker).await
            });
            std::future::pending::<()>().await;
            Ok::<(), anyhow::Error>(())
        };
        let pid_path = pid_file.clone();
        let shutdown = async move {
            loop {
                let written = fs::read_to_string(&pid_path).unwrap_or_default();
                if written.trim().parse::<i32>().is_ok() {
                    return "SIGTERM";
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        };

        let err = supervise(run, shutdown, &tracker).await.unwrap_err();
        assert_eq!(crate::core::errors::exit_code_for(&err), 130);

        let pid: i32 = fs::read_to_string(&pid_file).unwrap().trim().parse().unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        let status = fs::read_to_string(format!("/proc/{pid}/status")).unwrap_or_default();
        assert!(
            status.is_empty() || status.contains("State:\tZ"),
            "scan outlived the aborted run"
        );
    }

    #[tokio::test]
    async fn test_successful_run_leaves_tracker_open() {
        let tracker = ProcessTracker::new();
        let shutdown = std::future::pending::<&'static str>();

        supervise(async { Ok::<(), anyhow::Error>(()) }, shutdown, &tracker).await.unwrap();

        let guard = tracker.track(u32::MAX);
        assert_eq!(tracker.active(), 1);
        guard.disarm();
    }
}

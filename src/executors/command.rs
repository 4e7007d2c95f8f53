use std::fs::File;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tokio::time::timeout;

use super::tracker::ProcessTracker;
use crate::core::models::{ScanOutcome, ScanStatus};

/// Runs `command` through `sh -c` in its own process group with stdout and
/// stderr both written to `output_path`. Never fails: spawn errors, non-zero
/// exits and deadline expiry all come back as a [`ScanOutcome`].
pub async fn run(
    job: &str,
    command: &str,
    output_path: &Path,
    deadline: Duration,
    tracker: &ProcessTracker,
) -> ScanOutcome {
    let start = Instant::now();
    let outcome = |status: ScanStatus, exit_code: Option<i32>| ScanOutcome {
        job: job.to_string(),
        status,
        output_path: output_path.to_path_buf(),
        exit_code,
        elapsed: start.elapsed(),
    };

    tracing::debug!("Executing {}: {}", job, command);

    let (stdout, stderr) = match open_output(output_path) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!("{}: cannot open {:?}: {}", job, output_path, e);
            return outcome(ScanStatus::Error, None);
        }
    };

    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr)
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            tracing::error!("{}: failed to spawn: {}", job, e);
            return outcome(ScanStatus::Error, None);
        }
    };

    let Some(pid) = child.id() else {
        // Already exited and reaped before we could look.
        return match child.wait().await {
            Ok(status) if status.success() => outcome(ScanStatus::Success, Some(0)),
            Ok(status) => outcome(ScanStatus::Error, status.code()),
            Err(_) => outcome(ScanStatus::Error, None),
        };
    };
    let guard = tracker.track(pid);

    match timeout(deadline, child.wait()).await {
        Ok(Ok(status)) => {
            // The shell is gone but stragglers in its group may linger.
            guard.kill();
            guard.disarm();
            if status.success() {
                outcome(ScanStatus::Success, Some(0))
            } else {
                tracing::warn!("{} exited with {:?}", job, status.code());
                outcome(ScanStatus::Error, status.code())
            }
        }
        Ok(Err(e)) => {
            tracing::error!("{}: wait failed: {}", job, e);
            drop(guard);
            outcome(ScanStatus::Error, None)
        }
        Err(_) => {
            tracing::warn!("{} timed out after {:?}, killing process group {}", job, deadline, pid);
            guard.kill();
            let _ = child.kill().await;
            guard.disarm();
            outcome(ScanStatus::Timeout, None)
        }
    }
}

fn open_output(path: &Path) -> std::io::Result<(Stdio, Stdio)> {
    let file = File::create(path)?;
    let err = file.try_clone()?;
    Ok((Stdio::from(file), Stdio::from(err)))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_success_captures_combined_output() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out.txt");
        std::fs::write(&out, "stale content that must go\n").unwrap();
        let tracker = ProcessTracker::new();

        let result = run("echo", "echo hello; echo oops >&2", &out, Duration::from_secs(5), &tracker).await;

        assert_eq!(result.status, ScanStatus::Success);
        assert_eq!(result.exit_code, Some(0));
        let text = std::fs::read_to_string(&out).unwrap();
        assert!(text.contains("hello"));
        assert!(text.contains("oops"));
        assert!(!text.contains("stale"));
        assert_eq!(tracker.active(), 0);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_error() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let tracker = ProcessTracker::new();

        let result = run("fail", "exit 3", &out, Duration::from_secs(5), &tracker).await;

        assert_eq!(result.status, ScanStatus::Error);
        assert_eq!(result.exit_code, Some(3));
    }

    #[tokio::test]
    async fn test_missing_tool_is_error_not_panic() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let tracker = ProcessTracker::new();

        let result = run("ghost", "definitely-not-a-real-tool-xyz example.com", &out, Duration::from_secs(5), &tracker).await;

        assert_eq!(result.status, ScanStatus::Error);
        assert_eq!(result.exit_code, Some(127));
    }

    #[tokio::test]
    async fn test_unwritable_output_is_error() {
        let tracker = ProcessTracker::new();
        let out = Path::new("/nonexistent-dir/out.txt");

        let result = run("echo", "echo hi", out, Duration::from_secs(5), &tracker).await;

        assert_eq!(result.status, ScanStatus::Error);
        assert_eq!(result.exit_code, None);
    }

    #[tokio::test]
    async fn test_timeout_kills_process_tree() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let pid_file = dir.path().join("grandchild.pid");
        let tracker = ProcessTracker::new();

        // The grandchild writes its pid and sleeps well past the deadline.
        let command = format!("sleep 30 & echo $! > {}; wait", pid_file.display());
        let result = run("slow", &command, &out, Duration::from_millis(500), &tracker).await;

        assert_eq!(result.status, ScanStatus::Timeout);
        assert_eq!(result.exit_code, None);
        assert_eq!(tracker.active(), 0);

        let pid: i32 = std::fs::read_to_string(&pid_file).unwrap().trim().parse().unwrap();
        // Give the kernel a moment to deliver SIGKILL; then the pid must be gone or a zombie.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let status = std::fs::read_to_string(format!("/proc/{pid}/status")).unwrap_or_default();
        assert!(
            status.is_empty() || status.contains("State:\tZ"),
            "sleep grandchild survived the timeout"
        );
    }
}

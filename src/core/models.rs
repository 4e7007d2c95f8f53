use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::errors::ReconError;

static TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9\-_.]+\.[A-Za-z]{2,}$").expect("target grammar is a valid regex")
});

/// A hostname-shaped scan target. Only constructed through [`Target::parse`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target(String);

impl Target {
    pub fn parse(raw: &str) -> Result<Self, ReconError> {
        if TARGET_RE.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ReconError::InvalidTarget(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Network,
    Web,
    Ssl,
    Dns,
    Mail,
    Misc,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Network,
        Category::Web,
        Category::Ssl,
        Category::Dns,
        Category::Mail,
        Category::Misc,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            Category::Network => "network",
            Category::Web => "web",
            Category::Ssl => "ssl",
            Category::Dns => "dns",
            Category::Mail => "mail",
            Category::Misc => "misc",
        }
    }
}

/// One invocation's place on disk.
#[derive(Clone, Debug)]
pub struct RunRecord {
    pub target: Target,
    pub run_id: String,
    pub target_dir: PathBuf, // <base>/<target>
    pub run_dir: PathBuf,    // <base>/<target>/<run_id>
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProbeResult {
    pub code: Option<u16>,
    /// Transport-level failure (DNS, refused, TLS, timeout). Distinct from an HTTP error status.
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn responded(code: u16) -> Self {
        Self { code: Some(code), error: None }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self { code: None, error: Some(reason.into()) }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_available(&self) -> bool {
        self.succeeded() && matches!(self.code, Some(200..=399))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProtocolStatus {
    pub http: ProbeResult,
    pub https: ProbeResult,
}

impl ProtocolStatus {
    pub fn http_available(&self) -> bool {
        self.http.is_available()
    }

    pub fn https_available(&self) -> bool {
        self.https.is_available()
    }

    pub fn any_web(&self) -> bool {
        self.http_available() || self.https_available()
    }

    /// Prefers plain HTTP; falls back to HTTPS only when HTTP is down.
    pub fn web_url(&self, target: &Target) -> Option<String> {
        if self.http_available() {
            Some(format!("http://{}", target))
        } else if self.https_available() {
            Some(format!("https://{}", target))
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Success,
    Timeout,
    Error,
    Skipped,
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScanStatus::Success => "success",
            ScanStatus::Timeout => "timeout",
            ScanStatus::Error => "error",
            ScanStatus::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug)]
pub struct ScanOutcome {
    pub job: String,
    pub status: ScanStatus,
    pub output_path: PathBuf,
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
}

impl ScanOutcome {
    pub fn skipped(job: &str, output_path: PathBuf) -> Self {
        Self {
            job: job.to_string(),
            status: ScanStatus::Skipped,
            output_path,
            exit_code: None,
            elapsed: Duration::ZERO,
        }
    }
}

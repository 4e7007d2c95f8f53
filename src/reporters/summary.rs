use std::fs;
use std::io::ErrorKind;
use std::sync::LazyLock;

use anyhow::Result;
use minijinja::{context, Environment};
use regex::Regex;
use serde::Serialize;

use crate::core::models::{Category, ProbeResult, ProtocolStatus, RunRecord, ScanOutcome};
use crate::organizers::layout::path_for;

pub const NONE_FOUND: &str = "none found";

const SUMMARY_TEMPLATE: &str = "\
=== Scan Summary ===
ターゲット: {{ target }}
スキャンID: {{ run_id }}
HTTP状態: {{ http }}
HTTPS状態: {{ https }}

[jobs]
{% for line in jobs %}
{{ line }}
{% endfor %}
{% for section in sections %}

[{{ section.title }}]
{% for line in section.lines %}
{{ line }}
{% else %}
{{ none_found }}
{% endfor %}
{% endfor %}
";

static OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new("open").expect("valid regex"));
static TLS_WEAKNESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("(?i)vulnerable|weak").expect("valid regex"));
static WEB_WARNING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("(?i)warning|vulnerable").expect("valid regex"));

struct SectionSpec {
    title: &'static str,
    files: &'static [(Category, &'static str)],
    pattern: &'static LazyLock<Regex>,
}

static SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        title: "network: open ports",
        files: &[(Category::Network, "nmap_results.txt")],
        pattern: &OPEN,
    },
    SectionSpec {
        title: "ssl: weak or vulnerable",
        files: &[(Category::Ssl, "sslscan_results.txt"), (Category::Ssl, "testssl_results.txt")],
        pattern: &TLS_WEAKNESS,
    },
    SectionSpec {
        title: "web: warnings",
        files: &[(Category::Web, "nikto_results.txt")],
        pattern: &WEB_WARNING,
    },
    SectionSpec {
        title: "mail: open ports",
        files: &[(Category::Mail, "mail_results.txt")],
        pattern: &OPEN,
    },
];

#[derive(Debug, Serialize)]
struct SectionView {
    title: &'static str,
    lines: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SummaryArtifact {
    pub text: String,
}

pub fn summarize(record: &RunRecord, status: &ProtocolStatus, outcomes: &[ScanOutcome]) -> Result<SummaryArtifact> {
    let jobs: Vec<String> = outcomes
        .iter()
        .map(|o| match o.exit_code {
            Some(code) if code != 0 => format!("{}: {} (exit {})", o.job, o.status, code),
            _ => format!("{}: {}", o.job, o.status),
        })
        .collect();

    let sections: Vec<SectionView> = SECTIONS
        .iter()
        .filter_map(|spec| render_section(record, spec))
        .collect();

    let mut env = Environment::new();
    env.set_trim_blocks(true);
    let template = env.template_from_str(SUMMARY_TEMPLATE)?;
    let text = template.render(context! {
        target => record.target.as_str(),
        run_id => &record.run_id,
        http => status_line(&status.http),
        https => status_line(&status.https),
        jobs => jobs,
        sections => sections,
        none_found => NONE_FOUND,
    })?;

    Ok(SummaryArtifact { text })
}

/// `None` when none of the section's files exist.
fn render_section(record: &RunRecord, spec: &SectionSpec) -> Option<SectionView> {
    let mut found_any = false;
    let mut lines = Vec::new();
    for (category, filename) in spec.files {
        let path = path_for(record, *category, filename);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => {
                tracing::warn!("Cannot read {:?} for summary: {}", path, e);
                continue;
            }
        };
        found_any = true;
        let text = String::from_utf8_lossy(&bytes);
        lines.extend(
            text.lines()
                .map(|line| line.trim_end_matches('\r'))
                .filter(|line| spec.pattern.is_match(line))
                .map(String::from),
        );
    }
    found_any.then_some(SectionView { title: spec.title, lines })
}

fn status_line(probe: &ProbeResult) -> String {
    match (&probe.error, probe.code) {
        (Some(reason), _) => format!("unavailable ({})", reason),
        (None, Some(code)) if probe.is_available() => code.to_string(),
        (None, Some(code)) => format!("{} (unavailable)", code),
        (None, None) => "unavailable".to_string(),
    }
}

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::core::jobs::Tool;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub concurrency: ConcurrencyConfig,
    pub scan: ScanConfig,
    pub retention: RetentionConfig,
    pub output: OutputConfig,
    pub probe: ProbeConfig,
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    /// Informational cap on the parallel group; exceeding it is only noted in the run log.
    pub max_parallel_jobs: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self { max_parallel_jobs: 2 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    pub timeout_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { timeout_secs: 600 }
    }
}

impl ScanConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub max_scans: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self { max_scans: 5 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub base_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { base_dir: PathBuf::from("scan_results") }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub timeout_secs: u64,
    pub accept_invalid_certs: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            accept_invalid_certs: false,
        }
    }
}

/// Command templates per external tool. `{target}` and `{url}` are substituted;
/// a template without placeholders gets the argument appended.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub dig: String,
    pub mail_probe: String,
    pub misc_probe: String,
    pub nmap: String,
    pub sslscan: String,
    pub testssl: String,
    pub nikto: String,
    pub dirb: String,
    pub tar: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            dig: "dig +noall +answer {target} ANY {target} TXT {target} MX".to_string(),
            mail_probe: "nmap -Pn -sV -p 25,465,587 {target}".to_string(),
            misc_probe: "curl -s -i -m 30 {url}/robots.txt; \
                         curl -s -i -m 30 {url}/sitemap.xml; \
                         curl -s -i -m 30 {url}/this-page-should-not-exist-404"
                .to_string(),
            nmap: "nmap -sV -sC -Pn {target}".to_string(),
            sslscan: "sslscan --no-colour {target}".to_string(),
            testssl: "testssl.sh --quiet --color 0 {target}".to_string(),
            nikto: "nikto -h {url}".to_string(),
            dirb: "dirb {url} -S -r".to_string(),
            tar: "tar".to_string(),
        }
    }
}

impl ToolsConfig {
    pub fn template(&self, tool: Tool) -> &str {
        match tool {
            Tool::Dig => &self.dig,
            Tool::MailProbe => &self.mail_probe,
            Tool::MiscProbe => &self.misc_probe,
            Tool::Nmap => &self.nmap,
            Tool::Sslscan => &self.sslscan,
            Tool::Testssl => &self.testssl,
            Tool::Nikto => &self.nikto,
            Tool::Dirb => &self.dirb,
        }
    }
}

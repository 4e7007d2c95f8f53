use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;

use crate::config::types::ProbeConfig;
use crate::core::errors::ReconError;
use crate::core::models::{ProbeResult, ProtocolStatus, Target};
use crate::plugins::types::HttpCheck;
use crate::utils::logging::RunLog;

pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(config: &ProbeConfig) -> anyhow::Result<Self> {
        // Redirects are not followed: a 3xx already proves the service answers.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(Policy::none())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .user_agent(concat!("recon-orchestrator/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpCheck for HttpProbe {
    fn name(&self) -> &'static str {
        "http_probe"
    }

    async fn check(&self, url: &str) -> ProbeResult {
        match self.client.get(url).send().await {
            Ok(response) => ProbeResult::responded(response.status().as_u16()),
            Err(e) => ProbeResult::failed(describe(&e)),
        }
    }
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "timed out".to_string()
    } else if err.is_connect() {
        // Walk to the innermost cause: DNS, refused or TLS handshake.
        let mut source: &dyn std::error::Error = err;
        while let Some(inner) = source.source() {
            source = inner;
        }
        format!("connect failed: {}", source)
    } else {
        err.to_string()
    }
}

/// Probes `http://` and `https://` concurrently. Completes before any scheduling.
pub async fn probe_protocols(checker: &dyn HttpCheck, target: &Target, log: &RunLog) -> ProtocolStatus {
    let http_url = format!("http://{}", target);
    let https_url = format!("https://{}", target);
    let (http, https) = tokio::join!(checker.check(&http_url), checker.check(&https_url));

    for (protocol, result) in [("http", &http), ("https", &https)] {
        match (&result.error, result.code) {
            (Some(reason), _) => {
                let err = ReconError::ProbeFailure { protocol, reason: reason.clone() };
                log.warn(&err.to_string());
            }
            (None, Some(code)) if !result.is_available() => {
                log.warn(&format!("{} answered {}, treating as unavailable", protocol, code));
            }
            (None, code) => log.info(&format!("{} probe via {}: {:?}", protocol, checker.name(), code)),
        }
    }

    ProtocolStatus { http, https }
}

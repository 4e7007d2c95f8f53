use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use super::types::GlobalConfig;
use crate::core::jobs::Tool;

const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "./recon.toml",
    "./config/recon.toml",
    "/etc/recon-orchestrator/recon.toml",
];

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a custom path, or from the default locations with fallbacks
    pub fn load_with_custom_path(custom_path: Option<&Path>) -> Result<GlobalConfig> {
        // An explicit path must exist; silently falling back would hide typos.
        if let Some(path) = custom_path {
            return Self::load_from_file(path)
                .with_context(|| format!("Failed to load config from custom path: {:?}", path));
        }

        for path in Self::candidate_paths() {
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from: {:?}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {:#}", path, e);
                        continue;
                    }
                }
            }
        }

        tracing::info!("No configuration file found, using default settings");
        Ok(GlobalConfig::default())
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = DEFAULT_CONFIG_PATHS[..2].iter().map(PathBuf::from).collect();
        if let Some(dirs) = ProjectDirs::from("io", "recon", "recon-orchestrator") {
            paths.push(dirs.config_dir().join("recon.toml"));
        }
        paths.push(PathBuf::from(DEFAULT_CONFIG_PATHS[2]));
        paths
    }

    /// Load configuration from a specific file
    fn load_from_file(path: &Path) -> Result<GlobalConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: GlobalConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {:?}", path))?;

        // Validated by the caller once CLI and env overrides are applied.
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate_config(config: &GlobalConfig) -> Result<()> {
        if config.concurrency.max_parallel_jobs == 0 {
            anyhow::bail!("max_parallel_jobs must be greater than 0");
        }

        if config.scan.timeout_secs == 0 {
            anyhow::bail!("scan timeout_secs must be greater than 0");
        }

        if config.probe.timeout_secs == 0 {
            anyhow::bail!("probe timeout_secs must be greater than 0");
        }

        if config.retention.max_scans == 0 {
            anyhow::bail!("max_scans must be greater than 0");
        }

        if config.output.base_dir.as_os_str().is_empty() {
            anyhow::bail!("output base_dir cannot be empty");
        }

        for tool in Tool::ALL {
            if config.tools.template(tool).trim().is_empty() {
                anyhow::bail!("{} command cannot be empty", tool.key());
            }
        }

        if config.tools.tar.trim().is_empty() {
            anyhow::bail!("tar command cannot be empty");
        }

        Ok(())
    }
}

//! Work components and their lifecycle
//!
//! A work component is a unit with a `mount` step (prepare, attach storage) and a
//! `run` step. Resource settings are a plain [`WorkConfig`] handed over at construction.
//!
//! Work configuration can be kept in the platform-specific app data folder:
//! - Linux: ~/.config/supabase-work/work.json
//! - Windows: %APPDATA%/supabase-work/work.json
//! - macOS: ~/Library/Application Support/supabase-work/work.json

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Compute resources requested for a work component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudCompute {
    /// Machine type name
    pub name: String,
    /// Disk size in GB
    pub disk_size: u32,
    /// Seconds of inactivity before the machine is stopped; `None` keeps it running
    pub idle_timeout: Option<u64>,
    /// Shared memory size in MB
    pub shm_size: u32,
    /// Whether a preemptible machine is acceptable
    pub interruptible: bool,
    pub internal_id: Option<String>,
}

impl Default for CloudCompute {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            disk_size: 0,
            idle_timeout: Some(60),
            shm_size: 0,
            interruptible: false,
            internal_id: None,
        }
    }
}

/// Construction-time settings of a work component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkConfig {
    /// Run without blocking the caller
    pub parallel: bool,
    /// Skip re-running with identical inputs
    pub cache_calls: bool,
    /// Propagate `run` failures instead of logging them
    pub raise_exception: bool,
    pub host: String,
    pub port: Option<u16>,
    pub start_with_flow: bool,
    pub local_build_config: Option<serde_json::Value>,
    pub cloud_build_config: Option<serde_json::Value>,
    pub cloud_compute: CloudCompute,
}

impl Default for WorkConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            cache_calls: true,
            raise_exception: true,
            host: "127.0.0.1".to_string(),
            port: None,
            start_with_flow: true,
            local_build_config: None,
            cloud_build_config: None,
            cloud_compute: CloudCompute::default(),
        }
    }
}

impl WorkConfig {
    /// Load from the default location, returning defaults if the file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from `path`, returning defaults if the file doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Work config {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read work config from {:?}", path))?;

        let config: WorkConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse work config from {:?}", path))?;

        tracing::info!(
            "Loaded work config: host={}, port={:?}, compute={}",
            config.host,
            config.port,
            config.cloud_compute.name
        );

        Ok(config)
    }

    /// Save to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize work config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write work config to {:?}", path))?;

        tracing::debug!("Saved work config to {:?}", path);

        Ok(())
    }

    /// Get the path to the default work config file
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "supabase-work", "supabase-work")
            .context("Failed to determine config directory")?;

        Ok(proj_dirs.config_dir().join("work.json"))
    }
}

/// A unit of work with a mount step and a run step
#[async_trait]
pub trait Work: Send {
    /// Attach external resources before running
    async fn mount(&mut self) -> Result<()>;

    /// Do the work
    async fn run(&mut self) -> Result<()>;

    fn config(&self) -> &WorkConfig;
}

/// Drive a work component: mount, then run.
///
/// A mount failure always propagates. A run failure propagates only when the
/// component's `raise_exception` is set; otherwise it is logged.
pub async fn launch<W: Work + ?Sized>(work: &mut W) -> Result<()> {
    let config = work.config();
    tracing::info!(
        host = %config.host,
        port = ?config.port,
        parallel = config.parallel,
        compute = %config.cloud_compute.name,
        "Launching work"
    );

    work.mount().await.context("Failed to mount work")?;

    match work.run().await {
        Ok(()) => {
            tracing::info!("Work finished");
            Ok(())
        }
        Err(err) if !work.config().raise_exception => {
            tracing::error!("Work failed: {:#}", err);
            Ok(())
        }
        Err(err) => Err(err),
    }
}

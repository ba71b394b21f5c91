//! Configuration loading, merging and validation.
//!
//! Values come from (highest precedence first) the command line, a YAML/JSON/TOML
//! config file, and the built-in defaults below.

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use proc_mem_plot::{ExtractionOptions, SamplingPlan};

use crate::cli::{Args, ConfigFormat, LogLevel};

// Default configuration constants
pub const DEFAULT_INTERVAL_MS: u64 = 100;
pub const DEFAULT_DURATION_MS: u64 = 10_000;
pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;

const DEFAULT_CONFIG_LOCATIONS: [&str; 4] = [
    "./proc-mem-plot.yaml",
    "./proc-mem-plot.yml",
    "./proc-mem-plot.json",
    "./proc-mem-plot.toml",
];

/// Effective configuration for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // Sampling
    #[serde(alias = "interval-ms")]
    pub interval_ms: Option<u64>,
    /// 0 = sample until the process exits
    #[serde(alias = "duration-ms")]
    pub duration_ms: Option<u64>,

    // Metric selection
    #[serde(alias = "plot-rss")]
    pub plot_rss: Option<bool>,
    #[serde(alias = "plot-vsz")]
    pub plot_vsz: Option<bool>,

    // Output
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub output: Option<PathBuf>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_ms: Some(DEFAULT_INTERVAL_MS),
            duration_ms: Some(DEFAULT_DURATION_MS),
            plot_rss: Some(true),
            plot_vsz: Some(false),
            width: Some(DEFAULT_WIDTH),
            height: Some(DEFAULT_HEIGHT),
            output: None,
            log_level: Some("info".into()),
        }
    }
}

impl Config {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS))
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms.unwrap_or(DEFAULT_DURATION_MS))
    }

    pub fn extraction_options(&self) -> ExtractionOptions {
        ExtractionOptions {
            rss: self.plot_rss.unwrap_or(true),
            vsz: self.plot_vsz.unwrap_or(false),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (
            self.width.unwrap_or(DEFAULT_WIDTH),
            self.height.unwrap_or(DEFAULT_HEIGHT),
        )
    }

    /// Output path, defaulting to `memplot-<pid>.svg`.
    pub fn output_path(&self, pid: u32) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("memplot-{}.svg", pid)))
    }

    /// Log level from the config file; unknown names fall back to info.
    pub fn log_level(&self) -> LogLevel {
        self.log_level
            .as_deref()
            .and_then(|s| LogLevel::from_str(s, true).ok())
            .unwrap_or(LogLevel::Info)
    }
}

/// Validate effective config (used by --check-config and before sampling)
pub fn validate_effective_config(cfg: &Config) -> Result<()> {
    SamplingPlan::new(cfg.interval(), cfg.duration())?;

    let (width, height) = cfg.size();
    if width == 0 || height == 0 {
        bail!("image size must be non-zero, got {}x{}", width, height);
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if LogLevel::from_str(level, true).is_err() {
            bail!(
                "Invalid log_level '{}', expected one of off, error, warn, info, debug, trace",
                level
            );
        }
    }

    let opts = cfg.extraction_options();
    if !(opts.rss || opts.vsz) {
        warn!("Both plot_rss and plot_vsz are disabled; the chart will contain only the grid");
    }

    Ok(())
}

/// Merge CLI arguments over the loaded (or default) config.
pub fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(interval) = args.interval {
        config.interval_ms = Some(whole_millis(interval).context("Invalid --interval")?);
    }
    if let Some(duration) = args.duration {
        config.duration_ms = Some(whole_millis(duration).context("Invalid --duration")?);
    }

    if args.no_rss {
        config.plot_rss = Some(false);
    }
    if args.vsz {
        config.plot_vsz = Some(true);
    }

    if args.width.is_some() {
        config.width = args.width;
    }
    if args.height.is_some() {
        config.height = args.height;
    }
    if args.output.is_some() {
        config.output = args.output.clone();
    }

    if let Some(level) = args.log_level {
        config.log_level = level
            .to_possible_value()
            .map(|v| v.get_name().to_string());
    }

    Ok(config)
}

fn whole_millis(d: Duration) -> Result<u64> {
    if d.subsec_nanos() % 1_000_000 != 0 {
        bail!("{:?} is not a whole number of milliseconds", d);
    }
    u64::try_from(d.as_millis()).with_context(|| format!("{:?} is too large", d))
}

/// Configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                bail!("Config file not found: {}", p.display());
            }
            p.to_path_buf()
        }
        None => match DEFAULT_CONFIG_LOCATIONS
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
        {
            Some(p) => p.to_path_buf(),
            None => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = parse_config(&content, &path)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Parses config text, choosing the format from `path`'s extension (YAML by default).
pub fn parse_config(content: &str, path: &Path) -> Result<Config> {
    let config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(content)?,
        Some("toml") => toml::from_str(content)?,
        _ => serde_yaml::from_str(content)?,
    };
    Ok(config)
}

/// Serializes a config in the requested format
pub fn render_config(config: &Config, format: ConfigFormat) -> Result<String> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

//! Config command implementation.
//!
//! Writes the default configuration in YAML, JSON or TOML.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates a configuration file populated with the built-in defaults.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<()> {
    let config = Config::default();
    let output = output.unwrap_or_else(|| PathBuf::from(default_file_name(format)));

    let mut content = render_config(&config, format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

fn default_file_name(format: ConfigFormat) -> &'static str {
    match format {
        ConfigFormat::Yaml => "proc-mem-plot.yaml",
        ConfigFormat::Json => "proc-mem-plot.json",
        ConfigFormat::Toml => "proc-mem-plot.toml",
    }
}

/// Adds comments to YAML configuration
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# proc-mem-plot Configuration
# ===========================
#
# Sampling
# --------
# interval_ms: 100             # Time between samples
# duration_ms: 10000           # Observation window (0 = until the process exits)
#
# Metric Selection
# ----------------
# plot_rss: true               # Plot resident set size (black)
# plot_vsz: false              # Plot virtual memory size (blue)
#
# Output
# ------
# width: 800                   # Image width in pixels
# height: 600                  # Image height in pixels
# output: null                 # Image path (null = memplot-<pid>.svg)
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
"#;

    format!("{comments}\n{yaml}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use tempfile::TempDir;

    #[test]
    fn test_generated_config_loads_back() {
        let dir = TempDir::new().unwrap();
        for format in [ConfigFormat::Yaml, ConfigFormat::Json, ConfigFormat::Toml] {
            let path = dir.path().join(default_file_name(format));
            command_config(Some(path.clone()), format, true).unwrap();
            assert_eq!(load_config(Some(&path)).unwrap(), Config::default());
        }
    }

    #[test]
    fn test_comments_only_prefix_yaml() {
        let out = add_config_comments("interval_ms: 100\n".into());
        assert!(out.starts_with("# proc-mem-plot Configuration"));
        assert!(out.ends_with("interval_ms: 100\n"));
    }
}

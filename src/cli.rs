//! CLI arguments and subcommands for proc-mem-plot.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "proc-mem-plot",
    about = "Sample a process's RSS/VSZ over time and plot it",
    long_about = "Sample a process's RSS/VSZ over time and plot it.\n\n\
                  Polls /proc/<pid> at a fixed interval for a fixed window (or until the \
                  process exits) and writes a line chart of resident and virtual memory \
                  size in kilobytes against elapsed seconds.",
    author = "Michael Moll <proc-mem@herakles.io> - Herakles IO",
    version,
    propagate_version = true,
    args_conflicts_with_subcommands = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// PID of the process to sample
    pub pid: Option<u32>,

    /// Time between samples (e.g. 100ms, 1s)
    #[arg(short = 'i', long, value_parser = parse_duration)]
    pub interval: Option<Duration>,

    /// Observation window (e.g. 10s, 2m); 0 samples until the process exits
    #[arg(short = 'd', long, value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Do not plot resident set size
    #[arg(long)]
    pub no_rss: bool,

    /// Plot virtual memory size
    #[arg(long)]
    pub vsz: bool,

    /// Output image path; the format follows the extension
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Image width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Image height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Log level (overrides config file)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that /proc is usable and optionally that a PID can be sampled
    Check {
        /// PID to probe once
        #[arg(short = 'p', long)]
        pid: Option<u32>,
    },

    /// Generate a configuration file with default values
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments (YAML only)
        #[arg(long)]
        commented: bool,
    },
}

/// Parses durations such as `250ms`, `1s`, `1.5s`, `2m`, `1h` or a bare number of seconds.
///
/// Fractions are allowed as long as they land on a whole millisecond.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    if number.is_empty() {
        return Err(format!("invalid duration '{}': missing number", input));
    }

    let millis_per_unit: u64 = match unit.trim() {
        "ms" => 1,
        "" | "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        other => {
            return Err(format!(
                "invalid duration '{}': unknown unit '{}' (use ms, s, m or h)",
                input, other
            ))
        }
    };

    if let Ok(whole) = number.parse::<u64>() {
        return whole
            .checked_mul(millis_per_unit)
            .map(Duration::from_millis)
            .ok_or_else(|| format!("invalid duration '{}': too large", input));
    }

    let value: f64 = number
        .parse()
        .map_err(|_| format!("invalid duration '{}'", input))?;
    let millis = value * millis_per_unit as f64;
    if !millis.is_finite() || millis >= u64::MAX as f64 {
        return Err(format!("invalid duration '{}': too large", input));
    }
    // Sampling settings are kept in whole milliseconds.
    let rounded = millis.round();
    if (millis - rounded).abs() > 1e-6 {
        return Err(format!(
            "invalid duration '{}': must be a whole number of milliseconds",
            input
        ));
    }
    Ok(Duration::from_millis(rounded as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("100ms").unwrap(), Duration::from_millis(100));
        assert_eq!(parse_duration("1s").unwrap(), Duration::from_secs(1));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration(" 1.5s ").unwrap(), Duration::from_millis(1500));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("ms").is_err());
        assert!(parse_duration("10 parsecs").is_err());
        assert!(parse_duration("1.2.3s").is_err());
    }

    #[test]
    fn test_parse_duration_rejects_sub_millisecond() {
        assert!(parse_duration("0.5ms").is_err());
        assert!(parse_duration("1.0005s").is_err());
        assert_eq!(parse_duration("0.25s").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("1.1s").unwrap(), Duration::from_millis(1100));
        assert_eq!(parse_duration("0.5m").unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn test_args_parse_sampling_flags() {
        let args = Args::try_parse_from([
            "proc-mem-plot",
            "4242",
            "-i",
            "250ms",
            "-d",
            "0",
            "--vsz",
            "-o",
            "out.svg",
        ])
        .unwrap();

        assert_eq!(args.pid, Some(4242));
        assert_eq!(args.interval, Some(Duration::from_millis(250)));
        assert_eq!(args.duration, Some(Duration::ZERO));
        assert!(args.vsz);
        assert!(!args.no_rss);
        assert_eq!(args.output, Some(PathBuf::from("out.svg")));
        assert!(args.command.is_none());
    }

    #[test]
    fn test_args_parse_subcommand() {
        let args =
            Args::try_parse_from(["proc-mem-plot", "config", "--format", "toml", "-o", "-"])
                .unwrap();
        match args.command {
            Some(Commands::Config { output, format, .. }) => {
                assert_eq!(output, Some(PathBuf::from("-")));
                assert!(matches!(format, ConfigFormat::Toml));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}

// proc-mem-plot - version 0.1.0
// Process memory sampler and plotter with tracing logging
mod cli;
mod commands;
mod config;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{debug, level_filters::LevelFilter, Subscriber};
use tracing_subscriber::fmt::MakeWriter;

use crate::cli::{Args, Commands, LogLevel};
use crate::commands::{command_check, command_config, command_record};
use crate::config::{render_config, resolve_config, validate_effective_config, Config};

fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}

fn build_subscriber<W>(level: LogLevel, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_max_level(level_filter(level))
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish()
}

/// Initializes tracing logging subsystem with the effective log level.
///
/// Logs go to stderr so chart paths and config dumps on stdout stay clean.
fn setup_logging(level: LogLevel) {
    let subscriber = build_subscriber(level, std::io::stderr);

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    debug!("Logging initialized with level: {:?}", level);
}

/// Resolves the effective config while logging at the command-line level.
///
/// The config file may change the level, so the global subscriber can only
/// be installed afterwards.
fn resolve_config_logged<W>(args: &Args, writer: W) -> Result<Config>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let bootstrap = build_subscriber(args.log_level.unwrap_or(LogLevel::Info), writer);
    tracing::subscriber::with_default(bootstrap, || resolve_config(args))
}

/// -------------------------------------------------------------------
/// MAIN APPLICATION ENTRY POINT
/// -------------------------------------------------------------------
fn main() -> Result<()> {
    let args = Args::parse();

    let config = resolve_config_logged(&args, std::io::stderr)?;
    setup_logging(config.log_level());

    if args.check_config {
        if let Err(e) = validate_effective_config(&config) {
            eprintln!("❌ Configuration invalid: {:#}", e);
            std::process::exit(1);
        }
        println!("✅ Configuration is valid");
        return Ok(());
    }

    if args.show_config {
        println!("{}", render_config(&config, args.config_format)?);
        return Ok(());
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        return match command {
            Commands::Check { pid } => command_check(*pid, &config),
            Commands::Config {
                output,
                format,
                commented,
            } => command_config(output.clone(), *format, *commented),
        };
    }

    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {:#}", e);
        std::process::exit(1);
    }

    let Some(pid) = args.pid else {
        bail!("a PID to sample is required (see --help)");
    };

    command_record(pid, &config)
}

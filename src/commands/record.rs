//! Default command: sample one process and write its memory chart.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use proc_mem_plot::{compose_chart, sample_process};

use crate::config::Config;

/// Samples `pid` with the effective config and saves the chart.
pub fn command_record(pid: u32, config: &Config) -> Result<()> {
    let interval = config.interval();
    let duration = config.duration();
    let output = config.output_path(pid);
    let (width, height) = config.size();

    if duration.is_zero() {
        info!("Sampling pid {} every {:?} until it exits", pid, interval);
    } else {
        info!("Sampling pid {} every {:?} for {:?}", pid, interval, duration);
    }

    let collection = sample_process(pid, interval, duration)
        .with_context(|| format!("Sampling pid {} failed", pid))?;
    info!(
        "Collected {} samples from pid {} (started {})",
        collection.len(),
        pid,
        collection.start_time().to_rfc3339()
    );
    if collection.is_empty() {
        warn!("Process {} was not running; the chart will be empty", pid);
    }

    let chart = compose_chart(&collection, config.extraction_options())
        .context("Failed to build chart")?;
    debug!(
        "Chart has {} series: {:?}",
        chart.lines().len(),
        chart.legend().iter().map(|e| e.label.as_str()).collect::<Vec<_>>()
    );

    chart
        .save(width, height, &output)
        .with_context(|| format!("Failed to save chart to {}", output.display()))?;

    println!(
        "✅ {} samples of pid {} plotted to: {}",
        collection.len(),
        pid,
        output.display()
    );
    Ok(())
}

//! proc-mem-plot library.
//!
//! Samples a process's resident and virtual memory size and thread count at a
//! fixed interval, then charts the samples against elapsed time.
//!
//! ```no_run
//! use std::path::Path;
//! use std::time::Duration;
//! use proc_mem_plot::{compose_chart, sample_process, ExtractionOptions};
//!
//! # fn main() -> proc_mem_plot::Result<()> {
//! let coll = sample_process(1234, Duration::from_millis(100), Duration::from_secs(5))?;
//! let chart = compose_chart(&coll, ExtractionOptions { rss: true, vsz: true })?;
//! chart.save(800, 600, Path::new("memplot-1234.svg"))?;
//! # Ok(())
//! # }
//! ```

pub mod chart;
pub mod collection;
pub mod error;
pub mod process;
pub mod render;
pub mod sampler;
pub mod series;

pub use chart::{compose_chart, Chart, LegendEntry, Line, LineStyle, Rgb};
pub use collection::{Collection, Sample};
pub use error::{PlotError, Result};
pub use process::{MemoryInfo, ProcProcess, ProcessProbe};
pub use render::{ChartRenderer, ImageFormat, PlottersRenderer};
pub use sampler::{sample_process, Clock, Sampler, SamplingPlan, SystemClock};
pub use series::{rss_points, vsz_points, ExtractionOptions, Point};

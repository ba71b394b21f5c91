//! Error type shared by the sampling, charting and rendering layers.
//!
//! Every failure is terminal for the operation that raised it; nothing in the
//! library retries or logs errors on the caller's behalf.

use std::fmt;
use std::io;

/// Errors raised while sampling a process or producing its chart.
#[derive(Debug)]
pub enum PlotError {
    /// Sampling parameters rejected before any process query.
    InvalidConfig(String),
    /// The pid did not resolve to a process at start.
    ProcessNotFound(u32),
    /// A liveness, memory or thread query failed mid-run.
    Introspection { pid: u32, source: io::Error },
    /// A /proc file was readable but did not have the expected shape.
    Parse { pid: u32, file: &'static str, reason: String },
    /// The chart could not be built or drawn.
    Render(String),
    /// The output extension maps to no enabled backend.
    UnsupportedFormat(String),
    /// Writing the image failed.
    Io(io::Error),
}

impl fmt::Display for PlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlotError::InvalidConfig(reason) => write!(f, "configuration invalid: {}", reason),
            PlotError::ProcessNotFound(pid) => write!(f, "process not found: pid {}", pid),
            PlotError::Introspection { pid, source } => {
                write!(f, "failed to query process {}: {}", pid, source)
            }
            PlotError::Parse { pid, file, reason } => {
                write!(f, "failed to parse /proc/{}/{}: {}", pid, file, reason)
            }
            PlotError::Render(reason) => write!(f, "failed to render chart: {}", reason),
            PlotError::UnsupportedFormat(ext) => {
                write!(f, "unsupported image format: {:?}", ext)
            }
            PlotError::Io(err) => write!(f, "failed to write chart: {}", err),
        }
    }
}

impl std::error::Error for PlotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlotError::Introspection { source, .. } => Some(source),
            PlotError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for PlotError {
    fn from(err: io::Error) -> Self {
        PlotError::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, PlotError>;

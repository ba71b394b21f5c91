//! Per-process introspection from the /proc filesystem.
//!
//! `ProcessProbe` is the capability the sampler depends on. `ProcProcess`
//! implements it by reading `/proc/<pid>/{stat,statm,status}`; the root is
//! injectable so tests can point it at a fake tree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::{PlotError, Result};

const DEFAULT_PROC_ROOT: &str = "/proc";
const FALLBACK_PAGE_SIZE: u64 = 4096;

/// Memory footprint of a process in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryInfo {
    pub rss: u64,
    pub vms: u64,
}

/// Live queries against a single process.
///
/// Any query may fail once the process has exited; callers treat that as fatal.
pub trait ProcessProbe {
    fn pid(&self) -> u32;
    fn is_running(&self) -> Result<bool>;
    fn memory_info(&self) -> Result<MemoryInfo>;
    fn num_threads(&self) -> Result<u32>;
}

/// A process resolved under a /proc mount.
#[derive(Debug, Clone)]
pub struct ProcProcess {
    pid: u32,
    proc_path: PathBuf,
    page_size: u64,
}

impl ProcProcess {
    /// Resolves `pid` under `/proc`.
    pub fn open(pid: u32) -> Result<Self> {
        Self::open_in(Path::new(DEFAULT_PROC_ROOT), pid)
    }

    /// Resolves `pid` under an arbitrary /proc-shaped root.
    pub fn open_in(root: &Path, pid: u32) -> Result<Self> {
        let proc_path = root.join(pid.to_string());
        if !proc_path.is_dir() {
            return Err(PlotError::ProcessNotFound(pid));
        }
        Ok(Self {
            pid,
            proc_path,
            page_size: system_page_size(),
        })
    }

    /// Overrides the page size used to convert statm pages to bytes.
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    fn read(&self, file: &str) -> Result<String> {
        fs::read_to_string(self.proc_path.join(file)).map_err(|source| {
            PlotError::Introspection {
                pid: self.pid,
                source,
            }
        })
    }
}

impl ProcessProbe for ProcProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn is_running(&self) -> Result<bool> {
        let content = match fs::read_to_string(self.proc_path.join("stat")) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(source) => {
                return Err(PlotError::Introspection {
                    pid: self.pid,
                    source,
                })
            }
        };

        let state = parse_stat_state(&content).ok_or_else(|| PlotError::Parse {
            pid: self.pid,
            file: "stat",
            reason: "missing state field".into(),
        })?;
        trace!("pid {} state {}", self.pid, state);

        // Zombies keep their /proc entry until reaped but no longer run.
        Ok(!matches!(state, 'Z' | 'X' | 'x'))
    }

    fn memory_info(&self) -> Result<MemoryInfo> {
        let content = self.read("statm")?;
        let (size_pages, resident_pages) =
            parse_statm(&content).ok_or_else(|| PlotError::Parse {
                pid: self.pid,
                file: "statm",
                reason: format!("expected at least 2 page counts, got {:?}", content.trim()),
            })?;

        Ok(MemoryInfo {
            rss: resident_pages * self.page_size,
            vms: size_pages * self.page_size,
        })
    }

    fn num_threads(&self) -> Result<u32> {
        let content = self.read("status")?;
        parse_threads(&content).ok_or_else(|| PlotError::Parse {
            pid: self.pid,
            file: "status",
            reason: "missing Threads line".into(),
        })
    }
}

/// Returns the system page size, or 4096 if sysconf fails.
pub fn system_page_size() -> u64 {
    let raw = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if raw > 0 {
        raw as u64
    } else {
        FALLBACK_PAGE_SIZE
    }
}

/// Extracts the state character from /proc/<pid>/stat.
///
/// The command name is wrapped in parentheses and may itself contain spaces
/// or parentheses, so the state is read after the last ')'.
pub fn parse_stat_state(content: &str) -> Option<char> {
    let after_comm = &content[content.rfind(')')? + 1..];
    after_comm.split_whitespace().next()?.chars().next()
}

/// Parses the first two fields of /proc/<pid>/statm: (size, resident) in pages.
pub fn parse_statm(content: &str) -> Option<(u64, u64)> {
    let mut parts = content.split_whitespace();
    let size = parts.next()?.parse().ok()?;
    let resident = parts.next()?.parse().ok()?;
    Some((size, resident))
}

/// Reads the `Threads:` value from /proc/<pid>/status.
pub fn parse_threads(content: &str) -> Option<u32> {
    content
        .lines()
        .find_map(|line| line.strip_prefix("Threads:"))
        .and_then(|v| v.trim().parse().ok())
}

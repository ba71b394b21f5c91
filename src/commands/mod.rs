//! CLI command implementations for proc-mem-plot.
//!
//! - `record`: sample a process and write its chart (default mode)
//! - `check`: system validation
//! - `config`: configuration file generation

pub mod check;
pub mod config;
pub mod record;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use record::command_record;

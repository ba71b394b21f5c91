//! Check command implementation.
//!
//! Validates that /proc can be read and, optionally, that a PID can be sampled.

use anyhow::{bail, Result};
use std::path::Path;

use proc_mem_plot::{ProcProcess, ProcessProbe};

use crate::config::{validate_effective_config, Config};

/// Runs system checks and prints a summary.
pub fn command_check(pid: Option<u32>, config: &Config) -> Result<()> {
    println!("🔍 proc-mem-plot - System Check");
    println!("===============================");

    let mut all_ok = true;

    println!("\n📁 Checking /proc filesystem...");
    if Path::new("/proc").exists() {
        println!("   ✅ /proc filesystem accessible");
    } else {
        println!("   ❌ /proc filesystem not found");
        all_ok = false;
    }

    println!("\n💾 Checking self introspection...");
    all_ok &= probe_once(std::process::id());

    if let Some(pid) = pid {
        println!("\n🎯 Checking pid {}...", pid);
        all_ok &= probe_once(pid);
    }

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(()) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - ready to sample");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review the output above");
        bail!("system check failed")
    }
}

/// Runs each probe query once, printing the outcome.
fn probe_once(pid: u32) -> bool {
    let probe = match ProcProcess::open(pid) {
        Ok(p) => p,
        Err(e) => {
            println!("   ❌ {}", e);
            return false;
        }
    };

    match probe.is_running() {
        Ok(true) => println!("   ✅ Process {} is running", pid),
        Ok(false) => {
            println!("   ❌ Process {} is not running", pid);
            return false;
        }
        Err(e) => {
            println!("   ❌ Liveness check failed: {}", e);
            return false;
        }
    }

    let memory = match probe.memory_info() {
        Ok(m) => m,
        Err(e) => {
            println!("   ❌ Memory query failed: {}", e);
            return false;
        }
    };
    let threads = match probe.num_threads() {
        Ok(t) => t,
        Err(e) => {
            println!("   ❌ Thread query failed: {}", e);
            return false;
        }
    };

    println!(
        "   ✅ RSS={}KB, VSZ={}KB, threads={}",
        memory.rss / 1024,
        memory.vms / 1024,
        threads
    );
    true
}

//! Check command implementation.
//!
//! Validates host counter access, configuration and InfluxDB connectivity.

use std::path::Path;

use node_metrics_sampler::config::validate_effective_config;
use node_metrics_sampler::{capture, connect, Config, HostSource, ProcSource, DISK_PATH};

/// Runs all checks; exits with status 1 when any of them fails.
pub async fn command_check(offline: bool, config: &Config) -> anyhow::Result<()> {
    println!("🔍 Node Metrics Sampler - System Check");
    println!("======================================");

    let mut all_ok = true;
    let source = ProcSource::new();

    println!("\n📁 Checking /proc filesystem...");
    if Path::new("/proc").exists() {
        println!("   ✅ /proc filesystem accessible");
    } else {
        println!("   ❌ /proc filesystem not found");
        all_ok = false;
    }

    println!("\n📊 Checking host counters...");
    match source.hostname() {
        Ok(hostname) => println!("   ✅ Hostname: {}", hostname),
        Err(e) => {
            println!("   ❌ Hostname lookup failed: {}", e);
            all_ok = false;
        }
    }
    match capture(&source) {
        Ok(snapshot) => {
            println!(
                "   ✅ Snapshot captured: mem {} MB used, disk {} {:.1}% used",
                snapshot.mem_used / 1024 / 1024,
                DISK_PATH,
                snapshot.disk_used_pct
            );
        }
        Err(e) => {
            println!("   ❌ Snapshot capture failed: {}", e);
            all_ok = false;
        }
    }

    println!("\n⚙️  Checking configuration...");
    let sink_config = match validate_effective_config(config) {
        Ok(()) => {
            println!("   ✅ Configuration is valid");
            config.sink_config().ok()
        }
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
            None
        }
    };

    if offline {
        println!("\n🌐 Skipping InfluxDB connectivity check (--offline)");
    } else if let Some(sink_config) = sink_config {
        println!("\n🌐 Checking InfluxDB at {}...", sink_config.address);
        match connect(&sink_config).await {
            Ok(_) => println!("   ✅ InfluxDB reachable"),
            Err(e) => {
                println!("   ❌ {}", e);
                all_ok = false;
            }
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - sampler is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review the output above");
        std::process::exit(1);
    }
}

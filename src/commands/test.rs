//! Test command implementation.
//!
//! Captures snapshots and prints them without touching InfluxDB.

use anyhow::Context;
use chrono::Utc;
use std::time::Instant;

use node_metrics_sampler::{
    build_point, capture, HostSource, Precision, ProcSource, SAMPLE_INTERVAL,
};

/// Captures `iterations` snapshots one sample interval apart.
pub async fn command_test(iterations: usize, verbose: bool) -> anyhow::Result<()> {
    println!("🧪 Node Metrics Sampler - Test Mode");
    println!("===================================");

    let source = ProcSource::new();
    let hostname = source.hostname().context("Failed to resolve hostname")?;

    for iteration in 1..=iterations {
        println!("\n🔄 Iteration {}/{}:", iteration, iterations);

        let start = Instant::now();
        let snapshot = capture(&source).context("Failed to capture snapshot")?;
        println!(
            "   ⏱️  Capture duration: {:.2}ms",
            start.elapsed().as_secs_f64() * 1000.0
        );
        println!("{}", serde_json::to_string_pretty(&snapshot)?);

        if verbose {
            match build_point(&snapshot, &hostname, Utc::now()) {
                Ok(point) => println!("   📝 {}", point.to_line(Precision::Seconds)),
                Err(e) => println!("   ❌ Point rejected: {}", e),
            }
        }

        if iteration < iterations {
            tokio::time::sleep(SAMPLE_INTERVAL).await;
        }
    }

    println!("\n✅ Test completed successfully");
    Ok(())
}

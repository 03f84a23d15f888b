//! Sampling loop and publisher.
//!
//! The sampler owns the sink session for its whole lifetime. Each cycle
//! resolves the hostname, captures a snapshot, turns it into one
//! `node_metrics` point, writes it as a single-point batch and prints the
//! snapshot as a JSON line. Hostname and collection failures are fatal;
//! rejected points and failed writes are logged and the loop carries on.

use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{PointError, SamplerError};
use crate::point::{BatchPoints, Point, Precision};
use crate::sink::{InfluxClient, Sink, SinkConfig};
use crate::snapshot::{self, Snapshot};
use crate::source::HostSource;

/// Database the points are written to.
pub const DATABASE: &str = "metrics";

/// Measurement name of every point.
pub const MEASUREMENT: &str = "node_metrics";

/// Pause between two cycles.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Lifecycle of the sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SamplerState {
    /// Session open, database not yet ensured.
    Connecting,
    /// Between cycles.
    Ready,
    /// Inside a cycle.
    Publishing,
    /// A fatal error occurred. Terminal.
    Failed,
}

/// What happened to the point of one cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Written,
    Rejected(PointError),
    WriteFailed(String),
}

/// Result of one successful cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub snapshot: Snapshot,
    pub point: Option<Point>,
    pub delivery: Delivery,
}

/// Counters over a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub cycles: u64,
    pub written: u64,
    pub rejected: u64,
    pub failed_writes: u64,
}

impl RunSummary {
    fn record(&mut self, report: &CycleReport) {
        self.cycles += 1;
        match report.delivery {
            Delivery::Written => self.written += 1,
            Delivery::Rejected(_) => self.rejected += 1,
            Delivery::WriteFailed(_) => self.failed_writes += 1,
        }
    }
}

/// Opens the InfluxDB session. Any failure is a fatal connection error.
pub async fn connect(config: &SinkConfig) -> Result<InfluxClient, SamplerError> {
    InfluxClient::connect(config)
        .await
        .map_err(SamplerError::Connection)
}

/// Opens the InfluxDB session unless `shutdown` fires first, in which case
/// `Ok(None)` is returned and no session is left behind.
pub async fn connect_or_cancel(
    config: &SinkConfig,
    shutdown: &CancellationToken,
) -> Result<Option<InfluxClient>, SamplerError> {
    tokio::select! {
        result = connect(config) => result.map(Some),
        _ = shutdown.cancelled() => {
            info!("Shutdown requested while connecting to {}", config.address);
            Ok(None)
        }
    }
}

/// Builds the point published for `snapshot`.
pub fn build_point(
    snapshot: &Snapshot,
    hostname: &str,
    time: chrono::DateTime<Utc>,
) -> Result<Point, PointError> {
    let tags = BTreeMap::from([("hostname".to_string(), hostname.to_string())]);
    let fields = snapshot
        .fields()
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    Point::new(MEASUREMENT, tags, fields, time)
}

/// Periodic sampler writing to a sink and echoing each snapshot to `output`.
pub struct Sampler<S, K, W> {
    source: S,
    sink: K,
    output: W,
    interval: Duration,
    state: SamplerState,
}

impl<S, K, W> Sampler<S, K, W>
where
    S: HostSource,
    K: Sink,
    W: Write,
{
    /// `sink` must be an open session.
    pub fn new(source: S, sink: K, output: W) -> Self {
        Self {
            source,
            sink,
            output,
            interval: SAMPLE_INTERVAL,
            state: SamplerState::Connecting,
        }
    }

    /// Overrides the pause between cycles.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    fn fail(&mut self, err: SamplerError) -> SamplerError {
        self.state = SamplerState::Failed;
        err
    }

    fn ensure_not_failed(&self) -> Result<(), SamplerError> {
        if self.state == SamplerState::Failed {
            return Err(SamplerError::Terminated);
        }
        Ok(())
    }

    /// Ensures the target database exists.
    pub async fn prepare(&mut self) -> Result<(), SamplerError> {
        self.ensure_not_failed()?;

        if let Err(e) = self.sink.ensure_database(DATABASE).await {
            return Err(self.fail(SamplerError::Schema(e)));
        }

        info!("Database '{}' ready", DATABASE);
        self.state = SamplerState::Ready;
        Ok(())
    }

    /// Runs one capture-and-publish cycle.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, SamplerError> {
        self.ensure_not_failed()?;
        self.state = SamplerState::Publishing;

        let hostname = match self.source.hostname() {
            Ok(hostname) => hostname,
            Err(e) => return Err(self.fail(SamplerError::Hostname(e))),
        };

        let snapshot = match snapshot::capture(&self.source) {
            Ok(snapshot) => snapshot,
            Err(e) => return Err(self.fail(SamplerError::Collection(e))),
        };

        let (point, delivery) = match build_point(&snapshot, &hostname, Utc::now()) {
            Ok(point) => {
                let mut batch = BatchPoints::new(DATABASE, Precision::Seconds);
                batch.add_point(point.clone());

                match self.sink.write(&batch).await {
                    Ok(()) => (Some(point), Delivery::Written),
                    Err(e) => {
                        error!("Failed to write point: {}", e);
                        (Some(point), Delivery::WriteFailed(e.to_string()))
                    }
                }
            }
            Err(e) => {
                error!("Failed to build point: {}", e);
                (None, Delivery::Rejected(e))
            }
        };

        self.emit(&snapshot);
        self.state = SamplerState::Ready;

        Ok(CycleReport {
            snapshot,
            point,
            delivery,
        })
    }

    fn emit(&mut self, snapshot: &Snapshot) {
        let line = match serde_json::to_string(snapshot) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to serialize snapshot: {}", e);
                return;
            }
        };

        if let Err(e) = writeln!(self.output, "{}", line).and_then(|_| self.output.flush()) {
            warn!("Failed to write cycle output: {}", e);
        }
    }

    /// Ensures the database if needed, then samples until `shutdown` is
    /// cancelled or a fatal error occurs. The sink is closed either way.
    ///
    /// A sampler that has failed once never runs again.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<RunSummary, SamplerError> {
        if let Err(e) = self.ensure_not_failed() {
            self.sink.close().await;
            return Err(e);
        }

        if self.state == SamplerState::Connecting {
            let prepared = tokio::select! {
                biased;
                result = self.prepare() => Some(result),
                _ = shutdown.cancelled() => None,
            };

            match prepared {
                Some(Ok(())) => {}
                Some(Err(e)) => {
                    self.sink.close().await;
                    return Err(e);
                }
                None => {
                    info!("Shutdown requested before the database was ready");
                    self.sink.close().await;
                    return Ok(RunSummary::default());
                }
            }
        }

        info!(
            interval_ms = self.interval.as_millis() as u64,
            "Starting sampling loop"
        );

        let mut summary = RunSummary::default();
        let result = loop {
            if shutdown.is_cancelled() {
                break Ok(());
            }

            match self.run_cycle().await {
                Ok(report) => {
                    summary.record(&report);
                    debug!(cycle = summary.cycles, delivery = ?report.delivery, "Cycle complete");
                }
                Err(e) => break Err(e),
            }

            tokio::select! {
                _ = shutdown.cancelled() => break Ok(()),
                _ = tokio::time::sleep(self.interval) => {}
            }
        };

        self.sink.close().await;

        match result {
            Ok(()) => {
                info!(
                    cycles = summary.cycles,
                    written = summary.written,
                    rejected = summary.rejected,
                    failed_writes = summary.failed_writes,
                    "Sampling loop stopped"
                );
                Ok(summary)
            }
            Err(e) => Err(e),
        }
    }
}

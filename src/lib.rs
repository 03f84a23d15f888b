//! Node Metrics Sampler Library
//!
//! Samples host resource counters (CPU, memory, swap, disk and network) once
//! per second and writes them as `node_metrics` points into InfluxDB.
//!
//! # Components
//!
//! - **Snapshot builder** ([`snapshot::capture`]): reads every counter once
//!   through a [`HostSource`] and returns a [`Snapshot`]
//! - **Sampler** ([`Sampler`]): owns the sink session, ensures the database,
//!   and runs the capture → publish → sleep cycle until cancelled
//!
//! Both the host and the database sit behind traits ([`HostSource`],
//! [`Sink`]) so the loop can be driven by fakes.
//!
//! # Usage
//!
//! ```no_run
//! use node_metrics_sampler::{connect, ProcSource, Sampler, SinkConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let sink = connect(&SinkConfig::new("http://localhost:8086")).await?;
//! let mut sampler = Sampler::new(ProcSource::new(), sink, std::io::stdout());
//!
//! let summary = sampler.run(CancellationToken::new()).await?;
//! println!("{} cycles", summary.cycles);
//! # Ok(())
//! # }
//! ```

pub mod collectors;
pub mod config;
pub mod error;
pub mod point;
pub mod sampler;
pub mod sink;
pub mod snapshot;
pub mod source;

// Re-export main types for convenience
pub use config::{Config, ConfigFormat};
pub use error::{CollectionError, PointError, SamplerError, SinkError, SourceError};
pub use point::{BatchPoints, FieldValue, Point, Precision};
pub use sampler::{
    build_point, connect, connect_or_cancel, CycleReport, Delivery, RunSummary, Sampler,
    SamplerState, DATABASE, MEASUREMENT, SAMPLE_INTERVAL,
};
pub use sink::{InfluxClient, Sink, SinkConfig};
pub use snapshot::{capture, Snapshot, DISK_PATH};
pub use source::{HostSource, ProcSource};

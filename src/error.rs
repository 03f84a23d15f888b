//! Error types for the sampler.
//!
//! Fatal errors (`SamplerError`) end the process; point construction and
//! write errors are logged by the sampling loop and the cycle is dropped.

use std::io;

/// Failure of a single host-counter read.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("{call} failed for {path}: {source}")]
    Syscall {
        call: &'static str,
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("no entries reported by {0}")]
    Empty(&'static str),

    #[error("hostname unavailable: {0}")]
    Hostname(String),
}

/// A fatal counter read while building a snapshot.
#[derive(Debug, thiserror::Error)]
#[error("{counter} collection failed: {source}")]
pub struct CollectionError {
    pub counter: &'static str,
    #[source]
    pub source: SourceError,
}

/// Rejected point: the sink could not accept it as constructed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PointError {
    #[error("measurement name is empty")]
    EmptyMeasurement,

    #[error("point has no fields")]
    NoFields,

    #[error("empty {0} key")]
    EmptyKey(&'static str),

    #[error("field {key} is not a finite float")]
    NonFiniteFloat { key: String },

    #[error("field {key} value {value} does not fit a signed 64-bit integer")]
    IntegerOverflow { key: String, value: u64 },
}

/// Errors talking to InfluxDB.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("invalid sink address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("sink rejected credentials ({status})")]
    Unauthorized { status: u16 },

    #[error("{endpoint} returned HTTP {status}: {message}")]
    Status {
        endpoint: &'static str,
        status: u16,
        message: String,
    },

    #[error("sink reported an error: {0}")]
    Response(String),
}

/// Errors that stop the sampling loop. Rejected points and failed writes
/// are reported per cycle and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum SamplerError {
    #[error("connection error: {0}")]
    Connection(#[source] SinkError),

    #[error("schema error: {0}")]
    Schema(#[source] SinkError),

    #[error("hostname error: {0}")]
    Hostname(#[source] SourceError),

    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error("sampler already failed and cannot be restarted")]
    Terminated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_error_names_counter() {
        let err = CollectionError {
            counter: "disk",
            source: SourceError::Empty("statvfs"),
        };
        assert_eq!(
            err.to_string(),
            "disk collection failed: no entries reported by statvfs"
        );
    }

    #[test]
    fn test_sampler_error_messages() {
        let err = SamplerError::Hostname(SourceError::Hostname("EINVAL".into()));
        assert!(err.to_string().starts_with("hostname error:"));

        let err = SamplerError::Schema(SinkError::Response("database name required".into()));
        assert!(err.to_string().contains("database name required"));

        assert_eq!(
            SamplerError::Terminated.to_string(),
            "sampler already failed and cannot be restarted"
        );
    }
}

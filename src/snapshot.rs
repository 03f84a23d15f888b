//! Metric snapshot builder.
//!
//! A [`Snapshot`] is one point-in-time read of the host counters. It is
//! built once per sampling cycle and never reused.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::error::{CollectionError, SourceError};
use crate::point::FieldValue;
use crate::source::HostSource;

/// Mount point whose usage is reported.
pub const DISK_PATH: &str = "/";

/// Host resource usage at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub disk_total: u64,
    pub disk_used: u64,
    pub disk_free: u64,
    pub disk_used_pct: f64,

    pub mem_total: u64,
    pub mem_used: u64,
    pub mem_free: u64,

    pub swap_total: u64,
    pub swap_used: u64,
    pub swap_free: u64,

    /// System-mode CPU time of the aggregate CPU, in seconds.
    pub cpu_usage: f64,

    pub net_rx_bytes: u64,
    pub net_tx_bytes: u64,
}

impl Snapshot {
    /// Flattens the snapshot into a point field set. Byte counters stay
    /// unsigned integers, ratios stay floats.
    pub fn fields(&self) -> BTreeMap<&'static str, FieldValue> {
        let uint = |key: &'static str, v: u64| (key, FieldValue::UInteger(v));
        let float = |key: &'static str, v: f64| (key, FieldValue::Float(v));

        BTreeMap::from([
            uint("disk_total", self.disk_total),
            uint("disk_used", self.disk_used),
            uint("disk_free", self.disk_free),
            float("disk_used_pct", self.disk_used_pct),
            uint("mem_total", self.mem_total),
            uint("mem_used", self.mem_used),
            uint("mem_free", self.mem_free),
            uint("swap_total", self.swap_total),
            uint("swap_used", self.swap_used),
            uint("swap_free", self.swap_free),
            float("cpu_usage", self.cpu_usage),
            uint("net_rx_bytes", self.net_rx_bytes),
            uint("net_tx_bytes", self.net_tx_bytes),
        ])
    }
}

/// Reads every counter once and assembles a snapshot.
///
/// Memory and swap are best effort: a failed read is logged and the fields
/// stay zero. CPU, disk and network failures abort the capture.
pub fn capture<S: HostSource + ?Sized>(source: &S) -> Result<Snapshot, CollectionError> {
    let mut snapshot = Snapshot::default();

    match source.virtual_memory() {
        Ok(vm) => {
            snapshot.mem_total = vm.total;
            snapshot.mem_used = vm.used;
            snapshot.mem_free = vm.free;
        }
        Err(e) => warn!("Memory stats unavailable, reporting zero: {}", e),
    }

    match source.swap_memory() {
        Ok(swap) => {
            snapshot.swap_total = swap.total;
            snapshot.swap_used = swap.used;
            snapshot.swap_free = swap.free;
        }
        Err(e) => warn!("Swap stats unavailable, reporting zero: {}", e),
    }

    let cpu = source
        .cpu_times()
        .map_err(|e| CollectionError {
            counter: "cpu",
            source: e,
        })?
        .into_iter()
        .next()
        .ok_or(CollectionError {
            counter: "cpu",
            source: SourceError::Empty("cpu times"),
        })?;
    snapshot.cpu_usage = cpu.system;

    let disk = source.disk_usage(DISK_PATH).map_err(|e| CollectionError {
        counter: "disk",
        source: e,
    })?;
    snapshot.disk_total = disk.total;
    snapshot.disk_used = disk.used;
    snapshot.disk_free = disk.free;
    snapshot.disk_used_pct = disk.used_percent;

    let net = source
        .net_io_counters()
        .map_err(|e| CollectionError {
            counter: "network",
            source: e,
        })?
        .into_iter()
        .next()
        .ok_or(CollectionError {
            counter: "network",
            source: SourceError::Empty("network counters"),
        })?;
    snapshot.net_rx_bytes = net.bytes_recv;
    snapshot.net_tx_bytes = net.bytes_sent;

    debug!(
        cpu = %cpu.cpu,
        net = %net.name,
        disk = %disk.path,
        "Snapshot captured"
    );

    Ok(snapshot)
}

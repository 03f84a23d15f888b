//! Network interface counters from /proc/net/dev.

use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::error::SourceError;

/// Cumulative I/O counters for one interface, or for all of them summed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetIoCounters {
    pub name: String,
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
    pub errin: u64,
    pub errout: u64,
    pub dropin: u64,
    pub dropout: u64,
}

/// Parses /proc/net/dev into per-interface counters, in file order.
pub fn parse_netdev(content: &str) -> Vec<NetIoCounters> {
    let mut counters = Vec::new();

    // Skip the two header lines
    for line in content.lines().skip(2) {
        let Some((interface, stats)) = line.split_once(':') else {
            continue;
        };

        let values: Vec<u64> = stats
            .split_whitespace()
            .map(|v| v.parse().unwrap_or(0))
            .collect();
        if values.len() < 16 {
            continue;
        }

        counters.push(NetIoCounters {
            name: interface.trim().to_string(),
            bytes_recv: values[0],
            packets_recv: values[1],
            errin: values[2],
            dropin: values[3],
            bytes_sent: values[8],
            packets_sent: values[9],
            errout: values[10],
            dropout: values[11],
        });
    }

    counters
}

/// Sums per-interface counters into a single entry named `all`. Sums
/// saturate at `u64::MAX`.
pub fn aggregate(per_interface: &[NetIoCounters]) -> NetIoCounters {
    let all = NetIoCounters {
        name: "all".to_string(),
        ..Default::default()
    };

    per_interface.iter().fold(all, |mut acc, c| {
        acc.bytes_sent = acc.bytes_sent.saturating_add(c.bytes_sent);
        acc.bytes_recv = acc.bytes_recv.saturating_add(c.bytes_recv);
        acc.packets_sent = acc.packets_sent.saturating_add(c.packets_sent);
        acc.packets_recv = acc.packets_recv.saturating_add(c.packets_recv);
        acc.errin = acc.errin.saturating_add(c.errin);
        acc.errout = acc.errout.saturating_add(c.errout);
        acc.dropin = acc.dropin.saturating_add(c.dropin);
        acc.dropout = acc.dropout.saturating_add(c.dropout);
        acc
    })
}

/// Reads /proc/net/dev and returns the all-interface aggregate as the only
/// entry.
pub fn read_net_io_counters(path: &Path) -> Result<Vec<NetIoCounters>, SourceError> {
    let content = fs::read_to_string(path).map_err(|e| SourceError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let per_interface = parse_netdev(&content);
    if per_interface.is_empty() {
        return Err(SourceError::Empty("/proc/net/dev"));
    }

    Ok(vec![aggregate(&per_interface)])
}

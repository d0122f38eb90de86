// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! System memory probe backed by `free -m -w`.

use crate::command::{CommandRunner, CommandSpec};
use crate::errors::ProbeError;

const FREE_PROGRAM: &str = "free";
const FREE_ARGS: [&str; 2] = ["-m", "-w"];

const MEM_LABEL: &str = "Mem:";
const SWAP_LABEL: &str = "Swap:";

/// Column names contributed by this probe, in persisted order.
pub const COLUMNS: [&str; 11] = [
    "total",
    "used",
    "free",
    "shared",
    "buffers",
    "cache",
    "bufferscache",
    "available",
    "swapTotal",
    "swapUsed",
    "swapFree",
];

/// System memory figures in MiB. The default value is the degraded
/// all-zero snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemorySnapshot {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub shared: u64,
    pub buffers: u64,
    pub cache: u64,
    pub buffers_cache: u64,
    pub available: u64,
    pub swap_total: u64,
    pub swap_used: u64,
    pub swap_free: u64,
}

impl MemorySnapshot {
    /// Values in the order of [`COLUMNS`].
    pub fn values(&self) -> [u64; COLUMNS.len()] {
        [
            self.total,
            self.used,
            self.free,
            self.shared,
            self.buffers,
            self.cache,
            self.buffers_cache,
            self.available,
            self.swap_total,
            self.swap_used,
            self.swap_free,
        ]
    }
}

pub fn free_command() -> CommandSpec {
    CommandSpec::new(FREE_PROGRAM, &FREE_ARGS)
}

pub async fn probe(runner: &dyn CommandRunner) -> Result<MemorySnapshot, ProbeError> {
    let spec = free_command();
    let output = runner.run(&spec).await?;
    parse_free_output(&output, &spec.to_string())
}

/// Parse the wide, MiB-scaled output of `free`.
///
/// ```text
///                total        used        free      shared     buffers       cache   available
/// Mem:           15876        6014        2517         688         512        6832        8840
/// Swap:           2047           0        2047
/// ```
///
/// Returns `NoOutput` when neither labelled line is present. A labelled line
/// with missing or non-numeric fields is `Malformed`.
pub fn parse_free_output(output: &str, command: &str) -> Result<MemorySnapshot, ProbeError> {
    let mut snapshot = MemorySnapshot::default();
    let mut matched = false;

    for line in output.lines() {
        if let Some(rest) = line.strip_prefix(MEM_LABEL) {
            let [total, used, free, shared, buffers, cache, available] =
                parse_fields::<7>(rest, MEM_LABEL, command)?;
            snapshot.total = total;
            snapshot.used = used;
            snapshot.free = free;
            snapshot.shared = shared;
            snapshot.buffers = buffers;
            snapshot.cache = cache;
            snapshot.available = available;
            matched = true;
        } else if let Some(rest) = line.strip_prefix(SWAP_LABEL) {
            let [total, used, free] = parse_fields::<3>(rest, SWAP_LABEL, command)?;
            snapshot.swap_total = total;
            snapshot.swap_used = used;
            snapshot.swap_free = free;
            matched = true;
        }
    }

    if !matched {
        return Err(ProbeError::NoOutput {
            command: command.to_string(),
        });
    }

    snapshot.buffers_cache = snapshot.buffers + snapshot.cache;
    Ok(snapshot)
}

/// Read the first `N` whitespace-separated fields of a labelled line.
fn parse_fields<const N: usize>(
    rest: &str,
    label: &str,
    command: &str,
) -> Result<[u64; N], ProbeError> {
    let mut values = [0u64; N];
    let mut fields = rest.split_whitespace();
    for (idx, slot) in values.iter_mut().enumerate() {
        let field = fields.next().ok_or_else(|| ProbeError::Malformed {
            command: command.to_string(),
            context: format!("`{label}` line has {idx} fields, expected at least {N}"),
        })?;
        *slot = field.parse().map_err(|e| ProbeError::Malformed {
            command: command.to_string(),
            context: format!("`{label}` field {idx} ({field:?}): {e}"),
        })?;
    }
    Ok(values)
}

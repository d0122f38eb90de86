// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Per-process resident memory, reduced to an overall total and one total per
//! configured bucket.
//!
//! Known limitation: pages shared between processes (shared libraries,
//! copy-on-write pages inherited by forked children, explicit shared memory)
//! are part of every sharing process's RSS and are therefore counted once per
//! process. The totals are an upper bound, not a de-duplicated figure.

use crate::config::Bucket;
use crate::errors::ProbeError;
use log::trace;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

pub const TOTAL_COLUMN: &str = "userTotal";

const BYTES_PER_MIB: u64 = 1024 * 1024;

/// One process as seen during a single tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    /// Arguments joined by single spaces.
    pub cmdline: String,
    /// `None` when the resident set size could not be read.
    pub rss_bytes: Option<u64>,
}

/// Source of the live process table. Implementations must return a fresh
/// view on every call.
pub trait ProcessSource: Send {
    fn snapshot(&mut self) -> Result<Vec<ProcessEntry>, ProbeError>;
}

pub struct SysinfoProcessSource {
    system: System,
}

impl SysinfoProcessSource {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SysinfoProcessSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSource for SysinfoProcessSource {
    fn snapshot(&mut self) -> Result<Vec<ProcessEntry>, ProbeError> {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing()
                .with_memory()
                .with_cmd(UpdateKind::Always),
        );

        let entries: Vec<ProcessEntry> = self
            .system
            .processes()
            .values()
            // Threads share their leader's address space.
            .filter(|p| p.thread_kind().is_none())
            .map(|p| ProcessEntry {
                cmdline: p
                    .cmd()
                    .iter()
                    .map(|arg| arg.to_string_lossy())
                    .collect::<Vec<_>>()
                    .join(" "),
                rss_bytes: Some(p.memory()),
            })
            .collect();

        if entries.is_empty() {
            return Err(ProbeError::ProcessTable {
                context: "no processes visible".to_string(),
            });
        }
        Ok(entries)
    }
}

/// Aggregated resident memory in MiB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessTotals {
    pub total: u64,
    /// One value per bucket, in bucket order.
    pub buckets: Vec<u64>,
}

impl ProcessTotals {
    pub fn zeroed(bucket_count: usize) -> Self {
        Self {
            total: 0,
            buckets: vec![0; bucket_count],
        }
    }
}

/// Truncating conversion, applied per process before summing.
pub fn bytes_to_mib(bytes: u64) -> u64 {
    bytes / BYTES_PER_MIB
}

pub fn aggregate(entries: &[ProcessEntry], buckets: &[Bucket]) -> ProcessTotals {
    let mut totals = ProcessTotals::zeroed(buckets.len());

    for entry in entries {
        let rss = match entry.rss_bytes {
            Some(rss) if rss > 0 => rss,
            // Exited mid-scan, kernel thread, or no permission.
            _ => continue,
        };
        let mib = bytes_to_mib(rss);
        totals.total += mib;

        for (slot, bucket) in totals.buckets.iter_mut().zip(buckets) {
            if bucket.matches(&entry.cmdline) {
                *slot += mib;
            }
        }
    }

    trace!(
        "aggregated {} process(es): total={} MiB buckets={:?}",
        entries.len(),
        totals.total,
        totals.buckets
    );
    totals
}

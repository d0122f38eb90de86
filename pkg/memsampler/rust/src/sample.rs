// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::command::CommandRunner;
use crate::config::Bucket;
use crate::disk;
use crate::errors::ProbeError;
use crate::memory::{self, MemorySnapshot};
use crate::process::{self, ProcessSource, ProcessTotals};
use log::warn;
use std::path::PathBuf;

/// Bump whenever the column layout below changes.
pub const SCHEMA_VERSION: u32 = 1;

pub const TIMESTAMP_COLUMN: &str = "date";

/// Column names that do not depend on the bucket list.
pub const FIXED_COLUMNS: [&str; 14] = [
    TIMESTAMP_COLUMN,
    process::TOTAL_COLUMN,
    memory::COLUMNS[0],
    memory::COLUMNS[1],
    memory::COLUMNS[2],
    memory::COLUMNS[3],
    memory::COLUMNS[4],
    memory::COLUMNS[5],
    memory::COLUMNS[6],
    memory::COLUMNS[7],
    memory::COLUMNS[8],
    memory::COLUMNS[9],
    memory::COLUMNS[10],
    disk::COLUMN,
];

/// The persisted column layout:
/// `date, userTotal, <buckets...>, <memory...>, <swap...>, disk`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    pub fn new(buckets: &[Bucket]) -> Self {
        let mut columns = vec![
            TIMESTAMP_COLUMN.to_string(),
            process::TOTAL_COLUMN.to_string(),
        ];
        columns.extend(buckets.iter().map(|b| b.name.clone()));
        columns.extend(memory::COLUMNS.iter().map(|c| c.to_string()));
        columns.push(disk::COLUMN.to_string());
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

/// One row of the log, alive only for the tick that built it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub timestamp: String,
    pub processes: ProcessTotals,
    pub memory: MemorySnapshot,
    pub disk_mib: u64,
}

impl Sample {
    pub fn to_record(&self) -> Vec<String> {
        let mut record = Vec::with_capacity(self.processes.buckets.len() + FIXED_COLUMNS.len());
        record.push(self.timestamp.clone());
        record.push(self.processes.total.to_string());
        record.extend(self.processes.buckets.iter().map(u64::to_string));
        record.extend(self.memory.values().iter().map(u64::to_string));
        record.push(self.disk_mib.to_string());
        record
    }
}

/// Runs the probes for one tick and composes their results into a [`Sample`].
pub struct SampleAssembler {
    runner: Box<dyn CommandRunner>,
    processes: Box<dyn ProcessSource>,
    buckets: Vec<Bucket>,
    disk_path: PathBuf,
}

impl SampleAssembler {
    pub fn new(
        runner: Box<dyn CommandRunner>,
        processes: Box<dyn ProcessSource>,
        buckets: Vec<Bucket>,
        disk_path: PathBuf,
    ) -> Self {
        Self {
            runner,
            processes,
            buckets,
            disk_path,
        }
    }

    pub fn schema(&self) -> Schema {
        Schema::new(&self.buckets)
    }

    /// Probes run in column order. A transient probe failure zeroes only that
    /// probe's fields; a malformed output is returned as an error.
    pub async fn assemble(&mut self, timestamp: String) -> Result<Sample, ProbeError> {
        let processes = match self.processes.snapshot() {
            Ok(entries) => process::aggregate(&entries, &self.buckets),
            Err(e) => {
                degrade("process", e)?;
                ProcessTotals::zeroed(self.buckets.len())
            }
        };

        let memory = match memory::probe(self.runner.as_ref()).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                degrade("memory", e)?;
                MemorySnapshot::default()
            }
        };

        let disk_mib = match disk::probe(self.runner.as_ref(), &self.disk_path).await {
            Ok(mib) => mib,
            Err(e) => {
                degrade("disk", e)?;
                0
            }
        };

        Ok(Sample {
            timestamp,
            processes,
            memory,
            disk_mib,
        })
    }
}

fn degrade(probe: &str, err: ProbeError) -> Result<(), ProbeError> {
    if !err.is_transient() {
        return Err(err);
    }
    warn!("{probe} probe failed, recording zeros for this tick: {err}");
    Ok(())
}

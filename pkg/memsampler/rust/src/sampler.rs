// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::command::CommandRunner;
use crate::config::SamplerConfig;
use crate::errors::SamplerError;
use crate::log_writer::LogWriter;
use crate::process::ProcessSource;
use crate::sample::{SCHEMA_VERSION, SampleAssembler};
use crate::state::SamplerState;
use log::{debug, info, warn};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};
use tokio::time::{MissedTickBehavior, interval};

/// Local wall-clock time at second resolution, e.g. `2026-10-16 12:00:00`.
pub const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

pub trait Clock: Send {
    fn now(&mut self) -> OffsetDateTime;
}

/// Reads the system clock in the local offset determined at construction.
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    /// Falls back to UTC when the local offset cannot be determined, which
    /// the `time` crate refuses to do once other threads are running.
    pub fn new() -> Self {
        let offset = UtcOffset::current_local_offset().unwrap_or_else(|e| {
            warn!("local UTC offset unavailable ({e}), timestamps will be in UTC");
            UtcOffset::UTC
        });
        Self { offset }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&mut self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

/// The sampling loop: one row per interval until shutdown or a fatal error.
pub struct Sampler {
    output: PathBuf,
    interval: Duration,
    assembler: SampleAssembler,
    clock: Box<dyn Clock>,
    state: SamplerState,
    last_timestamp: Option<PrimitiveDateTime>,
}

impl Sampler {
    pub fn new(
        config: &SamplerConfig,
        runner: Box<dyn CommandRunner>,
        processes: Box<dyn ProcessSource>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            output: config.output.clone(),
            interval: config.interval,
            assembler: SampleAssembler::new(
                runner,
                processes,
                config.buckets.clone(),
                config.disk_path.clone(),
            ),
            clock,
            state: SamplerState::Initializing,
            last_timestamp: None,
        }
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    /// Sample until `shutdown` resolves. Returns the number of rows appended.
    ///
    /// `shutdown` is only polled between ticks, so a tick that has started
    /// always finishes with its row written.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) -> Result<u64, SamplerError> {
        let schema = self.assembler.schema();
        let mut log = match LogWriter::open(&self.output, &schema) {
            Ok(log) => log,
            Err(e) => {
                self.transition(SamplerState::Stopped);
                return Err(e.into());
            }
        };
        // Rows appended on resume must not go before what is already there.
        self.last_timestamp = self.last_timestamp.max(log.last_timestamp());
        info!(
            "sampling every {}s into {} ({} columns, schema v{SCHEMA_VERSION})",
            self.interval.as_secs(),
            log.path().display(),
            schema.width()
        );
        self.transition(SamplerState::Sampling);

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let result = loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break Ok(()),
                _ = ticker.tick() => {}
            }
            if let Err(e) = self.tick(&mut log).await {
                break Err(e);
            }
        };

        self.transition(SamplerState::Stopped);
        info!(
            "sampler stopped after {} row(s) in {}",
            log.rows_written(),
            log.path().display()
        );
        result.map(|()| log.rows_written())
    }

    async fn tick(&mut self, log: &mut LogWriter) -> Result<(), SamplerError> {
        let timestamp = self.next_timestamp().format(TIMESTAMP_FORMAT)?;
        let sample = self.assembler.assemble(timestamp).await?;
        log.append(&sample.to_record())?;
        Ok(())
    }

    /// Current local time, held at the previous value if the clock stepped back.
    fn next_timestamp(&mut self) -> PrimitiveDateTime {
        let now = self.clock.now();
        let mut current = PrimitiveDateTime::new(now.date(), now.time());
        if let Some(last) = self.last_timestamp
            && current < last
        {
            warn!("wall clock moved backwards from {last} to {current}, reusing previous timestamp");
            current = last;
        }
        self.last_timestamp = Some(current);
        current
    }

    fn transition(&mut self, next: SamplerState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid transition {} -> {next}",
            self.state
        );
        debug!("sampler {} -> {next}", self.state);
        self.state = next;
    }
}

// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Test doubles shared by the unit tests.

use crate::command::{CommandRunner, CommandSpec};
use crate::errors::ProbeError;
use crate::process::{ProcessEntry, ProcessSource};
use crate::sampler::Clock;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use time::{Duration, OffsetDateTime};

enum Scripted {
    Output(String),
    Exit { code: i32, stderr: String },
}

/// Answers commands by program name. Unscripted programs behave like a
/// missing binary.
#[derive(Default)]
pub struct FakeRunner {
    scripts: HashMap<String, Scripted>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(mut self, program: &str, stdout: &str) -> Self {
        self.scripts
            .insert(program.to_string(), Scripted::Output(stdout.to_string()));
        self
    }

    pub fn exit(mut self, program: &str, code: i32, stderr: &str) -> Self {
        self.scripts.insert(
            program.to_string(),
            Scripted::Exit {
                code,
                stderr: stderr.to_string(),
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<String, ProbeError> {
        self.calls.lock().unwrap().push(spec.clone());
        match self.scripts.get(&spec.program) {
            Some(Scripted::Output(stdout)) => Ok(stdout.clone()),
            Some(Scripted::Exit { code, stderr }) => Err(ProbeError::Failed {
                command: spec.to_string(),
                code: Some(*code),
                stderr: stderr.clone(),
            }),
            None => Err(ProbeError::Spawn {
                command: spec.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
        }
    }
}

/// `free -m -w` text with the given Mem: figures and an all-zero Swap: line.
pub fn free_output(
    total: u64,
    used: u64,
    free: u64,
    shared: u64,
    buffers: u64,
    cache: u64,
    available: u64,
) -> String {
    format!(
        "               total        used        free      shared     buffers       cache   available\n\
         Mem:    {total:>12}{used:>12}{free:>12}{shared:>12}{buffers:>12}{cache:>12}{available:>12}\n\
         Swap:              0           0           0\n"
    )
}

/// Returns the same process list on every tick, or fails every tick.
pub struct StaticProcesses {
    entries: Option<Vec<ProcessEntry>>,
}

impl StaticProcesses {
    pub fn new(entries: Vec<ProcessEntry>) -> Self {
        Self {
            entries: Some(entries),
        }
    }

    pub fn unavailable() -> Self {
        Self { entries: None }
    }
}

impl ProcessSource for StaticProcesses {
    fn snapshot(&mut self) -> Result<Vec<ProcessEntry>, ProbeError> {
        self.entries.clone().ok_or_else(|| ProbeError::ProcessTable {
            context: "scripted failure".to_string(),
        })
    }
}

/// Starts at a fixed instant and moves by `step` on every reading.
pub struct StepClock {
    next: OffsetDateTime,
    step: Duration,
}

impl StepClock {
    pub fn new(start: OffsetDateTime, step: Duration) -> Self {
        Self { next: start, step }
    }
}

impl Clock for StepClock {
    fn now(&mut self) -> OffsetDateTime {
        let now = self.next;
        self.next += self.step;
        now
    }
}

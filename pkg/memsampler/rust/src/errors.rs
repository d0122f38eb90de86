// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure of a single probe during a tick.
///
/// Everything except `Malformed` only degrades the probe's fields to zero for
/// the current tick. `Malformed` means a fixed-format output changed shape and
/// stops the agent, since recording it would corrupt the log silently.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("`{command}` could not be started: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {}: {stderr}", exit_code_display(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("`{command}` did not finish within {}s", .timeout.as_secs())]
    TimedOut { command: String, timeout: Duration },

    #[error("`{command}` produced no usable output")]
    NoOutput { command: String },

    #[error("process table unavailable: {context}")]
    ProcessTable { context: String },

    #[error("malformed `{command}` output: {context}")]
    Malformed { command: String, context: String },
}

impl ProbeError {
    pub fn is_transient(&self) -> bool {
        !matches!(self, ProbeError::Malformed { .. })
    }
}

fn exit_code_display(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

#[derive(Error, Debug)]
pub enum LogError {
    #[error("output path {} is a directory", .0.display())]
    IsDirectory(PathBuf),

    #[error(
        "{} was written with a different column layout (found {found:?}, expected {expected:?})",
        .path.display()
    )]
    SchemaMismatch {
        path: PathBuf,
        found: Vec<String>,
        expected: Vec<String>,
    },

    #[error("{} ends with an incomplete row", .0.display())]
    TornRow(PathBuf),

    #[error("row has {found} fields but the header has {expected}")]
    Arity { found: usize, expected: usize },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum SamplerError {
    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error("could not format sample timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

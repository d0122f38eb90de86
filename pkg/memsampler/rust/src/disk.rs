// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::command::{CommandRunner, CommandSpec};
use crate::errors::ProbeError;
use std::path::Path;

pub const COLUMN: &str = "disk";

pub fn du_command(path: &Path) -> CommandSpec {
    CommandSpec::new("du", &["-sm", path.to_string_lossy().as_ref()])
}

/// Size of `path` in MiB as reported by `du -sm`.
///
/// `du` exits non-zero when part of the tree is unreadable, which is the
/// common case without elevated privileges; the caller degrades that to zero.
pub async fn probe(runner: &dyn CommandRunner, path: &Path) -> Result<u64, ProbeError> {
    let spec = du_command(path);
    let output = runner.run(&spec).await?;
    parse_du_output(&output, &spec.to_string())
}

/// Parse the leading size token of the first line, e.g. `"1234\t/var/log"`.
pub fn parse_du_output(output: &str, command: &str) -> Result<u64, ProbeError> {
    let Some(token) = output
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().next())
    else {
        return Err(ProbeError::NoOutput {
            command: command.to_string(),
        });
    };

    token.parse().map_err(|e| ProbeError::Malformed {
        command: command.to_string(),
        context: format!("size token {token:?}: {e}"),
    })
}

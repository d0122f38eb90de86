// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::command::DEFAULT_COMMAND_TIMEOUT;
use crate::sample::FIXED_COLUMNS;
use anyhow::{Context, Result, bail};
use log::debug;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_OUTPUT: &str = "mem.csv";
pub const DEFAULT_INTERVAL_SECS: u64 = 1;
pub const DEFAULT_DISK_PATH: &str = "/var/log";

/// A named accumulator for processes whose command line starts with `prefix`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Bucket {
    pub name: String,
    pub prefix: String,
}

impl Bucket {
    pub fn new(name: &str, prefix: &str) -> Self {
        Self {
            name: name.to_string(),
            prefix: prefix.to_string(),
        }
    }

    pub fn matches(&self, cmdline: &str) -> bool {
        cmdline.starts_with(&self.prefix)
    }
}

pub fn default_buckets() -> Vec<Bucket> {
    vec![
        Bucket::new("python", "python"),
        Bucket::new("chrome", "/opt/google/chrome/chrome"),
    ]
}

/// Everything the sampling loop needs, fixed at startup.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub output: PathBuf,
    pub interval: Duration,
    pub buckets: Vec<Bucket>,
    pub disk_path: PathBuf,
    pub command_timeout: Duration,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            buckets: default_buckets(),
            disk_path: PathBuf::from(DEFAULT_DISK_PATH),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.interval < Duration::from_secs(1) {
            bail!(
                "sampling interval must be at least 1s, got {:?}",
                self.interval
            );
        }
        if self.command_timeout.is_zero() {
            bail!("command timeout must be positive");
        }
        validate_buckets(&self.buckets)
    }
}

/// Load an ordered bucket list from a YAML sequence of `{name, prefix}` maps.
/// Unlike the defaults, a file-provided list is validated before use.
pub fn load_buckets(path: &Path) -> Result<Vec<Bucket>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading bucket file {}", path.display()))?;
    let buckets: Vec<Bucket> = serde_yaml::from_str(&contents)
        .with_context(|| format!("parsing bucket file {}", path.display()))?;
    validate_buckets(&buckets).with_context(|| format!("validating {}", path.display()))?;
    debug!("loaded {} bucket(s) from {}", buckets.len(), path.display());
    Ok(buckets)
}

fn validate_buckets(buckets: &[Bucket]) -> Result<()> {
    if buckets.is_empty() {
        bail!("at least one bucket is required");
    }

    let mut seen = HashSet::new();
    for bucket in buckets {
        if bucket.name.is_empty() {
            bail!("bucket name must not be empty");
        }
        if bucket.prefix.is_empty() {
            bail!("bucket {:?} has an empty prefix", bucket.name);
        }
        if bucket.name.contains([',', '"', '\r', '\n']) {
            bail!(
                "bucket name {:?} contains a delimiter, quote or line break",
                bucket.name
            );
        }
        if FIXED_COLUMNS.contains(&bucket.name.as_str()) {
            bail!("bucket name {:?} collides with a built-in column", bucket.name);
        }
        if !seen.insert(bucket.name.as_str()) {
            bail!("duplicate bucket name {:?}", bucket.name);
        }
    }
    Ok(())
}

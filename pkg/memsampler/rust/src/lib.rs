// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

pub mod chart;
pub mod cli;
pub mod command;
pub mod config;
pub mod disk;
pub mod errors;
pub mod log_writer;
pub mod memory;
pub mod process;
pub mod sample;
pub mod sampler;
pub mod state;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::{Bucket, SamplerConfig};
pub use errors::{LogError, ProbeError, SamplerError};
pub use sampler::{Sampler, SystemClock};

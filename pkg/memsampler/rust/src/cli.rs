// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::chart::{ChartOptions, DEFAULT_CHART_OUTPUT, DEFAULT_TITLE};
use crate::config::{self, SamplerConfig};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Periodic memory sampler writing one CSV row per interval
#[derive(Parser, Debug, Clone)]
#[command(name = "dd-memsampler", version)]
pub struct Args {
    /// Sample log path
    #[arg(short, long, global = true, env = "DD_MEMSAMPLER_OUTPUT", default_value = config::DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Sampling interval in whole seconds
    #[arg(
        short = 'n',
        long,
        env = "DD_MEMSAMPLER_INTERVAL",
        default_value_t = config::DEFAULT_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval: u64,

    /// YAML list of `{name, prefix}` buckets replacing the defaults
    #[arg(long, env = "DD_MEMSAMPLER_BUCKETS")]
    pub buckets: Option<PathBuf>,

    /// Directory whose size is recorded in the `disk` column
    #[arg(long, env = "DD_MEMSAMPLER_DISK_PATH", default_value = config::DEFAULT_DISK_PATH)]
    pub disk_path: PathBuf,

    /// Timeout for each external command, in seconds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub command_timeout: u64,

    /// Agent log verbosity
    #[arg(long, global = true, env = "DD_LOG_LEVEL", default_value = "info")]
    pub log_level: log::Level,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Render the sample log as a standalone HTML line chart
    Chart {
        /// Chart file to write
        #[arg(long, default_value = DEFAULT_CHART_OUTPUT)]
        chart_output: PathBuf,

        /// Chart title
        #[arg(long, default_value = DEFAULT_TITLE)]
        title: String,
    },
}

impl Args {
    /// Resolve the sampling configuration, loading the bucket file if given.
    pub fn sampler_config(&self) -> Result<SamplerConfig> {
        let buckets = match &self.buckets {
            Some(path) => config::load_buckets(path)?,
            None => config::default_buckets(),
        };
        let config = SamplerConfig {
            output: self.output.clone(),
            interval: Duration::from_secs(self.interval),
            buckets,
            disk_path: self.disk_path.clone(),
            command_timeout: Duration::from_secs(self.command_timeout),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn chart_options(&self) -> Option<ChartOptions> {
        match &self.command {
            Some(Command::Chart {
                chart_output,
                title,
            }) => Some(ChartOptions {
                input: self.output.clone(),
                output: chart_output.clone(),
                title: title.clone(),
            }),
            None => None,
        }
    }
}

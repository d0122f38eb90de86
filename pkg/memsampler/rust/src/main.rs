// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use anyhow::Result;
use clap::Parser;
use dd_memsampler::cli::Args;
use dd_memsampler::command::SystemCommandRunner;
use dd_memsampler::process::SysinfoProcessSource;
use dd_memsampler::{Sampler, SystemClock, chart};
use log::info;
use tokio::signal::unix::{SignalKind, signal};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    simple_logger::init_with_level(args.log_level)?;
    info!(
        "dd-memsampler starting (version {})",
        env!("CARGO_PKG_VERSION")
    );

    if let Some(options) = args.chart_options() {
        chart::export(&options)?;
        return Ok(());
    }

    let config = args.sampler_config()?;
    let clock = SystemClock::new();
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let shutdown = async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = sigint.recv() => info!("received SIGINT"),
        }
    };

    let mut sampler = Sampler::new(
        &config,
        Box::new(SystemCommandRunner::new(config.command_timeout)),
        Box::new(SysinfoProcessSource::new()),
        Box::new(clock),
    );
    sampler.run(shutdown).await?;

    info!("dd-memsampler shutting down");
    Ok(())
}

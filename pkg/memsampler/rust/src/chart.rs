// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Offline export of a sample log to a standalone HTML line chart.

use crate::sampler::TIMESTAMP_FORMAT;
use anyhow::{Context, Result, bail};
use csv::ReaderBuilder;
use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use time::PrimitiveDateTime;

pub const DEFAULT_CHART_OUTPUT: &str = "curve.html";
pub const DEFAULT_TITLE: &str = "memory";

const TEMPLATE: &str = include_str!("static/chart.html");

#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub title: String,
}

/// A fully validated log, column-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleLog {
    /// Every column after the timestamp, in file order.
    pub columns: Vec<String>,
    pub timestamps: Vec<String>,
    /// `values[c][r]` is column `c` of data row `r`.
    pub values: Vec<Vec<u64>>,
}

impl SampleLog {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

pub fn read_log(path: &Path) -> Result<SampleLog> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let header = reader
        .headers()
        .with_context(|| format!("reading header of {}", path.display()))?
        .clone();
    if header.len() < 2 {
        bail!(
            "{} has no usable header (found {} column(s))",
            path.display(),
            header.len()
        );
    }

    let columns: Vec<String> = header.iter().skip(1).map(str::to_string).collect();
    let mut log = SampleLog {
        values: vec![Vec::new(); columns.len()],
        columns,
        timestamps: Vec::new(),
    };

    for (idx, record) in reader.records().enumerate() {
        // Line numbers as an editor shows them, header being line 1.
        let line = idx + 2;
        let record = record.with_context(|| format!("reading {}:{line}", path.display()))?;
        if record.len() != header.len() {
            bail!(
                "{}:{line}: row has {} fields, header has {}",
                path.display(),
                record.len(),
                header.len()
            );
        }

        let timestamp = &record[0];
        PrimitiveDateTime::parse(timestamp, TIMESTAMP_FORMAT)
            .with_context(|| format!("{}:{line}: bad timestamp {timestamp:?}", path.display()))?;
        log.timestamps.push(timestamp.to_string());

        for (col, field) in record.iter().skip(1).enumerate() {
            let value: u64 = field.parse().with_context(|| {
                format!(
                    "{}:{line}: column {:?} has non-numeric value {field:?}",
                    path.display(),
                    log.columns[col]
                )
            })?;
            log.values[col].push(value);
        }
    }

    Ok(log)
}

#[derive(Serialize)]
struct ChartData<'a> {
    title: &'a str,
    legend: &'a [String],
    series: Vec<Series<'a>>,
}

#[derive(Serialize)]
struct Series<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(rename = "showSymbol")]
    show_symbol: bool,
    /// `[timestamp, value]` pairs for the time axis.
    data: Vec<(&'a str, u64)>,
}

pub fn render_html(log: &SampleLog, title: &str) -> Result<String> {
    let series = log
        .columns
        .iter()
        .zip(&log.values)
        .map(|(name, values)| Series {
            name,
            kind: "line",
            show_symbol: false,
            data: log
                .timestamps
                .iter()
                .map(String::as_str)
                .zip(values.iter().copied())
                .collect(),
        })
        .collect();

    let data = ChartData {
        title,
        legend: &log.columns,
        series,
    };
    // Keep a literal "</script>" inside strings from closing the script block.
    let json = serde_json::to_string(&data)
        .context("serializing chart data")?
        .replace("</", "<\\/");

    let title = escape_html(title);
    Ok(fill_template(
        TEMPLATE,
        &[("{{TITLE}}", title.as_str()), ("{{OPTION}}", json.as_str())],
    ))
}

/// Substitute placeholders in one left-to-right pass over `template`, so text
/// coming from one substitution is never scanned for another placeholder.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some((at, key, value)) = values
        .iter()
        .filter_map(|(key, value)| rest.find(key).map(|at| (at, *key, *value)))
        .min_by_key(|(at, _, _)| *at)
    {
        out.push_str(&rest[..at]);
        out.push_str(value);
        rest = &rest[at + key.len()..];
    }
    out.push_str(rest);
    out
}

/// Read `options.input` and write the chart. Returns the number of samples.
pub fn export(options: &ChartOptions) -> Result<usize> {
    let log = read_log(&options.input)?;
    if log.is_empty() {
        warn!(
            "{} contains no samples, the chart will be empty",
            options.input.display()
        );
    }

    let html = render_html(&log, &options.title)?;
    std::fs::write(&options.output, html)
        .with_context(|| format!("writing {}", options.output.display()))?;
    info!(
        "wrote {} series x {} samples to {}",
        log.columns.len(),
        log.len(),
        options.output.display()
    );
    Ok(log.len())
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

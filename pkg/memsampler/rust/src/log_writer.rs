// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Append-only CSV log. The header is written only when the file is created;
//! every row is flushed and synced before [`LogWriter::append`] returns.

use crate::errors::LogError;
use crate::sample::Schema;
use crate::sampler::TIMESTAMP_FORMAT;
use csv::{ReaderBuilder, Writer, WriterBuilder};
use log::{debug, info, warn};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use time::PrimitiveDateTime;

pub struct LogWriter {
    path: PathBuf,
    width: usize,
    writer: Writer<File>,
    rows: u64,
    last_timestamp: Option<PrimitiveDateTime>,
}

impl LogWriter {
    /// Open `path` for appending, creating it with a header row if absent.
    ///
    /// An existing non-empty file must start with exactly the header `schema`
    /// would write and end on a row boundary; anything else would break row
    /// arity from here on.
    pub fn open(path: &Path, schema: &Schema) -> Result<Self, LogError> {
        let (file, last_timestamp) = match std::fs::metadata(path) {
            Ok(meta) if meta.is_dir() => {
                return Err(LogError::IsDirectory(path.to_path_buf()));
            }
            Ok(meta) => {
                let last_timestamp = if meta.len() > 0 {
                    check_row_boundary(path)?;
                    scan_existing(path, schema)?
                } else {
                    None
                };
                info!("resuming log {}", path.display());
                let file = OpenOptions::new()
                    .append(true)
                    .open(path)
                    .map_err(|source| io_error(path, "opening", source))?;
                (file, last_timestamp)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let file = OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(path)
                    .map_err(|source| io_error(path, "creating", source))?;
                let mut writer = Self::wrap(path, schema, file);
                writer.write_row(schema.columns())?;
                info!("created log {}", path.display());
                return Ok(writer);
            }
            Err(source) => return Err(io_error(path, "inspecting", source)),
        };

        let mut writer = Self::wrap(path, schema, file);
        writer.last_timestamp = last_timestamp;
        Ok(writer)
    }

    fn wrap(path: &Path, schema: &Schema, file: File) -> Self {
        Self {
            path: path.to_path_buf(),
            width: schema.width(),
            writer: WriterBuilder::new().has_headers(false).from_writer(file),
            rows: 0,
            last_timestamp: None,
        }
    }

    /// Timestamp of the last data row already in the file when it was opened.
    pub fn last_timestamp(&self) -> Option<PrimitiveDateTime> {
        self.last_timestamp
    }

    /// Append one data row. Rows with the wrong number of fields are refused.
    pub fn append(&mut self, record: &[String]) -> Result<(), LogError> {
        if record.len() != self.width {
            return Err(LogError::Arity {
                found: record.len(),
                expected: self.width,
            });
        }
        self.write_row(record)?;
        self.rows += 1;
        debug!("appended row {} to {}", self.rows, self.path.display());
        Ok(())
    }

    /// Data rows appended by this writer (the header is not counted).
    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_row(&mut self, record: &[String]) -> Result<(), LogError> {
        self.writer.write_record(record)?;
        self.writer
            .flush()
            .map_err(|source| io_error(&self.path, "flushing", source))?;
        self.writer
            .get_ref()
            .sync_data()
            .map_err(|source| io_error(&self.path, "syncing", source))
    }
}

/// A write that failed part-way leaves a fragment without its line break;
/// appending after it would glue two rows together.
fn check_row_boundary(path: &Path) -> Result<(), LogError> {
    let mut file = File::open(path).map_err(|source| io_error(path, "opening", source))?;
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))
        .and_then(|_| file.read_exact(&mut last))
        .map_err(|source| io_error(path, "reading the end of", source))?;
    if last[0] != b'\n' {
        return Err(LogError::TornRow(path.to_path_buf()));
    }
    Ok(())
}

/// Check the header row and return the timestamp of the last data row.
fn scan_existing(path: &Path, schema: &Schema) -> Result<Option<PrimitiveDateTime>, LogError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let mut records = reader.records();

    let found: Vec<String> = match records.next() {
        Some(record) => record?.iter().map(str::to_string).collect(),
        None => Vec::new(),
    };
    if found != schema.columns() {
        return Err(LogError::SchemaMismatch {
            path: path.to_path_buf(),
            found,
            expected: schema.columns().to_vec(),
        });
    }

    let mut last = None;
    for record in records {
        last = Some(record?);
    }
    let Some(record) = last else {
        return Ok(None);
    };
    let stamp = record.get(0).unwrap_or_default();
    match PrimitiveDateTime::parse(stamp, TIMESTAMP_FORMAT) {
        Ok(timestamp) => Ok(Some(timestamp)),
        Err(e) => {
            warn!(
                "last row of {} has an unreadable timestamp {stamp:?} ({e}), not carrying it over",
                path.display()
            );
            Ok(None)
        }
    }
}

fn io_error(path: &Path, action: &str, source: io::Error) -> LogError {
    LogError::Io {
        context: format!("{action} {}", path.display()),
        source,
    }
}

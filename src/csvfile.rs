// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The `Email ID,Subject` hand-off file between the two tools.

use log::{debug, warn};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::workflow::WorkflowError;

pub const ID_COLUMN: &str = "Email ID";
pub const SUBJECT_COLUMN: &str = "Subject";

/// Stands in for a path in errors from writers that are not files.
pub(crate) const IN_MEMORY: &str = "<memory>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub id: String,
    pub subject: String,
}

impl MessageRecord {
    pub fn new(id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self { id: id.into(), subject: subject.into() }
    }
}

/// Writes the header on creation, then one quoted-as-needed row per record.
pub struct ExportWriter<W: Write> {
    writer: csv::Writer<W>,
    path: Option<PathBuf>,
    rows: usize,
}

impl ExportWriter<File> {
    /// Truncate (or create) `path` and write the header row.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, WorkflowError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| WorkflowError::io(path, e))?;
            }
        }
        let file = File::create(path).map_err(|e| WorkflowError::io(path, e))?;
        let mut writer = Self::from_writer(file)?;
        writer.path = Some(path.to_path_buf());
        Ok(writer)
    }
}

impl<W: Write> ExportWriter<W> {
    pub fn from_writer(inner: W) -> Result<Self, WorkflowError> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(inner);
        writer
            .write_record([ID_COLUMN, SUBJECT_COLUMN])
            .map_err(|e| WorkflowError::csv(None, e))?;
        Ok(Self { writer, path: None, rows: 0 })
    }

    pub fn write_record(&mut self, record: &MessageRecord) -> Result<(), WorkflowError> {
        self.writer
            .write_record([record.id.as_str(), record.subject.as_str()])
            .map_err(|e| WorkflowError::csv(self.path.as_deref(), e))?;
        self.rows += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), WorkflowError> {
        self.writer
            .flush()
            .map_err(|e| WorkflowError::io(self.path.as_deref().unwrap_or(Path::new(IN_MEMORY)), e))
    }

    /// Data rows written so far, header excluded.
    pub fn rows_written(&self) -> usize {
        self.rows
    }
}

/// Parse export rows in file order.
///
/// The first row is always taken as the header. Blank lines and rows with an
/// empty id are skipped.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<MessageRecord>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    let mut rows = reader.records();

    match rows.next() {
        None => return Ok(records),
        Some(header) => {
            let header = header?;
            let first = header.get(0).unwrap_or("").trim_start_matches('\u{feff}').trim();
            if !first.eq_ignore_ascii_case(ID_COLUMN) {
                warn!("Unexpected CSV header {:?}; treating the first row as a header anyway", first);
            }
        }
    }

    for (index, row) in rows.enumerate() {
        let row = row?;
        let id = row.get(0).unwrap_or("").trim();
        if id.is_empty() {
            // +2: one-based, after the header
            debug!("Skipping CSV row {} with no message id", index + 2);
            continue;
        }
        records.push(MessageRecord::new(id, row.get(1).unwrap_or("")));
    }
    Ok(records)
}

/// Message ids from the export file at `path`, in file order.
pub fn load_message_ids<P: AsRef<Path>>(path: P) -> Result<Vec<String>, WorkflowError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| WorkflowError::io(path, e))?;
    let records = read_records(file).map_err(|e| WorkflowError::csv(Some(path), e))?;
    Ok(records.into_iter().map(|r| r.id).collect())
}

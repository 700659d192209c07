// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-run audit log.
//!
//! Diagnostics go through the `log` facade. `RunLog` is the operator-facing
//! record: one `<ISO8601> - <message>` line per authentication event,
//! per-item result and run summary, appended to a file owned by one run.

use chrono::{SecondsFormat, Utc};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Initialize the diagnostic logger, honouring `RUST_LOG` over the configured level.
pub fn init_diagnostics(default_level: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .try_init();
}

pub struct RunLog {
    sink: Option<Mutex<File>>,
    path: Option<PathBuf>,
}

impl RunLog {
    /// Open `path` for appending, creating it if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            sink: Some(Mutex::new(file)),
            path: Some(path.to_path_buf()),
        })
    }

    /// A log that records nothing.
    pub fn disabled() -> Self {
        Self { sink: None, path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn info(&self, message: impl AsRef<str>) {
        log::info!("{}", message.as_ref());
        self.append(message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        log::warn!("{}", message.as_ref());
        self.append(message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        log::error!("{}", message.as_ref());
        self.append(message.as_ref());
    }

    fn append(&self, message: &str) {
        let Some(sink) = &self.sink else {
            return;
        };
        let line = format_line(&Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true), message);
        match sink.lock() {
            Ok(mut file) => {
                if let Err(e) = file.write_all(line.as_bytes()) {
                    log::warn!("Failed to write audit log entry: {}", e);
                }
            }
            Err(_) => log::warn!("Audit log lock poisoned; entry dropped"),
        }
    }
}

/// Render one audit line; embedded newlines are flattened so one event stays one line.
fn format_line(timestamp: &str, message: &str) -> String {
    let flattened = message.replace(['\r', '\n'], " ");
    format!("{} - {}\n", timestamp, flattened)
}

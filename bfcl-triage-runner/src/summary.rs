// Copyright (c) The bfcl-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Writing JSON summaries to disk.

use crate::{config::OutputConfig, errors::WriteSummaryError};
use atomicwrites::{AllowOverwrite, AtomicFile};
use bfcl_triage_metadata::{StabilitySummary, TestsByCategory};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use std::io::Write;
use tracing::debug;

/// Writes the stable, flaky and failing summary files.
#[derive(Clone, Debug)]
pub struct SummaryWriter<'cfg> {
    output_dir: Utf8PathBuf,
    config: &'cfg OutputConfig,
}

impl<'cfg> SummaryWriter<'cfg> {
    /// Creates a writer for the given output directory.
    pub fn new(output_dir: impl Into<Utf8PathBuf>, config: &'cfg OutputConfig) -> Self {
        Self {
            output_dir: output_dir.into(),
            config,
        }
    }

    /// Returns the output directory.
    pub fn output_dir(&self) -> &Utf8Path {
        &self.output_dir
    }

    /// Writes the three summary files, creating the output directory if necessary.
    ///
    /// Returns the paths written, in the order stable, flaky, failing.
    pub fn write(&self, summary: &StabilitySummary) -> Result<Vec<Utf8PathBuf>, WriteSummaryError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|error| {
            WriteSummaryError::CreateDir {
                path: self.output_dir.clone(),
                error,
            }
        })?;

        let files: [(&str, &TestsByCategory); 3] = [
            (self.config.stable_file.as_str(), &summary.stable),
            (self.config.flaky_file.as_str(), &summary.flaky),
            (self.config.failing_file.as_str(), &summary.failing),
        ];
        files
            .into_iter()
            .map(|(file_name, tests)| {
                let path = self.output_dir.join(file_name);
                write_json_atomic(&path, tests)?;
                Ok(path)
            })
            .collect()
    }
}

/// Serializes `value` as pretty-printed JSON, replacing `path` atomically.
pub fn write_json_atomic<T: Serialize>(path: &Utf8Path, value: &T) -> Result<(), WriteSummaryError> {
    AtomicFile::new(path, AllowOverwrite)
        .write(|file| {
            serde_json::to_writer_pretty(&mut *file, value)?;
            file.write_all(b"\n")
        })
        .map_err(|error| WriteSummaryError::Write {
            path: path.to_owned(),
            error,
        })?;
    debug!("wrote {path}");
    Ok(())
}

// Copyright (c) The bfcl-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by bfcl-triage-runner.

use bfcl_triage_metadata::{RunName, TestId};
use camino::{Utf8Path, Utf8PathBuf};
use config::ConfigError;
use itertools::Itertools;
use thiserror::Error;

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse bfcl-triage config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8Path {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing a config.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config: the file was missing or was not valid TOML.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config into its expected shape.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),
}

/// An error that occurred while looking for runs and categories under the base directory.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LayoutDiscoveryError {
    /// The base directory does not exist.
    #[error("base directory `{path}` does not exist")]
    BaseDirNotFound {
        /// The base directory.
        path: Utf8PathBuf,
    },

    /// The base directory could not be read.
    #[error("failed to read base directory `{path}`")]
    BaseDirRead {
        /// The base directory.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// Walking a score directory failed.
    #[error("failed to walk score directory `{path}`")]
    Walk {
        /// The score directory being walked.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: walkdir::Error,
    },
}

/// An error that occurred while reading a result or score file.
///
/// Files that do not exist are not errors: they are treated as having no records.
#[derive(Debug, Error)]
#[error("failed to read records from `{path}`")]
pub struct RecordReadError {
    path: Utf8PathBuf,
    #[source]
    error: std::io::Error,
}

impl RecordReadError {
    pub(crate) fn new(path: impl Into<Utf8PathBuf>, error: std::io::Error) -> Self {
        Self {
            path: path.into(),
            error,
        }
    }

    /// Returns the path that failed to be read.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

/// A run name was requested that no category has results for.
#[derive(Clone, Debug, Error)]
#[error(
    "run `{run}` not found (known runs: {})",
    .known_runs.iter().join(", ")
)]
pub struct UnknownRunError {
    run: RunName,
    known_runs: Vec<RunName>,
}

impl UnknownRunError {
    pub(crate) fn new(run: RunName, known_runs: impl IntoIterator<Item = RunName>) -> Self {
        let mut known_runs: Vec<_> = known_runs.into_iter().collect();
        known_runs.sort_unstable();
        Self { run, known_runs }
    }

    /// Returns the run that was not found.
    pub fn run(&self) -> &RunName {
        &self.run
    }

    /// Returns the runs that are known.
    pub fn known_runs(&self) -> &[RunName] {
        &self.known_runs
    }
}

/// An error that occurred while comparing two runs.
///
/// Not marked `#[non_exhaustive]`: callers map each variant to its own exit code, so adding a
/// variant should break their matches.
#[derive(Debug, Error)]
pub enum CompareError {
    /// One of the runs is unknown.
    #[error(transparent)]
    UnknownRun(#[from] UnknownRunError),

    /// Reading records failed.
    #[error(transparent)]
    Read(#[from] RecordReadError),
}

/// An error that occurred while inspecting a single test.
///
/// Not marked `#[non_exhaustive]`: callers map each variant to its own exit code, so adding a
/// variant should break their matches.
#[derive(Debug, Error)]
pub enum InspectError {
    /// The test was not found in any result file.
    #[error("test `{test_id}` not found in result files (categories searched: {searched})")]
    TestNotFound {
        /// The test that was looked for.
        test_id: TestId,

        /// The number of categories searched.
        searched: usize,
    },

    /// Reading records failed.
    #[error(transparent)]
    Read(#[from] RecordReadError),
}

/// An error that occurred while writing a JSON summary file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteSummaryError {
    /// The output directory could not be created.
    #[error("failed to create output directory `{path}`")]
    CreateDir {
        /// The directory that failed to be created.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// The summary file could not be written.
    #[error("failed to write summary to `{path}`")]
    Write {
        /// The file that failed to be written.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: atomicwrites::Error<std::io::Error>,
    },
}

impl WriteSummaryError {
    /// Returns the path involved in this error.
    pub fn path(&self) -> &Utf8Path {
        match self {
            Self::CreateDir { path, .. } | Self::Write { path, .. } => path,
        }
    }
}

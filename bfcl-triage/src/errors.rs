// Copyright (c) The bfcl-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use bfcl_triage_metadata::{TestId, TriageExitCode};
use bfcl_triage_runner::{
    errors::{
        ConfigParseError, LayoutDiscoveryError, RecordReadError, UnknownRunError,
        WriteSummaryError,
    },
    helpers::plural,
};
use camino::Utf8PathBuf;
use itertools::Itertools;
use owo_colors::OwoColorize;
use std::error::Error;
use swrite::{SWrite, swrite};
use thiserror::Error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// The #[error()] strings are placeholders: errors are expected to be printed with
// display_to_stderr, which colorizes them.

/// An error that bfcl-triage expects and reports with a dedicated exit code.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("layout discovery error")]
    LayoutDiscoveryError {
        #[from]
        err: LayoutDiscoveryError,
    },
    #[error("unknown run")]
    UnknownRun {
        #[from]
        err: UnknownRunError,
    },
    #[error("no categories found")]
    NoCategoriesFound { dir: Utf8PathBuf },
    #[error("test not found")]
    TestNotFound { test_id: TestId, searched: usize },
    #[error("regressions found")]
    RegressionsFound { count: usize },
    #[error("read input error")]
    ReadInputError {
        #[from]
        err: RecordReadError,
    },
    #[error("write summary error")]
    WriteSummaryError {
        #[from]
        err: WriteSummaryError,
    },
    #[error("write output error")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    pub(crate) fn write_output_error(err: std::io::Error) -> Self {
        Self::WriteOutputError { err }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. }
            | Self::LayoutDiscoveryError { .. }
            | Self::UnknownRun { .. } => TriageExitCode::SETUP_ERROR,
            Self::NoCategoriesFound { .. } => TriageExitCode::NO_CATEGORIES_FOUND,
            Self::TestNotFound { .. } => TriageExitCode::TEST_NOT_FOUND,
            Self::RegressionsFound { .. } => TriageExitCode::REGRESSIONS_FOUND,
            Self::ReadInputError { .. } => TriageExitCode::READ_INPUT_ERROR,
            Self::WriteSummaryError { .. } | Self::WriteOutputError { .. } => {
                TriageExitCode::WRITE_OUTPUT_ERROR
            }
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::ConfigParseError { err } => {
                tracing::error!(
                    "failed to parse config file `{}`",
                    err.config_file().style(styles.bold)
                );
                Some(err.kind() as &dyn Error)
            }
            Self::LayoutDiscoveryError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::UnknownRun { err } => {
                let mut msg = format!("run `{}` not found", err.run().style(styles.bold));
                if err.known_runs().is_empty() {
                    swrite!(msg, "\n(hint: no runs were found)");
                } else {
                    swrite!(
                        msg,
                        "\n(hint: known runs are {})",
                        err.known_runs()
                            .iter()
                            .map(|run| run.style(styles.bold))
                            .join(", ")
                    );
                }
                tracing::error!("{msg}");
                None
            }
            Self::NoCategoriesFound { dir } => {
                tracing::error!(
                    "no test categories found under `{}`\n\
                     (hint: expected score-<run> and result-<run> directories)",
                    dir.style(styles.bold)
                );
                None
            }
            Self::TestNotFound { test_id, searched } => {
                tracing::error!(
                    "test `{}` not found in result files ({} {} searched)",
                    test_id.style(styles.bold),
                    searched.style(styles.warning_text),
                    plural::categories_str(*searched),
                );
                None
            }
            Self::RegressionsFound { count } => {
                tracing::error!(
                    "{} {} found",
                    count.style(styles.bold),
                    plural::regressions_str(*count)
                );
                None
            }
            Self::ReadInputError { err } => {
                tracing::error!("failed to read `{}`", err.path().style(styles.bold));
                err.source()
            }
            Self::WriteSummaryError { err } => {
                tracing::error!("failed to write `{}`", err.path().style(styles.bold));
                err.source()
            }
            Self::WriteOutputError { err } => {
                tracing::error!("failed to write output");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            tracing::error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

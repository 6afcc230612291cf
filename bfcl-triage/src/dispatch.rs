// Copyright (c) The bfcl-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line parsing and command execution.

use crate::{
    ExpectedError, Result,
    output::{OutputContext, OutputOpts, OutputWriter},
};
use bfcl_triage_metadata::{CategoryName, RunName, TestId, TriageExitCode};
use bfcl_triage_runner::{
    compare::compare_runs,
    config::TriageConfig,
    display::ReportDisplayer,
    errors::{CompareError, InspectError},
    inspect::inspect_test,
    layout::{DiscoveredCategories, RunLayout},
    stability::StabilityReport,
    summary::{SummaryWriter, write_json_atomic},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use itertools::Itertools;
use std::{collections::BTreeSet, io::Write};
use tracing::{debug, warn};

/// Triage BFCL benchmark runs: find flaky tests, compare runs and inspect single tests.
///
/// Runs are read from `score-<run>` and `result-<run>` directories under the base directory.
#[derive(Debug, Parser)]
#[command(
    version,
    name = "bfcl-triage",
    styles = crate::output::clap_styles::style(),
    max_term_width = 100,
)]
pub struct BfclTriageApp {
    #[clap(flatten)]
    common: CommonOpts,

    #[clap(flatten)]
    output: OutputOpts,

    #[clap(subcommand)]
    command: Command,
}

impl BfclTriageApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the process exit code.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let config = self.common.make_config()?;
        let discovered = RunLayout::new(&self.common.dir, &config.layout).discover()?;
        debug!(
            "discovered {} categories under {}",
            discovered.len(),
            self.common.dir
        );

        let mut displayer = ReportDisplayer::new(output.verbose);
        if output.color.should_colorize(supports_color::Stream::Stdout) {
            displayer.colorize();
        }
        if supports_unicode::on(supports_unicode::Stream::Stdout) {
            displayer.use_unicode();
        }

        let cx = ExecContext {
            base_dir: &self.common.dir,
            config: &config,
            displayer: &displayer,
        };
        match self.command {
            Command::Categorize(opts) => opts.exec(&cx, discovered, output_writer),
            Command::Compare(opts) => opts.exec(&cx, discovered, output_writer),
            Command::Show(opts) => opts.exec(&cx, discovered, output_writer),
        }
    }
}

#[derive(Debug, Args)]
struct CommonOpts {
    /// Directory containing the score-* and result-* run directories
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        default_value = ".",
        env = "BFCL_TRIAGE_DIR"
    )]
    dir: Utf8PathBuf,

    /// Config file [default: <DIR>/.config/bfcl-triage.toml]
    #[arg(long, global = true, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,
}

impl CommonOpts {
    fn make_config(&self) -> Result<TriageConfig> {
        Ok(TriageConfig::from_sources(
            &self.dir,
            self.config_file.as_deref(),
        )?)
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify tests as stable passes, flaky or stable failures across runs
    ///
    /// Every test is classified within its category by the runs it was executed in. A test that
    /// is missing from a run is not counted as failing in that run.
    Categorize(CategorizeOpts),

    /// Find regressions and improvements between two runs
    Compare(CompareOpts),

    /// Show a single test's outcome in every run
    Show(ShowOpts),
}

/// State shared by every command.
struct ExecContext<'a> {
    base_dir: &'a Utf8Path,
    config: &'a TriageConfig,
    displayer: &'a ReportDisplayer,
}

#[derive(Debug, Default, Args)]
struct FilterOpts {
    /// Only consider this category (can be specified multiple times)
    #[arg(long = "category", short = 'c', value_name = "CATEGORY")]
    categories: Vec<CategoryName>,

    /// Only consider this run (can be specified multiple times)
    #[arg(long = "run", short = 'r', value_name = "RUN")]
    runs: Vec<RunName>,
}

impl FilterOpts {
    /// Applies the filters, checking that every requested run exists.
    fn apply(&self, discovered: &DiscoveredCategories) -> Result<DiscoveredCategories> {
        for run in &self.runs {
            discovered.check_run(run)?;
        }

        let categories: BTreeSet<_> = self.categories.iter().cloned().collect();
        let unknown = discovered.unknown_categories(&categories);
        if !unknown.is_empty() {
            warn!(
                "ignoring unknown categories: {}",
                unknown.iter().join(", ")
            );
        }

        let runs: BTreeSet<_> = self.runs.iter().cloned().collect();
        Ok(discovered.filter(&categories, &runs))
    }
}

#[derive(Debug, Args)]
struct CategorizeOpts {
    #[clap(flatten)]
    filter: FilterOpts,

    /// Directory to write summary files to [default: from config, relative to --dir]
    #[arg(long, value_name = "DIR")]
    output_dir: Option<Utf8PathBuf>,

    /// Don't write summary files
    #[arg(long, conflicts_with = "output_dir")]
    no_json: bool,
}

impl CategorizeOpts {
    fn exec(
        self,
        cx: &ExecContext<'_>,
        discovered: DiscoveredCategories,
        output_writer: &mut OutputWriter,
    ) -> Result<i32> {
        let discovered = self.filter.apply(&discovered)?;
        let report = StabilityReport::analyze(&discovered)?;
        if report.is_empty() {
            return Err(ExpectedError::NoCategoriesFound {
                dir: cx.base_dir.to_owned(),
            });
        }

        let mut writer = output_writer.stdout_writer();
        cx.displayer
            .write_stability_report(&report, &mut writer)
            .map_err(ExpectedError::write_output_error)?;

        if !self.no_json {
            let output_dir = self
                .output_dir
                .unwrap_or_else(|| cx.config.output.resolve_dir(cx.base_dir));
            let paths = SummaryWriter::new(output_dir, &cx.config.output)
                .write(&report.to_summary())?;
            cx.displayer
                .write_summary_files(&paths, &mut writer)
                .map_err(ExpectedError::write_output_error)?;
        }

        cx.displayer
            .write_insights(&report, &mut writer)
            .map_err(ExpectedError::write_output_error)?;
        writer.flush().map_err(ExpectedError::write_output_error)?;

        Ok(TriageExitCode::OK)
    }
}

#[derive(Debug, Args)]
struct CompareOpts {
    /// The run to compare against
    #[arg(value_name = "BASELINE")]
    baseline: RunName,

    /// The run to compare
    #[arg(value_name = "CANDIDATE")]
    candidate: RunName,

    /// Only compare this category (can be specified multiple times)
    #[arg(long = "category", short = 'c', value_name = "CATEGORY")]
    categories: Vec<CategoryName>,

    /// Write the comparison as JSON to this file
    #[arg(long, value_name = "FILE")]
    output: Option<Utf8PathBuf>,

    /// Exit with a non-zero code if any test regressed
    #[arg(long)]
    fail_on_regression: bool,
}

impl CompareOpts {
    fn exec(
        self,
        cx: &ExecContext<'_>,
        discovered: DiscoveredCategories,
        output_writer: &mut OutputWriter,
    ) -> Result<i32> {
        let filter = FilterOpts {
            categories: self.categories,
            runs: Vec::new(),
        };
        let discovered = filter.apply(&discovered)?;

        let summary = compare_runs(&discovered, &self.baseline, &self.candidate).map_err(
            |error| match error {
                CompareError::UnknownRun(err) => ExpectedError::from(err),
                CompareError::Read(err) => ExpectedError::from(err),
            },
        )?;

        let mut writer = output_writer.stdout_writer();
        cx.displayer
            .write_comparison(&summary, &mut writer)
            .map_err(ExpectedError::write_output_error)?;
        writer.flush().map_err(ExpectedError::write_output_error)?;

        if let Some(path) = &self.output {
            write_json_atomic(path, &summary)?;
        }

        let regressions = summary.regression_count();
        if self.fail_on_regression && regressions > 0 {
            return Err(ExpectedError::RegressionsFound { count: regressions });
        }
        Ok(TriageExitCode::OK)
    }
}

#[derive(Debug, Args)]
struct ShowOpts {
    /// The test to show, e.g. simple_python_12
    #[arg(value_name = "TEST_ID")]
    test_id: TestId,

    #[clap(flatten)]
    filter: FilterOpts,
}

impl ShowOpts {
    fn exec(
        self,
        cx: &ExecContext<'_>,
        discovered: DiscoveredCategories,
        output_writer: &mut OutputWriter,
    ) -> Result<i32> {
        let discovered = self.filter.apply(&discovered)?;
        let inspection = inspect_test(&discovered, &self.test_id).map_err(|error| match error {
            InspectError::TestNotFound { test_id, searched } => {
                ExpectedError::TestNotFound { test_id, searched }
            }
            InspectError::Read(err) => ExpectedError::from(err),
        })?;

        let mut writer = output_writer.stdout_writer();
        cx.displayer
            .write_inspection(&inspection, &mut writer)
            .map_err(ExpectedError::write_output_error)?;
        writer.flush().map_err(ExpectedError::write_output_error)?;

        Ok(TriageExitCode::OK)
    }
}

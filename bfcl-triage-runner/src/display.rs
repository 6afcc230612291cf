// Copyright (c) The bfcl-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human-readable console output for stability reports, comparisons and inspections.

use crate::{
    helpers::{DisplayDelta, DisplayShare, ThemeCharacters, percentage, plural},
    inspect::{CategoryInspection, RunTestStatus, TestInspection},
    stability::{Classification, StabilityReport},
};
use bfcl_triage_metadata::{CategoryComparisonSummary, ComparisonSummary, ReportedScore, TestId};
use camino::Utf8PathBuf;
use itertools::Itertools;
use owo_colors::{OwoColorize, Style};
use std::io::{self, Write};

const BAR_WIDTH: usize = 80;

/// Writes reports to the console.
#[derive(Clone, Debug, Default)]
pub struct ReportDisplayer {
    styles: Styles,
    theme: ThemeCharacters,
    verbose: bool,
}

impl ReportDisplayer {
    /// Creates a new displayer. In verbose mode, individual test IDs and raw results are shown.
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            ..Default::default()
        }
    }

    /// Colorizes output.
    pub fn colorize(&mut self) {
        self.styles.colorize();
    }

    /// Uses Unicode characters for horizontal rules.
    pub fn use_unicode(&mut self) {
        self.theme.use_unicode();
    }

    /// Writes the per-category breakdown and the overall summary.
    pub fn write_stability_report(
        &self,
        report: &StabilityReport,
        writer: &mut dyn Write,
    ) -> io::Result<()> {
        let styles = &self.styles;
        self.write_heading("BFCL Test Categorization Analysis", writer)?;
        writeln!(writer)?;
        writeln!(writer, "Analyzing categories:")?;
        writeln!(writer, "{}", self.theme.light_bar(BAR_WIDTH))?;

        for category in report.categories() {
            let total = category.total();
            let partition = &category.partition;
            writeln!(writer)?;
            writeln!(writer, "{}", category.category.style(styles.category))?;
            writeln!(
                writer,
                "  Runs analyzed: {} ({})",
                category.runs.len().style(styles.count),
                category.runs.iter().join(", ")
            )?;
            writeln!(writer, "  Total tests: {}", total.style(styles.count))?;
            self.write_counts(
                partition.stable.len(),
                partition.flaky.len(),
                partition.failing.len(),
                total,
                writer,
            )?;

            if self.verbose {
                for test_id in &partition.flaky {
                    writeln!(writer, "    {} {}", "flaky:".style(styles.flaky), test_id)?;
                }
            }
        }

        let totals = report.totals();
        writeln!(writer)?;
        self.write_heading("OVERALL SUMMARY", writer)?;
        writeln!(
            writer,
            "Total unique tests across all categories: {}",
            totals.total().style(styles.count)
        )?;
        self.write_counts(
            totals.stable,
            totals.flaky,
            totals.failing,
            totals.total(),
            writer,
        )?;
        writeln!(writer)
    }

    /// Writes the list of summary files that were created.
    pub fn write_summary_files(
        &self,
        paths: &[Utf8PathBuf],
        writer: &mut dyn Write,
    ) -> io::Result<()> {
        writeln!(writer, "JSON files created:")?;
        for path in paths {
            writeln!(writer, "  - {}", path.style(self.styles.path))?;
        }
        writeln!(writer)
    }

    /// Writes the most flaky and most stable categories.
    pub fn write_insights(
        &self,
        report: &StabilityReport,
        writer: &mut dyn Write,
    ) -> io::Result<()> {
        let styles = &self.styles;
        writeln!(writer, "{}", self.theme.heavy_bar(BAR_WIDTH))?;
        writeln!(writer, "{}", "Top insights:".style(styles.heading))?;
        writeln!(writer, "{}", self.theme.light_bar(BAR_WIDTH))?;

        if let Some(category) = report.most_flaky() {
            let count = category.partition.flaky.len();
            writeln!(
                writer,
                "Most flaky category: {}",
                category.category.style(styles.category)
            )?;
            writeln!(
                writer,
                "  {} flaky {}",
                count.style(styles.flaky),
                plural::tests_str(count)
            )?;
            writeln!(writer)?;
        }
        if let Some(category) = report.most_stable() {
            let count = category.partition.stable.len();
            writeln!(
                writer,
                "Most stable category: {}",
                category.category.style(styles.category)
            )?;
            writeln!(
                writer,
                "  {} stable passing {}",
                count.style(styles.stable),
                plural::tests_str(count)
            )?;
            writeln!(writer)?;
        }
        Ok(())
    }

    /// Writes a comparison between two runs.
    pub fn write_comparison(
        &self,
        summary: &ComparisonSummary,
        writer: &mut dyn Write,
    ) -> io::Result<()> {
        let styles = &self.styles;
        self.write_heading(
            &format!("Comparing {} -> {}", summary.baseline, summary.candidate),
            writer,
        )?;

        let mut overall = CategoryComparisonSummary::default();
        for (category, comparison) in &summary.categories {
            writeln!(writer)?;
            writeln!(writer, "{}", category.style(styles.category))?;
            self.write_accuracy(comparison, writer)?;
            self.write_changes(comparison, writer)?;

            overall.baseline_passed += comparison.baseline_passed;
            overall.baseline_total += comparison.baseline_total;
            overall.candidate_passed += comparison.candidate_passed;
            overall.candidate_total += comparison.candidate_total;
        }

        if !summary.baseline_only_categories.is_empty()
            || !summary.candidate_only_categories.is_empty()
        {
            writeln!(writer)?;
        }
        if !summary.baseline_only_categories.is_empty() {
            writeln!(
                writer,
                "Categories only in {}: {}",
                summary.baseline.style(styles.run),
                summary.baseline_only_categories.iter().join(", ")
            )?;
        }
        if !summary.candidate_only_categories.is_empty() {
            writeln!(
                writer,
                "Categories only in {}: {}",
                summary.candidate.style(styles.run),
                summary.candidate_only_categories.iter().join(", ")
            )?;
        }

        let regressions = summary.regression_count();
        let improvements = summary.improvement_count();
        let categories = summary.categories.len();
        writeln!(writer)?;
        self.write_heading("OVERALL", writer)?;
        self.write_accuracy(&overall, writer)?;
        writeln!(
            writer,
            "  {} {}, {} {} across {} {}",
            regressions.style(if regressions > 0 {
                styles.regression
            } else {
                styles.count
            }),
            plural::regressions_str(regressions),
            improvements.style(if improvements > 0 {
                styles.improvement
            } else {
                styles.count
            }),
            plural::improvements_str(improvements),
            categories.style(styles.count),
            plural::categories_str(categories),
        )?;
        writeln!(writer)
    }

    /// Writes everything known about a single test.
    pub fn write_inspection(
        &self,
        inspection: &TestInspection,
        writer: &mut dyn Write,
    ) -> io::Result<()> {
        self.write_heading(&format!("Test {}", inspection.test_id), writer)?;
        for category in &inspection.categories {
            writeln!(writer)?;
            self.write_category_inspection(category, writer)?;
        }
        writeln!(writer)
    }

    fn write_category_inspection(
        &self,
        category: &CategoryInspection,
        writer: &mut dyn Write,
    ) -> io::Result<()> {
        let styles = &self.styles;
        let status = &category.status;
        write!(writer, "{}: ", category.category.style(styles.category))?;
        match category.classification() {
            Some(classification) => write!(
                writer,
                "{}",
                classification.style(styles.classification(classification))
            )?,
            None => write!(writer, "not executed")?,
        }
        let total_runs = status.total_runs();
        writeln!(
            writer,
            " (passed in {} of {} {})",
            status.passed_count().style(styles.count),
            total_runs.style(styles.count),
            plural::runs_str(total_runs)
        )?;

        for run in &category.runs {
            write!(writer, "  {}: ", run.run.style(styles.run))?;
            match &run.status {
                RunTestStatus::NotExecuted => {
                    writeln!(writer, "{}", "not executed".style(styles.dimmed))?;
                }
                RunTestStatus::Passed { .. } => {
                    writeln!(writer, "{}", "PASS".style(styles.stable))?;
                }
                RunTestStatus::Failed { failure, .. } => {
                    write!(writer, "{}", "FAIL".style(styles.failing))?;
                    if let Some(error_type) = failure.error_type() {
                        write!(writer, " {error_type}")?;
                    }
                    writeln!(writer)?;
                    if let Some(error) = &failure.error {
                        for line in error.lines() {
                            writeln!(writer, "      {line}")?;
                        }
                    }
                }
            }

            if self.verbose {
                if let Some(result) = run.status.result() {
                    writeln!(
                        writer,
                        "      {} {}",
                        "result:".style(styles.dimmed),
                        result
                    )?;
                }
                for (key, value) in run.status.details() {
                    writeln!(writer, "      {}", format!("{key}:").style(styles.dimmed))?;
                    for line in serde_json::to_string_pretty(value)?.lines() {
                        writeln!(writer, "        {line}")?;
                    }
                }
            }
        }
        Ok(())
    }

    fn write_heading(&self, heading: &str, writer: &mut dyn Write) -> io::Result<()> {
        let bar = self.theme.heavy_bar(BAR_WIDTH);
        writeln!(writer, "{bar}")?;
        writeln!(writer, "{}", heading.style(self.styles.heading))?;
        writeln!(writer, "{bar}")
    }

    fn write_counts(
        &self,
        stable: usize,
        flaky: usize,
        failing: usize,
        total: usize,
        writer: &mut dyn Write,
    ) -> io::Result<()> {
        let styles = &self.styles;
        let share = |count| DisplayShare { count, total };
        writeln!(
            writer,
            "  {} {}",
            "Stable passes:".style(styles.stable),
            share(stable)
        )?;
        writeln!(
            writer,
            "  {}   {}",
            "Flaky tests:".style(styles.flaky),
            share(flaky)
        )?;
        writeln!(
            writer,
            "  {}  {}",
            "Stable fails:".style(styles.failing),
            share(failing)
        )
    }

    fn write_accuracy(
        &self,
        comparison: &CategoryComparisonSummary,
        writer: &mut dyn Write,
    ) -> io::Result<()> {
        let before = percentage(comparison.baseline_passed, comparison.baseline_total);
        let after = percentage(comparison.candidate_passed, comparison.candidate_total);
        let delta = DisplayDelta(after - before);
        let delta_style = if after < before {
            self.styles.regression
        } else if after > before {
            self.styles.improvement
        } else {
            self.styles.count
        };
        writeln!(
            writer,
            "  Accuracy: {before:.1}% ({}/{}) -> {after:.1}% ({}/{}) ({})",
            comparison.baseline_passed,
            comparison.baseline_total,
            comparison.candidate_passed,
            comparison.candidate_total,
            delta.style(delta_style),
        )?;

        if let (Some(baseline), Some(candidate)) =
            (&comparison.baseline_reported, &comparison.candidate_reported)
        {
            let share = |score: &ReportedScore| {
                if score.total_count == 0 {
                    0.0
                } else {
                    score.correct_count as f64 / score.total_count as f64 * 100.0
                }
            };
            writeln!(
                writer,
                "  {} {:.1}% ({}/{}) -> {:.1}% ({}/{})",
                "Scorer reported:".style(self.styles.dimmed),
                share(baseline),
                baseline.correct_count,
                baseline.total_count,
                share(candidate),
                candidate.correct_count,
                candidate.total_count,
            )?;
        }
        Ok(())
    }

    fn write_changes(
        &self,
        comparison: &CategoryComparisonSummary,
        writer: &mut dyn Write,
    ) -> io::Result<()> {
        let styles = &self.styles;
        self.write_test_list(
            "Regressions: ",
            &comparison.regressions,
            styles.regression,
            writer,
        )?;
        self.write_test_list(
            "Improvements:",
            &comparison.improvements,
            styles.improvement,
            writer,
        )?;
        if !comparison.only_in_baseline.is_empty() {
            self.write_test_list(
                "Only in baseline: ",
                &comparison.only_in_baseline,
                styles.dimmed,
                writer,
            )?;
        }
        if !comparison.only_in_candidate.is_empty() {
            self.write_test_list(
                "Only in candidate:",
                &comparison.only_in_candidate,
                styles.dimmed,
                writer,
            )?;
        }

        if !comparison.regressions_by_error_type.is_empty() {
            let total = comparison.regressions.len();
            writeln!(writer, "  Regressions by error type:")?;
            for (error_type, tests) in &comparison.regressions_by_error_type {
                writeln!(
                    writer,
                    "    {}: {} ({:.1}%)",
                    error_type.style(styles.failing),
                    tests.len().style(styles.regression),
                    percentage(tests.len(), total),
                )?;
                if self.verbose {
                    for test_id in tests {
                        writeln!(writer, "      - {test_id}")?;
                    }
                }
            }
        }
        Ok(())
    }

    fn write_test_list(
        &self,
        label: &str,
        tests: &[TestId],
        style: Style,
        writer: &mut dyn Write,
    ) -> io::Result<()> {
        let count = tests.len();
        writeln!(
            writer,
            "  {label} {}",
            count.style(if count > 0 { style } else { self.styles.count })
        )?;
        if self.verbose {
            for test_id in tests {
                writeln!(writer, "    - {test_id}")?;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
struct Styles {
    heading: Style,
    category: Style,
    count: Style,
    run: Style,
    path: Style,
    stable: Style,
    flaky: Style,
    failing: Style,
    regression: Style,
    improvement: Style,
    dimmed: Style,
}

impl Styles {
    fn colorize(&mut self) {
        self.heading = Style::new().bold();
        self.category = Style::new().bold().cyan();
        self.count = Style::new().bold();
        self.run = Style::new().blue().bold();
        self.path = Style::new().bold();
        self.stable = Style::new().green().bold();
        self.flaky = Style::new().yellow().bold();
        self.failing = Style::new().red().bold();
        self.regression = Style::new().red().bold();
        self.improvement = Style::new().green().bold();
        self.dimmed = Style::new().dimmed();
    }

    fn classification(&self, classification: Classification) -> Style {
        match classification {
            Classification::StablePass => self.stable,
            Classification::Flaky => self.flaky,
            Classification::StableFail => self.failing,
        }
    }
}

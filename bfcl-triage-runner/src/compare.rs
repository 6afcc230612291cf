// Copyright (c) The bfcl-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Compare two runs to find regressions and improvements.

use crate::{
    errors::CompareError,
    layout::DiscoveredCategories,
    outcomes::RunOutcomes,
    records::{ScoreFile, ScoreHeader},
    stability::TestOutcome,
};
use bfcl_triage_metadata::{
    CategoryComparisonSummary, ComparisonSummary, ReportedScore, RunName, TestId,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Compares the outcomes of one category in two runs.
pub fn compare_outcomes(
    baseline: &RunOutcomes,
    candidate: &RunOutcomes,
) -> CategoryComparisonSummary {
    let mut summary = CategoryComparisonSummary {
        baseline_passed: baseline.passed_count(),
        baseline_total: baseline.executed_count(),
        candidate_passed: candidate.passed_count(),
        candidate_total: candidate.executed_count(),
        ..Default::default()
    };

    for test_id in baseline.executed() {
        match (baseline.outcome(test_id.as_str()), candidate.outcome(test_id.as_str())) {
            (Some(TestOutcome::Passed), Some(TestOutcome::Failed)) => {
                summary.regressions.push(test_id.clone());
            }
            (Some(TestOutcome::Failed), Some(TestOutcome::Passed)) => {
                summary.improvements.push(test_id.clone());
            }
            (_, None) => summary.only_in_baseline.push(test_id.clone()),
            _ => {}
        }
    }
    summary.only_in_candidate = candidate
        .executed()
        .difference(baseline.executed())
        .cloned()
        .collect();

    summary
}

/// Groups regressions by the error type in the candidate's score file.
pub fn regressions_by_error_type(
    regressions: &[TestId],
    candidate_score: &ScoreFile,
) -> BTreeMap<String, Vec<TestId>> {
    let mut by_error_type: BTreeMap<String, Vec<TestId>> = BTreeMap::new();
    for test_id in regressions {
        let error_type = candidate_score
            .failure(test_id.as_str())
            .and_then(|failure| failure.error_type())
            .unwrap_or(CategoryComparisonSummary::UNKNOWN_ERROR_TYPE);
        by_error_type
            .entry(error_type.to_owned())
            .or_default()
            .push(test_id.clone());
    }
    by_error_type
}

fn reported_score(header: &ScoreHeader) -> Option<ReportedScore> {
    Some(ReportedScore {
        correct_count: header.correct_count?,
        total_count: header.total_count?,
    })
}

/// Compares two runs across every category in `discovered`.
///
/// Categories with results in only one of the runs are listed separately and not compared.
pub fn compare_runs(
    discovered: &DiscoveredCategories,
    baseline: &RunName,
    candidate: &RunName,
) -> Result<ComparisonSummary, CompareError> {
    discovered.check_run(baseline)?;
    discovered.check_run(candidate)?;

    let mut categories = BTreeMap::new();
    let mut baseline_only_categories = Vec::new();
    let mut candidate_only_categories = Vec::new();

    for category in discovered.iter() {
        let baseline_run = match category.run(baseline.as_str()) {
            Some(artifacts) => RunOutcomes::load_with_score(artifacts)?,
            None => None,
        };
        let candidate_run = match category.run(candidate.as_str()) {
            Some(artifacts) => RunOutcomes::load_with_score(artifacts)?,
            None => None,
        };

        match (baseline_run, candidate_run) {
            (
                Some((baseline_outcomes, baseline_score)),
                Some((candidate_outcomes, candidate_score)),
            ) => {
                let mut summary = compare_outcomes(&baseline_outcomes, &candidate_outcomes);
                summary.regressions_by_error_type =
                    regressions_by_error_type(&summary.regressions, &candidate_score);
                summary.baseline_reported = reported_score(&baseline_score.header);
                summary.candidate_reported = reported_score(&candidate_score.header);
                debug!(
                    "category {}: {} regressions, {} improvements",
                    category.name(),
                    summary.regressions.len(),
                    summary.improvements.len(),
                );
                categories.insert(category.name().clone(), summary);
            }
            (Some(_), None) => baseline_only_categories.push(category.name().clone()),
            (None, Some(_)) => candidate_only_categories.push(category.name().clone()),
            (None, None) => {}
        }
    }

    Ok(ComparisonSummary {
        baseline: baseline.clone(),
        candidate: candidate.clone(),
        categories,
        baseline_only_categories,
        candidate_only_categories,
    })
}

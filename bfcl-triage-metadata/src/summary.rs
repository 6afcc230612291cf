// Copyright (c) The bfcl-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{CategoryName, RunName, TestId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A mapping from category name to a sorted list of test identifiers.
///
/// This is the format of `stable_tests.json`, `flaky_tests.json` and `failing_tests.json`. Keys
/// are serialized in sorted order.
pub type TestsByCategory = BTreeMap<CategoryName, Vec<TestId>>;

/// The three summary files written by `bfcl-triage categorize`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct StabilitySummary {
    /// Tests that passed in every run that included them.
    pub stable: TestsByCategory,

    /// Tests with mixed outcomes across runs.
    pub flaky: TestsByCategory,

    /// Tests that failed in every run that included them.
    pub failing: TestsByCategory,
}

/// Machine-readable output of `bfcl-triage compare`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ComparisonSummary {
    /// The run compared against.
    pub baseline: RunName,

    /// The run being evaluated.
    pub candidate: RunName,

    /// Per-category comparisons, for categories present in both runs.
    pub categories: BTreeMap<CategoryName, CategoryComparisonSummary>,

    /// Categories that only the baseline run has results for.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub baseline_only_categories: Vec<CategoryName>,

    /// Categories that only the candidate run has results for.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidate_only_categories: Vec<CategoryName>,
}

impl ComparisonSummary {
    /// Returns the total number of regressions across all categories.
    pub fn regression_count(&self) -> usize {
        self.categories.values().map(|c| c.regressions.len()).sum()
    }

    /// Returns the total number of improvements across all categories.
    pub fn improvement_count(&self) -> usize {
        self.categories.values().map(|c| c.improvements.len()).sum()
    }
}

/// The comparison of a single category between two runs.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CategoryComparisonSummary {
    /// Number of tests that passed in the baseline.
    pub baseline_passed: usize,

    /// Number of tests executed in the baseline.
    pub baseline_total: usize,

    /// Number of tests that passed in the candidate.
    pub candidate_passed: usize,

    /// Number of tests executed in the candidate.
    pub candidate_total: usize,

    /// Tests that passed in the baseline and failed in the candidate.
    pub regressions: Vec<TestId>,

    /// Tests that failed in the baseline and passed in the candidate.
    pub improvements: Vec<TestId>,

    /// Tests executed in the baseline but not in the candidate.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub only_in_baseline: Vec<TestId>,

    /// Tests executed in the candidate but not in the baseline.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub only_in_candidate: Vec<TestId>,

    /// Regressions grouped by the error type the candidate's scorer reported.
    ///
    /// Regressions without a reported error type are listed under
    /// [`UNKNOWN_ERROR_TYPE`](CategoryComparisonSummary::UNKNOWN_ERROR_TYPE).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub regressions_by_error_type: BTreeMap<String, Vec<TestId>>,

    /// Pass counts from the summary line of the baseline's score file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_reported: Option<ReportedScore>,

    /// Pass counts from the summary line of the candidate's score file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_reported: Option<ReportedScore>,
}

impl CategoryComparisonSummary {
    /// The error type regressions are grouped under when the scorer didn't report one.
    pub const UNKNOWN_ERROR_TYPE: &'static str = "unknown";
}

/// Pass counts as reported by the scorer in the first line of a score file.
///
/// These can differ from the counts derived from result files, for example when the scorer
/// skipped tests.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReportedScore {
    /// Number of tests the scorer counted as correct.
    pub correct_count: u64,

    /// Number of tests the scorer counted.
    pub total_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(r#"{"simple": ["simple_0", "simple_1"], "multiple": []}"#, 2, 2 ; "two categories")]
    #[test_case(r#"{"simple": ["simple_0"]}"#, 1, 1 ; "one category")]
    #[test_case(r#"{}"#, 0, 0 ; "empty")]
    fn tests_by_category_parse(input: &str, categories: usize, tests: usize) {
        let parsed: TestsByCategory = serde_json::from_str(input).unwrap();
        assert_eq!(parsed.len(), categories);
        assert_eq!(parsed.values().map(Vec::len).sum::<usize>(), tests);
        assert!(
            parsed.keys().is_sorted(),
            "categories should deserialize into sorted order"
        );
    }

    #[test]
    fn comparison_summary_kebab_case() {
        let summary = ComparisonSummary {
            baseline: RunName::new("a"),
            candidate: RunName::new("b"),
            categories: BTreeMap::from([(
                CategoryName::new("simple"),
                CategoryComparisonSummary {
                    baseline_passed: 2,
                    baseline_total: 3,
                    candidate_passed: 1,
                    candidate_total: 3,
                    regressions: vec![TestId::new("simple_1")],
                    improvements: vec![],
                    only_in_baseline: vec![],
                    only_in_candidate: vec![],
                    regressions_by_error_type: BTreeMap::from([(
                        "value_error:string".to_owned(),
                        vec![TestId::new("simple_1")],
                    )]),
                    baseline_reported: Some(ReportedScore {
                        correct_count: 2,
                        total_count: 3,
                    }),
                    candidate_reported: None,
                },
            )]),
            baseline_only_categories: vec![],
            candidate_only_categories: vec![CategoryName::new("irrelevance")],
        };

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["categories"]["simple"]["baseline-passed"], 2);
        assert_eq!(value["candidate-only-categories"][0], "irrelevance");
        assert!(value.get("baseline-only-categories").is_none());
        assert!(value["categories"]["simple"].get("only-in-baseline").is_none());
        assert_eq!(
            value["categories"]["simple"]["regressions-by-error-type"]["value_error:string"][0],
            "simple_1"
        );
        assert_eq!(
            value["categories"]["simple"]["baseline-reported"]["correct-count"],
            2
        );
        assert!(value["categories"]["simple"].get("candidate-reported").is_none());
        assert_eq!(summary.regression_count(), 1);
        assert_eq!(summary.improvement_count(), 0);
    }
}

// Copyright (c) The bfcl-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Details for a single test across every run it appears in.

use crate::{
    errors::{InspectError, RecordReadError},
    layout::{CategoryArtifacts, DiscoveredCategories, RunArtifacts},
    records::{FailureRecord, ResultRecord, ScoreFile, read_result_records},
    stability::{Classification, TestOutcome, TestStatus},
};
use bfcl_triage_metadata::{CategoryName, RunName, TestId};
use serde_json::Value;

/// What happened to a test in one run.
#[derive(Clone, Debug, PartialEq)]
pub enum RunTestStatus {
    /// The test isn't in this run's result file.
    NotExecuted,

    /// The test passed.
    Passed {
        /// The result file's record of the test.
        record: Box<ResultRecord>,
    },

    /// The test failed.
    Failed {
        /// The result file's record of the test.
        record: Box<ResultRecord>,

        /// The scorer's record of the failure.
        failure: Box<FailureRecord>,
    },
}

/// Fields shown for passing tests, in display order.
const PASSED_DETAIL_KEYS: &[&str] = &["prompt", "model_result_decoded"];

/// Fields shown for failing tests, in display order.
const FAILED_DETAIL_KEYS: &[&str] = &["prompt", "model_result_decoded", "possible_answer"];

impl RunTestStatus {
    /// Returns the outcome, or `None` if the test wasn't executed.
    pub fn outcome(&self) -> Option<TestOutcome> {
        match self {
            Self::NotExecuted => None,
            Self::Passed { .. } => Some(TestOutcome::Passed),
            Self::Failed { .. } => Some(TestOutcome::Failed),
        }
    }

    /// Returns the model's raw result, if the test was executed and produced one.
    pub fn result(&self) -> Option<&Value> {
        match self {
            Self::NotExecuted => None,
            Self::Passed { record } | Self::Failed { record, .. } => record.result.as_ref(),
        }
    }

    /// Returns the extra fields worth showing alongside the outcome, in display order.
    ///
    /// For failures, the score record's fields take precedence over the result record's.
    pub fn details(&self) -> Vec<(&'static str, &Value)> {
        match self {
            Self::NotExecuted => Vec::new(),
            Self::Passed { record } => PASSED_DETAIL_KEYS
                .iter()
                .filter_map(|&key| record.extra.get(key).map(|value| (key, value)))
                .collect(),
            Self::Failed { record, failure } => FAILED_DETAIL_KEYS
                .iter()
                .filter_map(|&key| {
                    failure
                        .extra
                        .get(key)
                        .or_else(|| record.extra.get(key))
                        .map(|value| (key, value))
                })
                .collect(),
        }
    }
}

/// A test's status in one run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunInspection {
    /// The run.
    pub run: RunName,

    /// What happened to the test.
    pub status: RunTestStatus,
}

/// A test's history within one category.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryInspection {
    /// The category.
    pub category: CategoryName,

    /// One entry per run of the category, in run order.
    pub runs: Vec<RunInspection>,

    /// Pass and fail counts over the runs the test was executed in.
    pub status: TestStatus,
}

impl CategoryInspection {
    /// Returns the classification across the runs the test was executed in.
    pub fn classification(&self) -> Option<Classification> {
        self.status.classification()
    }
}

/// Everything known about a test.
#[derive(Clone, Debug, PartialEq)]
pub struct TestInspection {
    /// The test.
    pub test_id: TestId,

    /// Every category whose results include the test.
    pub categories: Vec<CategoryInspection>,
}

/// Looks up a test in every discovered category.
///
/// Returns [`InspectError::TestNotFound`] if no result file includes the test.
pub fn inspect_test(
    discovered: &DiscoveredCategories,
    test_id: &TestId,
) -> Result<TestInspection, InspectError> {
    let mut categories = Vec::new();
    for artifacts in discovered.iter() {
        if let Some(inspection) = inspect_category(artifacts, test_id)? {
            categories.push(inspection);
        }
    }

    if categories.is_empty() {
        return Err(InspectError::TestNotFound {
            test_id: test_id.clone(),
            searched: discovered.len(),
        });
    }
    Ok(TestInspection {
        test_id: test_id.clone(),
        categories,
    })
}

fn inspect_category(
    artifacts: &CategoryArtifacts,
    test_id: &TestId,
) -> Result<Option<CategoryInspection>, RecordReadError> {
    let mut runs = Vec::with_capacity(artifacts.runs().len());
    let mut status = TestStatus::default();

    for run_artifacts in artifacts.runs() {
        let run_status = inspect_run(run_artifacts, test_id)?;
        if let Some(outcome) = run_status.outcome() {
            status.record(outcome);
        }
        runs.push(RunInspection {
            run: run_artifacts.run.clone(),
            status: run_status,
        });
    }

    if status.total_runs() == 0 {
        return Ok(None);
    }

    Ok(Some(CategoryInspection {
        category: artifacts.name().clone(),
        runs,
        status,
    }))
}

fn inspect_run(
    artifacts: &RunArtifacts,
    test_id: &TestId,
) -> Result<RunTestStatus, RecordReadError> {
    let Some(record) = read_result_records(&artifacts.result_path)?
        .unwrap_or_default()
        .into_iter()
        .find(|record| &record.id == test_id)
    else {
        return Ok(RunTestStatus::NotExecuted);
    };

    let failure = ScoreFile::read(&artifacts.score_path)?.and_then(|score| {
        score
            .failures
            .into_iter()
            .find(|failure| &failure.id == test_id)
    });
    let record = Box::new(record);
    Ok(match failure {
        Some(failure) => RunTestStatus::Failed {
            record,
            failure: Box::new(failure),
        },
        None => RunTestStatus::Passed { record },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::TriageConfig, layout::RunLayout, test_helpers::RunFixture};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn discover(fixture: &RunFixture) -> DiscoveredCategories {
        let config = TriageConfig::default_config();
        RunLayout::new(fixture.path(), &config.layout)
            .discover()
            .unwrap()
    }

    #[test]
    fn inspect_flaky_test() {
        let fixture = RunFixture::new();
        fixture.add("a", "simple", &["s1", "s2"], &[]);
        fixture.add("b", "simple", &["s1", "s2"], &["s1"]);
        fixture.add("c", "simple", &["s2"], &[]);
        fixture.add("a", "multiple", &["m1"], &[]);

        let inspection = inspect_test(&discover(&fixture), &TestId::new("s1")).unwrap();
        assert_eq!(inspection.categories.len(), 1, "only categories including the test");

        let simple = &inspection.categories[0];
        assert_eq!(simple.category.as_str(), "simple");
        assert_eq!(simple.classification(), Some(Classification::Flaky));
        assert_eq!(simple.status.total_runs(), 2);

        let statuses: Vec<_> = simple
            .runs
            .iter()
            .map(|run| (run.run.as_str(), run.status.outcome()))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("a", Some(TestOutcome::Passed)),
                ("b", Some(TestOutcome::Failed)),
                ("c", None),
            ]
        );

        assert_eq!(
            simple.runs[0].status.result(),
            Some(&Value::String("[s1_call(x=1)]".to_owned()))
        );
        match &simple.runs[1].status {
            RunTestStatus::Failed { failure, .. } => {
                assert_eq!(failure.error_type.as_deref(), Some("value_error:string"));
                assert_eq!(
                    failure.error.as_ref().unwrap().lines(),
                    vec!["Invalid value for s1".to_owned()]
                );
            }
            other => panic!("expected failure, found {other:?}"),
        }
        assert_eq!(simple.runs[2].status, RunTestStatus::NotExecuted);
    }

    #[test]
    fn details_prefer_score_fields() {
        let fixture = RunFixture::new();
        fixture.add("a", "simple", &["s1"], &[]);
        fixture.add("b", "simple", &["s1"], &["s1"]);
        fixture.write_lines(
            &fixture.result_path("a", "simple"),
            &[json!({"id": "s1", "result": "r", "prompt": {"question": "q"}, "latency": 1})
                .to_string()],
        );
        fixture.write_lines(
            &fixture.result_path("b", "simple"),
            &[json!({"id": "s1", "result": "r", "prompt": "from result"}).to_string()],
        );
        fixture.write_lines(
            &fixture.score_path("b", "simple"),
            &[
                json!({"accuracy": 0.0}).to_string(),
                json!({
                    "id": "s1",
                    "error_type": "wrong",
                    "possible_answer": [{"f": {"x": [1]}}],
                    "model_result_decoded": [{"f": {"x": 2}}],
                })
                .to_string(),
            ],
        );

        let inspection = inspect_test(&discover(&fixture), &TestId::new("s1")).unwrap();
        let runs = &inspection.categories[0].runs;
        assert_eq!(
            runs[0].status.details(),
            vec![("prompt", &json!({"question": "q"}))]
        );
        assert_eq!(
            runs[1].status.details(),
            vec![
                ("prompt", &json!("from result")),
                ("model_result_decoded", &json!([{"f": {"x": 2}}])),
                ("possible_answer", &json!([{"f": {"x": [1]}}])),
            ]
        );
        assert!(RunTestStatus::NotExecuted.details().is_empty());
    }

    #[test]
    fn test_not_found() {
        let fixture = RunFixture::new();
        fixture.add("a", "simple", &["s1"], &[]);
        fixture.add("a", "multiple", &["m1"], &[]);

        let error = inspect_test(&discover(&fixture), &TestId::new("nope")).unwrap_err();
        match error {
            InspectError::TestNotFound { test_id, searched } => {
                assert_eq!(test_id.as_str(), "nope");
                assert_eq!(searched, 2);
            }
            other => panic!("expected test not found, found {other:?}"),
        }
    }

    #[test]
    fn failure_without_execution_is_not_executed() {
        let fixture = RunFixture::new();
        fixture.add("a", "simple", &["s1"], &["s2"]);
        fixture.add("b", "simple", &["s2"], &[]);

        let inspection = inspect_test(&discover(&fixture), &TestId::new("s2")).unwrap();
        let simple = &inspection.categories[0];
        assert_eq!(simple.runs[0].status, RunTestStatus::NotExecuted);
        assert_eq!(simple.classification(), Some(Classification::StablePass));
    }
}

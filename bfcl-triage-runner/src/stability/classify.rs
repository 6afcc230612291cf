// Copyright (c) The bfcl-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use bfcl_triage_metadata::{RunName, TestId};
use std::{collections::BTreeMap, collections::BTreeSet, fmt};

/// Whether a test passed or failed in a single run.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum TestOutcome {
    /// The test passed.
    Passed,

    /// The test failed.
    Failed,
}

/// The outcome of a test in one run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestObservation {
    /// The test.
    pub test_id: TestId,

    /// The run the test was executed in.
    pub run: RunName,

    /// Whether the test passed.
    pub outcome: TestOutcome,
}

/// Pass and fail counts for a test across runs.
///
/// A status is only created once a test has been observed, so `total_runs` is at least 1 for
/// every status returned by [`fold_observations`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TestStatus {
    passed_count: usize,
    failed_count: usize,
}

impl TestStatus {
    /// Records the outcome of one run.
    pub fn record(&mut self, outcome: TestOutcome) {
        match outcome {
            TestOutcome::Passed => self.passed_count += 1,
            TestOutcome::Failed => self.failed_count += 1,
        }
    }

    /// Returns the number of runs the test passed in.
    pub fn passed_count(&self) -> usize {
        self.passed_count
    }

    /// Returns the number of runs the test failed in.
    pub fn failed_count(&self) -> usize {
        self.failed_count
    }

    /// Returns the number of runs the test was executed in.
    pub fn total_runs(&self) -> usize {
        self.passed_count + self.failed_count
    }

    /// Returns the classification, or `None` if the test was never observed.
    pub fn classification(&self) -> Option<Classification> {
        match (self.passed_count, self.failed_count) {
            (0, 0) => None,
            (_, 0) => Some(Classification::StablePass),
            (0, _) => Some(Classification::StableFail),
            _ => Some(Classification::Flaky),
        }
    }
}

/// How consistently a test behaved across the runs it was executed in.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Classification {
    /// The test passed in every run.
    StablePass,

    /// The test passed in some runs and failed in others.
    Flaky,

    /// The test failed in every run.
    StableFail,
}

impl Classification {
    /// Returns a short lowercase description.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StablePass => "stable pass",
            Self::Flaky => "flaky",
            Self::StableFail => "stable fail",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Folds observations into a status per test.
///
/// The fold is commutative: the result doesn't depend on the order of observations.
pub fn fold_observations(
    observations: impl IntoIterator<Item = TestObservation>,
) -> BTreeMap<TestId, TestStatus> {
    let mut statuses: BTreeMap<TestId, TestStatus> = BTreeMap::new();
    for observation in observations {
        statuses
            .entry(observation.test_id)
            .or_default()
            .record(observation.outcome);
    }
    statuses
}

/// Classifies every observed test.
pub fn classify(observations: impl IntoIterator<Item = TestObservation>) -> StabilityPartition {
    StabilityPartition::from_statuses(&fold_observations(observations))
}

/// Tests partitioned by classification.
///
/// The three sets are pairwise disjoint.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StabilityPartition {
    /// Tests that passed in every run they were executed in.
    pub stable: BTreeSet<TestId>,

    /// Tests that both passed and failed.
    pub flaky: BTreeSet<TestId>,

    /// Tests that failed in every run they were executed in.
    pub failing: BTreeSet<TestId>,
}

impl StabilityPartition {
    /// Partitions tests by the classification of their statuses.
    pub fn from_statuses(statuses: &BTreeMap<TestId, TestStatus>) -> Self {
        let mut partition = Self::default();
        for (test_id, status) in statuses {
            let set = match status.classification() {
                Some(Classification::StablePass) => &mut partition.stable,
                Some(Classification::Flaky) => &mut partition.flaky,
                Some(Classification::StableFail) => &mut partition.failing,
                None => continue,
            };
            set.insert(test_id.clone());
        }
        partition
    }

    /// Returns the total number of classified tests.
    pub fn total(&self) -> usize {
        self.stable.len() + self.flaky.len() + self.failing.len()
    }

    /// Returns true if no tests were classified.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Returns the classification of a test, or `None` if it wasn't observed.
    pub fn classification_of(&self, test_id: &str) -> Option<Classification> {
        if self.stable.contains(test_id) {
            Some(Classification::StablePass)
        } else if self.flaky.contains(test_id) {
            Some(Classification::Flaky)
        } else if self.failing.contains(test_id) {
            Some(Classification::StableFail)
        } else {
            None
        }
    }

    /// Returns the tests with the given classification.
    pub fn tests(&self, classification: Classification) -> &BTreeSet<TestId> {
        match classification {
            Classification::StablePass => &self.stable,
            Classification::Flaky => &self.flaky,
            Classification::StableFail => &self.failing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use test_case::test_case;
    use test_strategy::proptest;

    fn obs(test_id: &str, run: &str, outcome: TestOutcome) -> TestObservation {
        TestObservation {
            test_id: TestId::new(test_id),
            run: RunName::new(run),
            outcome,
        }
    }

    fn ids(ids: &[&str]) -> BTreeSet<TestId> {
        ids.iter().copied().map(TestId::new).collect()
    }

    #[test]
    fn three_runs() {
        use TestOutcome::*;

        // t1 is flaky, t2 always passes, t3 is missing from run c and fails in the others.
        let observations = vec![
            obs("t1", "a", Passed),
            obs("t1", "b", Passed),
            obs("t1", "c", Failed),
            obs("t2", "a", Passed),
            obs("t2", "b", Passed),
            obs("t2", "c", Passed),
            obs("t3", "a", Failed),
            obs("t3", "b", Failed),
        ];

        let statuses = fold_observations(observations.clone());
        let t3 = statuses["t3"];
        assert_eq!(t3.total_runs(), 2, "absence is not a failure");
        assert_eq!(t3.failed_count(), 2);

        let partition = classify(observations);
        assert_eq!(
            partition,
            StabilityPartition {
                stable: ids(&["t2"]),
                flaky: ids(&["t1"]),
                failing: ids(&["t3"]),
            }
        );
        assert_eq!(partition.total(), 3);
        assert_eq!(
            partition.classification_of("t1"),
            Some(Classification::Flaky)
        );
        assert_eq!(partition.classification_of("t4"), None);
    }

    #[test_case(TestOutcome::Passed, Classification::StablePass ; "passed")]
    #[test_case(TestOutcome::Failed, Classification::StableFail ; "failed")]
    fn single_observation(outcome: TestOutcome, expected: Classification) {
        let partition = classify([obs("t", "a", outcome)]);
        assert_eq!(partition.total(), 1);
        assert_eq!(partition.tests(expected), &ids(&["t"]));
    }

    #[test]
    fn no_observations() {
        let partition = classify(Vec::<TestObservation>::new());
        assert!(partition.is_empty());
        assert_eq!(TestStatus::default().classification(), None);
    }

    #[test_case(3, 0, Some(Classification::StablePass) ; "all passed")]
    #[test_case(0, 3, Some(Classification::StableFail) ; "all failed")]
    #[test_case(1, 2, Some(Classification::Flaky) ; "mixed")]
    #[test_case(0, 0, None ; "never observed")]
    fn status_classification(passed: usize, failed: usize, expected: Option<Classification>) {
        let mut status = TestStatus::default();
        for _ in 0..passed {
            status.record(TestOutcome::Passed);
        }
        for _ in 0..failed {
            status.record(TestOutcome::Failed);
        }
        assert_eq!(status.total_runs(), passed + failed);
        assert_eq!(status.classification(), expected);
    }

    // ---
    // Properties
    // ---

    fn arb_observations() -> impl Strategy<Value = Vec<TestObservation>> {
        prop::collection::vec(
            (0..8_usize, 0..4_usize, any::<TestOutcome>()).prop_map(|(test, run, outcome)| {
                obs(&format!("t{test}"), &format!("run{run}"), outcome)
            }),
            0..48,
        )
    }

    /// The three sets are disjoint and cover exactly the observed tests.
    #[proptest(cases = 256)]
    fn partition_covers_observed(#[strategy(arb_observations())] observations: Vec<TestObservation>) {
        let observed: BTreeSet<_> = observations.iter().map(|o| o.test_id.clone()).collect();
        let partition = classify(observations);

        prop_assert!(partition.stable.is_disjoint(&partition.flaky));
        prop_assert!(partition.stable.is_disjoint(&partition.failing));
        prop_assert!(partition.flaky.is_disjoint(&partition.failing));

        let union: BTreeSet<_> = partition
            .stable
            .iter()
            .chain(&partition.flaky)
            .chain(&partition.failing)
            .cloned()
            .collect();
        prop_assert_eq!(union, observed);
    }

    /// Classification matches the outcomes seen for each test.
    #[proptest(cases = 256)]
    fn classification_matches_outcomes(
        #[strategy(arb_observations())] observations: Vec<TestObservation>,
    ) {
        let partition = classify(observations.clone());
        for observation in &observations {
            let outcomes: BTreeSet<_> = observations
                .iter()
                .filter(|o| o.test_id == observation.test_id)
                .map(|o| o.outcome)
                .collect();
            let expected = if outcomes.len() == 2 {
                Classification::Flaky
            } else if outcomes.contains(&TestOutcome::Passed) {
                Classification::StablePass
            } else {
                Classification::StableFail
            };
            prop_assert_eq!(
                partition.classification_of(observation.test_id.as_str()),
                Some(expected)
            );
        }
    }

    /// The order of observations doesn't matter.
    #[proptest(cases = 256)]
    fn order_independent(
        #[strategy(arb_observations().prop_shuffle())] observations: Vec<TestObservation>,
    ) {
        let mut reversed = observations.clone();
        reversed.reverse();
        let mut sorted = observations.clone();
        sorted.sort_by(|a, b| (&a.test_id, &a.run).cmp(&(&b.test_id, &b.run)));

        let expected = classify(observations);
        prop_assert_eq!(&classify(reversed), &expected);
        prop_assert_eq!(&classify(sorted), &expected);
    }
}

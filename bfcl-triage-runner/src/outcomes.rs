// Copyright (c) The bfcl-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-run test outcomes for a single category.

use crate::{
    errors::RecordReadError,
    layout::RunArtifacts,
    records::{ScoreFile, read_result_ids},
    stability::{TestObservation, TestOutcome},
};
use bfcl_triage_metadata::{RunName, TestId};
use std::collections::BTreeSet;
use tracing::debug;

/// Which tests executed in a run, and which of those failed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunOutcomes {
    run: RunName,
    executed: BTreeSet<TestId>,
    failed: BTreeSet<TestId>,
}

impl RunOutcomes {
    /// Creates outcomes from the executed and failed sets.
    ///
    /// Failures for tests that weren't executed are dropped.
    pub fn new(run: RunName, executed: BTreeSet<TestId>, failed: BTreeSet<TestId>) -> Self {
        let failed = failed
            .into_iter()
            .filter(|id| executed.contains(id))
            .collect();
        Self {
            run,
            executed,
            failed,
        }
    }

    /// Loads outcomes from a run's result and score files.
    ///
    /// Returns `None` if either file no longer exists.
    pub fn load(artifacts: &RunArtifacts) -> Result<Option<Self>, RecordReadError> {
        Ok(Self::load_with_score(artifacts)?.map(|(outcomes, _)| outcomes))
    }

    /// Like [`Self::load`], also returning the parsed score file.
    pub fn load_with_score(
        artifacts: &RunArtifacts,
    ) -> Result<Option<(Self, ScoreFile)>, RecordReadError> {
        let Some(executed) = read_result_ids(&artifacts.result_path)? else {
            return Ok(None);
        };
        let Some(score) = ScoreFile::read(&artifacts.score_path)? else {
            return Ok(None);
        };

        let outcomes = Self::new(artifacts.run.clone(), executed, score.failed_ids());
        debug!(
            "run {}: {} executed, {} failed ({})",
            outcomes.run,
            outcomes.executed_count(),
            outcomes.failed_count(),
            artifacts.score_path,
        );
        Ok(Some((outcomes, score)))
    }

    /// Returns the run these outcomes are for.
    pub fn run(&self) -> &RunName {
        &self.run
    }

    /// Returns the outcome for a test, or `None` if it wasn't executed.
    pub fn outcome(&self, test_id: &str) -> Option<TestOutcome> {
        if !self.executed.contains(test_id) {
            None
        } else if self.failed.contains(test_id) {
            Some(TestOutcome::Failed)
        } else {
            Some(TestOutcome::Passed)
        }
    }

    /// Returns the executed tests.
    pub fn executed(&self) -> &BTreeSet<TestId> {
        &self.executed
    }

    /// Returns the failed tests.
    pub fn failed(&self) -> &BTreeSet<TestId> {
        &self.failed
    }

    /// Returns the number of executed tests.
    pub fn executed_count(&self) -> usize {
        self.executed.len()
    }

    /// Returns the number of failed tests.
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Returns the number of passed tests.
    pub fn passed_count(&self) -> usize {
        self.executed.len() - self.failed.len()
    }

    /// Returns one observation per executed test.
    pub fn observations(&self) -> impl Iterator<Item = TestObservation> + '_ {
        self.executed.iter().map(|test_id| TestObservation {
            test_id: test_id.clone(),
            run: self.run.clone(),
            outcome: if self.failed.contains(test_id) {
                TestOutcome::Failed
            } else {
                TestOutcome::Passed
            },
        })
    }
}

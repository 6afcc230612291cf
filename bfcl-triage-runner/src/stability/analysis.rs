// Copyright (c) The bfcl-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{StabilityPartition, classify};
use crate::{
    errors::RecordReadError,
    layout::{CategoryArtifacts, DiscoveredCategories},
    outcomes::RunOutcomes,
};
use bfcl_triage_metadata::{CategoryName, RunName, StabilitySummary};
use std::cmp::Ordering;
use tracing::debug;

/// Stability of the tests in one category.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CategoryStability {
    /// The category.
    pub category: CategoryName,

    /// Runs that contributed observations, in order.
    pub runs: Vec<RunName>,

    /// Tests partitioned by classification.
    pub partition: StabilityPartition,
}

impl CategoryStability {
    /// Returns the number of tests in the category.
    pub fn total(&self) -> usize {
        self.partition.total()
    }
}

/// Classifies the tests of one category across all of its runs.
///
/// Runs whose files have disappeared since discovery are skipped.
pub fn analyze_category(
    artifacts: &CategoryArtifacts,
) -> Result<CategoryStability, RecordReadError> {
    let mut runs = Vec::with_capacity(artifacts.runs().len());
    let mut observations = Vec::new();

    for run in artifacts.runs() {
        let Some(outcomes) = RunOutcomes::load(run)? else {
            debug!(
                "category {}: files for run {} are missing, skipping",
                artifacts.name(),
                run.run
            );
            continue;
        };
        runs.push(run.run.clone());
        observations.extend(outcomes.observations());
    }

    Ok(CategoryStability {
        category: artifacts.name().clone(),
        runs,
        partition: classify(observations),
    })
}

/// Counts of tests by classification.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StabilityCounts {
    /// The number of stable passes.
    pub stable: usize,

    /// The number of flaky tests.
    pub flaky: usize,

    /// The number of stable failures.
    pub failing: usize,
}

impl StabilityCounts {
    /// Returns the total number of tests.
    pub fn total(&self) -> usize {
        self.stable + self.flaky + self.failing
    }
}

/// Stability across every analyzed category.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StabilityReport {
    categories: Vec<CategoryStability>,
}

impl StabilityReport {
    /// Analyzes every discovered category.
    pub fn analyze(discovered: &DiscoveredCategories) -> Result<Self, RecordReadError> {
        let categories = discovered
            .iter()
            .map(analyze_category)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_categories(categories))
    }

    /// Builds a report, dropping categories without any tests.
    pub fn from_categories(categories: impl IntoIterator<Item = CategoryStability>) -> Self {
        let mut categories: Vec<_> = categories
            .into_iter()
            .filter(|category| {
                let keep = !category.partition.is_empty();
                if !keep {
                    debug!("category {} has no tests, excluding", category.category);
                }
                keep
            })
            .collect();
        categories.sort_by(|a, b| a.category.cmp(&b.category));
        Self { categories }
    }

    /// Returns the analyzed categories, sorted by name.
    pub fn categories(&self) -> &[CategoryStability] {
        &self.categories
    }

    /// Returns true if no categories had any tests.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Returns counts summed over every category.
    pub fn totals(&self) -> StabilityCounts {
        self.categories
            .iter()
            .fold(StabilityCounts::default(), |mut counts, category| {
                counts.stable += category.partition.stable.len();
                counts.flaky += category.partition.flaky.len();
                counts.failing += category.partition.failing.len();
                counts
            })
    }

    /// Returns the category with the highest share of flaky tests.
    pub fn most_flaky(&self) -> Option<&CategoryStability> {
        self.max_share_by(|category| category.partition.flaky.len())
    }

    /// Returns the category with the highest share of stable passes.
    pub fn most_stable(&self) -> Option<&CategoryStability> {
        self.max_share_by(|category| category.partition.stable.len())
    }

    /// Returns the category maximizing `count / total`. Ties go to the earliest category.
    fn max_share_by(
        &self,
        count: impl Fn(&CategoryStability) -> usize,
    ) -> Option<&CategoryStability> {
        let mut best: Option<&CategoryStability> = None;
        for category in &self.categories {
            let replace = match best {
                None => true,
                // Compare a/b > c/d as a*d > c*b to stay in integers.
                Some(current) => {
                    let lhs = count(category) * current.total().max(1);
                    let rhs = count(current) * category.total().max(1);
                    lhs.cmp(&rhs) == Ordering::Greater
                }
            };
            if replace {
                best = Some(category);
            }
        }
        best
    }

    /// Converts the report into the on-disk summary format.
    ///
    /// Every category appears in all three maps, with an empty list if it has no tests of that
    /// kind.
    pub fn to_summary(&self) -> StabilitySummary {
        let mut summary = StabilitySummary::default();
        for category in &self.categories {
            let name = &category.category;
            let partition = &category.partition;
            summary
                .stable
                .insert(name.clone(), partition.stable.iter().cloned().collect());
            summary
                .flaky
                .insert(name.clone(), partition.flaky.iter().cloned().collect());
            summary
                .failing
                .insert(name.clone(), partition.failing.iter().cloned().collect());
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::TriageConfig, layout::RunLayout, test_helpers::RunFixture};
    use bfcl_triage_metadata::TestId;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn ids(ids: &[&str]) -> BTreeSet<TestId> {
        ids.iter().copied().map(TestId::new).collect()
    }

    fn category(name: &str, stable: &[&str], flaky: &[&str], failing: &[&str]) -> CategoryStability {
        CategoryStability {
            category: CategoryName::new(name),
            runs: vec![RunName::new("a")],
            partition: StabilityPartition {
                stable: ids(stable),
                flaky: ids(flaky),
                failing: ids(failing),
            },
        }
    }

    fn analyze(fixture: &RunFixture) -> StabilityReport {
        let config = TriageConfig::default_config();
        let discovered = RunLayout::new(fixture.path(), &config.layout)
            .discover()
            .unwrap();
        StabilityReport::analyze(&discovered).unwrap()
    }

    #[test]
    fn analyze_from_disk() {
        let fixture = RunFixture::new();
        fixture.add("a", "simple", &["t1", "t2", "t3"], &["t3"]);
        fixture.add("b", "simple", &["t1", "t2", "t3"], &["t3"]);
        fixture.add("c", "simple", &["t1", "t2"], &["t1"]);
        fixture.add("a", "multiple", &["m1"], &[]);

        let report = analyze(&fixture);
        let names: Vec<_> = report
            .categories()
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        assert_eq!(names, vec!["multiple", "simple"]);

        let simple = &report.categories()[1];
        assert_eq!(
            simple.runs,
            vec![RunName::new("a"), RunName::new("b"), RunName::new("c")]
        );
        assert_eq!(
            simple.partition,
            StabilityPartition {
                stable: ids(&["t2"]),
                flaky: ids(&["t1"]),
                // t3 is absent from run c, and fails in the runs it was executed in.
                failing: ids(&["t3"]),
            }
        );

        assert_eq!(
            report.totals(),
            StabilityCounts {
                stable: 2,
                flaky: 1,
                failing: 1,
            }
        );
        assert_eq!(report.totals().total(), 4);
    }

    #[test]
    fn empty_categories_are_excluded() {
        let fixture = RunFixture::new();
        fixture.add("a", "simple", &["t1"], &[]);
        fixture.add("a", "empty", &[], &[]);

        let report = analyze(&fixture);
        assert_eq!(report.categories().len(), 1);
        assert_eq!(report.categories()[0].category.as_str(), "simple");

        let summary = report.to_summary();
        assert!(!summary.stable.contains_key("empty"));
    }

    #[test]
    fn failures_not_executed_are_ignored() {
        let fixture = RunFixture::new();
        fixture.add("a", "simple", &["t1"], &["t1", "ghost"]);

        let report = analyze(&fixture);
        let partition = &report.categories()[0].partition;
        assert_eq!(partition.failing, ids(&["t1"]));
        assert_eq!(partition.classification_of("ghost"), None);
    }

    #[test]
    fn insights() {
        let report = StabilityReport::from_categories([
            category("c", &["c1"], &["c2"], &[]),
            category("a", &["a1", "a2", "a3"], &["a4"], &[]),
            category("b", &["b1"], &[], &["b2"]),
            category("d", &["d1"], &[], &[]),
        ]);

        // Flaky shares: a = 1/4, b = 0, c = 1/2, d = 0.
        assert_eq!(report.most_flaky().unwrap().category.as_str(), "c");
        // Stable shares: a = 3/4, b = 1/2, c = 1/2, d = 1.
        assert_eq!(report.most_stable().unwrap().category.as_str(), "d");
    }

    #[test]
    fn insight_ties_go_to_first_category() {
        let report = StabilityReport::from_categories([
            category("y", &["y1"], &["y2"], &[]),
            category("x", &["x1", "x2"], &["x3", "x4"], &[]),
        ]);
        assert_eq!(report.most_flaky().unwrap().category.as_str(), "x");
        assert_eq!(report.most_stable().unwrap().category.as_str(), "x");

        assert_eq!(StabilityReport::default().most_flaky(), None);
    }

    #[test]
    fn summary_lists_every_category() {
        let report = StabilityReport::from_categories([
            category("simple", &["s2", "s1"], &[], &["s3"]),
            category("multiple", &[], &["m1"], &[]),
        ]);
        let summary = report.to_summary();

        assert_eq!(
            summary.stable[&CategoryName::new("simple")],
            vec![TestId::new("s1"), TestId::new("s2")]
        );
        assert_eq!(summary.flaky[&CategoryName::new("simple")], Vec::<TestId>::new());
        assert_eq!(
            summary.flaky[&CategoryName::new("multiple")],
            vec![TestId::new("m1")]
        );
        assert_eq!(summary.failing.len(), 2);
    }
}

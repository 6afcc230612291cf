// Copyright (c) The bfcl-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discovery of runs and categories on disk.
//!
//! Runs are laid out as pairs of mirrored directory trees under a base directory:
//!
//! ```text
//! <base>/score-<run>/**/BFCL_v4_<category>_score.json
//! <base>/result-<run>/**/BFCL_v4_<category>_result.json
//! ```
//!
//! A category is recorded for a run only if both its score file and the mirrored result file
//! exist.

use crate::{config::LayoutConfig, errors::LayoutDiscoveryError, errors::UnknownRunError};
use bfcl_triage_metadata::{CategoryName, RunName};
use camino::{Utf8Path, Utf8PathBuf};
use std::{
    collections::{BTreeMap, BTreeSet},
    fs, io,
};
use tracing::debug;
use walkdir::WalkDir;

/// The score and result files for one category in one run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunArtifacts {
    /// The run these files belong to.
    pub run: RunName,

    /// The result file, listing every executed test.
    pub result_path: Utf8PathBuf,

    /// The score file, listing every failed test.
    pub score_path: Utf8PathBuf,
}

/// All runs that have results for a category, ordered by run name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CategoryArtifacts {
    name: CategoryName,
    runs: Vec<RunArtifacts>,
}

impl CategoryArtifacts {
    /// Returns the category name.
    pub fn name(&self) -> &CategoryName {
        &self.name
    }

    /// Returns the runs for this category.
    pub fn runs(&self) -> &[RunArtifacts] {
        &self.runs
    }

    /// Returns the artifacts for the given run, if this category has any.
    pub fn run(&self, run: &str) -> Option<&RunArtifacts> {
        self.runs.iter().find(|artifacts| artifacts.run.as_str() == run)
    }

    /// Returns the names of the runs for this category.
    pub fn run_names(&self) -> impl Iterator<Item = &RunName> + '_ {
        self.runs.iter().map(|artifacts| &artifacts.run)
    }
}

/// Runs and categories found under a base directory.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DiscoveredCategories {
    categories: BTreeMap<CategoryName, CategoryArtifacts>,
}

impl DiscoveredCategories {
    /// Returns true if no categories were found.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Returns the number of categories found.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Iterates over categories in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &CategoryArtifacts> + '_ {
        self.categories.values()
    }

    /// Returns the artifacts for a category.
    pub fn get(&self, category: &str) -> Option<&CategoryArtifacts> {
        self.categories.get(category)
    }

    /// Returns every run name seen in any category.
    pub fn runs(&self) -> BTreeSet<RunName> {
        self.iter()
            .flat_map(|category| category.run_names().cloned())
            .collect()
    }

    /// Returns an error if no category has results for `run`.
    pub fn check_run(&self, run: &RunName) -> Result<(), UnknownRunError> {
        let runs = self.runs();
        if runs.contains(run) {
            Ok(())
        } else {
            Err(UnknownRunError::new(run.clone(), runs))
        }
    }

    /// Restricts the categories and runs considered.
    ///
    /// An empty filter selects everything. Categories left without any runs are dropped.
    pub fn filter(
        &self,
        categories: &BTreeSet<CategoryName>,
        runs: &BTreeSet<RunName>,
    ) -> DiscoveredCategories {
        let categories = self
            .categories
            .iter()
            .filter(|(name, _)| categories.is_empty() || categories.contains(*name))
            .filter_map(|(name, artifacts)| {
                let selected: Vec<_> = artifacts
                    .runs
                    .iter()
                    .filter(|run| runs.is_empty() || runs.contains(&run.run))
                    .cloned()
                    .collect();
                (!selected.is_empty()).then(|| {
                    (
                        name.clone(),
                        CategoryArtifacts {
                            name: name.clone(),
                            runs: selected,
                        },
                    )
                })
            })
            .collect();
        DiscoveredCategories { categories }
    }

    /// Returns the categories in `requested` that weren't discovered.
    pub fn unknown_categories<'a>(
        &self,
        requested: &'a BTreeSet<CategoryName>,
    ) -> Vec<&'a CategoryName> {
        requested
            .iter()
            .filter(|name| !self.categories.contains_key(*name))
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn from_artifacts(artifacts: impl IntoIterator<Item = CategoryArtifacts>) -> Self {
        Self {
            categories: artifacts
                .into_iter()
                .map(|artifacts| (artifacts.name.clone(), artifacts))
                .collect(),
        }
    }
}

/// Finds runs and categories under a base directory.
#[derive(Clone, Debug)]
pub struct RunLayout<'cfg> {
    base_dir: Utf8PathBuf,
    config: &'cfg LayoutConfig,
}

impl<'cfg> RunLayout<'cfg> {
    /// Creates a new layout rooted at `base_dir`.
    pub fn new(base_dir: impl Into<Utf8PathBuf>, config: &'cfg LayoutConfig) -> Self {
        Self {
            base_dir: base_dir.into(),
            config,
        }
    }

    /// Returns the base directory.
    pub fn base_dir(&self) -> &Utf8Path {
        &self.base_dir
    }

    /// Scans the base directory for runs and categories.
    pub fn discover(&self) -> Result<DiscoveredCategories, LayoutDiscoveryError> {
        let mut by_category: BTreeMap<CategoryName, Vec<RunArtifacts>> = BTreeMap::new();

        for (run, score_dir) in self.score_dirs()? {
            let mut seen = BTreeSet::new();
            for entry in WalkDir::new(&score_dir).sort_by_file_name() {
                let entry = entry.map_err(|error| LayoutDiscoveryError::Walk {
                    path: score_dir.clone(),
                    error,
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let Ok(score_path) = Utf8PathBuf::try_from(entry.into_path()) else {
                    debug!("{score_dir}: skipping non-UTF-8 path");
                    continue;
                };
                let Some(artifacts) = self.pair_score_file(&run, &score_dir, &score_path) else {
                    continue;
                };
                let Some(category) = score_path
                    .file_name()
                    .and_then(|name| self.config.category_for_score_file(name))
                    .map(CategoryName::new)
                else {
                    continue;
                };

                if seen.insert(category.clone()) {
                    by_category.entry(category).or_default().push(artifacts);
                } else {
                    debug!(
                        "run {run}: ignoring {score_path}, \
                         an earlier score file already covers category {category}"
                    );
                }
            }
        }

        let categories = by_category
            .into_iter()
            .map(|(name, runs)| (name.clone(), CategoryArtifacts { name, runs }))
            .collect();
        Ok(DiscoveredCategories { categories })
    }

    /// Returns score directories directly under the base directory, sorted by name.
    fn score_dirs(&self) -> Result<Vec<(RunName, Utf8PathBuf)>, LayoutDiscoveryError> {
        let entries = match self.base_dir.read_dir_utf8() {
            Ok(entries) => entries,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(LayoutDiscoveryError::BaseDirNotFound {
                    path: self.base_dir.clone(),
                });
            }
            Err(error) => {
                return Err(LayoutDiscoveryError::BaseDirRead {
                    path: self.base_dir.clone(),
                    error,
                });
            }
        };

        let mut score_dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|error| LayoutDiscoveryError::BaseDirRead {
                path: self.base_dir.clone(),
                error,
            })?;
            let Some(run) = entry
                .file_name()
                .strip_prefix(self.config.score_dir_prefix.as_str())
                .filter(|run| !run.is_empty())
            else {
                continue;
            };
            // Follow symlinks: runs are sometimes linked in from elsewhere.
            if !fs::metadata(entry.path()).is_ok_and(|metadata| metadata.is_dir()) {
                continue;
            }
            score_dirs.push((RunName::new(run), entry.path().to_owned()));
        }
        score_dirs.sort_unstable();

        debug!(
            "found {} score directories under {}",
            score_dirs.len(),
            self.base_dir
        );
        Ok(score_dirs)
    }

    /// Finds the result file mirroring `score_path`, if it exists.
    fn pair_score_file(
        &self,
        run: &RunName,
        score_dir: &Utf8Path,
        score_path: &Utf8Path,
    ) -> Option<RunArtifacts> {
        let file_name = score_path.file_name()?;
        let result_file_name = self.config.result_file_for_score_file(file_name)?;
        let rel_dir = score_path.parent()?.strip_prefix(score_dir).ok()?;

        let result_path = self
            .base_dir
            .join(format!("{}{run}", self.config.result_dir_prefix))
            .join(rel_dir)
            .join(result_file_name);

        if result_path.is_file() {
            Some(RunArtifacts {
                run: run.clone(),
                result_path,
                score_path: score_path.to_owned(),
            })
        } else {
            debug!("{score_path}: no matching result file at {result_path}, skipping");
            None
        }
    }
}

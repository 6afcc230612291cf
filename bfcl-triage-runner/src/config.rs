// Copyright (c) The bfcl-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for bfcl-triage.
//!
//! Configuration is layered: the defaults embedded in the binary come first, then either the
//! repository config at `.config/bfcl-triage.toml` under the base directory (if it exists), or
//! an explicitly provided file (which must exist).

use crate::errors::{ConfigParseError, ConfigParseErrorKind};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use itertools::Itertools;
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Overall configuration for bfcl-triage.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct TriageConfig {
    /// Where runs and their files live on disk.
    pub layout: LayoutConfig,

    /// Where summaries are written.
    pub output: OutputConfig,
}

/// Naming conventions for the on-disk run layout.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct LayoutConfig {
    /// Prefix of directories holding score files, e.g. `score-`.
    pub score_dir_prefix: String,

    /// Prefix of directories holding result files, e.g. `result-`.
    pub result_dir_prefix: String,

    /// Prefix stripped from file names to obtain category names, e.g. `BFCL_v4_`.
    pub file_prefix: String,

    /// Suffix of score files, e.g. `_score.json`.
    pub score_suffix: String,

    /// Suffix of result files, e.g. `_result.json`.
    pub result_suffix: String,
}

impl LayoutConfig {
    /// Returns the category for a score file name, or `None` if the name isn't a score file.
    pub fn category_for_score_file<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        let stem = file_name.strip_suffix(self.score_suffix.as_str())?;
        let category = stem.strip_prefix(self.file_prefix.as_str()).unwrap_or(stem);
        (!category.is_empty()).then_some(category)
    }

    /// Returns the result file name corresponding to a score file name.
    pub fn result_file_for_score_file(&self, file_name: &str) -> Option<String> {
        file_name
            .strip_suffix(self.score_suffix.as_str())
            .map(|stem| format!("{stem}{}", self.result_suffix))
    }
}

/// Output settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory to write summaries to. Relative paths are resolved against the base directory.
    pub dir: Utf8PathBuf,

    /// File name for stable passes.
    pub stable_file: String,

    /// File name for flaky tests.
    pub flaky_file: String,

    /// File name for stable failures.
    pub failing_file: String,
}

impl OutputConfig {
    /// Resolves the output directory against the base directory.
    pub fn resolve_dir(&self, base_dir: &Utf8Path) -> Utf8PathBuf {
        base_dir.join(&self.dir)
    }
}

impl TriageConfig {
    /// The default location of the repository config, relative to the base directory.
    pub const CONFIG_PATH: &'static str = ".config/bfcl-triage.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Repository-specific configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the config from the filesystem, layering it on top of the default config.
    ///
    /// If `config_file` is `None`, the repository config under `base_dir` is used if it exists.
    pub fn from_sources(
        base_dir: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = base_dir.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };
        debug!("loading config, repository config file: {config_file}");

        let builder = Self::make_default_config().add_source(source);
        let (config, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;

        if !unknown.is_empty() {
            warn!(
                "ignoring unknown configuration keys in config file {config_file}: {}",
                unknown.iter().join(", ")
            );
        }

        Ok(config)
    }

    /// Returns the default configuration.
    pub fn default_config() -> Self {
        let (config, _unknown) = Self::build_and_deserialize_config(&Self::make_default_config())
            .expect("embedded default config should parse");
        config
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(Self, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: Self = serde_path_to_error::deserialize(ignored_de).map_err(|error| {
            // The config crate also reports the key: drop it in favor of the path recorded by
            // serde_path_to_error.
            let path = error.path().clone();
            let config_error = error.into_inner();
            let error = match config_error {
                ConfigError::At { error, .. } => *error,
                other => other,
            };
            ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                path, error,
            )))
        })?;

        Ok((config, ignored))
    }
}

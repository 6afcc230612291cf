// Copyright (c) The bfcl-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk fixtures shared by tests in this crate.

use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::Utf8TempDir;
use serde_json::json;

/// The model directory that fixture files are nested under, mirroring real BFCL output.
pub(crate) const MODEL_DIR: &str = "gorilla-model/non_live";

/// A temporary base directory populated with score and result files.
pub(crate) struct RunFixture {
    dir: Utf8TempDir,
}

impl RunFixture {
    pub(crate) fn new() -> Self {
        Self {
            dir: Utf8TempDir::new().expect("created temp dir"),
        }
    }

    pub(crate) fn path(&self) -> &Utf8Path {
        self.dir.path()
    }

    pub(crate) fn score_path(&self, run: &str, category: &str) -> Utf8PathBuf {
        self.path()
            .join(format!("score-{run}"))
            .join(MODEL_DIR)
            .join(format!("BFCL_v4_{category}_score.json"))
    }

    pub(crate) fn result_path(&self, run: &str, category: &str) -> Utf8PathBuf {
        self.path()
            .join(format!("result-{run}"))
            .join(MODEL_DIR)
            .join(format!("BFCL_v4_{category}_result.json"))
    }

    /// Writes a result file listing `executed` and a score file listing `failed`.
    pub(crate) fn add(&self, run: &str, category: &str, executed: &[&str], failed: &[&str]) {
        let result_lines: Vec<_> = executed
            .iter()
            .map(|id| json!({"id": id, "result": format!("[{id}_call(x=1)]")}).to_string())
            .collect();
        self.write_lines(&self.result_path(run, category), &result_lines);

        let correct = executed.iter().filter(|id| !failed.contains(id)).count();
        let header = json!({
            "accuracy": correct as f64 / executed.len().max(1) as f64,
            "correct_count": correct,
            "total_count": executed.len(),
        });
        let score_lines: Vec<_> = std::iter::once(header.to_string())
            .chain(failed.iter().map(|id| {
                json!({
                    "id": id,
                    "valid": false,
                    "error": [format!("Invalid value for {id}")],
                    "error_type": "value_error:string",
                })
                .to_string()
            }))
            .collect();
        self.write_lines(&self.score_path(run, category), &score_lines);
    }

    pub(crate) fn write_lines(&self, path: &Utf8Path, lines: &[String]) {
        std::fs::create_dir_all(path.parent().expect("path has a parent")).expect("created dir");
        let mut contents = lines.join("\n");
        contents.push('\n');
        std::fs::write(path, contents).expect("wrote fixture file");
    }
}

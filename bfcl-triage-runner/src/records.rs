// Copyright (c) The bfcl-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Readers for line-delimited JSON result and score files.
//!
//! A result file has one record per executed test. A score file starts with a summary line,
//! followed by one record per failed test.
//!
//! Readers are lenient: blank lines, lines that aren't valid JSON, and records without an `id`
//! are skipped. A file that doesn't exist is reported as `None` rather than as an error.

use crate::errors::RecordReadError;
use bfcl_triage_metadata::TestId;
use camino::Utf8Path;
use serde::{Deserialize, de::DeserializeOwned};
use std::{
    collections::BTreeSet,
    fs,
    io::{self, BufRead, BufReader},
};
use tracing::debug;

/// A single record from a result file.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ResultRecord {
    /// The test identifier.
    pub id: TestId,

    /// What the model produced, as raw JSON.
    #[serde(default)]
    pub result: Option<serde_json::Value>,

    /// All other fields in the record, such as `prompt` and `model_result_decoded`.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The summary line at the start of a score file.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ScoreHeader {
    /// The accuracy reported by the scorer, between 0 and 1.
    #[serde(default)]
    pub accuracy: Option<f64>,

    /// The number of tests that passed.
    #[serde(default)]
    pub correct_count: Option<u64>,

    /// The number of tests that were scored.
    #[serde(default)]
    pub total_count: Option<u64>,
}

/// A single failed test from a score file.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct FailureRecord {
    /// The test identifier.
    pub id: TestId,

    /// The category of error reported by the scorer, e.g. `value_error:string`.
    #[serde(default)]
    pub error_type: Option<String>,

    /// The error reported by the scorer.
    #[serde(default)]
    pub error: Option<ErrorDetail>,

    /// All other fields in the record.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FailureRecord {
    /// Returns the error type, preferring the top-level field over the one nested in `error`.
    pub fn error_type(&self) -> Option<&str> {
        self.error_type.as_deref().or(match &self.error {
            Some(ErrorDetail::Detailed { error_type, .. }) => Some(error_type.as_str()),
            _ => None,
        })
    }
}

/// The `error` field of a score record, which scorers emit in several shapes.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ErrorDetail {
    /// A single message.
    Message(String),

    /// A list of messages.
    Messages(Vec<String>),

    /// An object carrying its own error type, e.g.
    /// `{"error_type": "multi_turn:...", "error_message": "..."}`.
    Detailed {
        /// The category of error.
        error_type: String,

        /// The message, itself in any of the supported shapes.
        #[serde(default)]
        error_message: Option<Box<ErrorDetail>>,
    },

    /// Anything else, kept as raw JSON.
    Other(serde_json::Value),
}

impl ErrorDetail {
    /// Returns the error as a list of human-readable lines.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::Message(message) => vec![message.clone()],
            Self::Messages(messages) => messages.clone(),
            Self::Detailed { error_message, .. } => error_message
                .as_ref()
                .map(|message| message.lines())
                .unwrap_or_default(),
            Self::Other(value) => vec![value.to_string()],
        }
    }
}

/// The contents of a score file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScoreFile {
    /// The summary line.
    pub header: ScoreHeader,

    /// Tests that failed, in file order.
    pub failures: Vec<FailureRecord>,
}

impl ScoreFile {
    /// Reads a score file, returning `None` if it doesn't exist.
    pub fn read(path: &Utf8Path) -> Result<Option<Self>, RecordReadError> {
        let Some(lines) = read_lines(path)? else {
            return Ok(None);
        };

        // The summary is always the first line of the file, even when that line is unusable.
        let mut lines = lines.into_iter().peekable();
        let header = match lines.next_if(|(line_number, _)| *line_number == 1) {
            Some((_, line)) => serde_json::from_str(&line).unwrap_or_else(|error| {
                debug!("{path}: ignoring malformed score header: {error}");
                ScoreHeader::default()
            }),
            None => ScoreHeader::default(),
        };
        let failures = parse_records(path, lines);

        Ok(Some(Self { header, failures }))
    }

    /// Returns the identifiers of the failed tests.
    pub fn failed_ids(&self) -> BTreeSet<TestId> {
        self.failures.iter().map(|f| f.id.clone()).collect()
    }

    /// Returns the failure record for a test, if it failed.
    pub fn failure(&self, test_id: &str) -> Option<&FailureRecord> {
        self.failures.iter().find(|f| f.id.as_str() == test_id)
    }
}

/// Reads all records from a result file, returning `None` if it doesn't exist.
pub fn read_result_records(path: &Utf8Path) -> Result<Option<Vec<ResultRecord>>, RecordReadError> {
    Ok(read_lines(path)?.map(|lines| parse_records(path, lines)))
}

/// Reads the set of executed test identifiers from a result file, returning `None` if it doesn't
/// exist.
pub fn read_result_ids(path: &Utf8Path) -> Result<Option<BTreeSet<TestId>>, RecordReadError> {
    #[derive(Deserialize)]
    struct IdOnly {
        id: TestId,
    }

    Ok(read_lines(path)?.map(|lines| {
        parse_records::<IdOnly>(path, lines)
            .into_iter()
            .map(|record| record.id)
            .collect()
    }))
}

/// Reads non-blank lines along with their 1-based line numbers.
fn read_lines(path: &Utf8Path) -> Result<Option<Vec<(usize, String)>>, RecordReadError> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            debug!("{path} does not exist, skipping");
            return Ok(None);
        }
        Err(error) => return Err(RecordReadError::new(path, error)),
    };

    let mut reader = BufReader::new(file);
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    for line_number in 1.. {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|error| RecordReadError::new(path, error))?;
        if read == 0 {
            break;
        }
        match String::from_utf8(std::mem::take(&mut buf)) {
            Ok(line) if line.trim().is_empty() => {}
            Ok(line) => lines.push((line_number, line)),
            Err(_) => debug!("{path}:{line_number}: skipping non-UTF-8 line"),
        }
    }
    Ok(Some(lines))
}

fn parse_records<T: DeserializeOwned>(
    path: &Utf8Path,
    lines: impl IntoIterator<Item = (usize, String)>,
) -> Vec<T> {
    lines
        .into_iter()
        .filter_map(|(line_number, line)| match serde_json::from_str(&line) {
            Ok(record) => Some(record),
            Err(error) => {
                debug!("{path}:{line_number}: skipping malformed record: {error}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::RunFixture;
    use pretty_assertions::assert_eq;

    fn lines(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn missing_files_read_as_none() {
        let fixture = RunFixture::new();
        let path = fixture.path().join("nope.json");
        assert_eq!(read_result_ids(&path).unwrap(), None);
        assert_eq!(read_result_records(&path).unwrap(), None);
        assert_eq!(ScoreFile::read(&path).unwrap(), None);
    }

    #[test]
    fn result_ids_skip_malformed_lines() {
        let fixture = RunFixture::new();
        let path = fixture.path().join("result.json");
        fixture.write_lines(
            &path,
            &lines(&[
                r#"{"id": "simple_0", "result": "[f(x=1)]"}"#,
                "",
                "not json at all",
                r#"{"result": "no id here"}"#,
                r#"{"id": 17}"#,
                r#"{"id": "simple_1", "latency": 0.5}"#,
            ]),
        );

        let ids = read_result_ids(&path).unwrap().unwrap();
        assert_eq!(
            ids,
            BTreeSet::from([TestId::new("simple_0"), TestId::new("simple_1")])
        );

        let records = read_result_records(&path).unwrap().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].result, Some(serde_json::json!("[f(x=1)]")));
        assert_eq!(records[1].result, None);
        assert_eq!(records[1].extra.get("latency"), Some(&serde_json::json!(0.5)));
    }

    #[test]
    fn non_utf8_lines_are_skipped() {
        let fixture = RunFixture::new();
        let path = fixture.path().join("result.json");
        let mut contents = b"{\"id\": \"simple_0\"}\n".to_vec();
        contents.extend_from_slice(b"{\"id\": \"bad_\xff\xfe\"}\r\n");
        contents.extend_from_slice(b"{\"id\": \"simple_1\"}");
        std::fs::write(&path, contents).unwrap();

        let ids = read_result_ids(&path).unwrap().unwrap();
        assert_eq!(
            ids,
            BTreeSet::from([TestId::new("simple_0"), TestId::new("simple_1")])
        );

        // A non-UTF-8 header still counts as the first line.
        let score_path = fixture.path().join("score.json");
        std::fs::write(&score_path, b"\xff\n{\"id\": \"simple_1\"}\n").unwrap();
        let score = ScoreFile::read(&score_path).unwrap().unwrap();
        assert_eq!(score.header, ScoreHeader::default());
        assert_eq!(score.failed_ids(), BTreeSet::from([TestId::new("simple_1")]));
    }

    #[test]
    fn score_file_skips_header() {
        let fixture = RunFixture::new();
        let path = fixture.path().join("score.json");
        fixture.write_lines(
            &path,
            &lines(&[
                r#"{"accuracy": 0.5, "correct_count": 1, "total_count": 2}"#,
                r#"{"id": "simple_1", "error_type": "type_error:simple", "error": ["wrong type"], "prompt": {}}"#,
                "{garbage",
                r#"{"id": "simple_2", "error": "single message"}"#,
            ]),
        );

        let score = ScoreFile::read(&path).unwrap().unwrap();
        assert_eq!(
            score.header,
            ScoreHeader {
                accuracy: Some(0.5),
                correct_count: Some(1),
                total_count: Some(2),
            }
        );
        assert_eq!(
            score.failed_ids(),
            BTreeSet::from([TestId::new("simple_1"), TestId::new("simple_2")])
        );

        let failure = score.failure("simple_1").unwrap();
        assert_eq!(failure.error_type.as_deref(), Some("type_error:simple"));
        assert_eq!(
            failure.error.as_ref().unwrap().lines(),
            vec!["wrong type".to_owned()]
        );
        assert!(failure.extra.contains_key("prompt"));

        let failure = score.failure("simple_2").unwrap();
        assert_eq!(
            failure.error.as_ref().unwrap().lines(),
            vec!["single message".to_owned()]
        );
        assert!(score.failure("simple_0").is_none());
    }

    #[test]
    fn score_header_is_never_a_failure() {
        // Even if the first line looks like a failure record, it is the summary line.
        let fixture = RunFixture::new();
        let path = fixture.path().join("score.json");
        fixture.write_lines(
            &path,
            &lines(&[r#"{"id": "simple_0"}"#, r#"{"id": "simple_1"}"#]),
        );

        let score = ScoreFile::read(&path).unwrap().unwrap();
        assert_eq!(score.header, ScoreHeader::default());
        assert_eq!(score.failed_ids(), BTreeSet::from([TestId::new("simple_1")]));
    }

    #[test]
    fn fixture_files_round_trip() {
        let fixture = RunFixture::new();
        fixture.add("a", "simple", &["simple_0", "simple_1", "simple_2"], &["simple_2"]);

        let ids = read_result_ids(&fixture.result_path("a", "simple"))
            .unwrap()
            .unwrap();
        assert_eq!(ids.len(), 3);

        let score = ScoreFile::read(&fixture.score_path("a", "simple"))
            .unwrap()
            .unwrap();
        assert_eq!(score.header.correct_count, Some(2));
        assert_eq!(score.header.total_count, Some(3));
        assert_eq!(score.failed_ids(), BTreeSet::from([TestId::new("simple_2")]));
    }

    #[test]
    fn nested_error_type() {
        let fixture = RunFixture::new();
        let path = fixture.path().join("score.json");
        fixture.write_lines(
            &path,
            &lines(&[
                r#"{"accuracy": 0.0, "correct_count": 0, "total_count": 2}"#,
                r#"{"id": "multi_turn_base_1", "error": {"error_type": "multi_turn:execution_response_mismatch", "error_message": "Model response mismatch"}}"#,
                r#"{"id": "multi_turn_base_2", "error_type": "top_level", "error": {"error_type": "nested"}}"#,
            ]),
        );

        let score = ScoreFile::read(&path).unwrap().unwrap();
        let failure = score.failure("multi_turn_base_1").unwrap();
        assert_eq!(failure.error_type, None);
        assert_eq!(
            failure.error_type(),
            Some("multi_turn:execution_response_mismatch")
        );
        assert_eq!(
            failure.error.as_ref().unwrap().lines(),
            vec!["Model response mismatch".to_owned()]
        );

        let failure = score.failure("multi_turn_base_2").unwrap();
        assert_eq!(failure.error_type(), Some("top_level"));
        assert_eq!(failure.error.as_ref().unwrap().lines(), Vec::<String>::new());
    }

    #[test]
    fn error_detail_shapes() {
        let other: ErrorDetail = serde_json::from_str(r#"{"code": 3}"#).unwrap();
        assert_eq!(other.lines(), vec![r#"{"code":3}"#.to_owned()]);

        let nested: ErrorDetail =
            serde_json::from_str(r#"{"error_type": "t", "error_message": ["a", "b"]}"#).unwrap();
        assert_eq!(nested.lines(), vec!["a".to_owned(), "b".to_owned()]);
    }
}

// Copyright (c) The bfcl-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `bfcl-triage` failures.
///
/// `bfcl-triage` invocations may fail for a variety of reasons. This structure documents the exit
/// codes that may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum TriageExitCode {}

impl TriageExitCode {
    /// No errors occurred and bfcl-triage exited normally.
    pub const OK: i32 = 0;

    /// No categories with any observed tests were found under the base directory.
    pub const NO_CATEGORIES_FOUND: i32 = 4;

    /// `bfcl-triage compare --fail-on-regression` found at least one regression.
    pub const REGRESSIONS_FOUND: i32 = 5;

    /// `bfcl-triage show` was asked about a test that no result file contains.
    pub const TEST_NOT_FOUND: i32 = 6;

    /// A user issue happened while setting up a bfcl-triage invocation.
    ///
    /// This covers bad configuration, a missing base directory, and unknown run names.
    pub const SETUP_ERROR: i32 = 96;

    /// Reading a result or score file failed for a reason other than the file being absent.
    pub const READ_INPUT_ERROR: i32 = 97;

    /// Writing data to stdout, stderr or a summary file produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}

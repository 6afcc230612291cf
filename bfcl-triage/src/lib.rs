// Copyright (c) The bfcl-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Find flaky tests and regressions across BFCL benchmark runs.
//!
//! `bfcl-triage categorize` classifies every test as a stable pass, a stable failure or flaky,
//! `bfcl-triage compare` diffs two runs, and `bfcl-triage show` prints a single test's history.
//! The analysis itself lives in `bfcl-triage-runner`.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::OutputWriter;

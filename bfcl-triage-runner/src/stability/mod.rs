// Copyright (c) The bfcl-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classify tests as stable passes, flaky, or stable failures across runs.
//!
//! [`classify`] folds per-run observations into a [`TestStatus`] per test, then partitions tests
//! by [`Classification`]. A test missing from a run has fewer total runs: absence is never a
//! failure.
//!
//! [`analyze_category`] and [`StabilityReport::analyze`] apply this to tests discovered on disk.

mod analysis;
mod classify;

pub use analysis::*;
pub use classify::*;

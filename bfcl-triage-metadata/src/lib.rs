// Copyright (c) The bfcl-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Structured access to bfcl-triage machine-readable output.
//!
//! This crate contains the identifier types shared across the workspace, the exit codes
//! `bfcl-triage` produces, and the JSON summaries it writes to disk.

mod exit_codes;
mod ids;
mod summary;

pub use exit_codes::*;
pub use ids::*;
pub use summary::*;

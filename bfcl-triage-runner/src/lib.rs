// Copyright (c) The bfcl-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core analysis logic for bfcl-triage.
//!
//! This crate reads the line-delimited JSON result and score files produced by BFCL runs and
//! answers three questions about them:
//!
//! * Which tests are stable passes, stable failures, or flaky across several runs? See
//!   [`stability`].
//! * What regressed or improved between two runs? See [`compare`].
//! * What happened to a single test in every run? See [`inspect`].
//!
//! The binary front end lives in the `bfcl-triage` crate.

pub mod compare;
pub mod config;
pub mod display;
pub mod errors;
pub mod helpers;
pub mod inspect;
pub mod layout;
pub mod outcomes;
pub mod records;
pub mod stability;
pub mod summary;
#[cfg(test)]
mod test_helpers;

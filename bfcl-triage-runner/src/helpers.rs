// Copyright (c) The bfcl-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! General support code for bfcl-triage-runner.

use std::fmt;

/// Utilities for pluralizing various words based on count.
pub mod plural {
    /// Returns "test" if `count` is 1, otherwise "tests".
    pub fn tests_str(count: usize) -> &'static str {
        if count == 1 { "test" } else { "tests" }
    }

    /// Returns "run" if `count` is 1, otherwise "runs".
    pub fn runs_str(count: usize) -> &'static str {
        if count == 1 { "run" } else { "runs" }
    }

    /// Returns "category" if `count` is 1, otherwise "categories".
    pub fn categories_str(count: usize) -> &'static str {
        if count == 1 { "category" } else { "categories" }
    }

    /// Returns "regression" if `count` is 1, otherwise "regressions".
    pub fn regressions_str(count: usize) -> &'static str {
        if count == 1 {
            "regression"
        } else {
            "regressions"
        }
    }

    /// Returns "improvement" if `count` is 1, otherwise "improvements".
    pub fn improvements_str(count: usize) -> &'static str {
        if count == 1 {
            "improvement"
        } else {
            "improvements"
        }
    }
}

/// Returns `count / total` as a percentage, or 0 if `total` is 0.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Displays a count and its share of a total as `{count:4} ({percent:5.1}%)`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DisplayShare {
    pub(crate) count: usize,
    pub(crate) total: usize,
}

impl fmt::Display for DisplayShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:4} ({:5.1}%)",
            self.count,
            percentage(self.count, self.total)
        )
    }
}

/// Displays a signed difference between two percentages, e.g. `+2.5` or `-0.3`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DisplayDelta(pub(crate) f64);

impl fmt::Display for DisplayDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+.1}", self.0)
    }
}

/// Characters used for horizontal rules in console output.
#[derive(Clone, Debug)]
pub struct ThemeCharacters {
    heavy: char,
    light: char,
}

impl Default for ThemeCharacters {
    fn default() -> Self {
        Self {
            heavy: '=',
            light: '-',
        }
    }
}

impl ThemeCharacters {
    /// Switches to Unicode box-drawing characters.
    pub fn use_unicode(&mut self) {
        self.heavy = '═';
        self.light = '─';
    }

    /// Returns a heavy horizontal bar of the specified width.
    pub fn heavy_bar(&self, width: usize) -> String {
        std::iter::repeat_n(self.heavy, width).collect()
    }

    /// Returns a light horizontal bar of the specified width.
    pub fn light_bar(&self, width: usize) -> String {
        std::iter::repeat_n(self.light, width).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, 0, "   0 (  0.0%)" ; "empty total")]
    #[test_case(1, 3, "   1 ( 33.3%)" ; "one third")]
    #[test_case(350, 400, " 350 ( 87.5%)" ; "typical")]
    #[test_case(12345, 12345, "12345 (100.0%)" ; "wide count")]
    fn display_share(count: usize, total: usize, expected: &str) {
        assert_eq!(DisplayShare { count, total }.to_string(), expected);
    }

    #[test_case(2.5, "+2.5" ; "positive")]
    #[test_case(-0.3, "-0.3" ; "negative")]
    #[test_case(0.0, "+0.0" ; "zero")]
    fn display_delta(delta: f64, expected: &str) {
        assert_eq!(DisplayDelta(delta).to_string(), expected);
    }
}

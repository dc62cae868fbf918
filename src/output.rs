//! Result types returned by the `convert_*` entry points.

use serde::{Deserialize, Serialize};

/// Outcome of one rewrite run.
///
/// A run with warnings is still a successful run: every warning names one
/// piece of markup that was left untouched because it could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteOutput {
    /// The rewritten text (identical to the input when nothing matched).
    pub text: String,
    /// `text` differs from the input.
    pub changed: bool,
    /// One human-readable line per candidate that failed extraction.
    pub warnings: Vec<String>,
    pub stats: RewriteStats,
}

impl RewriteOutput {
    /// Output for text that was left exactly as given.
    pub fn unchanged(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            changed: false,
            warnings: Vec::new(),
            stats: RewriteStats::default(),
        }
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteStats {
    /// Image references recognised.
    pub candidates: usize,
    /// References replaced with the canonical tag.
    pub rewritten: usize,
    /// References left as written (width already set, or already canonical).
    pub skipped: usize,
    /// Markup that looked like an image but could not be parsed.
    pub failed: usize,
    /// The loose fallback tier had to be used.
    pub used_fallback: bool,
}

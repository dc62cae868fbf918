//! Apply decisions to the original text by byte offset.
//!
//! Text is never searched a second time: output is built by copying the
//! bytes between candidate spans and emitting each replacement at its
//! recorded position. Two images with byte-identical markup are therefore
//! each replaced exactly once, at their own location.

use crate::pipeline::decide::Decision;
use tracing::debug;

/// The rewritten text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteResult {
    pub text: String,
    /// The output differs from the input.
    pub changed: bool,
    /// Number of spans that were replaced.
    pub replaced: usize,
}

/// Splice every decided replacement into `text`.
///
/// `decisions` must be in source order with non-overlapping spans, which is
/// what [`crate::pipeline::matcher::find_candidates`] produces. A decision
/// whose span starts before the end of the previous replacement, or falls
/// outside `text`, is ignored.
pub fn apply(text: &str, decisions: &[Decision<'_>]) -> RewriteResult {
    let extra: usize = decisions
        .iter()
        .filter_map(|d| d.replacement.as_ref())
        .map(String::len)
        .sum();
    let mut out = String::with_capacity(text.len() + extra);
    let mut cursor = 0;
    let mut replaced = 0;

    for decision in decisions {
        let Some(replacement) = decision.replacement.as_deref() else {
            continue;
        };
        let span = &decision.candidate.span;
        if span.start < cursor || text.get(span.clone()).is_none() {
            debug!(
                "Ignoring replacement for {}..{}: span out of order or out of bounds",
                span.start, span.end
            );
            continue;
        }

        out.push_str(&text[cursor..span.start]);
        out.push_str(replacement);
        cursor = span.end;
        replaced += 1;
    }
    out.push_str(&text[cursor..]);

    let changed = out != text;
    RewriteResult {
        text: out,
        changed,
        replaced,
    }
}

//! Decide, per candidate, whether to rewrite and what to write.
//!
//! Every rewritten candidate, Markdown or HTML, becomes the same canonical
//! element:
//!
//! ```text
//! <img width="{width}" src="{url}" alt="{alt}" />
//! ```
//!
//! Because that output always carries `width`, running the rewrite over its
//! own output under the default policy leaves the text unchanged.

use crate::config::{ExistingWidthPolicy, RewriteConfig};
use crate::pipeline::matcher::Candidate;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::num::NonZeroU32;
use tracing::debug;

/// Why a candidate was left as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The tag already declares a width and the policy preserves it.
    ExistingWidth,
    /// The canonical form is identical to what is already there.
    AlreadyCanonical,
}

/// A candidate paired with its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision<'a> {
    pub candidate: Candidate<'a>,
    /// Text to splice in place of the candidate; `None` leaves it unchanged.
    pub replacement: Option<String>,
    pub skip_reason: Option<SkipReason>,
}

impl Decision<'_> {
    pub fn is_rewrite(&self) -> bool {
        self.replacement.is_some()
    }
}

/// Decide what happens to one candidate.
pub fn decide<'a>(candidate: Candidate<'a>, config: &RewriteConfig) -> Decision<'a> {
    if candidate.kind.is_tag()
        && candidate.has_existing_width
        && config.existing_width == ExistingWidthPolicy::Preserve
    {
        debug!(
            "Keeping {:?} at byte {}: width already set",
            candidate.kind, candidate.span.start
        );
        return skip(candidate, SkipReason::ExistingWidth);
    }

    // Compare against the URL as written too: an earlier run may have
    // decoded `%2520` to `%20`, which would decode again here.
    let replacement = canonical_tag(config.target_width, &candidate.image_url, candidate.alt_text);
    if replacement == candidate.full_text
        || canonical_tag(config.target_width, candidate.raw_url, candidate.alt_text)
            == candidate.full_text
    {
        return skip(candidate, SkipReason::AlreadyCanonical);
    }

    debug!(
        "Rewriting {:?} at byte {}: {}",
        candidate.kind, candidate.span.start, candidate.image_url
    );
    Decision {
        candidate,
        replacement: Some(replacement),
        skip_reason: None,
    }
}

fn skip(candidate: Candidate<'_>, reason: SkipReason) -> Decision<'_> {
    Decision {
        candidate,
        replacement: None,
        skip_reason: Some(reason),
    }
}

/// Render the canonical `<img>` element.
///
/// The URL is not re-encoded. A literal `"` in either value is written as
/// `&quot;` so it cannot terminate the attribute.
pub fn canonical_tag(width: NonZeroU32, url: &str, alt: &str) -> String {
    format!(
        r#"<img width="{}" src="{}" alt="{}" />"#,
        width,
        escape_quotes(url),
        escape_quotes(alt)
    )
}

fn escape_quotes(value: &str) -> Cow<'_, str> {
    if value.contains('"') {
        Cow::Owned(value.replace('"', "&quot;"))
    } else {
        Cow::Borrowed(value)
    }
}

//! Candidate discovery: find image markup in free-form text.
//!
//! ## Three tiers
//!
//! | Tier | Shape | Accepts |
//! |------|-------|---------|
//! | Markdown | `![alt](url "title")` | http(s) URL ending in `.png`/`.jpg`/`.jpeg`, or an attachment-host URL |
//! | Strict tag | single-line `<img ...>` | `src` is an http(s) URL |
//! | Fallback tag | `<img ...>` spanning lines | any non-empty `src` |
//!
//! The fallback tier runs only when the first two found nothing at all.
//!
//! ## Two phases
//!
//! Each tier first finds bounded spans with a cheap regex, then validates
//! and extracts each span on its own. A span that fails extraction becomes a
//! [`CandidateError`] in [`ScanReport::rejected`]; the scan carries on.
//! Spans that simply are not image references (a link to a `.html` page,
//! an `<img>` without `src`) are dropped silently.

use crate::error::CandidateError;
use crate::pipeline::attrs::parse_img_attributes;
use crate::pipeline::url::{decode_uri, has_illegal_chars, is_http, is_image_url};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::ops::Range;
use tracing::debug;

// Alt text stops at the first `]` so `![logo][1] ... ![pic](url)` cannot
// stretch one span across the text in between.
static RE_MARKDOWN_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"!\[([^\]\n]*)\]\(([^)\s]+)(?:\s+"[^"\n]*")?\)"#).unwrap());

// Quoted values may contain `>`.
static RE_IMG_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<img\b(?:[^>"'\n]|"[^"\n]*"|'[^'\n]*')*>"#).unwrap()
});

// Multi-line values are allowed here, but not across another `<`.
static RE_IMG_TAG_LOOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img\b(?:[^>"']|"[^"<]*"|'[^'<]*')*>"#).unwrap());

// Quote-blind spans: catch tags with a stray quote that the patterns above
// refuse, so they are reported instead of silently skipped.
static RE_IMG_TAG_UNQUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<img\b[^>\n]*>").unwrap());

static RE_IMG_TAG_LOOSE_UNQUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<img\b[^>]*>").unwrap());

/// Which markup shape produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateKind {
    /// `![alt](url)`
    MarkdownImage,
    /// `<img ...>` matched by the strict tier.
    HtmlImgTag,
    /// `<img ...>` recovered by the fallback tier.
    FallbackImgTag,
}

impl CandidateKind {
    /// True for both tag tiers.
    pub fn is_tag(self) -> bool {
        matches!(self, CandidateKind::HtmlImgTag | CandidateKind::FallbackImgTag)
    }
}

/// One discovered image reference, borrowing from the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub kind: CandidateKind,
    /// Byte range of [`Self::full_text`] in the scanned text.
    pub span: Range<usize>,
    /// The exact matched markup.
    pub full_text: &'a str,
    /// Image URL after percent-decoding.
    pub image_url: Cow<'a, str>,
    /// Image URL exactly as written.
    pub raw_url: &'a str,
    /// Alt text as written; empty if absent.
    pub alt_text: &'a str,
    /// The tag already declares a `width`. Always false for Markdown.
    pub has_existing_width: bool,
}

/// Everything one scan found, in source order.
#[derive(Debug, Default)]
pub struct ScanReport<'a> {
    pub candidates: Vec<Candidate<'a>>,
    pub rejected: Vec<CandidateError>,
    /// The fallback tier was consulted.
    pub used_fallback: bool,
}

impl ScanReport<'_> {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty() && self.rejected.is_empty()
    }
}

struct Hit<'a> {
    span: Range<usize>,
    result: Result<Candidate<'a>, CandidateError>,
}

/// Scan `text` for image markup.
///
/// The returned candidates are ordered by position and never overlap.
pub fn find_candidates(text: &str) -> ScanReport<'_> {
    let mut hits = Vec::new();
    scan_markdown(text, &mut hits);
    scan_tags(
        text,
        [&RE_IMG_TAG, &RE_IMG_TAG_UNQUOTED],
        CandidateKind::HtmlImgTag,
        &mut hits,
    );

    let used_fallback = hits.is_empty();
    if used_fallback {
        scan_tags(
            text,
            [&RE_IMG_TAG_LOOSE, &RE_IMG_TAG_LOOSE_UNQUOTED],
            CandidateKind::FallbackImgTag,
            &mut hits,
        );
    }

    hits.sort_by_key(|hit| hit.span.start);

    let mut report = ScanReport {
        used_fallback,
        ..ScanReport::default()
    };
    let mut covered = 0;
    for hit in hits {
        if hit.span.start < covered {
            debug!(
                "Dropping image markup at {}..{}: overlaps an earlier match",
                hit.span.start, hit.span.end
            );
            continue;
        }
        covered = hit.span.end;
        match hit.result {
            Ok(candidate) => report.candidates.push(candidate),
            Err(e) => report.rejected.push(e),
        }
    }

    report
}

fn scan_markdown<'a>(text: &'a str, hits: &mut Vec<Hit<'a>>) {
    for caps in RE_MARKDOWN_IMAGE.captures_iter(text) {
        let (Some(whole), Some(alt), Some(url)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let raw_url = url.as_str();
        if !is_http(raw_url) || !is_image_url(raw_url) {
            continue;
        }

        let span = whole.range();
        if has_illegal_chars(raw_url) {
            hits.push(Hit {
                span: span.clone(),
                result: Err(CandidateError::MalformedUrl {
                    offset: span.start,
                    url: raw_url.to_string(),
                }),
            });
            continue;
        }
        let result = decode_url(raw_url, span.start).map(|image_url| Candidate {
            kind: CandidateKind::MarkdownImage,
            span: span.clone(),
            full_text: whole.as_str(),
            image_url,
            raw_url,
            alt_text: alt.as_str(),
            has_existing_width: false,
        });
        hits.push(Hit { span, result });
    }
}

/// Run the quote-aware pattern, then the quote-blind one for tags the first
/// could not close. Quote-blind spans starting inside an accepted tag are
/// ignored.
fn scan_tags<'a>(
    text: &'a str,
    [quoted, unquoted]: [&Regex; 2],
    kind: CandidateKind,
    hits: &mut Vec<Hit<'a>>,
) {
    let mut accepted: Vec<Range<usize>> = Vec::new();
    for m in quoted.find_iter(text) {
        accepted.push(m.range());
        if let Some(result) = extract_tag(m.as_str(), m.start(), kind) {
            hits.push(Hit {
                span: m.range(),
                result,
            });
        }
    }

    for m in unquoted.find_iter(text) {
        if accepted.iter().any(|r| r.contains(&m.start())) {
            continue;
        }
        if let Some(result) = extract_tag(m.as_str(), m.start(), kind) {
            hits.push(Hit {
                span: m.range(),
                result,
            });
        }
    }
}

/// Validate one `<img>` span. `None` means "not an image reference this
/// tier handles", which is not an error.
fn extract_tag(
    tag: &str,
    offset: usize,
    kind: CandidateKind,
) -> Option<Result<Candidate<'_>, CandidateError>> {
    let attrs = match parse_img_attributes(tag) {
        Ok(attrs) => attrs,
        Err(_) => {
            return Some(Err(CandidateError::UnbalancedQuotes {
                offset,
                snippet: tag.chars().take(80).collect(),
            }))
        }
    };

    let src = attrs.find("src")?;
    let Some(raw_url) = src.value.filter(|v| !v.trim().is_empty()) else {
        return Some(Err(CandidateError::MissingSrc { offset }));
    };
    if kind == CandidateKind::HtmlImgTag && !is_http(raw_url) {
        return None;
    }

    // A tag that already sets a width is usually left alone, so a URL that
    // will not decode is no reason to warn about it.
    let has_existing_width = attrs.contains("width");
    let image_url = match decode_url(raw_url, offset) {
        Ok(url) => url,
        Err(e) if has_existing_width => {
            debug!("{}; keeping the URL as written", e);
            Cow::Borrowed(raw_url)
        }
        Err(e) => return Some(Err(e)),
    };

    Some(Ok(Candidate {
        kind,
        span: offset..offset + tag.len(),
        full_text: tag,
        image_url,
        raw_url,
        alt_text: attrs.get("alt").unwrap_or_default(),
        has_existing_width,
    }))
}

fn decode_url(raw: &str, offset: usize) -> Result<Cow<'_, str>, CandidateError> {
    decode_uri(raw).map_err(|e| CandidateError::UndecodableUrl {
        offset,
        url: raw.to_string(),
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(report: &ScanReport<'_>) -> Vec<String> {
        report
            .candidates
            .iter()
            .map(|c| c.image_url.to_string())
            .collect()
    }

    #[test]
    fn test_markdown_image() {
        let text = "![Alt text](https://example.com/image.jpg)";
        let report = find_candidates(text);
        assert_eq!(report.candidates.len(), 1);
        let c = &report.candidates[0];
        assert_eq!(c.kind, CandidateKind::MarkdownImage);
        assert_eq!(c.image_url, "https://example.com/image.jpg");
        assert_eq!(c.alt_text, "Alt text");
        assert_eq!(c.full_text, text);
        assert_eq!(c.span, 0..text.len());
        assert!(!c.has_existing_width);
    }

    #[test]
    fn test_markdown_query_string() {
        let report = find_candidates("![Alt text](https://example.com/image.jpg?size=large&v=2)");
        assert_eq!(urls(&report), vec!["https://example.com/image.jpg?size=large&v=2"]);
    }

    #[test]
    fn test_markdown_attachment_url() {
        let report = find_candidates(
            "![Screenshot](https://github.com/user-attachments/assets/f181588d-2446-430f-9691-e0bf86b93d9f)",
        );
        assert_eq!(
            urls(&report),
            vec!["https://github.com/user-attachments/assets/f181588d-2446-430f-9691-e0bf86b93d9f"]
        );
    }

    #[test]
    fn test_markdown_with_title() {
        let report = find_candidates(r#"![Logo](https://example.com/logo.png "The logo")"#);
        assert_eq!(urls(&report), vec!["https://example.com/logo.png"]);
        assert_eq!(report.candidates[0].alt_text, "Logo");
    }

    #[test]
    fn test_plain_link_is_not_an_image() {
        assert!(find_candidates("[Alt text](https://example.com/image.jpg)").is_empty());
    }

    #[test]
    fn test_non_image_markdown_ignored() {
        let report = find_candidates("![badge](https://example.com/badge.svg) ![x](./local.png)");
        assert!(report.is_empty());
    }

    #[test]
    fn test_multiple_markdown_images() {
        let text = "![First](https://example.com/first.jpg) and ![Second](https://example.com/second.png)";
        let report = find_candidates(text);
        assert_eq!(
            urls(&report),
            vec!["https://example.com/first.jpg", "https://example.com/second.png"]
        );
        assert_eq!(report.candidates[1].alt_text, "Second");
    }

    #[test]
    fn test_non_image_before_image_does_not_swallow_it() {
        let text = "![doc](https://example.com/doc.html) then ![pic](https://example.com/pic.png)";
        let report = find_candidates(text);
        assert_eq!(report.candidates.len(), 1);
        assert_eq!(report.candidates[0].full_text, "![pic](https://example.com/pic.png)");
    }

    #[test]
    fn test_html_tag_basic() {
        let report = find_candidates(r#"<img src="https://example.com/image.jpg" alt="Alt text">"#);
        assert_eq!(report.candidates.len(), 1);
        let c = &report.candidates[0];
        assert_eq!(c.kind, CandidateKind::HtmlImgTag);
        assert_eq!(c.image_url, "https://example.com/image.jpg");
        assert_eq!(c.alt_text, "Alt text");
        assert!(!c.has_existing_width);
    }

    #[test]
    fn test_html_tag_with_width() {
        let report = find_candidates(
            r#"<img width="1196" alt="Screenshot" src="https://github.com/user-attachments/assets/123456789">"#,
        );
        let c = &report.candidates[0];
        assert_eq!(c.image_url, "https://github.com/user-attachments/assets/123456789");
        assert!(c.has_existing_width);
    }

    #[test]
    fn test_html_tag_self_closing_without_alt() {
        let report = find_candidates(r#"<img src="https://example.com/image.jpg" />"#);
        assert_eq!(report.candidates[0].alt_text, "");
    }

    #[test]
    fn test_other_tags_ignored() {
        assert!(find_candidates(r#"<div src="https://example.com/image.jpg"></div>"#).is_empty());
        assert!(find_candidates(r#"<image src="https://example.com/image.jpg">"#).is_empty());
    }

    #[test]
    fn test_tag_inside_code_fence() {
        let report = find_candidates(
            "```\n<img src=\"https://example.com/image.jpg\" alt=\"Code block\">\n```",
        );
        assert_eq!(urls(&report), vec!["https://example.com/image.jpg"]);
    }

    #[test]
    fn test_mixed_tiers_in_order() {
        let text = "<img src=\"https://a.example/1.png\">\n![two](https://b.example/2.png)";
        let report = find_candidates(text);
        let kinds: Vec<_> = report.candidates.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![CandidateKind::HtmlImgTag, CandidateKind::MarkdownImage]);
        assert!(!report.used_fallback);
    }

    #[test]
    fn test_fallback_relative_src() {
        let report = find_candidates(r#"<img alt="Local" src="docs/shot.png">"#);
        assert!(report.used_fallback);
        assert_eq!(report.candidates.len(), 1);
        assert_eq!(report.candidates[0].kind, CandidateKind::FallbackImgTag);
        assert_eq!(report.candidates[0].image_url, "docs/shot.png");
    }

    #[test]
    fn test_fallback_multiline_tag() {
        let text = "<img\n  src=\"https://example.com/a.png\"\n  alt=\"Wrapped\"\n>";
        let report = find_candidates(text);
        assert!(report.used_fallback);
        assert_eq!(report.candidates[0].full_text, text);
        assert_eq!(report.candidates[0].alt_text, "Wrapped");
    }

    #[test]
    fn test_fallback_skipped_when_primary_found_something() {
        let text = "![a](https://x.example/a.png)\n<img\n src=\"rel.png\">";
        let report = find_candidates(text);
        assert!(!report.used_fallback);
        assert_eq!(report.candidates.len(), 1);
    }

    #[test]
    fn test_unbalanced_quotes_rejected() {
        let text = r#"<img src="https://x.example/y.png alt="A"> ![ok](https://x.example/ok.png)"#;
        let report = find_candidates(text);
        assert_eq!(report.candidates.len(), 1);
        assert_eq!(report.rejected.len(), 1);
        assert!(matches!(report.rejected[0], CandidateError::UnbalancedQuotes { offset: 0, .. }));
    }

    #[test]
    fn test_missing_src_rejected() {
        let report = find_candidates(r#"<img src="" alt="nothing">"#);
        assert_eq!(report.rejected, vec![CandidateError::MissingSrc { offset: 0 }]);
    }

    #[test]
    fn test_undecodable_url_rejected() {
        let report = find_candidates("x ![bad](https://example.com/%FF.png)");
        assert!(report.candidates.is_empty());
        assert!(matches!(report.rejected[0], CandidateError::UndecodableUrl { offset: 2, .. }));
    }

    #[test]
    fn test_percent_decoding() {
        let report = find_candidates("![s](https://example.com/my%20shot.png)");
        assert_eq!(urls(&report), vec!["https://example.com/my shot.png"]);
        assert_eq!(report.candidates[0].full_text, "![s](https://example.com/my%20shot.png)");
    }

    #[test]
    fn test_overlap_keeps_outer_tag() {
        let text = r#"<img alt="![x](https://a.example/x.png)" src="https://a.example/y.png">"#;
        let report = find_candidates(text);
        assert_eq!(report.candidates.len(), 1);
        assert_eq!(report.candidates[0].kind, CandidateKind::HtmlImgTag);
        assert_eq!(report.candidates[0].image_url, "https://a.example/y.png");
    }

    #[test]
    fn test_reference_image_does_not_stretch_span() {
        let text = "See ![logo][1] and then ![pic](https://x.example/a.png) end";
        let report = find_candidates(text);
        assert_eq!(report.candidates.len(), 1);
        let c = &report.candidates[0];
        assert_eq!(c.full_text, "![pic](https://x.example/a.png)");
        assert_eq!(c.alt_text, "pic");
    }

    #[test]
    fn test_quoted_gt_inside_tag() {
        let text = r#"<img alt="a > b" src="https://x.example/a.png">"#;
        let report = find_candidates(text);
        assert!(report.rejected.is_empty());
        assert_eq!(report.candidates.len(), 1);
        assert_eq!(report.candidates[0].full_text, text);
        assert_eq!(report.candidates[0].alt_text, "a > b");
        assert!(!report.used_fallback);
    }

    #[test]
    fn test_quoted_gt_inside_multiline_tag() {
        let text = r#"<img
  alt='x > y'
  src="rel/a.png">"#;
        let report = find_candidates(text);
        assert!(report.used_fallback);
        assert_eq!(report.candidates[0].full_text, text);
        assert_eq!(report.candidates[0].alt_text, "x > y");
    }

    #[test]
    fn test_space_in_quoted_src_accepted() {
        let report = find_candidates(r#"<img width="300" src="https://x.example/my shot.png" alt="s" />"#);
        assert!(report.rejected.is_empty());
        assert_eq!(urls(&report), vec!["https://x.example/my shot.png"]);
    }

    #[test]
    fn test_undecodable_src_kept_when_width_set() {
        let report = find_candidates(r#"<img width="80" src="https://x.example/%FF.png">"#);
        assert!(report.rejected.is_empty());
        assert_eq!(report.candidates[0].image_url, "https://x.example/%FF.png");
        assert_eq!(report.candidates[0].raw_url, "https://x.example/%FF.png");
    }

    #[test]
    fn test_undecodable_src_rejected_without_width() {
        let report = find_candidates(r#"<img src="https://x.example/%FF.png">"#);
        assert!(report.candidates.is_empty());
        assert!(matches!(report.rejected[0], CandidateError::UndecodableUrl { offset: 0, .. }));
    }

    #[test]
    fn test_spans_index_source() {
        let text = "intro\n\n![a](https://x.example/a.png) mid <img src=\"https://x.example/b.jpg\"> end";
        for c in find_candidates(text).candidates {
            assert_eq!(&text[c.span.clone()], c.full_text);
        }
    }
}

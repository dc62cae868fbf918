//! Error types for the pr-image-width library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PrImageWidthError`] — **Fatal**: the run cannot proceed at all
//!   (pull request not found, bad token, unreadable file). Returned as
//!   `Err(PrImageWidthError)` from the top-level `convert_*` functions.
//!
//! * [`CandidateError`] — **Non-fatal**: a single piece of image markup
//!   could not be parsed (stray quote, undecodable URL) but every other image
//!   in the text is fine. Collected by the scanner and surfaced as warnings
//!   in [`crate::output::RewriteOutput`], so one malformed tag never costs
//!   the rest of the description its rewrite.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pr-image-width library.
///
/// Per-candidate failures use [`CandidateError`] and are reported as
/// warnings rather than propagated here.
#[derive(Debug, Error)]
pub enum PrImageWidthError {
    // ── Host errors ───────────────────────────────────────────────────────
    /// The pull request does not exist (or the token cannot see it).
    #[error("Pull request {owner}/{repo}#{number} not found")]
    PullRequestNotFound {
        owner: String,
        repo: String,
        number: u64,
    },

    /// The API rejected the credential (HTTP 401/403).
    #[error("Authentication failed ({status}): {detail}\nCheck that the token has pull-requests: write permission.")]
    AuthFailed { status: u16, detail: String },

    /// The API returned some other non-success status, or the request
    /// never reached it.
    #[error("GitHub API request to '{url}' failed: {reason}")]
    RequestFailed { url: String, reason: String },

    /// The API call exceeded the configured timeout.
    #[error("GitHub API request to '{url}' timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    /// The API answered with a body we could not decode.
    #[error("Unexpected response from '{url}': {detail}")]
    InvalidResponse { url: String, detail: String },

    /// No access token was configured.
    #[error("No GitHub token configured.\nPass --token or set INPUT_TOKEN / GITHUB_TOKEN.")]
    MissingToken,

    /// `owner/repo` could not be split into its two halves.
    #[error("Invalid repository '{0}': expected 'owner/repo'")]
    InvalidRepository(String),

    /// The workflow event payload was missing or malformed.
    #[error("Invalid event payload: {0}")]
    EventPayload(String),

    // ── Local file errors ─────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Input file exists but could not be read as UTF-8 text.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single image candidate.
///
/// `offset` is the byte offset of the offending markup in the scanned text,
/// so a warning can point the reader at the right spot.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum CandidateError {
    /// An attribute value opened a quote it never closed.
    #[error("Image tag at byte {offset}: unbalanced attribute quotes in {snippet:?}")]
    UnbalancedQuotes { offset: usize, snippet: String },

    /// The tag names `src` but no well-formed value could be read.
    #[error("Image tag at byte {offset}: missing or malformed src attribute")]
    MissingSrc { offset: usize },

    /// The URL contains characters that cannot appear in a URL.
    #[error("Image at byte {offset}: malformed URL {url:?}")]
    MalformedUrl { offset: usize, url: String },

    /// Percent-decoding the URL produced invalid UTF-8.
    #[error("Image at byte {offset}: URL {url:?} could not be decoded: {detail}")]
    UndecodableUrl {
        offset: usize,
        url: String,
        detail: String,
    },
}

impl CandidateError {
    /// Byte offset of the markup this error refers to.
    pub fn offset(&self) -> usize {
        match self {
            CandidateError::UnbalancedQuotes { offset, .. }
            | CandidateError::MissingSrc { offset }
            | CandidateError::MalformedUrl { offset, .. }
            | CandidateError::UndecodableUrl { offset, .. } => *offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let e = PrImageWidthError::PullRequestNotFound {
            owner: "octo".into(),
            repo: "demo".into(),
            number: 42,
        };
        assert_eq!(e.to_string(), "Pull request octo/demo#42 not found");
    }

    #[test]
    fn auth_failed_display() {
        let e = PrImageWidthError::AuthFailed {
            status: 401,
            detail: "Bad credentials".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("401"), "got: {msg}");
        assert!(msg.contains("Bad credentials"), "got: {msg}");
    }

    #[test]
    fn timeout_display() {
        let e = PrImageWidthError::Timeout {
            url: "https://api.github.com/repos/a/b/pulls/1".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn candidate_error_offset() {
        let e = CandidateError::MissingSrc { offset: 17 };
        assert_eq!(e.offset(), 17);
        assert!(e.to_string().contains("byte 17"));
    }

    #[test]
    fn candidate_error_serialises() {
        let e = CandidateError::MalformedUrl {
            offset: 3,
            url: "https://x/a b.png".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("MalformedUrl"));
        let back: CandidateError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }
}

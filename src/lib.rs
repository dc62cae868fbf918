//! # pr-image-width
//!
//! Constrain the display width of images embedded in pull request
//! descriptions.
//!
//! ## Why this crate?
//!
//! Screenshots pasted into a PR description render at their full pixel
//! width, pushing the text of the description off screen. This crate finds
//! every image reference in the description, Markdown `![alt](url)` and raw
//! `<img>` tags alike, and rewrites it into a single canonical element with
//! an explicit width. Nothing else in the text changes.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PR body
//!  │
//!  ├─ 1. Fetch    GitHub REST API (or a local file)
//!  ├─ 2. Match    Markdown images, <img> tags, loose <img> fallback
//!  ├─ 3. Decide   keep tags that already set a width; canonicalise the rest
//!  ├─ 4. Rewrite  splice replacements in by byte offset
//!  └─ 5. Update   PATCH the body back, only if it changed
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use pr_image_width::{convert_body, RewriteConfig};
//!
//! let config = RewriteConfig::builder().target_width(400).build().unwrap();
//! let out = convert_body("Look: ![shot](https://example.com/shot.png)", &config);
//! assert_eq!(
//!     out.text,
//!     r#"Look: <img width="400" src="https://example.com/shot.png" alt="shot" />"#
//! );
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pr-image-width` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod event;
pub mod github;
pub mod output;
pub mod pipeline;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    parse_width, ExistingWidthPolicy, GitHubConfig, ParsedWidth, RewriteConfig,
    RewriteConfigBuilder, DEFAULT_WIDTH,
};
pub use convert::{convert_body, convert_file, convert_pull_request};
pub use error::{CandidateError, PrImageWidthError};
pub use event::{resolve_trigger, trigger_from_env, Trigger};
pub use github::{GitHubClient, PullRequestKey, PullRequestStore};
pub use output::{RewriteOutput, RewriteStats};
pub use pipeline::decide::{Decision, SkipReason};
pub use pipeline::matcher::{find_candidates, Candidate, CandidateKind, ScanReport};

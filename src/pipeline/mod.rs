//! Pipeline stages for rewriting image markup.
//!
//! Each submodule implements exactly one step, so each can be tested on
//! its own and a scanner change never touches the splice logic.
//!
//! ## Data Flow
//!
//! ```text
//! text ──▶ matcher ──▶ decide ──▶ rewrite
//!          (spans)     (skip or    (splice by
//!                       replace)    offset)
//! ```
//!
//! 1. [`matcher`] — find Markdown images and `<img>` tags; returns an ordered,
//!    non-overlapping list of [`matcher::Candidate`]s plus per-span failures
//! 2. [`decide`]  — apply the width policy and build the canonical tag
//! 3. [`rewrite`] — copy the text, substituting decided spans by byte offset
//!
//! [`attrs`] and [`url`] are the extraction helpers the matcher runs on
//! every span it finds.

pub mod attrs;
pub mod decide;
pub mod matcher;
pub mod rewrite;
pub mod url;

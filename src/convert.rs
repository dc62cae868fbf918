//! Rewrite entry points.
//!
//! [`convert_body`] is the pure core: text in, text out, no I/O. The other
//! entry points wrap it with exactly one read before and at most one write
//! after:
//!
//! * [`convert_file`] — a Markdown file on disk
//! * [`convert_pull_request`] — a PR description behind a [`PullRequestStore`]

use crate::config::RewriteConfig;
use crate::error::PrImageWidthError;
use crate::github::{PullRequestKey, PullRequestStore};
use crate::output::{RewriteOutput, RewriteStats};
use crate::pipeline::decide::{decide, Decision};
use crate::pipeline::{matcher, rewrite};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Constrain every image in `text` to the configured width.
///
/// Never fails: markup that cannot be parsed is left untouched and reported
/// in [`RewriteOutput::warnings`].
///
/// # Example
/// ```rust
/// use pr_image_width::{convert_body, RewriteConfig};
///
/// let out = convert_body("![Alt text](https://example.com/image.jpg)", &RewriteConfig::default());
/// assert!(out.changed);
/// assert_eq!(
///     out.text,
///     r#"<img width="300" src="https://example.com/image.jpg" alt="Alt text" />"#
/// );
/// ```
pub fn convert_body(text: &str, config: &RewriteConfig) -> RewriteOutput {
    let scan = matcher::find_candidates(text);

    let warnings: Vec<String> = scan
        .rejected
        .iter()
        .map(|e| {
            warn!("{}", e);
            e.to_string()
        })
        .collect();

    if scan.candidates.is_empty() {
        info!("No images found in text");
        return RewriteOutput {
            warnings,
            stats: RewriteStats {
                failed: scan.rejected.len(),
                used_fallback: scan.used_fallback,
                ..RewriteStats::default()
            },
            ..RewriteOutput::unchanged(text)
        };
    }

    info!(
        "Found {} image(s){}",
        scan.candidates.len(),
        if scan.used_fallback {
            " via fallback tag scan"
        } else {
            ""
        }
    );

    let candidates = scan.candidates.len();
    let decisions: Vec<Decision<'_>> = scan
        .candidates
        .into_iter()
        .map(|c| decide(c, config))
        .collect();
    let skipped = decisions.iter().filter(|d| !d.is_rewrite()).count();

    let result = rewrite::apply(text, &decisions);
    info!(
        "Rewrote {} of {} image(s) to width {} ({} left as written)",
        result.replaced, candidates, config.target_width, skipped
    );

    RewriteOutput {
        text: result.text,
        changed: result.changed,
        warnings,
        stats: RewriteStats {
            candidates,
            rewritten: result.replaced,
            skipped,
            failed: scan.rejected.len(),
            used_fallback: scan.used_fallback,
        },
    }
}

/// Rewrite the description of one pull request.
///
/// Fetches the body, rewrites it, and writes it back only when it changed
/// and `dry_run` is false. Host errors are fatal and never retried here.
pub async fn convert_pull_request<S: PullRequestStore>(
    store: &S,
    key: &PullRequestKey,
    config: &RewriteConfig,
    dry_run: bool,
) -> Result<RewriteOutput, PrImageWidthError> {
    info!("Processing description of {} for images", key);
    let body = store.fetch_body(key).await?;
    let output = convert_body(&body, config);

    if !output.changed {
        info!("No images needed updating in {}", key);
    } else if dry_run {
        info!("Dry run: leaving {} untouched", key);
    } else {
        store.update_body(key, &output.text).await?;
        info!("Updated {} with width-constrained images", key);
    }

    Ok(output)
}

/// Rewrite a Markdown file.
///
/// Writes to `output` when given, otherwise back to `input` (only if the
/// text changed). Writes are atomic: a temp file in the target directory is
/// renamed over the destination.
pub async fn convert_file(
    input: impl AsRef<Path>,
    output: Option<&Path>,
    config: &RewriteConfig,
) -> Result<RewriteOutput, PrImageWidthError> {
    let input = input.as_ref();
    let text = read_text(input).await?;
    let result = convert_body(&text, config);

    match output {
        Some(path) => write_atomic(path, &result.text).await?,
        None if result.changed => write_atomic(input, &result.text).await?,
        None => debug!("{} unchanged; not rewriting", input.display()),
    }

    Ok(result)
}

async fn read_text(path: &Path) -> Result<String, PrImageWidthError> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PrImageWidthError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            PrImageWidthError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

async fn write_atomic(path: &Path, contents: &str) -> Result<(), PrImageWidthError> {
    let path = path.to_path_buf();
    let contents = contents.to_owned();
    tokio::task::spawn_blocking(move || write_atomic_blocking(&path, &contents))
        .await
        .map_err(|e| PrImageWidthError::Internal(format!("write task failed: {e}")))?
}

fn write_atomic_blocking(path: &Path, contents: &str) -> Result<(), PrImageWidthError> {
    let fail = |source: std::io::Error| PrImageWidthError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir: PathBuf = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(fail)?;
            parent.to_path_buf()
        }
        _ => PathBuf::from("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(fail)?;
    tmp.write_all(contents.as_bytes()).map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;
    Ok(())
}

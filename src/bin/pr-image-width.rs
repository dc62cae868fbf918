//! CLI binary for pr-image-width.
//!
//! A thin shim over the library crate: maps flags and GitHub Actions inputs
//! to `RewriteConfig`, picks the file or pull-request mode, and prints
//! results.

use anyhow::{Context, Result};
use clap::Parser;
use pr_image_width::config::DEFAULT_API_URL;
use pr_image_width::{
    convert_body, convert_file, convert_pull_request, parse_width, trigger_from_env,
    ExistingWidthPolicy, GitHubClient, GitHubConfig, PullRequestKey, RewriteConfig, RewriteOutput,
    Trigger,
};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Inside a GitHub Actions workflow triggered by pull_request
  pr-image-width

  # Rewrite a specific pull request from your machine
  GITHUB_TOKEN=ghp_... pr-image-width --repository octo/demo --pr 42 --width 400

  # Preview the change without updating the pull request
  pr-image-width --repository octo/demo --pr 42 --dry-run --json

  # Rewrite a local Markdown file (stdout)
  pr-image-width notes.md

  # Rewrite in place, or from stdin
  pr-image-width --in-place notes.md
  cat body.md | pr-image-width -

WORKFLOW:
  on: pull_request
  permissions:
    pull-requests: write
  steps:
    - run: pr-image-width
      env:
        INPUT_TOKEN: ${{ secrets.GITHUB_TOKEN }}
        INPUT_WIDTH: 300

ENVIRONMENT VARIABLES:
  INPUT_WIDTH        Target width in pixels (default 300; invalid values fall back to 300)
  INPUT_TOKEN        GitHub token (GITHUB_TOKEN is used when unset)
  GITHUB_API_URL     API root for GitHub Enterprise Server
  GITHUB_EVENT_NAME  Set by Actions; only pull_request events are processed
  GITHUB_EVENT_PATH  Set by Actions; event payload with the PR number
  GITHUB_REPOSITORY  Set by Actions; owner/repo
"#;

/// Constrain image widths in pull request descriptions.
#[derive(Parser, Debug)]
#[command(
    name = "pr-image-width",
    version,
    about = "Constrain image widths in pull request descriptions",
    long_about = "Rewrite Markdown images and <img> tags in a pull request description (or a \
local Markdown file) into <img width=\"N\" src=\"...\" alt=\"...\" /> so screenshots no longer \
render at full size. Tags that already set a width are left alone unless \
--override-existing-width is given.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown file to rewrite, or `-` for stdin. Omit to process a pull request.
    input: Option<String>,

    /// Write the rewritten file here instead of stdout.
    #[arg(short, long, env = "PR_IMAGE_WIDTH_OUTPUT", conflicts_with = "in_place")]
    output: Option<PathBuf>,

    /// Rewrite the input file in place.
    #[arg(long)]
    in_place: bool,

    /// Target width in pixels.
    #[arg(long, env = "INPUT_WIDTH")]
    width: Option<String>,

    /// GitHub token with pull-requests: write permission.
    #[arg(long, env = "INPUT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub API root.
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Repository as owner/repo (instead of the workflow event).
    #[arg(long, requires = "pr")]
    repository: Option<String>,

    /// Pull request number (instead of the workflow event).
    #[arg(long, requires = "repository")]
    pr: Option<u64>,

    /// HTTP timeout in seconds.
    #[arg(long, env = "PR_IMAGE_WIDTH_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Rewrite <img> tags even when they already declare a width.
    #[arg(long, env = "INPUT_OVERRIDE_EXISTING_WIDTH")]
    override_existing_width: bool,

    /// Do not update the pull request; just report.
    #[arg(long)]
    dry_run: bool,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PR_IMAGE_WIDTH_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PR_IMAGE_WIDTH_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let result = run(&cli).await;
    if let Err(ref e) = result {
        if in_github_actions() {
            eprintln!("::error::{}", escape_workflow_data(&format!("{e:#}")));
        }
    }
    result
}

async fn run(cli: &Cli) -> Result<()> {
    let config = build_config(cli)?;

    match cli.input.as_deref() {
        Some(input) => run_local(cli, input, &config).await,
        None => run_pull_request(cli, &config).await,
    }
}

/// Map CLI args to `RewriteConfig`.
fn build_config(cli: &Cli) -> Result<RewriteConfig> {
    let parsed = parse_width(cli.width.as_deref());
    if parsed.fell_back {
        warn!(
            "Width {:?} is not a positive integer; using {}",
            cli.width.as_deref().unwrap_or_default(),
            parsed.width
        );
    }

    let policy = if cli.override_existing_width {
        ExistingWidthPolicy::Override
    } else {
        ExistingWidthPolicy::Preserve
    };

    RewriteConfig::builder()
        .target_width(parsed.width.get())
        .existing_width(policy)
        .build()
        .context("Invalid configuration")
}

// ── Local file mode ──────────────────────────────────────────────────────────

async fn run_local(cli: &Cli, input: &str, config: &RewriteConfig) -> Result<()> {
    if input == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        let output = convert_body(&text, config);
        return emit_text(cli, &output);
    }

    let path = PathBuf::from(input);
    if cli.in_place || cli.output.is_some() {
        let output = convert_file(&path, cli.output.as_deref(), config)
            .await
            .with_context(|| format!("Failed to rewrite {}", path.display()))?;
        let target = cli.output.as_deref().unwrap_or(&path);
        report(cli, &output, &target.display().to_string());
        return print_json(cli, &output);
    }

    let text = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let output = convert_body(&text, config);
    emit_text(cli, &output)
}

fn emit_text(cli: &Cli, output: &RewriteOutput) -> Result<()> {
    report(cli, output, "stdout");
    let stdout = io::stdout();
    write_payload(&mut stdout.lock(), output, cli.json, true).context("Failed to write to stdout")
}

// ── Pull request mode ────────────────────────────────────────────────────────

async fn run_pull_request(cli: &Cli, config: &RewriteConfig) -> Result<()> {
    let key = match (&cli.repository, cli.pr) {
        (Some(repository), Some(number)) => PullRequestKey::from_repository(repository, number)?,
        _ => match trigger_from_env().await.context("Failed to read workflow event")? {
            Trigger::PullRequest(key) => key,
            Trigger::Ignored { event_name } => {
                info!(
                    "Event '{}' is not a pull request event; nothing to do",
                    event_name
                );
                return Ok(());
            }
        },
    };

    let token = cli
        .token
        .clone()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| std::env::var("GITHUB_TOKEN").ok())
        .unwrap_or_default();
    let github = GitHubConfig::new(token)
        .api_url(cli.api_url.as_str())
        .timeout_secs(cli.timeout);
    let client = GitHubClient::new(github).context("Failed to set up GitHub client")?;

    let output = convert_pull_request(&client, &key, config, cli.dry_run)
        .await
        .with_context(|| format!("Failed to process {key}"))?;

    report(cli, &output, &key.to_string());
    print_json(cli, &output)
}

// ── Reporting ────────────────────────────────────────────────────────────────
//
// stdout carries only the payload (rewritten document or JSON report);
// summaries and workflow commands go to stderr, where the Actions runner
// still picks them up.

fn print_json(cli: &Cli, output: &RewriteOutput) -> Result<()> {
    if !cli.json {
        return Ok(());
    }
    let stdout = io::stdout();
    write_payload(&mut stdout.lock(), output, true, false).context("Failed to write to stdout")
}

/// Write the JSON report, or the rewritten text when `with_text` is set.
fn write_payload<W: Write>(
    out: &mut W,
    output: &RewriteOutput,
    json: bool,
    with_text: bool,
) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, output).context("Failed to serialise output")?;
        writeln!(out)?;
    } else if with_text {
        out.write_all(output.text.as_bytes())?;
    }
    out.flush()?;
    Ok(())
}

fn report(cli: &Cli, output: &RewriteOutput, target: &str) {
    let stderr = io::stderr();
    // Nothing sensible to do if stderr itself is gone.
    let _ = write_report(
        &mut stderr.lock(),
        output,
        target,
        in_github_actions(),
        cli.quiet,
    );
}

/// Summary lines, plus `::warning::` workflow commands inside Actions.
fn write_report<W: Write>(
    out: &mut W,
    output: &RewriteOutput,
    target: &str,
    in_actions: bool,
    quiet: bool,
) -> io::Result<()> {
    if in_actions {
        for w in &output.warnings {
            writeln!(out, "::warning::{}", escape_workflow_data(w))?;
        }
    }
    if quiet {
        return Ok(());
    }

    let stats = &output.stats;
    let mark = if output.warnings.is_empty() {
        green("✔")
    } else {
        yellow("⚠")
    };
    writeln!(
        out,
        "{}  {}/{} images rewritten  →  {}{}",
        mark,
        stats.rewritten,
        stats.candidates,
        target,
        if output.changed { "" } else { " (unchanged)" },
    )?;
    if stats.skipped > 0 || stats.failed > 0 {
        writeln!(
            out,
            "   {}",
            dim(&format!(
                "{} kept as written, {} could not be parsed",
                stats.skipped, stats.failed
            ))
        )?;
    }
    Ok(())
}

fn in_github_actions() -> bool {
    std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true")
}

/// Escape a message for a workflow command (`::error::`, `::warning::`).
fn escape_workflow_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

//! GitHub Actions trigger gate.
//!
//! A workflow run describes itself through environment variables and a JSON
//! payload file. Only pull request events lead to a rewrite; every other
//! event resolves to [`Trigger::Ignored`] and the run ends as a no-op.

use crate::error::PrImageWidthError;
use crate::github::PullRequestKey;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Event names that carry a pull request.
pub const PULL_REQUEST_EVENTS: [&str; 2] = ["pull_request", "pull_request_target"];

/// What the current workflow event asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Rewrite the description of this pull request.
    PullRequest(PullRequestKey),
    /// Not a pull request event.
    Ignored { event_name: String },
}

#[derive(Debug, Deserialize)]
struct EventPayload {
    pull_request: Option<PullRequestRef>,
    repository: Option<RepositoryRef>,
}

#[derive(Debug, Deserialize)]
struct PullRequestRef {
    number: u64,
}

#[derive(Debug, Deserialize)]
struct RepositoryRef {
    full_name: String,
}

/// Resolve a trigger from already-loaded event data.
///
/// `repository` is `GITHUB_REPOSITORY`; when absent, the payload's
/// `repository.full_name` is used. `payload` is only parsed for pull
/// request events.
pub fn resolve_trigger(
    event_name: &str,
    repository: Option<&str>,
    payload: &str,
) -> Result<Trigger, PrImageWidthError> {
    if !PULL_REQUEST_EVENTS.contains(&event_name) {
        return Ok(Trigger::Ignored {
            event_name: event_name.to_string(),
        });
    }

    let payload: EventPayload = serde_json::from_str(payload)
        .map_err(|e| PrImageWidthError::EventPayload(e.to_string()))?;
    let number = payload
        .pull_request
        .map(|pr| pr.number)
        .ok_or_else(|| PrImageWidthError::EventPayload("payload has no pull_request.number".into()))?;

    let full_name = match (repository, payload.repository) {
        (Some(name), _) if !name.trim().is_empty() => name.to_string(),
        (_, Some(repo)) => repo.full_name,
        _ => {
            return Err(PrImageWidthError::EventPayload(
                "repository unknown: GITHUB_REPOSITORY unset and payload has no repository".into(),
            ))
        }
    };

    let key = PullRequestKey::from_repository(&full_name, number)?;
    debug!("Resolved {} event for {}", event_name, key);
    Ok(Trigger::PullRequest(key))
}

/// Resolve the trigger of the running workflow from `GITHUB_EVENT_NAME`,
/// `GITHUB_REPOSITORY` and the file at `GITHUB_EVENT_PATH`.
pub async fn trigger_from_env() -> Result<Trigger, PrImageWidthError> {
    let event_name = std::env::var("GITHUB_EVENT_NAME").map_err(|_| {
        PrImageWidthError::EventPayload(
            "GITHUB_EVENT_NAME is not set; run inside GitHub Actions or pass an input file".into(),
        )
    })?;
    if !PULL_REQUEST_EVENTS.contains(&event_name.as_str()) {
        return Ok(Trigger::Ignored { event_name });
    }

    let event_path = std::env::var("GITHUB_EVENT_PATH")
        .map_err(|_| PrImageWidthError::EventPayload("GITHUB_EVENT_PATH is not set".into()))?;
    let payload = read_payload(Path::new(&event_path)).await?;
    let repository = std::env::var("GITHUB_REPOSITORY").ok();

    resolve_trigger(&event_name, repository.as_deref(), &payload)
}

async fn read_payload(path: &Path) -> Result<String, PrImageWidthError> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        PrImageWidthError::EventPayload(format!("cannot read '{}': {}", path.display(), e))
    })
}

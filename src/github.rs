//! Pull request storage: fetch and update a PR description.
//!
//! The rewrite engine never talks to a host directly. It goes through
//! [`PullRequestStore`], which [`GitHubClient`] implements against the
//! GitHub REST API and tests implement in memory.

use crate::config::GitHubConfig;
use crate::error::PrImageWidthError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

const GITHUB_API_VERSION: &str = "2022-11-28";

/// Identifies one pull request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PullRequestKey {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl PullRequestKey {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            number,
        }
    }

    /// Build a key from an `owner/repo` string such as `GITHUB_REPOSITORY`.
    pub fn from_repository(full_name: &str, number: u64) -> Result<Self, PrImageWidthError> {
        match full_name.trim().split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(Self::new(owner, repo, number))
            }
            _ => Err(PrImageWidthError::InvalidRepository(full_name.to_string())),
        }
    }
}

impl fmt::Display for PullRequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// Where PR descriptions are read from and written back to.
///
/// `fetch_body` must fail with [`PrImageWidthError::PullRequestNotFound`]
/// when the PR does not exist and [`PrImageWidthError::AuthFailed`] when the
/// credential is rejected, so callers can tell the two apart.
pub trait PullRequestStore: Send + Sync {
    /// Current description; an empty description is `""`.
    fn fetch_body(
        &self,
        key: &PullRequestKey,
    ) -> impl Future<Output = Result<String, PrImageWidthError>> + Send;

    /// Replace the description.
    fn update_body(
        &self,
        key: &PullRequestKey,
        body: &str,
    ) -> impl Future<Output = Result<(), PrImageWidthError>> + Send;
}

/// GitHub REST API client for pull request descriptions.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    config: GitHubConfig,
}

#[derive(Deserialize)]
struct PullRequestPayload {
    body: Option<String>,
}

#[derive(Serialize)]
struct UpdatePayload<'a> {
    body: &'a str,
}

#[derive(Deserialize)]
struct ApiErrorPayload {
    message: Option<String>,
}

impl GitHubClient {
    /// Build a client. Fails with [`PrImageWidthError::MissingToken`] when the
    /// token is blank.
    pub fn new(config: GitHubConfig) -> Result<Self, PrImageWidthError> {
        if config.token.trim().is_empty() {
            return Err(PrImageWidthError::MissingToken);
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token.trim()))
            .map_err(|_| PrImageWidthError::InvalidConfig("token contains invalid characters".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            HeaderName::from_static("x-github-api-version"),
            HeaderValue::from_static(GITHUB_API_VERSION),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| PrImageWidthError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn pull_url(&self, key: &PullRequestKey) -> String {
        format!(
            "{}/repos/{}/{}/pulls/{}",
            self.config.api_url, key.owner, key.repo, key.number
        )
    }

    fn send_error(&self, url: &str, e: reqwest::Error) -> PrImageWidthError {
        if e.is_timeout() {
            PrImageWidthError::Timeout {
                url: url.to_string(),
                secs: self.config.timeout_secs,
            }
        } else {
            PrImageWidthError::RequestFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }

    /// Map a non-success status onto the error taxonomy.
    async fn check_status(
        key: &PullRequestKey,
        url: &str,
        response: Response,
    ) -> Result<Response, PrImageWidthError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let raw = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorPayload>(&raw)
            .ok()
            .and_then(|p| p.message)
            .unwrap_or(raw);
        Err(status_error(key, url, status, message))
    }
}

fn status_error(
    key: &PullRequestKey,
    url: &str,
    status: StatusCode,
    message: String,
) -> PrImageWidthError {
    match status {
        StatusCode::NOT_FOUND => PrImageWidthError::PullRequestNotFound {
            owner: key.owner.clone(),
            repo: key.repo.clone(),
            number: key.number,
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PrImageWidthError::AuthFailed {
            status: status.as_u16(),
            detail: message,
        },
        _ => PrImageWidthError::RequestFailed {
            url: url.to_string(),
            reason: format!("HTTP {status}: {message}"),
        },
    }
}

impl PullRequestStore for GitHubClient {
    async fn fetch_body(&self, key: &PullRequestKey) -> Result<String, PrImageWidthError> {
        let url = self.pull_url(key);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.send_error(&url, e))?;
        let response = Self::check_status(key, &url, response).await?;

        let payload: PullRequestPayload =
            response
                .json()
                .await
                .map_err(|e| PrImageWidthError::InvalidResponse {
                    url: url.clone(),
                    detail: e.to_string(),
                })?;

        let body = payload.body.unwrap_or_default();
        info!("Fetched description of {} ({} bytes)", key, body.len());
        Ok(body)
    }

    async fn update_body(&self, key: &PullRequestKey, body: &str) -> Result<(), PrImageWidthError> {
        let url = self.pull_url(key);
        debug!("PATCH {}", url);

        let response = self
            .client
            .patch(&url)
            .json(&UpdatePayload { body })
            .send()
            .await
            .map_err(|e| self.send_error(&url, e))?;
        Self::check_status(key, &url, response).await?;

        info!("Updated description of {}", key);
        Ok(())
    }
}

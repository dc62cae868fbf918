//! Configuration types for image-width rewriting.
//!
//! Rewrite behaviour is controlled through [`RewriteConfig`], built via its
//! [`RewriteConfigBuilder`]. Host access (API URL, token, timeout) lives in a
//! separate [`GitHubConfig`] because the core engine never needs it: local
//! file mode runs with a `RewriteConfig` alone.

use crate::error::PrImageWidthError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Width applied when none is configured or the configured value is unusable.
pub const DEFAULT_WIDTH: NonZeroU32 = match NonZeroU32::new(300) {
    Some(w) => w,
    None => unreachable!(),
};

/// Default GitHub REST API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Configuration for a single rewrite run.
///
/// # Example
/// ```rust
/// use pr_image_width::{ExistingWidthPolicy, RewriteConfig};
///
/// let config = RewriteConfig::builder()
///     .target_width(480)
///     .existing_width(ExistingWidthPolicy::Preserve)
///     .build()
///     .unwrap();
/// assert_eq!(config.target_width.get(), 480);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteConfig {
    /// Width, in pixels, written into every rewritten tag. Default: 300.
    ///
    /// Emitted verbatim; no upper bound is enforced.
    pub target_width: NonZeroU32,

    /// What to do with `<img>` tags that already carry a `width`.
    /// Default: [`ExistingWidthPolicy::Preserve`].
    pub existing_width: ExistingWidthPolicy,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            target_width: DEFAULT_WIDTH,
            existing_width: ExistingWidthPolicy::default(),
        }
    }
}

impl RewriteConfig {
    /// Create a new builder for `RewriteConfig`.
    pub fn builder() -> RewriteConfigBuilder {
        RewriteConfigBuilder {
            width: DEFAULT_WIDTH.get(),
            existing_width: ExistingWidthPolicy::default(),
        }
    }
}

/// Builder for [`RewriteConfig`].
#[derive(Debug)]
pub struct RewriteConfigBuilder {
    width: u32,
    existing_width: ExistingWidthPolicy,
}

impl RewriteConfigBuilder {
    pub fn target_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn existing_width(mut self, policy: ExistingWidthPolicy) -> Self {
        self.existing_width = policy;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RewriteConfig, PrImageWidthError> {
        let target_width = NonZeroU32::new(self.width).ok_or_else(|| {
            PrImageWidthError::InvalidConfig("target width must be ≥ 1".into())
        })?;
        Ok(RewriteConfig {
            target_width,
            existing_width: self.existing_width,
        })
    }
}

/// Policy for `<img>` tags that already declare a `width` attribute.
///
/// Applied uniformly to every tag in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExistingWidthPolicy {
    /// Leave tags with an author-chosen width untouched. (default)
    #[default]
    Preserve,
    /// Rewrite every tag to the target width, replacing any existing width.
    Override,
}

/// Result of interpreting a user-supplied width setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedWidth {
    pub width: NonZeroU32,
    /// True when the raw value was present but unusable and
    /// [`DEFAULT_WIDTH`] was substituted.
    pub fell_back: bool,
}

/// Interpret the optional `width` setting.
///
/// Absent or blank input yields the default silently. Anything that is not
/// a positive integer (`"abc"`, `"0"`, `"-5"`, `"12.5"`) also yields the
/// default, with `fell_back` set so the caller can warn about it.
pub fn parse_width(raw: Option<&str>) -> ParsedWidth {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return ParsedWidth {
            width: DEFAULT_WIDTH,
            fell_back: false,
        };
    };

    match raw.parse::<NonZeroU32>() {
        Ok(width) => ParsedWidth {
            width,
            fell_back: false,
        },
        Err(_) => ParsedWidth {
            width: DEFAULT_WIDTH,
            fell_back: true,
        },
    }
}

/// Connection settings for the GitHub REST API.
#[derive(Clone)]
pub struct GitHubConfig {
    /// API root, e.g. `https://api.github.com` or a GHES `/api/v3` URL.
    pub api_url: String,

    /// Access token sent as a bearer credential. Never logged.
    pub token: String,

    /// Per-request timeout in seconds. Default: 30.
    pub timeout_secs: u64,

    /// `User-Agent` header; the API rejects requests without one.
    pub user_agent: String,
}

impl GitHubConfig {
    /// Settings for the public API with the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: token.into(),
            timeout_secs: 30,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs.max(1);
        self
    }
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = RewriteConfig::default();
        assert_eq!(config.target_width.get(), 300);
        assert_eq!(config.existing_width, ExistingWidthPolicy::Preserve);
    }

    #[test]
    fn builder_rejects_zero_width() {
        let err = RewriteConfig::builder().target_width(0).build().unwrap_err();
        assert!(matches!(err, PrImageWidthError::InvalidConfig(_)));
    }

    #[test]
    fn builder_accepts_large_width() {
        let config = RewriteConfig::builder().target_width(10_000).build().unwrap();
        assert_eq!(config.target_width.get(), 10_000);
    }

    #[test]
    fn parse_width_values() {
        assert_eq!(parse_width(Some("500")).width.get(), 500);
        assert_eq!(parse_width(Some(" 640 ")).width.get(), 640);
        assert_eq!(parse_width(None), ParsedWidth { width: DEFAULT_WIDTH, fell_back: false });
        assert_eq!(parse_width(Some("")), ParsedWidth { width: DEFAULT_WIDTH, fell_back: false });

        for bad in ["abc", "0", "-5", "12.5", "300px", "500px"] {
            let parsed = parse_width(Some(bad));
            assert_eq!(parsed.width, DEFAULT_WIDTH, "input {bad:?}");
            assert!(parsed.fell_back, "input {bad:?}");
        }
    }

    #[test]
    fn github_config_redacts_token() {
        let config = GitHubConfig::new("ghp_secret").api_url("https://ghe.example/api/v3/");
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("ghp_secret"));
        assert_eq!(config.api_url, "https://ghe.example/api/v3");
    }
}

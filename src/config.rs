//! Handler configuration
//!
//! Everything the handler needs to reach the leaderboard file is collected
//! once at process start into a `HandlerConfig` and passed down explicitly.
//! Business logic never reads the environment itself.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_COMMIT_MESSAGE: &str = "Updated highscores";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Location of the leaderboard file and how to write it.
#[derive(Clone, PartialEq)]
pub struct HandlerConfig {
    /// GitHub token with contents write access to the repository.
    pub token: String,
    pub owner: String,
    pub repo: String,
    /// Path of the JSON file inside the repository, e.g. `data/highscores.json`.
    pub file_path: String,
    pub branch: String,
    /// API root, overridable for GitHub Enterprise and tests.
    pub api_url: String,
    pub commit_message: String,
    /// Extra read-modify-write attempts after a stale revision is rejected.
    /// Zero keeps the single-attempt behaviour.
    pub conflict_retries: u32,
    pub timeout: Duration,
}

impl HandlerConfig {
    pub fn new(
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        file_path: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            owner: owner.into(),
            repo: repo.into(),
            file_path: file_path.into(),
            branch: branch.into(),
            api_url: DEFAULT_API_URL.to_string(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            conflict_retries: 0,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Required: `GITHUB_TOKEN`, `REPO_OWNER`, `REPO_NAME`, `TARGET_FILE`,
    /// `TARGET_BRANCH`. Optional: `GITHUB_API_URL`, `COMMIT_MESSAGE`,
    /// `CONFLICT_RETRIES`, `HTTP_TIMEOUT_SECS`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let mut config = Self::new(
            required("GITHUB_TOKEN")?,
            required("REPO_OWNER")?,
            required("REPO_NAME")?,
            required("TARGET_FILE")?,
            required("TARGET_BRANCH")?,
        );

        if let Some(url) = lookup("GITHUB_API_URL").filter(|v| !v.is_empty()) {
            config = config.with_api_url(url);
        }
        if let Some(message) = lookup("COMMIT_MESSAGE").filter(|v| !v.is_empty()) {
            config.commit_message = message;
        }
        if let Some(raw) = lookup("CONFLICT_RETRIES") {
            config.conflict_retries = raw.trim().parse().map_err(|e| ConfigError::Invalid {
                name: "CONFLICT_RETRIES",
                message: format!("{}", e),
            })?;
        }
        if let Some(raw) = lookup("HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|e| ConfigError::Invalid {
                name: "HTTP_TIMEOUT_SECS",
                message: format!("{}", e),
            })?;
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    name: "HTTP_TIMEOUT_SECS",
                    message: "must be at least 1".to_string(),
                });
            }
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Set the API root (trailing slashes are dropped).
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_conflict_retries(mut self, retries: u32) -> Self {
        self.conflict_retries = retries;
        self
    }

    /// Contents API URL of the leaderboard file.
    pub fn contents_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url,
            self.owner,
            self.repo,
            self.file_path.trim_start_matches('/')
        )
    }
}

/// Where the HTTP front end listens.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
        }
    }
}

// Keeps the token out of logs.
impl fmt::Debug for HandlerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerConfig")
            .field("token", &"<redacted>")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("file_path", &self.file_path)
            .field("branch", &self.branch)
            .field("api_url", &self.api_url)
            .field("commit_message", &self.commit_message)
            .field("conflict_retries", &self.conflict_retries)
            .field("timeout", &self.timeout)
            .finish()
    }
}

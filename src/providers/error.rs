use std::fmt;

use crate::utils::truncate_str;

/// Classified collaborator error: tells the caller *why* an external call
/// failed so logs carry a usable diagnosis.
#[derive(Debug)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// 401/403, or missing credentials detected before the request.
    Auth,
    /// 429, rate limited.
    RateLimit,
    /// 404 or "model not found": bad model name.
    NotFound,
    /// 408, request timeout, or collaborator took too long.
    Timeout,
    /// Connection refused, DNS failure, reset, etc.
    Network,
    /// 500/502/503/504: collaborator-side outage.
    ServerError,
    /// Anything else.
    Unknown,
}

impl ProviderError {
    pub fn from_status(status: u16, body: &str) -> Self {
        let kind = match status {
            401 | 403 => ProviderErrorKind::Auth,
            404 => ProviderErrorKind::NotFound,
            408 => ProviderErrorKind::Timeout,
            429 => ProviderErrorKind::RateLimit,
            500 | 502 | 503 | 504 => ProviderErrorKind::ServerError,
            _ => ProviderErrorKind::Unknown,
        };

        Self {
            kind,
            status: Some(status),
            message: truncate_str(body, 300),
        }
    }

    pub fn network(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ProviderErrorKind::Timeout
        } else {
            ProviderErrorKind::Network
        };
        Self {
            kind,
            status: None,
            message: err.to_string(),
        }
    }

    /// Credentials were never configured. Raised at first use, not at
    /// startup, since collaborators validate lazily.
    pub fn missing_credentials(key: &str) -> Self {
        Self {
            kind: ProviderErrorKind::Auth,
            status: None,
            message: format!(
                "'{}' is not configured; set it in config.toml or the environment",
                key
            ),
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(status) = self.status {
            write!(
                f,
                "Provider error ({}, {:?}): {}",
                status, self.kind, self.message
            )
        } else {
            write!(f, "Provider error ({:?}): {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for ProviderError {}

//! Target URL resolution.
//!
//! The inbound path (minus its leading `/`) is the absolute URL to relay to:
//! `/https://api.example.com/v1/items?page=2` targets
//! `https://api.example.com/v1/items?page=2`. A missing scheme defaults to `http`.

use axum::http::Uri;
use url::Url;

use crate::http::error::RelayError;

/// A parsed, absolute upstream URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    url: Url,
}

impl Target {
    /// Resolve the target embedded in an inbound request URI.
    pub fn from_request_uri(uri: &Uri) -> Result<Self, RelayError> {
        let raw = uri.path().strip_prefix('/').unwrap_or(uri.path());
        match uri.query() {
            Some(query) => Self::parse(&format!("{raw}?{query}")),
            None => Self::parse(raw),
        }
    }

    /// Parse a literal target string, prepending `http://` when no scheme is given.
    pub fn parse(raw: &str) -> Result<Self, RelayError> {
        if raw.is_empty() {
            return Err(RelayError::InvalidTarget("no target URL in request path".into()));
        }

        let url = if raw.starts_with("http://") || raw.starts_with("https://") {
            Url::parse(raw)
        } else {
            Url::parse(&format!("http://{raw}"))
        }
        .map_err(|e| RelayError::InvalidTarget(format!("{raw}: {e}")))?;

        if url.host_str().map_or(true, str::is_empty) {
            return Err(RelayError::InvalidTarget(format!("{raw}: missing host")));
        }

        Ok(Self { url })
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Hostname as checked against the allow-list.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn port(&self) -> Option<u16> {
        self.url.port()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.url.query()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn into_url(self) -> Url {
        self.url
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.url, f)
    }
}

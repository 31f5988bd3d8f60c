//! Explicitly injected request context.
//!
//! The base URL and access token are configured once by the shell and passed
//! to every request builder; nothing in the core reads ambient storage.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("base URL scheme must be http or https, got {0}")]
    InvalidScheme(String),
}

/// Per-session request context. The token never appears in Debug output.
#[derive(Default)]
pub struct Session {
    base_url: Option<Url>,
    access_token: Option<SecretString>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("token_present", &self.access_token.is_some())
            .finish()
    }
}

impl Session {
    pub fn configure(
        &mut self,
        base_url: &str,
        access_token: Option<String>,
    ) -> Result<(), SessionError> {
        let url =
            Url::parse(base_url).map_err(|e| SessionError::InvalidBaseUrl(e.to_string()))?;

        match url.scheme() {
            "http" | "https" => {}
            other => return Err(SessionError::InvalidScheme(other.to_string())),
        }

        self.base_url = Some(url);
        self.access_token = access_token.map(SecretString::new);
        Ok(())
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// Absolute URL for a backend path like `events/42.json`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> Option<String> {
        let base = self.base_url.as_ref()?;
        base.join(path).ok().map(String::from)
    }

    /// `Authorization` header value, when a token was injected.
    #[must_use]
    pub fn bearer(&self) -> Option<String> {
        self.access_token
            .as_ref()
            .map(|t| format!("Bearer {}", t.expose_secret()))
    }
}

/// Serializable shape the shell sends to configure the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub base_url: String,
    pub access_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_paths_against_the_base() {
        let mut s = Session::default();
        s.configure("https://api.example.com/", Some("tok".into())).unwrap();
        assert_eq!(
            s.endpoint("events/42.json").as_deref(),
            Some("https://api.example.com/events/42.json")
        );
        assert_eq!(s.bearer().as_deref(), Some("Bearer tok"));
    }

    #[test]
    fn rejects_non_http_schemes() {
        let mut s = Session::default();
        assert_eq!(
            s.configure("ftp://files.example.com", None).unwrap_err(),
            SessionError::InvalidScheme("ftp".into())
        );
        assert!(!s.is_configured());
    }

    #[test]
    fn debug_never_prints_the_token() {
        let mut s = Session::default();
        s.configure("https://api.example.com", Some("super_secret".into())).unwrap();
        let debug = format!("{s:?}");
        assert!(!debug.contains("super_secret"));
    }

    #[test]
    fn unconfigured_session_yields_no_endpoint() {
        let s = Session::default();
        assert!(s.endpoint("events.json").is_none());
        assert!(s.bearer().is_none());
    }
}

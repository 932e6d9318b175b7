//! A thin client for chatting with an OpenAI assistant over uploaded
//! documents: typed bindings for the assistants API, a run poller and a
//! local index of uploaded files.

use serde::Deserialize;
use std::env;

pub mod assistants;
pub mod client;
pub mod config;
pub mod logging;
pub mod metadata;
pub mod session;
pub mod util;

pub use client::OpenAiClient;
pub use config::Settings;
pub use metadata::{FileMetadataStore, FileRecord};
pub use session::{AssistantSession, SessionError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";

/// Log targets, one per component of the session.
pub mod target {
    pub const ASSISTANT: &str = "assistant";
    pub const THREAD: &str = "thread";
    pub const RUN: &str = "run";
    pub const FILE: &str = "file";

    pub const ALL: [&str; 4] = [ASSISTANT, THREAD, RUN, FILE];
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OpenAiError {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
    pub param: Option<String>,
    pub code: Option<String>,
}

impl OpenAiError {
    pub fn new(message: String, error_type: String) -> OpenAiError {
        OpenAiError {
            message,
            error_type,
            param: None,
            code: None,
        }
    }
}

impl std::fmt::Display for OpenAiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for OpenAiError {}

impl From<reqwest::Error> for OpenAiError {
    fn from(value: reqwest::Error) -> Self {
        OpenAiError::new(value.to_string(), "reqwest".to_string())
    }
}

pub type ApiResponseOrError<T> = Result<T, OpenAiError>;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Credentials {
    api_key: String,
    base_url: String,
}

impl Credentials {
    /// Creates credentials with the given API key and base URL.
    ///
    /// If the base URL is empty, the default base URL will be used.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = if base_url.is_empty() {
            DEFAULT_BASE_URL.to_string()
        } else {
            parse_base_url(base_url)
        };
        Self {
            api_key: api_key.into(),
            base_url,
        }
    }

    /// Fetches the credentials from the environment variables
    /// `OPENAI_KEY` (or `OPENAI_API_KEY`) and `OPENAI_BASE_URL`.
    ///
    /// A missing key yields an empty one; the API will reject it.
    pub fn from_env() -> Credentials {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Credentials
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_KEY")
            .or_else(|| lookup("OPENAI_API_KEY"))
            .unwrap_or_default();
        let base_url = lookup("OPENAI_BASE_URL").unwrap_or_default();
        Credentials::new(api_key, base_url)
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn parse_base_url(mut value: String) -> String {
    if !value.ends_with('/') {
        value += "/";
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let credentials = Credentials::new("sk-test", "http://localhost:8080/v1");
        assert_eq!(credentials.base_url(), "http://localhost:8080/v1/");
    }

    #[test]
    fn empty_base_url_falls_back_to_default() {
        let credentials = Credentials::new("sk-test", "");
        assert_eq!(credentials.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn key_lookup_prefers_openai_key() {
        let credentials = Credentials::from_lookup(|key| match key {
            "OPENAI_KEY" => Some("primary".to_string()),
            "OPENAI_API_KEY" => Some("secondary".to_string()),
            _ => None,
        });
        assert_eq!(credentials.api_key(), "primary");

        let credentials = Credentials::from_lookup(|key| match key {
            "OPENAI_API_KEY" => Some("secondary".to_string()),
            _ => None,
        });
        assert_eq!(credentials.api_key(), "secondary");
    }
}

use std::{env, path::PathBuf, time::Duration};

use anyhow::{Context, Result};

use crate::Credentials;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-16k";
pub const DEFAULT_METADATA_FILE: &str = "files/metadata.json";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Everything the session and the binary read from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: Credentials,
    pub model: String,
    /// Existing remote objects to reuse instead of creating new ones.
    pub assistant_id: Option<String>,
    pub thread_id: Option<String>,
    pub vector_store_id: Option<String>,
    pub metadata_file: PathBuf,
    pub poll_interval: Duration,
    pub log_dir: PathBuf,
}

impl Settings {
    pub fn from_env() -> Result<Settings> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Settings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let poll_interval = match non_empty("RUN_POLL_INTERVAL_SECS") {
            Some(value) => {
                let secs: u64 = value
                    .parse()
                    .with_context(|| format!("RUN_POLL_INTERVAL_SECS must be whole seconds, got {value:?}"))?;
                Duration::from_secs(secs)
            }
            None => DEFAULT_POLL_INTERVAL,
        };

        Ok(Settings {
            credentials: Credentials::from_lookup(&lookup),
            model: non_empty("ASSISTANT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            assistant_id: non_empty("ASSISTANT_ID"),
            thread_id: non_empty("THREAD_ID"),
            vector_store_id: non_empty("VECTOR_STORE_ID"),
            metadata_file: non_empty("METADATA_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_METADATA_FILE)),
            poll_interval,
            log_dir: non_empty("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
        })
    }
}

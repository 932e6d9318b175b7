use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, time::Duration};

use crate::{assistants::Tool, client::OpenAiClient, target, ApiResponseOrError};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Run {
    pub id: String,
    pub object: String,
    pub created_at: u64,
    /// The ID of the assistant used for this run.
    pub assistant_id: String,
    /// The ID of the thread associated with this run.
    pub thread_id: String,
    pub status: Status,
    /// The last error that occurred during this run.
    pub last_error: Option<LastError>,

    pub expires_at: Option<u64>,
    pub started_at: Option<u64>,
    pub completed_at: Option<u64>,
    pub cancelled_at: Option<u64>,
    pub failed_at: Option<u64>,

    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub tools: Vec<Tool>,
    pub usage: Option<Usage>,
    pub metadata: Option<HashMap<String, String>>,
}

impl Run {
    /// Wall time between creation and completion, once the run has completed.
    pub fn elapsed(&self) -> Option<Duration> {
        self.completed_at
            .map(|completed_at| Duration::from_secs(completed_at.saturating_sub(self.created_at)))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
}

impl Status {
    /// Whether the run will not change status on its own anymore.
    ///
    /// `requires_action` counts as terminal: nothing here submits tool
    /// outputs, so the run would otherwise sit there until it expires.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::Queued | Status::InProgress | Status::Cancelling)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Status::Completed)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LastError {
    pub code: String,
    pub message: String,
}

impl std::fmt::Display for LastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Serialize, Builder, Debug, Clone, Default)]
#[builder(pattern = "owned")]
#[builder(name = "CreateRunBuilder")]
#[builder(setter(strip_option, into))]
pub struct CreateRunRequest {
    pub assistant_id: String,
    /// Overrides the assistant's instructions for this run.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub additional_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub max_completion_tokens: Option<u32>,
}

impl OpenAiClient {
    pub async fn create_run(
        &self,
        thread_id: &str,
        request: CreateRunRequest,
    ) -> ApiResponseOrError<Run> {
        self.post(format!("threads/{thread_id}/runs"), request)
            .await
    }

    pub async fn get_run(&self, thread_id: &str, run_id: &str) -> ApiResponseOrError<Run> {
        self.get(format!("threads/{thread_id}/runs/{run_id}")).await
    }

    /// Re-fetches the run every `interval` until it reaches a terminal
    /// status, and returns it in that status.
    ///
    /// The first check happens immediately. A failed status request ends
    /// the wait with its error.
    pub async fn poll_run(&self, run: &Run, interval: Duration) -> ApiResponseOrError<Run> {
        loop {
            let current = self
                .get_run(&run.thread_id, &run.id)
                .await
                .inspect_err(|error| {
                    log::error!(target: target::RUN, "An error occurred while retrieving the run: {error}");
                })?;

            if current.status.is_terminal() {
                return Ok(current);
            }

            log::info!(target: target::RUN, "Waiting for run to complete...");
            tokio::time::sleep(interval).await;
        }
    }
}

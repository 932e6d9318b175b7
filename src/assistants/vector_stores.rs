use std::{collections::HashMap, time::Duration};

use crate::{
    client::{Deleted, OpenAiClient, Order},
    target, ApiResponseOrError,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VectorStore {
    pub id: String,
    pub object: String,
    pub created_at: u64,
    pub name: Option<String>,
    #[serde(default)]
    pub usage_bytes: u64,
    pub file_counts: FileCounts,
    pub status: VectorStoreStatus,
    pub expires_after: Option<ExpiresAfter>,
    pub expires_at: Option<u64>,
    pub last_active_at: Option<u64>,
    pub metadata: Option<HashMap<String, String>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct FileCounts {
    pub in_progress: u32,
    pub completed: u32,
    pub failed: u32,
    pub cancelled: u32,
    pub total: u32,
}

impl std::fmt::Display for FileCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "total={} completed={} in_progress={} failed={} cancelled={}",
            self.total, self.completed, self.in_progress, self.failed, self.cancelled
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VectorStoreStatus {
    Expired,
    InProgress,
    Completed,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExpiresAfter {
    pub anchor: String,
    pub days: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CreateVectorStoreRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_after: Option<ExpiresAfter>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VectorStoreFile {
    /// Same as the ID of the underlying file.
    pub id: String,
    pub object: String,
    pub created_at: u64,
    pub vector_store_id: String,
    #[serde(default)]
    pub usage_bytes: u64,
    pub status: VectorStoreFileStatus,
    pub last_error: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VectorStoreFileStatus {
    InProgress,
    Completed,
    Cancelled,
    Failed,
}

/// A group of files attached to a vector store in one call.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FileBatch {
    pub id: String,
    pub object: String,
    pub created_at: u64,
    pub vector_store_id: String,
    pub status: VectorStoreFileStatus,
    pub file_counts: FileCounts,
}

impl OpenAiClient {
    pub async fn create_vector_store(
        &self,
        params: CreateVectorStoreRequest,
    ) -> ApiResponseOrError<VectorStore> {
        self.post("vector_stores", params).await
    }

    pub async fn get_vector_store(&self, vector_store_id: &str) -> ApiResponseOrError<VectorStore> {
        self.get(format!("vector_stores/{vector_store_id}")).await
    }

    pub async fn list_vector_store_files(
        &self,
        vector_store_id: &str,
    ) -> ApiResponseOrError<Vec<VectorStoreFile>> {
        self.list(format!("vector_stores/{vector_store_id}/files"), Order::Asc, None)
            .await
    }

    /// Detaches a file from the vector store. The file itself is kept.
    pub async fn delete_vector_store_file(
        &self,
        vector_store_id: &str,
        file_id: &str,
    ) -> ApiResponseOrError<Deleted> {
        self.delete(format!("vector_stores/{vector_store_id}/files/{file_id}"))
            .await
    }

    pub async fn create_file_batch(
        &self,
        vector_store_id: &str,
        file_ids: &[String],
    ) -> ApiResponseOrError<FileBatch> {
        self.post(
            format!("vector_stores/{vector_store_id}/file_batches"),
            json!({ "file_ids": file_ids }),
        )
        .await
    }

    pub async fn get_file_batch(
        &self,
        vector_store_id: &str,
        batch_id: &str,
    ) -> ApiResponseOrError<FileBatch> {
        self.get(format!(
            "vector_stores/{vector_store_id}/file_batches/{batch_id}"
        ))
        .await
    }

    /// Waits until the batch leaves `in_progress`, checking every `interval`.
    pub async fn poll_file_batch(
        &self,
        mut batch: FileBatch,
        interval: Duration,
    ) -> ApiResponseOrError<FileBatch> {
        while batch.status == VectorStoreFileStatus::InProgress {
            log::debug!(target: target::FILE, "File batch {} still in progress", batch.id);
            tokio::time::sleep(interval).await;
            batch = self
                .get_file_batch(&batch.vector_store_id, &batch.id)
                .await?;
        }
        Ok(batch)
    }
}

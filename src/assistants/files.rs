use std::{io, path::Path};

use crate::{
    client::{Deleted, OpenAiClient},
    ApiResponseOrError,
};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct File {
    pub id: String,
    pub object: String,
    pub created_at: u64,
    pub bytes: u64,
    pub filename: String,
    pub purpose: FilePurpose,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FilePurpose {
    Assistants,
    AssistantsOutput,
    Batch,
    BatchOutput,
    FineTune,
    FineTuneResults,
    Vision,
}

/// A local file read into memory, ready to be uploaded.
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    pub async fn read(path: &Path) -> io::Result<LocalFile> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} has no usable file name", path.display()),
                )
            })?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Ok(LocalFile { name, bytes })
    }
}

impl OpenAiClient {
    pub async fn upload_file(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        purpose: FilePurpose,
    ) -> ApiResponseOrError<File> {
        let file_part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("application/octet-stream")?;

        let form = Form::new()
            .part("file", file_part)
            .text("purpose", purpose.to_string());

        self.post_multipart("files", form).await
    }

    pub async fn upload_local_file(
        &self,
        file: LocalFile,
        purpose: FilePurpose,
    ) -> ApiResponseOrError<File> {
        self.upload_file(&file.name, file.bytes, purpose).await
    }

    pub async fn get_file(&self, file_id: &str) -> ApiResponseOrError<File> {
        self.get(format!("files/{file_id}")).await
    }

    pub async fn delete_file(&self, file_id: &str) -> ApiResponseOrError<Deleted> {
        self.delete(format!("files/{file_id}")).await
    }
}

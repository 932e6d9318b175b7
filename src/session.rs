//! One conversation with one assistant over one vector store.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use thiserror::Error;

use crate::{
    assistants::{
        files::{FilePurpose, LocalFile},
        messages::{Annotation, CreateMessageRequest, Message, Role},
        runs::{CreateRunBuilder, LastError, Run, Status},
        threads::{CreateThreadRequest, Thread},
        vector_stores::CreateVectorStoreRequest,
        Assistant, CreateAssistantBuilder, Tool, ToolResources, UpdateAssistantBuilder,
    },
    client::OpenAiClient,
    config::Settings,
    metadata::{FileMetadataStore, FileRecord, MetadataError},
    target, OpenAiError,
};

/// How often an uploaded file batch is re-checked while it is indexed.
const FILE_BATCH_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("api error: {0}")]
    Api(#[from] OpenAiError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error("run {run_id} ended with status {status}{}", describe_last_error(.last_error))]
    RunFailed {
        run_id: String,
        status: Status,
        last_error: Option<LastError>,
    },
    #[error("no {0} available; create or configure one first")]
    MissingResource(&'static str),
    #[error("failed to build request: {0}")]
    Request(String),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The newest assistant reply with citation markers rewritten to ` [n]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedMessage {
    pub text: String,
    /// `[n] <file name>` for every file citation, in annotation order.
    pub citations: Vec<String>,
}

#[derive(Debug)]
pub struct AssistantSession {
    client: OpenAiClient,
    model: String,
    assistant: Option<Assistant>,
    thread: Option<Thread>,
    vector_store_id: Option<String>,
    run: Option<Run>,
    metadata: FileMetadataStore,
    poll_interval: Duration,
}

impl AssistantSession {
    /// A session with nothing created yet.
    pub fn new(client: OpenAiClient, model: impl Into<String>, metadata: FileMetadataStore) -> Self {
        AssistantSession {
            client,
            model: model.into(),
            assistant: None,
            thread: None,
            vector_store_id: None,
            run: None,
            metadata,
            poll_interval: crate::config::DEFAULT_POLL_INTERVAL,
        }
    }

    /// Builds a session and fetches every remote object whose ID is configured.
    pub async fn connect(client: OpenAiClient, settings: &Settings) -> Result<Self, SessionError> {
        let metadata = FileMetadataStore::load(&settings.metadata_file);
        let mut session = AssistantSession::new(client, settings.model.clone(), metadata)
            .with_poll_interval(settings.poll_interval);

        if let Some(assistant_id) = &settings.assistant_id {
            session.assistant = Some(session.client.get_assistant(assistant_id).await?);
            log::info!(target: target::ASSISTANT, "Found existing assistant with ID: {assistant_id}");
        }
        if let Some(thread_id) = &settings.thread_id {
            session.thread = Some(session.client.get_thread(thread_id).await?);
            log::info!(target: target::THREAD, "Found existing thread with ID: {thread_id}");
        }
        if let Some(vector_store_id) = &settings.vector_store_id {
            let vector_store = session.client.get_vector_store(vector_store_id).await?;
            session.vector_store_id = Some(vector_store.id);
            log::info!(target: target::FILE, "Found existing vector store with ID: {vector_store_id}");
        }

        Ok(session)
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn assistant(&self) -> Option<&Assistant> {
        self.assistant.as_ref()
    }

    pub fn thread(&self) -> Option<&Thread> {
        self.thread.as_ref()
    }

    pub fn vector_store_id(&self) -> Option<&str> {
        self.vector_store_id.as_deref()
    }

    pub fn run(&self) -> Option<&Run> {
        self.run.as_ref()
    }

    pub fn metadata(&self) -> &FileMetadataStore {
        &self.metadata
    }

    fn assistant_id(&self) -> Result<&str, SessionError> {
        self.assistant
            .as_ref()
            .map(|assistant| assistant.id.as_str())
            .ok_or(SessionError::MissingResource("assistant"))
    }

    fn thread_id(&self) -> Result<&str, SessionError> {
        self.thread
            .as_ref()
            .map(|thread| thread.id.as_str())
            .ok_or(SessionError::MissingResource("thread"))
    }

    fn require_vector_store(&self) -> Result<&str, SessionError> {
        self.vector_store_id
            .as_deref()
            .ok_or(SessionError::MissingResource("vector store"))
    }

    /// Creates the assistant unless one is already loaded.
    pub async fn create_assistant(
        &mut self,
        name: &str,
        instructions: &str,
        tools: Vec<Tool>,
    ) -> Result<&Assistant, SessionError> {
        if self.assistant.is_none() {
            log::info!(target: target::ASSISTANT, "Creating assistant...");
            let request = CreateAssistantBuilder::default()
                .model(self.model.as_str())
                .name(name)
                .instructions(instructions)
                .tools(tools)
                .build()
                .map_err(|e| SessionError::Request(e.to_string()))?;
            let assistant = self.client.create_assistant(request).await?;
            log::info!(target: target::ASSISTANT, "Created new Assistant with ID: {}", assistant.id);
            self.assistant = Some(assistant);
        }
        self.assistant
            .as_ref()
            .ok_or(SessionError::MissingResource("assistant"))
    }

    /// Creates the vector store unless one is already loaded.
    pub async fn create_vector_store(&mut self, name: &str) -> Result<&str, SessionError> {
        if self.vector_store_id.is_none() {
            log::info!(target: target::FILE, "Creating vector store...");
            let vector_store = self
                .client
                .create_vector_store(CreateVectorStoreRequest {
                    name: name.to_string(),
                    ..Default::default()
                })
                .await?;
            log::info!(target: target::FILE, "Created new Vector Store with ID: {}", vector_store.id);
            self.vector_store_id = Some(vector_store.id);
        }
        self.require_vector_store()
    }

    /// Uploads the files, indexes them into the vector store as one batch and
    /// records each `(path, file id)` pair in the metadata store.
    pub async fn upload_files_to_vector_store(
        &mut self,
        file_paths: &[PathBuf],
    ) -> Result<Vec<FileRecord>, SessionError> {
        let vector_store_id = self.require_vector_store()?.to_string();
        if file_paths.is_empty() {
            return Ok(Vec::new());
        }

        let mut local_files = Vec::with_capacity(file_paths.len());
        for path in file_paths {
            let file = LocalFile::read(path).await.map_err(|source| SessionError::Io {
                path: path.clone(),
                source,
            })?;
            local_files.push((path, file));
        }

        log::info!(target: target::FILE, "Uploading files to vector store...");
        let mut records = Vec::with_capacity(local_files.len());
        for (path, file) in local_files {
            match self.client.upload_local_file(file, FilePurpose::Assistants).await {
                Ok(file) => records.push(FileRecord {
                    file_path: path.display().to_string(),
                    file_id: file.id,
                }),
                Err(error) => {
                    self.delete_uploaded(&records).await;
                    return Err(error.into());
                }
            }
        }

        let file_ids: Vec<String> = records.iter().map(|r| r.file_id.clone()).collect();
        let batch = match self.client.create_file_batch(&vector_store_id, &file_ids).await {
            Ok(batch) => batch,
            Err(error) => {
                self.delete_uploaded(&records).await;
                return Err(error.into());
            }
        };
        let batch = self
            .client
            .poll_file_batch(batch, FILE_BATCH_POLL_INTERVAL)
            .await?;
        log::info!(target: target::FILE, "File batch status: {}", batch.status);
        log::info!(target: target::FILE, "File batch counts: {}", batch.file_counts);

        self.metadata.append(&vector_store_id, records.clone())?;
        Ok(records)
    }

    /// Removes files whose upload was not followed through.
    async fn delete_uploaded(&self, records: &[FileRecord]) {
        for record in records {
            if let Err(error) = self.client.delete_file(&record.file_id).await {
                log::error!(target: target::FILE, "Failed to delete uploaded file {}: {error}", record.file_id);
            }
        }
    }

    /// IDs of every file currently in the vector store.
    pub async fn file_ids_in_vector_store(&self) -> Result<Vec<String>, SessionError> {
        let vector_store_id = self.require_vector_store()?;
        log::info!(target: target::FILE, "Retrieving files from vector store...");
        let files = self.client.list_vector_store_files(vector_store_id).await?;
        let file_ids: Vec<String> = files.into_iter().map(|file| file.id).collect();
        log::info!(target: target::FILE, "Retrieved {} file IDs from the vector store.", file_ids.len());
        Ok(file_ids)
    }

    pub async fn vector_store_has_files(&self) -> Result<bool, SessionError> {
        Ok(!self.file_ids_in_vector_store().await?.is_empty())
    }

    /// Points the assistant's file_search tool at the session's vector store.
    pub async fn attach_vector_store(&mut self) -> Result<(), SessionError> {
        let vector_store_id = self.require_vector_store()?.to_string();
        let assistant_id = self.assistant_id()?.to_string();

        log::info!(target: target::FILE, "Updating assistant with vector store...");
        let request = UpdateAssistantBuilder::default()
            .tool_resources(ToolResources::vector_store(vector_store_id))
            .build()
            .map_err(|e| SessionError::Request(e.to_string()))?;
        let assistant = self.client.update_assistant(&assistant_id, request).await?;
        self.assistant = Some(assistant);
        log::info!(target: target::FILE, "Assistant updated with vector store.");
        Ok(())
    }

    /// Removes every recorded file of the vector store and resets the
    /// metadata document. Returns the paths whose removal succeeded.
    ///
    /// A file that fails to be removed is logged and skipped; its record is
    /// dropped with the rest.
    pub async fn clear_vector_store(&mut self) -> Result<Vec<String>, SessionError> {
        let vector_store_id = self.require_vector_store()?.to_string();
        let records = self.metadata.records(&vector_store_id).to_vec();

        let mut deleted = Vec::new();
        for record in records {
            let file_name = file_name(&record.file_path);
            match self
                .client
                .delete_vector_store_file(&vector_store_id, &record.file_id)
                .await
            {
                Ok(_) => {
                    log::info!(target: target::FILE, "Deleted '{file_name}' from vector store.");
                    deleted.push(record.file_path);
                }
                Err(error) => {
                    log::error!(target: target::FILE, "Failed to delete '{file_name}' from vector store: {error}");
                }
            }
        }

        self.metadata.clear()?;
        log::info!(target: target::FILE, "Cleared all metadata from the file.");
        Ok(deleted)
    }

    /// Creates the thread unless one is already loaded.
    pub async fn create_thread(&mut self) -> Result<&Thread, SessionError> {
        if self.thread.is_none() {
            log::info!(target: target::THREAD, "Creating thread...");
            let thread = self
                .client
                .create_thread(CreateThreadRequest::default())
                .await?;
            log::info!(target: target::THREAD, "Created new Thread with ID: {}", thread.id);
            self.thread = Some(thread);
        }
        self.thread
            .as_ref()
            .ok_or(SessionError::MissingResource("thread"))
    }

    /// Posts a user message to the thread.
    pub async fn add_message(&self, content: &str) -> Result<Message, SessionError> {
        let thread_id = self.thread_id()?;
        log::info!(target: target::THREAD, "Adding message to Thread...");
        let message = self
            .client
            .create_message(
                thread_id,
                CreateMessageRequest {
                    role: Role::User,
                    content: content.to_string(),
                },
            )
            .await?;
        log::info!(target: target::THREAD, "Message added.");
        Ok(message)
    }

    /// Starts a run of the assistant on the thread and remembers it as the
    /// current run. Does not wait for it.
    pub async fn run_assistant(&mut self, instructions: Option<&str>) -> Result<&Run, SessionError> {
        let assistant_id = self.assistant_id()?.to_string();
        let thread_id = self.thread_id()?.to_string();

        let mut request = CreateRunBuilder::default().assistant_id(assistant_id);
        if let Some(instructions) = instructions {
            request = request.instructions(instructions);
        }
        let request = request
            .build()
            .map_err(|e| SessionError::Request(e.to_string()))?;

        let run = self.client.create_run(&thread_id, request).await?;
        log::info!(target: target::RUN, "Started run {} with status {}", run.id, run.status);
        let run = self.run.insert(run);
        Ok(&*run)
    }

    /// Messages of the thread written by the assistant, newest first.
    pub async fn assistant_messages(&self) -> Result<Vec<Message>, SessionError> {
        let thread_id = self.thread_id()?;
        let messages: Vec<Message> = self
            .client
            .list_messages(thread_id)
            .await?
            .into_iter()
            .filter(|message| message.role == Role::Assistant)
            .collect();
        log::info!(target: target::RUN, "Retrieved {} messages from the Assistant.", messages.len());
        Ok(messages)
    }

    /// Rewrites annotation markers to footnote numbers and resolves the file
    /// names of cited files.
    pub async fn format_message(&self, message: &Message) -> Result<FormattedMessage, SessionError> {
        let Some(text) = message.text() else {
            return Ok(FormattedMessage {
                text: String::new(),
                citations: Vec::new(),
            });
        };

        let mut citations = Vec::new();
        for (index, annotation) in text.annotations.iter().enumerate() {
            if let Annotation::FileCitation { file_citation, .. } = annotation {
                let cited_file = self.client.get_file(&file_citation.file_id).await?;
                citations.push(format!("[{}] {}", index + 1, cited_file.filename));
            }
        }

        log::info!(target: target::RUN, "Message successfully formatted");
        Ok(FormattedMessage {
            text: replace_annotations(&text.value, &text.annotations),
            citations,
        })
    }

    /// Polls the current run every poll interval until it stops.
    ///
    /// A completed run yields the newest message of the thread, formatted.
    /// Any other terminal status becomes [`SessionError::RunFailed`].
    pub async fn wait_for_run_completion(&mut self) -> Result<FormattedMessage, SessionError> {
        let run = self.run.as_ref().ok_or(SessionError::MissingResource("run"))?;
        let run = self.client.poll_run(run, self.poll_interval).await?;
        let run = self.run.insert(run);

        if !run.status.is_completed() {
            log::error!(target: target::RUN, "Run {} ended with status {}", run.id, run.status);
            return Err(SessionError::RunFailed {
                run_id: run.id.clone(),
                status: run.status,
                last_error: run.last_error.clone(),
            });
        }

        if let Some(elapsed) = run.elapsed() {
            log::info!(target: target::RUN, "Run completed in {}", format_elapsed(elapsed));
        }

        let thread_id = run.thread_id.clone();
        let messages = self.client.list_messages(&thread_id).await?;
        match messages.first() {
            Some(last_message) => self.format_message(last_message).await,
            None => Ok(FormattedMessage {
                text: String::new(),
                citations: Vec::new(),
            }),
        }
    }
}

fn describe_last_error(last_error: &Option<LastError>) -> String {
    last_error
        .as_ref()
        .map(|error| format!(" ({error})"))
        .unwrap_or_default()
}

/// Replaces each annotation's marker with ` [n]`, `n` counting from 1.
fn replace_annotations(value: &str, annotations: &[Annotation]) -> String {
    annotations
        .iter()
        .enumerate()
        .fold(value.to_string(), |text, (index, annotation)| {
            if annotation.text().is_empty() {
                text
            } else {
                text.replace(annotation.text(), &format!(" [{}]", index + 1))
            }
        })
}

/// `HH:MM:SS`, hours wrapping at a day.
fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs() % 86_400;
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn file_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
}

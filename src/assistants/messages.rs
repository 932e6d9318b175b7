use crate::{
    client::{OpenAiClient, Order},
    ApiResponseOrError,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Message {
    pub id: String,
    pub object: String,
    pub created_at: u64,
    /// The thread ID that this message belongs to.
    pub thread_id: String,
    /// The entity that produced the message. One of user or assistant
    pub role: Role,
    /// The content of the message.
    pub content: Vec<Content>,
    /// The assistant that produced the message.
    pub assistant_id: Option<String>,
    /// The ID of the run associated with the creation of this message. Value is null when messages are created manually using the create message or create thread endpoints.
    pub run_id: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
}

impl Message {
    /// The first text block of the message, if any.
    pub fn text(&self) -> Option<&Text> {
        self.content.iter().find_map(|content| match content {
            Content::Text { text } => Some(text),
            _ => None,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
pub enum Content {
    Text { text: Text },
    ImageFile { image_file: ImageFile },
    ImageUrl { image_url: ImageUrl },
    Refusal { refusal: String },
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Text {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
pub enum Annotation {
    FileCitation {
        text: String,
        file_citation: FileCitation,
        start_index: u32,
        end_index: u32,
    },
    FilePath {
        text: String,
        file_path: FilePath,
        start_index: u32,
        end_index: u32,
    },
}

impl Annotation {
    /// The span of message text the annotation replaces.
    pub fn text(&self) -> &str {
        match self {
            Annotation::FileCitation { text, .. } | Annotation::FilePath { text, .. } => text,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FileCitation {
    pub file_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FilePath {
    pub file_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImageFile {
    pub file_id: String,
    pub detail: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImageUrl {
    pub url: String,
    pub detail: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct CreateMessageRequest {
    pub role: Role,
    pub content: String,
}

impl OpenAiClient {
    pub async fn create_message(
        &self,
        thread_id: &str,
        request: CreateMessageRequest,
    ) -> ApiResponseOrError<Message> {
        self.post(format!("threads/{thread_id}/messages"), request)
            .await
    }

    /// Lists every message of a thread, newest first.
    pub async fn list_messages(&self, thread_id: &str) -> ApiResponseOrError<Vec<Message>> {
        self.list(format!("threads/{thread_id}/messages"), Order::Desc, None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_text_with_citation() {
        let message: Message = serde_json::from_value(json!({
            "id": "msg_1",
            "object": "thread.message",
            "created_at": 1700000000,
            "thread_id": "thread_1",
            "role": "assistant",
            "content": [{
                "type": "text",
                "text": {
                    "value": "Rust is safe【4:0†source】.",
                    "annotations": [{
                        "type": "file_citation",
                        "text": "【4:0†source】",
                        "file_citation": { "file_id": "file-abc" },
                        "start_index": 12,
                        "end_index": 24
                    }]
                }
            }],
            "assistant_id": "asst_1",
            "run_id": "run_1",
            "metadata": {}
        }))
        .unwrap();

        assert_eq!(message.role, Role::Assistant);
        let text = message.text().unwrap();
        assert_eq!(text.annotations.len(), 1);
        assert_eq!(text.annotations[0].text(), "【4:0†source】");
    }

    #[test]
    fn text_is_none_without_text_block() {
        let message: Message = serde_json::from_value(json!({
            "id": "msg_2",
            "object": "thread.message",
            "created_at": 1700000000,
            "thread_id": "thread_1",
            "role": "assistant",
            "content": [{ "type": "refusal", "refusal": "no" }],
            "assistant_id": null,
            "run_id": null,
            "metadata": null
        }))
        .unwrap();

        assert!(message.text().is_none());
    }
}

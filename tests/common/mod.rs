#![allow(dead_code)]

use std::{path::PathBuf, time::Duration};

use assistant_chat::{Credentials, OpenAiClient, Settings};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const POLL: Duration = Duration::from_millis(10);

pub fn client(server: &MockServer) -> OpenAiClient {
    OpenAiClient::new(Credentials::new("sk-test", format!("{}/v1", server.uri()))).unwrap()
}

pub fn settings(server: &MockServer, metadata_file: PathBuf) -> Settings {
    Settings {
        credentials: Credentials::new("sk-test", format!("{}/v1", server.uri())),
        model: "gpt-4o-mini".to_string(),
        assistant_id: Some("asst_1".to_string()),
        thread_id: Some("thread_1".to_string()),
        vector_store_id: Some("vs_1".to_string()),
        metadata_file,
        poll_interval: POLL,
        log_dir: PathBuf::from("logs"),
    }
}

pub fn assistant() -> Value {
    json!({
        "id": "asst_1",
        "object": "assistant",
        "created_at": 1700000000,
        "name": "Docs",
        "model": "gpt-4o-mini",
        "instructions": "Answer from the documents.",
        "tools": [{ "type": "file_search" }],
        "tool_resources": { "file_search": { "vector_store_ids": [] } },
        "metadata": {}
    })
}

pub fn thread() -> Value {
    json!({
        "id": "thread_1",
        "object": "thread",
        "created_at": 1700000000,
        "tool_resources": {},
        "metadata": {}
    })
}

pub fn vector_store() -> Value {
    json!({
        "id": "vs_1",
        "object": "vector_store",
        "created_at": 1700000000,
        "name": "Documents",
        "usage_bytes": 0,
        "file_counts": { "in_progress": 0, "completed": 0, "failed": 0, "cancelled": 0, "total": 0 },
        "status": "completed",
        "expires_after": null,
        "expires_at": null,
        "last_active_at": 1700000000,
        "metadata": {}
    })
}

pub fn run(status: &str) -> Value {
    let completed_at = if status == "completed" { json!(1700000075) } else { Value::Null };
    json!({
        "id": "run_1",
        "object": "thread.run",
        "created_at": 1700000000,
        "assistant_id": "asst_1",
        "thread_id": "thread_1",
        "status": status,
        "last_error": null,
        "completed_at": completed_at,
        "model": "gpt-4o-mini",
        "instructions": "",
        "tools": []
    })
}

pub fn assistant_message(id: &str, value: &str, annotations: Value) -> Value {
    json!({
        "id": id,
        "object": "thread.message",
        "created_at": 1700000010,
        "thread_id": "thread_1",
        "role": "assistant",
        "content": [{ "type": "text", "text": { "value": value, "annotations": annotations } }],
        "assistant_id": "asst_1",
        "run_id": "run_1",
        "metadata": {}
    })
}

pub fn user_message(id: &str, value: &str) -> Value {
    json!({
        "id": id,
        "object": "thread.message",
        "created_at": 1700000000,
        "thread_id": "thread_1",
        "role": "user",
        "content": [{ "type": "text", "text": { "value": value, "annotations": [] } }],
        "assistant_id": null,
        "run_id": null,
        "metadata": {}
    })
}

pub fn page(data: Vec<Value>, has_more: bool) -> Value {
    let first_id = data.first().map(|item| item["id"].clone()).unwrap_or(Value::Null);
    let last_id = data.last().map(|item| item["id"].clone()).unwrap_or(Value::Null);
    json!({
        "object": "list",
        "data": data,
        "first_id": first_id,
        "last_id": last_id,
        "has_more": has_more
    })
}

pub fn file(id: &str, filename: &str) -> Value {
    json!({
        "id": id,
        "object": "file",
        "created_at": 1700000000,
        "bytes": 5,
        "filename": filename,
        "purpose": "assistants"
    })
}

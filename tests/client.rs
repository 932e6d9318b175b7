mod common;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn get_assistant_sends_auth_and_beta_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/assistants/asst_1"))
        .and(header("authorization", "Bearer sk-test"))
        .and(header("openai-beta", "assistants=v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::assistant()))
        .expect(1)
        .mount(&server)
        .await;

    let assistant = common::client(&server).get_assistant("asst_1").await.unwrap();

    assert_eq!(assistant.id, "asst_1");
    assert_eq!(assistant.name.as_deref(), Some("Docs"));
    assert_eq!(assistant.tools.len(), 1);
}

#[tokio::test]
async fn error_envelope_becomes_openai_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "message": "No thread found with id 'thread_missing'.",
                "type": "invalid_request_error",
                "param": null,
                "code": null
            }
        })))
        .mount(&server)
        .await;

    let error = common::client(&server)
        .get_thread("thread_missing")
        .await
        .unwrap_err();

    assert_eq!(error.error_type, "invalid_request_error");
    assert_eq!(error.message, "No thread found with id 'thread_missing'.");
}

#[tokio::test]
async fn unparseable_error_body_is_kept_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/files/file-1"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let error = common::client(&server).get_file("file-1").await.unwrap_err();

    assert_eq!(error.error_type, "unknown");
    assert_eq!(error.message, "Bad Gateway");
}

#[tokio::test]
async fn list_messages_follows_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_1/messages"))
        .and(query_param("order", "desc"))
        .and(query_param_is_missing("after"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::page(
            vec![
                common::assistant_message("msg_3", "third", json!([])),
                common::user_message("msg_2", "second"),
            ],
            true,
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_1/messages"))
        .and(query_param("order", "desc"))
        .and(query_param("after", "msg_2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::page(
            vec![common::user_message("msg_1", "first")],
            false,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let messages = common::client(&server).list_messages("thread_1").await.unwrap();

    let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["msg_3", "msg_2", "msg_1"]);
}


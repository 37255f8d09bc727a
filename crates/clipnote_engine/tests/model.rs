use clipnote_core::Settings;
use clipnote_engine::{ChatModelClient, OrchestrationError, Summarizer};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings_for(server: &MockServer) -> Settings {
    Settings {
        model_url: server.uri(),
        api_key: "secret".to_string(),
        model_name: "gpt-4o-mini".to_string(),
        temperature: 0.5,
        ..Settings::default()
    }
}

#[tokio::test]
async fn summarize_posts_prompt_and_returns_trimmed_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer secret"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "messages": [{ "role": "user", "content": "summarize: body" }],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "  the summary  " } }]
        })))
        .mount(&server)
        .await;

    let client = ChatModelClient::new();
    let summary = client
        .summarize("summarize: body", &settings_for(&server))
        .await
        .expect("summarize ok");
    assert_eq!(summary, "the summary");
}

#[tokio::test]
async fn summarize_surfaces_endpoint_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "bad api key" }
        })))
        .mount(&server)
        .await;

    let client = ChatModelClient::new();
    let err = client
        .summarize("p", &settings_for(&server))
        .await
        .unwrap_err();
    match err {
        OrchestrationError::Transport { status, detail } => {
            assert_eq!(status, Some(401));
            assert!(detail.contains("bad api key"), "{detail}");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn summarize_rejects_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = ChatModelClient::new();
    let err = client
        .summarize("p", &settings_for(&server))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestrationError::ResponseFormat { .. }), "{err:?}");
}

#[tokio::test]
async fn summarize_honors_preconfigured_completions_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/custom/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "ok" } }]
        })))
        .mount(&server)
        .await;

    let mut settings = settings_for(&server);
    settings.model_url = format!("{}/custom/chat/completions", server.uri());

    let client = ChatModelClient::new();
    assert_eq!(client.summarize("p", &settings).await.unwrap(), "ok");
}

#[tokio::test]
async fn summarize_fails_on_invalid_endpoint() {
    let mut settings = Settings::default();
    settings.model_url = "not a url".to_string();

    let client = ChatModelClient::new();
    let err = client.summarize("p", &settings).await.unwrap_err();
    assert!(matches!(err, OrchestrationError::Configuration { .. }), "{err:?}");
}

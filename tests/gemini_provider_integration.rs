use cemtras::attachments::FileAttachment;
use cemtras::config::ProviderConfig;
use cemtras::error::ProviderError;
use cemtras::providers::{GeminiClient, ModelClient};
use cemtras::roles::Role;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

fn client_for(server: &MockServer) -> GeminiClient {
    let config = ProviderConfig {
        api_base: server.uri(),
        timeout_seconds: 5,
        ..ProviderConfig::default()
    };
    GeminiClient::new(&config, "test-key").expect("build client")
}

fn text_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

async fn mount(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_generate_sends_persona_prompt_and_inline_files() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("**Check** the cooler")))
        .expect(1)
        .mount(&server)
        .await;

    let files = vec![
        FileAttachment::from_bytes("kiln.jpg", "image/jpeg", b"jpeg-bytes"),
        FileAttachment::from_bytes("log.txt", "text/plain", b"shift log"),
        FileAttachment::from_bytes("report.pdf", "application/pdf", b"%PDF"),
    ];

    let reply = client_for(&server)
        .generate("Clinker is dusty, why?", Role::Operations, &files)
        .await
        .unwrap();
    assert_eq!(reply, "Check the cooler");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();

    assert_eq!(
        body["systemInstruction"]["parts"][0]["text"],
        Role::Operations.system_instruction()
    );
    let parts = body["contents"][0]["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0]["text"], "Clinker is dusty, why?");
    assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
    assert_eq!(parts[1]["inlineData"]["data"], files[0].content);
    assert_eq!(parts[2]["inlineData"]["mimeType"], "application/pdf");
    assert_eq!(body["generationConfig"]["topK"], 40);
}

#[tokio::test]
async fn test_rate_limit_is_classified() {
    let server = MockServer::start().await;
    mount(
        &server,
        ResponseTemplate::new(429).set_body_json(json!({
            "error": { "code": 429, "status": "RESOURCE_EXHAUSTED", "message": "Quota exceeded" }
        })),
    )
    .await;

    let err = client_for(&server)
        .generate("hi", Role::GeneralAi, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::RateLimited(_)));
    assert!(err.user_message().contains("quota"));
}

#[tokio::test]
async fn test_invalid_key_is_classified() {
    let server = MockServer::start().await;
    mount(
        &server,
        ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "status": "INVALID_ARGUMENT",
                "message": "API key not valid. Please pass a valid API key.",
                "details": [{ "reason": "API_KEY_INVALID" }]
            }
        })),
    )
    .await;

    let err = client_for(&server)
        .generate("hi", Role::GeneralAi, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Configuration(_)));
}

#[tokio::test]
async fn test_blocked_prompt_is_classified() {
    let server = MockServer::start().await;
    mount(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })),
    )
    .await;

    let err = client_for(&server)
        .generate("hi", Role::GeneralAi, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::ContentBlocked(_)));
}

#[tokio::test]
async fn test_empty_candidates_is_empty_response() {
    let server = MockServer::start().await;
    mount(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })),
    )
    .await;

    let err = client_for(&server)
        .generate("hi", Role::GeneralAi, &[])
        .await
        .unwrap_err();
    assert_eq!(err, ProviderError::EmptyResponse);
}

#[tokio::test]
async fn test_server_error_is_technical() {
    let server = MockServer::start().await;
    mount(&server, ResponseTemplate::new(500).set_body_string("backend exploded")).await;

    let err = client_for(&server)
        .generate("hi", Role::GeneralAi, &[])
        .await
        .unwrap_err();
    match err {
        ProviderError::Technical(detail) => assert!(detail.contains("backend exploded")),
        other => panic!("expected technical error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_technical() {
    let server = MockServer::start().await;
    mount(&server, ResponseTemplate::new(200).set_body_string("not json")).await;

    let err = client_for(&server)
        .generate("hi", Role::GeneralAi, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Technical(_)));
}

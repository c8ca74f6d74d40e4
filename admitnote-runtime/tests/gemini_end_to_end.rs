use std::sync::{Arc, Mutex};

use admitnote_core::types::{ClinicalData, Language, StatusKind};
use admitnote_engine::error::ParseError;
use admitnote_engine::orchestrator::ParseInput;
use admitnote_engine::traits::{AlwaysOnline, NoopObserver, ParseObserver};
use admitnote_providers::image::encode_inline_image;
use admitnote_runtime::config_store::ConfigStore;
use admitnote_runtime::runtime_engine::AdmitNoteService;
use admitnote_runtime::secrets::StaticApiKey;
use admitnote_runtime::transport::GeminiTransport;
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

#[derive(Default)]
struct Recorder {
    statuses: Mutex<Vec<(String, StatusKind)>>,
    errors: Mutex<Vec<String>>,
}

impl ParseObserver for Recorder {
    fn on_status(&self, message: &str, kind: StatusKind) {
        self.statuses.lock().unwrap().push((message.to_string(), kind));
    }

    fn on_error(&self, _error: &ParseError, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

fn success_body(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }], "role": "model" },
            "finishReason": "STOP"
        }]
    })
}

fn service(server: &MockServer, dir: &tempfile::TempDir) -> AdmitNoteService {
    let store = ConfigStore::at_path(dir.path().join("config.json"));
    store
        .update(|c| {
            c.base_url = format!("{}/v1beta", server.uri());
            c.retry.initial_delay_ms = 10;
            c.retry.max_delay_ms = 50;
            c.retry.jitter_ms = 0;
        })
        .unwrap();

    AdmitNoteService::new(
        store,
        Arc::new(StaticApiKey(Some("AIza-test".into()))),
        Arc::new(GeminiTransport::new()),
        Arc::new(AlwaysOnline),
    )
}

async fn request_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

#[tokio::test]
async fn plain_reply_succeeds_on_first_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(success_body(r#"{"chief_complaint":"fever and cough"}"#)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let svc = service(&server, &dir);
    let recorder = Recorder::default();

    let data = svc
        .parse(&ParseInput::text("Patient has fever and cough"), &recorder)
        .await
        .unwrap();

    assert_eq!(data.get_str("chief_complaint"), Some("fever and cough"));
    let statuses = recorder.statuses.lock().unwrap();
    assert_eq!(
        statuses.iter().filter(|(_, k)| *k == StatusKind::Success).count(),
        1
    );
    assert!(recorder.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn fenced_reply_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "AIza-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body(
            "```json\n{\"chiefComplaint\": \"chest pain\", \"age\": 64}\n```",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let svc = service(&server, &dir);
    let recorder = Recorder::default();

    let data: ClinicalData = svc
        .parse(&ParseInput::text("64M chest pain x2h"), &recorder)
        .await
        .unwrap();

    assert_eq!(data.get_str("chiefComplaint"), Some("chest pain"));
    assert_eq!(data.get("age"), Some(&json!(64)));
    assert_eq!(recorder.statuses.lock().unwrap().last().unwrap().1, StatusKind::Success);

    let bodies = request_bodies(&server).await;
    let instruction = bodies[0]["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(instruction.contains("64M chest pain x2h"));
    assert_eq!(bodies[0]["generationConfig"]["maxOutputTokens"], json!(8192));
}

#[tokio::test]
async fn rate_limited_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED" }
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(success_body(r#"{"diagnosis": "CAP"}"#)),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let svc = service(&server, &dir);

    let data = svc.parse(&ParseInput::text("fever, cough"), &NoopObserver).await.unwrap();
    assert_eq!(data.get_str("diagnosis"), Some("CAP"));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn unauthorized_surfaces_localized_message_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "code": 401, "message": "API key not valid.", "status": "UNAUTHENTICATED" }
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let svc = service(&server, &dir);
    let recorder = Recorder::default();

    let err = svc.parse(&ParseInput::text("notes"), &recorder).await.unwrap_err();
    let parse_err = err.downcast_ref::<ParseError>().unwrap();
    assert_eq!(
        parse_err,
        &ParseError::service(401, Some("API key not valid.".into()))
    );
    assert_eq!(parse_err.user_message(Language::ChineseTw), "API 金鑰無效，請檢查設定");
    assert_eq!(
        recorder.errors.lock().unwrap().as_slice(),
        ["API 金鑰無效，請檢查設定".to_string()]
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn truncated_reply_is_repaired() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"meds\": [\"aspirin\", \"metf" }] },
                "finishReason": "MAX_TOKENS"
            }]
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let svc = service(&server, &dir);

    let data = svc.parse(&ParseInput::text("meds"), &NoopObserver).await.unwrap();
    assert_eq!(data.get("meds"), Some(&json!(["aspirin", null])));
}

#[tokio::test]
async fn image_is_sent_inline() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(success_body(r#"{"source": "image"}"#)),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let svc = service(&server, &dir);
    let input = ParseInput::text("").with_image(encode_inline_image(b"\x89PNG fake", "image/png"));

    svc.parse(&input, &NoopObserver).await.unwrap();

    let bodies = request_bodies(&server).await;
    let image = &bodies[0]["contents"][0]["parts"][1]["inlineData"];
    assert_eq!(image["mimeType"], json!("image/png"));
    assert!(image["data"].as_str().is_some_and(|d| !d.is_empty()));
}

#[tokio::test]
async fn model_change_applies_to_next_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body("{\"ok\": true}")))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let svc = service(&server, &dir);

    svc.parse(&ParseInput::text("first"), &NoopObserver).await.unwrap();
    svc.store().update(|c| c.model = "gemini-2.0-flash".into()).unwrap();
    svc.parse(&ParseInput::text("second"), &NoopObserver).await.unwrap();

    let paths: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(
        paths,
        vec![
            GENERATE_PATH.to_string(),
            "/v1beta/models/gemini-2.0-flash:generateContent".to_string(),
        ]
    );
}

#[tokio::test]
async fn missing_key_never_hits_the_network() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::at_path(dir.path().join("config.json"));
    let svc = AdmitNoteService::new(
        store,
        Arc::new(StaticApiKey(None)),
        Arc::new(GeminiTransport::new()),
        Arc::new(AlwaysOnline),
    );

    let err = svc.parse(&ParseInput::text("notes"), &NoopObserver).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ParseError>(),
        Some(ParseError::Validation(_))
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

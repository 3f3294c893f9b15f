#![cfg(test)]

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use mockall::mock;
use serde_json::{Value, json};
use tower::ServiceExt;

use grievance_triage::{
    base::{
        config::{Config, ConfigInner},
        types::{AudioAnalysis, Category, GeoPoint, ImageAnalysis, NewTicket, Res},
    },
    handler,
    runtime::Runtime,
    service::{
        classifier::{Classifier, GenericClassifier},
        db::TicketStore,
        storage::{GenericSigner, Signer},
        transcriber::{GenericTranscriber, Transcriber},
    },
};

// Mocks.

mock! {
    pub SignerImpl {}

    #[async_trait]
    impl GenericSigner for SignerImpl {
        fn bucket(&self) -> &str;
        async fn sign_put_url(&self, object: &str, expires_in: Duration) -> Res<String>;
        async fn sign_get_url(&self, object: &str, expires_in: Duration) -> Res<String>;
    }
}

mock! {
    pub ClassifierImpl {}

    #[async_trait]
    impl GenericClassifier for ClassifierImpl {
        async fn classify(&self, image_uri: &str) -> Res<ImageAnalysis>;
    }
}

mock! {
    pub TranscriberImpl {}

    #[async_trait]
    impl GenericTranscriber for TranscriberImpl {
        async fn transcribe(&self, audio_uri: &str) -> Res<AudioAnalysis>;
    }
}

fn happy_signer() -> MockSignerImpl {
    let mut mock = MockSignerImpl::new();

    mock.expect_bucket().return_const("test-bucket".to_string());
    mock.expect_sign_put_url().returning(|object, _| Ok(format!("https://storage.example/{object}?X-Goog-Signature=abc")));

    mock
}

fn happy_classifier() -> MockClassifierImpl {
    let mut mock = MockClassifierImpl::new();

    mock.expect_classify().returning(|_| {
        Ok(ImageAnalysis {
            category: Category::Pothole,
            description: "A deep pothole in the left lane.".to_string(),
        })
    });

    mock
}

fn happy_transcriber() -> MockTranscriberImpl {
    let mut mock = MockTranscriberImpl::new();

    mock.expect_transcribe().returning(|_| {
        Ok(AudioAnalysis {
            transcription: "the road has been broken for weeks".to_string(),
            language_code: "en-us".to_string(),
        })
    });

    mock
}

// Test environment.

fn test_config() -> Config {
    Config {
        inner: Arc::new(ConfigInner {
            openai_api_key: "test_key".to_string(),
            storage_bucket: "test-bucket".to_string(),
            signing_service_account: "signer@test.iam.gserviceaccount.com".to_string(),
            upload_prefix: "uploads".to_string(),
            signed_url_expiry_secs: 900,
            db_endpoint: "memory".to_string(),
            listing_limit: 20,
            ..Default::default()
        }),
    }
}

/// Build a runtime around mocked external services and an in-memory store.
async fn test_runtime(signer: MockSignerImpl, classifier: MockClassifierImpl, transcriber: MockTranscriberImpl) -> Runtime {
    let store = TicketStore::surreal_memory().await.expect("failed to create in-memory store");

    Runtime {
        config: test_config(),
        store,
        classifier: Classifier::new(Arc::new(classifier)),
        transcriber: Transcriber::new(Arc::new(transcriber)),
        signer: Signer::new(Arc::new(signer)),
    }
}

async fn test_app() -> (Router, Runtime) {
    let runtime = test_runtime(happy_signer(), happy_classifier(), happy_transcriber()).await;

    (handler::router(runtime.clone()), runtime)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn sample_grievance_body() -> Value {
    json!({
        "image_path": "gs://test-bucket/uploads/1700000000-pothole.jpg",
        "location": { "lat": 12.34, "lng": 56.78 },
        "text_description": "Huge pothole near the market."
    })
}

// Pre-flight and CORS.

#[tokio::test]
async fn preflight_returns_204_with_cors_headers() {
    let (app, _) = test_app().await;

    for uri in ["/getUploadURLs", "/processGrievance", "/getGrievances"] {
        let request = Request::builder().method("OPTIONS").uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, GET, OPTIONS");
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty(), "pre-flight response must have no body");
    }
}

#[tokio::test]
async fn regular_responses_carry_cors_headers() {
    let (app, _) = test_app().await;

    let response = app.oneshot(Request::builder().uri("/getGrievances").body(Body::empty()).unwrap()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

// Upload URLs.

#[tokio::test]
async fn upload_urls_returns_image_and_audio_targets() {
    let (app, _) = test_app().await;

    let body = json!({ "image_filename": "pothole.jpg", "audio_filename": "note.webm" });
    let response = app.oneshot(post_json("/getUploadURLs", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    let image_path = json["image_gs_path"].as_str().unwrap();
    assert!(image_path.starts_with("gs://test-bucket/uploads/"), "unexpected path: {image_path}");
    assert!(image_path.ends_with("-pothole.jpg"), "unexpected path: {image_path}");

    // The storage key carries a numeric epoch prefix between the namespace and the filename.
    let key = image_path.strip_prefix("gs://test-bucket/uploads/").unwrap();
    let (stamp, _) = key.split_once('-').unwrap();
    assert!(stamp.parse::<i64>().is_ok(), "prefix should be numeric: {stamp}");

    assert!(json["image_signed_url"].as_str().unwrap().starts_with("https://"));
    assert!(json["audio_signed_url"].is_string());
    assert!(json["audio_gs_path"].as_str().unwrap().ends_with("-note.webm"));
}

#[tokio::test]
async fn upload_urls_signs_with_configured_900_second_expiry() {
    let mut signer = MockSignerImpl::new();
    signer.expect_bucket().return_const("test-bucket".to_string());
    signer
        .expect_sign_put_url()
        .withf(|_, expires_in| *expires_in == Duration::from_secs(900))
        .times(2)
        .returning(|object, _| Ok(format!("https://storage.example/{object}?X-Goog-Signature=abc")));

    let runtime = test_runtime(signer, happy_classifier(), happy_transcriber()).await;
    let app = handler::router(runtime);

    let body = json!({ "image_filename": "pothole.jpg", "audio_filename": "note.webm" });
    let response = app.oneshot(post_json("/getUploadURLs", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn upload_urls_without_audio_returns_null_audio_fields() {
    let (app, _) = test_app().await;

    let response = app.oneshot(post_json("/getUploadURLs", json!({ "image_filename": "pothole.jpg" }))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert!(json["audio_signed_url"].is_null());
    assert!(json["audio_gs_path"].is_null());
}

#[tokio::test]
async fn upload_urls_missing_filename_fails_before_signing() {
    let mut signer = MockSignerImpl::new();
    signer.expect_bucket().return_const("test-bucket".to_string());
    signer.expect_sign_put_url().times(0);

    let runtime = test_runtime(signer, happy_classifier(), happy_transcriber()).await;
    let app = handler::router(runtime);

    let response = app.oneshot(post_json("/getUploadURLs", json!({ "audio_filename": "note.webm" }))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("image_filename"));
}

#[tokio::test]
async fn upload_urls_unparsable_payload_is_400() {
    let (app, _) = test_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/getUploadURLs")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_urls_signing_failure_is_500_with_message() {
    let mut signer = MockSignerImpl::new();
    signer.expect_bucket().return_const("test-bucket".to_string());
    signer.expect_sign_put_url().returning(|_, _| Err(anyhow::anyhow!("signBlob permission denied")));

    let runtime = test_runtime(signer, happy_classifier(), happy_transcriber()).await;
    let app = handler::router(runtime);

    let response = app.oneshot(post_json("/getUploadURLs", json!({ "image_filename": "pothole.jpg" }))).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("signBlob permission denied"));
}

// Grievance ingestion.

#[tokio::test]
async fn process_grievance_creates_ticket_with_enrichment() {
    let (app, runtime) = test_app().await;

    let body = json!({
        "image_path": "gs://test-bucket/uploads/1700000000-pothole.jpg",
        "audio_path": "gs://test-bucket/uploads/1700000000-note.webm",
        "location": { "lat": 12.97, "lng": 77.59 },
        "text_description": "Road is unusable."
    });

    let response = app.oneshot(post_json("/processGrievance", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["status"], "success");
    assert!(!json["ticket_id"].as_str().unwrap().is_empty());

    let ticket = &json["ticket_data"];
    assert_eq!(ticket["status"], "new");
    assert_eq!(ticket["image"]["category"], "Pothole");
    assert_eq!(ticket["image"]["ai_description"], "A deep pothole in the left lane.");
    assert_eq!(ticket["audio"]["transcription"], "the road has been broken for weeks");
    assert_eq!(ticket["audio"]["language"], "en-us");
    assert_eq!(ticket["text_description"], "Road is unusable.");

    // The ticket is persisted, not just echoed.
    let stored = runtime.store.list_recent(20).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, json["ticket_id"].as_str().unwrap());
}

#[tokio::test]
async fn process_grievance_missing_fields_fails_before_any_external_call() {
    let mut classifier = MockClassifierImpl::new();
    classifier.expect_classify().times(0);

    let mut transcriber = MockTranscriberImpl::new();
    transcriber.expect_transcribe().times(0);

    let mut signer = MockSignerImpl::new();
    signer.expect_bucket().return_const("test-bucket".to_string());
    signer.expect_sign_put_url().times(0);

    let runtime = test_runtime(signer, classifier, transcriber).await;
    let app = handler::router(runtime.clone());

    // Missing location.
    let no_location = json!({ "image_path": "gs://test-bucket/uploads/1-a.jpg" });
    let response = app.clone().oneshot(post_json("/processGrievance", no_location)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Missing image path.
    let no_image = json!({ "location": { "lat": 1.0, "lng": 2.0 } });
    let response = app.oneshot(post_json("/processGrievance", no_image)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing was persisted either.
    assert!(runtime.store.list_recent(20).await.unwrap().is_empty());
}

#[tokio::test]
async fn process_grievance_survives_classifier_failure() {
    let mut classifier = MockClassifierImpl::new();
    classifier.expect_classify().returning(|_| Err(anyhow::anyhow!("model unavailable")));

    let runtime = test_runtime(happy_signer(), classifier, happy_transcriber()).await;
    let app = handler::router(runtime.clone());

    let response = app.oneshot(post_json("/processGrievance", sample_grievance_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let stored = runtime.store.list_recent(20).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].image.category, Category::Other);
    assert_eq!(stored[0].image.ai_description, "AI analysis failed.");
}

#[tokio::test]
async fn process_grievance_without_audio_never_invokes_transcriber() {
    let mut transcriber = MockTranscriberImpl::new();
    transcriber.expect_transcribe().times(0);

    let runtime = test_runtime(happy_signer(), happy_classifier(), transcriber).await;
    let app = handler::router(runtime.clone());

    let response = app.oneshot(post_json("/processGrievance", sample_grievance_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let stored = runtime.store.list_recent(20).await.unwrap();
    assert_eq!(stored[0].audio.url, "");
    assert_eq!(stored[0].audio.transcription, "");
    assert_eq!(stored[0].audio.language, "");
}

#[tokio::test]
async fn process_grievance_transcriber_failure_embeds_the_error() {
    let mut transcriber = MockTranscriberImpl::new();
    transcriber.expect_transcribe().returning(|_| Err(anyhow::anyhow!("speech quota exceeded")));

    let runtime = test_runtime(happy_signer(), happy_classifier(), transcriber).await;
    let app = handler::router(runtime.clone());

    let mut body = sample_grievance_body();
    body["audio_path"] = json!("gs://test-bucket/uploads/1700000000-note.webm");

    let response = app.oneshot(post_json("/processGrievance", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let stored = runtime.store.list_recent(20).await.unwrap();
    assert_eq!(stored[0].audio.transcription, "Transcription failed: speech quota exceeded");
    assert_eq!(stored[0].audio.language, "");
}

// Listing.

#[tokio::test]
async fn listing_returns_20_newest_in_descending_order() {
    let (app, runtime) = test_app().await;

    let mut ids = Vec::new();
    for i in 0..25 {
        let ticket = NewTicket {
            location: GeoPoint { lat: 10.0, lng: 20.0 },
            image: grievance_triage::base::types::ImageReport {
                url: format!("gs://test-bucket/uploads/{i}-img.jpg"),
                category: Category::Other,
                ai_description: format!("ticket {i}"),
            },
            audio: Default::default(),
            text_description: String::new(),
        };
        ids.push(runtime.store.create_ticket(&ticket).await.unwrap().id);
    }

    let response = app.oneshot(Request::builder().uri("/getGrievances").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let tickets = json.as_array().unwrap();
    assert_eq!(tickets.len(), 20);

    // Exactly the last 20 created, newest first.
    let expected: Vec<&String> = ids.iter().rev().take(20).collect();
    for (ticket, expected_id) in tickets.iter().zip(expected) {
        assert_eq!(ticket["id"].as_str().unwrap(), expected_id);
    }

    // Timestamps are non-increasing.
    let stamps: Vec<chrono::DateTime<chrono::FixedOffset>> = tickets
        .iter()
        .map(|t| chrono::DateTime::parse_from_rfc3339(t["timestamp"].as_str().unwrap()).unwrap())
        .collect();
    assert!(stamps.windows(2).all(|pair| pair[0] >= pair[1]));
}

#[tokio::test]
async fn location_round_trips_through_ingestion_and_listing() {
    let (app, _) = test_app().await;

    let response = app.clone().oneshot(post_json("/processGrievance", sample_grievance_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.oneshot(Request::builder().uri("/getGrievances").body(Body::empty()).unwrap()).await.unwrap();
    let json = body_json(response).await;

    let location = &json.as_array().unwrap()[0]["location"];
    assert_eq!(location["lat"].as_f64().unwrap(), 12.34);
    assert_eq!(location["lng"].as_f64().unwrap(), 56.78);
}

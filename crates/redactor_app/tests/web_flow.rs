use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use redactor_app::app::App;
use redactor_app::routes::router;
use redactor_engine::{
    decode_text, JobStores, ObjectStore, OpendalStore, PollSettings,
};
use tower::ServiceExt;

const BOUNDARY: &str = "test-boundary-7349";

fn fast_settings() -> PollSettings {
    PollSettings {
        max_attempts: 100,
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(10),
    }
}

fn memory_app() -> (Router, Arc<dyn ObjectStore>, Arc<dyn ObjectStore>) {
    memory_app_with(fast_settings())
}

fn memory_app_with(settings: PollSettings) -> (Router, Arc<dyn ObjectStore>, Arc<dyn ObjectStore>) {
    let ingest: Arc<dyn ObjectStore> = Arc::new(OpendalStore::memory().expect("memory store"));
    let output: Arc<dyn ObjectStore> = Arc::new(OpendalStore::memory().expect("memory store"));
    let app = App::new(
        JobStores {
            ingest: ingest.clone(),
            output: output.clone(),
        },
        settings,
    );
    (router(app), ingest, output)
}

fn multipart_upload(file_name: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         {content}\r\n\
         --{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/files")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("HX-Request", "true")
        .body(Body::empty())
        .expect("request")
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// Poll `/view` until `needle` shows up, with a hard cap so a broken state
/// machine fails the test instead of hanging it.
async fn wait_for_view(router: &Router, needle: &str) -> String {
    for _ in 0..200 {
        let response = router.clone().oneshot(get("/view")).await.expect("request ok");
        let html = body_string(response).await;
        if html.contains(needle) {
            return html;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("view never showed {needle:?}");
}

fn extract_download_url(html: &str) -> String {
    let start = html.find("/download/").expect("download link");
    let rest = &html[start..];
    let end = rest.find('"').expect("closing quote");
    rest[..end].to_string()
}

#[tokio::test]
async fn full_redaction_round_trip() {
    let (router, ingest, output) = memory_app();

    // Selecting the file re-renders the idle fragment with the card.
    let response = router
        .clone()
        .oneshot(multipart_upload("report.txt", "Alice SSN 123-45-6789"))
        .await
        .expect("request ok");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("report.txt"));
    assert!(!html.contains("disabled"));

    // Submitting flips the view to processing.
    let response = router.clone().oneshot(post("/redact")).await.expect("request ok");
    let html = body_string(response).await;
    assert!(html.contains("view-processing"));

    // The original lands in the ingest bucket, byte for byte.
    for _ in 0..200 {
        if ingest.head("text/report.txt").await.expect("head ok") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let body = ingest.get("text/report.txt").await.expect("ingest object");
    assert_eq!(
        decode_text(body).await.expect("decode"),
        "Alice SSN 123-45-6789"
    );

    // Play the external pipeline: deposit the redacted counterpart.
    output
        .put(
            "text/redacted_report.txt",
            Bytes::from_static(b"Alice SSN [REDACTED]"),
            "text/plain",
        )
        .await
        .expect("seed output");

    // The poller finds it and the view flips to complete.
    let html = wait_for_view(&router, "Redaction Complete").await;
    let download_url = extract_download_url(&html);

    // The download affordance yields exactly the redacted text, named
    // redacted_file.txt regardless of the original filename.
    let response = router
        .clone()
        .oneshot(get(&download_url))
        .await
        .expect("request ok");
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .expect("content disposition")
        .to_str()
        .expect("header text")
        .to_string();
    assert!(disposition.contains("redacted_file.txt"));
    assert_eq!(body_string(response).await, "Alice SSN [REDACTED]");

    // Reset returns to a clean idle view and revokes the handle.
    let response = router.clone().oneshot(post("/reset")).await.expect("request ok");
    let html = body_string(response).await;
    assert!(html.contains("drop-zone"));
    assert!(!html.contains("report.txt"));

    let response = router
        .clone()
        .oneshot(get(&download_url))
        .await
        .expect("request ok");
    assert_eq!(response.status(), StatusCode::GONE);
}

#[tokio::test]
async fn submit_without_a_file_stays_idle() {
    let (router, _ingest, _output) = memory_app();

    let response = router.clone().oneshot(post("/redact")).await.expect("request ok");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("view-idle"));
    assert!(html.contains("drop-zone"));
}

#[tokio::test]
async fn poll_timeout_returns_to_idle_with_a_notice() {
    let (router, _ingest, _output) = memory_app_with(PollSettings {
        max_attempts: 5,
        ..fast_settings()
    });
    // Nothing ever writes the output object, so the poller must give up.

    let response = router
        .clone()
        .oneshot(multipart_upload("report.txt", "Alice SSN 123-45-6789"))
        .await
        .expect("request ok");
    assert_eq!(response.status(), StatusCode::OK);
    let response = router.clone().oneshot(post("/redact")).await.expect("request ok");
    let html = body_string(response).await;
    assert!(html.contains("view-processing"));

    let html = wait_for_view(&router, "timed out").await;
    assert!(html.contains("view-idle"));
    // The selection survives the failure so the user can retry.
    assert!(html.contains("report.txt"));
}

#[tokio::test]
async fn clearing_the_selection_restores_the_drop_zone() {
    let (router, _ingest, _output) = memory_app();

    let response = router
        .clone()
        .oneshot(multipart_upload("report.txt", "hello"))
        .await
        .expect("request ok");
    let html = body_string(response).await;
    assert!(html.contains("report.txt"));

    let response = router
        .clone()
        .oneshot(post("/files/clear"))
        .await
        .expect("request ok");
    let html = body_string(response).await;
    assert!(html.contains("drop-zone"));
    assert!(html.contains("disabled"));
}

#[tokio::test]
async fn unknown_download_handles_are_gone() {
    let (router, _ingest, _output) = memory_app();

    let response = router
        .clone()
        .oneshot(get("/download/999"))
        .await
        .expect("request ok");
    assert_eq!(response.status(), StatusCode::GONE);
}

#[tokio::test]
async fn index_serves_the_full_page() {
    let (router, _ingest, _output) = memory_app();

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .expect("request ok");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("<!DOCTYPE html>"));
    assert!(html.contains("PII Redactor"));
    assert!(html.contains("drop-zone"));
}

mod helpers;

use axum::http::StatusCode;
use bytes::Bytes;
use helpers::{setup_test_app, setup_test_app_with, test_config, CountingStorage};
use regex::Regex;
use serde_json::{json, Value};

#[tokio::test]
async fn test_upload_then_fetch_returns_same_bytes() {
    let app = setup_test_app();

    let response = app
        .client()
        .post("/api/blob/upload")
        .add_query_param("name", "a.pdf")
        .content_type("application/pdf")
        .bytes(Bytes::from_static(b"abc"))
        .await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    let pathname = body["pathname"].as_str().unwrap().to_string();
    assert!(
        Regex::new(r"^test/a-\d{14}\.pdf$").unwrap().is_match(&pathname),
        "unexpected pathname {pathname}"
    );
    assert_eq!(body["size"], 3);

    let response = app
        .client()
        .get("/api/blob/fetch")
        .add_query_param("pathname", &pathname)
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.as_bytes().as_ref(), b"abc");
    assert_eq!(response.headers()["content-type"], "application/pdf");

    let response = app
        .client()
        .post("/api/blob/fetch")
        .json(&json!({ "pathname": format!("/{pathname}") }))
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.as_bytes().as_ref(), b"abc");
}

#[tokio::test]
async fn test_upload_without_name_or_content_type() {
    let app = setup_test_app();

    let response = app
        .client()
        .post("/api/blob/upload")
        .bytes(Bytes::from_static(b"\x00\x01"))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    let pathname = body["pathname"].as_str().unwrap().to_string();
    assert!(Regex::new(r"^test/Lease-\d{14}\.pdf$")
        .unwrap()
        .is_match(&pathname));

    let response = app
        .client()
        .get("/api/blob/fetch")
        .add_query_param("pathname", &pathname)
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/octet-stream"
    );
}

#[tokio::test]
async fn test_names_with_reserved_characters_keep_their_pathname() {
    let app = setup_test_app();

    let response = app
        .client()
        .post("/api/blob/upload")
        .add_query_param("name", "Lease #2 [signed].pdf")
        .content_type("application/pdf")
        .bytes(Bytes::from_static(b"abc"))
        .await;
    response.assert_status(StatusCode::OK);
    let pathname = response.json::<Value>()["pathname"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(
        Regex::new(r"^test/Lease #2 \[signed\]-\d{14}\.pdf$")
            .unwrap()
            .is_match(&pathname),
        "unexpected pathname {pathname}"
    );

    let response = app
        .client()
        .get("/api/blob/fetch")
        .add_query_param("pathname", &pathname)
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.as_bytes().as_ref(), b"abc");
}

#[tokio::test]
async fn test_upload_backend_failure_is_500_with_backend_message() {
    let app = setup_test_app_with(
        test_config(),
        CountingStorage::new().failing_put("bucket leases is unavailable"),
    );

    let response = app
        .client()
        .post("/api/blob/upload")
        .add_query_param("name", "a.pdf")
        .content_type("application/pdf")
        .bytes(Bytes::from_static(b"abc"))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "bucket leases is unavailable");
    assert_eq!(body["code"], "STORAGE_ERROR");
}

#[tokio::test]
async fn test_fetch_falls_back_to_octet_stream_when_metadata_fails() {
    let storage = CountingStorage::new().failing_content_type();
    storage
        .seed("test/a.pdf", b"abc", "application/pdf")
        .await;
    let app = setup_test_app_with(test_config(), storage);

    let response = app
        .client()
        .get("/api/blob/fetch")
        .add_query_param("pathname", "test/a.pdf")
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.as_bytes().as_ref(), b"abc");
    assert_eq!(
        response.headers()["content-type"],
        "application/octet-stream"
    );
}

#[tokio::test]
async fn test_fetch_backend_failure_is_500_with_backend_message() {
    let storage = CountingStorage::new().failing_download("read timed out");
    storage
        .seed("test/a.pdf", b"abc", "application/pdf")
        .await;
    let app = setup_test_app_with(test_config(), storage);

    let response = app
        .client()
        .get("/api/blob/fetch")
        .add_query_param("pathname", "test/a.pdf")
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "read timed out");
    assert_eq!(body["code"], "STORAGE_ERROR");
}

#[tokio::test]
async fn test_fetch_rejects_malformed_pathname() {
    let app = setup_test_app();

    let response = app
        .client()
        .get("/api/blob/fetch")
        .add_query_param("pathname", "test//a.pdf")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_upload_rejects_empty_body_and_blank_name() {
    let app = setup_test_app();

    let response = app
        .client()
        .post("/api/blob/upload")
        .add_query_param("name", "a.pdf")
        .bytes(Bytes::new())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "empty body");
    assert_eq!(body["code"], "INVALID_INPUT");

    let response = app
        .client()
        .post("/api/blob/upload")
        .add_query_param("name", "   ")
        .bytes(Bytes::from_static(b"abc"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    assert_eq!(app.storage.calls(), 0);
}

#[tokio::test]
async fn test_fetch_missing_object_is_404() {
    let app = setup_test_app();

    let response = app
        .client()
        .get("/api/blob/fetch")
        .add_query_param("pathname", "test/never-uploaded.pdf")
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "not found");
}

#[tokio::test]
async fn test_fetch_requires_pathname() {
    let app = setup_test_app();

    let response = app.client().get("/api/blob/fetch").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "missing pathname");

    let response = app
        .client()
        .post("/api/blob/fetch")
        .json(&json!({ "pathname": " / " }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = app.client().post("/api/blob/fetch").json(&json!({})).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    assert_eq!(app.storage.calls(), 0);
}

#[tokio::test]
async fn test_unsupported_method_is_405() {
    let app = setup_test_app();

    let response = app.client().get("/api/blob/upload").await;
    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
}

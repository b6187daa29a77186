//! Handler and routing tests that do not need a live backend.
//!
//! The storage context stays closed here, so any endpoint that touches
//! storage reports an internal error; everything else must answer on its
//! own.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use basketapp_rest::{create_app, ServerConfig};
use basketapp_storage::security::{SecureTransport, SecuritySettings};
use basketapp_storage::{ElassandraStorage, StorageConfig};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

fn app() -> Router {
    let storage = Arc::new(ElassandraStorage::new(
        StorageConfig::default(),
        SecureTransport::build(&SecuritySettings::default()),
    ));
    create_app(storage, ServerConfig::for_testing())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&body).into_owned())
}

#[tokio::test]
async fn index_answers_without_storage() {
    let request = Request::builder()
        .uri("/basketapp/basket/")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app(), request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn get_by_id_on_closed_storage_is_an_internal_error() {
    let request = Request::builder()
        .uri(format!("/basketapp/basket/{}", Uuid::new_v4()))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("not opened"));
}

#[tokio::test]
async fn get_by_id_rejects_a_malformed_uuid() {
    let request = Request::builder()
        .uri("/basketapp/basket/not-a-uuid")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_on_closed_storage_is_an_internal_error() {
    let request = Request::builder()
        .uri("/basketapp/basket/search?store_code=1")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app(), request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn insert_on_closed_storage_is_an_internal_error() {
    let request = Request::builder()
        .method("POST")
        .uri("/basketapp/basket/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            r#"{"store_code": "1", "basket_status": "Finished", "items": []}"#,
        ))
        .unwrap();
    let (status, _) = send(app(), request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn insert_rejects_a_non_json_body() {
    let request = Request::builder()
        .method("POST")
        .uri("/basketapp/basket/")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("not json"))
        .unwrap();
    let (status, _) = send(app(), request).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn descriptor_is_served_as_yaml() {
    let request = Request::builder()
        .uri("/swagger/basketapp.yml")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.contains("yaml"));
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8_lossy(&body);
    assert!(text.contains("openapi:"));
    assert!(text.contains("servers:"));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let request = Request::builder()
        .uri("/basketapp/unknown")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app(), request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

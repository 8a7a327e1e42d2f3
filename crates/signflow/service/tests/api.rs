//! HTTP-level tests driving the router with in-memory adapters.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use signflow_engine::{SignflowConfig, SignflowEngine, StaticBlobFetcher};
use signflow_notify::RecordingNotifier;
use signflow_service::{create_router, AppState};
use signflow_storage::memory::InMemorySignflowStorage;
use signflow_storage::{RecipientStore, SessionStore};
use signflow_types::DocumentId;
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> (Router, Arc<InMemorySignflowStorage>) {
    let storage = Arc::new(InMemorySignflowStorage::new());
    let engine = Arc::new(SignflowEngine::new(
        storage.clone(),
        Arc::new(RecordingNotifier::new()),
        Arc::new(StaticBlobFetcher::new()),
        SignflowConfig::default(),
    ));
    (
        create_router(AppState::new(engine, storage.clone())),
        storage,
    )
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn draft_body(with_field: bool) -> serde_json::Value {
    let mut body = serde_json::json!({
        "organization_id": "org-1",
        "created_by": "user-1",
        "title": "Offer Letter",
        "signing_order": "parallel",
        "recipients": [
            { "name": "Ada", "email": "ada@example.com", "role": "signer" }
        ]
    });
    if with_field {
        body["fields"] = serde_json::json!([{
            "recipient_index": 0,
            "kind": "signature",
            "page": 1,
            "x": 10.0, "y": 80.0, "width": 25.0, "height": 6.0,
            "required": true
        }]);
    }
    body
}

async fn token_for(storage: &InMemorySignflowStorage, document_id: &str) -> String {
    let recipient = storage
        .list_recipients(&DocumentId::new(document_id))
        .await
        .unwrap()
        .into_iter()
        .next()
        .unwrap();
    storage
        .find_session_for_recipient(&recipient.id)
        .await
        .unwrap()
        .unwrap()
        .token
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _) = app();
    let response = app.oneshot(get("/api/v1/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn full_signing_flow_over_http() {
    let (app, storage) = app();

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/documents", draft_body(false)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let document = body_json(response).await;
    let id = document["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/documents/{id}/send"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let sent = body_json(response).await;
    assert_eq!(sent["document"]["status"], "pending");

    let token = token_for(&storage, &id).await;
    let response = app
        .clone()
        .oneshot(get(&format!("/sign/{token}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let room = body_json(response).await;
    assert_eq!(room["recipient"]["email"], "ada@example.com");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/sign/{token}"),
            serde_json::json!({ "values": {} }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = body_json(response).await;
    assert_eq!(outcome["document_completed"], serde_json::json!(true));

    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/documents/{id}/certificate")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let certificate = body_json(response).await;
    assert!(certificate["certificate_id"]
        .as_str()
        .unwrap()
        .starts_with("CERT-"));

    // Replay of the consumed link is a conflict, not a success.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/sign/{token}"),
            serde_json::json!({ "values": {} }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["code"], "ALREADY_SIGNED");
}

#[tokio::test]
async fn unknown_signing_token_is_not_found() {
    let (app, _) = app();
    let response = app
        .oneshot(get(&format!("/sign/{}", "0".repeat(64))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_LINK");
}

#[tokio::test]
async fn missing_required_fields_are_a_422_with_details() {
    let (app, storage) = app();

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/documents", draft_body(true)))
        .await
        .unwrap();
    let document = body_json(response).await;
    let id = document["id"].as_str().unwrap().to_string();
    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/documents/{id}/send"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();

    let token = token_for(&storage, &id).await;
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/sign/{token}"),
            serde_json::json!({ "values": {} }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["code"], "MISSING_REQUIRED_FIELDS");
    assert_eq!(body["details"]["fields"], serde_json::json!(["signature"]));
}

#[tokio::test]
async fn declining_consumes_the_link_and_lands_in_the_org_feed() {
    let (app, storage) = app();

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/documents", draft_body(false)))
        .await
        .unwrap();
    let document = body_json(response).await;
    let id = document["id"].as_str().unwrap().to_string();
    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/documents/{id}/send"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();

    let token = token_for(&storage, &id).await;
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/sign/{token}/decline"),
            serde_json::json!({ "reason": "wrong salary figure" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The link died with the decline.
    let response = app
        .clone()
        .oneshot(get(&format!("/sign/{token}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::GONE);
    let body = body_json(response).await;
    assert_eq!(body["code"], "DECLINED");

    let response = app
        .clone()
        .oneshot(get("/api/v1/organizations/org-1/audit"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let feed = body_json(response).await;
    let events: Vec<&str> = feed
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["event_type"].as_str().unwrap())
        .collect();
    assert!(events.contains(&"document.declined"));
}

#[tokio::test]
async fn cc_only_documents_are_rejected_at_creation() {
    let (app, _) = app();
    let body = serde_json::json!({
        "organization_id": "org-1",
        "created_by": "user-1",
        "title": "FYI only",
        "signing_order": "parallel",
        "recipients": [
            { "name": "Watcher", "email": "watch@example.com", "role": "cc" }
        ]
    });
    let response = app
        .oneshot(json_request("POST", "/api/v1/documents", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

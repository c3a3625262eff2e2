//! HTTP-level tests for the messaging API.
//!
//! Requests go through the full router (auth middleware, CORS, timeout and
//! trace layers) backed by the in-memory store.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use campus_dm::adapters::auth::MockSessionValidator;
use campus_dm::adapters::http::messaging::{MessagingHandlers, MessagingLimits, MessagingPorts};
use campus_dm::adapters::http::{build_router, HttpSettings};
use campus_dm::adapters::memory::{InMemoryMessagingStore, InMemoryUserDirectory};
use campus_dm::domain::foundation::{AuthError, UserId};
use campus_dm::ports::{SnapshotPolicy, StoreError, UserProfile};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct TestApp {
    router: Router,
    store: Arc<InMemoryMessagingStore>,
}

fn app() -> TestApp {
    app_with_limits(MessagingLimits::default())
}

fn app_with_limits(limits: MessagingLimits) -> TestApp {
    let store = Arc::new(InMemoryMessagingStore::new());
    let directory = Arc::new(InMemoryUserDirectory::with_profiles(vec![
        UserProfile::new(UserId::from_i64(1), "Ada"),
        UserProfile::new(UserId::from_i64(2), "Grace"),
        UserProfile::new(UserId::from_i64(3), "Linus"),
    ]));
    let ports = MessagingPorts {
        conversations: store.clone(),
        messages: store.clone(),
        read_state: store.clone(),
        users: directory.clone(),
        profiles: directory,
    };
    let handlers = MessagingHandlers::from_ports(ports, SnapshotPolicy::Keep, limits);

    let validator = MockSessionValidator::new()
        .with_test_user("token-1", 1)
        .with_test_user("token-2", 2)
        .with_test_user("token-3", 3)
        .with_error("expired", AuthError::TokenExpired)
        .with_error("idp-down", AuthError::ServiceUnavailable("jwks".into()));

    TestApp {
        router: build_router(handlers, Arc::new(validator), &HttpSettings::default()),
        store,
    }
}

impl TestApp {
    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn open(&self, token: &str, other: i64) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/conversations",
                Some(token),
                Some(json!({ "other_user_id": other })),
            )
            .await;
        assert!(status.is_success(), "open failed: {} {}", status, body);
        body["id"].as_str().unwrap().to_string()
    }

    async fn send(&self, token: &str, conversation: &str, content: &str) -> Value {
        let (status, body) = self
            .call(
                Method::POST,
                &format!("/api/conversations/{}/messages", conversation),
                Some(token),
                Some(json!({ "content": content })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "send failed: {}", body);
        body
    }
}

// =============================================================================
// Health & auth
// =============================================================================

#[tokio::test]
async fn health_needs_no_token() {
    let app = app();
    let (status, body) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn api_requires_token() {
    let app = app();
    let (status, _) = app.call(Method::GET, "/api/conversations", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_and_unknown_tokens_are_rejected() {
    let app = app();
    let (expired, _) = app
        .call(Method::GET, "/api/conversations", Some("expired"), None)
        .await;
    let (unknown, _) = app
        .call(Method::GET, "/api/conversations", Some("forged"), None)
        .await;
    assert_eq!(expired, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn identity_outage_is_service_unavailable() {
    let app = app();
    let (status, _) = app
        .call(Method::GET, "/api/conversations", Some("idp-down"), None)
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

// =============================================================================
// Conversations
// =============================================================================

#[tokio::test]
async fn open_conversation_created_then_found() {
    let app = app();
    let (first, body) = app
        .call(
            Method::POST,
            "/api/conversations",
            Some("token-1"),
            Some(json!({ "other_user_id": 2 })),
        )
        .await;
    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(body["other_user"]["id"], 2);
    assert_eq!(body["other_user"]["display_name"], "Grace");
    assert_eq!(body["unread_count"], 0);

    let (second, again) = app
        .call(
            Method::POST,
            "/api/conversations",
            Some("token-2"),
            Some(json!({ "other_user_id": 1 })),
        )
        .await;
    assert_eq!(second, StatusCode::OK);
    assert_eq!(again["id"], body["id"]);
    assert_eq!(again["other_user"]["id"], 1);
}

#[tokio::test]
async fn reopening_matches_inbox_view() {
    let app = app();
    let conv = app.open("token-1", 2).await;
    app.send("token-2", &conv, "one").await;
    app.send("token-2", &conv, "two").await;

    let (status, reopened) = app
        .call(
            Method::POST,
            "/api/conversations",
            Some("token-1"),
            Some(json!({ "other_user_id": 2 })),
        )
        .await;
    let (_, inbox) = app
        .call(Method::GET, "/api/conversations", Some("token-1"), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reopened["unread_count"], 2);
    assert_eq!(reopened["other_user"]["display_name"], "Grace");
    assert_eq!(reopened["last_message"]["content"], "two");
    assert_eq!(reopened["unread_count"], inbox["items"][0]["unread_count"]);
    assert_eq!(reopened["other_user"], inbox["items"][0]["other_user"]);
}

#[tokio::test]
async fn conversation_with_self_is_bad_request() {
    let app = app();
    let (status, body) = app
        .call(
            Method::POST,
            "/api/conversations",
            Some("token-1"),
            Some(json!({ "other_user_id": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn conversation_with_unknown_user_is_not_found() {
    let app = app();
    let (status, body) = app
        .call(
            Method::POST,
            "/api/conversations",
            Some("token-1"),
            Some(json!({ "other_user_id": 99 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "USER_NOT_FOUND");
}

#[tokio::test]
async fn inbox_shows_summary_and_unread() {
    let app = app();
    let conv = app.open("token-1", 2).await;
    app.send("token-2", &conv, "Hello from Grace").await;

    let (status, body) = app
        .call(Method::GET, "/api/conversations", Some("token-1"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    let item = &body["items"][0];
    assert_eq!(item["id"], conv);
    assert_eq!(item["last_message"]["content"], "Hello from Grace");
    assert_eq!(item["last_message"]["sender_id"], 2);
    assert_eq!(item["unread_count"], 1);
}

// =============================================================================
// Messages
// =============================================================================

#[tokio::test]
async fn send_and_page_history() {
    let app = app();
    let conv = app.open("token-1", 2).await;
    for i in 0..3 {
        app.send("token-1", &conv, &format!("m{}", i)).await;
    }

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/conversations/{}/messages?page=1&limit=2", conv),
            Some("token-2"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["content"], "m1");
    assert_eq!(body["items"][1]["content"], "m2");
    assert_eq!(body["items"][1]["sender"]["display_name"], "Ada");
    assert_eq!(body["has_more"], true);

    let (_, older) = app
        .call(
            Method::GET,
            &format!("/api/conversations/{}/messages?page=2&limit=2", conv),
            Some("token-2"),
            None,
        )
        .await;
    assert_eq!(older["items"].as_array().unwrap().len(), 1);
    assert_eq!(older["items"][0]["content"], "m0");
    assert_eq!(older["has_more"], false);
}

#[tokio::test]
async fn history_is_forbidden_to_outsiders() {
    let app = app();
    let conv = app.open("token-1", 2).await;
    app.send("token-1", &conv, "secret").await;

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/conversations/{}/messages", conv),
            Some("token-3"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.get("items").is_none());
}

#[tokio::test]
async fn page_limit_above_maximum_is_rejected() {
    let app = app();
    let conv = app.open("token-1", 2).await;
    let (status, _) = app
        .call(
            Method::GET,
            &format!("/api/conversations/{}/messages?limit=101", conv),
            Some("token-1"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn blank_and_oversized_content_are_rejected() {
    let app = app_with_limits(MessagingLimits {
        max_content_length: 10,
        ..MessagingLimits::default()
    });
    let conv = app.open("token-1", 2).await;
    let uri = format!("/api/conversations/{}/messages", conv);

    let (blank, body) = app
        .call(Method::POST, &uri, Some("token-1"), Some(json!({ "content": "  " })))
        .await;
    assert_eq!(blank, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "content");

    let (long, _) = app
        .call(
            Method::POST,
            &uri,
            Some("token-1"),
            Some(json!({ "content": "x".repeat(11) })),
        )
        .await;
    assert_eq!(long, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.message_count().await, 0);
}

#[tokio::test]
async fn duplicate_client_token_returns_existing_message() {
    let app = app();
    let conv = app.open("token-1", 2).await;
    let uri = format!("/api/conversations/{}/messages", conv);
    let payload = json!({
        "content": "only once",
        "client_token": "6f1c0a52-2d0f-4d4b-9a51-5b8b7f0f4a11"
    });

    let (first, original) = app
        .call(Method::POST, &uri, Some("token-1"), Some(payload.clone()))
        .await;
    let (second, replay) = app
        .call(Method::POST, &uri, Some("token-1"), Some(payload))
        .await;

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(original["id"], replay["id"]);
    assert_eq!(app.store.message_count().await, 1);
}

#[tokio::test]
async fn transient_store_failure_reports_unchanged_state() {
    let app = app();
    let conv = app.open("token-1", 2).await;
    app.store
        .fail_next_write(StoreError::Unavailable("pool timed out".into()))
        .await;

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/conversations/{}/messages", conv),
            Some("token-1"),
            Some(json!({ "content": "hello" })),
        )
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["retryable"], true);
    assert_eq!(body["state"], "unchanged");
}

#[tokio::test]
async fn read_receipts_and_unread_counts() {
    let app = app();
    let conv = app.open("token-1", 2).await;
    let first = app.send("token-1", &conv, "one").await;
    app.send("token-1", &conv, "two").await;

    let (_, count) = app
        .call(Method::GET, "/api/messages/unread-count", Some("token-2"), None)
        .await;
    assert_eq!(count["unread_count"], 2);

    let message_id = first["id"].as_str().unwrap();
    let (by_sender, _) = app
        .call(
            Method::PUT,
            &format!("/api/messages/{}/read", message_id),
            Some("token-1"),
            None,
        )
        .await;
    assert_eq!(by_sender, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/messages/{}/read", message_id),
            Some("token-2"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["changed"], true);

    let (_, scoped) = app
        .call(
            Method::GET,
            &format!("/api/messages/unread-count?conversation_id={}", conv),
            Some("token-2"),
            None,
        )
        .await;
    assert_eq!(scoped["unread_count"], 1);

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/conversations/{}/read", conv),
            Some("token-2"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 1);

    let (_, after) = app
        .call(Method::GET, "/api/messages/unread-count", Some("token-2"), None)
        .await;
    assert_eq!(after["unread_count"], 0);
}

#[tokio::test]
async fn delete_is_sender_only() {
    let app = app();
    let conv = app.open("token-1", 2).await;
    let message = app.send("token-1", &conv, "regret").await;
    let uri = format!("/api/messages/{}", message["id"].as_str().unwrap());

    let (by_receiver, _) = app.call(Method::DELETE, &uri, Some("token-2"), None).await;
    assert_eq!(by_receiver, StatusCode::FORBIDDEN);

    let (by_sender, body) = app.call(Method::DELETE, &uri, Some("token-1"), None).await;
    assert_eq!(by_sender, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (again, body) = app.call(Method::DELETE, &uri, Some("token-1"), None).await;
    assert_eq!(again, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "MESSAGE_NOT_FOUND");
}

#[tokio::test]
async fn malformed_ids_are_bad_requests() {
    let app = app();
    let (status, _) = app
        .call(
            Method::GET,
            "/api/conversations/not-a-uuid/messages",
            Some("token-1"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

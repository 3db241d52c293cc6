#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! [`TestApp`] wraps the REAL kernel router and services over an in-memory
//! storage backend, so HTTP behavior is tested without a database. Each
//! test builds its own app and therefore sees an empty store.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, header};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use intranet_kernel::AppState;
use intranet_kernel::routes;
use intranet_kernel::session::{DEFAULT_COOKIE_NAME, SESSION_LIFETIME, SessionKeys};
use intranet_kernel::storage::MemoryMenuStorage;

/// Signing secret shared by the test app and the tokens it accepts.
pub const TEST_SECRET: &str = "integration-test-secret-32-bytes-long!";

/// Test application wrapper using the REAL kernel routes and state.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    keys: SessionKeys,
}

impl TestApp {
    /// Create a fresh application over an empty in-memory store.
    pub fn new() -> Self {
        let keys = SessionKeys::new(TEST_SECRET.as_bytes(), DEFAULT_COOKIE_NAME);
        let state = AppState::with_storage(Arc::new(MemoryMenuStorage::new()), keys.clone());

        // Same routes main.rs serves
        let router = routes::api_router()
            .layer(tower_http::trace::TraceLayer::new_for_http())
            .with_state(state.clone());

        Self {
            router,
            state,
            keys,
        }
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// Session cookie header for an administrator.
    pub fn admin_cookie(&self) -> String {
        let token = self
            .keys
            .issue("admin.portal", "Portal Admin", true, SESSION_LIFETIME)
            .expect("Failed to issue session");
        format!("{DEFAULT_COOKIE_NAME}={token}")
    }

    /// Session cookie header for an authenticated non-admin.
    pub fn user_cookie(&self) -> String {
        let token = self
            .keys
            .issue("staff.member", "Staff Member", false, SESSION_LIFETIME)
            .expect("Failed to issue session");
        format!("{DEFAULT_COOKIE_NAME}={token}")
    }

    /// GET a path and return status plus JSON body.
    pub async fn get(&self, path: &str) -> (u16, Value) {
        let response = self
            .request(Request::get(path).body(Body::empty()).unwrap())
            .await;
        split(response).await
    }

    /// Send a JSON body as an administrator.
    pub async fn admin_json(&self, method: &str, path: &str, body: &Value) -> (u16, Value) {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, self.admin_cookie())
            .body(Body::from(body.to_string()))
            .unwrap();
        split(self.request(request).await).await
    }

    /// Send a bodiless request as an administrator.
    pub async fn admin_empty(&self, method: &str, path: &str) -> (u16, Value) {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header(header::COOKIE, self.admin_cookie())
            .body(Body::empty())
            .unwrap();
        split(self.request(request).await).await
    }

    /// Create a menu and return its id.
    pub async fn create_menu(&self, name: &str, location: &str) -> i64 {
        let body = intranet_test_utils::test_menu(name, location).to_json();
        let (status, json) = self.admin_json("POST", "/menus", &body).await;
        assert_eq!(status, 201, "create menu failed: {json}");
        json["data"]["id"].as_i64().unwrap()
    }

    /// Create a menu item from a fixture and return the created record.
    pub async fn create_item(&self, item: &intranet_test_utils::TestMenuItem) -> Value {
        let (status, json) = self.admin_json("POST", "/menus/items", &item.to_json()).await;
        assert_eq!(status, 201, "create item failed: {json}");
        json["data"].clone()
    }
}

/// Split a response into its status code and parsed JSON body.
pub async fn split(response: Response) -> (u16, Value) {
    let status = response.status().as_u16();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or_else(|_| {
        let text = String::from_utf8_lossy(&body);
        panic!("Failed to parse JSON: {text}");
    });
    (status, json)
}

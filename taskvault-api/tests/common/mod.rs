//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - An in-memory application with cheap password hashing
//! - Request helpers returning status, headers and JSON body
//! - Account helpers for registering and logging in

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use chrono::Duration;
use serde_json::{json, Value};
use taskvault_api::app::{build_router, AppState};
use taskvault_api::config::{ApiConfig, Config, LogFormat};
use taskvault_shared::auth::jwt::TokenConfig;
use taskvault_shared::auth::password::HashParams;
use taskvault_shared::store::Storage;
use tower::Service as _;

pub const PASSWORD: &str = "Aa1!aaaa";

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: axum::Router,
    pub config: Config,
}

/// A decoded response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// `Set-Cookie` header values
    pub fn cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }
}

/// Tokens of a logged-in user
#[derive(Debug, Clone)]
pub struct TestSession {
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl TestSession {
    pub fn bearer(&self) -> (String, String) {
        (
            "authorization".to_string(),
            format!("Bearer {}", self.access_token),
        )
    }
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: None,
        tokens: TokenConfig {
            access_secret: "test-access-secret-key-at-least-32-bytes".to_string(),
            access_ttl: Duration::minutes(15),
            refresh_secret: "test-refresh-secret-key-at-least-32-bytes".to_string(),
            refresh_ttl: Duration::days(10),
        },
        password_hash: HashParams {
            memory_kib: 4096,
            iterations: 1,
            parallelism: 1,
        },
        log_format: LogFormat::Text,
    }
}

impl TestContext {
    /// Creates a fresh application over in-memory storage
    pub fn new() -> Self {
        let config = test_config();
        let app = build_router(AppState::new(config.clone(), Storage::memory()));
        Self { app, config }
    }

    /// Sends a request; `body` is sent as JSON
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(String, String)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().call(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, headers: &[(String, String)]) -> TestResponse {
        self.send(Method::GET, uri, None, headers).await
    }

    pub async fn post(&self, uri: &str, body: Value, headers: &[(String, String)]) -> TestResponse {
        self.send(Method::POST, uri, Some(body), headers).await
    }

    /// Registers a user with the shared test password
    pub async fn register(&self, user_name: &str, email: &str) -> TestResponse {
        self.post(
            "/api/v1/user/register",
            json!({ "userName": user_name, "email": email, "password": PASSWORD }),
            &[],
        )
        .await
    }

    /// Logs in by user name
    pub async fn login(&self, user_name: &str) -> TestSession {
        let response = self
            .post(
                "/api/v1/user/login",
                json!({ "userName": user_name, "password": PASSWORD }),
                &[],
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);

        session_from(&response.body["data"])
    }

    /// Registers and logs in
    pub async fn signup(&self, user_name: &str) -> TestSession {
        let response = self
            .register(user_name, &format!("{}@example.com", user_name))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        self.login(user_name).await
    }

    /// Creates a task and returns its id
    pub async fn create_task(&self, session: &TestSession, title: &str, description: &str) -> String {
        let response = self
            .post(
                "/api/v1/task/createTask",
                json!({
                    "title": title,
                    "description": description,
                    "dueDate": "2030-01-01T00:00:00Z"
                }),
                &[session.bearer()],
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);

        response.body["data"]["id"].as_str().unwrap().to_string()
    }
}

/// Reads tokens from a login or account update payload
pub fn session_from(data: &Value) -> TestSession {
    TestSession {
        user_id: data["loggedInUser"]["id"].as_str().unwrap_or_default().to_string(),
        access_token: data["accessToken"].as_str().unwrap().to_string(),
        refresh_token: data["refreshToken"].as_str().unwrap().to_string(),
    }
}

/// A `Cookie` request header
pub fn cookie_header(pairs: &[(&str, &str)]) -> (String, String) {
    let value = pairs
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ");
    ("cookie".to_string(), value)
}

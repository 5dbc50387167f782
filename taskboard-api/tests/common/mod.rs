//! Shared fixtures for the HTTP tests
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`. Tests
//! need `DATABASE_URL`; without it they print a notice and return early.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::PgPool;
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::Config;
use taskboard_shared::db::migrations::{ensure_database_exists, run_migrations};
use taskboard_shared::db::pool::create_pool;
use taskboard_shared::db::seed::seed_roles;
use taskboard_shared::mail::{EmailMessage, MailError, Mailer};
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "correct-horse-battery";

/// Mailer that keeps every message for inspection
#[derive(Default)]
pub struct RecordingMailer {
    outbox: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.outbox.lock().unwrap().clone()
    }

    /// Polls the outbox until a message to `to` arrives
    pub async fn wait_for_message(&self, to: &str, timeout_secs: u64) -> Option<EmailMessage> {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_secs(timeout_secs);

        loop {
            if let Some(message) = self.sent().into_iter().find(|m| m.to == to) {
                return Some(message);
            }

            if start.elapsed() > timeout {
                return None;
            }

            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        self.outbox.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Router plus handles the tests inspect
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    pub mailer: Arc<RecordingMailer>,
}

/// Registered account with a live session
pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl TestContext {
    pub async fn new() -> Option<Self> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping API test");
            return None;
        };

        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some(url.clone()),
            "JWT_SECRET" => Some("api-test-secret-that-is-long-enough".to_string()),
            "DATABASE_MAX_CONNECTIONS" => Some("5".to_string()),
            _ => None,
        })
        .expect("Failed to build test config");

        ensure_database_exists(&config.database.url)
            .await
            .expect("Failed to ensure test database exists");
        let db = create_pool(config.database.clone())
            .await
            .expect("Failed to create pool");
        run_migrations(&db).await.expect("Failed to run migrations");
        seed_roles(&db).await.expect("Failed to seed roles");

        let mailer = Arc::new(RecordingMailer::default());
        let app = build_router(AppState::new(db.clone(), config, mailer.clone()));

        Some(Self { db, app, mailer })
    }

    /// Sends a request and returns the status with the JSON body (`Null` when empty)
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(bearer) = bearer {
            builder = builder.header(header::AUTHORIZATION, bearer);
        }

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    /// Registers a fresh user and logs them in
    pub async fn register(&self) -> TestUser {
        let handle = format!("u_{}", Uuid::new_v4().simple());
        let email = format!("{}@example.com", handle);

        let (status, body) = self
            .request(
                Method::POST,
                "/api/users",
                None,
                Some(serde_json::json!({
                    "username": handle,
                    "email": email,
                    "first_name": "Api",
                    "last_name": "Tester",
                    "password": PASSWORD
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        let id = body["id"].as_i64().unwrap();

        let (status, body) = self
            .request(
                Method::POST,
                "/api/users/login",
                None,
                Some(serde_json::json!({"email": email, "password": PASSWORD})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        TestUser {
            id,
            email,
            token: body["access_token"].as_str().unwrap().to_string(),
        }
    }
}

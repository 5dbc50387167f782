//! Shared fixtures for the database-backed tests
//!
//! Tests connect to `DATABASE_URL`. When it is not set they print a notice and
//! return early instead of failing.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Duration;
use sqlx::PgPool;
use taskboard_shared::auth::tokens::TokenService;
use taskboard_shared::db::migrations::{ensure_database_exists, run_migrations};
use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
use taskboard_shared::db::seed::seed_roles;
use taskboard_shared::mail::{EmailMessage, MailError, Mailer};
use taskboard_shared::models::user::User;
use taskboard_shared::services::users::{NewUser, UserManager};
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret-32-bytes-min";
pub const PASSWORD: &str = "s3cret-Passw0rd";

/// Migrated and seeded pool, or `None` when no database is configured
pub async fn test_pool() -> Option<PgPool> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database test");
        return None;
    };

    ensure_database_exists(&url)
        .await
        .expect("Failed to ensure test database exists");

    let pool = create_pool(DatabaseConfig {
        url,
        max_connections: 5,
        ..Default::default()
    })
    .await
    .expect("Failed to create pool");

    run_migrations(&pool).await.expect("Failed to run migrations");
    seed_roles(&pool).await.expect("Failed to seed roles");

    Some(pool)
}

pub fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

pub fn token_service() -> TokenService {
    TokenService::new(
        TEST_SECRET.to_string(),
        Duration::days(7),
        Duration::minutes(60),
    )
}

pub fn user_manager(pool: &PgPool) -> (UserManager, Arc<RecordingMailer>) {
    let mailer = Arc::new(RecordingMailer::default());
    let manager = UserManager::new(
        pool.clone(),
        token_service(),
        mailer.clone(),
        "http://localhost:3000".to_string(),
    );

    (manager, mailer)
}

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
    ///
    /// Reset emails are sent in the background, so they may land after the
    /// request that triggered them has returned.
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

/// Mailer whose deliveries never complete, like an unreachable provider
pub struct StalledMailer;

#[async_trait]
impl Mailer for StalledMailer {
    async fn send(&self, _message: &EmailMessage) -> Result<(), MailError> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// Registers a user with a unique username and email
pub async fn create_user(pool: &PgPool) -> User {
    let (users, _) = user_manager(pool);
    let handle = unique("user");

    users
        .create(NewUser {
            username: handle.clone(),
            email: format!("{}@example.com", handle),
            first_name: "Test".to_string(),
            last_name: Some("User".to_string()),
            password: PASSWORD.to_string(),
            is_admin: false,
        })
        .await
        .expect("Failed to create user")
}

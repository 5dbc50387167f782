/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: Health check endpoint
/// - `users`: Accounts, login and password reset
/// - `projects`: Projects, their lists, tags and members
/// - `cards`: Cards and their nested collections
/// - `comments`: Card comments

pub mod cards;
pub mod comments;
pub mod health;
pub mod projects;
pub mod users;

use serde::{Deserialize, Serialize};

/// Body of a 201 response for resources addressed by id
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: i64,
}

/// Plain acknowledgement
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

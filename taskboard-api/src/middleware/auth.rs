/// Bearer token authentication
///
/// Protected routes are wrapped with [`require_bearer`]. It reads the
/// `Authorization: Bearer <token>` header, verifies the access token, loads
/// the user it names and stores an [`AuthContext`] in the request extensions
/// for handlers to extract.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use taskboard_shared::models::user::User;

use crate::{app::AppState, error::ApiError};

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
}

impl AuthContext {
    pub fn user_id(&self) -> i64 {
        self.user.id
    }
}

/// Rejects requests without a valid access token
pub async fn require_bearer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())?.to_string();

    let user = state.users.authenticate(&token).await?;
    tracing::debug!(user_id = user.id, "Request authenticated");

    req.extensions_mut().insert(AuthContext { user });

    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))
}

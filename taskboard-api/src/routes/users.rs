/// Account endpoints
///
/// - `POST /users` - Register
/// - `POST /users/login` - Exchange credentials for an access token
/// - `GET /users/:id`, `PUT /users/:id` - Read or edit your own account
/// - `POST /users/forgot-password` - Mail a reset link
/// - `POST /users/reset-session` - Trade the mailed token for a session
/// - `POST /users/reset-password` - Set a new password

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskboard_shared::auth::jwt::IssuedToken;
use taskboard_shared::models::user::User;
use taskboard_shared::services::users::{NewUser, UserPatch};
use validator::{Validate, ValidationError};

use super::MessageResponse;
use crate::{
    app::AppState,
    error::ApiResult,
    middleware::auth::AuthContext,
};

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(
        length(min = 1, max = 150, message = "Username must be 1 to 150 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 256, message = "Email must be at most 256 characters")
    )]
    pub email: String,

    #[validate(length(min = 1, max = 100, message = "First name must be 1 to 100 characters"))]
    pub first_name: String,

    #[validate(length(max = 100, message = "Last name must be at most 100 characters"))]
    pub last_name: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[serde(default)]
    pub is_admin: bool,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Issued session
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    /// Always `bearer`
    pub token_type: String,

    pub expires_at: DateTime<Utc>,
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            access_token: issued.token,
            token_type: "bearer".to_string(),
            expires_at: issued.expires_at,
        }
    }
}

/// Profile update; absent fields are left alone
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "First name must be 1 to 100 characters"))]
    pub first_name: Option<String>,

    #[validate(length(max = 100, message = "Last name must be at most 100 characters"))]
    pub last_name: Option<String>,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 256, message = "Email must be at most 256 characters")
    )]
    pub email: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,

    pub is_admin: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetSessionRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Usernames are letters, digits and `_`, `@`, `-`
fn validate_username(username: &str) -> Result<(), ValidationError> {
    let allowed = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '@' | '-'));

    if username.is_empty() || !allowed {
        let mut error = ValidationError::new("username_charset");
        error.message = Some("Username may only contain letters, digits, _, @ and -".into());
        return Err(error);
    }

    Ok(())
}

/// Register a new user
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `409 Conflict`: Email or username already registered
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    req.validate()?;

    let user = state
        .users
        .create(NewUser {
            username: req.username,
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
            password: req.password,
            is_admin: req.is_admin,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Login endpoint
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials, identical for unknown emails
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate()?;

    let session = state.users.login(&req.email, &req.password).await?;

    Ok(Json(session.into()))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<User>> {
    let user = state.users.get_by_id(id, auth.user_id()).await?;
    Ok(Json(user))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    req.validate()?;

    let user = state
        .users
        .update(
            id,
            auth.user_id(),
            UserPatch {
                first_name: req.first_name,
                last_name: req.last_name,
                email: req.email,
                password: req.password,
                is_admin: req.is_admin,
            },
        )
        .await?;

    Ok(Json(user))
}

/// Always answers the same way so callers cannot discover which accounts exist
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    state.users.forgot_password(&req.email).await?;

    Ok(Json(MessageResponse::new(
        "If the email is registered, a reset link has been sent",
    )))
}

pub async fn reset_session(
    State(state): State<AppState>,
    Json(req): Json<ResetSessionRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate()?;

    let session = state.users.exchange_reset_token(&req.token).await?;

    Ok(Json(session.into()))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    state
        .users
        .reset_password(auth.user_id(), &req.password)
        .await?;

    Ok(Json(MessageResponse::new("Password updated")))
}

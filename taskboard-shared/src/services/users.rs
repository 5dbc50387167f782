/// User accounts, login and password reset

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{debug, info, warn};

use crate::auth::authorization::require_self;
use crate::auth::jwt::IssuedToken;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::tokens::TokenService;
use crate::error::{is_unique_violation, BoardError, BoardResult};
use crate::mail::{password_reset_message, Mailer};
use crate::models::user::{CreateUser, UpdateUser, User};

/// Account data for sign-up
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub password: String,
    pub is_admin: bool,
}

/// Profile changes; `None` fields are left alone
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_admin: Option<bool>,
}

#[derive(Clone)]
pub struct UserManager {
    pool: PgPool,
    tokens: TokenService,
    mailer: Arc<dyn Mailer>,
    frontend_url: String,
}

impl UserManager {
    pub fn new(
        pool: PgPool,
        tokens: TokenService,
        mailer: Arc<dyn Mailer>,
        frontend_url: String,
    ) -> Self {
        Self {
            pool,
            tokens,
            mailer,
            frontend_url,
        }
    }

    /// Checks email and password and opens an access session
    ///
    /// An unknown email and a wrong password fail identically with
    /// `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: &str) -> BoardResult<IssuedToken> {
        let mut conn = self.pool.acquire().await?;

        let user = User::find_by_email(&mut conn, email)
            .await?
            .ok_or(BoardError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            debug!(user_id = user.id, "Login rejected");
            return Err(BoardError::InvalidCredentials);
        }

        let session = self.tokens.issue_access(user.id)?;
        info!(user_id = user.id, "User logged in");

        Ok(session)
    }

    /// Registers an account
    ///
    /// # Errors
    ///
    /// `Conflict` when the email or the username is already taken.
    pub async fn create(&self, data: NewUser) -> BoardResult<User> {
        let mut tx = self.pool.begin().await?;

        if User::email_exists(&mut tx, &data.email).await? {
            return Err(BoardError::conflict("Email already registered"));
        }

        if User::username_exists(&mut tx, &data.username).await? {
            return Err(BoardError::conflict("Username already registered"));
        }

        let password_hash = hash_password(&data.password)?;

        let user = User::create(
            &mut tx,
            CreateUser {
                username: data.username,
                email: data.email,
                first_name: data.first_name,
                last_name: data.last_name,
                password_hash,
                is_admin: data.is_admin,
            },
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                BoardError::conflict("Email or username already registered")
            } else {
                BoardError::Database(e)
            }
        })?;

        tx.commit().await?;

        info!(user_id = user.id, username = %user.username, "User created");
        Ok(user)
    }

    /// Reads an account; callers may only read their own
    pub async fn get_by_id(&self, user_id: i64, caller_id: i64) -> BoardResult<User> {
        require_self(caller_id, user_id)?;

        let mut conn = self.pool.acquire().await?;

        User::find_by_id(&mut conn, user_id)
            .await?
            .ok_or(BoardError::NotFound("User"))
    }

    /// Edits an account; callers may only edit their own
    pub async fn update(&self, user_id: i64, caller_id: i64, patch: UserPatch) -> BoardResult<User> {
        require_self(caller_id, user_id)?;

        let mut tx = self.pool.begin().await?;

        let current = User::find_by_id(&mut tx, user_id)
            .await?
            .ok_or(BoardError::NotFound("User"))?;

        if let Some(email) = patch.email.as_deref() {
            if email != current.email && User::email_exists(&mut tx, email).await? {
                return Err(BoardError::conflict("Email already in use"));
            }
        }

        let password_hash = match patch.password.as_deref() {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        let user = User::update(
            &mut tx,
            user_id,
            UpdateUser {
                first_name: patch.first_name,
                last_name: patch.last_name,
                email: patch.email,
                password_hash,
                is_admin: patch.is_admin,
            },
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                BoardError::conflict("Email already in use")
            } else {
                BoardError::Database(e)
            }
        })?
        .ok_or(BoardError::NotFound("User"))?;

        tx.commit().await?;

        info!(user_id, "User updated");
        Ok(user)
    }

    /// Mails a reset link when the email belongs to an account
    ///
    /// Unknown emails succeed silently. Delivery runs in the background so the
    /// caller gets the same answer at the same speed for known and unknown
    /// emails; failures are logged.
    pub async fn forgot_password(&self, email: &str) -> BoardResult<()> {
        let mut conn = self.pool.acquire().await?;

        let Some(user) = User::find_by_email(&mut conn, email).await? else {
            debug!("Password reset requested for unknown email");
            return Ok(());
        };
        drop(conn);

        let reset = self.tokens.issue_reset(user.id)?;
        let message = password_reset_message(&self.frontend_url, &user.email, &reset.token);

        let mailer = Arc::clone(&self.mailer);
        let user_id = user.id;
        tokio::spawn(async move {
            match mailer.send(&message).await {
                Ok(()) => info!(user_id, "Password reset email sent"),
                Err(e) => warn!(user_id, error = %e, "Failed to send password reset email"),
            }
        });

        Ok(())
    }

    /// Trades a mailed reset token for a short access session
    pub async fn exchange_reset_token(&self, token: &str) -> BoardResult<IssuedToken> {
        let (user_id, session) = self.tokens.exchange_reset_token(token)?;

        let mut conn = self.pool.acquire().await?;
        if User::find_by_id(&mut conn, user_id).await?.is_none() {
            return Err(BoardError::Unauthenticated);
        }

        debug!(user_id, "Reset token exchanged for session");
        Ok(session)
    }

    /// Sets a new password for the authenticated caller
    pub async fn reset_password(&self, user_id: i64, new_password: &str) -> BoardResult<()> {
        let password_hash = hash_password(new_password)?;

        let mut tx = self.pool.begin().await?;
        if !User::set_password_hash(&mut tx, user_id, &password_hash).await? {
            return Err(BoardError::NotFound("User"));
        }
        tx.commit().await?;

        info!(user_id, "Password reset");
        Ok(())
    }

    /// Resolves a bearer token to the user it was issued for
    ///
    /// # Errors
    ///
    /// `Token` for a bad or expired token, `Unauthenticated` when the user no
    /// longer exists.
    pub async fn authenticate(&self, token: &str) -> BoardResult<User> {
        let user_id = self.tokens.verify_access(token)?;

        let mut conn = self.pool.acquire().await?;
        User::find_by_id(&mut conn, user_id)
            .await?
            .ok_or(BoardError::Unauthenticated)
    }
}

/// Token issuance policy
///
/// [`TokenService`] owns the signing secret and the lifetimes of the two token
/// kinds. A password reset goes through three steps:
///
/// 1. `issue_reset` mints a `verification` token that is mailed to the user
/// 2. `exchange_reset_token` trades it for a short access session
/// 3. that session authenticates the reset-password request

use chrono::Duration;

use super::jwt::{issue_token, verify_token, IssuedToken, JwtError, TokenType};

#[derive(Clone)]
pub struct TokenService {
    secret: String,
    access_ttl: Duration,
    reset_ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("reset_ttl", &self.reset_ttl)
            .finish()
    }
}

impl TokenService {
    pub fn new(secret: String, access_ttl: Duration, reset_ttl: Duration) -> Self {
        Self {
            secret,
            access_ttl,
            reset_ttl,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Login session for `user_id`
    pub fn issue_access(&self, user_id: i64) -> Result<IssuedToken, JwtError> {
        issue_token(user_id, TokenType::Access, self.access_ttl, &self.secret)
    }

    /// Reset token for `user_id`, valid for the reset lifetime
    pub fn issue_reset(&self, user_id: i64) -> Result<IssuedToken, JwtError> {
        issue_token(user_id, TokenType::Verification, self.reset_ttl, &self.secret)
    }

    /// Returns the user id of a valid access token
    pub fn verify_access(&self, token: &str) -> Result<i64, JwtError> {
        verify_token(token, TokenType::Access, &self.secret)
    }

    /// Validates a reset token and opens an access session that lives no
    /// longer than the reset lifetime
    pub fn exchange_reset_token(&self, token: &str) -> Result<(i64, IssuedToken), JwtError> {
        let user_id = verify_token(token, TokenType::Verification, &self.secret)?;
        let session = issue_token(user_id, TokenType::Access, self.reset_ttl, &self.secret)?;

        Ok((user_id, session))
    }
}

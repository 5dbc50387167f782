/// Signed bearer tokens
///
/// Tokens are HS256 JWTs carrying the user id as subject, a type tag and
/// issued-at/expiry timestamps. All timestamps are UTC seconds so tokens
/// issued on any host validate identically.
///
/// # Token Types
///
/// - **Access**: session token sent as `Authorization: Bearer <token>`
/// - **Verification**: short-lived token mailed out by the password reset flow,
///   only good for being exchanged into an access session
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use taskboard_shared::auth::jwt::{issue_token, verify_token, TokenType};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-test-secret-that-is-32-bytes-long!";
/// let issued = issue_token(42, TokenType::Access, Duration::minutes(30), secret)?;
///
/// let user_id = verify_token(&issued.token, TokenType::Access, secret)?;
/// assert_eq!(user_id, 42);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Issuer claim written into and required from every token
pub const ISSUER: &str = "taskboard";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature, issuer or structure did not validate
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Current time is past the embedded expiry
    #[error("Token has expired")]
    Expired,

    /// Token is valid but of the wrong kind for this use
    #[error("Wrong token type: expected {expected}, got {actual}")]
    WrongTokenType {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Token type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Session token for API calls
    Access,

    /// Password reset token
    Verification,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Verification => "verification",
        }
    }
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user id, as a decimal string
    pub sub: String,

    /// Issuer, always [`ISSUER`]
    pub iss: String,

    /// Issued at (Unix timestamp, UTC)
    pub iat: i64,

    /// Expiration time (Unix timestamp, UTC)
    pub exp: i64,

    /// Token type tag
    #[serde(rename = "type")]
    pub token_type: TokenType,
}

impl Claims {
    /// Creates claims for `user_id` that expire `ttl` from now
    ///
    /// A negative `ttl` produces already-expired claims.
    pub fn new(user_id: i64, token_type: TokenType, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id.to_string(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            token_type,
        }
    }

    /// Parses the subject back into a user id
    pub fn user_id(&self) -> Result<i64, JwtError> {
        self.sub
            .parse::<i64>()
            .map_err(|_| JwtError::InvalidToken("Subject is not a user id".to_string()))
    }

    /// Expiry as a UTC timestamp
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// A freshly signed token together with its expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs claims with HS256
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Issues a signed token of `token_type` for `user_id`, valid for `ttl`
pub fn issue_token(
    user_id: i64,
    token_type: TokenType,
    ttl: Duration,
    secret: &str,
) -> Result<IssuedToken, JwtError> {
    let claims = Claims::new(user_id, token_type, ttl);
    let token = create_token(&claims, secret)?;

    Ok(IssuedToken {
        token,
        expires_at: claims.expires_at(),
    })
}

/// Validates signature, issuer and expiry and returns the claims
///
/// No clock leeway is applied: a token is expired the second its `exp` passes.
///
/// # Errors
///
/// - `JwtError::Expired` when past expiry
/// - `JwtError::InvalidToken` for anything else (bad signature, wrong issuer,
///   malformed token)
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    validation.leeway = 0;
    validation.validate_exp = true;

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::InvalidToken(e.to_string()),
    })?;

    Ok(data.claims)
}

/// Validates a token, checks its type tag and returns the subject user id
pub fn verify_token(token: &str, expected: TokenType, secret: &str) -> Result<i64, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != expected {
        return Err(JwtError::WrongTokenType {
            expected: expected.as_str(),
            actual: claims.token_type.as_str(),
        });
    }

    claims.user_id()
}

/// Credentials and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: signed, typed, time-bound bearer tokens
/// - [`tokens`]: token issuance policy (access sessions, reset tokens)
/// - [`authorization`]: self, creator, author and project role checks
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use taskboard_shared::auth::password::{hash_password, verify_password};
/// use taskboard_shared::auth::tokens::TokenService;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let tokens = TokenService::new(
///     "a-signing-secret-of-at-least-32-chars".to_string(),
///     Duration::days(7),
///     Duration::minutes(60),
/// );
/// let session = tokens.issue_access(1)?;
/// assert_eq!(tokens.verify_access(&session.token)?, 1);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod password;
pub mod tokens;

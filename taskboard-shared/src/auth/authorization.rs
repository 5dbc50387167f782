/// Authorization checks
///
/// Access to a project is granted by membership; there is no separate ACL.
/// On top of that:
///
/// - user profiles can only be read and edited by their owner
/// - a project can only be deleted by its creator
/// - a comment can only be edited or deleted by its author
/// - the member list can only be changed by an Admin or SuperAdmin
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::authorization::{require_membership, require_role};
/// use taskboard_shared::models::role::Role;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, project_id: i64, user_id: i64) -> Result<(), Box<dyn std::error::Error>> {
/// let mut conn = pool.acquire().await?;
///
/// let role = require_membership(&mut conn, project_id, user_id).await?;
/// if role.can_manage_members() {
///     require_role(&mut conn, project_id, user_id, Role::Admin).await?;
/// }
/// # Ok(())
/// # }
/// ```

use sqlx::PgConnection;

use crate::error::BoardError;
use crate::models::membership::Membership;
use crate::models::role::Role;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// User has no membership in the project
    #[error("Not a member of project {0}")]
    NotMember(i64),

    /// User's project role is too low
    #[error("Insufficient permissions: requires {required}, has {actual}")]
    InsufficientRole { required: Role, actual: Role },

    /// Acting on another user's account
    #[error("Users can only access their own account")]
    NotSelf,

    /// Only the project creator may do this
    #[error("Only the project creator can do this")]
    NotCreator,

    /// Only the comment author may do this
    #[error("Only the comment author can do this")]
    NotAuthor,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<AuthzError> for BoardError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotMember(_) => BoardError::NotFound("Project"),
            AuthzError::DatabaseError(e) => BoardError::Database(e),
            other => BoardError::Forbidden(other.to_string()),
        }
    }
}

/// Returns the caller's role in the project
///
/// # Errors
///
/// `AuthzError::NotMember` when no membership row links them.
pub async fn require_membership(
    conn: &mut PgConnection,
    project_id: i64,
    user_id: i64,
) -> Result<Role, AuthzError> {
    Membership::find_role(conn, project_id, user_id)
        .await?
        .ok_or(AuthzError::NotMember(project_id))
}

/// Checks the caller holds `required` or a higher role in the project
pub async fn require_role(
    conn: &mut PgConnection,
    project_id: i64,
    user_id: i64,
    required: Role,
) -> Result<Role, AuthzError> {
    let actual = require_membership(conn, project_id, user_id).await?;

    if !actual.has_permission(&required) {
        return Err(AuthzError::InsufficientRole { required, actual });
    }

    Ok(actual)
}

pub fn require_self(caller_id: i64, user_id: i64) -> Result<(), AuthzError> {
    if caller_id != user_id {
        return Err(AuthzError::NotSelf);
    }

    Ok(())
}

pub fn require_creator(caller_id: i64, creator_id: i64) -> Result<(), AuthzError> {
    if caller_id != creator_id {
        return Err(AuthzError::NotCreator);
    }

    Ok(())
}

pub fn require_author(caller_id: i64, author_id: i64) -> Result<(), AuthzError> {
    if caller_id != author_id {
        return Err(AuthzError::NotAuthor);
    }

    Ok(())
}

/// Project membership model
///
/// Links a user to a project with a [`Role`]. A user holds at most one
/// membership per project; membership is what grants access to the project.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE project_members (
///     id BIGSERIAL PRIMARY KEY,
///     project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role_id BIGINT NOT NULL REFERENCES roles(id),
///     CONSTRAINT uq_project_member UNIQUE (project_id, user_id) DEFERRABLE INITIALLY DEFERRED
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::membership::Membership;
/// use taskboard_shared::models::role::{Role, RoleDirectory};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, project_id: i64, user_id: i64) -> Result<(), Box<dyn std::error::Error>> {
/// let mut tx = pool.begin().await?;
/// let roles = RoleDirectory::load(&mut tx).await?;
///
/// Membership::create(&mut tx, project_id, user_id, roles.require_id(Role::Leader)?).await?;
///
/// let role = Membership::find_role(&mut tx, project_id, user_id).await?;
/// assert_eq!(role, Some(Role::Leader));
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use super::role::Role;
use super::user::UserSummary;
use crate::reconcile::{ChildSchema, ChildStore};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    pub id: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub role_id: i64,
}

/// Member entry of a project detail view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberView {
    pub id: i64,
    pub user_id: i64,
    pub role: Role,
    pub user: UserSummary,
}

impl Membership {
    pub async fn create(
        conn: &mut PgConnection,
        project_id: i64,
        user_id: i64,
        role_id: i64,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO project_members (project_id, user_id, role_id)
            VALUES ($1, $2, $3)
            RETURNING id, project_id, user_id, role_id
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(role_id)
        .fetch_one(&mut *conn)
        .await
    }

    pub async fn exists(
        conn: &mut PgConnection,
        project_id: i64,
        user_id: i64,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM project_members WHERE project_id = $1 AND user_id = $2)",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await
    }

    /// Role the user holds in the project, or `None` when not a member
    pub async fn find_role(
        conn: &mut PgConnection,
        project_id: i64,
        user_id: i64,
    ) -> Result<Option<Role>, sqlx::Error> {
        let name: Option<String> = sqlx::query_scalar(
            r#"
            SELECT r.name
            FROM project_members pm
            JOIN roles r ON r.id = pm.role_id
            WHERE pm.project_id = $1 AND pm.user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(name.and_then(|n| n.parse::<Role>().ok()))
    }

    /// Members of a project with their profile and role, in joining order
    pub async fn list_for_project(
        conn: &mut PgConnection,
        project_id: i64,
    ) -> Result<Vec<MemberView>, sqlx::Error> {
        let rows: Vec<(i64, i64, String, String, String, Option<String>)> = sqlx::query_as(
            r#"
            SELECT pm.id, pm.user_id, r.name, u.username, u.first_name, u.last_name
            FROM project_members pm
            JOIN roles r ON r.id = pm.role_id
            JOIN users u ON u.id = pm.user_id
            WHERE pm.project_id = $1
            ORDER BY pm.id
            "#,
        )
        .bind(project_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, user_id, role, username, first_name, last_name)| {
                let role = role.parse::<Role>().ok()?;
                Some(MemberView {
                    id,
                    user_id,
                    role,
                    user: UserSummary {
                        id: user_id,
                        username,
                        first_name,
                        last_name,
                    },
                })
            })
            .collect())
    }
}

/// Submitted member entry with its role already resolved to a role id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInput {
    pub id: Option<i64>,
    pub user_id: i64,
    pub role_id: i64,
}

/// Project to membership relation
pub struct Memberships;

impl ChildSchema for Memberships {
    type Record = Membership;
    type Input = MemberInput;

    fn record_id(&self, record: &Membership) -> i64 {
        record.id
    }

    fn input_id(&self, input: &MemberInput) -> Option<i64> {
        input.id
    }

    fn matches(&self, record: &Membership, input: &MemberInput) -> bool {
        record.user_id == input.user_id && record.role_id == input.role_id
    }
}

#[async_trait]
impl ChildStore for Memberships {
    async fn load(
        &self,
        conn: &mut PgConnection,
        project_id: i64,
    ) -> Result<Vec<Membership>, sqlx::Error> {
        sqlx::query_as::<_, Membership>(
            "SELECT id, project_id, user_id, role_id FROM project_members WHERE project_id = $1 ORDER BY id",
        )
        .bind(project_id)
        .fetch_all(&mut *conn)
        .await
    }

    async fn update(
        &self,
        conn: &mut PgConnection,
        id: i64,
        input: &MemberInput,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE project_members SET user_id = $2, role_id = $3 WHERE id = $1")
            .bind(id)
            .bind(input.user_id)
            .bind(input.role_id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    async fn insert(
        &self,
        conn: &mut PgConnection,
        project_id: i64,
        input: &MemberInput,
    ) -> Result<i64, sqlx::Error> {
        let membership = Membership::create(conn, project_id, input.user_id, input.role_id).await?;
        Ok(membership.id)
    }

    async fn delete_many(
        &self,
        conn: &mut PgConnection,
        project_id: i64,
        ids: &[i64],
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND id = ANY($2)")
                .bind(project_id)
                .bind(ids)
                .execute(&mut *conn)
                .await?;

        Ok(result.rows_affected())
    }
}

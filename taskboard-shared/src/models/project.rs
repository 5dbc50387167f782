/// Project model
///
/// A project is the unit of tenancy: lists, tags and memberships hang off it
/// and are removed with it (`ON DELETE CASCADE`).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id BIGSERIAL PRIMARY KEY,
///     title VARCHAR(100) NOT NULL,
///     description VARCHAR(1000) NOT NULL DEFAULT '',
///     creator_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub creator_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Minimal projection returned by project listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectSummary {
    pub id: i64,
    pub title: String,
}

impl Project {
    pub async fn create(
        conn: &mut PgConnection,
        title: &str,
        description: &str,
        creator_id: i64,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (title, description, creator_id)
            VALUES ($1, $2, $3)
            RETURNING id, title, description, creator_id, created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(creator_id)
        .fetch_one(&mut *conn)
        .await
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, title, description, creator_id, created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
    }

    /// Takes a row lock on the project for the rest of the transaction
    ///
    /// Returns false if the project does not exist.
    pub async fn lock(conn: &mut PgConnection, id: i64) -> Result<bool, sqlx::Error> {
        let row: Option<i64> = sqlx::query_scalar("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(row.is_some())
    }

    /// Projects the user is a member of, oldest first
    pub async fn list_for_user(
        conn: &mut PgConnection,
        user_id: i64,
    ) -> Result<Vec<ProjectSummary>, sqlx::Error> {
        sqlx::query_as::<_, ProjectSummary>(
            r#"
            SELECT p.id, p.title
            FROM projects p
            JOIN project_members pm ON pm.project_id = p.id
            WHERE pm.user_id = $1
            ORDER BY p.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await
    }

    /// Overwrites title and description where given and stamps `updated_at`
    pub async fn update(
        conn: &mut PgConnection,
        id: i64,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, creator_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .fetch_optional(&mut *conn)
        .await
    }

    /// Deletes the project and, by cascade, everything under it
    pub async fn delete(conn: &mut PgConnection, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

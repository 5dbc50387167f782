/// Card comments
///
/// Only a comment's author may edit or delete it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use super::user::UserSummary;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub card_id: i64,

    /// Author
    pub user_id: i64,

    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Comment with its author's profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub user: Option<UserSummary>,
}

impl Comment {
    pub async fn create(
        conn: &mut PgConnection,
        card_id: i64,
        user_id: i64,
        description: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (card_id, user_id, description)
            VALUES ($1, $2, $3)
            RETURNING id, card_id, user_id, description, created_at, updated_at
            "#,
        )
        .bind(card_id)
        .bind(user_id)
        .bind(description)
        .fetch_one(&mut *conn)
        .await
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            "SELECT id, card_id, user_id, description, created_at, updated_at FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
    }

    /// Comments on a card, oldest first
    pub async fn list_for_card(
        conn: &mut PgConnection,
        card_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, card_id, user_id, description, created_at, updated_at
            FROM comments
            WHERE card_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(card_id)
        .fetch_all(&mut *conn)
        .await
    }

    pub async fn update_text(
        conn: &mut PgConnection,
        id: i64,
        description: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments SET description = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, card_id, user_id, description, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(description)
        .fetch_optional(&mut *conn)
        .await
    }

    pub async fn delete(conn: &mut PgConnection, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

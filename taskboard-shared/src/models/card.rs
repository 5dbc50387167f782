/// Card model
///
/// Cards live in a list. `card_number` is a human-facing number unique within
/// the card's project, assigned at creation as the project's card count plus
/// one. Deleting a card leaves a gap; numbers are never reassigned.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE cards (
///     id BIGSERIAL PRIMARY KEY,
///     list_id BIGINT NOT NULL REFERENCES lists(id) ON DELETE CASCADE,
///     card_number INTEGER NOT NULL,
///     title VARCHAR(255) NOT NULL,
///     user_id BIGINT REFERENCES users(id) ON DELETE SET NULL,
///     date TIMESTAMPTZ,
///     priority INTEGER,
///     description VARCHAR(1000),
///     planned_hours INTEGER,
///     completed_hours INTEGER,
///     story_points INTEGER,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use validator::Validate;

const CARD_COLUMNS: &str = "id, list_id, card_number, title, user_id, date, priority, description, \
     planned_hours, completed_hours, story_points, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Card {
    pub id: i64,
    pub list_id: i64,
    pub card_number: i32,
    pub title: String,

    /// Assignee
    pub user_id: Option<i64>,

    /// Due date
    pub date: Option<DateTime<Utc>>,

    pub priority: Option<i32>,
    pub description: Option<String>,
    pub planned_hours: Option<i32>,
    pub completed_hours: Option<i32>,
    pub story_points: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Card as listed on a board column
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CardSummary {
    pub id: i64,
    pub list_id: i64,
    pub card_number: i32,
    pub title: String,
    pub user_id: Option<i64>,
    pub date: Option<DateTime<Utc>>,
    pub priority: Option<i32>,
    pub story_points: Option<i32>,
}

/// Scalar card fields to overwrite; `None` leaves a column as it is
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct UpdateCard {
    #[validate(
        length(min = 1, max = 255, message = "Title must be 1 to 255 characters"),
        custom(function = "crate::validation::not_blank")
    )]
    pub title: Option<String>,
    pub user_id: Option<i64>,
    pub date: Option<DateTime<Utc>>,
    pub priority: Option<i32>,
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
    #[validate(range(min = 0, message = "Planned hours must not be negative"))]
    pub planned_hours: Option<i32>,
    #[validate(range(min = 0, message = "Completed hours must not be negative"))]
    pub completed_hours: Option<i32>,
    #[validate(range(min = 0, message = "Story points must not be negative"))]
    pub story_points: Option<i32>,
    pub list_id: Option<i64>,
}

impl UpdateCard {
    pub fn is_empty(&self) -> bool {
        *self == UpdateCard::default()
    }
}

impl Card {
    pub async fn create(
        conn: &mut PgConnection,
        list_id: i64,
        card_number: i32,
        title: &str,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO cards (list_id, card_number, title) VALUES ($1, $2, $3) RETURNING {}",
            CARD_COLUMNS
        );

        sqlx::query_as::<_, Card>(&query)
            .bind(list_id)
            .bind(card_number)
            .bind(title)
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM cards WHERE id = $1", CARD_COLUMNS);

        sqlx::query_as::<_, Card>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    pub async fn exists(conn: &mut PgConnection, id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM cards WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await
    }

    /// Number of cards across every list of the project
    pub async fn count_in_project(
        conn: &mut PgConnection,
        project_id: i64,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(c.id)
            FROM cards c
            JOIN lists l ON l.id = c.list_id
            WHERE l.project_id = $1
            "#,
        )
        .bind(project_id)
        .fetch_one(&mut *conn)
        .await
    }

    /// Overwrites the given fields and stamps `updated_at`
    pub async fn update(
        conn: &mut PgConnection,
        id: i64,
        data: &UpdateCard,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE cards SET
                title = COALESCE($2, title),
                user_id = COALESCE($3, user_id),
                date = COALESCE($4, date),
                priority = COALESCE($5, priority),
                description = COALESCE($6, description),
                planned_hours = COALESCE($7, planned_hours),
                completed_hours = COALESCE($8, completed_hours),
                story_points = COALESCE($9, story_points),
                list_id = COALESCE($10, list_id),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            CARD_COLUMNS
        );

        sqlx::query_as::<_, Card>(&query)
            .bind(id)
            .bind(&data.title)
            .bind(data.user_id)
            .bind(data.date)
            .bind(data.priority)
            .bind(&data.description)
            .bind(data.planned_hours)
            .bind(data.completed_hours)
            .bind(data.story_points)
            .bind(data.list_id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Deletes the card; comments, approvers, tag assignments and sub-tasks cascade
    pub async fn delete(conn: &mut PgConnection, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cards WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl CardSummary {
    /// Cards of every list in the project, ordered by card number
    pub async fn list_for_project(
        conn: &mut PgConnection,
        project_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CardSummary>(
            r#"
            SELECT c.id, c.list_id, c.card_number, c.title, c.user_id, c.date,
                   c.priority, c.story_points
            FROM cards c
            JOIN lists l ON l.id = c.list_id
            WHERE l.project_id = $1
            ORDER BY c.card_number, c.id
            "#,
        )
        .bind(project_id)
        .fetch_all(&mut *conn)
        .await
    }
}

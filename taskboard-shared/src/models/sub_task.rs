/// Sub-tasks: checklist items on a card
///
/// `date` is free text entered by the user, not a timestamp.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use validator::Validate;

use super::user::UserSummary;
use crate::reconcile::{ChildSchema, ChildStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubTask {
    pub id: i64,
    pub card_id: i64,
    pub title: Option<String>,
    pub date: Option<String>,
    pub completed: bool,
    pub user_id: Option<i64>,
}

/// Sub-task as shown on a card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubTaskView {
    pub id: i64,
    pub title: Option<String>,
    pub date: Option<String>,
    pub completed: bool,
    pub user_id: Option<i64>,
    pub user: Option<UserSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SubTaskInput {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    #[validate(length(max = 255, message = "Sub-task title must be at most 255 characters"))]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(length(max = 50, message = "Sub-task date must be at most 50 characters"))]
    pub date: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// Card to sub-task relation
pub struct SubTasks;

impl ChildSchema for SubTasks {
    type Record = SubTask;
    type Input = SubTaskInput;

    fn record_id(&self, record: &SubTask) -> i64 {
        record.id
    }

    fn input_id(&self, input: &SubTaskInput) -> Option<i64> {
        input.id
    }

    fn matches(&self, record: &SubTask, input: &SubTaskInput) -> bool {
        record.title == input.title
            && record.date == input.date
            && record.completed == input.completed
            && record.user_id == input.user_id
    }
}

#[async_trait]
impl ChildStore for SubTasks {
    async fn load(&self, conn: &mut PgConnection, card_id: i64) -> Result<Vec<SubTask>, sqlx::Error> {
        sqlx::query_as::<_, SubTask>(
            "SELECT id, card_id, title, date, completed, user_id FROM sub_tasks WHERE card_id = $1 ORDER BY id",
        )
        .bind(card_id)
        .fetch_all(&mut *conn)
        .await
    }

    async fn update(
        &self,
        conn: &mut PgConnection,
        id: i64,
        input: &SubTaskInput,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE sub_tasks SET title = $2, date = $3, completed = $4, user_id = $5 WHERE id = $1",
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.date)
        .bind(input.completed)
        .bind(input.user_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    async fn insert(
        &self,
        conn: &mut PgConnection,
        card_id: i64,
        input: &SubTaskInput,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            INSERT INTO sub_tasks (card_id, title, date, completed, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(card_id)
        .bind(&input.title)
        .bind(&input.date)
        .bind(input.completed)
        .bind(input.user_id)
        .fetch_one(&mut *conn)
        .await
    }

    async fn delete_many(
        &self,
        conn: &mut PgConnection,
        card_id: i64,
        ids: &[i64],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sub_tasks WHERE card_id = $1 AND id = ANY($2)")
            .bind(card_id)
            .bind(ids)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_defaults() {
        let input: SubTaskInput = serde_json::from_str(r#"{"title": "Deploy"}"#).unwrap();

        assert_eq!(input.id, None);
        assert_eq!(input.title.as_deref(), Some("Deploy"));
        assert!(!input.completed);
    }

    #[test]
    fn test_completion_toggle_counts_as_change() {
        let record = SubTask {
            id: 1,
            card_id: 9,
            title: Some("Deploy".to_string()),
            date: None,
            completed: false,
            user_id: None,
        };
        let mut input = SubTaskInput {
            id: Some(1),
            title: Some("Deploy".to_string()),
            date: None,
            completed: false,
            user_id: None,
        };

        assert!(SubTasks.matches(&record, &input));
        input.completed = true;
        assert!(!SubTasks.matches(&record, &input));
    }
}

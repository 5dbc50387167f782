/// Card approvers
///
/// An approver names who signs a card off and, optionally, for which
/// environment (e.g. "staging").

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use validator::Validate;

use super::user::UserSummary;
use crate::reconcile::{ChildSchema, ChildStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Approver {
    pub id: i64,
    pub card_id: i64,
    pub environment: Option<String>,
    pub user_id: Option<i64>,
}

/// Approver as shown on a card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproverView {
    pub id: i64,
    pub environment: Option<String>,
    pub user_id: Option<i64>,
    pub user: Option<UserSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ApproverInput {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    #[validate(length(max = 100, message = "Environment must be at most 100 characters"))]
    pub environment: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// Card to approver relation
pub struct Approvers;

impl ChildSchema for Approvers {
    type Record = Approver;
    type Input = ApproverInput;

    fn record_id(&self, record: &Approver) -> i64 {
        record.id
    }

    fn input_id(&self, input: &ApproverInput) -> Option<i64> {
        input.id
    }

    fn matches(&self, record: &Approver, input: &ApproverInput) -> bool {
        record.environment == input.environment && record.user_id == input.user_id
    }
}

#[async_trait]
impl ChildStore for Approvers {
    async fn load(&self, conn: &mut PgConnection, card_id: i64) -> Result<Vec<Approver>, sqlx::Error> {
        sqlx::query_as::<_, Approver>(
            "SELECT id, card_id, environment, user_id FROM approvers WHERE card_id = $1 ORDER BY id",
        )
        .bind(card_id)
        .fetch_all(&mut *conn)
        .await
    }

    async fn update(
        &self,
        conn: &mut PgConnection,
        id: i64,
        input: &ApproverInput,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE approvers SET environment = $2, user_id = $3 WHERE id = $1")
            .bind(id)
            .bind(&input.environment)
            .bind(input.user_id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    async fn insert(
        &self,
        conn: &mut PgConnection,
        card_id: i64,
        input: &ApproverInput,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO approvers (card_id, environment, user_id) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(card_id)
        .bind(&input.environment)
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
        let result = sqlx::query("DELETE FROM approvers WHERE card_id = $1 AND id = ANY($2)")
            .bind(card_id)
            .bind(ids)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }
}

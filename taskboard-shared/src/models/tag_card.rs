/// Tag assignments: the join rows between cards and tags

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use crate::reconcile::{ChildSchema, ChildStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TagCard {
    pub id: i64,
    pub card_id: i64,
    pub tag_id: i64,
}

/// Tag assignment with the tag's name, as shown on a card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TagCardView {
    pub id: i64,
    pub tag_id: i64,
    pub tag_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCardInput {
    #[serde(default)]
    pub id: Option<i64>,
    pub tag_id: i64,
}

impl TagCardView {
    pub async fn list_for_card(
        conn: &mut PgConnection,
        card_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TagCardView>(
            r#"
            SELECT tc.id, tc.tag_id, t.name AS tag_name
            FROM tag_cards tc
            JOIN tags t ON t.id = tc.tag_id
            WHERE tc.card_id = $1
            ORDER BY tc.id
            "#,
        )
        .bind(card_id)
        .fetch_all(&mut *conn)
        .await
    }
}

/// Card to tag assignment relation
pub struct TagAssignments;

impl ChildSchema for TagAssignments {
    type Record = TagCard;
    type Input = TagCardInput;

    fn record_id(&self, record: &TagCard) -> i64 {
        record.id
    }

    fn input_id(&self, input: &TagCardInput) -> Option<i64> {
        input.id
    }

    fn matches(&self, record: &TagCard, input: &TagCardInput) -> bool {
        record.tag_id == input.tag_id
    }
}

#[async_trait]
impl ChildStore for TagAssignments {
    async fn load(&self, conn: &mut PgConnection, card_id: i64) -> Result<Vec<TagCard>, sqlx::Error> {
        sqlx::query_as::<_, TagCard>(
            "SELECT id, card_id, tag_id FROM tag_cards WHERE card_id = $1 ORDER BY id",
        )
        .bind(card_id)
        .fetch_all(&mut *conn)
        .await
    }

    async fn update(
        &self,
        conn: &mut PgConnection,
        id: i64,
        input: &TagCardInput,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tag_cards SET tag_id = $2 WHERE id = $1")
            .bind(id)
            .bind(input.tag_id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    async fn insert(
        &self,
        conn: &mut PgConnection,
        card_id: i64,
        input: &TagCardInput,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("INSERT INTO tag_cards (card_id, tag_id) VALUES ($1, $2) RETURNING id")
            .bind(card_id)
            .bind(input.tag_id)
            .fetch_one(&mut *conn)
            .await
    }

    async fn delete_many(
        &self,
        conn: &mut PgConnection,
        card_id: i64,
        ids: &[i64],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tag_cards WHERE card_id = $1 AND id = ANY($2)")
            .bind(card_id)
            .bind(ids)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }
}

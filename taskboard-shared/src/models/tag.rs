/// Project tags
///
/// Tags belong to a project and are attached to that project's cards through
/// [`super::tag_card`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use validator::Validate;

use crate::reconcile::{ChildSchema, ChildStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TagInput {
    #[serde(default)]
    pub id: Option<i64>,
    #[validate(
        length(min = 1, max = 100, message = "Tag name must be 1 to 100 characters"),
        custom(function = "crate::validation::not_blank")
    )]
    pub name: String,
}

impl Tag {
    pub async fn list_for_project(
        conn: &mut PgConnection,
        project_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        Tags.load(conn, project_id).await
    }
}

/// Project to tag relation
pub struct Tags;

impl ChildSchema for Tags {
    type Record = Tag;
    type Input = TagInput;

    fn record_id(&self, record: &Tag) -> i64 {
        record.id
    }

    fn input_id(&self, input: &TagInput) -> Option<i64> {
        input.id
    }

    fn matches(&self, record: &Tag, input: &TagInput) -> bool {
        record.name == input.name
    }
}

#[async_trait]
impl ChildStore for Tags {
    async fn load(&self, conn: &mut PgConnection, project_id: i64) -> Result<Vec<Tag>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            "SELECT id, project_id, name FROM tags WHERE project_id = $1 ORDER BY id",
        )
        .bind(project_id)
        .fetch_all(&mut *conn)
        .await
    }

    async fn update(&self, conn: &mut PgConnection, id: i64, input: &TagInput) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tags SET name = $2 WHERE id = $1")
            .bind(id)
            .bind(&input.name)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    async fn insert(
        &self,
        conn: &mut PgConnection,
        project_id: i64,
        input: &TagInput,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("INSERT INTO tags (project_id, name) VALUES ($1, $2) RETURNING id")
            .bind(project_id)
            .bind(&input.name)
            .fetch_one(&mut *conn)
            .await
    }

    async fn delete_many(
        &self,
        conn: &mut PgConnection,
        project_id: i64,
        ids: &[i64],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tags WHERE project_id = $1 AND id = ANY($2)")
            .bind(project_id)
            .bind(ids)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }
}

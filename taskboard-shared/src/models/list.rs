/// Board lists
///
/// Lists are the columns of a project board. `position` orders them for
/// display; the API calls it `order`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE lists (
///     id BIGSERIAL PRIMARY KEY,
///     project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     name VARCHAR(100) NOT NULL,
///     position INTEGER NOT NULL DEFAULT 0
/// );
/// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use validator::Validate;

use crate::reconcile::{ChildSchema, ChildStore};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct List {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    #[serde(rename = "order")]
    pub position: i32,
}

/// Submitted list entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ListInput {
    #[serde(default)]
    pub id: Option<i64>,
    #[validate(
        length(min = 1, max = 100, message = "List name must be 1 to 100 characters"),
        custom(function = "crate::validation::not_blank")
    )]
    pub name: String,
    #[serde(default)]
    pub order: i32,
}

impl List {
    pub async fn find_by_id(conn: &mut PgConnection, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, List>("SELECT id, project_id, name, position FROM lists WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Lists of a project in display order
    pub async fn list_for_project(
        conn: &mut PgConnection,
        project_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, List>(
            "SELECT id, project_id, name, position FROM lists WHERE project_id = $1 ORDER BY position, id",
        )
        .bind(project_id)
        .fetch_all(&mut *conn)
        .await
    }
}

/// Project to list relation
pub struct Lists;

impl ChildSchema for Lists {
    type Record = List;
    type Input = ListInput;

    fn record_id(&self, record: &List) -> i64 {
        record.id
    }

    fn input_id(&self, input: &ListInput) -> Option<i64> {
        input.id
    }

    fn matches(&self, record: &List, input: &ListInput) -> bool {
        record.name == input.name && record.position == input.order
    }
}

#[async_trait]
impl ChildStore for Lists {
    async fn load(&self, conn: &mut PgConnection, project_id: i64) -> Result<Vec<List>, sqlx::Error> {
        sqlx::query_as::<_, List>(
            "SELECT id, project_id, name, position FROM lists WHERE project_id = $1 ORDER BY id",
        )
        .bind(project_id)
        .fetch_all(&mut *conn)
        .await
    }

    async fn update(
        &self,
        conn: &mut PgConnection,
        id: i64,
        input: &ListInput,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE lists SET name = $2, position = $3 WHERE id = $1")
            .bind(id)
            .bind(&input.name)
            .bind(input.order)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    async fn insert(
        &self,
        conn: &mut PgConnection,
        project_id: i64,
        input: &ListInput,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO lists (project_id, name, position) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(project_id)
        .bind(&input.name)
        .bind(input.order)
        .fetch_one(&mut *conn)
        .await
    }

    async fn delete_many(
        &self,
        conn: &mut PgConnection,
        project_id: i64,
        ids: &[i64],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM lists WHERE project_id = $1 AND id = ANY($2)")
            .bind(project_id)
            .bind(ids)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }
}

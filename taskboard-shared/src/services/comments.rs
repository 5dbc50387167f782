/// Card comments

use sqlx::PgPool;
use tracing::info;

use crate::auth::authorization::require_author;
use crate::error::{BoardError, BoardResult};
use crate::models::card::Card;
use crate::models::comment::Comment;

#[derive(Clone)]
pub struct CommentManager {
    pool: PgPool,
}

impl CommentManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Adds a comment authored by `author_id`
    pub async fn add(&self, card_id: i64, text: &str, author_id: i64) -> BoardResult<Comment> {
        let mut tx = self.pool.begin().await?;

        if !Card::exists(&mut tx, card_id).await? {
            return Err(BoardError::NotFound("Card"));
        }

        let comment = Comment::create(&mut tx, card_id, author_id, text).await?;
        tx.commit().await?;

        info!(comment_id = comment.id, card_id, "Comment added");
        Ok(comment)
    }

    /// Replaces the text; only the author may
    pub async fn update(&self, comment_id: i64, text: &str, caller_id: i64) -> BoardResult<Comment> {
        let mut tx = self.pool.begin().await?;

        let comment = Comment::find_by_id(&mut tx, comment_id)
            .await?
            .ok_or(BoardError::NotFound("Comment"))?;

        require_author(caller_id, comment.user_id)?;

        let updated = Comment::update_text(&mut tx, comment_id, text)
            .await?
            .ok_or(BoardError::NotFound("Comment"))?;
        tx.commit().await?;

        info!(comment_id, "Comment updated");
        Ok(updated)
    }

    /// Removes the comment; only the author may
    pub async fn delete(&self, comment_id: i64, caller_id: i64) -> BoardResult<()> {
        let mut tx = self.pool.begin().await?;

        let comment = Comment::find_by_id(&mut tx, comment_id)
            .await?
            .ok_or(BoardError::NotFound("Comment"))?;

        require_author(caller_id, comment.user_id)?;

        Comment::delete(&mut tx, comment_id).await?;
        tx.commit().await?;

        info!(comment_id, "Comment deleted");
        Ok(())
    }
}

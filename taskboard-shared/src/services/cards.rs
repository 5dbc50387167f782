/// Cards and their nested collections

use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};
use validator::Validate;

use crate::error::{BoardError, BoardResult};
use crate::models::approver::{ApproverInput, ApproverView, Approvers};
use crate::models::card::{Card, UpdateCard};
use crate::models::comment::{Comment, CommentView};
use crate::models::list::List;
use crate::models::project::Project;
use crate::models::sub_task::{SubTaskInput, SubTaskView, SubTasks};
use crate::models::tag_card::{TagAssignments, TagCardInput, TagCardView};
use crate::models::user::UserSummary;
use crate::reconcile::{reconcile, ChildStore, ReconcileOutcome};

/// Card changes
///
/// Scalar fields follow partial-update rules. Each collection, when present
/// (even empty), is the complete desired set; when absent it is left alone.
///
/// `validate` covers the collections only; the flattened scalar fields are
/// checked with `fields.validate()` so their errors keep top-level names.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CardPatch {
    #[serde(flatten)]
    pub fields: UpdateCard,

    #[serde(default)]
    pub tag_cards: Option<Vec<TagCardInput>>,

    #[serde(default)]
    #[validate(nested)]
    pub approvers: Option<Vec<ApproverInput>>,

    #[serde(default)]
    #[validate(nested)]
    pub tasks_card: Option<Vec<SubTaskInput>>,
}

/// A card with every nested collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardDetail {
    #[serde(flatten)]
    pub card: Card,

    /// Assignee profile
    pub user: Option<UserSummary>,

    pub tag_cards: Vec<TagCardView>,
    pub approvers: Vec<ApproverView>,

    /// Oldest first
    pub comments: Vec<CommentView>,

    pub tasks_card: Vec<SubTaskView>,
}

#[derive(Clone)]
pub struct CardManager {
    pool: PgPool,
}

impl CardManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a card in a list and numbers it within the list's project
    ///
    /// The project row is locked for the rest of the transaction so that
    /// concurrent creations in one project are numbered one after another.
    pub async fn create(&self, list_id: i64, title: &str) -> BoardResult<Card> {
        let mut tx = self.pool.begin().await?;

        let list = List::find_by_id(&mut tx, list_id)
            .await?
            .ok_or(BoardError::NotFound("List"))?;

        if !Project::lock(&mut tx, list.project_id).await? {
            return Err(BoardError::NotFound("Project"));
        }

        let existing = Card::count_in_project(&mut tx, list.project_id).await?;
        let card_number = i32::try_from(existing + 1)
            .map_err(|_| BoardError::Validation("Project card numbers exhausted".to_string()))?;

        let card = Card::create(&mut tx, list_id, card_number, title).await?;
        tx.commit().await?;

        info!(
            card_id = card.id,
            card_number,
            project_id = list.project_id,
            "Card created"
        );
        Ok(card)
    }

    pub async fn get(&self, card_id: i64) -> BoardResult<CardDetail> {
        let mut tx = self.pool.begin().await?;

        let card = Card::find_by_id(&mut tx, card_id)
            .await?
            .ok_or(BoardError::NotFound("Card"))?;
        let detail = load_detail(&mut tx, card).await?;

        tx.commit().await?;
        Ok(detail)
    }

    /// Applies a patch in one transaction
    pub async fn update(&self, card_id: i64, patch: CardPatch) -> BoardResult<CardDetail> {
        let mut tx = self.pool.begin().await?;

        if !Card::exists(&mut tx, card_id).await? {
            return Err(BoardError::NotFound("Card"));
        }

        if let Some(list_id) = patch.fields.list_id {
            if List::find_by_id(&mut tx, list_id).await?.is_none() {
                return Err(BoardError::NotFound("List"));
            }
        }

        let card = Card::update(&mut tx, card_id, &patch.fields)
            .await?
            .ok_or(BoardError::NotFound("Card"))?;

        if let Some(tag_cards) = &patch.tag_cards {
            let outcome = reconcile(&TagAssignments, &mut tx, card_id, tag_cards).await?;
            log_outcome(card_id, "tag_cards", outcome);
        }

        if let Some(approvers) = &patch.approvers {
            let outcome = reconcile(&Approvers, &mut tx, card_id, approvers).await?;
            log_outcome(card_id, "approvers", outcome);
        }

        if let Some(tasks) = &patch.tasks_card {
            let outcome = reconcile(&SubTasks, &mut tx, card_id, tasks).await?;
            log_outcome(card_id, "tasks_card", outcome);
        }

        let detail = load_detail(&mut tx, card).await?;
        tx.commit().await?;

        info!(card_id, "Card updated");
        Ok(detail)
    }

    /// Deletes a card together with everything attached to it
    pub async fn delete(&self, card_id: i64) -> BoardResult<()> {
        let mut tx = self.pool.begin().await?;

        if !Card::delete(&mut tx, card_id).await? {
            return Err(BoardError::NotFound("Card"));
        }

        tx.commit().await?;

        info!(card_id, "Card deleted");
        Ok(())
    }
}

fn log_outcome(card_id: i64, relation: &'static str, outcome: ReconcileOutcome) {
    debug!(
        card_id,
        relation,
        updated = outcome.updated,
        inserted = outcome.inserted,
        deleted = outcome.deleted,
        "Reconciled card collection"
    );
}

async fn load_detail(conn: &mut PgConnection, card: Card) -> BoardResult<CardDetail> {
    let tag_cards = TagCardView::list_for_card(&mut *conn, card.id).await?;
    let approvers = Approvers.load(&mut *conn, card.id).await?;
    let tasks = SubTasks.load(&mut *conn, card.id).await?;
    let comments = Comment::list_for_card(&mut *conn, card.id).await?;

    let mut user_ids: Vec<i64> = card.user_id.into_iter().collect();
    user_ids.extend(approvers.iter().filter_map(|a| a.user_id));
    user_ids.extend(tasks.iter().filter_map(|t| t.user_id));
    user_ids.extend(comments.iter().map(|c| c.user_id));
    user_ids.sort_unstable();
    user_ids.dedup();

    let users = UserSummary::find_many(&mut *conn, &user_ids).await?;
    let profile = |id: Option<i64>| id.and_then(|id| users.get(&id).cloned());

    Ok(CardDetail {
        user: profile(card.user_id),
        tag_cards,
        approvers: approvers
            .into_iter()
            .map(|a| ApproverView {
                user: profile(a.user_id),
                id: a.id,
                environment: a.environment,
                user_id: a.user_id,
            })
            .collect(),
        comments: comments
            .into_iter()
            .map(|c| CommentView {
                user: profile(Some(c.user_id)),
                id: c.id,
                description: c.description,
                created_at: c.created_at,
                updated_at: c.updated_at,
            })
            .collect(),
        tasks_card: tasks
            .into_iter()
            .map(|t| SubTaskView {
                user: profile(t.user_id),
                id: t.id,
                title: t.title,
                date: t.date,
                completed: t.completed,
                user_id: t.user_id,
            })
            .collect(),
        card,
    })
}

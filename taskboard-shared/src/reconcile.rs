/// Nested collection reconciliation
///
/// Several update requests carry the complete desired state of a child
/// collection: the tags on a card, its approvers and sub-tasks, the lists,
/// tags and members of a project. Each submitted item either names an existing
/// child by id or is new. Reconciling applies that state to the database:
///
/// 1. submitted items whose id matches an existing child overwrite its fields
/// 2. items without an id, or with an id that is not among the existing
///    children, are inserted under the parent
/// 3. existing children not named by any submitted item are deleted
///
/// The algorithm lives here once. Each relation only describes its schema
/// ([`ChildSchema`]) and its SQL ([`ChildStore`]).
///
/// Matched children whose fields already equal the submitted values are not
/// written, so submitting the current state again changes no rows.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::sub_task::{SubTaskInput, SubTasks};
/// use taskboard_shared::reconcile::reconcile;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, card_id: i64) -> Result<(), Box<dyn std::error::Error>> {
/// let mut tx = pool.begin().await?;
///
/// let submitted = vec![SubTaskInput {
///     id: None,
///     title: Some("Write release notes".to_string()),
///     date: None,
///     completed: false,
///     user_id: None,
/// }];
///
/// let outcome = reconcile(&SubTasks, &mut tx, card_id, &submitted).await?;
/// tx.commit().await?;
///
/// println!("{} inserted, {} deleted", outcome.inserted, outcome.deleted);
/// # Ok(())
/// # }
/// ```

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::PgConnection;

/// Shape of one parent-to-children relation
pub trait ChildSchema {
    /// Row as loaded from the database
    type Record: Send + Sync;

    /// Item as submitted by the client
    type Input: Send + Sync;

    fn record_id(&self, record: &Self::Record) -> i64;

    /// Id the client referenced, if any
    fn input_id(&self, input: &Self::Input) -> Option<i64>;

    /// True when `record` already holds the values in `input`
    fn matches(&self, record: &Self::Record, input: &Self::Input) -> bool;
}

/// Persistence of one relation
///
/// All methods run on the caller's connection, normally a transaction.
#[async_trait]
pub trait ChildStore: ChildSchema + Sync {
    /// Loads the children currently attached to `parent_id`
    async fn load(
        &self,
        conn: &mut PgConnection,
        parent_id: i64,
    ) -> Result<Vec<Self::Record>, sqlx::Error>;

    /// Overwrites the mutable fields of child `id`
    async fn update(
        &self,
        conn: &mut PgConnection,
        id: i64,
        input: &Self::Input,
    ) -> Result<(), sqlx::Error>;

    /// Inserts a new child under `parent_id` and returns its id
    async fn insert(
        &self,
        conn: &mut PgConnection,
        parent_id: i64,
        input: &Self::Input,
    ) -> Result<i64, sqlx::Error>;

    /// Deletes the given children of `parent_id`
    async fn delete_many(
        &self,
        conn: &mut PgConnection,
        parent_id: i64,
        ids: &[i64],
    ) -> Result<u64, sqlx::Error>;
}

/// Row changes needed to turn the existing children into the submitted set
#[derive(Debug)]
pub struct ReconcilePlan<'a, I> {
    /// Matched children whose fields differ, with the values to write
    pub updates: Vec<(i64, &'a I)>,

    /// Items to insert, in submission order
    pub inserts: Vec<&'a I>,

    /// Existing children that were not submitted
    pub deletes: Vec<i64>,
}

impl<I> ReconcilePlan<'_, I> {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.inserts.is_empty() && self.deletes.is_empty()
    }
}

/// Counts of rows touched by [`reconcile`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub updated: usize,
    pub inserted: usize,
    pub deleted: usize,
}

impl ReconcileOutcome {
    pub fn is_noop(&self) -> bool {
        self.updated == 0 && self.inserted == 0 && self.deleted == 0
    }
}

/// Computes the changes without touching the database
///
/// When the same existing id is submitted more than once, the last occurrence
/// provides the values.
pub fn plan<'a, S>(
    schema: &S,
    existing: &[S::Record],
    submitted: &'a [S::Input],
) -> ReconcilePlan<'a, S::Input>
where
    S: ChildSchema + ?Sized,
{
    let existing_ids: HashSet<i64> = existing.iter().map(|r| schema.record_id(r)).collect();

    let mut matched: Vec<(i64, &'a S::Input)> = Vec::new();
    let mut inserts = Vec::new();

    for input in submitted {
        match schema.input_id(input) {
            Some(id) if existing_ids.contains(&id) => {
                match matched.iter_mut().find(|(matched_id, _)| *matched_id == id) {
                    Some(slot) => slot.1 = input,
                    None => matched.push((id, input)),
                }
            }
            _ => inserts.push(input),
        }
    }

    let kept: HashSet<i64> = matched.iter().map(|(id, _)| *id).collect();

    let updates = matched
        .into_iter()
        .filter(|(id, input)| {
            existing
                .iter()
                .find(|r| schema.record_id(r) == *id)
                .map(|record| !schema.matches(record, input))
                .unwrap_or(false)
        })
        .collect();

    let deletes = existing
        .iter()
        .map(|r| schema.record_id(r))
        .filter(|id| !kept.contains(id))
        .collect();

    ReconcilePlan {
        updates,
        inserts,
        deletes,
    }
}

/// Loads the children of `parent_id`, plans and applies the changes
///
/// Deletes run first so a submitted item may take over a unique key that an
/// omitted child held. Any failure leaves the enclosing transaction to roll
/// back.
pub async fn reconcile<S>(
    store: &S,
    conn: &mut PgConnection,
    parent_id: i64,
    submitted: &[S::Input],
) -> Result<ReconcileOutcome, sqlx::Error>
where
    S: ChildStore,
{
    let existing = store.load(&mut *conn, parent_id).await?;
    let plan = plan(store, &existing, submitted);

    if plan.is_empty() {
        return Ok(ReconcileOutcome::default());
    }

    let mut outcome = ReconcileOutcome::default();

    if !plan.deletes.is_empty() {
        outcome.deleted = store.delete_many(&mut *conn, parent_id, &plan.deletes).await? as usize;
    }

    for (id, input) in &plan.updates {
        store.update(&mut *conn, *id, input).await?;
        outcome.updated += 1;
    }

    for input in &plan.inserts {
        store.insert(&mut *conn, parent_id, input).await?;
        outcome.inserted += 1;
    }

    Ok(outcome)
}

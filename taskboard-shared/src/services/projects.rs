/// Projects, their lists and tags, and membership management

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use tracing::info;
use validator::Validate;

use crate::auth::authorization::{require_creator, require_membership, require_role, AuthzError};
use crate::error::{BoardError, BoardResult};
use crate::models::card::CardSummary;
use crate::models::list::{List, ListInput, Lists};
use crate::models::membership::{MemberInput, MemberView, Membership, Memberships};
use crate::models::project::{Project, ProjectSummary};
use crate::models::role::{Role, RoleDirectory};
use crate::models::tag::{Tag, TagInput, Tags};
use crate::models::user::UserSummary;
use crate::reconcile::reconcile;

/// Project changes; `None` leaves a field or collection untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProjectPatch {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 100, message = "Title must be 1 to 100 characters"),
        custom(function = "crate::validation::not_blank")
    )]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    /// Complete desired set of lists
    #[serde(default)]
    #[validate(nested)]
    pub lists: Option<Vec<ListInput>>,

    /// Complete desired set of tags
    #[serde(default)]
    #[validate(nested)]
    pub tags: Option<Vec<TagInput>>,
}

/// Submitted member entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberAssignment {
    #[serde(default)]
    pub id: Option<i64>,
    pub user_id: i64,
    pub role: Role,
}

/// Board column with its cards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListView {
    pub id: i64,
    pub name: String,
    pub order: i32,
    pub cards: Vec<CardSummary>,
}

/// Everything a board screen needs about one project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub creator: UserSummary,
    pub lists: Vec<ListView>,
    pub members: Vec<MemberView>,
    pub tags: Vec<Tag>,
}

#[derive(Clone)]
pub struct ProjectManager {
    pool: PgPool,
}

impl ProjectManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a project and enrols its creator as SuperAdmin
    ///
    /// # Errors
    ///
    /// `Configuration` when the roles have not been seeded.
    pub async fn create(&self, title: &str, description: &str, creator_id: i64) -> BoardResult<Project> {
        let mut tx = self.pool.begin().await?;

        let roles = RoleDirectory::load(&mut tx).await?;
        let super_admin = roles.require_id(Role::SuperAdmin)?;

        let project = Project::create(&mut tx, title, description, creator_id).await?;
        Membership::create(&mut tx, project.id, creator_id, super_admin).await?;

        tx.commit().await?;

        info!(project_id = project.id, creator_id, "Project created");
        Ok(project)
    }

    /// Loads a project for one of its members
    ///
    /// # Errors
    ///
    /// `NotFound` when the project does not exist or the user is not a member.
    pub async fn get_for_user(&self, project_id: i64, user_id: i64) -> BoardResult<ProjectDetail> {
        let mut tx = self.pool.begin().await?;

        require_membership(&mut tx, project_id, user_id).await?;
        let detail = load_detail(&mut tx, project_id).await?;

        tx.commit().await?;
        Ok(detail)
    }

    /// Projects the user belongs to, as `(id, title)` pairs
    pub async fn list_for_user(&self, user_id: i64) -> BoardResult<Vec<ProjectSummary>> {
        let mut conn = self.pool.acquire().await?;
        Ok(Project::list_for_user(&mut conn, user_id).await?)
    }

    /// Updates title and description and reconciles lists and tags
    ///
    /// Only members may update a project.
    pub async fn update(
        &self,
        project_id: i64,
        caller_id: i64,
        patch: ProjectPatch,
    ) -> BoardResult<ProjectDetail> {
        let mut tx = self.pool.begin().await?;

        require_membership(&mut tx, project_id, caller_id).await?;

        Project::update(
            &mut tx,
            project_id,
            patch.title.as_deref(),
            patch.description.as_deref(),
        )
        .await?
        .ok_or(BoardError::NotFound("Project"))?;

        if let Some(lists) = &patch.lists {
            let outcome = reconcile(&Lists, &mut tx, project_id, lists).await?;
            info!(
                project_id,
                updated = outcome.updated,
                inserted = outcome.inserted,
                deleted = outcome.deleted,
                "Reconciled project lists"
            );
        }

        if let Some(tags) = &patch.tags {
            let outcome = reconcile(&Tags, &mut tx, project_id, tags).await?;
            info!(
                project_id,
                updated = outcome.updated,
                inserted = outcome.inserted,
                deleted = outcome.deleted,
                "Reconciled project tags"
            );
        }

        let detail = load_detail(&mut tx, project_id).await?;
        tx.commit().await?;

        Ok(detail)
    }

    /// Deletes a project; only its creator may
    pub async fn delete(&self, project_id: i64, caller_id: i64) -> BoardResult<()> {
        let mut tx = self.pool.begin().await?;

        let project = Project::find_by_id(&mut tx, project_id)
            .await?
            .ok_or(BoardError::NotFound("Project"))?;

        require_creator(caller_id, project.creator_id)?;

        Project::delete(&mut tx, project_id).await?;
        tx.commit().await?;

        info!(project_id, "Project deleted");
        Ok(())
    }

    /// Replaces the member list
    ///
    /// # Errors
    ///
    /// `Forbidden` unless the caller is an Admin or SuperAdmin of the project.
    pub async fn update_members(
        &self,
        project_id: i64,
        members: Vec<MemberAssignment>,
        caller_id: i64,
    ) -> BoardResult<Vec<MemberView>> {
        let mut tx = self.pool.begin().await?;

        require_role(&mut tx, project_id, caller_id, Role::Admin)
            .await
            .map_err(|e| match e {
                AuthzError::NotMember(_) => BoardError::forbidden(
                    "Only Admins or SuperAdmins can change project members",
                ),
                other => other.into(),
            })?;

        if let Some(user_id) = duplicate_member(&members) {
            return Err(BoardError::Validation(format!(
                "User {} is listed more than once",
                user_id
            )));
        }

        let roles = RoleDirectory::load(&mut tx).await?;
        let inputs = members
            .iter()
            .map(|m| {
                Ok(MemberInput {
                    id: m.id,
                    user_id: m.user_id,
                    role_id: roles.require_id(m.role)?,
                })
            })
            .collect::<BoardResult<Vec<_>>>()?;

        let outcome = reconcile(&Memberships, &mut tx, project_id, &inputs).await?;
        let members = Membership::list_for_project(&mut tx, project_id).await?;

        tx.commit().await?;

        info!(
            project_id,
            updated = outcome.updated,
            inserted = outcome.inserted,
            deleted = outcome.deleted,
            "Reconciled project members"
        );
        Ok(members)
    }
}

/// First user that would hold two memberships after the submission is applied
///
/// Entries sharing an id collapse to the last one, as reconciliation does.
fn duplicate_member(members: &[MemberAssignment]) -> Option<i64> {
    let mut by_id = HashMap::new();
    let mut new_users = Vec::new();

    for member in members {
        match member.id {
            Some(id) => {
                by_id.insert(id, member.user_id);
            }
            None => new_users.push(member.user_id),
        }
    }

    let mut seen = HashSet::new();
    by_id
        .into_values()
        .chain(new_users)
        .find(|user_id| !seen.insert(*user_id))
}

async fn load_detail(conn: &mut PgConnection, project_id: i64) -> BoardResult<ProjectDetail> {
    let project = Project::find_by_id(&mut *conn, project_id)
        .await?
        .ok_or(BoardError::NotFound("Project"))?;

    let creator = UserSummary::find_by_id(&mut *conn, project.creator_id)
        .await?
        .ok_or(BoardError::NotFound("User"))?;

    let lists = List::list_for_project(&mut *conn, project_id).await?;
    let cards = CardSummary::list_for_project(&mut *conn, project_id).await?;
    let members = Membership::list_for_project(&mut *conn, project_id).await?;
    let tags = Tag::list_for_project(&mut *conn, project_id).await?;

    Ok(ProjectDetail {
        project,
        creator,
        lists: group_cards(lists, cards),
        members,
        tags,
    })
}

fn group_cards(lists: Vec<List>, cards: Vec<CardSummary>) -> Vec<ListView> {
    let mut by_list: HashMap<i64, Vec<CardSummary>> = HashMap::new();
    for card in cards {
        by_list.entry(card.list_id).or_default().push(card);
    }

    lists
        .into_iter()
        .map(|list| ListView {
            cards: by_list.remove(&list.id).unwrap_or_default(),
            id: list.id,
            name: list.name,
            order: list.position,
        })
        .collect()
}

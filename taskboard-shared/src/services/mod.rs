/// Resource managers
///
/// Each manager owns a handle to the pool and runs every operation in its own
/// transaction: authorization checks, reads and writes either all take effect
/// or none do. Failures are reported as [`crate::error::BoardError`].
///
/// - [`users::UserManager`]: sign-up, login, profile, password reset
/// - [`projects::ProjectManager`]: projects, lists, tags, members
/// - [`cards::CardManager`]: cards with tag assignments, approvers, sub-tasks
/// - [`comments::CommentManager`]: comments on cards
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::services::{cards::CardManager, projects::ProjectManager};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, user_id: i64, list_id: i64) -> Result<(), Box<dyn std::error::Error>> {
/// let projects = ProjectManager::new(pool.clone());
/// let project = projects.create("Launch", "Website relaunch", user_id).await?;
///
/// let cards = CardManager::new(pool);
/// let card = cards.create(list_id, "Write copy").await?;
/// println!("{} #{}", project.title, card.card_number);
/// # Ok(())
/// # }
/// ```

pub mod cards;
pub mod comments;
pub mod projects;
pub mod users;

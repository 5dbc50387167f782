/// Seed data
///
/// The role catalogue is inserted exactly once. If the `roles` table already
/// holds any row the seed step does nothing, so it is safe to call on every
/// start-up.

use sqlx::postgres::PgPool;
use tracing::info;

use crate::models::role::Role;

/// What [`seed_roles`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Inserted(usize),
    Skipped,
}

/// Inserts SuperAdmin, Admin, Leader and User unless roles already exist
pub async fn seed_roles(pool: &PgPool) -> Result<SeedOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    // Serialise concurrent starters so only one of them inserts.
    sqlx::query("LOCK TABLE roles IN SHARE ROW EXCLUSIVE MODE")
        .execute(&mut *tx)
        .await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles")
        .fetch_one(&mut *tx)
        .await?;

    if existing > 0 {
        info!(existing, "Roles already seeded, skipping");
        return Ok(SeedOutcome::Skipped);
    }

    for role in Role::ALL {
        sqlx::query("INSERT INTO roles (name) VALUES ($1)")
            .bind(role.as_str())
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    info!(count = Role::ALL.len(), "Seeded roles");
    Ok(SeedOutcome::Inserted(Role::ALL.len()))
}

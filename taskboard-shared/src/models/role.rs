/// Project roles
///
/// The `roles` table holds one row per [`Role`] variant, inserted once by
/// [`crate::db::seed::seed_roles`]. Memberships reference those rows by id;
/// [`RoleDirectory`] translates between the two representations.
///
/// # Hierarchy
///
/// `SuperAdmin > Admin > Leader > User`
///
/// Only `Admin` and `SuperAdmin` may change a project's member list. The
/// creator of a project is always enrolled as `SuperAdmin`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use crate::error::BoardError;

/// Role of a user within one project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    SuperAdmin,
    Admin,
    Leader,
    User,
}

impl Role {
    /// Every role, highest first
    pub const ALL: [Role; 4] = [Role::SuperAdmin, Role::Admin, Role::Leader, Role::User];

    /// Name stored in the `roles` table
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SuperAdmin",
            Role::Admin => "Admin",
            Role::Leader => "Leader",
            Role::User => "User",
        }
    }

    /// True when this role ranks at least as high as `required`
    pub fn has_permission(&self, required: &Role) -> bool {
        self.permission_level() >= required.permission_level()
    }

    /// Admins and super admins manage the member list
    pub fn can_manage_members(&self) -> bool {
        self.has_permission(&Role::Admin)
    }

    fn permission_level(&self) -> u8 {
        match self {
            Role::SuperAdmin => 4,
            Role::Admin => 3,
            Role::Leader => 2,
            Role::User => 1,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("Unknown role: {}", s))
    }
}

/// Role ids as seeded in the current database
#[derive(Debug, Clone)]
pub struct RoleDirectory {
    entries: Vec<(i64, Role)>,
}

impl RoleDirectory {
    /// Reads the role catalogue
    ///
    /// # Errors
    ///
    /// `BoardError::Configuration` when any role has not been seeded.
    pub async fn load(conn: &mut PgConnection) -> Result<Self, BoardError> {
        let rows: Vec<(i64, String)> = sqlx::query_as("SELECT id, name FROM roles")
            .fetch_all(&mut *conn)
            .await?;

        let entries: Vec<(i64, Role)> = rows
            .into_iter()
            .filter_map(|(id, name)| name.parse::<Role>().ok().map(|role| (id, role)))
            .collect();

        let directory = Self { entries };

        for role in Role::ALL {
            if directory.id_of(role).is_none() {
                return Err(BoardError::Configuration(format!(
                    "Role '{}' has not been seeded",
                    role
                )));
            }
        }

        Ok(directory)
    }

    #[cfg(test)]
    pub(crate) fn from_entries(entries: Vec<(i64, Role)>) -> Self {
        Self { entries }
    }

    pub fn id_of(&self, role: Role) -> Option<i64> {
        self.entries
            .iter()
            .find(|(_, r)| *r == role)
            .map(|(id, _)| *id)
    }

    pub fn role_of(&self, id: i64) -> Option<Role> {
        self.entries
            .iter()
            .find(|(role_id, _)| *role_id == id)
            .map(|(_, role)| *role)
    }

    /// Same as [`Self::id_of`] but fails with `Configuration`
    pub fn require_id(&self, role: Role) -> Result<i64, BoardError> {
        self.id_of(role).ok_or_else(|| {
            BoardError::Configuration(format!("Role '{}' has not been seeded", role))
        })
    }
}

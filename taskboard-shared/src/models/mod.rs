/// Database models
///
/// One module per table. Functions take `&mut PgConnection` so that a manager
/// can run a whole operation inside a single transaction (`&mut *tx`).
///
/// Modules that own a child collection also define its reconciliation relation
/// (see [`crate::reconcile`]):
///
/// | relation | parent | module |
/// |---|---|---|
/// | [`list::Lists`] | project | `list` |
/// | [`tag::Tags`] | project | `tag` |
/// | [`membership::Memberships`] | project | `membership` |
/// | [`tag_card::TagAssignments`] | card | `tag_card` |
/// | [`approver::Approvers`] | card | `approver` |
/// | [`sub_task::SubTasks`] | card | `sub_task` |

pub mod approver;
pub mod card;
pub mod comment;
pub mod list;
pub mod membership;
pub mod project;
pub mod role;
pub mod sub_task;
pub mod tag;
pub mod tag_card;
pub mod user;

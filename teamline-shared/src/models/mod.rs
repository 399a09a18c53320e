/// Database models and queries
///
/// One module per entity, each owning its table's queries:
///
/// - `user`: accounts, roles, the first-administrator bootstrap
/// - `team`: teams and ownership transfer
/// - `membership`: the user<->team association
/// - `task`: team tasks and their lifecycle
/// - `meeting`: meetings and participants
/// - `evaluation`: per-task performance scores
/// - `calendar`: read-only projection of deadlines and meetings

pub mod calendar;
pub mod evaluation;
pub mod meeting;
pub mod membership;
pub mod task;
pub mod team;
pub mod user;

/// Declarative authorization policy
///
/// Every mutating or scoped operation maps to a [`Capability`]. Each
/// capability is granted by a static list of [`Grant`]s: either holding a
/// role, or standing in an ownership [`Relation`] to the resource (being the
/// user themselves, the owning team's owner, a member of the owning team, the
/// task's assignee, or the resource creator).
///
/// Handlers compute which relations actually hold for the request, then call
/// [`require`]. Keeping the whole rule set in one table makes the permission
/// model auditable in a single screen instead of scattered conditionals.
///
/// # Example
///
/// ```
/// use teamline_shared::auth::policy::{require, Capability, Relations};
/// use teamline_shared::models::user::Role;
///
/// // An assignee may move their own task through the board...
/// let rels = Relations { assignee: true, ..Default::default() };
/// assert!(require(Role::Employee, rels, Capability::ChangeTaskStatus).is_ok());
///
/// // ...an unrelated employee may not.
/// assert!(require(Role::Employee, Relations::default(), Capability::ChangeTaskStatus).is_err());
/// ```

use crate::models::user::Role;

/// Operations gated by the policy table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    // Users
    ListUsers,
    ViewUser,
    UpdateUser,
    AssignRole,
    DeactivateUser,

    // Teams
    CreateTeam,
    ViewTeam,
    UpdateTeam,
    DeleteTeam,
    ManageMembers,
    TransferTeam,

    // Tasks
    CreateTask,
    ViewTask,
    UpdateTask,
    ChangeTaskStatus,
    AssignTask,
    DeleteTask,

    // Meetings
    CreateMeeting,
    ViewMeeting,
    UpdateMeeting,
    DeleteMeeting,
    ManageParticipants,

    // Evaluations
    CreateEvaluation,
    ViewEvaluation,
    UpdateEvaluation,
}

/// Ownership relation between the acting user and the resource
///
/// Which relations are meaningful depends on the resource: `Assignee` only
/// applies to tasks, `Creator` to tasks, meetings, and evaluations (the
/// evaluator), `SelfUser` to user- and evaluation-shaped resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// The resource is the acting user (or evaluates them)
    SelfUser,

    /// The acting user owns the resource's team
    TeamOwner,

    /// The acting user is a member of the resource's team
    TeamMember,

    /// The acting user is the task's assignee
    Assignee,

    /// The acting user created the resource
    Creator,
}

/// A single entry in a capability's grant list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    /// Granted to everyone holding this role
    Role(Role),

    /// Granted to anyone standing in this relation to the resource
    Relation(Relation),
}

use Grant::Relation as Rel;
use Grant::Role as Is;
use Relation::{Assignee, Creator, SelfUser, TeamMember, TeamOwner};
use Role::{Administrator, Manager};

impl Capability {
    /// The grant list for this capability
    ///
    /// Administrators appear in every list; the table spells that out rather
    /// than special-casing the role in code, so the printed table is the
    /// complete permission model.
    pub fn grants(&self) -> &'static [Grant] {
        match self {
            // Users
            Capability::ListUsers => &[Is(Administrator), Is(Manager)],
            Capability::ViewUser => &[Is(Administrator), Is(Manager), Rel(SelfUser), Rel(TeamMember)],
            Capability::UpdateUser => &[Is(Administrator), Rel(SelfUser)],
            Capability::AssignRole => &[Is(Administrator)],
            Capability::DeactivateUser => &[Is(Administrator)],

            // Teams
            Capability::CreateTeam => &[Is(Administrator), Is(Manager)],
            Capability::ViewTeam => &[Is(Administrator), Is(Manager), Rel(TeamOwner), Rel(TeamMember)],
            Capability::UpdateTeam => &[Is(Administrator), Rel(TeamOwner)],
            Capability::DeleteTeam => &[Is(Administrator), Rel(TeamOwner)],
            Capability::ManageMembers => &[Is(Administrator), Is(Manager), Rel(TeamOwner)],
            Capability::TransferTeam => &[Is(Administrator), Rel(TeamOwner)],

            // Tasks
            Capability::CreateTask => &[Is(Administrator), Is(Manager), Rel(TeamOwner), Rel(TeamMember)],
            Capability::ViewTask => &[
                Is(Administrator),
                Is(Manager),
                Rel(TeamOwner),
                Rel(TeamMember),
                Rel(Assignee),
                Rel(Creator),
            ],
            Capability::UpdateTask => &[Is(Administrator), Is(Manager), Rel(TeamOwner), Rel(Creator)],
            Capability::ChangeTaskStatus => &[Is(Administrator), Rel(TeamOwner), Rel(Assignee)],
            Capability::AssignTask => &[Is(Administrator), Is(Manager), Rel(TeamOwner)],
            Capability::DeleteTask => &[Is(Administrator), Rel(TeamOwner), Rel(Creator)],

            // Meetings
            Capability::CreateMeeting => &[Is(Administrator), Is(Manager), Rel(TeamOwner), Rel(TeamMember)],
            Capability::ViewMeeting => &[Is(Administrator), Is(Manager), Rel(TeamOwner), Rel(TeamMember)],
            Capability::UpdateMeeting => &[Is(Administrator), Rel(TeamOwner), Rel(Creator)],
            Capability::DeleteMeeting => &[Is(Administrator), Rel(TeamOwner), Rel(Creator)],
            Capability::ManageParticipants => &[Is(Administrator), Rel(TeamOwner), Rel(Creator)],

            // Evaluations
            Capability::CreateEvaluation => &[Is(Administrator), Is(Manager), Rel(TeamOwner)],
            Capability::ViewEvaluation => &[
                Is(Administrator),
                Is(Manager),
                Rel(TeamOwner),
                Rel(SelfUser),
                Rel(Creator),
            ],
            Capability::UpdateEvaluation => &[Is(Administrator), Rel(TeamOwner), Rel(Creator)],
        }
    }
}

/// Which ownership relations hold between the acting user and the resource
///
/// Computed by the handler from already-loaded rows; the policy table itself
/// never touches the database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Relations {
    pub self_user: bool,
    pub team_owner: bool,
    pub team_member: bool,
    pub assignee: bool,
    pub creator: bool,
}

impl Relations {
    fn holds(&self, relation: Relation) -> bool {
        match relation {
            Relation::SelfUser => self.self_user,
            Relation::TeamOwner => self.team_owner,
            Relation::TeamMember => self.team_member,
            Relation::Assignee => self.assignee,
            Relation::Creator => self.creator,
        }
    }
}

/// Error type for policy checks
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// No grant in the capability's list was satisfied
    #[error("Insufficient permissions for {capability:?}")]
    Forbidden { capability: Capability },
}

/// Checks whether a role/relation combination satisfies a capability
pub fn is_allowed(role: Role, relations: Relations, capability: Capability) -> bool {
    capability.grants().iter().any(|grant| match grant {
        Grant::Role(required) => role == *required,
        Grant::Relation(relation) => relations.holds(*relation),
    })
}

/// Requires a capability, failing with `PolicyError::Forbidden` otherwise
pub fn require(role: Role, relations: Relations, capability: Capability) -> Result<(), PolicyError> {
    if is_allowed(role, relations, capability) {
        Ok(())
    } else {
        Err(PolicyError::Forbidden { capability })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn none() -> Relations {
        Relations::default()
    }

    #[test]
    fn test_admin_is_in_every_grant_list() {
        let all = [
            Capability::ListUsers,
            Capability::ViewUser,
            Capability::UpdateUser,
            Capability::AssignRole,
            Capability::DeactivateUser,
            Capability::CreateTeam,
            Capability::ViewTeam,
            Capability::UpdateTeam,
            Capability::DeleteTeam,
            Capability::ManageMembers,
            Capability::TransferTeam,
            Capability::CreateTask,
            Capability::ViewTask,
            Capability::UpdateTask,
            Capability::ChangeTaskStatus,
            Capability::AssignTask,
            Capability::DeleteTask,
            Capability::CreateMeeting,
            Capability::ViewMeeting,
            Capability::UpdateMeeting,
            Capability::DeleteMeeting,
            Capability::ManageParticipants,
            Capability::CreateEvaluation,
            Capability::ViewEvaluation,
            Capability::UpdateEvaluation,
        ];

        for capability in all {
            assert!(
                is_allowed(Role::Administrator, none(), capability),
                "Administrator should hold {:?}",
                capability
            );
        }
    }

    #[test]
    fn test_task_status_change_grants() {
        // Assignee, team owner, and administrator may change a task's status.
        assert!(is_allowed(Role::Employee, Relations { assignee: true, ..none() }, Capability::ChangeTaskStatus));
        assert!(is_allowed(Role::Employee, Relations { team_owner: true, ..none() }, Capability::ChangeTaskStatus));
        assert!(is_allowed(Role::Administrator, none(), Capability::ChangeTaskStatus));

        // Nobody else may: not an unrelated employee, not even a manager or a
        // plain member of the owning team.
        assert!(!is_allowed(Role::Employee, none(), Capability::ChangeTaskStatus));
        assert!(!is_allowed(Role::Manager, none(), Capability::ChangeTaskStatus));
        assert!(!is_allowed(
            Role::Employee,
            Relations { team_member: true, ..none() },
            Capability::ChangeTaskStatus
        ));
    }

    #[test]
    fn test_team_lifecycle_grants() {
        assert!(is_allowed(Role::Manager, none(), Capability::CreateTeam));
        assert!(!is_allowed(Role::Employee, none(), Capability::CreateTeam));

        assert!(is_allowed(Role::Employee, Relations { team_owner: true, ..none() }, Capability::DeleteTeam));
        assert!(!is_allowed(Role::Manager, none(), Capability::DeleteTeam));
        assert!(!is_allowed(Role::Employee, Relations { team_member: true, ..none() }, Capability::DeleteTeam));
    }

    #[test]
    fn test_role_assignment_is_admin_only() {
        assert!(is_allowed(Role::Administrator, none(), Capability::AssignRole));
        assert!(!is_allowed(Role::Manager, none(), Capability::AssignRole));
        assert!(!is_allowed(Role::Employee, Relations { self_user: true, ..none() }, Capability::AssignRole));
    }

    #[test]
    fn test_self_access() {
        assert!(is_allowed(Role::Employee, Relations { self_user: true, ..none() }, Capability::ViewUser));
        assert!(is_allowed(Role::Employee, Relations { self_user: true, ..none() }, Capability::UpdateUser));
        assert!(!is_allowed(Role::Employee, none(), Capability::UpdateUser));
    }

    #[test]
    fn test_require_maps_to_forbidden() {
        let result = require(Role::Employee, none(), Capability::DeleteTeam);
        assert!(matches!(result, Err(PolicyError::Forbidden { capability: Capability::DeleteTeam })));
    }
}

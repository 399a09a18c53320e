/// Team endpoints
///
/// - `POST   /api/teams` - Create a team (manager/admin; creator becomes owner)
/// - `GET    /api/teams` - List teams (scoped for employees)
/// - `GET    /api/teams/:id` - Get a team
/// - `PATCH  /api/teams/:id` - Update (owner/admin)
/// - `DELETE /api/teams/:id` - Delete (owner/admin)
/// - `GET    /api/teams/:id/members` - List members
/// - `POST   /api/teams/:id/members` - Add a member by id or email
/// - `DELETE /api/teams/:id/members/:user_id` - Remove a member
/// - `POST   /api/teams/:id/transfer` - Transfer ownership to a member

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{users::UserSummary, Pagination},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use teamline_shared::{
    auth::{
        middleware::Principal,
        policy::{require, Capability, Relations},
    },
    models::{
        membership::Membership,
        team::{CreateTeam, Team, UpdateTeam},
        user::{Role, User},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Team creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamRequest {
    #[validate(length(min = 5, max = 150, message = "Team name must be 5-150 characters"))]
    pub name: String,

    #[validate(length(min = 10, max = 350, message = "Description must be 10-350 characters"))]
    pub description: String,
}

/// Team update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTeamRequest {
    #[validate(length(min = 5, max = 150, message = "Team name must be 5-150 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 10, max = 350, message = "Description must be 10-350 characters"))]
    pub description: Option<String>,
}

/// Member addition request: exactly one of user id or email
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
}

/// Ownership transfer request
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub new_owner_id: Uuid,
}

/// Paginated team listing
#[derive(Debug, Serialize)]
pub struct TeamListResponse {
    pub teams: Vec<Team>,
}

async fn load_team(state: &AppState, id: Uuid) -> ApiResult<Team> {
    Team::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))
}

/// Relations between the principal and a team
async fn team_relations(state: &AppState, principal: &Principal, team: &Team) -> ApiResult<Relations> {
    Ok(Relations {
        team_owner: team.owner_id == principal.id(),
        team_member: Membership::is_member(&state.db, team.id, principal.id()).await?,
        ..Relations::default()
    })
}

/// Create a team; the creator becomes owner and first member
pub async fn create_team(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateTeamRequest>,
) -> ApiResult<(StatusCode, Json<Team>)> {
    req.validate()?;
    require(principal.role(), Relations::default(), Capability::CreateTeam)?;

    let team = Team::create(
        &state.db,
        CreateTeam {
            name: req.name,
            description: req.description,
            owner_id: principal.id(),
        },
    )
    .await?;

    tracing::info!(team_id = %team.id, owner_id = %team.owner_id, "Team created");

    Ok((StatusCode::CREATED, Json(team)))
}

/// List teams
///
/// Employees see the teams they belong to or own; managers and administrators
/// see all teams.
pub async fn list_teams(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<TeamListResponse>> {
    let teams = match principal.role() {
        Role::Administrator | Role::Manager => Team::list(&state.db, page.limit(), page.offset()).await?,
        Role::Employee => Team::list_for_user(&state.db, principal.id(), page.limit(), page.offset()).await?,
    };

    Ok(Json(TeamListResponse { teams }))
}

/// Get a team by id
pub async fn get_team(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Team>> {
    let team = load_team(&state, id).await?;

    let relations = team_relations(&state, &principal, &team).await?;
    require(principal.role(), relations, Capability::ViewTeam)?;

    Ok(Json(team))
}

/// Update a team (owner or administrator)
pub async fn update_team(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTeamRequest>,
) -> ApiResult<Json<Team>> {
    req.validate()?;

    let team = load_team(&state, id).await?;
    let relations = team_relations(&state, &principal, &team).await?;
    require(principal.role(), relations, Capability::UpdateTeam)?;

    let updated = Team::update(
        &state.db,
        id,
        UpdateTeam {
            name: req.name,
            description: req.description,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    Ok(Json(updated))
}

/// Delete a team (owner or administrator)
///
/// Tasks, meetings, and memberships of the team are removed with it.
pub async fn delete_team(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let team = load_team(&state, id).await?;
    let relations = team_relations(&state, &principal, &team).await?;
    require(principal.role(), relations, Capability::DeleteTeam)?;

    Team::delete(&state.db, id).await?;

    tracing::info!(team_id = %id, "Team deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// List a team's members
pub async fn list_members(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let team = load_team(&state, id).await?;
    let relations = team_relations(&state, &principal, &team).await?;
    require(principal.role(), relations, Capability::ViewTeam)?;

    let members = Membership::list_members(&state.db, id).await?;

    Ok(Json(members.iter().map(UserSummary::from).collect()))
}

/// Add a member to a team, addressed by user id or email
pub async fn add_member(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<Json<UserSummary>> {
    let team = load_team(&state, id).await?;
    let relations = team_relations(&state, &principal, &team).await?;
    require(principal.role(), relations, Capability::ManageMembers)?;

    let user = match (req.user_id, req.email) {
        (Some(user_id), _) => User::find_by_id(&state.db, user_id).await?,
        (None, Some(email)) => User::find_by_email(&state.db, &email).await?,
        (None, None) => {
            return Err(ApiError::BadRequest("Provide user_id or email".to_string()));
        }
    }
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !user.is_active {
        return Err(ApiError::BadRequest("Cannot add a deactivated user".to_string()));
    }

    Membership::add(&state.db, id, user.id).await?;

    tracing::info!(team_id = %id, user_id = %user.id, "Member added");

    Ok(Json(UserSummary::from(&user)))
}

/// Remove a member from a team
///
/// The owner cannot be removed; transfer ownership first.
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<serde_json::Value>> {
    let team = load_team(&state, id).await?;
    let relations = team_relations(&state, &principal, &team).await?;
    require(principal.role(), relations, Capability::ManageMembers)?;

    if team.owner_id == user_id {
        return Err(ApiError::BadRequest("Cannot remove the team owner".to_string()));
    }

    let removed = Membership::remove(&state.db, id, user_id).await?;
    if !removed {
        return Err(ApiError::NotFound("Membership not found".to_string()));
    }

    tracing::info!(team_id = %id, user_id = %user_id, "Member removed");

    Ok(Json(serde_json::json!({ "removed": true })))
}

/// Transfer team ownership to an existing member
pub async fn transfer_ownership(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<TransferRequest>,
) -> ApiResult<Json<Team>> {
    let team = load_team(&state, id).await?;
    let relations = team_relations(&state, &principal, &team).await?;
    require(principal.role(), relations, Capability::TransferTeam)?;

    let updated = Team::transfer_ownership(&state.db, id, req.new_owner_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("New owner must be a member of the team".to_string()))?;

    tracing::info!(team_id = %id, new_owner_id = %req.new_owner_id, "Ownership transferred");

    Ok(Json(updated))
}

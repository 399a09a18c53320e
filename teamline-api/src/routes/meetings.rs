/// Meeting endpoints
///
/// - `POST   /api/meetings` - Schedule a meeting with participants
/// - `GET    /api/meetings?team_id=...` - List a team's meetings
/// - `GET    /api/meetings/:id` - Get a meeting
/// - `PATCH  /api/meetings/:id` - Update (creator/team owner/admin)
/// - `DELETE /api/meetings/:id` - Delete (creator/team owner/admin)
/// - `GET    /api/meetings/:id/participants` - List participants
/// - `POST   /api/meetings/:id/participants` - Add a participant
/// - `DELETE /api/meetings/:id/participants/:user_id` - Remove a participant
///
/// Meetings are scheduled in the future; participants must belong to the
/// meeting's team unless the actor is a manager or administrator.

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
use chrono::{DateTime, Utc};
use serde::Deserialize;
use teamline_shared::{
    auth::{
        middleware::Principal,
        policy::{require, Capability, Relations},
    },
    models::{
        meeting::{CreateMeeting, Meeting, UpdateMeeting},
        membership::Membership,
        team::Team,
        user::{Role, User},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Meeting creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMeetingRequest {
    #[validate(length(min = 3, max = 120, message = "Title must be 3-120 characters"))]
    pub title: String,

    #[validate(length(min = 3, max = 450, message = "Description must be 3-450 characters"))]
    pub description: String,

    pub scheduled_at: DateTime<Utc>,

    pub team_id: Uuid,

    /// Initial participant set
    #[serde(default)]
    pub participant_ids: Vec<Uuid>,
}

/// Meeting update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMeetingRequest {
    #[validate(length(min = 3, max = 120, message = "Title must be 3-120 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 3, max = 450, message = "Description must be 3-450 characters"))]
    pub description: Option<String>,

    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Participant addition request
#[derive(Debug, Deserialize)]
pub struct AddParticipantRequest {
    pub user_id: Uuid,
}

/// Meeting listing query
#[derive(Debug, Deserialize)]
pub struct MeetingListQuery {
    pub team_id: Uuid,
}

async fn load_meeting(state: &AppState, id: Uuid) -> ApiResult<Meeting> {
    Meeting::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Meeting not found".to_string()))
}

/// Relations between the principal and a meeting (through its team)
async fn meeting_relations(state: &AppState, principal: &Principal, meeting: &Meeting) -> ApiResult<(Team, Relations)> {
    let team = Team::find_by_id(&state.db, meeting.team_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    let relations = Relations {
        team_owner: team.owner_id == principal.id(),
        team_member: Membership::is_member(&state.db, team.id, principal.id()).await?,
        creator: meeting.creator_id == principal.id(),
        ..Relations::default()
    };

    Ok((team, relations))
}

/// Checks a participant belongs to the meeting's team
///
/// Managers and administrators may pull in people from outside the team.
async fn check_participant(
    state: &AppState,
    principal: &Principal,
    team: &Team,
    participant_id: Uuid,
) -> ApiResult<()> {
    if matches!(principal.role(), Role::Administrator | Role::Manager) {
        return Ok(());
    }

    let is_member = Membership::is_member(&state.db, team.id, participant_id).await?;
    if !is_member && team.owner_id != participant_id {
        return Err(ApiError::BadRequest(format!(
            "Participant {} is not a member of the team",
            participant_id
        )));
    }

    Ok(())
}

/// Schedule a meeting
pub async fn create_meeting(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateMeetingRequest>,
) -> ApiResult<(StatusCode, Json<Meeting>)> {
    req.validate()?;

    if req.scheduled_at <= Utc::now() {
        return Err(ApiError::BadRequest("Meeting time must be in the future".to_string()));
    }

    let team = Team::find_by_id(&state.db, req.team_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    let relations = Relations {
        team_owner: team.owner_id == principal.id(),
        team_member: Membership::is_member(&state.db, team.id, principal.id()).await?,
        ..Relations::default()
    };
    require(principal.role(), relations, Capability::CreateMeeting)?;

    for participant_id in &req.participant_ids {
        let participant = User::find_by_id(&state.db, *participant_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Participant {} not found", participant_id)))?;
        check_participant(&state, &principal, &team, participant.id).await?;
    }

    let meeting = Meeting::create(
        &state.db,
        CreateMeeting {
            title: req.title,
            description: req.description,
            scheduled_at: req.scheduled_at,
            team_id: req.team_id,
            creator_id: principal.id(),
            participant_ids: req.participant_ids,
        },
    )
    .await?;

    tracing::info!(meeting_id = %meeting.id, team_id = %meeting.team_id, "Meeting scheduled");

    Ok((StatusCode::CREATED, Json(meeting)))
}

/// List a team's meetings, soonest first
pub async fn list_meetings(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<MeetingListQuery>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<Meeting>>> {
    let team = Team::find_by_id(&state.db, query.team_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    let relations = Relations {
        team_owner: team.owner_id == principal.id(),
        team_member: Membership::is_member(&state.db, team.id, principal.id()).await?,
        ..Relations::default()
    };
    require(principal.role(), relations, Capability::ViewMeeting)?;

    let meetings = Meeting::list_by_team(&state.db, query.team_id, page.limit(), page.offset()).await?;

    Ok(Json(meetings))
}

/// Get a meeting by id
pub async fn get_meeting(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Meeting>> {
    let meeting = load_meeting(&state, id).await?;

    let (_, relations) = meeting_relations(&state, &principal, &meeting).await?;
    require(principal.role(), relations, Capability::ViewMeeting)?;

    Ok(Json(meeting))
}

/// Update a meeting
pub async fn update_meeting(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMeetingRequest>,
) -> ApiResult<Json<Meeting>> {
    req.validate()?;

    if let Some(scheduled_at) = req.scheduled_at {
        if scheduled_at <= Utc::now() {
            return Err(ApiError::BadRequest("Meeting time must be in the future".to_string()));
        }
    }

    let meeting = load_meeting(&state, id).await?;
    let (_, relations) = meeting_relations(&state, &principal, &meeting).await?;
    require(principal.role(), relations, Capability::UpdateMeeting)?;

    let updated = Meeting::update(
        &state.db,
        id,
        UpdateMeeting {
            title: req.title,
            description: req.description,
            scheduled_at: req.scheduled_at,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Meeting not found".to_string()))?;

    Ok(Json(updated))
}

/// Delete a meeting
pub async fn delete_meeting(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let meeting = load_meeting(&state, id).await?;
    let (_, relations) = meeting_relations(&state, &principal, &meeting).await?;
    require(principal.role(), relations, Capability::DeleteMeeting)?;

    Meeting::delete(&state.db, id).await?;

    tracing::info!(meeting_id = %id, "Meeting deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// List a meeting's participants
pub async fn list_participants(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let meeting = load_meeting(&state, id).await?;
    let (_, relations) = meeting_relations(&state, &principal, &meeting).await?;
    require(principal.role(), relations, Capability::ViewMeeting)?;

    let participants = Meeting::participants(&state.db, id).await?;

    Ok(Json(participants.iter().map(UserSummary::from).collect()))
}

/// Add a participant to a meeting
pub async fn add_participant(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddParticipantRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let meeting = load_meeting(&state, id).await?;
    let (team, relations) = meeting_relations(&state, &principal, &meeting).await?;
    require(principal.role(), relations, Capability::ManageParticipants)?;

    let participant = User::find_by_id(&state.db, req.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    check_participant(&state, &principal, &team, participant.id).await?;

    let added = Meeting::add_participant(&state.db, id, req.user_id).await?;
    if !added {
        return Err(ApiError::Conflict("User is already a participant".to_string()));
    }

    Ok(Json(serde_json::json!({ "added": true })))
}

/// Remove a participant from a meeting
pub async fn remove_participant(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<serde_json::Value>> {
    let meeting = load_meeting(&state, id).await?;
    let (_, relations) = meeting_relations(&state, &principal, &meeting).await?;
    require(principal.role(), relations, Capability::ManageParticipants)?;

    let removed = Meeting::remove_participant(&state.db, id, user_id).await?;
    if !removed {
        return Err(ApiError::NotFound("Participant not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "removed": true })))
}

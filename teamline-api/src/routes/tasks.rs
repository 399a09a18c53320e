/// Task endpoints
///
/// - `POST   /api/tasks` - Create a task
/// - `GET    /api/tasks` - List tasks with filters, scoped to visible teams
/// - `GET    /api/tasks/:id` - Get a task
/// - `PATCH  /api/tasks/:id` - Update title/description/deadline
/// - `PATCH  /api/tasks/:id/status` - Change status (assignee/team owner/admin)
/// - `POST   /api/tasks/:id/assign` - Reassign (team owner/manager/admin)
/// - `DELETE /api/tasks/:id` - Delete (creator/team owner/admin)
///
/// Status changes are deliberately narrower than field updates: only the
/// assignee, the owning team's owner, or an administrator may move a task
/// through the board.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::Pagination,
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
        membership::Membership,
        task::{CreateTask, Task, TaskFilter, TaskStatus, UpdateTask},
        team::Team,
        user::Role,
    },
};
use uuid::Uuid;
use validator::Validate;

/// Task creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 3, max = 80, message = "Title must be 3-80 characters"))]
    pub title: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    pub deadline: DateTime<Utc>,

    pub team_id: Uuid,

    pub assignee_id: Option<Uuid>,
}

/// Task field update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 3, max = 80, message = "Title must be 3-80 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    pub deadline: Option<DateTime<Utc>>,
}

/// Status change request
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: TaskStatus,
}

/// Reassignment request (null assignee clears the assignment)
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub assignee_id: Option<Uuid>,
}

/// Task listing filters (all optional, combined with AND)
#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<TaskStatus>,
    pub team_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub creator_id: Option<Uuid>,
}

async fn load_task(state: &AppState, id: Uuid) -> ApiResult<Task> {
    Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))
}

/// Relations between the principal and a task (through its team)
async fn task_relations(state: &AppState, principal: &Principal, task: &Task) -> ApiResult<(Team, Relations)> {
    let team = Team::find_by_id(&state.db, task.team_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    let relations = Relations {
        team_owner: team.owner_id == principal.id(),
        team_member: Membership::is_member(&state.db, team.id, principal.id()).await?,
        assignee: task.assignee_id == Some(principal.id()),
        creator: task.creator_id == principal.id(),
        ..Relations::default()
    };

    Ok((team, relations))
}

/// Whether the principal sees all tasks or only their own teams'
fn visibility(principal: &Principal) -> Option<Uuid> {
    match principal.role() {
        Role::Administrator | Role::Manager => None,
        Role::Employee => Some(principal.id()),
    }
}

/// Create a task in a team
///
/// The assignee, when given, must be a member of the task's team (or its
/// owner).
pub async fn create_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;

    let team = Team::find_by_id(&state.db, req.team_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    let relations = Relations {
        team_owner: team.owner_id == principal.id(),
        team_member: Membership::is_member(&state.db, team.id, principal.id()).await?,
        ..Relations::default()
    };
    require(principal.role(), relations, Capability::CreateTask)?;

    if let Some(assignee_id) = req.assignee_id {
        let is_member = Membership::is_member(&state.db, team.id, assignee_id).await?;
        if !is_member && team.owner_id != assignee_id {
            return Err(ApiError::BadRequest("Assignee is not a member of the team".to_string()));
        }
    }

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            deadline: req.deadline,
            assignee_id: req.assignee_id,
            team_id: req.team_id,
            creator_id: principal.id(),
        },
    )
    .await?;

    tracing::info!(task_id = %task.id, team_id = %task.team_id, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}

/// List tasks with filters
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<TaskListQuery>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<Task>>> {
    let filter = TaskFilter {
        status: query.status,
        team_id: query.team_id,
        assignee_id: query.assignee_id,
        creator_id: query.creator_id,
    };

    let tasks = Task::list(&state.db, filter, visibility(&principal), page.limit(), page.offset()).await?;

    Ok(Json(tasks))
}

/// Get a task by id
pub async fn get_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = load_task(&state, id).await?;

    let (_, relations) = task_relations(&state, &principal, &task).await?;
    require(principal.role(), relations, Capability::ViewTask)?;

    Ok(Json(task))
}

/// Update a task's title, description, or deadline
pub async fn update_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;

    let task = load_task(&state, id).await?;
    let (_, relations) = task_relations(&state, &principal, &task).await?;
    require(principal.role(), relations, Capability::UpdateTask)?;

    let updated = Task::update(
        &state.db,
        id,
        UpdateTask {
            title: req.title,
            description: req.description.map(Some),
            deadline: req.deadline,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(updated))
}

/// Change a task's status (assignee, team owner, or administrator)
pub async fn change_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> ApiResult<Json<Task>> {
    let task = load_task(&state, id).await?;
    let (_, relations) = task_relations(&state, &principal, &task).await?;
    require(principal.role(), relations, Capability::ChangeTaskStatus)?;

    let updated = Task::set_status(&state.db, id, req.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::info!(task_id = %id, status = req.status.as_str(), "Task status changed");

    Ok(Json(updated))
}

/// Reassign a task (team owner, manager, or administrator)
pub async fn assign_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignRequest>,
) -> ApiResult<Json<Task>> {
    let task = load_task(&state, id).await?;
    let (team, relations) = task_relations(&state, &principal, &task).await?;
    require(principal.role(), relations, Capability::AssignTask)?;

    if let Some(assignee_id) = req.assignee_id {
        let is_member = Membership::is_member(&state.db, team.id, assignee_id).await?;
        if !is_member && team.owner_id != assignee_id {
            return Err(ApiError::BadRequest("Assignee is not a member of the team".to_string()));
        }
    }

    let updated = Task::set_assignee(&state.db, id, req.assignee_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(updated))
}

/// Delete a task (creator, team owner, or administrator)
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let task = load_task(&state, id).await?;
    let (_, relations) = task_relations(&state, &principal, &task).await?;
    require(principal.role(), relations, Capability::DeleteTask)?;

    Task::delete(&state.db, id).await?;

    tracing::info!(task_id = %id, "Task deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

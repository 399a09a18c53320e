/// Evaluation endpoints
///
/// - `POST  /api/evaluations` - Score a finished task
/// - `GET   /api/evaluations/:id` - Get an evaluation
/// - `PATCH /api/evaluations/:id` - Update score/comment
/// - `GET   /api/evaluations/task/:task_id` - The task's evaluation
/// - `GET   /api/evaluations/user/:user_id` - Evaluations a user received
/// - `GET   /api/evaluations/user/:user_id/average` - Average received score (1-5)
///
/// A task is scored at most once (UNIQUE constraint); only done tasks with an
/// assignee can be evaluated, and the score always lands on that assignee.

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
use serde::{Deserialize, Serialize};
use teamline_shared::{
    auth::{
        middleware::Principal,
        policy::{require, Capability, Relations},
    },
    models::{
        evaluation::{CreateEvaluation, Evaluation, Score},
        membership::Membership,
        task::{Task, TaskStatus},
        team::Team,
    },
};
use uuid::Uuid;
use validator::Validate;

/// Evaluation creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEvaluationRequest {
    pub task_id: Uuid,

    pub score: Score,

    #[validate(length(max = 500, message = "Comment must be at most 500 characters"))]
    pub comment: Option<String>,
}

/// Evaluation update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEvaluationRequest {
    pub score: Score,

    #[validate(length(max = 500, message = "Comment must be at most 500 characters"))]
    pub comment: Option<String>,
}

/// Average score response
#[derive(Debug, Serialize)]
pub struct AverageResponse {
    pub user_id: Uuid,

    /// Average on the 1-5 scale; null if the user has no evaluations
    pub average: Option<f64>,
}

/// Relations between the principal and an evaluation (through the task's team)
async fn evaluation_relations(
    state: &AppState,
    principal: &Principal,
    evaluation: &Evaluation,
) -> ApiResult<Relations> {
    let task = Task::find_by_id(&state.db, evaluation.task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let team = Team::find_by_id(&state.db, task.team_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    Ok(Relations {
        self_user: evaluation.evaluated_user_id == principal.id(),
        creator: evaluation.evaluator_id == principal.id(),
        team_owner: team.owner_id == principal.id(),
        team_member: Membership::is_member(&state.db, team.id, principal.id()).await?,
        ..Relations::default()
    })
}

/// Score a finished task
///
/// # Errors
///
/// - `404 not_found`: no such task
/// - `400 bad_request`: task not done, or has no assignee
/// - `403 forbidden`: caller is not the team owner, a manager, or an admin
/// - `409 conflict`: task already evaluated
pub async fn create_evaluation(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateEvaluationRequest>,
) -> ApiResult<(StatusCode, Json<Evaluation>)> {
    req.validate()?;

    let task = Task::find_by_id(&state.db, req.task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let team = Team::find_by_id(&state.db, task.team_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    let relations = Relations {
        team_owner: team.owner_id == principal.id(),
        ..Relations::default()
    };
    require(principal.role(), relations, Capability::CreateEvaluation)?;

    if task.status != TaskStatus::Done {
        return Err(ApiError::BadRequest("Only done tasks can be evaluated".to_string()));
    }

    let evaluated_user_id = task
        .assignee_id
        .ok_or_else(|| ApiError::BadRequest("Task has no assignee to evaluate".to_string()))?;

    let evaluation = Evaluation::create(
        &state.db,
        CreateEvaluation {
            task_id: req.task_id,
            evaluator_id: principal.id(),
            evaluated_user_id,
            score: req.score,
            comment: req.comment,
        },
    )
    .await?;

    tracing::info!(evaluation_id = %evaluation.id, task_id = %req.task_id, "Task evaluated");

    Ok((StatusCode::CREATED, Json(evaluation)))
}

/// Get an evaluation by id
pub async fn get_evaluation(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Evaluation>> {
    let evaluation = Evaluation::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Evaluation not found".to_string()))?;

    let relations = evaluation_relations(&state, &principal, &evaluation).await?;
    require(principal.role(), relations, Capability::ViewEvaluation)?;

    Ok(Json(evaluation))
}

/// Update an evaluation's score or comment
pub async fn update_evaluation(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEvaluationRequest>,
) -> ApiResult<Json<Evaluation>> {
    req.validate()?;

    let evaluation = Evaluation::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Evaluation not found".to_string()))?;

    let relations = evaluation_relations(&state, &principal, &evaluation).await?;
    require(principal.role(), relations, Capability::UpdateEvaluation)?;

    let updated = Evaluation::update(&state.db, id, req.score, req.comment)
        .await?
        .ok_or_else(|| ApiError::NotFound("Evaluation not found".to_string()))?;

    Ok(Json(updated))
}

/// The evaluation of a task, if any
pub async fn get_task_evaluation(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Evaluation>> {
    let evaluation = Evaluation::find_by_task(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task has no evaluation".to_string()))?;

    let relations = evaluation_relations(&state, &principal, &evaluation).await?;
    require(principal.role(), relations, Capability::ViewEvaluation)?;

    Ok(Json(evaluation))
}

/// Evaluations a user has received, newest first
///
/// Users see their own; managers and administrators see anyone's.
pub async fn list_user_evaluations(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<Evaluation>>> {
    let relations = Relations {
        self_user: user_id == principal.id(),
        ..Relations::default()
    };
    require(principal.role(), relations, Capability::ViewEvaluation)?;

    let evaluations = Evaluation::list_for_user(&state.db, user_id, page.limit(), page.offset()).await?;

    Ok(Json(evaluations))
}

/// Average received score of a user on the 1-5 scale
pub async fn user_average(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<AverageResponse>> {
    let relations = Relations {
        self_user: user_id == principal.id(),
        ..Relations::default()
    };
    require(principal.role(), relations, Capability::ViewEvaluation)?;

    let average = Evaluation::average_for_user(&state.db, user_id).await?;

    Ok(Json(AverageResponse { user_id, average }))
}

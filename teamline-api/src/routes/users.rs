/// User management endpoints
///
/// - `GET    /api/users` - List users (admin/manager)
/// - `GET    /api/users/me` - The authenticated user
/// - `GET    /api/users/:id` - Get a user (visibility policy)
/// - `PATCH  /api/users/:id` - Update profile (self or admin)
/// - `POST   /api/users/:id/role` - Assign role (admin)
/// - `DELETE /api/users/:id` - Soft-deactivate (admin)
///
/// Role and active flag are deliberately outside the profile update: they
/// have their own endpoints with their own rules.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::Pagination,
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use teamline_shared::{
    auth::{
        middleware::Principal,
        policy::{require, Capability, Relations},
    },
    models::{
        membership::Membership,
        user::{Gender, Role, UpdateUser, User},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Public view of a user (no password hash)
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub surname: String,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    pub role: Role,
    pub is_active: bool,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            surname: user.surname.clone(),
            gender: user.gender,
            birth_date: user.birth_date,
            role: user.role,
            is_active: user.is_active,
        }
    }
}

/// Profile update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 50, message = "Surname must be 1-50 characters"))]
    pub surname: Option<String>,

    pub gender: Option<Gender>,

    pub birth_date: Option<NaiveDate>,
}

/// Role assignment request
#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role: Role,
}

/// Paginated user listing
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserSummary>,
    pub total: i64,
}

/// List users (admins and managers only)
pub async fn list_users(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<UserListResponse>> {
    require(principal.role(), Relations::default(), Capability::ListUsers)?;

    let users = User::list(&state.db, page.limit(), page.offset()).await?;
    let total = User::count(&state.db).await?;

    Ok(Json(UserListResponse {
        users: users.iter().map(UserSummary::from).collect(),
        total,
    }))
}

/// The authenticated user's own record
pub async fn me(Extension(principal): Extension<Principal>) -> Json<UserSummary> {
    Json(UserSummary::from(&principal.user))
}

/// Get a user by id
///
/// Employees only see themselves and members of their own teams; managers and
/// administrators see everyone.
pub async fn get_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserSummary>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let relations = Relations {
        self_user: principal.id() == user.id,
        team_member: Membership::share_team(&state.db, principal.id(), user.id).await?,
        ..Relations::default()
    };
    require(principal.role(), relations, Capability::ViewUser)?;

    Ok(Json(UserSummary::from(&user)))
}

/// Update a user's profile (self or administrator)
pub async fn update_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserSummary>> {
    req.validate()?;

    let relations = Relations {
        self_user: principal.id() == id,
        ..Relations::default()
    };
    require(principal.role(), relations, Capability::UpdateUser)?;

    let updated = User::update(
        &state.db,
        id,
        UpdateUser {
            name: req.name,
            surname: req.surname,
            gender: req.gender,
            birth_date: req.birth_date,
            password_hash: None,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserSummary::from(&updated)))
}

/// Assign a role to a user (administrators only)
///
/// An administrator cannot demote themselves; someone else has to, so the
/// system can't accidentally end up without administrators.
pub async fn assign_role(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignRoleRequest>,
) -> ApiResult<Json<UserSummary>> {
    require(principal.role(), Relations::default(), Capability::AssignRole)?;

    if principal.id() == id && req.role != Role::Administrator {
        return Err(ApiError::Forbidden("Administrators cannot demote themselves".to_string()));
    }

    let updated = User::set_role(&state.db, id, req.role)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %id, role = updated.role.as_str(), "Role assigned");

    Ok(Json(UserSummary::from(&updated)))
}

/// Soft-deactivate a user (administrators only)
///
/// The row is kept; the account is locked out from the next request on.
pub async fn deactivate_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    require(principal.role(), Relations::default(), Capability::DeactivateUser)?;

    if principal.id() == id {
        return Err(ApiError::Forbidden("Administrators cannot deactivate themselves".to_string()));
    }

    let deactivated = User::deactivate(&state.db, id).await?;
    if !deactivated {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %id, "User deactivated");

    Ok(Json(serde_json::json!({ "deactivated": true })))
}

/// Authentication endpoints
///
/// - `POST /api/auth/register` - Register new user
/// - `POST /api/auth/login` - Login and get a token pair
/// - `POST /api/auth/refresh` - Exchange a refresh token for a new pair
/// - `POST /api/auth/bootstrap-admin` - Promote the caller to the first administrator
///
/// Registration and login report the same `invalid credentials` signal for an
/// unknown email and a wrong password, so callers can't probe which emails
/// exist. Logout is client-side token discard; there is no revocation list.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::users::UserSummary,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use teamline_shared::{
    auth::{jwt, middleware::Principal, password},
    models::user::{CreateUser, Gender, User},
};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// First name
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: String,

    /// Surname
    #[validate(length(min = 1, max = 50, message = "Surname must be 1-50 characters"))]
    pub surname: String,

    /// Gender
    pub gender: Gender,

    /// Date of birth
    pub birth_date: NaiveDate,

    /// Password (minimum 10 characters)
    #[validate(length(min = 10, max = 80, message = "Password must be 10-80 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Token pair response returned by register, login, and refresh
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Access token (short-lived)
    pub access_token: String,

    /// Refresh token (long-lived)
    pub refresh_token: String,

    /// Always "bearer"
    pub token_type: &'static str,

    /// Summary of the authenticated user
    pub user: UserSummary,
}

impl TokenResponse {
    fn new(pair: jwt::TokenPair, user: &User) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "bearer",
            user: UserSummary::from(user),
        }
    }
}

/// Hashes a password off the async workers
///
/// bcrypt at production cost takes hundreds of milliseconds; blocking a
/// runtime worker for that long stalls unrelated requests.
async fn hash_on_blocking_pool(password: String, cost: u32) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&password, cost))
        .await
        .map_err(|e| ApiError::Internal(format!("Hashing task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// Verifies a password off the async workers
async fn verify_on_blocking_pool(password: String, hash: String) -> ApiResult<bool> {
    tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::Internal(format!("Verification task failed: {}", e)))?
        .map_err(ApiError::from)
}

fn issue_pair(state: &AppState, user: &User) -> ApiResult<jwt::TokenPair> {
    let pair = jwt::issue_pair(
        user.id,
        user.role,
        state.jwt_secret(),
        state.config.jwt.access_ttl(),
        state.config.jwt.refresh_ttl(),
    )?;

    Ok(pair)
}

/// Register a new user
///
/// Creates the account with the default employee role and returns a token
/// pair, so registration doubles as the first login.
///
/// # Errors
///
/// - `422 validation`: malformed email, short password, bad field lengths
/// - `409 conflict`: email already registered
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    req.validate()?;

    let password_hash = hash_on_blocking_pool(req.password, state.bcrypt_cost()).await?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            name: req.name,
            surname: req.surname,
            gender: req.gender,
            birth_date: req.birth_date,
            password_hash,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "Registered new user");

    let pair = issue_pair(&state, &user)?;

    Ok((StatusCode::CREATED, Json(TokenResponse::new(pair, &user))))
}

/// Login with email and password
///
/// # Errors
///
/// - `401 unauthorized`: unknown email or wrong password (same signal for
///   both), or a deactivated account
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = verify_on_blocking_pool(req.password, user.password_hash.clone()).await?;
    if !valid {
        return Err(ApiError::Unauthorized("Invalid email or password".to_string()));
    }

    if !user.is_active {
        return Err(ApiError::Unauthorized("Account is deactivated".to_string()));
    }

    let pair = issue_pair(&state, &user)?;

    Ok(Json(TokenResponse::new(pair, &user)))
}

/// Exchange a refresh token for a fresh pair
///
/// The user is reloaded so a deactivated account can't keep refreshing. A new
/// refresh token is issued every time; the old one stays valid until its
/// natural expiry (no revocation list).
///
/// # Errors
///
/// - `401 unauthorized`: invalid, expired, or wrong-type token; missing or
///   deactivated user
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

    if !user.is_active {
        return Err(ApiError::Unauthorized("Account is deactivated".to_string()));
    }

    let pair = issue_pair(&state, &user)?;

    Ok(Json(TokenResponse::new(pair, &user)))
}

/// Bootstrap response
#[derive(Debug, Serialize)]
pub struct BootstrapResponse {
    /// The promoted user
    pub user: UserSummary,
}

/// Promote the calling user to the first administrator
///
/// Succeeds only while the system has no administrator. The check-and-set is
/// serialized in the database, so concurrent callers race safely: exactly one
/// wins, the rest get `403 forbidden`.
pub async fn bootstrap_admin(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<BootstrapResponse>> {
    let promoted = User::promote_first_admin(&state.db, principal.id())
        .await?
        .ok_or_else(|| ApiError::Forbidden("An administrator already exists".to_string()))?;

    tracing::info!(user_id = %promoted.id, "Bootstrapped first administrator");

    Ok(Json(BootstrapResponse {
        user: UserSummary::from(&promoted),
    }))
}

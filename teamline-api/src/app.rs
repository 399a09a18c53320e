/// Application state and router builder
///
/// This module defines the shared application state, the authentication layer
/// that resolves the request principal, and the function assembling the Axum
/// router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use teamline_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = teamline_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    routing::{delete, get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use teamline_shared::{
    auth::{
        jwt,
        middleware::{extract_bearer, AuthError, Principal},
    },
    models::user::User,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Config;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. The pool is
/// the only cross-request state; everything else is immutable configuration.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Gets the configured bcrypt cost (work factor)
    pub fn bcrypt_cost(&self) -> u32 {
        self.config.hashing.bcrypt_cost
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /api/
///     ├── /auth/
///     │   ├── POST /register           # Public
///     │   ├── POST /login              # Public
///     │   ├── POST /refresh            # Public (takes a refresh token)
///     │   └── POST /bootstrap-admin    # Authenticated
///     ├── /users/...                   # Authenticated
///     ├── /teams/...                   # Authenticated
///     ├── /tasks/...                   # Authenticated
///     ├── /meetings/...                # Authenticated
///     ├── /calendar/...                # Authenticated
///     └── /evaluations/...             # Authenticated
/// ```
///
/// Authenticated routers share one middleware layer that verifies the access
/// token and loads the principal; role and ownership rules are enforced per
/// handler through the policy table.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public auth endpoints
    let auth_public = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    // First-administrator bootstrap needs a principal (it promotes the caller)
    let auth_protected = Router::new()
        .route("/bootstrap-admin", post(routes::auth::bootstrap_admin))
        .layer(axum::middleware::from_fn_with_state(state.clone(), principal_layer));

    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route("/me", get(routes::users::me))
        .route("/:id", get(routes::users::get_user))
        .route("/:id", patch(routes::users::update_user))
        .route("/:id", delete(routes::users::deactivate_user))
        .route("/:id/role", post(routes::users::assign_role));

    let team_routes = Router::new()
        .route("/", post(routes::teams::create_team))
        .route("/", get(routes::teams::list_teams))
        .route("/:id", get(routes::teams::get_team))
        .route("/:id", patch(routes::teams::update_team))
        .route("/:id", delete(routes::teams::delete_team))
        .route("/:id/members", get(routes::teams::list_members))
        .route("/:id/members", post(routes::teams::add_member))
        .route("/:id/members/:user_id", delete(routes::teams::remove_member))
        .route("/:id/transfer", post(routes::teams::transfer_ownership));

    let task_routes = Router::new()
        .route("/", post(routes::tasks::create_task))
        .route("/", get(routes::tasks::list_tasks))
        .route("/:id", get(routes::tasks::get_task))
        .route("/:id", patch(routes::tasks::update_task))
        .route("/:id", delete(routes::tasks::delete_task))
        .route("/:id/status", patch(routes::tasks::change_status))
        .route("/:id/assign", post(routes::tasks::assign_task));

    let meeting_routes = Router::new()
        .route("/", post(routes::meetings::create_meeting))
        .route("/", get(routes::meetings::list_meetings))
        .route("/:id", get(routes::meetings::get_meeting))
        .route("/:id", patch(routes::meetings::update_meeting))
        .route("/:id", delete(routes::meetings::delete_meeting))
        .route("/:id/participants", get(routes::meetings::list_participants))
        .route("/:id/participants", post(routes::meetings::add_participant))
        .route(
            "/:id/participants/:user_id",
            delete(routes::meetings::remove_participant),
        );

    let calendar_routes = Router::new()
        .route("/day", get(routes::calendar::day))
        .route("/week", get(routes::calendar::week))
        .route("/month", get(routes::calendar::month))
        .route("/upcoming", get(routes::calendar::upcoming));

    let evaluation_routes = Router::new()
        .route("/", post(routes::evaluations::create_evaluation))
        .route("/:id", get(routes::evaluations::get_evaluation))
        .route("/:id", patch(routes::evaluations::update_evaluation))
        .route("/task/:task_id", get(routes::evaluations::get_task_evaluation))
        .route("/user/:user_id", get(routes::evaluations::list_user_evaluations))
        .route("/user/:user_id/average", get(routes::evaluations::user_average));

    // Everything resource-shaped sits behind the principal layer
    let protected = Router::new()
        .nest("/users", user_routes)
        .nest("/teams", team_routes)
        .nest("/tasks", task_routes)
        .nest("/meetings", meeting_routes)
        .nest("/calendar", calendar_routes)
        .nest("/evaluations", evaluation_routes)
        .layer(axum::middleware::from_fn_with_state(state.clone(), principal_layer));

    let api_routes = Router::new()
        .nest("/auth", auth_public.merge(auth_protected))
        .merge(protected);

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Authentication middleware layer
///
/// Verifies the bearer access token, reloads the principal from the database
/// (so deactivation and role changes take effect immediately), and injects
/// [`Principal`] into request extensions. Any failure is a 401; a database
/// fault is a 500.
async fn principal_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = extract_bearer(req.headers())?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await
        .map_err(|e| AuthError::Database(e.to_string()))?
        .ok_or(AuthError::UnknownPrincipal)?;

    if !user.is_active {
        return Err(AuthError::Inactive);
    }

    req.extensions_mut().insert(Principal { user });

    Ok(next.run(req).await)
}

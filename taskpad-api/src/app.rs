/// Application state and router builder
///
/// Defines the shared application state and builds the Axum router with
/// all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskpad_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, None, config);
/// let app = taskpad_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use std::sync::Arc;
use taskpad_shared::auth::{jwt, middleware::AuthUser};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; internals
/// are cheap to clone (pool handle, connection manager, Arc).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Redis connection for rate limiting; None disables the limiter
    pub redis: Option<ConnectionManager>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, redis: Option<ConnectionManager>, config: Config) -> Self {
        Self {
            db,
            redis,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                    # Health check (public)
/// └── /api/
///     ├── POST /register         # Create account (public)
///     ├── POST /login            # Get tokens (public, IP rate limited)
///     ├── POST /refresh          # New access token (public)
///     ├── GET  /pages            # List/search pages (public)
///     ├── GET  /pages/:title     # Read page (public)
///     ├── GET/PUT/PATCH /user    # Profile (authenticated)
///     ├── GET/POST /tasks        # Own tasks (authenticated)
///     ├── PUT/DELETE /tasks/:id  # Own task (authenticated)
///     ├── POST /pages            # Create page (authenticated)
///     ├── PUT/DELETE /pages/:title  # Owner only (authenticated)
///     └── GET/POST /messages     # Message log (authenticated)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top): tracing, CORS, security headers.
/// Authenticated routes additionally run JWT validation and the per-user
/// rate limiter.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public API: registration, login, token refresh, page reads.
    // Login gets its own per-IP rate limit.
    let public_api = Router::new()
        .route("/register", post(routes::auth::register))
        .route(
            "/login",
            post(routes::auth::login).layer(axum::middleware::from_fn_with_state(
                state.clone(),
                crate::middleware::rate_limit::login_rate_limit_layer,
            )),
        )
        .route("/refresh", post(routes::auth::refresh))
        .route("/pages", get(routes::pages::list_pages))
        .route("/pages/:title", get(routes::pages::get_page));

    // Authenticated API (JWT required, per-user rate limited)
    let protected_api = Router::new()
        .route(
            "/user",
            get(routes::user::get_profile)
                .put(routes::user::update_profile)
                .patch(routes::user::change_password),
        )
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/tasks/:id",
            put(routes::tasks::update_task).delete(routes::tasks::delete_task),
        )
        .route("/pages", post(routes::pages::create_page))
        .route(
            "/pages/:title",
            put(routes::pages::update_page).delete(routes::pages::delete_page),
        )
        .route(
            "/messages",
            get(routes::messages::list_messages).post(routes::messages::create_message),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::rate_limit::user_rate_limit_layer,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let api_routes = public_api.merge(protected_api);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates the access token from the Authorization header,
/// then injects [`AuthUser`] into request extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    use taskpad_shared::auth::middleware::AuthError;

    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    let auth_user = AuthUser::from_claims(claims.sub);

    req.extensions_mut().insert(auth_user);

    Ok(next.run(req).await)
}

/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskboard_api::{app::{build_router, AppState}, config::Config};
/// use taskboard_shared::mail::LogMailer;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config, Arc::new(LogMailer));
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::auth::require_bearer, routes};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskboard_shared::mail::Mailer;
use taskboard_shared::services::{
    cards::CardManager, comments::CommentManager, projects::ProjectManager, users::UserManager,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. The managers
/// only hold pool handles, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    pub users: UserManager,
    pub projects: ProjectManager,
    pub cards: CardManager,
    pub comments: CommentManager,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        let users = UserManager::new(
            db.clone(),
            config.token_service(),
            mailer,
            config.mail.frontend_url.clone(),
        );

        Self {
            projects: ProjectManager::new(db.clone()),
            cards: CardManager::new(db.clone()),
            comments: CommentManager::new(db.clone()),
            users,
            db,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /health                              # Health check (public)
/// <prefix>/
/// ├── POST   /users                    # Register
/// ├── POST   /users/login
/// ├── POST   /users/forgot-password
/// ├── POST   /users/reset-session      # Reset token -> session
/// ├── POST   /users/reset-password     (A)
/// ├── GET    /users/:id                (A)
/// ├── PUT    /users/:id                (A)
/// ├── POST   /projects                 (A)
/// ├── GET    /projects                 (A)
/// ├── GET    /projects/:id             (A)
/// ├── PUT    /projects/:id             (A)
/// ├── DELETE /projects/:id             (A)
/// ├── PUT    /projects/:id/members     (A)
/// ├── POST   /lists/:list_id/cards     (A)
/// ├── GET    /cards/:id                (A)
/// ├── PUT    /cards/:id                (A)
/// ├── DELETE /cards/:id                (A)
/// ├── POST   /cards/:id/comments       (A)
/// ├── PUT    /comments/:id             (A)
/// └── DELETE /comments/:id             (A)
/// ```
///
/// (A) routes require a bearer access token.
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_routes = Router::new()
        .route("/users", post(routes::users::create_user))
        .route("/users/login", post(routes::users::login))
        .route("/users/forgot-password", post(routes::users::forgot_password))
        .route("/users/reset-session", post(routes::users::reset_session));

    let protected_routes = Router::new()
        .route(
            "/users/:id",
            get(routes::users::get_user).put(routes::users::update_user),
        )
        .route("/users/reset-password", post(routes::users::reset_password))
        .route(
            "/projects",
            post(routes::projects::create_project).get(routes::projects::list_projects),
        )
        .route(
            "/projects/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route("/projects/:id/members", put(routes::projects::update_members))
        .route("/lists/:list_id/cards", post(routes::cards::create_card))
        .route(
            "/cards/:id",
            get(routes::cards::get_card)
                .put(routes::cards::update_card)
                .delete(routes::cards::delete_card),
        )
        .route("/cards/:id/comments", post(routes::comments::create_comment))
        .route(
            "/comments/:id",
            put(routes::comments::update_comment).delete(routes::comments::delete_comment),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_bearer,
        ));

    let api_routes = public_routes.merge(protected_routes);

    let prefix = state.config.api.prefix.clone();
    let router = if prefix.is_empty() {
        health_routes.merge(api_routes)
    } else {
        health_routes.nest(&prefix, api_routes)
    };

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
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
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

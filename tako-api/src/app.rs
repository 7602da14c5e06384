/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use tako_api::{app::AppState, config::Config};
/// use tako_shared::slack::SlackClient;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let email = config.email.build_sender()?;
/// let slack = SlackClient::new(config.slack_config(), config.slack.api_base.clone(), config.slack_timeout())?;
/// let state = AppState::new(pool, config, email, slack);
/// let app = tako_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tako_shared::{auth::middleware::AuthContext, email::EmailSender, slack::SlackClient};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Transactional email sender for the configured provider
    pub email: Arc<dyn EmailSender>,

    /// Slack Web API client
    pub slack: SlackClient,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, email: Arc<dyn EmailSender>, slack: SlackClient) -> Self {
        Self {
            db,
            config: Arc::new(config),
            email,
            slack,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Gets the Slack signing secret for webhook verification
    pub fn signing_secret(&self) -> &str {
        &self.config.slack.signing_secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /                        # Service banner (public)
/// ├── GET  /health                  # Health check (public)
/// ├── POST /request-access          # Issue and email an access key
/// ├── POST /verify-key              # Redeem a key for the install URL
/// ├── /auth/                        # Token issuing (public)
/// │   ├── POST /login
/// │   ├── POST /slack
/// │   └── POST /magic-link
/// ├── /slack/
/// │   ├── GET  /install             # Redirect to Slack
/// │   ├── GET  /oauth/callback      # OAuth exchange + workspace upsert
/// │   ├── POST /commands            # Slash commands (signed)
/// │   └── POST /interactions        # Modal and button payloads (signed)
/// ├── /tasks                        # Task CRUD (JWT)
/// │   ├── GET / POST
/// │   └── GET / PUT / DELETE /:id
/// └── /workspace/settings           # GET / PUT (JWT)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Public routes
    let public_routes = Router::new()
        .route("/", get(routes::health::index))
        .route("/health", get(routes::health::health_check))
        .route("/request-access", post(routes::access::request_access))
        .route("/verify-key", post(routes::access::verify_key));

    let auth_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/slack", post(routes::auth::slack_login))
        .route("/magic-link", post(routes::auth::magic_link));

    // Slack endpoints verify their own signatures on the raw body
    let slack_routes = Router::new()
        .route("/install", get(routes::slack::install))
        .route("/oauth/callback", get(routes::slack::oauth_callback))
        .route("/commands", post(routes::slack::commands))
        .route("/interactions", post(routes::slack::interactions));

    // Task and workspace API (require JWT authentication)
    let api_routes = Router::new()
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/tasks/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route(
            "/workspace/settings",
            get(routes::workspace::get_settings).put(routes::workspace::update_settings),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
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
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .nest("/auth", auth_routes)
        .nest("/slack", slack_routes)
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
/// Validates the bearer token and injects [`AuthContext`] into request
/// extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = AuthContext::from_headers(req.headers(), state.jwt_secret())?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

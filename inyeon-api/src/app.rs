/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use inyeon_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = inyeon_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    mailer::{LogMailer, Mailer},
    middleware::security::SecurityHeadersLayer,
    oauth::OAuthClient,
    places::PlaceSearchClient,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, patch, post, put},
    Router,
};
use chrono::FixedOffset;
use inyeon_shared::{auth::middleware::jwt_auth_middleware, calendar};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,

    pub config: Arc<Config>,

    /// Confirmation and recovery emails
    pub mailer: Arc<dyn Mailer>,

    pub places: PlaceSearchClient,

    pub oauth: OAuthClient,
}

impl AppState {
    /// Creates state with the logging mailer, which delivers nothing
    pub fn new(db: PgPool, config: Config) -> Self {
        tracing::warn!("No mail transport configured; confirmation and recovery emails are not delivered");
        Self::with_mailer(db, config, Arc::new(LogMailer::new()))
    }

    pub fn with_mailer(db: PgPool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        let http = reqwest::Client::new();

        Self {
            db,
            places: PlaceSearchClient::new(http.clone(), &config.places),
            oauth: OAuthClient::new(http, config.oauth.clone()),
            mailer,
            config: Arc::new(config),
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Offset used for month windows and the upcoming range
    pub fn calendar_offset(&self) -> FixedOffset {
        calendar::offset_from_minutes(self.config.calendar.utc_offset_minutes).unwrap_or_else(calendar::kst)
    }
}

/// Builds the complete router
///
/// ```text
/// /
/// ├── GET /health
/// └── /v1
///     ├── /auth
///     │   ├── POST /signup, /signin, /refresh, /password/reset, /recover
///     │   ├── GET  /duplicates/email, /duplicates/nickname, /confirm
///     │   ├── GET  /oauth/:provider, /oauth/:provider/callback
///     │   └── (bearer) POST /signout, PUT /password, GET /me
///     ├── /contacts (bearer)
///     │   ├── GET, POST /
///     │   ├── GET /pinned, /regular
///     │   ├── GET, PUT, DELETE /:id
///     │   └── PATCH /:id/pin
///     ├── /plans (bearer)
///     │   ├── GET, POST /
///     │   ├── GET /upcoming
///     │   ├── GET, PUT, DELETE /:id
///     │   └── PATCH /:id/dates
///     └── /places/search (bearer)
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let bearer = || axum::middleware::from_fn_with_state(state.clone(), jwt_auth_layer);

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_auth_routes = Router::new()
        .route("/signup", post(routes::auth::sign_up))
        .route("/signin", post(routes::auth::sign_in))
        .route("/refresh", post(routes::auth::refresh))
        .route("/duplicates/email", get(routes::auth::email_duplicate))
        .route("/duplicates/nickname", get(routes::auth::nickname_duplicate))
        .route("/confirm", get(routes::auth::confirm_email))
        .route("/password/reset", post(routes::auth::request_password_reset))
        .route("/recover", post(routes::auth::recover_session))
        .route("/oauth/:provider", get(routes::oauth::authorize))
        .route("/oauth/:provider/callback", get(routes::oauth::callback));

    let session_routes = Router::new()
        .route("/signout", post(routes::auth::sign_out))
        .route("/password", put(routes::auth::change_password))
        .route("/me", get(routes::auth::me))
        .layer(bearer());

    let contact_routes = Router::new()
        .route(
            "/",
            get(routes::contacts::list_contacts).post(routes::contacts::create_contact),
        )
        .route("/pinned", get(routes::contacts::list_pinned))
        .route("/regular", get(routes::contacts::list_regular))
        .route(
            "/:id",
            get(routes::contacts::get_contact)
                .put(routes::contacts::update_contact)
                .delete(routes::contacts::delete_contact),
        )
        .route("/:id/pin", patch(routes::contacts::pin_contact))
        .layer(bearer());

    let plan_routes = Router::new()
        .route(
            "/",
            get(routes::plans::list_monthly).post(routes::plans::create_plan),
        )
        .route("/upcoming", get(routes::plans::list_upcoming))
        .route(
            "/:id",
            get(routes::plans::get_plan)
                .put(routes::plans::update_plan)
                .delete(routes::plans::delete_plan),
        )
        .route("/:id/dates", patch(routes::plans::move_plan))
        .layer(bearer());

    let place_routes = Router::new()
        .route("/search", get(routes::places::search_places))
        .layer(bearer());

    let v1_routes = Router::new()
        .nest("/auth", public_auth_routes.merge(session_routes))
        .nest("/contacts", contact_routes)
        .nest("/plans", plan_routes)
        .nest("/places", place_routes);

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
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
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Bearer authentication; inserts `AuthContext` for the handlers
async fn jwt_auth_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    jwt_auth_middleware(state.jwt_secret().to_string(), req, next)
        .await
        .map_err(ApiError::from)
}

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
/// use taskboard_shared::cosmos::CosmosTaskStore;
/// use taskboard_shared::store::TaskStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let store = CosmosTaskStore::new(config.cosmos.clone())?;
/// store.init().await?;
///
/// let state = AppState::new(Arc::new(store), config.api);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::ApiConfig;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use taskboard_shared::store::TaskStore;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Task store gateway
    pub store: Arc<dyn TaskStore>,

    /// Server configuration
    pub config: Arc<ApiConfig>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn TaskStore>, config: ApiConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                 # Health check
/// ├── /api/                       # Task CRUD
/// │   ├── GET    /tasks           # List tasks
/// │   ├── POST   /tasks           # Create task (JSON or form)
/// │   ├── GET    /tasks/:id       # Get task
/// │   ├── PUT    /tasks/:id       # Replace task (JSON or form)
/// │   ├── DELETE /tasks/:id       # Delete task
/// │   └── *                       # JSON 404
/// └── GET /*                      # Static files, SPA fallback to index.html
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Compression (tower-http CompressionLayer)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new()
        .route("/health", get(routes::health::health_check));

    // Only paths under `/api/` are reserved; `/api` itself falls to the SPA
    let api_routes = Router::new()
        .route(
            "/api/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/api/tasks/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/api/", any(routes::api_not_found))
        .route("/api/*path", any(routes::api_not_found));

    let static_dir = &state.config.static_dir;
    let spa = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    let cors = cors_layer(&state.config);

    Router::new()
        .merge(health_routes)
        .merge(api_routes)
        .fallback_service(spa)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(CompressionLayer::new())
        .with_state(state)
}

/// Permissive CORS for `*`, otherwise an explicit origin list
fn cors_layer(config: &ApiConfig) -> CorsLayer {
    if config.cors_permissive() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
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
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

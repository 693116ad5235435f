use authz::Gate;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use database::{Database, SqliteResourceStore};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware_hooks;
pub mod models;
pub mod server;

#[cfg(test)]
mod middleware_hooks_tests;

// Re-export server functions for convenience
pub use server::{start_server_with_config, ApiConfig, Environment};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<Gate>,
    pub db: Arc<Database>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    /// Build the state with a gate backed by the SQLite resource store
    pub fn new(db: Arc<Database>, config: ApiConfig) -> Self {
        let store = SqliteResourceStore::new(db.clone());
        Self {
            gate: Arc::new(Gate::new(Arc::new(store))),
            db,
            config: Arc::new(config),
        }
    }

    pub fn verbose_errors(&self) -> bool {
        self.config.environment.verbose_errors()
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::resources::read_resource,
        handlers::authorize::authorize,
        handlers::authorize::authorize_platform,
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::ResourceResponse,
            models::AuthorizeRequest,
            models::PlatformAuthorizeRequest,
            models::AuthorizeResponse,
            models::HealthResponse,
            models::DatabaseHealth,
            error::ApiErrorResponse,
            error::ErrorDetail,
        )
    ),
    tags(
        (name = "resources", description = "Authorized resource reads"),
        (name = "authorization", description = "Decision endpoints for downstream services"),
        (name = "health", description = "Health check endpoints"),
    ),
    info(
        title = "Classgate API",
        version = "1.0.0",
        description = "Hierarchical multi-tenant authorization for classroom resources",
    ),
)]
pub struct ApiDoc;

/// Create the main API router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Resource routes run the gate before the handler
    let resources: Router<AppState> = Router::new()
        .route(
            "/resources/:kind/:id",
            get(handlers::resources::read_resource),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_hooks::authorization_middleware,
        ));

    // API v1 routes
    let api_v1: Router<AppState> = Router::new()
        .merge(resources)
        .route("/authorize", post(handlers::authorize::authorize))
        .route(
            "/authorize/platform",
            post(handlers::authorize::authorize_platform),
        )
        // Health check
        .route("/health", get(handlers::health::health_check))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_hooks::request_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_hooks::response_middleware,
        ));

    // Main router
    Router::new()
        .nest("/api/v1", api_v1)
        .merge(SwaggerUi::new("/api/v1/swagger").url("/api/v1/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header::ACCESS_CONTROL_REQUEST_METHOD, HeaderValue, Method},
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower::{service_fn, ServiceExt};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::config::SecurityConfig;
use crate::handlers::{categories, products, system, users};
use crate::middleware::error_stack_middleware;
use crate::state::AppState;

/// Build the full application router over the given state
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let router = Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        // Resources
        .merge(product_routes())
        .merge(category_routes())
        .merge(user_routes())
        .fallback(system::fallback)
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    let router = if config.is_production() {
        router
    } else {
        router.layer(middleware::from_fn(error_stack_middleware))
    };

    let router = with_cors(router, cors_layer(&config.security));

    if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// `CorsLayer` answers every OPTIONS request as a preflight. Plain OPTIONS
/// requests skip it so route handlers can report `Allow`.
fn with_cors(router: Router, cors: CorsLayer) -> Router {
    let plain = router.clone();
    let cors_router = router.layer(cors);

    let dispatch = service_fn(move |request: Request| {
        let preflight = request.method() != Method::OPTIONS
            || request.headers().contains_key(ACCESS_CONTROL_REQUEST_METHOD);
        let target = if preflight { cors_router.clone() } else { plain.clone() };
        async move { target.oneshot(request).await }
    });

    Router::new().fallback_service(dispatch)
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/products",
            get(products::products_list)
                .post(products::products_post)
                .options(products::products_options),
        )
        .route(
            "/api/products/:id",
            get(products::product_get)
                .put(products::product_put)
                .patch(products::product_patch)
                .delete(products::product_delete)
                .head(products::product_head)
                .options(products::products_options),
        )
}

fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/categories",
            get(categories::categories_list).post(categories::categories_post),
        )
        .route(
            "/api/categories/:id",
            get(categories::category_get)
                .put(categories::category_put)
                .delete(categories::category_delete),
        )
        .route(
            "/api/categories/:id/products",
            get(categories::category_products),
        )
}

fn user_routes() -> Router<AppState> {
    Router::new()
        // Public auth routes
        .route("/api/users/register", post(users::users_register))
        .route("/api/users/login", post(users::users_login))
        // Current user
        .route("/api/users/me", get(users::me_get))
        .route("/api/users/updateMe", patch(users::me_update))
        // Admin
        .route("/api/users", get(users::users_list))
        .route(
            "/api/users/:id",
            get(users::user_get)
                .patch(users::user_patch)
                .delete(users::user_delete),
        )
}

/// Permissive when no origins are configured, otherwise an explicit allow list
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

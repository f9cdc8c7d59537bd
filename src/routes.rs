use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let router = Router::new()
        // Public
        .merge(public_routes())
        // Protected, bearer token required
        .merge(session_routes().route_layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        )))
        // Global middleware
        .layer(CorsLayer::permissive());

    let router = if state.request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/health",
            get(public::health::health).options(public::preflight),
        )
        .route(
            "/api/verify-admin-password",
            post(public::admin::verify_admin_password)
                .options(public::preflight)
                .fallback(public::admin::method_not_allowed),
        )
}

fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/session/access", get(protected::session::access))
        .route("/api/session/permission", get(protected::session::permission))
        .route("/api/templates", get(protected::templates::list))
}

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

pub fn build_router(app_state: AppState) -> Router {
    let tenant_routes = Router::new()
        .route(
            "/api/shifts",
            get(handlers::shifts::list_shifts_handler).post(handlers::shifts::create_shift_handler),
        )
        .route(
            "/api/shifts/recent",
            get(handlers::shifts::list_recent_shifts_handler),
        )
        .route(
            "/api/shifts/{shift_id}",
            get(handlers::shifts::get_shift_handler).delete(handlers::shifts::delete_shift_handler),
        )
        .route(
            "/api/subscription",
            get(handlers::subscription::get_subscription_handler),
        )
        .route(
            "/api/subscription/trial",
            post(handlers::subscription::start_trial_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_tenant,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(tenant_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

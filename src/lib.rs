use axum::{
    Router,
    routing::{get, post},
};
use config::Config;
use sqlx::PgPool;

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
}

/// Builds the full application router: public auth routes plus the
/// token-protected asset and maintenance routes.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout));

    let protected_routes = Router::new()
        .route(
            "/assets",
            post(routes::asset::create_asset).get(routes::asset::list_assets),
        )
        .route(
            "/assets/{id}",
            get(routes::asset::get_asset)
                .put(routes::asset::update_asset)
                .delete(routes::asset::delete_asset),
        )
        .route(
            "/maintenances",
            post(routes::maintenance::create_maintenance),
        )
        .route(
            "/maintenances/summary",
            get(routes::maintenance::due_summary),
        )
        .route(
            "/maintenances/asset/{asset_id}",
            get(routes::maintenance::list_for_asset),
        )
        .route(
            "/maintenances/asset/{asset_id}/{id}",
            get(routes::maintenance::get_maintenance)
                .put(routes::maintenance::update_maintenance)
                .delete(routes::maintenance::delete_maintenance),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(middleware::log_errors))
        .with_state(state)
}

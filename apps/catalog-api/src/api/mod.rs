//! API routes module

pub mod health;
pub mod products;

use axum::Router;

use crate::state::AppState;

/// Routes nested under `/api`
pub fn routes(state: &AppState) -> Router {
    let router = Router::new().nest("/products", products::router(state));

    if state.config.admin_routes_enabled {
        tracing::warn!("Admin routes enabled: bulk delete is reachable at /api/admin/products");
        router.nest("/admin/products", products::admin_router(state))
    } else {
        router
    }
}

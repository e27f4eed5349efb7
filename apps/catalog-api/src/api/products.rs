//! Products API routes

use axum::Router;
use domain_products::{PgProductRepository, ProductService, handlers};

use crate::state::AppState;

fn service(state: &AppState) -> ProductService<PgProductRepository> {
    ProductService::new(PgProductRepository::new(state.db.clone()))
}

pub fn router(state: &AppState) -> Router {
    handlers::router(service(state))
}

pub fn admin_router(state: &AppState) -> Router {
    handlers::admin_router(service(state))
}

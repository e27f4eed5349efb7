//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for Catalog API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog API",
        version = "0.1.0",
        description = "Product catalog with images, lookup by id, slug or title",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api/products", api = domain_products::ApiDoc)
    )
)]
pub struct ApiDoc;

/// Docs for the routes actually mounted: admin paths only when enabled
pub fn openapi(admin_routes_enabled: bool) -> utoipa::openapi::OpenApi {
    let doc = ApiDoc::openapi();
    if admin_routes_enabled {
        doc.nest("/api/admin/products", domain_products::AdminApiDoc::openapi())
    } else {
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_paths_only_when_enabled() {
        let public = openapi(false);
        assert!(public.paths.paths.contains_key("/api/products"));
        assert!(!public.paths.paths.contains_key("/api/admin/products"));

        let with_admin = openapi(true);
        assert!(with_admin.paths.paths.contains_key("/api/admin/products"));
    }
}

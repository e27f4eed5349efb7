use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get},
};
use axum_helpers::{
    AuditEvent, AuditOutcome, ErrorResponse, UuidPath, ValidatedJson, ValidatedQuery,
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, DuplicateValueResponse,
        InternalServerErrorResponse, NotFoundResponse,
    },
};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::error::ProductResult;
use crate::models::{
    BulkDeleteQuery, BulkDeleteResponse, CreateProduct, PaginationQuery, ProductView,
    UpdateProduct,
};
use crate::repository::ProductRepository;
use crate::service::ProductService;

pub const PRODUCTS_TAG: &str = "products";

/// Value `?confirm=` must carry for the bulk delete to run
pub const BULK_DELETE_CONFIRMATION: &str = "delete-all-products";

#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        create_product,
        get_product,
        update_product,
        delete_product,
    ),
    components(
        schemas(ProductView, CreateProduct, UpdateProduct, ErrorResponse),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            DuplicateValueResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = PRODUCTS_TAG, description = "Product catalog endpoints")
    )
)]
pub struct ApiDoc;

/// OpenAPI for the admin router; merged into the app docs only when it is mounted
#[derive(OpenApi)]
#[openapi(
    paths(delete_all_products),
    components(schemas(BulkDeleteResponse))
)]
pub struct AdminApiDoc;

type SharedService<R> = Arc<ProductService<R>>;

/// Public product routes, to be nested under `/products`
pub fn router<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/{term}",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .with_state(Arc::new(service))
}

/// Destructive maintenance routes, to be nested under `/admin/products`
pub fn admin_router<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    Router::new()
        .route("/", delete(delete_all_products))
        .with_state(Arc::new(service))
}

/// List products page by page
#[utoipa::path(
    get,
    path = "",
    tag = PRODUCTS_TAG,
    params(PaginationQuery),
    responses(
        (status = 200, description = "Products with image URLs", body = Vec<ProductView>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository>(
    State(service): State<SharedService<R>>,
    ValidatedQuery(query): ValidatedQuery<PaginationQuery>,
) -> ProductResult<Json<Vec<ProductView>>> {
    let products = service.list_products(query).await?;
    Ok(Json(products))
}

/// Create a product with its images
#[utoipa::path(
    post,
    path = "",
    tag = PRODUCTS_TAG,
    request_body = CreateProduct,
    responses(
        (status = 201, description = "Product created", body = ProductView),
        (status = 400, description = "Invalid input, or title/slug already taken", body = ErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<R: ProductRepository>(
    State(service): State<SharedService<R>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateProduct>,
) -> ProductResult<impl IntoResponse> {
    let product = service.create_product(input).await?;

    AuditEvent::new(
        "product.create",
        Some(format!("product:{}", product.id)),
        AuditOutcome::Success,
    )
    .with_request_headers(&headers)
    .with_details(json!({
        "title": product.title,
        "slug": product.slug,
        "images": product.images.len(),
    }))
    .log();

    Ok((StatusCode::CREATED, Json(product)))
}

/// Find a product by id, slug or title
#[utoipa::path(
    get,
    path = "/{term}",
    tag = PRODUCTS_TAG,
    params(
        ("term" = String, Path, description = "Product UUID, slug, or title (case-insensitive)")
    ),
    responses(
        (status = 200, description = "Product found", body = ProductView),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: ProductRepository>(
    State(service): State<SharedService<R>>,
    Path(term): Path<String>,
) -> ProductResult<Json<ProductView>> {
    let product = service.find_one_plain(&term).await?;
    Ok(Json(product))
}

/// Update a product; a supplied `images` list replaces the stored one
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = PRODUCTS_TAG,
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateProduct,
    responses(
        (status = 200, description = "Product updated", body = ProductView),
        (status = 400, description = "Invalid input, or title/slug already taken", body = ErrorResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: ProductRepository>(
    State(service): State<SharedService<R>>,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateProduct>,
) -> ProductResult<Json<ProductView>> {
    let replaces_images = input.images.is_some();
    let product = service.update_product(id, input).await?;

    AuditEvent::new(
        "product.update",
        Some(format!("product:{}", id)),
        AuditOutcome::Success,
    )
    .with_request_headers(&headers)
    .with_details(json!({ "images_replaced": replaces_images }))
    .log();

    Ok(Json(product))
}

/// Delete a product and its images
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = PRODUCTS_TAG,
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<R: ProductRepository>(
    State(service): State<SharedService<R>>,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> ProductResult<StatusCode> {
    service.remove_product(id).await?;

    AuditEvent::new(
        "product.delete",
        Some(format!("product:{}", id)),
        AuditOutcome::Success,
    )
    .with_request_headers(&headers)
    .log();

    Ok(StatusCode::NO_CONTENT)
}

/// Delete every product. Requires `?confirm=delete-all-products`.
#[utoipa::path(
    delete,
    path = "",
    tag = PRODUCTS_TAG,
    params(BulkDeleteQuery),
    responses(
        (status = 200, description = "All products deleted", body = BulkDeleteResponse),
        (status = 400, description = "Missing or wrong confirmation"),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_all_products<R: ProductRepository>(
    State(service): State<SharedService<R>>,
    headers: HeaderMap,
    Query(query): Query<BulkDeleteQuery>,
) -> ProductResult<Json<BulkDeleteResponse>> {
    if query.confirm.as_deref() != Some(BULK_DELETE_CONFIRMATION) {
        AuditEvent::new("product.delete_all", None, AuditOutcome::Denied)
            .with_request_headers(&headers)
            .log();
        let mut errors = ValidationErrors::new();
        errors.add(
            "confirm",
            ValidationError::new("confirmation_required").with_message(
                format!("bulk delete requires confirm={}", BULK_DELETE_CONFIRMATION).into(),
            ),
        );
        return Err(errors.into());
    }

    match service.delete_all_products().await {
        Ok(deleted) => {
            AuditEvent::new("product.delete_all", None, AuditOutcome::Success)
                .with_request_headers(&headers)
                .with_details(json!({ "deleted": deleted }))
                .log();
            Ok(Json(BulkDeleteResponse { deleted }))
        }
        Err(err) => {
            AuditEvent::new("product.delete_all", None, AuditOutcome::Failure)
                .with_request_headers(&headers)
                .log();
            Err(err)
        }
    }
}

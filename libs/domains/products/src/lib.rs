//! Products Domain
//!
//! Product catalog with images, backed by PostgreSQL through Sea-ORM.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, audit events
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Validation, lookup dispatch, transactional update
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access + unit of work (Postgres and in-memory)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Domain types, DTOs, slug rules
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_products::{
//!     handlers,
//!     repository::InMemoryProductRepository,
//!     service::ProductService,
//! };
//!
//! let service = ProductService::new(InMemoryProductRepository::new());
//! let router = handlers::router(service);
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{ProductError, ProductResult};
pub use handlers::{AdminApiDoc, ApiDoc};
pub use models::{
    BulkDeleteQuery, BulkDeleteResponse, CreateProduct, PaginationQuery, Product, ProductImage,
    ProductView, UpdateProduct, slugify,
};
pub use postgres::PgProductRepository;
pub use repository::{InMemoryProductRepository, ProductRepository, ProductUnitOfWork};
pub use service::ProductService;

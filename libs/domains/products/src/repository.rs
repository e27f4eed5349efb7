use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{Product, ProductImage};

/// Repository trait for product persistence
///
/// Every read returns the product together with its images in stored order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert the product row and one row per image in a single write
    async fn create(&self, product: Product) -> ProductResult<Product>;

    async fn find_all(&self, limit: u64, offset: u64) -> ProductResult<Vec<Product>>;

    async fn find_by_id(&self, id: Uuid) -> ProductResult<Option<Product>>;

    /// Case-insensitive title match, or slug match against the lowercased term
    async fn find_by_title_or_slug(&self, term: &str) -> ProductResult<Option<Product>>;

    /// Open a transaction for a multi-step write
    async fn begin(&self) -> ProductResult<Box<dyn ProductUnitOfWork>>;

    /// Delete a product and, through the cascade, its images
    async fn remove(&self, id: Uuid) -> ProductResult<bool>;

    /// Delete every product; returns the number of product rows removed
    async fn delete_all(&self) -> ProductResult<u64>;
}

/// Writes that commit or roll back together.
///
/// Dropping a unit of work that was neither committed nor rolled back
/// discards its writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductUnitOfWork: Send {
    async fn delete_images(&mut self, product_id: Uuid) -> ProductResult<u64>;

    /// Persist the product's own columns; images are left alone
    async fn save_product(&mut self, product: &Product) -> ProductResult<()>;

    async fn insert_images(&mut self, product_id: Uuid, images: &[ProductImage])
    -> ProductResult<()>;

    async fn commit(&mut self) -> ProductResult<()>;

    async fn rollback(&mut self) -> ProductResult<()>;
}

/// In-memory repository for development and tests
///
/// Enforces the same title/slug uniqueness as the database and keeps
/// insertion order for listings.
#[derive(Clone, Default)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<Vec<Product>>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_unique(products: &[Product], candidate: &Product) -> ProductResult<()> {
    for other in products.iter().filter(|p| p.id != candidate.id) {
        if other.title == candidate.title {
            return Err(ProductError::Conflict(format!(
                "Key (title)=({}) already exists.",
                candidate.title
            )));
        }
        if other.slug == candidate.slug {
            return Err(ProductError::Conflict(format!(
                "Key (slug)=({}) already exists.",
                candidate.slug
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, product: Product) -> ProductResult<Product> {
        let mut products = self.products.write().await;
        check_unique(&products, &product)?;
        products.push(product.clone());
        tracing::info!(product_id = %product.id, "Created product");
        Ok(product)
    }

    async fn find_all(&self, limit: u64, offset: u64) -> ProductResult<Vec<Product>> {
        let products = self.products.read().await;
        Ok(products
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_title_or_slug(&self, term: &str) -> ProductResult<Option<Product>> {
        let title = term.to_uppercase();
        let slug = term.to_lowercase();
        let products = self.products.read().await;
        Ok(products
            .iter()
            .find(|p| p.title.to_uppercase() == title || p.slug == slug)
            .cloned())
    }

    async fn begin(&self) -> ProductResult<Box<dyn ProductUnitOfWork>> {
        let guard = self.products.clone().write_owned().await;
        let snapshot = guard.clone();
        Ok(Box::new(InMemoryUnitOfWork {
            guard: Some(guard),
            snapshot,
        }))
    }

    async fn remove(&self, id: Uuid) -> ProductResult<bool> {
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() < before)
    }

    async fn delete_all(&self) -> ProductResult<u64> {
        let mut products = self.products.write().await;
        let deleted = products.len() as u64;
        products.clear();
        Ok(deleted)
    }
}

/// Holds the write lock for its whole lifetime; restores the snapshot unless committed
struct InMemoryUnitOfWork {
    guard: Option<OwnedRwLockWriteGuard<Vec<Product>>>,
    snapshot: Vec<Product>,
}

impl InMemoryUnitOfWork {
    fn products(&mut self) -> ProductResult<&mut Vec<Product>> {
        self.guard
            .as_deref_mut()
            .ok_or_else(|| ProductError::Database("transaction already finished".to_string()))
    }

    fn product(&mut self, id: Uuid) -> ProductResult<&mut Product> {
        self.products()?
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ProductError::NotFound(format!("Product with id '{}' not found", id)))
    }

    fn restore(&mut self) {
        if let Some(mut guard) = self.guard.take() {
            *guard = std::mem::take(&mut self.snapshot);
        }
    }
}

#[async_trait]
impl ProductUnitOfWork for InMemoryUnitOfWork {
    async fn delete_images(&mut self, product_id: Uuid) -> ProductResult<u64> {
        let products = self.products()?;
        Ok(products
            .iter_mut()
            .find(|p| p.id == product_id)
            .map(|p| std::mem::take(&mut p.images).len() as u64)
            .unwrap_or(0))
    }

    async fn save_product(&mut self, product: &Product) -> ProductResult<()> {
        check_unique(self.products()?, product)?;
        let stored = self.product(product.id)?;
        let images = std::mem::take(&mut stored.images);
        *stored = Product {
            images,
            ..product.clone()
        };
        Ok(())
    }

    async fn insert_images(
        &mut self,
        product_id: Uuid,
        images: &[ProductImage],
    ) -> ProductResult<()> {
        self.product(product_id)?.images.extend_from_slice(images);
        Ok(())
    }

    async fn commit(&mut self) -> ProductResult<()> {
        self.guard
            .take()
            .map(drop)
            .ok_or_else(|| ProductError::Database("transaction already finished".to_string()))
    }

    async fn rollback(&mut self) -> ProductResult<()> {
        self.restore();
        Ok(())
    }
}

impl Drop for InMemoryUnitOfWork {
    fn drop(&mut self) {
        self.restore();
    }
}

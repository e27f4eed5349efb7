//! Product Service - Business logic layer

use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{ProductError, ProductResult};
use crate::models::{CreateProduct, PaginationQuery, Product, ProductView, UpdateProduct};
use crate::repository::ProductRepository;

pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

fn validate(input: &impl Validate) -> ProductResult<()> {
    Ok(input.validate()?)
}

fn require_slug(product: &Product) -> ProductResult<()> {
    if product.slug.is_empty() {
        let mut errors = ValidationErrors::new();
        errors.add(
            "slug",
            ValidationError::new("empty_slug")
                .with_message("slug must contain at least one letter or digit".into()),
        );
        return Err(errors.into());
    }
    Ok(())
}

/// Only the canonical hyphenated form counts as an id; the simple, braced and
/// URN forms are left to the title/slug lookup.
fn parse_product_id(term: &str) -> Option<Uuid> {
    Uuid::try_parse(term).ok().filter(|_| term.len() == 36)
}

fn id_not_found(id: Uuid) -> ProductError {
    ProductError::NotFound(format!("Product with id '{}' not found", id))
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_product(&self, input: CreateProduct) -> ProductResult<ProductView> {
        validate(&input)?;

        let product = Product::new(input);
        require_slug(&product)?;

        let created = self.repository.create(product).await?;
        Ok(created.into())
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self, query: PaginationQuery) -> ProductResult<Vec<ProductView>> {
        validate(&query)?;

        let products = self
            .repository
            .find_all(query.limit(), query.offset())
            .await?;
        Ok(products.into_iter().map(ProductView::from).collect())
    }

    /// Resolve `term` as an id when it is a hyphenated UUID, otherwise as a title or slug
    #[instrument(skip(self))]
    pub async fn find_one(&self, term: &str) -> ProductResult<Product> {
        let found = match parse_product_id(term) {
            Some(id) => self.repository.find_by_id(id).await?,
            None => self.repository.find_by_title_or_slug(term).await?,
        };

        found.ok_or_else(|| ProductError::NotFound(format!("Product with term '{}' not found", term)))
    }

    pub async fn find_one_plain(&self, term: &str) -> ProductResult<ProductView> {
        self.find_one(term).await.map(ProductView::from)
    }

    /// Merge `input` into the stored product and persist it in one transaction.
    ///
    /// When `input.images` is present every stored image is deleted and the new
    /// list inserted. Any failure rolls the whole write back.
    #[instrument(skip(self, input))]
    pub async fn update_product(&self, id: Uuid, input: UpdateProduct) -> ProductResult<ProductView> {
        validate(&input)?;

        let mut product = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| id_not_found(id))?;
        let new_images = product.apply_update(input);
        require_slug(&product)?;

        let mut uow = self.repository.begin().await?;
        let written = async {
            if new_images.is_some() {
                uow.delete_images(id).await?;
            }
            uow.save_product(&product).await?;
            if let Some(images) = &new_images {
                uow.insert_images(id, images).await?;
            }
            uow.commit().await
        }
        .await;

        if let Err(err) = written {
            if let Err(rollback_err) = uow.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            return Err(err);
        }
        drop(uow);

        tracing::info!(product_id = %id, images_replaced = new_images.is_some(), "Updated product");

        self.repository
            .find_by_id(id)
            .await?
            .map(ProductView::from)
            .ok_or_else(|| id_not_found(id))
    }

    #[instrument(skip(self))]
    pub async fn remove_product(&self, id: Uuid) -> ProductResult<()> {
        self.find_one(&id.to_string()).await?;

        if !self.repository.remove(id).await? {
            return Err(id_not_found(id));
        }
        Ok(())
    }

    /// Delete every product; returns how many were removed
    #[instrument(skip(self))]
    pub async fn delete_all_products(&self) -> ProductResult<u64> {
        self.repository.delete_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateProduct;
    use crate::repository::{MockProductRepository, MockProductUnitOfWork, ProductUnitOfWork};
    use mockall::predicate::*;

    fn chair() -> Product {
        Product::new(CreateProduct {
            title: "Chair".to_string(),
            slug: None,
            price: 10.0,
            description: None,
            stock: 2,
            tags: vec![],
            images: vec!["http://a/1.png".to_string(), "http://a/2.png".to_string()],
        })
    }

    #[tokio::test]
    async fn test_create_product_scenario() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_create()
            .withf(|p| p.slug == "chair" && p.images.len() == 1)
            .times(1)
            .returning(|p| Ok(p));

        let service = ProductService::new(mock_repo);
        let view = service
            .create_product(CreateProduct {
                title: "Chair".to_string(),
                slug: None,
                price: 10.0,
                description: None,
                stock: 0,
                tags: vec![],
                images: vec!["http://a/1.png".to_string()],
            })
            .await
            .unwrap();

        assert_eq!(view.slug, "chair");
        assert_eq!(view.price, 10.0);
        assert_eq!(view.images, vec!["http://a/1.png"]);
    }

    #[tokio::test]
    async fn test_create_product_rejects_negative_price() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_create().times(0);

        let service = ProductService::new(mock_repo);
        let result = service
            .create_product(CreateProduct {
                title: "Chair".to_string(),
                slug: None,
                price: -1.0,
                description: None,
                stock: 0,
                tags: vec![],
                images: vec![],
            })
            .await;

        assert!(matches!(result, Err(ProductError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_create_product_rejects_title_without_slug_characters() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_create().times(0);

        let service = ProductService::new(mock_repo);
        let result = service
            .create_product(CreateProduct {
                title: "!!!".to_string(),
                slug: None,
                price: 0.0,
                description: None,
                stock: 0,
                tags: vec![],
                images: vec![],
            })
            .await;

        assert!(matches!(result, Err(ProductError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_list_products_applies_default_pagination() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_find_all()
            .with(eq(10), eq(0))
            .times(1)
            .returning(|_, _| Ok(vec![chair()]));

        let service = ProductService::new(mock_repo);
        let views = service.list_products(PaginationQuery::default()).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].images.len(), 2);
    }

    #[tokio::test]
    async fn test_list_products_rejects_zero_limit() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_find_all().times(0);

        let service = ProductService::new(mock_repo);
        let result = service
            .list_products(PaginationQuery {
                limit: Some(0),
                offset: None,
            })
            .await;
        assert!(matches!(result, Err(ProductError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_find_one_dispatches_uuid_to_id_lookup() {
        let id = Uuid::now_v7();
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_find_by_id()
            .with(eq(id))
            .times(1)
            .returning(|_| Ok(None));
        mock_repo.expect_find_by_title_or_slug().times(0);

        let service = ProductService::new(mock_repo);
        let result = service.find_one(&id.to_string()).await;
        assert!(matches!(result, Err(ProductError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_one_dispatches_text_to_title_or_slug() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_find_by_id().times(0);
        mock_repo
            .expect_find_by_title_or_slug()
            .withf(|term| term == "CHAIR")
            .times(1)
            .returning(|_| Ok(Some(chair())));

        let service = ProductService::new(mock_repo);
        let view = service.find_one_plain("CHAIR").await.unwrap();
        assert_eq!(view.title, "Chair");
    }

    #[test]
    fn test_only_hyphenated_uuids_are_ids() {
        let id = Uuid::now_v7();
        assert_eq!(parse_product_id(&id.hyphenated().to_string()), Some(id));
        assert_eq!(parse_product_id(&id.simple().to_string()), None);
        assert_eq!(parse_product_id(&id.braced().to_string()), None);
        assert_eq!(parse_product_id(&id.urn().to_string()), None);
        assert_eq!(parse_product_id("chair"), None);
    }

    #[tokio::test]
    async fn test_find_one_sends_simple_hex_term_to_title_or_slug() {
        let term = "0123456789abcdef0123456789abcdef";
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_find_by_id().times(0);
        mock_repo
            .expect_find_by_title_or_slug()
            .withf(move |t| t == term)
            .times(1)
            .returning(|_| Ok(Some(chair())));

        let service = ProductService::new(mock_repo);
        assert!(service.find_one(term).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_empty_slug_names_the_field() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_create().times(0);

        let service = ProductService::new(mock_repo);
        let result = service
            .create_product(CreateProduct {
                title: "Chair".to_string(),
                slug: Some("---".to_string()),
                price: 0.0,
                description: None,
                stock: 0,
                tags: vec![],
                images: vec![],
            })
            .await;

        match result {
            Err(ProductError::InvalidInput(errors)) => {
                assert!(errors.field_errors().contains_key("slug"))
            }
            other => panic!("expected slug validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_missing_product_is_not_found() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_find_by_id().returning(|_| Ok(None));
        mock_repo.expect_begin().times(0);

        let service = ProductService::new(mock_repo);
        let result = service
            .update_product(Uuid::now_v7(), UpdateProduct::default())
            .await;
        assert!(matches!(result, Err(ProductError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_replaces_images_in_one_transaction() {
        let stored = chair();
        let id = stored.id;

        let mut uow = MockProductUnitOfWork::new();
        let mut seq = mockall::Sequence::new();
        uow.expect_delete_images()
            .with(eq(id))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(2));
        uow.expect_save_product()
            .withf(|p| p.title == "Armchair")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        uow.expect_insert_images()
            .withf(|_, images| images.len() == 1 && images[0].url == "http://a/3.png")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        uow.expect_commit()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        uow.expect_rollback().times(0);

        let mut after = stored.clone();
        after.title = "Armchair".to_string();
        after.images = vec![crate::models::ProductImage::new("http://a/3.png")];

        let mut mock_repo = MockProductRepository::new();
        let mut reads = vec![after, stored];
        mock_repo
            .expect_find_by_id()
            .with(eq(id))
            .times(2)
            .returning(move |_| Ok(reads.pop()));
        mock_repo
            .expect_begin()
            .times(1)
            .return_once(move || Ok(Box::new(uow) as Box<dyn ProductUnitOfWork>));

        let service = ProductService::new(mock_repo);
        let view = service
            .update_product(
                id,
                UpdateProduct {
                    title: Some("Armchair".to_string()),
                    images: Some(vec!["http://a/3.png".to_string()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(view.title, "Armchair");
        assert_eq!(view.images, vec!["http://a/3.png"]);
    }

    #[tokio::test]
    async fn test_update_without_images_leaves_them_alone() {
        let stored = chair();
        let id = stored.id;

        let mut uow = MockProductUnitOfWork::new();
        uow.expect_delete_images().times(0);
        uow.expect_insert_images().times(0);
        uow.expect_save_product().times(1).returning(|_| Ok(()));
        uow.expect_commit().times(1).returning(|| Ok(()));

        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        mock_repo
            .expect_begin()
            .return_once(move || Ok(Box::new(uow) as Box<dyn ProductUnitOfWork>));

        let service = ProductService::new(mock_repo);
        let view = service
            .update_product(
                id,
                UpdateProduct {
                    stock: Some(7),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(view.images.len(), 2);
    }

    #[tokio::test]
    async fn test_update_failure_after_image_delete_rolls_back() {
        let stored = chair();
        let id = stored.id;

        let mut uow = MockProductUnitOfWork::new();
        uow.expect_delete_images().times(1).returning(|_| Ok(2));
        uow.expect_save_product()
            .times(1)
            .returning(|_| Err(ProductError::Database("connection reset".to_string())));
        uow.expect_insert_images().times(0);
        uow.expect_commit().times(0);
        uow.expect_rollback().times(1).returning(|| Ok(()));

        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));
        mock_repo
            .expect_begin()
            .return_once(move || Ok(Box::new(uow) as Box<dyn ProductUnitOfWork>));

        let service = ProductService::new(mock_repo);
        let result = service
            .update_product(
                id,
                UpdateProduct {
                    images: Some(vec!["http://a/3.png".to_string()]),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(ProductError::Database(_))));
    }

    #[tokio::test]
    async fn test_update_conflict_surfaces_after_rollback() {
        let stored = chair();
        let id = stored.id;

        let mut uow = MockProductUnitOfWork::new();
        uow.expect_save_product().returning(|_| {
            Err(ProductError::Conflict(
                "Key (title)=(Table) already exists.".to_string(),
            ))
        });
        uow.expect_commit().times(0);
        uow.expect_rollback().times(1).returning(|| Ok(()));

        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        mock_repo
            .expect_begin()
            .return_once(move || Ok(Box::new(uow) as Box<dyn ProductUnitOfWork>));

        let service = ProductService::new(mock_repo);
        let result = service
            .update_product(
                id,
                UpdateProduct {
                    title: Some("Table".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(ProductError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_remove_missing_product_is_not_found() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_find_by_id().returning(|_| Ok(None));
        mock_repo.expect_remove().times(0);

        let service = ProductService::new(mock_repo);
        let result = service.remove_product(Uuid::now_v7()).await;
        assert!(matches!(result, Err(ProductError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_existing_product() {
        let stored = chair();
        let id = stored.id;

        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        mock_repo
            .expect_remove()
            .with(eq(id))
            .times(1)
            .returning(|_| Ok(true));

        let service = ProductService::new(mock_repo);
        service.remove_product(id).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_all_products_reports_count() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_delete_all().times(1).returning(|| Ok(3));

        let service = ProductService::new(mock_repo);
        assert_eq!(service.delete_all_products().await.unwrap(), 3);
    }
}

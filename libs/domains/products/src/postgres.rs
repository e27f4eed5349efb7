use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    entity::{self, image_rows, into_product, product, product_image},
    error::{ProductError, ProductResult},
    models::{Product, ProductImage},
    repository::{ProductRepository, ProductUnitOfWork},
};

#[derive(Clone)]
pub struct PgProductRepository {
    db: DatabaseConnection,
}

impl PgProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Load the image rows of `models` in one query and attach them in position order
    async fn with_images(&self, models: Vec<product::Model>) -> ProductResult<Vec<Product>> {
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let images = product_image::Entity::find()
            .filter(product_image::Column::ProductId.is_in(ids))
            .order_by_asc(product_image::Column::ProductId)
            .order_by_asc(product_image::Column::Position)
            .all(&self.db)
            .await?;

        let mut by_product: HashMap<Uuid, Vec<product_image::Model>> = HashMap::new();
        for image in images {
            by_product.entry(image.product_id).or_default().push(image);
        }

        models
            .into_iter()
            .map(|model| {
                let images = by_product.remove(&model.id).unwrap_or_default();
                into_product(model, images)
            })
            .collect()
    }

    async fn first_with_images(&self, model: Option<product::Model>) -> ProductResult<Option<Product>> {
        match model {
            Some(model) => Ok(self.with_images(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }
}

async fn insert_images<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    images: &[ProductImage],
) -> ProductResult<()> {
    if images.is_empty() {
        return Ok(());
    }
    product_image::Entity::insert_many(image_rows(product_id, images))
        .exec(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn create(&self, product: Product) -> ProductResult<Product> {
        let txn = self.db.begin().await?;

        product::ActiveModel::from(&product).insert(&txn).await?;
        insert_images(&txn, product.id, &product.images).await?;

        txn.commit().await?;

        tracing::info!(product_id = %product.id, images = product.images.len(), "Created product");
        Ok(product)
    }

    async fn find_all(&self, limit: u64, offset: u64) -> ProductResult<Vec<Product>> {
        let models = product::Entity::find()
            .order_by_asc(product::Column::CreatedAt)
            .order_by_asc(product::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&self.db)
            .await?;

        self.with_images(models).await
    }

    async fn find_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let model = product::Entity::find_by_id(id).one(&self.db).await?;
        self.first_with_images(model).await
    }

    async fn find_by_title_or_slug(&self, term: &str) -> ProductResult<Option<Product>> {
        let model = product::Entity::find()
            .filter(
                Condition::any()
                    .add(Expr::cust_with_values(
                        r#"UPPER("products"."title") = $1"#,
                        [term.to_uppercase()],
                    ))
                    .add(product::Column::Slug.eq(term.to_lowercase())),
            )
            .one(&self.db)
            .await?;

        self.first_with_images(model).await
    }

    async fn begin(&self) -> ProductResult<Box<dyn ProductUnitOfWork>> {
        let txn = self.db.begin().await?;
        Ok(Box::new(PgProductUnitOfWork { txn: Some(txn) }))
    }

    async fn remove(&self, id: Uuid) -> ProductResult<bool> {
        let result = product::Entity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected > 0 {
            tracing::info!(product_id = %id, "Deleted product");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn delete_all(&self) -> ProductResult<u64> {
        let result = product::Entity::delete_many().exec(&self.db).await?;
        tracing::info!(deleted = result.rows_affected, "Deleted all products");
        Ok(result.rows_affected)
    }
}

/// Wraps one database transaction. Sea-ORM rolls the transaction back if it
/// is dropped before `commit`.
pub struct PgProductUnitOfWork {
    txn: Option<DatabaseTransaction>,
}

impl PgProductUnitOfWork {
    fn txn(&self) -> ProductResult<&DatabaseTransaction> {
        self.txn
            .as_ref()
            .ok_or_else(|| ProductError::Database("transaction already finished".to_string()))
    }
}

#[async_trait]
impl ProductUnitOfWork for PgProductUnitOfWork {
    async fn delete_images(&mut self, product_id: Uuid) -> ProductResult<u64> {
        let result = product_image::Entity::delete_many()
            .filter(product_image::Column::ProductId.eq(product_id))
            .exec(self.txn()?)
            .await?;
        Ok(result.rows_affected)
    }

    async fn save_product(&mut self, product: &Product) -> ProductResult<()> {
        entity::product::ActiveModel::from(product)
            .update(self.txn()?)
            .await?;
        Ok(())
    }

    async fn insert_images(
        &mut self,
        product_id: Uuid,
        images: &[ProductImage],
    ) -> ProductResult<()> {
        insert_images(self.txn()?, product_id, images).await
    }

    async fn commit(&mut self) -> ProductResult<()> {
        let txn = self
            .txn
            .take()
            .ok_or_else(|| ProductError::Database("transaction already finished".to_string()))?;
        txn.commit().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> ProductResult<()> {
        if let Some(txn) = self.txn.take() {
            txn.rollback().await?;
        }
        Ok(())
    }
}

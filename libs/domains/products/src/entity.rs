//! Sea-ORM entities for the `products` and `product_images` tables.

use sea_orm::ActiveValue::Set;

use crate::error::{ProductError, ProductResult};
use crate::models::{Product, ProductImage};

pub mod product {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "products")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        #[sea_orm(column_type = "Text", unique)]
        pub title: String,
        #[sea_orm(column_type = "Text", unique)]
        pub slug: String,
        pub price: f64,
        #[sea_orm(column_type = "Text", nullable)]
        pub description: Option<String>,
        pub stock: i32,
        #[sea_orm(column_type = "JsonBinary")]
        pub tags: Json,
        pub created_at: DateTimeWithTimeZone,
        pub updated_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::product_image::Entity")]
        Images,
    }

    impl Related<super::product_image::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Images.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod product_image {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "product_images")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        #[sea_orm(column_type = "Text")]
        pub url: String,
        pub position: i32,
        pub product_id: Uuid,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::product::Entity",
            from = "Column::ProductId",
            to = "super::product::Column::Id",
            on_update = "Cascade",
            on_delete = "Cascade"
        )]
        Product,
    }

    impl Related<super::product::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Product.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Assemble the domain product from its row and its image rows (already ordered by position)
///
/// `tags` must be a JSON array of strings; anything else is a database error.
pub fn into_product(
    model: product::Model,
    images: Vec<product_image::Model>,
) -> ProductResult<Product> {
    let tags: Vec<String> = serde_json::from_value(model.tags).map_err(|e| {
        tracing::error!(product_id = %model.id, error = %e, "Malformed tags column");
        ProductError::Database(format!("malformed tags for product {}: {}", model.id, e))
    })?;

    Ok(Product {
        id: model.id,
        title: model.title,
        slug: model.slug,
        price: model.price,
        description: model.description,
        stock: model.stock,
        tags,
        images: images
            .into_iter()
            .map(|image| ProductImage {
                id: image.id,
                url: image.url,
            })
            .collect(),
        created_at: model.created_at.into(),
        updated_at: model.updated_at.into(),
    })
}

impl From<&Product> for product::ActiveModel {
    fn from(product: &Product) -> Self {
        product::ActiveModel {
            id: Set(product.id),
            title: Set(product.title.clone()),
            slug: Set(product.slug.clone()),
            price: Set(product.price),
            description: Set(product.description.clone()),
            stock: Set(product.stock),
            tags: Set(serde_json::Value::from(product.tags.clone())),
            created_at: Set(product.created_at.into()),
            updated_at: Set(product.updated_at.into()),
        }
    }
}

/// One active model per image; `position` follows slice order
pub fn image_rows(product_id: uuid::Uuid, images: &[ProductImage]) -> Vec<product_image::ActiveModel> {
    images
        .iter()
        .enumerate()
        .map(|(position, image)| product_image::ActiveModel {
            id: Set(image.id),
            url: Set(image.url.clone()),
            position: Set(position as i32),
            product_id: Set(product_id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn row(tags: serde_json::Value) -> product::Model {
        let now = Utc::now().fixed_offset();
        product::Model {
            id: Uuid::now_v7(),
            title: "Chair".to_string(),
            slug: "chair".to_string(),
            price: 10.0,
            description: None,
            stock: 1,
            tags,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_into_product_keeps_image_order() {
        let model = row(json!(["home"]));
        let images = (0..2)
            .map(|position| product_image::Model {
                id: Uuid::now_v7(),
                url: format!("http://a/{}.png", position),
                position,
                product_id: model.id,
            })
            .collect();

        let product = into_product(model, images).unwrap();
        assert_eq!(product.tags, vec!["home"]);
        let urls: Vec<_> = product.images.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, vec!["http://a/0.png", "http://a/1.png"]);
    }

    #[test]
    fn test_into_product_rejects_malformed_tags() {
        let result = into_product(row(json!({ "not": "a list" })), vec![]);
        assert!(matches!(result, Err(ProductError::Database(_))));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Page size used when the query string has no `limit`
pub const DEFAULT_LIMIT: u64 = 10;

/// Image attached to a product; the position is its index in `Product::images`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductImage {
    pub id: Uuid,
    pub url: String,
}

impl ProductImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            url: url.into(),
        }
    }
}

/// Product with its image rows, as held by the repositories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    /// Unique
    pub title: String,
    /// Unique, lowercase and hyphenated
    pub slug: String,
    pub price: f64,
    pub description: Option<String>,
    pub stock: i32,
    pub tags: Vec<String>,
    pub images: Vec<ProductImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the API returns: a product with images flattened to URLs in stored order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductView {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub price: f64,
    pub description: Option<String>,
    pub stock: i32,
    pub tags: Vec<String>,
    #[schema(example = json!(["http://cdn.example.com/chair-1.png"]))]
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            title: product.title,
            slug: product.slug,
            price: product.price,
            description: product.description,
            stock: product.stock,
            tags: product.tags,
            images: product.images.into_iter().map(|image| image.url).collect(),
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// DTO for creating a product
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProduct {
    #[validate(length(min = 1))]
    #[schema(example = "Chair")]
    pub title: String,
    /// Derived from the title when absent
    pub slug: Option<String>,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub price: f64,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Image URLs, stored in the given order
    #[serde(default)]
    pub images: Vec<String>,
}

/// DTO for a partial update. `images`, when present, replaces every stored image.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProduct {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    pub slug: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    /// Absent keeps the stored description, `null` clears it
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
}

/// Wrap any present value, `null` included, in `Some`
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// `?limit=&offset=` for listings. Absent values fall back to 10 / 0.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    /// Maximum number of products to return (at least 1)
    #[validate(range(min = 1))]
    pub limit: Option<i64>,
    /// Number of products to skip
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

impl PaginationQuery {
    pub fn limit(&self) -> u64 {
        self.limit.map_or(DEFAULT_LIMIT, |limit| limit.max(1) as u64)
    }

    pub fn offset(&self) -> u64 {
        self.offset.map_or(0, |offset| offset.max(0) as u64)
    }
}

/// `?confirm=` guard for the bulk delete endpoint
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BulkDeleteQuery {
    /// Must equal `delete-all-products`
    pub confirm: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkDeleteResponse {
    pub deleted: u64,
}

impl Product {
    /// Build a new product from the create DTO, assigning ids and normalising the slug
    pub fn new(input: CreateProduct) -> Self {
        let now = Utc::now();
        let slug = slugify(input.slug.as_deref().unwrap_or(&input.title));

        Self {
            id: Uuid::now_v7(),
            title: input.title,
            slug,
            price: input.price,
            description: input.description,
            stock: input.stock,
            tags: input.tags,
            images: input.images.into_iter().map(ProductImage::new).collect(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge the supplied fields.
    ///
    /// Returns the replacement images when the update carries an image list;
    /// `self.images` is swapped for them as well.
    pub fn apply_update(&mut self, update: UpdateProduct) -> Option<Vec<ProductImage>> {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(slug) = update.slug {
            self.slug = slug;
        }
        self.slug = slugify(&self.slug);
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(stock) = update.stock {
            self.stock = stock;
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        self.updated_at = Utc::now();

        update.images.map(|urls| {
            let images: Vec<ProductImage> = urls.into_iter().map(ProductImage::new).collect();
            self.images = images.clone();
            images
        })
    }
}

/// Lowercase, collapse every run of non-alphanumeric characters into one `-`,
/// and trim dashes from both ends.
///
/// ```
/// use domain_products::models::slugify;
///
/// assert_eq!(slugify("  Men's Chill Crew Neck "), "men-s-chill-crew-neck");
/// ```
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

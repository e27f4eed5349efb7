//! Test support for the catalog crates
//!
//! - `TestDatabase`: PostgreSQL container with the workspace migrations applied (feature: "postgres")
//! - `TestDataBuilder`: per-test titles and image URLs that never collide across tests
//! - `assertions`: assertion helpers with context in the panic message
//!
//! ```rust,no_run
//! use test_utils::{TestDatabase, TestDataBuilder};
//!
//! #[tokio::test]
//! async fn creates_a_product() {
//!     let db = TestDatabase::new().await;
//!     let builder = TestDataBuilder::from_test_name("creates_a_product");
//!
//!     let title = builder.title("chair");
//!     let image = builder.image_url(1);
//! }
//! ```

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::TestDatabase;

/// Seeded generator for catalog test data
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed from a hash of the test name
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let a = TestDataBuilder::from_test_name("test_update_product");
    /// let b = TestDataBuilder::from_test_name("test_update_product");
    /// assert_eq!(a.title("chair"), b.title("chair"));
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Product title; titles are unique in the catalog, so the seed is part of it
    pub fn title(&self, suffix: &str) -> String {
        format!("Test Product {} {}", self.seed, suffix)
    }

    pub fn image_url(&self, n: usize) -> String {
        format!("http://img-{}.test/{}.png", self.seed, n)
    }
}

pub mod assertions {
    use uuid::Uuid;

    pub fn assert_uuid_eq(actual: Uuid, expected: Uuid, context: &str) {
        assert_eq!(
            actual, expected,
            "{}: expected UUID {}, got {}",
            context, expected, actual
        );
    }

    /// Unwrap `value`, panicking with `context` when it is `None`
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }
}

//! Storage seams consumed by the catalog engine.
//!
//! Every engine operation takes a single `&mut` unit of work implementing the
//! traits it needs. A unit of work is one storage transaction: the caller
//! commits it after a successful operation, and dropping it uncommitted
//! discards every write made through it.
//!
//! Backends:
//! - `stockroom_db::PgCatalog` (Postgres transaction)
//! - [`crate::memory::MemoryUnitOfWork`] (in-process, used by tests)

use async_trait::async_trait;

use crate::barcode::Barcode;
use crate::category::{Category, CategoryStatistics};
use crate::product::Product;
use crate::types::DbId;
use crate::variant::{ProductVariant, VariantCombination, VariantOption, VariantOptionValue};

/// Failure reported by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend itself failed (connection lost, query error, ...).
    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A write was rejected by a uniqueness or referential constraint.
    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl StoreError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Backend(Box::new(err))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[async_trait]
pub trait CategoryStore: Send {
    /// Fetch one category; `product_count` is populated on read.
    async fn get_category(&mut self, id: DbId) -> StoreResult<Option<Category>>;

    /// Bulk fetch. Unknown ids are silently absent from the result.
    async fn get_categories(&mut self, ids: &[DbId]) -> StoreResult<Vec<Category>>;

    /// All categories ordered by `position`, then `name`.
    async fn find_all_categories(&mut self) -> StoreResult<Vec<Category>>;

    /// Direct children of `parent_id` ordered by `position`, then `name`.
    async fn find_children(&mut self, parent_id: DbId) -> StoreResult<Vec<Category>>;

    async fn category_exists(&mut self, id: DbId) -> StoreResult<bool>;

    /// Whether `slug` is used by any category other than `excluding`.
    async fn slug_taken(&mut self, slug: &str, excluding: Option<DbId>) -> StoreResult<bool>;

    /// Insert or replace a category by id.
    async fn save_category(&mut self, category: &Category) -> StoreResult<Category>;

    /// Insert or replace many categories as one batch.
    async fn save_categories(&mut self, categories: &[Category]) -> StoreResult<Vec<Category>>;

    /// Delete the given categories. Returns the number of rows removed.
    async fn delete_categories(&mut self, ids: &[DbId]) -> StoreResult<u64>;

    async fn category_statistics(&mut self) -> StoreResult<CategoryStatistics> {
        let all = self.find_all_categories().await?;
        Ok(CategoryStatistics::from_categories(&all))
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ProductStore: Send {
    async fn get_product(&mut self, id: DbId) -> StoreResult<Option<Product>>;

    /// Page through products ordered by `created_at` descending.
    async fn find_products(&mut self, limit: i64, offset: i64) -> StoreResult<Vec<Product>>;

    async fn count_products(&mut self) -> StoreResult<i64>;

    /// Case-insensitive substring match on name or sku.
    async fn search_products(&mut self, query: &str) -> StoreResult<Vec<Product>>;

    /// Products whose category is `category_id` or a direct child of it.
    async fn find_products_by_category_or_parent(
        &mut self,
        category_id: DbId,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Product>>;

    /// Whether `sku` is used by any product other than `excluding`.
    async fn product_sku_taken(&mut self, sku: &str, excluding: Option<DbId>)
        -> StoreResult<bool>;

    /// Number of products referencing any of the given categories.
    async fn count_products_in_categories(&mut self, category_ids: &[DbId]) -> StoreResult<i64>;

    async fn save_product(&mut self, product: &Product) -> StoreResult<Product>;

    /// Delete a product together with its variants, their combinations,
    /// and every barcode pointing at any of them.
    async fn delete_product(&mut self, id: DbId) -> StoreResult<bool>;
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

#[async_trait]
pub trait VariantStore: Send {
    async fn get_variant(&mut self, id: DbId) -> StoreResult<Option<ProductVariant>>;

    async fn find_variant_by_sku(&mut self, sku: &str) -> StoreResult<Option<ProductVariant>>;

    /// Variants of a product ordered by sku.
    async fn find_variants_by_product(&mut self, product_id: DbId)
        -> StoreResult<Vec<ProductVariant>>;

    async fn save_variant(&mut self, variant: &ProductVariant) -> StoreResult<ProductVariant>;

    /// Insert new variants and their combination rows as one batch.
    async fn insert_variants(
        &mut self,
        variants: &[ProductVariant],
        combinations: &[VariantCombination],
    ) -> StoreResult<Vec<ProductVariant>>;

    /// Option values linked to a variant, ordered by option position.
    async fn find_variant_values(&mut self, variant_id: DbId)
        -> StoreResult<Vec<VariantOptionValue>>;
}

// ---------------------------------------------------------------------------
// Options and option values
// ---------------------------------------------------------------------------

#[async_trait]
pub trait OptionStore: Send {
    async fn get_option(&mut self, id: DbId) -> StoreResult<Option<VariantOption>>;

    /// All options ordered by `position`, then `name`.
    async fn find_all_options(&mut self) -> StoreResult<Vec<VariantOption>>;

    async fn save_option(&mut self, option: &VariantOption) -> StoreResult<VariantOption>;

    /// Delete an option and its values. Returns `false` if it did not exist.
    async fn delete_option(&mut self, id: DbId) -> StoreResult<bool>;

    /// Whether any value of the option is referenced by a variant combination.
    async fn option_in_use(&mut self, option_id: DbId) -> StoreResult<bool>;

    async fn get_option_value(&mut self, id: DbId) -> StoreResult<Option<VariantOptionValue>>;

    /// Bulk fetch. Unknown ids are silently absent from the result.
    async fn get_option_values(&mut self, ids: &[DbId]) -> StoreResult<Vec<VariantOptionValue>>;

    /// Values of an option ordered by `position`, then `value`.
    async fn find_values_by_option(&mut self, option_id: DbId)
        -> StoreResult<Vec<VariantOptionValue>>;

    async fn save_option_value(
        &mut self,
        value: &VariantOptionValue,
    ) -> StoreResult<VariantOptionValue>;

    async fn delete_option_value(&mut self, id: DbId) -> StoreResult<bool>;

    /// Whether the value is referenced by a variant combination.
    async fn option_value_in_use(&mut self, value_id: DbId) -> StoreResult<bool>;
}

// ---------------------------------------------------------------------------
// Barcodes
// ---------------------------------------------------------------------------

#[async_trait]
pub trait BarcodeStore: Send {
    async fn find_by_code(&mut self, code: &str) -> StoreResult<Option<Barcode>>;

    async fn exists_by_code(&mut self, code: &str) -> StoreResult<bool>;

    async fn save_barcode(&mut self, barcode: &Barcode) -> StoreResult<Barcode>;

    async fn delete_barcode(&mut self, code: &str) -> StoreResult<bool>;

    async fn find_barcodes_by_product(&mut self, product_id: DbId) -> StoreResult<Vec<Barcode>>;

    async fn find_barcodes_by_variant(&mut self, variant_id: DbId) -> StoreResult<Vec<Barcode>>;
}

/// Everything the engine can ask of a unit of work.
pub trait CatalogStore:
    CategoryStore + ProductStore + VariantStore + OptionStore + BarcodeStore
{
}

impl<T> CatalogStore for T where
    T: CategoryStore + ProductStore + VariantStore + OptionStore + BarcodeStore
{
}

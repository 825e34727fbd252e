//! Transaction-scoped Postgres implementation of the core store traits.
//!
//! One [`PgCatalog`] is one unit of work: writes become visible only after
//! [`PgCatalog::commit`], and dropping it rolls the transaction back.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use stockroom_core::barcode::Barcode;
use stockroom_core::category::{Category, CategoryStatistics};
use stockroom_core::product::Product;
use stockroom_core::store::{
    BarcodeStore, CategoryStore, OptionStore, ProductStore, StoreError, StoreResult, VariantStore,
};
use stockroom_core::types::DbId;
use stockroom_core::variant::{ProductVariant, VariantCombination, VariantOption, VariantOptionValue};

use crate::repositories::{BarcodeRepo, CategoryRepo, OptionRepo, ProductRepo, VariantRepo};

/// PostgreSQL unique violation.
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL foreign key violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Map a driver error onto the store taxonomy. Unique and foreign key
/// violations become [`StoreError::Constraint`] carrying the constraint name.
pub fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let code = db_err.code();
        if matches!(code.as_deref(), Some(UNIQUE_VIOLATION | FOREIGN_KEY_VIOLATION)) {
            let constraint = db_err.constraint().unwrap_or("unknown");
            return StoreError::Constraint(constraint.to_string());
        }
    }
    StoreError::backend(err)
}

fn convert_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// A catalog unit of work over one Postgres transaction.
pub struct PgCatalog {
    tx: Transaction<'static, Postgres>,
}

impl PgCatalog {
    pub async fn begin(pool: &PgPool) -> Result<Self, sqlx::Error> {
        Ok(Self {
            tx: pool.begin().await?,
        })
    }

    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }

    fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[async_trait]
impl CategoryStore for PgCatalog {
    async fn get_category(&mut self, id: DbId) -> StoreResult<Option<Category>> {
        let row = CategoryRepo::find_by_id(self.conn(), id)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Category::from))
    }

    async fn get_categories(&mut self, ids: &[DbId]) -> StoreResult<Vec<Category>> {
        let rows = CategoryRepo::find_by_ids(self.conn(), ids)
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn find_all_categories(&mut self) -> StoreResult<Vec<Category>> {
        let rows = CategoryRepo::list(self.conn()).await.map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn find_children(&mut self, parent_id: DbId) -> StoreResult<Vec<Category>> {
        let rows = CategoryRepo::list_children(self.conn(), parent_id)
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn category_exists(&mut self, id: DbId) -> StoreResult<bool> {
        CategoryRepo::exists(self.conn(), id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn slug_taken(&mut self, slug: &str, excluding: Option<DbId>) -> StoreResult<bool> {
        CategoryRepo::slug_taken(self.conn(), slug, excluding)
            .await
            .map_err(map_sqlx_error)
    }

    async fn save_category(&mut self, category: &Category) -> StoreResult<Category> {
        let row = CategoryRepo::upsert(self.conn(), category)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn save_categories(&mut self, categories: &[Category]) -> StoreResult<Vec<Category>> {
        let mut saved = Vec::with_capacity(categories.len());
        for category in categories {
            saved.push(self.save_category(category).await?);
        }
        Ok(saved)
    }

    async fn delete_categories(&mut self, ids: &[DbId]) -> StoreResult<u64> {
        CategoryRepo::delete_many(self.conn(), ids)
            .await
            .map_err(map_sqlx_error)
    }

    async fn category_statistics(&mut self) -> StoreResult<CategoryStatistics> {
        let row = CategoryRepo::statistics(self.conn())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[async_trait]
impl ProductStore for PgCatalog {
    async fn get_product(&mut self, id: DbId) -> StoreResult<Option<Product>> {
        let row = ProductRepo::find_by_id(self.conn(), id)
            .await
            .map_err(map_sqlx_error)?;
        row.map(Product::try_from).transpose()
    }

    async fn find_products(&mut self, limit: i64, offset: i64) -> StoreResult<Vec<Product>> {
        let rows = ProductRepo::list(self.conn(), limit, offset)
            .await
            .map_err(map_sqlx_error)?;
        convert_all(rows)
    }

    async fn count_products(&mut self) -> StoreResult<i64> {
        ProductRepo::count(self.conn()).await.map_err(map_sqlx_error)
    }

    async fn search_products(&mut self, query: &str) -> StoreResult<Vec<Product>> {
        let rows = ProductRepo::search(self.conn(), query)
            .await
            .map_err(map_sqlx_error)?;
        convert_all(rows)
    }

    async fn find_products_by_category_or_parent(
        &mut self,
        category_id: DbId,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Product>> {
        let rows = ProductRepo::list_by_category_or_parent(self.conn(), category_id, limit, offset)
            .await
            .map_err(map_sqlx_error)?;
        convert_all(rows)
    }

    async fn product_sku_taken(&mut self, sku: &str, excluding: Option<DbId>) -> StoreResult<bool> {
        ProductRepo::sku_taken(self.conn(), sku, excluding)
            .await
            .map_err(map_sqlx_error)
    }

    async fn count_products_in_categories(&mut self, category_ids: &[DbId]) -> StoreResult<i64> {
        ProductRepo::count_in_categories(self.conn(), category_ids)
            .await
            .map_err(map_sqlx_error)
    }

    async fn save_product(&mut self, product: &Product) -> StoreResult<Product> {
        let row = ProductRepo::upsert(self.conn(), product)
            .await
            .map_err(map_sqlx_error)?;
        row.try_into()
    }

    async fn delete_product(&mut self, id: DbId) -> StoreResult<bool> {
        ProductRepo::delete(self.conn(), id)
            .await
            .map_err(map_sqlx_error)
    }
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

#[async_trait]
impl VariantStore for PgCatalog {
    async fn get_variant(&mut self, id: DbId) -> StoreResult<Option<ProductVariant>> {
        let row = VariantRepo::find_by_id(self.conn(), id)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(ProductVariant::from))
    }

    async fn find_variant_by_sku(&mut self, sku: &str) -> StoreResult<Option<ProductVariant>> {
        let row = VariantRepo::find_by_sku(self.conn(), sku)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(ProductVariant::from))
    }

    async fn find_variants_by_product(&mut self, product_id: DbId) -> StoreResult<Vec<ProductVariant>> {
        let rows = VariantRepo::list_by_product(self.conn(), product_id)
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(ProductVariant::from).collect())
    }

    async fn save_variant(&mut self, variant: &ProductVariant) -> StoreResult<ProductVariant> {
        let row = VariantRepo::upsert(self.conn(), variant)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn insert_variants(
        &mut self,
        variants: &[ProductVariant],
        combinations: &[VariantCombination],
    ) -> StoreResult<Vec<ProductVariant>> {
        let mut saved = Vec::with_capacity(variants.len());
        for variant in variants {
            saved.push(self.save_variant(variant).await?);
        }
        for combination in combinations {
            VariantRepo::insert_combination(self.conn(), combination)
                .await
                .map_err(map_sqlx_error)?;
        }
        Ok(saved)
    }

    async fn find_variant_values(&mut self, variant_id: DbId) -> StoreResult<Vec<VariantOptionValue>> {
        let rows = VariantRepo::values_for_variant(self.conn(), variant_id)
            .await
            .map_err(map_sqlx_error)?;
        convert_all(rows)
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[async_trait]
impl OptionStore for PgCatalog {
    async fn get_option(&mut self, id: DbId) -> StoreResult<Option<VariantOption>> {
        let row = OptionRepo::find_by_id(self.conn(), id)
            .await
            .map_err(map_sqlx_error)?;
        row.map(VariantOption::try_from).transpose()
    }

    async fn find_all_options(&mut self) -> StoreResult<Vec<VariantOption>> {
        let rows = OptionRepo::list(self.conn()).await.map_err(map_sqlx_error)?;
        convert_all(rows)
    }

    async fn save_option(&mut self, option: &VariantOption) -> StoreResult<VariantOption> {
        let row = OptionRepo::upsert(self.conn(), option)
            .await
            .map_err(map_sqlx_error)?;
        row.try_into()
    }

    async fn delete_option(&mut self, id: DbId) -> StoreResult<bool> {
        OptionRepo::delete(self.conn(), id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn option_in_use(&mut self, option_id: DbId) -> StoreResult<bool> {
        OptionRepo::in_use(self.conn(), option_id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn get_option_value(&mut self, id: DbId) -> StoreResult<Option<VariantOptionValue>> {
        let row = OptionRepo::find_value(self.conn(), id)
            .await
            .map_err(map_sqlx_error)?;
        row.map(VariantOptionValue::try_from).transpose()
    }

    async fn get_option_values(&mut self, ids: &[DbId]) -> StoreResult<Vec<VariantOptionValue>> {
        let rows = OptionRepo::find_values_by_ids(self.conn(), ids)
            .await
            .map_err(map_sqlx_error)?;
        convert_all(rows)
    }

    async fn find_values_by_option(&mut self, option_id: DbId) -> StoreResult<Vec<VariantOptionValue>> {
        let rows = OptionRepo::list_values(self.conn(), option_id)
            .await
            .map_err(map_sqlx_error)?;
        convert_all(rows)
    }

    async fn save_option_value(&mut self, value: &VariantOptionValue) -> StoreResult<VariantOptionValue> {
        let row = OptionRepo::upsert_value(self.conn(), value)
            .await
            .map_err(map_sqlx_error)?;
        row.try_into()
    }

    async fn delete_option_value(&mut self, id: DbId) -> StoreResult<bool> {
        OptionRepo::delete_value(self.conn(), id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn option_value_in_use(&mut self, value_id: DbId) -> StoreResult<bool> {
        OptionRepo::value_in_use(self.conn(), value_id)
            .await
            .map_err(map_sqlx_error)
    }
}

// ---------------------------------------------------------------------------
// Barcodes
// ---------------------------------------------------------------------------

#[async_trait]
impl BarcodeStore for PgCatalog {
    async fn find_by_code(&mut self, code: &str) -> StoreResult<Option<Barcode>> {
        let row = BarcodeRepo::find_by_code(self.conn(), code)
            .await
            .map_err(map_sqlx_error)?;
        row.map(Barcode::try_from).transpose()
    }

    async fn exists_by_code(&mut self, code: &str) -> StoreResult<bool> {
        BarcodeRepo::exists(self.conn(), code)
            .await
            .map_err(map_sqlx_error)
    }

    async fn save_barcode(&mut self, barcode: &Barcode) -> StoreResult<Barcode> {
        let row = BarcodeRepo::insert(self.conn(), barcode)
            .await
            .map_err(map_sqlx_error)?;
        row.try_into()
    }

    async fn delete_barcode(&mut self, code: &str) -> StoreResult<bool> {
        BarcodeRepo::delete(self.conn(), code)
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_barcodes_by_product(&mut self, product_id: DbId) -> StoreResult<Vec<Barcode>> {
        let rows = BarcodeRepo::list_by_product(self.conn(), product_id)
            .await
            .map_err(map_sqlx_error)?;
        convert_all(rows)
    }

    async fn find_barcodes_by_variant(&mut self, variant_id: DbId) -> StoreResult<Vec<Barcode>> {
        let rows = BarcodeRepo::list_by_variant(self.conn(), variant_id)
            .await
            .map_err(map_sqlx_error)?;
        convert_all(rows)
    }
}

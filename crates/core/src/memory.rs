//! In-process catalog store.
//!
//! [`MemoryCatalog`] holds the shared state behind a tokio mutex. A
//! [`MemoryUnitOfWork`] owns the lock for its whole lifetime and mutates a
//! private copy; [`MemoryUnitOfWork::commit`] swaps the copy in, and dropping
//! it uncommitted leaves the shared state untouched. Uniqueness rules mirror
//! the Postgres schema so engine tests see the same constraint failures.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::barcode::Barcode;
use crate::category::Category;
use crate::product::Product;
use crate::store::{
    BarcodeStore, CategoryStore, OptionStore, ProductStore, StoreError, StoreResult, VariantStore,
};
use crate::types::DbId;
use crate::variant::{ProductVariant, VariantCombination, VariantOption, VariantOptionValue};

/// Every table of the catalog, keyed by primary key.
#[derive(Debug, Clone, Default)]
pub struct CatalogState {
    pub categories: HashMap<DbId, Category>,
    pub products: HashMap<DbId, Product>,
    pub variants: HashMap<DbId, ProductVariant>,
    pub combinations: Vec<VariantCombination>,
    pub options: HashMap<DbId, VariantOption>,
    pub values: HashMap<DbId, VariantOptionValue>,
    pub barcodes: BTreeMap<String, Barcode>,
}

impl CatalogState {
    fn product_count(&self, category_id: DbId) -> i64 {
        self.products
            .values()
            .filter(|p| p.category_id == category_id)
            .count() as i64
    }

    fn with_count(&self, category: &Category) -> Category {
        let mut category = category.clone();
        category.product_count = self.product_count(category.id);
        category
    }

    fn sorted_categories<'a>(&self, categories: impl Iterator<Item = &'a Category>) -> Vec<Category> {
        let mut out: Vec<Category> = categories.map(|c| self.with_count(c)).collect();
        out.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.name.cmp(&b.name)));
        out
    }
}

/// Shared handle to an in-memory catalog. Cloning shares the state.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    state: Arc<Mutex<CatalogState>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a unit of work. Waits until any other unit of work is dropped.
    pub async fn begin(&self) -> MemoryUnitOfWork {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        MemoryUnitOfWork { guard, working }
    }

    /// Copy of the committed state.
    pub async fn snapshot(&self) -> CatalogState {
        self.state.lock().await.clone()
    }
}

/// One transaction against a [`MemoryCatalog`].
pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<CatalogState>,
    working: CatalogState,
}

impl MemoryUnitOfWork {
    /// Publish every write made through this unit of work.
    pub fn commit(mut self) {
        *self.guard = std::mem::take(&mut self.working);
    }

    /// Uncommitted view, for assertions inside a test.
    pub fn state(&self) -> &CatalogState {
        &self.working
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[async_trait]
impl CategoryStore for MemoryUnitOfWork {
    async fn get_category(&mut self, id: DbId) -> StoreResult<Option<Category>> {
        let s = &self.working;
        Ok(s.categories.get(&id).map(|c| s.with_count(c)))
    }

    async fn get_categories(&mut self, ids: &[DbId]) -> StoreResult<Vec<Category>> {
        let s = &self.working;
        let wanted: HashSet<&DbId> = ids.iter().collect();
        Ok(s.sorted_categories(s.categories.values().filter(|c| wanted.contains(&c.id))))
    }

    async fn find_all_categories(&mut self) -> StoreResult<Vec<Category>> {
        let s = &self.working;
        Ok(s.sorted_categories(s.categories.values()))
    }

    async fn find_children(&mut self, parent_id: DbId) -> StoreResult<Vec<Category>> {
        let s = &self.working;
        Ok(s.sorted_categories(
            s.categories
                .values()
                .filter(|c| c.parent_id == Some(parent_id)),
        ))
    }

    async fn category_exists(&mut self, id: DbId) -> StoreResult<bool> {
        Ok(self.working.categories.contains_key(&id))
    }

    async fn slug_taken(&mut self, slug: &str, excluding: Option<DbId>) -> StoreResult<bool> {
        Ok(self
            .working
            .categories
            .values()
            .any(|c| c.slug == slug && Some(c.id) != excluding))
    }

    async fn save_category(&mut self, category: &Category) -> StoreResult<Category> {
        if self.slug_taken(&category.slug, Some(category.id)).await? {
            return Err(StoreError::Constraint("uq_categories_slug".into()));
        }
        if let Some(parent_id) = category.parent_id {
            if !self.working.categories.contains_key(&parent_id) {
                return Err(StoreError::Constraint("fk_categories_parent_id".into()));
            }
        }
        let mut stored = category.clone();
        stored.product_count = 0;
        self.working.categories.insert(stored.id, stored);
        Ok(self.working.with_count(category))
    }

    async fn save_categories(&mut self, categories: &[Category]) -> StoreResult<Vec<Category>> {
        let mut out = Vec::with_capacity(categories.len());
        for category in categories {
            out.push(self.save_category(category).await?);
        }
        Ok(out)
    }

    async fn delete_categories(&mut self, ids: &[DbId]) -> StoreResult<u64> {
        let mut removed = 0;
        for id in ids {
            if self.working.categories.remove(id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

fn page<T>(mut items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    let offset = usize::try_from(offset).unwrap_or(0);
    let limit = usize::try_from(limit).unwrap_or(0);
    if offset >= items.len() {
        return Vec::new();
    }
    items.drain(..offset);
    items.truncate(limit);
    items
}

fn newest_first(products: &mut [Product]) {
    products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
}

#[async_trait]
impl ProductStore for MemoryUnitOfWork {
    async fn get_product(&mut self, id: DbId) -> StoreResult<Option<Product>> {
        Ok(self.working.products.get(&id).cloned())
    }

    async fn find_products(&mut self, limit: i64, offset: i64) -> StoreResult<Vec<Product>> {
        let mut all: Vec<Product> = self.working.products.values().cloned().collect();
        newest_first(&mut all);
        Ok(page(all, limit, offset))
    }

    async fn count_products(&mut self) -> StoreResult<i64> {
        Ok(self.working.products.len() as i64)
    }

    async fn search_products(&mut self, query: &str) -> StoreResult<Vec<Product>> {
        let needle = query.to_lowercase();
        let mut hits: Vec<Product> = self
            .working
            .products
            .values()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle) || p.sku.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(hits)
    }

    async fn find_products_by_category_or_parent(
        &mut self,
        category_id: DbId,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Product>> {
        let s = &self.working;
        let mut hits: Vec<Product> = s
            .products
            .values()
            .filter(|p| {
                p.category_id == category_id
                    || s
                        .categories
                        .get(&p.category_id)
                        .is_some_and(|c| c.parent_id == Some(category_id))
            })
            .cloned()
            .collect();
        newest_first(&mut hits);
        Ok(page(hits, limit, offset))
    }

    async fn product_sku_taken(&mut self, sku: &str, excluding: Option<DbId>) -> StoreResult<bool> {
        Ok(self
            .working
            .products
            .values()
            .any(|p| p.sku == sku && Some(p.id) != excluding))
    }

    async fn count_products_in_categories(&mut self, category_ids: &[DbId]) -> StoreResult<i64> {
        let wanted: HashSet<&DbId> = category_ids.iter().collect();
        Ok(self
            .working
            .products
            .values()
            .filter(|p| wanted.contains(&p.category_id))
            .count() as i64)
    }

    async fn save_product(&mut self, product: &Product) -> StoreResult<Product> {
        if self.product_sku_taken(&product.sku, Some(product.id)).await? {
            return Err(StoreError::Constraint("uq_products_sku".into()));
        }
        if !self.working.categories.contains_key(&product.category_id) {
            return Err(StoreError::Constraint("fk_products_category_id".into()));
        }
        self.working.products.insert(product.id, product.clone());
        Ok(product.clone())
    }

    async fn delete_product(&mut self, id: DbId) -> StoreResult<bool> {
        let s = &mut self.working;
        if s.products.remove(&id).is_none() {
            return Ok(false);
        }
        let variant_ids: HashSet<DbId> = s
            .variants
            .values()
            .filter(|v| v.product_id == id)
            .map(|v| v.id)
            .collect();
        s.variants.retain(|vid, _| !variant_ids.contains(vid));
        s.combinations.retain(|c| !variant_ids.contains(&c.variant_id));
        s.barcodes.retain(|_, b| {
            b.product_id != Some(id) && !b.variant_id.is_some_and(|v| variant_ids.contains(&v))
        });
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

#[async_trait]
impl VariantStore for MemoryUnitOfWork {
    async fn get_variant(&mut self, id: DbId) -> StoreResult<Option<ProductVariant>> {
        Ok(self.working.variants.get(&id).cloned())
    }

    async fn find_variant_by_sku(&mut self, sku: &str) -> StoreResult<Option<ProductVariant>> {
        Ok(self.working.variants.values().find(|v| v.sku == sku).cloned())
    }

    async fn find_variants_by_product(&mut self, product_id: DbId) -> StoreResult<Vec<ProductVariant>> {
        let mut out: Vec<ProductVariant> = self
            .working
            .variants
            .values()
            .filter(|v| v.product_id == product_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.sku.cmp(&b.sku));
        Ok(out)
    }

    async fn save_variant(&mut self, variant: &ProductVariant) -> StoreResult<ProductVariant> {
        let clash = self
            .working
            .variants
            .values()
            .any(|v| v.sku == variant.sku && v.id != variant.id);
        if clash {
            return Err(StoreError::Constraint("uq_product_variants_sku".into()));
        }
        self.working.variants.insert(variant.id, variant.clone());
        Ok(variant.clone())
    }

    async fn insert_variants(
        &mut self,
        variants: &[ProductVariant],
        combinations: &[VariantCombination],
    ) -> StoreResult<Vec<ProductVariant>> {
        for variant in variants {
            if !self.working.products.contains_key(&variant.product_id) {
                return Err(StoreError::Constraint("fk_product_variants_product_id".into()));
            }
            self.save_variant(variant).await?;
        }
        for combination in combinations {
            if !self.working.values.contains_key(&combination.option_value_id) {
                return Err(StoreError::Constraint(
                    "fk_variant_combinations_option_value_id".into(),
                ));
            }
            let duplicate = self.working.combinations.iter().any(|c| {
                c.variant_id == combination.variant_id
                    && c.option_value_id == combination.option_value_id
            });
            if duplicate {
                return Err(StoreError::Constraint(
                    "uq_variant_combinations_variant_value".into(),
                ));
            }
            self.working.combinations.push(combination.clone());
        }
        Ok(variants.to_vec())
    }

    async fn find_variant_values(&mut self, variant_id: DbId) -> StoreResult<Vec<VariantOptionValue>> {
        let s = &self.working;
        let mut values: Vec<VariantOptionValue> = s
            .combinations
            .iter()
            .filter(|c| c.variant_id == variant_id)
            .filter_map(|c| s.values.get(&c.option_value_id).cloned())
            .collect();
        values.sort_by_key(|v| {
            let option = s.options.get(&v.option_id);
            (
                option.map(|o| o.position).unwrap_or(i32::MAX),
                option.map(|o| o.name.clone()).unwrap_or_default(),
            )
        });
        Ok(values)
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[async_trait]
impl OptionStore for MemoryUnitOfWork {
    async fn get_option(&mut self, id: DbId) -> StoreResult<Option<VariantOption>> {
        Ok(self.working.options.get(&id).cloned())
    }

    async fn find_all_options(&mut self) -> StoreResult<Vec<VariantOption>> {
        let mut out: Vec<VariantOption> = self.working.options.values().cloned().collect();
        out.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.name.cmp(&b.name)));
        Ok(out)
    }

    async fn save_option(&mut self, option: &VariantOption) -> StoreResult<VariantOption> {
        self.working.options.insert(option.id, option.clone());
        Ok(option.clone())
    }

    async fn delete_option(&mut self, id: DbId) -> StoreResult<bool> {
        let s = &mut self.working;
        if s.options.remove(&id).is_none() {
            return Ok(false);
        }
        s.values.retain(|_, v| v.option_id != id);
        Ok(true)
    }

    async fn option_in_use(&mut self, option_id: DbId) -> StoreResult<bool> {
        let s = &self.working;
        Ok(s.combinations.iter().any(|c| {
            s.values
                .get(&c.option_value_id)
                .is_some_and(|v| v.option_id == option_id)
        }))
    }

    async fn get_option_value(&mut self, id: DbId) -> StoreResult<Option<VariantOptionValue>> {
        Ok(self.working.values.get(&id).cloned())
    }

    async fn get_option_values(&mut self, ids: &[DbId]) -> StoreResult<Vec<VariantOptionValue>> {
        Ok(ids
            .iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .filter_map(|id| self.working.values.get(id).cloned())
            .collect())
    }

    async fn find_values_by_option(&mut self, option_id: DbId) -> StoreResult<Vec<VariantOptionValue>> {
        let mut out: Vec<VariantOptionValue> = self
            .working
            .values
            .values()
            .filter(|v| v.option_id == option_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.value.cmp(&b.value)));
        Ok(out)
    }

    async fn save_option_value(&mut self, value: &VariantOptionValue) -> StoreResult<VariantOptionValue> {
        if !self.working.options.contains_key(&value.option_id) {
            return Err(StoreError::Constraint(
                "fk_variant_option_values_option_id".into(),
            ));
        }
        self.working.values.insert(value.id, value.clone());
        Ok(value.clone())
    }

    async fn delete_option_value(&mut self, id: DbId) -> StoreResult<bool> {
        Ok(self.working.values.remove(&id).is_some())
    }

    async fn option_value_in_use(&mut self, value_id: DbId) -> StoreResult<bool> {
        Ok(self
            .working
            .combinations
            .iter()
            .any(|c| c.option_value_id == value_id))
    }
}

// ---------------------------------------------------------------------------
// Barcodes
// ---------------------------------------------------------------------------

#[async_trait]
impl BarcodeStore for MemoryUnitOfWork {
    async fn find_by_code(&mut self, code: &str) -> StoreResult<Option<Barcode>> {
        Ok(self.working.barcodes.get(code).cloned())
    }

    async fn exists_by_code(&mut self, code: &str) -> StoreResult<bool> {
        Ok(self.working.barcodes.contains_key(code))
    }

    async fn save_barcode(&mut self, barcode: &Barcode) -> StoreResult<Barcode> {
        if self.working.barcodes.contains_key(&barcode.code) {
            return Err(StoreError::Constraint("barcodes_pkey".into()));
        }
        self.working
            .barcodes
            .insert(barcode.code.clone(), barcode.clone());
        Ok(barcode.clone())
    }

    async fn delete_barcode(&mut self, code: &str) -> StoreResult<bool> {
        Ok(self.working.barcodes.remove(code).is_some())
    }

    async fn find_barcodes_by_product(&mut self, product_id: DbId) -> StoreResult<Vec<Barcode>> {
        Ok(self
            .working
            .barcodes
            .values()
            .filter(|b| b.product_id == Some(product_id))
            .cloned()
            .collect())
    }

    async fn find_barcodes_by_variant(&mut self, variant_id: DbId) -> StoreResult<Vec<Barcode>> {
        Ok(self
            .working
            .barcodes
            .values()
            .filter(|b| b.variant_id == Some(variant_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::slugify;
    use crate::types::{new_id, now};

    fn category(name: &str) -> Category {
        Category {
            id: new_id(),
            name: name.into(),
            slug: slugify(name),
            description: None,
            icon: None,
            color: None,
            image: None,
            is_active: true,
            position: 0,
            product_count: 0,
            parent_id: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[tokio::test]
    async fn dropped_unit_of_work_discards_writes() {
        let catalog = MemoryCatalog::new();
        {
            let mut uow = catalog.begin().await;
            uow.save_category(&category("Garden")).await.unwrap();
        }
        assert!(catalog.snapshot().await.categories.is_empty());
    }

    #[tokio::test]
    async fn committed_writes_are_visible() {
        let catalog = MemoryCatalog::new();
        let mut uow = catalog.begin().await;
        let saved = uow.save_category(&category("Garden")).await.unwrap();
        uow.commit();

        let mut uow = catalog.begin().await;
        assert!(uow.category_exists(saved.id).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_constraint_violation() {
        let catalog = MemoryCatalog::new();
        let mut uow = catalog.begin().await;
        uow.save_category(&category("Garden")).await.unwrap();
        let err = uow.save_category(&category("Garden")).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
    }

    #[tokio::test]
    async fn duplicate_combination_fails_the_whole_batch() {
        use crate::product::{self, CreateProduct};
        use crate::variant::{CreateOption, CreateOptionValue, OptionDisplayType};
        use crate::variant_matrix;

        let catalog = MemoryCatalog::new();
        let mut uow = catalog.begin().await;
        let cat = uow.save_category(&category("Apparel")).await.unwrap();
        let shirt = product::create_product(
            &mut uow,
            CreateProduct {
                category_id: cat.id,
                name: "T-Shirt".into(),
                sku: "TSHIRT".into(),
                description: None,
                image: None,
                unit: None,
                price: rust_decimal::Decimal::new(1999, 2),
                cost_price: None,
                tax_rate: None,
                stock_level: None,
                reorder_level: None,
                status: None,
            },
        )
        .await
        .unwrap();
        let color = variant_matrix::create_option(
            &mut uow,
            CreateOption {
                name: "Color".into(),
                display_type: OptionDisplayType::Swatch,
                position: None,
                is_required: None,
            },
        )
        .await
        .unwrap();
        let red = variant_matrix::create_option_value(
            &mut uow,
            color.id,
            CreateOptionValue {
                value: "Red".into(),
                display_value: None,
                position: None,
                price_adjustment_type: None,
                price_adjustment: None,
            },
        )
        .await
        .unwrap();
        uow.commit();

        let mut uow = catalog.begin().await;
        let variant = ProductVariant {
            id: new_id(),
            product_id: shirt.id,
            sku: "TSHIRT-RED".into(),
            price: shirt.price,
            cost: None,
            stock_level: 0,
            is_active: true,
            created_at: now(),
            updated_at: now(),
        };
        let link = || VariantCombination {
            id: new_id(),
            variant_id: variant.id,
            option_value_id: red.id,
        };
        let err = uow
            .insert_variants(&[variant.clone()], &[link(), link()])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(name) if name == "uq_variant_combinations_variant_value"));
        // The variant row went in before the failing combination.
        assert_eq!(uow.state().variants.len(), 1);
        drop(uow);

        let snapshot = catalog.snapshot().await;
        assert!(snapshot.variants.is_empty());
        assert!(snapshot.combinations.is_empty());
    }

    #[test]
    fn page_clips_to_bounds() {
        assert_eq!(page(vec![1, 2, 3, 4], 2, 1), vec![2, 3]);
        assert!(page(vec![1, 2], 5, 9).is_empty());
    }
}

mod common;

use assert_matches::assert_matches;
use async_trait::async_trait;
use rust_decimal::Decimal;
use stockroom_core::error::CoreError;
use stockroom_core::memory::{MemoryCatalog, MemoryUnitOfWork};
use stockroom_core::product::Product;
use stockroom_core::store::{OptionStore, ProductStore, StoreError, StoreResult, VariantStore};
use stockroom_core::types::{new_id, DbId};
use stockroom_core::variant::{
    GenerateMatrix, OptionSelection, ProductVariant, VariantCombination, VariantOption,
    VariantOptionValue,
};
use stockroom_core::variant_matrix;

fn request(product_id: DbId, selections: Vec<(DbId, Vec<DbId>)>) -> GenerateMatrix {
    GenerateMatrix {
        product_id,
        selections: selections
            .into_iter()
            .map(|(option_id, value_ids)| OptionSelection { option_id, value_ids })
            .collect(),
        default_price: None,
        default_stock: None,
    }
}

async fn generate(catalog: &MemoryCatalog, input: GenerateMatrix) -> Vec<ProductVariant> {
    let mut uow = catalog.begin().await;
    let created = variant_matrix::generate_matrix(&mut uow, input).await.unwrap();
    uow.commit();
    created
}

#[tokio::test]
async fn two_by_three_yields_six_variants_in_order() {
    let catalog = MemoryCatalog::new();
    let cat = common::category(&catalog, "Apparel", None).await;
    let shirt = common::product(&catalog, cat.id, "T-Shirt", "TSHIRT").await;
    let (color, colors) = common::option_with_values(&catalog, "Color", &["Red", "Blue"]).await;
    let (size, sizes) = common::option_with_values(&catalog, "Size", &["Small", "Medium", "Large"]).await;

    let created = generate(
        &catalog,
        request(
            shirt.id,
            vec![(color.id, common::ids(&colors)), (size.id, common::ids(&sizes))],
        ),
    )
    .await;

    let skus: Vec<_> = created.iter().map(|v| v.sku.as_str()).collect();
    assert_eq!(
        skus,
        vec![
            "TSHIRT-RED-SMA",
            "TSHIRT-RED-MED",
            "TSHIRT-RED-LAR",
            "TSHIRT-BLU-SMA",
            "TSHIRT-BLU-MED",
            "TSHIRT-BLU-LAR",
        ]
    );
    assert!(created.iter().all(|v| v.price == shirt.price));
    assert!(created.iter().all(|v| v.stock_level == 0 && v.is_active));

    let snapshot = catalog.snapshot().await;
    assert_eq!(snapshot.variants.len(), 6);
    assert_eq!(snapshot.combinations.len(), 12);
}

#[tokio::test]
async fn generation_is_idempotent() {
    let catalog = MemoryCatalog::new();
    let cat = common::category(&catalog, "Apparel", None).await;
    let shirt = common::product(&catalog, cat.id, "T-Shirt", "TSHIRT").await;
    let (color, colors) = common::option_with_values(&catalog, "Color", &["Red", "Blue"]).await;
    let input = request(shirt.id, vec![(color.id, common::ids(&colors))]);

    assert_eq!(generate(&catalog, input.clone()).await.len(), 2);
    assert!(generate(&catalog, input).await.is_empty());
    assert_eq!(catalog.snapshot().await.variants.len(), 2);
}

/// Unit of work whose option values vanish right after they are fetched, so
/// the batch insert hits a dangling combination reference halfway through.
struct VanishingValues(MemoryUnitOfWork);

#[async_trait]
impl ProductStore for VanishingValues {
    async fn get_product(&mut self, id: DbId) -> StoreResult<Option<Product>> {
        self.0.get_product(id).await
    }
    async fn find_products(&mut self, limit: i64, offset: i64) -> StoreResult<Vec<Product>> {
        self.0.find_products(limit, offset).await
    }
    async fn count_products(&mut self) -> StoreResult<i64> {
        self.0.count_products().await
    }
    async fn search_products(&mut self, query: &str) -> StoreResult<Vec<Product>> {
        self.0.search_products(query).await
    }
    async fn find_products_by_category_or_parent(
        &mut self,
        category_id: DbId,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Product>> {
        self.0
            .find_products_by_category_or_parent(category_id, limit, offset)
            .await
    }
    async fn product_sku_taken(&mut self, sku: &str, excluding: Option<DbId>) -> StoreResult<bool> {
        self.0.product_sku_taken(sku, excluding).await
    }
    async fn count_products_in_categories(&mut self, category_ids: &[DbId]) -> StoreResult<i64> {
        self.0.count_products_in_categories(category_ids).await
    }
    async fn save_product(&mut self, product: &Product) -> StoreResult<Product> {
        self.0.save_product(product).await
    }
    async fn delete_product(&mut self, id: DbId) -> StoreResult<bool> {
        ProductStore::delete_product(&mut self.0, id).await
    }
}

#[async_trait]
impl VariantStore for VanishingValues {
    async fn get_variant(&mut self, id: DbId) -> StoreResult<Option<ProductVariant>> {
        self.0.get_variant(id).await
    }
    async fn find_variant_by_sku(&mut self, sku: &str) -> StoreResult<Option<ProductVariant>> {
        self.0.find_variant_by_sku(sku).await
    }
    async fn find_variants_by_product(&mut self, product_id: DbId) -> StoreResult<Vec<ProductVariant>> {
        self.0.find_variants_by_product(product_id).await
    }
    async fn save_variant(&mut self, variant: &ProductVariant) -> StoreResult<ProductVariant> {
        self.0.save_variant(variant).await
    }
    async fn insert_variants(
        &mut self,
        variants: &[ProductVariant],
        combinations: &[VariantCombination],
    ) -> StoreResult<Vec<ProductVariant>> {
        self.0.insert_variants(variants, combinations).await
    }
    async fn find_variant_values(&mut self, variant_id: DbId) -> StoreResult<Vec<VariantOptionValue>> {
        self.0.find_variant_values(variant_id).await
    }
}

#[async_trait]
impl OptionStore for VanishingValues {
    async fn get_option(&mut self, id: DbId) -> StoreResult<Option<VariantOption>> {
        self.0.get_option(id).await
    }
    async fn find_all_options(&mut self) -> StoreResult<Vec<VariantOption>> {
        self.0.find_all_options().await
    }
    async fn save_option(&mut self, option: &VariantOption) -> StoreResult<VariantOption> {
        self.0.save_option(option).await
    }
    async fn delete_option(&mut self, id: DbId) -> StoreResult<bool> {
        OptionStore::delete_option(&mut self.0, id).await
    }
    async fn option_in_use(&mut self, option_id: DbId) -> StoreResult<bool> {
        self.0.option_in_use(option_id).await
    }
    async fn get_option_value(&mut self, id: DbId) -> StoreResult<Option<VariantOptionValue>> {
        self.0.get_option_value(id).await
    }
    async fn get_option_values(&mut self, ids: &[DbId]) -> StoreResult<Vec<VariantOptionValue>> {
        let values = self.0.get_option_values(ids).await?;
        if let Some(last) = values.last() {
            self.0.delete_option_value(last.id).await?;
        }
        Ok(values)
    }
    async fn find_values_by_option(&mut self, option_id: DbId) -> StoreResult<Vec<VariantOptionValue>> {
        self.0.find_values_by_option(option_id).await
    }
    async fn save_option_value(&mut self, value: &VariantOptionValue) -> StoreResult<VariantOptionValue> {
        self.0.save_option_value(value).await
    }
    async fn delete_option_value(&mut self, id: DbId) -> StoreResult<bool> {
        self.0.delete_option_value(id).await
    }
    async fn option_value_in_use(&mut self, value_id: DbId) -> StoreResult<bool> {
        self.0.option_value_in_use(value_id).await
    }
}

#[tokio::test]
async fn failed_batch_leaves_no_variants_or_combinations() {
    let catalog = MemoryCatalog::new();
    let cat = common::category(&catalog, "Apparel", None).await;
    let shirt = common::product(&catalog, cat.id, "T-Shirt", "TSHIRT").await;
    let (color, colors) = common::option_with_values(&catalog, "Color", &["Red", "Blue"]).await;

    let mut uow = VanishingValues(catalog.begin().await);
    let err = variant_matrix::generate_matrix(
        &mut uow,
        request(shirt.id, vec![(color.id, common::ids(&colors))]),
    )
    .await
    .unwrap_err();
    assert_matches!(err, CoreError::Store(StoreError::Constraint(_)));
    // Both variant rows were written before the dangling combination failed.
    assert_eq!(uow.0.state().variants.len(), 2);
    drop(uow);

    let snapshot = catalog.snapshot().await;
    assert!(snapshot.variants.is_empty());
    assert!(snapshot.combinations.is_empty());
    assert_eq!(snapshot.values.len(), 2);
}

#[tokio::test]
async fn option_selected_twice_is_rejected() {
    let catalog = MemoryCatalog::new();
    let cat = common::category(&catalog, "Apparel", None).await;
    let shirt = common::product(&catalog, cat.id, "T-Shirt", "TSHIRT").await;
    let (color, colors) = common::option_with_values(&catalog, "Color", &["Red"]).await;

    let mut uow = catalog.begin().await;
    let err = variant_matrix::generate_matrix(
        &mut uow,
        request(
            shirt.id,
            vec![(color.id, common::ids(&colors)), (color.id, common::ids(&colors))],
        ),
    )
    .await
    .unwrap_err();
    assert_matches!(err, CoreError::BadRequest(_));
    assert!(uow.state().variants.is_empty());
    assert!(uow.state().combinations.is_empty());
}

#[tokio::test]
async fn over_precise_default_price_is_rejected() {
    let catalog = MemoryCatalog::new();
    let cat = common::category(&catalog, "Apparel", None).await;
    let shirt = common::product(&catalog, cat.id, "T-Shirt", "TSHIRT").await;
    let (color, colors) = common::option_with_values(&catalog, "Color", &["Red"]).await;

    let mut input = request(shirt.id, vec![(color.id, common::ids(&colors))]);
    input.default_price = Some(Decimal::new(19999, 3));

    let mut uow = catalog.begin().await;
    let err = variant_matrix::generate_matrix(&mut uow, input).await.unwrap_err();
    assert_matches!(err, CoreError::BadRequest(_));
}

#[tokio::test]
async fn overlapping_run_only_fills_gaps() {
    let catalog = MemoryCatalog::new();
    let cat = common::category(&catalog, "Apparel", None).await;
    let shirt = common::product(&catalog, cat.id, "T-Shirt", "TSHIRT").await;
    let (color, colors) =
        common::option_with_values(&catalog, "Color", &["Red", "Blue", "Green"]).await;

    generate(&catalog, request(shirt.id, vec![(color.id, vec![colors[0].id])])).await;
    let created = generate(&catalog, request(shirt.id, vec![(color.id, common::ids(&colors))])).await;

    let skus: Vec<_> = created.iter().map(|v| v.sku.as_str()).collect();
    assert_eq!(skus, vec!["TSHIRT-BLU", "TSHIRT-GRE"]);
}

#[tokio::test]
async fn colliding_skus_within_one_run_are_created_once() {
    let catalog = MemoryCatalog::new();
    let cat = common::category(&catalog, "Apparel", None).await;
    let shirt = common::product(&catalog, cat.id, "T-Shirt", "TSHIRT").await;
    let (size, sizes) = common::option_with_values(&catalog, "Size", &["Large", "Larger"]).await;

    let created = generate(&catalog, request(shirt.id, vec![(size.id, common::ids(&sizes))])).await;
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].sku, "TSHIRT-LAR");
}

#[tokio::test]
async fn defaults_override_price_and_stock() {
    let catalog = MemoryCatalog::new();
    let cat = common::category(&catalog, "Apparel", None).await;
    let shirt = common::product(&catalog, cat.id, "T-Shirt", "TSHIRT").await;
    let (color, colors) = common::option_with_values(&catalog, "Color", &["Red"]).await;

    let mut input = request(shirt.id, vec![(color.id, common::ids(&colors))]);
    input.default_price = Some(Decimal::new(2500, 2));
    input.default_stock = Some(12);

    let created = generate(&catalog, input).await;
    assert_eq!(created[0].price, Decimal::new(2500, 2));
    assert_eq!(created[0].stock_level, 12);
}

#[tokio::test]
async fn empty_selections_are_dropped() {
    let catalog = MemoryCatalog::new();
    let cat = common::category(&catalog, "Apparel", None).await;
    let shirt = common::product(&catalog, cat.id, "T-Shirt", "TSHIRT").await;
    let (color, colors) = common::option_with_values(&catalog, "Color", &["Red", "Blue"]).await;
    let (size, _) = common::option_with_values(&catalog, "Size", &[]).await;

    let created = generate(
        &catalog,
        request(
            shirt.id,
            vec![(color.id, common::ids(&colors)), (size.id, vec![new_id()])],
        ),
    )
    .await;
    assert_eq!(created.len(), 2);

    let nothing = generate(&catalog, request(shirt.id, vec![(size.id, vec![])])).await;
    assert!(nothing.is_empty());
}

#[tokio::test]
async fn missing_product_is_not_found() {
    let catalog = MemoryCatalog::new();
    let mut uow = catalog.begin().await;
    let err = variant_matrix::generate_matrix(&mut uow, request(new_id(), vec![]))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::NotFound { entity: "Product", .. });
}

#[tokio::test]
async fn value_from_another_option_is_rejected() {
    let catalog = MemoryCatalog::new();
    let cat = common::category(&catalog, "Apparel", None).await;
    let shirt = common::product(&catalog, cat.id, "T-Shirt", "TSHIRT").await;
    let (color, _) = common::option_with_values(&catalog, "Color", &["Red"]).await;
    let (_, sizes) = common::option_with_values(&catalog, "Size", &["Small"]).await;

    let mut uow = catalog.begin().await;
    let err = variant_matrix::generate_matrix(
        &mut uow,
        request(shirt.id, vec![(color.id, common::ids(&sizes))]),
    )
    .await
    .unwrap_err();
    assert_matches!(err, CoreError::BadRequest(_));
}

#[tokio::test]
async fn signature_lists_values_in_option_order() {
    let catalog = MemoryCatalog::new();
    let cat = common::category(&catalog, "Apparel", None).await;
    let shirt = common::product(&catalog, cat.id, "T-Shirt", "TSHIRT").await;
    let (color, colors) = common::option_with_values(&catalog, "Color", &["Red"]).await;
    let (size, sizes) = common::option_with_values(&catalog, "Size", &["Small"]).await;

    let created = generate(
        &catalog,
        request(
            shirt.id,
            vec![(size.id, common::ids(&sizes)), (color.id, common::ids(&colors))],
        ),
    )
    .await;
    assert_eq!(created[0].sku, "TSHIRT-SMA-RED");

    let mut uow = catalog.begin().await;
    let signature = variant_matrix::variant_signature(&mut uow, created[0].id)
        .await
        .unwrap();
    let values: Vec<_> = signature.values.iter().map(|v| v.value.as_str()).collect();
    // Both options sit at position 0, so they fall back to name order.
    assert_eq!(values, vec!["Red", "Small"]);
}

#[tokio::test]
async fn inventory_and_pricing_updates() {
    let catalog = MemoryCatalog::new();
    let cat = common::category(&catalog, "Apparel", None).await;
    let shirt = common::product(&catalog, cat.id, "T-Shirt", "TSHIRT").await;
    let (color, colors) = common::option_with_values(&catalog, "Color", &["Red"]).await;
    let created = generate(&catalog, request(shirt.id, vec![(color.id, common::ids(&colors))])).await;
    let id = created[0].id;

    let mut uow = catalog.begin().await;
    let updated = variant_matrix::update_variant_inventory(&mut uow, id, 40).await.unwrap();
    assert_eq!(updated.stock_level, 40);
    let updated = variant_matrix::update_variant_pricing(&mut uow, id, Decimal::new(999, 2))
        .await
        .unwrap();
    assert_eq!(updated.price, Decimal::new(999, 2));

    let err = variant_matrix::update_variant_inventory(&mut uow, id, -1).await.unwrap_err();
    assert_matches!(err, CoreError::BadRequest(_));
    let err = variant_matrix::update_variant_pricing(&mut uow, new_id(), Decimal::ONE)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::NotFound { .. });

    let listed = variant_matrix::list_product_variants(&mut uow, shirt.id).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn option_and_value_deletion_rules() {
    let catalog = MemoryCatalog::new();
    let cat = common::category(&catalog, "Apparel", None).await;
    let shirt = common::product(&catalog, cat.id, "T-Shirt", "TSHIRT").await;
    let (color, colors) = common::option_with_values(&catalog, "Color", &["Red", "Blue"]).await;
    generate(&catalog, request(shirt.id, vec![(color.id, vec![colors[0].id])])).await;

    let mut uow = catalog.begin().await;

    let err = variant_matrix::delete_option_value(&mut uow, color.id, colors[0].id)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Conflict(_));

    let err = variant_matrix::delete_option(&mut uow, color.id).await.unwrap_err();
    assert_matches!(err, CoreError::Conflict(_));

    variant_matrix::delete_option_value(&mut uow, color.id, colors[1].id)
        .await
        .unwrap();
    // Already gone: silently succeeds.
    variant_matrix::delete_option_value(&mut uow, color.id, colors[1].id)
        .await
        .unwrap();

    let remaining = variant_matrix::list_option_values(&mut uow, color.id).await.unwrap();
    assert_eq!(remaining.len(), 1);

    let err = variant_matrix::list_option_values(&mut uow, new_id()).await.unwrap_err();
    assert_matches!(err, CoreError::NotFound { .. });
}

#[tokio::test]
async fn unused_option_deletes_with_its_values() {
    let catalog = MemoryCatalog::new();
    let (material, _) = common::option_with_values(&catalog, "Material", &["Cotton", "Wool"]).await;

    let mut uow = catalog.begin().await;
    variant_matrix::delete_option(&mut uow, material.id).await.unwrap();
    uow.commit();

    let snapshot = catalog.snapshot().await;
    assert!(snapshot.options.is_empty());
    assert!(snapshot.values.is_empty());
}

#[tokio::test]
async fn option_defaults() {
    let catalog = MemoryCatalog::new();
    let (material, values) = common::option_with_values(&catalog, "Material", &["Cotton"]).await;
    assert!(material.is_required);
    assert_eq!(material.position, 0);
    assert_eq!(values[0].price_adjustment_value, Decimal::ZERO);

    let mut uow = catalog.begin().await;
    let listed = variant_matrix::list_options(&mut uow).await.unwrap();
    assert_eq!(listed.len(), 1);
}

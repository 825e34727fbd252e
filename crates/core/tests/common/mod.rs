//! Shared fixtures for engine tests against the in-memory catalog.

#![allow(dead_code)]

use rust_decimal::Decimal;
use stockroom_core::category::{Category, CreateCategory};
use stockroom_core::category_tree;
use stockroom_core::memory::MemoryCatalog;
use stockroom_core::product::{self, CreateProduct, Product};
use stockroom_core::types::DbId;
use stockroom_core::variant::{CreateOption, CreateOptionValue, OptionDisplayType, VariantOption, VariantOptionValue};
use stockroom_core::variant_matrix;

/// Create and commit a category.
pub async fn category(catalog: &MemoryCatalog, name: &str, parent_id: Option<DbId>) -> Category {
    let mut uow = catalog.begin().await;
    let created = category_tree::create_category(
        &mut uow,
        CreateCategory {
            name: name.to_string(),
            parent_id,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    uow.commit();
    created
}

/// Create and commit a product priced at 19.99.
pub async fn product(catalog: &MemoryCatalog, category_id: DbId, name: &str, sku: &str) -> Product {
    let mut uow = catalog.begin().await;
    let created = product::create_product(
        &mut uow,
        CreateProduct {
            category_id,
            name: name.to_string(),
            sku: sku.to_string(),
            description: Some(format!("{name} description")),
            image: None,
            unit: None,
            price: Decimal::new(1999, 2),
            cost_price: None,
            tax_rate: None,
            stock_level: Some(7),
            reorder_level: None,
            status: None,
        },
    )
    .await
    .unwrap();
    uow.commit();
    created
}

/// Create and commit an option with the given values, in order.
pub async fn option_with_values(
    catalog: &MemoryCatalog,
    name: &str,
    values: &[&str],
) -> (VariantOption, Vec<VariantOptionValue>) {
    let mut uow = catalog.begin().await;
    let option = variant_matrix::create_option(
        &mut uow,
        CreateOption {
            name: name.to_string(),
            display_type: OptionDisplayType::Button,
            position: None,
            is_required: None,
        },
    )
    .await
    .unwrap();

    let mut created = Vec::with_capacity(values.len());
    for (i, value) in values.iter().enumerate() {
        created.push(
            variant_matrix::create_option_value(
                &mut uow,
                option.id,
                CreateOptionValue {
                    value: value.to_string(),
                    display_value: None,
                    position: Some(i as i32),
                    price_adjustment_type: None,
                    price_adjustment: None,
                },
            )
            .await
            .unwrap(),
        );
    }
    uow.commit();
    (option, created)
}

pub fn ids(values: &[VariantOptionValue]) -> Vec<DbId> {
    values.iter().map(|v| v.id).collect()
}

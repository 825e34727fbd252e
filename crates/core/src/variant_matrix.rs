//! Variant matrix generation plus option, value, and variant maintenance.
//!
//! Generation takes one list of option values per selected option, forms the
//! Cartesian product in selection order, and creates one variant per
//! combination whose derived SKU is not already taken.

use std::collections::{HashMap, HashSet};

use crate::error::{CoreError, CoreResult};
use crate::store::{OptionStore, ProductStore, VariantStore};
use crate::types::{new_id, now, validate_money_scale, validate_price, DbId, Money};
use crate::variant::{
    CreateOption, CreateOptionValue, GenerateMatrix, ProductVariant, VariantCombination,
    VariantOption, VariantOptionValue, VariantSignature,
};

/// Number of leading characters of each option value used in a derived SKU.
pub const SKU_TOKEN_LENGTH: usize = 3;

/// Separator between the product SKU and each value token.
pub const SKU_SEPARATOR: char = '-';

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// Cartesian product of `lists`, first list varying slowest.
///
/// An empty `lists` yields a single empty combination; any empty inner list
/// yields no combinations at all.
pub fn cartesian_product<T: Clone>(lists: &[Vec<T>]) -> Vec<Vec<T>> {
    lists.iter().fold(vec![Vec::new()], |acc, list| {
        acc.iter()
            .flat_map(|prefix| {
                list.iter().map(move |item| {
                    let mut combination = Vec::with_capacity(prefix.len() + 1);
                    combination.extend_from_slice(prefix);
                    combination.push(item.clone());
                    combination
                })
            })
            .collect()
    })
}

/// Derive a variant SKU: `<product sku>-<TOK>-<TOK>...`, where each token is
/// the uppercased value truncated to [`SKU_TOKEN_LENGTH`] characters.
///
/// `derive_variant_sku("TSHIRT", ["Red", "Small"])` is `"TSHIRT-RED-SMA"`.
pub fn derive_variant_sku<'a>(product_sku: &str, values: impl IntoIterator<Item = &'a str>) -> String {
    let tokens: Vec<String> = values
        .into_iter()
        .map(|value| value.to_uppercase().chars().take(SKU_TOKEN_LENGTH).collect())
        .collect();
    format!("{product_sku}{SKU_SEPARATOR}{}", tokens.join("-"))
}

fn validate_non_negative_stock(stock: i32, field: &str) -> CoreResult<()> {
    if stock < 0 {
        return Err(CoreError::BadRequest(format!("{field} must not be negative")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Matrix generation
// ---------------------------------------------------------------------------

/// Generate the missing variants of a product for the given selections.
///
/// Returns only the variants created by this call. Combinations whose SKU
/// already exists (in storage or earlier in the same run) are skipped, so
/// re-running with overlapping selections only fills gaps.
///
/// Fails with [`CoreError::BadRequest`] when an option is selected twice or a
/// value is listed under an option it does not belong to.
pub async fn generate_matrix<S>(store: &mut S, input: GenerateMatrix) -> CoreResult<Vec<ProductVariant>>
where
    S: ProductStore + VariantStore + OptionStore + ?Sized,
{
    let product = store
        .get_product(input.product_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Product", input.product_id))?;

    if let Some(price) = input.default_price {
        validate_price(price, "default_price")?;
    }
    if let Some(stock) = input.default_stock {
        validate_non_negative_stock(stock, "default_stock")?;
    }

    let mut dimensions: Vec<Vec<VariantOptionValue>> = Vec::with_capacity(input.selections.len());
    let mut selected_options = HashSet::new();
    for selection in &input.selections {
        // A variant holds at most one value per option.
        if !selected_options.insert(selection.option_id) {
            return Err(CoreError::BadRequest(format!(
                "Option {} is selected more than once",
                selection.option_id
            )));
        }

        let fetched = store.get_option_values(&selection.value_ids).await?;
        let mut by_id: HashMap<DbId, VariantOptionValue> =
            fetched.into_iter().map(|v| (v.id, v)).collect();

        // Keep request order; repeated ids collapse to their first occurrence.
        let values: Vec<VariantOptionValue> = selection
            .value_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect();

        if let Some(stray) = values.iter().find(|v| v.option_id != selection.option_id) {
            return Err(CoreError::BadRequest(format!(
                "Option value {} does not belong to option {}",
                stray.id, selection.option_id
            )));
        }

        if values.is_empty() {
            tracing::debug!(option_id = %selection.option_id, "Selection resolved to no values, dropped");
            continue;
        }
        dimensions.push(values);
    }

    if dimensions.is_empty() {
        return Ok(Vec::new());
    }

    let price = input.default_price.unwrap_or(product.price);
    let stock_level = input.default_stock.unwrap_or(0);
    let timestamp = now();

    let mut variants = Vec::new();
    let mut combinations = Vec::new();
    let mut seen_skus = HashSet::new();
    let mut skipped = 0usize;

    for combination in cartesian_product(&dimensions) {
        let sku = derive_variant_sku(&product.sku, combination.iter().map(|v| v.value.as_str()));

        if !seen_skus.insert(sku.clone()) || store.find_variant_by_sku(&sku).await?.is_some() {
            tracing::debug!(sku = %sku, "Variant sku already taken, skipped");
            skipped += 1;
            continue;
        }

        let variant = ProductVariant {
            id: new_id(),
            product_id: product.id,
            sku,
            price,
            cost: None,
            stock_level,
            is_active: true,
            created_at: timestamp,
            updated_at: timestamp,
        };
        combinations.extend(combination.iter().map(|value| VariantCombination {
            id: new_id(),
            variant_id: variant.id,
            option_value_id: value.id,
        }));
        variants.push(variant);
    }

    if variants.is_empty() {
        tracing::info!(product_id = %product.id, skipped, "Variant matrix already complete");
        return Ok(Vec::new());
    }

    let created = store.insert_variants(&variants, &combinations).await?;

    tracing::info!(
        product_id = %product.id,
        created = created.len(),
        skipped,
        "Variant matrix generated",
    );

    Ok(created)
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

pub async fn list_options<S>(store: &mut S) -> CoreResult<Vec<VariantOption>>
where
    S: OptionStore + ?Sized,
{
    Ok(store.find_all_options().await?)
}

pub async fn create_option<S>(store: &mut S, input: CreateOption) -> CoreResult<VariantOption>
where
    S: OptionStore + ?Sized,
{
    if input.name.trim().is_empty() {
        return Err(CoreError::BadRequest("Option name must not be empty".into()));
    }

    let option = VariantOption {
        id: new_id(),
        name: input.name,
        is_required: input.is_required.unwrap_or(true),
        display_type: input.display_type,
        position: input.position.unwrap_or(0),
    };
    let saved = store.save_option(&option).await?;
    tracing::info!(option_id = %saved.id, name = %saved.name, "Variant option created");
    Ok(saved)
}

/// Delete an option and its values, unless a variant still uses one of them.
pub async fn delete_option<S>(store: &mut S, id: DbId) -> CoreResult<()>
where
    S: OptionStore + ?Sized,
{
    if store.get_option(id).await?.is_none() {
        return Err(CoreError::not_found("VariantOption", id));
    }
    if store.option_in_use(id).await? {
        return Err(CoreError::Conflict(format!(
            "Option {id} has values used by existing variants"
        )));
    }
    store.delete_option(id).await?;
    tracing::info!(option_id = %id, "Variant option deleted");
    Ok(())
}

// ---------------------------------------------------------------------------
// Option values
// ---------------------------------------------------------------------------

pub async fn list_option_values<S>(store: &mut S, option_id: DbId) -> CoreResult<Vec<VariantOptionValue>>
where
    S: OptionStore + ?Sized,
{
    if store.get_option(option_id).await?.is_none() {
        return Err(CoreError::not_found("VariantOption", option_id));
    }
    Ok(store.find_values_by_option(option_id).await?)
}

pub async fn create_option_value<S>(
    store: &mut S,
    option_id: DbId,
    input: CreateOptionValue,
) -> CoreResult<VariantOptionValue>
where
    S: OptionStore + ?Sized,
{
    if store.get_option(option_id).await?.is_none() {
        return Err(CoreError::not_found("VariantOption", option_id));
    }
    if input.value.trim().is_empty() {
        return Err(CoreError::BadRequest("Option value must not be empty".into()));
    }
    if let Some(adjustment) = input.price_adjustment {
        validate_money_scale(adjustment, "price_adjustment")?;
    }

    let value = VariantOptionValue {
        id: new_id(),
        option_id,
        value: input.value,
        display_value: input.display_value,
        position: input.position.unwrap_or(0),
        price_adjustment_type: input.price_adjustment_type.unwrap_or_default(),
        price_adjustment_value: input.price_adjustment.unwrap_or(Money::ZERO),
    };
    let saved = store.save_option_value(&value).await?;
    tracing::info!(option_id = %option_id, value_id = %saved.id, "Option value created");
    Ok(saved)
}

/// Delete one value of an option. Deleting a value that does not exist is a
/// no-op.
pub async fn delete_option_value<S>(store: &mut S, option_id: DbId, value_id: DbId) -> CoreResult<()>
where
    S: OptionStore + ?Sized,
{
    let Some(value) = store.get_option_value(value_id).await? else {
        tracing::debug!(%value_id, "Option value already absent");
        return Ok(());
    };
    if value.option_id != option_id {
        return Err(CoreError::not_found("VariantOptionValue", value_id));
    }
    if store.option_value_in_use(value_id).await? {
        return Err(CoreError::Conflict(format!(
            "Option value {value_id} is used by existing variants"
        )));
    }
    store.delete_option_value(value_id).await?;
    tracing::info!(%option_id, %value_id, "Option value deleted");
    Ok(())
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

pub async fn list_product_variants<S>(store: &mut S, product_id: DbId) -> CoreResult<Vec<ProductVariant>>
where
    S: ProductStore + VariantStore + ?Sized,
{
    if store.get_product(product_id).await?.is_none() {
        return Err(CoreError::not_found("Product", product_id));
    }
    Ok(store.find_variants_by_product(product_id).await?)
}

async fn load_variant<S>(store: &mut S, id: DbId) -> CoreResult<ProductVariant>
where
    S: VariantStore + ?Sized,
{
    store
        .get_variant(id)
        .await?
        .ok_or_else(|| CoreError::not_found("ProductVariant", id))
}

pub async fn update_variant_inventory<S>(store: &mut S, id: DbId, stock_level: i32) -> CoreResult<ProductVariant>
where
    S: VariantStore + ?Sized,
{
    validate_non_negative_stock(stock_level, "stock_level")?;
    let mut variant = load_variant(store, id).await?;
    variant.stock_level = stock_level;
    variant.updated_at = now();
    let saved = store.save_variant(&variant).await?;
    tracing::info!(variant_id = %id, stock_level, "Variant inventory updated");
    Ok(saved)
}

pub async fn update_variant_pricing<S>(store: &mut S, id: DbId, price: Money) -> CoreResult<ProductVariant>
where
    S: VariantStore + ?Sized,
{
    validate_price(price, "price")?;
    let mut variant = load_variant(store, id).await?;
    variant.price = price;
    variant.updated_at = now();
    let saved = store.save_variant(&variant).await?;
    tracing::info!(variant_id = %id, price = %price, "Variant pricing updated");
    Ok(saved)
}

/// Reconstruct which option values a variant represents.
pub async fn variant_signature<S>(store: &mut S, id: DbId) -> CoreResult<VariantSignature>
where
    S: VariantStore + ?Sized,
{
    let variant = load_variant(store, id).await?;
    let values = store.find_variant_values(id).await?;
    Ok(VariantSignature { variant, values })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Product records and the routine catalog operations around them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::store::{CategoryStore, ProductStore};
use crate::types::{new_id, now, validate_money_scale, validate_price, DbId, Money, Timestamp};

/// Default page size for product listing.
pub const DEFAULT_PAGE_SIZE: i64 = 25;

/// Maximum page size for product listing.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Stock level at which a product is flagged for reordering, unless set.
pub const DEFAULT_REORDER_LEVEL: i32 = 10;

/// Lifecycle status of a product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
}

impl ProductStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(CoreError::BadRequest(format!(
                "Unknown product status '{other}'. Must be active or inactive"
            ))),
        }
    }
}

/// A sellable catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: DbId,
    pub category_id: DbId,
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub unit: Option<String>,
    pub price: Money,
    pub cost_price: Option<Money>,
    pub tax_rate: Option<Money>,
    pub stock_level: i32,
    pub reorder_level: i32,
    pub status: ProductStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProduct {
    pub category_id: DbId,
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub unit: Option<String>,
    pub price: Money,
    pub cost_price: Option<Money>,
    pub tax_rate: Option<Money>,
    pub stock_level: Option<i32>,
    pub reorder_level: Option<i32>,
    pub status: Option<ProductStatus>,
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProduct {
    pub category_id: Option<DbId>,
    pub name: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub unit: Option<String>,
    pub price: Option<Money>,
    pub cost_price: Option<Money>,
    pub tax_rate: Option<Money>,
    pub stock_level: Option<i32>,
    pub reorder_level: Option<i32>,
    pub status: Option<ProductStatus>,
}

impl UpdateProduct {
    /// Copy every present field onto `product`.
    pub fn apply_to(self, product: &mut Product) {
        if let Some(category_id) = self.category_id {
            product.category_id = category_id;
        }
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(sku) = self.sku {
            product.sku = sku;
        }
        if let Some(description) = self.description {
            product.description = Some(description);
        }
        if let Some(image) = self.image {
            product.image = Some(image);
        }
        if let Some(unit) = self.unit {
            product.unit = Some(unit);
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(cost_price) = self.cost_price {
            product.cost_price = Some(cost_price);
        }
        if let Some(tax_rate) = self.tax_rate {
            product.tax_rate = Some(tax_rate);
        }
        if let Some(stock_level) = self.stock_level {
            product.stock_level = stock_level;
        }
        if let Some(reorder_level) = self.reorder_level {
            product.reorder_level = reorder_level;
        }
        if let Some(status) = self.status {
            product.status = status;
        }
    }
}

/// One page of products with the overall total.
#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Clamp a requested page size into `1..=MAX_PAGE_SIZE`.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// Clamp a requested offset to be non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

fn validate_product_fields(product: &Product) -> CoreResult<()> {
    if product.name.trim().is_empty() {
        return Err(CoreError::BadRequest("Product name must not be empty".into()));
    }
    if product.sku.trim().is_empty() {
        return Err(CoreError::BadRequest("Product sku must not be empty".into()));
    }
    validate_price(product.price, "price")?;
    if let Some(cost_price) = product.cost_price {
        validate_money_scale(cost_price, "cost_price")?;
    }
    if let Some(tax_rate) = product.tax_rate {
        validate_money_scale(tax_rate, "tax_rate")?;
    }
    if product.stock_level < 0 {
        return Err(CoreError::BadRequest("Stock level must not be negative".into()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

pub async fn create_product<S>(store: &mut S, input: CreateProduct) -> CoreResult<Product>
where
    S: ProductStore + CategoryStore + ?Sized,
{
    let timestamp = now();
    let product = Product {
        id: new_id(),
        category_id: input.category_id,
        name: input.name,
        sku: input.sku,
        description: input.description,
        image: input.image,
        unit: input.unit,
        price: input.price,
        cost_price: input.cost_price,
        tax_rate: input.tax_rate,
        stock_level: input.stock_level.unwrap_or(0),
        reorder_level: input.reorder_level.unwrap_or(DEFAULT_REORDER_LEVEL),
        status: input.status.unwrap_or_default(),
        created_at: timestamp,
        updated_at: timestamp,
    };
    validate_product_fields(&product)?;

    if !store.category_exists(product.category_id).await? {
        return Err(CoreError::not_found("Category", product.category_id));
    }
    if store.product_sku_taken(&product.sku, None).await? {
        return Err(CoreError::Conflict(format!(
            "Product sku '{}' already exists",
            product.sku
        )));
    }

    let saved = store.save_product(&product).await?;
    tracing::info!(product_id = %saved.id, sku = %saved.sku, "Product created");
    Ok(saved)
}

pub async fn get_product<S>(store: &mut S, id: DbId) -> CoreResult<Product>
where
    S: ProductStore + ?Sized,
{
    store
        .get_product(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Product", id))
}

pub async fn list_products<S>(
    store: &mut S,
    limit: Option<i64>,
    offset: Option<i64>,
) -> CoreResult<ProductPage>
where
    S: ProductStore + ?Sized,
{
    let limit = clamp_limit(limit);
    let offset = clamp_offset(offset);
    let items = store.find_products(limit, offset).await?;
    let total = store.count_products().await?;
    Ok(ProductPage {
        items,
        total,
        limit,
        offset,
    })
}

pub async fn search_products<S>(store: &mut S, query: &str) -> CoreResult<Vec<Product>>
where
    S: ProductStore + ?Sized,
{
    let query = query.trim();
    if query.is_empty() {
        return Err(CoreError::BadRequest("query must not be empty".into()));
    }
    Ok(store.search_products(query).await?)
}

/// Products in a category or in any of its direct children.
pub async fn list_products_by_category<S>(
    store: &mut S,
    category_id: DbId,
    limit: Option<i64>,
    offset: Option<i64>,
) -> CoreResult<Vec<Product>>
where
    S: ProductStore + CategoryStore + ?Sized,
{
    if !store.category_exists(category_id).await? {
        return Err(CoreError::not_found("Category", category_id));
    }
    Ok(store
        .find_products_by_category_or_parent(category_id, clamp_limit(limit), clamp_offset(offset))
        .await?)
}

pub async fn update_product<S>(store: &mut S, id: DbId, patch: UpdateProduct) -> CoreResult<Product>
where
    S: ProductStore + CategoryStore + ?Sized,
{
    let mut product = get_product(store, id).await?;
    let category_changed = patch.category_id.is_some_and(|c| c != product.category_id);
    let sku_changed = patch.sku.as_ref().is_some_and(|s| *s != product.sku);

    patch.apply_to(&mut product);
    validate_product_fields(&product)?;

    if category_changed && !store.category_exists(product.category_id).await? {
        return Err(CoreError::not_found("Category", product.category_id));
    }
    if sku_changed && store.product_sku_taken(&product.sku, Some(id)).await? {
        return Err(CoreError::Conflict(format!(
            "Product sku '{}' already exists",
            product.sku
        )));
    }

    product.updated_at = now();
    let saved = store.save_product(&product).await?;
    tracing::info!(product_id = %id, "Product updated");
    Ok(saved)
}

/// Delete a product; its variants, combinations, and barcodes go with it.
pub async fn delete_product<S>(store: &mut S, id: DbId) -> CoreResult<()>
where
    S: ProductStore + ?Sized,
{
    if !store.delete_product(id).await? {
        return Err(CoreError::not_found("Product", id));
    }
    tracing::info!(product_id = %id, "Product deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        assert_eq!(clamp_limit(None), DEFAULT_PAGE_SIZE);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(10_000)), MAX_PAGE_SIZE);
        assert_eq!(clamp_offset(Some(-5)), 0);
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(serde_json::to_string(&ProductStatus::Inactive).unwrap(), "\"inactive\"");
        assert_eq!("active".parse::<ProductStatus>().unwrap(), ProductStatus::Active);
        assert!("archived".parse::<ProductStatus>().is_err());
    }
}

//! Variant options, option values, product variants, and combination rows.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Money, Timestamp};

/// How a storefront renders an option's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptionDisplayType {
    Button,
    Dropdown,
    Swatch,
}

impl OptionDisplayType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Button => "BUTTON",
            Self::Dropdown => "DROPDOWN",
            Self::Swatch => "SWATCH",
        }
    }
}

impl fmt::Display for OptionDisplayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionDisplayType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUTTON" => Ok(Self::Button),
            "DROPDOWN" => Ok(Self::Dropdown),
            "SWATCH" => Ok(Self::Swatch),
            other => Err(CoreError::BadRequest(format!(
                "Unknown option display type '{other}'. Must be one of: BUTTON, DROPDOWN, SWATCH"
            ))),
        }
    }
}

/// Whether a value's price adjustment is an absolute amount or a percentage.
///
/// The engine stores the raw adjustment; applying it is left to consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceAdjustmentType {
    #[default]
    Fixed,
    Percentage,
}

impl PriceAdjustmentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "FIXED",
            Self::Percentage => "PERCENTAGE",
        }
    }
}

impl fmt::Display for PriceAdjustmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceAdjustmentType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FIXED" => Ok(Self::Fixed),
            "PERCENTAGE" => Ok(Self::Percentage),
            other => Err(CoreError::BadRequest(format!(
                "Unknown price adjustment type '{other}'. Must be FIXED or PERCENTAGE"
            ))),
        }
    }
}

/// A dimension along which a product varies (e.g. "Color").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantOption {
    pub id: DbId,
    pub name: String,
    pub is_required: bool,
    pub display_type: OptionDisplayType,
    pub position: i32,
}

/// One choice within an option (e.g. "Red").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantOptionValue {
    pub id: DbId,
    pub option_id: DbId,
    pub value: String,
    /// Presentation hint such as a hex color.
    pub display_value: Option<String>,
    pub position: i32,
    pub price_adjustment_type: PriceAdjustmentType,
    pub price_adjustment_value: Money,
}

/// A concrete, separately stocked version of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: DbId,
    pub product_id: DbId,
    pub sku: String,
    pub price: Money,
    pub cost: Option<Money>,
    pub stock_level: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Join row linking a variant to one of the option values it represents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantCombination {
    pub id: DbId,
    pub variant_id: DbId,
    pub option_value_id: DbId,
}

/// Input for creating an option.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOption {
    pub name: String,
    pub display_type: OptionDisplayType,
    pub position: Option<i32>,
    pub is_required: Option<bool>,
}

/// Input for creating an option value.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOptionValue {
    pub value: String,
    pub display_value: Option<String>,
    pub position: Option<i32>,
    pub price_adjustment_type: Option<PriceAdjustmentType>,
    pub price_adjustment: Option<Money>,
}

/// The option values picked for one dimension of a matrix generation.
#[derive(Debug, Clone, Deserialize)]
pub struct OptionSelection {
    pub option_id: DbId,
    pub value_ids: Vec<DbId>,
}

/// Input for matrix generation.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateMatrix {
    pub product_id: DbId,
    pub selections: Vec<OptionSelection>,
    pub default_price: Option<Money>,
    pub default_stock: Option<i32>,
}

/// A variant together with the option values it represents.
#[derive(Debug, Clone, Serialize)]
pub struct VariantSignature {
    pub variant: ProductVariant,
    pub values: Vec<VariantOptionValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_type_wire_names() {
        for t in [
            OptionDisplayType::Button,
            OptionDisplayType::Dropdown,
            OptionDisplayType::Swatch,
        ] {
            assert_eq!(t.as_str().parse::<OptionDisplayType>().unwrap(), t);
            assert_eq!(serde_json::to_string(&t).unwrap(), format!("\"{}\"", t.as_str()));
        }
        assert!("RADIO".parse::<OptionDisplayType>().is_err());
    }

    #[test]
    fn adjustment_type_defaults_to_fixed() {
        assert_eq!(PriceAdjustmentType::default(), PriceAdjustmentType::Fixed);
        assert_eq!(
            serde_json::from_str::<PriceAdjustmentType>("\"PERCENTAGE\"").unwrap(),
            PriceAdjustmentType::Percentage
        );
    }
}

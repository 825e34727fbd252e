//! Barcode formats, GTIN check-digit validation, and scan/assign resolution.
//!
//! A barcode row is keyed by the scanned code itself and points at exactly
//! one product or one variant. Rows are created only through
//! [`assign_barcode`] and are immutable afterwards except for deletion.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::store::{BarcodeStore, ProductStore, VariantStore};
use crate::types::{now, DbId, Money, Timestamp};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Symbology of a registered code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarcodeFormat {
    #[serde(rename = "UPC_A")]
    UpcA,
    #[serde(rename = "UPC_E")]
    UpcE,
    #[serde(rename = "EAN_13")]
    Ean13,
    #[serde(rename = "EAN_8")]
    Ean8,
    #[serde(rename = "CODE_128")]
    Code128,
}

impl BarcodeFormat {
    pub const ALL: [BarcodeFormat; 5] = [
        BarcodeFormat::UpcA,
        BarcodeFormat::UpcE,
        BarcodeFormat::Ean13,
        BarcodeFormat::Ean8,
        BarcodeFormat::Code128,
    ];

    /// Wire and database name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UpcA => "UPC_A",
            Self::UpcE => "UPC_E",
            Self::Ean13 => "EAN_13",
            Self::Ean8 => "EAN_8",
            Self::Code128 => "CODE_128",
        }
    }
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BarcodeFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| {
                CoreError::BadRequest(format!(
                    "Unknown barcode format '{s}'. Must be one of: UPC_A, UPC_E, EAN_13, EAN_8, CODE_128"
                ))
            })
    }
}

/// Kind of record a barcode points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BarcodeTargetType {
    Product,
    Variant,
}

impl BarcodeTargetType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Product => "PRODUCT",
            Self::Variant => "VARIANT",
        }
    }
}

impl fmt::Display for BarcodeTargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BarcodeTargetType {
    type Err = CoreError;

    /// Case-insensitive; anything other than `PRODUCT` / `VARIANT` is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("PRODUCT") {
            Ok(Self::Product)
        } else if s.eq_ignore_ascii_case("VARIANT") {
            Ok(Self::Variant)
        } else {
            Err(CoreError::InvalidTarget(format!(
                "Unknown barcode target type '{s}'. Must be PRODUCT or VARIANT"
            )))
        }
    }
}

/// The single record a barcode resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarcodeTarget {
    Product(DbId),
    Variant(DbId),
}

impl BarcodeTarget {
    pub fn new(target_type: BarcodeTargetType, id: DbId) -> Self {
        match target_type {
            BarcodeTargetType::Product => Self::Product(id),
            BarcodeTargetType::Variant => Self::Variant(id),
        }
    }

    pub fn target_type(self) -> BarcodeTargetType {
        match self {
            Self::Product(_) => BarcodeTargetType::Product,
            Self::Variant(_) => BarcodeTargetType::Variant,
        }
    }

    pub fn id(self) -> DbId {
        match self {
            Self::Product(id) | Self::Variant(id) => id,
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A registered barcode.
///
/// Storage keeps two nullable link columns, so a row with neither link can
/// exist in a damaged database. [`Barcode::target`] reports that as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Barcode {
    #[serde(rename = "barcode")]
    pub code: String,
    pub format: BarcodeFormat,
    pub product_id: Option<DbId>,
    pub variant_id: Option<DbId>,
    pub created_at: Timestamp,
}

impl Barcode {
    pub fn new(code: String, format: BarcodeFormat, target: BarcodeTarget) -> Self {
        let (product_id, variant_id) = match target {
            BarcodeTarget::Product(id) => (Some(id), None),
            BarcodeTarget::Variant(id) => (None, Some(id)),
        };
        Self {
            code,
            format,
            product_id,
            variant_id,
            created_at: now(),
        }
    }

    /// The linked record. A variant link takes precedence over a product link.
    pub fn target(&self) -> Option<BarcodeTarget> {
        match (self.variant_id, self.product_id) {
            (Some(variant_id), _) => Some(BarcodeTarget::Variant(variant_id)),
            (None, Some(product_id)) => Some(BarcodeTarget::Product(product_id)),
            (None, None) => None,
        }
    }
}

/// Unified view of whatever a scanned code identifies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResult {
    pub found: bool,
    pub barcode: String,
    #[serde(rename = "type")]
    pub target_type: Option<BarcodeTargetType>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Money>,
    pub stock_level: Option<i32>,
    pub product_id: Option<DbId>,
    pub variant_id: Option<DbId>,
}

impl ScanResult {
    pub fn not_found(code: &str) -> Self {
        Self {
            found: false,
            barcode: code.to_string(),
            target_type: None,
            name: None,
            description: None,
            sku: None,
            price: None,
            stock_level: None,
            product_id: None,
            variant_id: None,
        }
    }
}

/// Input for [`assign_barcode`].
#[derive(Debug, Clone)]
pub struct AssignBarcode {
    pub code: String,
    pub format: BarcodeFormat,
    pub target: BarcodeTarget,
}

// ---------------------------------------------------------------------------
// Checksum
// ---------------------------------------------------------------------------

/// Compute the GTIN check digit for a digit payload (the code minus its
/// final digit).
///
/// Digits are weighted 3, 1, 3, 1, ... from the right. Returns `None` if the
/// payload is empty or contains anything other than ASCII digits.
pub fn gtin_check_digit(payload: &str) -> Option<u8> {
    if payload.is_empty() || !payload.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let sum: u32 = payload
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let digit = u32::from(b - b'0');
            if i % 2 == 0 {
                digit * 3
            } else {
                digit
            }
        })
        .sum();

    Some(((10 - sum % 10) % 10) as u8)
}

/// Validate `code` against `format`.
///
/// - `CODE_128` has no check-digit scheme and is always accepted.
/// - `EAN_13` needs exactly 13 digits, `UPC_A` exactly 12, and the last
///   digit must match [`gtin_check_digit`] of the rest.
/// - `UPC_E` and `EAN_8` codes are rejected.
pub fn validate_checksum(code: &str, format: BarcodeFormat) -> bool {
    let expected_len = match format {
        BarcodeFormat::Code128 => return true,
        BarcodeFormat::Ean13 => 13,
        BarcodeFormat::UpcA => 12,
        BarcodeFormat::UpcE | BarcodeFormat::Ean8 => return false,
    };

    if code.len() != expected_len || !code.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let (payload, check) = code.split_at(expected_len - 1);
    gtin_check_digit(payload) == Some(check.as_bytes()[0] - b'0')
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve a scanned code to the product or variant it identifies.
///
/// Never fails on a missing or dangling barcode; those come back with
/// `found = false`.
pub async fn scan_barcode<S>(store: &mut S, code: &str) -> CoreResult<ScanResult>
where
    S: BarcodeStore + VariantStore + ProductStore + ?Sized,
{
    let Some(barcode) = store.find_by_code(code).await? else {
        return Ok(ScanResult::not_found(code));
    };

    match barcode.target() {
        Some(BarcodeTarget::Variant(variant_id)) => {
            let Some(variant) = store.get_variant(variant_id).await? else {
                tracing::warn!(code, %variant_id, "Barcode points at a missing variant");
                return Ok(ScanResult::not_found(code));
            };
            let Some(product) = store.get_product(variant.product_id).await? else {
                tracing::warn!(code, product_id = %variant.product_id, "Variant has no product");
                return Ok(ScanResult::not_found(code));
            };

            Ok(ScanResult {
                found: true,
                barcode: code.to_string(),
                target_type: Some(BarcodeTargetType::Variant),
                name: Some(format!("{} ({})", product.name, variant.sku)),
                description: product.description,
                sku: Some(variant.sku),
                price: Some(variant.price),
                stock_level: Some(variant.stock_level),
                product_id: Some(product.id),
                variant_id: Some(variant.id),
            })
        }
        Some(BarcodeTarget::Product(product_id)) => {
            let Some(product) = store.get_product(product_id).await? else {
                tracing::warn!(code, %product_id, "Barcode points at a missing product");
                return Ok(ScanResult::not_found(code));
            };

            Ok(ScanResult {
                found: true,
                barcode: code.to_string(),
                target_type: Some(BarcodeTargetType::Product),
                name: Some(product.name),
                description: product.description,
                sku: Some(product.sku),
                price: Some(product.price),
                stock_level: Some(product.stock_level),
                product_id: Some(product.id),
                variant_id: None,
            })
        }
        None => {
            tracing::warn!(code, "Barcode has neither a product nor a variant link");
            Ok(ScanResult::not_found(code))
        }
    }
}

/// Register a new code against a product or variant.
pub async fn assign_barcode<S>(store: &mut S, input: AssignBarcode) -> CoreResult<Barcode>
where
    S: BarcodeStore + VariantStore + ProductStore + ?Sized,
{
    if input.code.trim().is_empty() {
        return Err(CoreError::BadRequest("barcode must not be empty".into()));
    }
    if !validate_checksum(&input.code, input.format) {
        return Err(CoreError::InvalidChecksum {
            format: input.format,
        });
    }
    if store.exists_by_code(&input.code).await? {
        return Err(CoreError::AlreadyRegistered(input.code));
    }

    let exists = match input.target {
        BarcodeTarget::Variant(id) => store.get_variant(id).await?.is_some(),
        BarcodeTarget::Product(id) => store.get_product(id).await?.is_some(),
    };
    if !exists {
        return Err(CoreError::TargetNotFound {
            target_type: input.target.target_type(),
            id: input.target.id(),
        });
    }

    let barcode = Barcode::new(input.code, input.format, input.target);
    let saved = store.save_barcode(&barcode).await?;

    tracing::info!(
        code = %saved.code,
        format = %saved.format,
        target_type = %input.target.target_type(),
        target_id = %input.target.id(),
        "Barcode assigned",
    );

    Ok(saved)
}

/// Remove a registered code.
pub async fn delete_barcode<S>(store: &mut S, code: &str) -> CoreResult<()>
where
    S: BarcodeStore + ?Sized,
{
    if !store.delete_barcode(code).await? {
        return Err(CoreError::not_found("Barcode", code));
    }
    tracing::info!(code, "Barcode deleted");
    Ok(())
}

/// All codes registered against one product or variant.
pub async fn barcodes_for_target<S>(store: &mut S, target: BarcodeTarget) -> CoreResult<Vec<Barcode>>
where
    S: BarcodeStore + ?Sized,
{
    let barcodes = match target {
        BarcodeTarget::Product(id) => store.find_barcodes_by_product(id).await?,
        BarcodeTarget::Variant(id) => store.find_barcodes_by_variant(id).await?,
    };
    Ok(barcodes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Append the correct check digit to a payload.
    fn with_check_digit(payload: &str) -> String {
        let check = gtin_check_digit(payload).unwrap();
        format!("{payload}{check}")
    }

    // -- validate_checksum ---------------------------------------------------

    #[test]
    fn known_ean13_is_valid() {
        assert!(validate_checksum("4006381333931", BarcodeFormat::Ean13));
    }

    #[test]
    fn known_ean13_with_wrong_check_digit_is_invalid() {
        assert!(!validate_checksum("4006381333930", BarcodeFormat::Ean13));
    }

    #[test]
    fn known_upca_is_valid() {
        assert!(validate_checksum("036000291452", BarcodeFormat::UpcA));
    }

    #[test]
    fn upca_length_rejected_for_ean13() {
        assert!(!validate_checksum("036000291452", BarcodeFormat::Ean13));
    }

    #[test]
    fn ean13_length_rejected_for_upca() {
        assert!(!validate_checksum("4006381333931", BarcodeFormat::UpcA));
    }

    #[test]
    fn non_digits_rejected() {
        assert!(!validate_checksum("40063813339a1", BarcodeFormat::Ean13));
        assert!(!validate_checksum("03600029145-", BarcodeFormat::UpcA));
        assert!(!validate_checksum("", BarcodeFormat::Ean13));
    }

    #[test]
    fn code128_always_valid() {
        assert!(validate_checksum("ABC-123/xyz", BarcodeFormat::Code128));
        assert!(validate_checksum("", BarcodeFormat::Code128));
    }

    #[test]
    fn upce_and_ean8_digit_strings_rejected() {
        assert!(!validate_checksum("01234565", BarcodeFormat::UpcE));
        assert!(!validate_checksum("96385074", BarcodeFormat::Ean8));
        assert!(!validate_checksum("4006381333931", BarcodeFormat::Ean8));
    }

    #[test]
    fn constructed_codes_validate() {
        for payload in ["000000000000", "123456789012", "978030640615", "590123412345"] {
            let code = with_check_digit(payload);
            assert!(validate_checksum(&code, BarcodeFormat::Ean13), "{code}");
        }
        for payload in ["00000000000", "01234567890", "72527273070"] {
            let code = with_check_digit(payload);
            assert!(validate_checksum(&code, BarcodeFormat::UpcA), "{code}");
        }
    }

    #[test]
    fn every_single_digit_substitution_in_check_digit_is_detected() {
        let code = "4006381333931";
        let check = code.as_bytes()[12];
        for digit in b'0'..=b'9' {
            if digit == check {
                continue;
            }
            let mut bytes = code.as_bytes().to_vec();
            bytes[12] = digit;
            let flipped = String::from_utf8(bytes).unwrap();
            assert!(!validate_checksum(&flipped, BarcodeFormat::Ean13), "{flipped}");
        }
    }

    #[test]
    fn single_digit_substitution_in_payload_is_detected() {
        // With weights 1 and 3 every substitution at a single position changes
        // the sum modulo 10, so no flip may survive validation.
        let code = with_check_digit("12345678901");
        for pos in 0..11 {
            for digit in b'0'..=b'9' {
                let mut bytes = code.as_bytes().to_vec();
                if bytes[pos] == digit {
                    continue;
                }
                bytes[pos] = digit;
                let flipped = String::from_utf8(bytes).unwrap();
                assert!(!validate_checksum(&flipped, BarcodeFormat::UpcA), "{flipped}");
            }
        }
    }

    // -- gtin_check_digit ----------------------------------------------------

    #[test]
    fn check_digit_of_known_payload() {
        assert_eq!(gtin_check_digit("400638133393"), Some(1));
        assert_eq!(gtin_check_digit("03600029145"), Some(2));
    }

    #[test]
    fn check_digit_rejects_bad_payload() {
        assert_eq!(gtin_check_digit(""), None);
        assert_eq!(gtin_check_digit("12a4"), None);
    }

    // -- enums ---------------------------------------------------------------

    #[test]
    fn format_round_trips_through_wire_name() {
        for format in BarcodeFormat::ALL {
            assert_eq!(format.as_str().parse::<BarcodeFormat>().unwrap(), format);
            let json = serde_json::to_string(&format).unwrap();
            assert_eq!(json, format!("\"{}\"", format.as_str()));
        }
    }

    #[test]
    fn unknown_format_rejected() {
        assert!(matches!(
            "QR".parse::<BarcodeFormat>(),
            Err(CoreError::BadRequest(_))
        ));
    }

    #[test]
    fn target_type_parse_is_case_insensitive() {
        assert_eq!("variant".parse::<BarcodeTargetType>().unwrap(), BarcodeTargetType::Variant);
        assert_eq!("PRODUCT".parse::<BarcodeTargetType>().unwrap(), BarcodeTargetType::Product);
    }

    #[test]
    fn unknown_target_type_rejected() {
        assert!(matches!(
            "CATEGORY".parse::<BarcodeTargetType>(),
            Err(CoreError::InvalidTarget(_))
        ));
    }

    // -- Barcode::target -----------------------------------------------------

    #[test]
    fn barcode_without_links_has_no_target() {
        let barcode = Barcode {
            code: "X".into(),
            format: BarcodeFormat::Code128,
            product_id: None,
            variant_id: None,
            created_at: now(),
        };
        assert_eq!(barcode.target(), None);
    }

    #[test]
    fn new_barcode_links_exactly_one_target() {
        let id = crate::types::new_id();
        let barcode = Barcode::new("X".into(), BarcodeFormat::Code128, BarcodeTarget::Variant(id));
        assert_eq!(barcode.product_id, None);
        assert_eq!(barcode.variant_id, Some(id));
        assert_eq!(barcode.target(), Some(BarcodeTarget::Variant(id)));
    }
}

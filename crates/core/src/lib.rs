//! Stockroom catalog engine.
//!
//! Domain records, the error taxonomy, pure algorithms (GTIN checksums,
//! Cartesian products, SKU derivation, the category forest), the storage
//! traits, and engine operations written against those traits. No database
//! code lives here; `stockroom-db` provides the Postgres backend and
//! [`memory`] an in-process one.

pub mod barcode;
pub mod category;
pub mod category_tree;
pub mod error;
pub mod memory;
pub mod product;
pub mod store;
pub mod types;
pub mod variant;
pub mod variant_matrix;

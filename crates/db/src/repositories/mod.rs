//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&mut PgConnection` as the first argument, so they run on
//! whatever transaction the caller holds.

pub mod barcode_repo;
pub mod category_repo;
pub mod option_repo;
pub mod product_repo;
pub mod variant_repo;

pub use barcode_repo::BarcodeRepo;
pub use category_repo::CategoryRepo;
pub use option_repo::OptionRepo;
pub use product_repo::ProductRepo;
pub use variant_repo::VariantRepo;

pub mod barcodes;
pub mod categories;
pub mod products;
pub mod variants;

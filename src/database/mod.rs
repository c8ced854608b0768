//! Ledger database module

pub mod operations;
pub mod schema;

// Re-export for convenience
pub use operations::{DownloadRecord, Ledger};
pub use schema::initialize_database;

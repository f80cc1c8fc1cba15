//! Adapters layer: Concrete implementations of ports.
//!
//! - `logistic`: JSON-exported logistic regression with signed manifests
//! - `sqlite`: SQLite for local screening storage
//! - `sanitize`: identifier redaction for logs

pub mod logistic;
pub mod sanitize;
pub mod sqlite;

// Re-export storage error for lib.rs
pub use sqlite::StorageError;

// =============================================================================
// CRATE-LEVEL QUALITY LINTS (following Tokio/Serde standards)
// =============================================================================
#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]
#![warn(unreachable_pub)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
// =============================================================================
// CLIPPY CONFIGURATION
// =============================================================================
#![allow(clippy::doc_markdown)] // Code items in docs
#![allow(clippy::missing_errors_doc)] // # Errors sections - doc-heavy
#![allow(clippy::module_name_repetitions)] // Type names matching module - acceptable
#![allow(clippy::must_use_candidate)] // Accessors don't need must_use
#![allow(clippy::format_push_string)] // String building style preference
// Batch ranges are derived from the value list length before slicing
#![allow(clippy::indexing_slicing)]

//! # sql-bulk - Batched Multi-Row INSERT Builder
//!
//! Accumulates rows for a table and inserts them with as few multi-row
//! `INSERT` statements as possible, never binding more parameters per
//! statement than the configured placeholder limit.
//!
//! ## Quick Start
//!
//! ```
//! # use sql_bulk::prelude::*;
//! let mut bulk = BulkInsert::new("users", ["id", "name"]).unwrap();
//! bulk.accumulate_row([Value::Int(1), Value::from("alice")]).unwrap();
//! bulk.accumulate_row([Value::Int(2), Value::from("bob")]).unwrap();
//!
//! let statements = bulk.statements(false).unwrap();
//! assert_eq!(statements.len(), 1);
//! assert_eq!(statements[0].sql, "INSERT INTO users(id, name) VALUES (?,?),(?,?)");
//! assert_eq!(statements[0].params.len(), 4);
//! ```
//!
//! ## Upsert
//!
//! Passing `upsert = true` appends an `ON DUPLICATE KEY UPDATE` clause that
//! overwrites every inserted column:
//!
//! ```
//! # use sql_bulk::prelude::*;
//! let mut bulk = BulkInsert::new("stock", ["sku", "qty"]).unwrap();
//! bulk.accumulate_row([Value::from("A-1"), Value::Int(5)]).unwrap();
//!
//! let statements = bulk.statements(true).unwrap();
//! assert_eq!(
//!     statements[0].sql,
//!     "INSERT INTO stock(sku, qty) VALUES (?,?) ON DUPLICATE KEY UPDATE sku=VALUES(sku),qty=VALUES(qty)"
//! );
//! ```
//!
//! ## Batching
//!
//! | Rows x columns | Limit | Statements              |
//! |----------------|-------|-------------------------|
//! | 4 x 2          | 5     | 2 (rows 0-1, rows 2-3)  |
//! | 7 x 2          | 6     | 3 (3 + 3 + 1 rows)      |
//! | 1000 x 3       | 60000 | 1                       |
//!
//! Each statement holds `floor(limit / columns)` rows; the last one takes
//! whatever remains. Execution goes through the [`Executor`] trait, batch by
//! batch, and stops at the first failure. Earlier batches are not rolled back.
//!
//! ## Features
//!
//! - `rusqlite` (off by default): implements [`Executor`] for
//!   `&rusqlite::Connection` and `rusqlite::ToSql` for [`Value`]. The
//!   SQLite integration tests need it: `cargo test --features rusqlite`.
//!
//! ## Logging
//!
//! Planning and per-batch progress are emitted as `tracing` events at
//! `debug`/`trace` level. Install any subscriber to see them.

mod builder;
mod config;
mod error;
mod executor;
mod value;

pub use builder::{
    Batch, BatchPlan, BatchStatement, BulkInsert, InsertSummary, PlaceholderGroup, upsert_clause,
};
pub use config::{
    BulkConfig, DEFAULT_PLACEHOLDER_LIMIT, MYSQL_MAX_PARAMS, PLACEHOLDER_LIMIT_ENV,
    POSTGRES_MAX_PARAMS, SQLITE_MAX_PARAMS,
};
pub use error::{BoxError, BulkError};
pub use executor::Executor;
pub use value::Value;

/// Re-export miniserde's json module for callers building JSON rows.
pub use miniserde::json;

/// Prelude module for convenient imports.
///
/// ```
/// use sql_bulk::prelude::*;
/// let bulk = BulkInsert::new("users", ["id"]).unwrap();
/// assert!(bulk.is_empty());
/// ```
pub mod prelude {
    pub use crate::{
        Batch, BatchPlan, BatchStatement, BulkConfig, BulkError, BulkInsert, Executor,
        InsertSummary, PlaceholderGroup, Value, upsert_clause,
    };
}


// ============================================================================
// API Contract Tests (compile-time assertions)
// ============================================================================

//! Bulk INSERT construction: placeholders, batch planning, and statement assembly.

mod insert;
mod placeholder;
mod plan;
mod statement;

// Re-export all public items
pub use insert::{BulkInsert, InsertSummary};
pub use placeholder::PlaceholderGroup;
pub use plan::{Batch, BatchPlan};
pub use statement::{BatchStatement, upsert_clause};

//! Error type for bulk insert operations.

use thiserror::Error;

/// Boxed executor error, preserved as the `source` of execution failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by [`BulkInsert`](crate::BulkInsert) and [`BulkConfig`](crate::BulkConfig).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BulkError {
    /// A row did not have exactly one value per configured column.
    #[error(
        "wrong number of values{}: supplied {supplied}, required {required}",
        .row.map(|r| format!(" in row {r}")).unwrap_or_default()
    )]
    ArityMismatch {
        /// Number of values supplied.
        supplied: usize,
        /// Number of configured columns.
        required: usize,
        /// Index of the offending row within a multi-row call, if any.
        row: Option<usize>,
    },

    /// The executor could not prepare a batch statement.
    #[error("failed to prepare batch {batch}: {source}")]
    PrepareFailure {
        /// Zero-based index of the failed batch.
        batch: usize,
        /// Error reported by the executor.
        source: BoxError,
    },

    /// The executor could not execute a prepared batch statement.
    #[error("failed to execute batch {batch}: {source}")]
    ExecuteFailure {
        /// Zero-based index of the failed batch.
        batch: usize,
        /// Error reported by the executor.
        source: BoxError,
    },

    /// The builder cannot produce any valid statement with this setup.
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// A configuration override could not be parsed.
    #[error("invalid value `{value}` for {key}")]
    InvalidConfig {
        /// Name of the configuration key.
        key: &'static str,
        /// The rejected raw value.
        value: String,
    },

    /// JSON row input was malformed.
    #[error("invalid JSON rows: {0}")]
    InvalidJson(String),
}

impl BulkError {
    /// Returns `true` if the caller supplied bad row data.
    ///
    /// Includes `ArityMismatch` and `InvalidJson`. `accumulate_row` and
    /// `accumulate_json` leave the builder untouched on these errors.
    /// `accumulate_rows` keeps the rows before the rejected one, whose index
    /// is carried in `ArityMismatch::row`.
    #[inline]
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(self, Self::ArityMismatch { .. } | Self::InvalidJson(_))
    }

    /// Returns `true` if the executor failed while running batches.
    ///
    /// Includes `PrepareFailure` and `ExecuteFailure`. Batches before
    /// [`failed_batch`](Self::failed_batch) have already been applied.
    #[inline]
    #[must_use]
    pub const fn is_execution_error(&self) -> bool {
        matches!(
            self,
            Self::PrepareFailure { .. } | Self::ExecuteFailure { .. }
        )
    }

    /// Returns `true` for configuration problems.
    #[inline]
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationError(_) | Self::InvalidConfig { .. }
        )
    }

    /// Index of the batch that failed, for execution errors.
    #[must_use]
    pub const fn failed_batch(&self) -> Option<usize> {
        match self {
            Self::PrepareFailure { batch, .. } | Self::ExecuteFailure { batch, .. } => {
                Some(*batch)
            },
            _ => None,
        }
    }
}

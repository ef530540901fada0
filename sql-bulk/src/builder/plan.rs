//! Batch planning.
//!
//! Splits accumulated rows into contiguous batches so that no statement binds
//! more than the placeholder limit. Batches are described purely by row
//! ranges; value slices and placeholder text are both derived from them.

use std::ops::Range;

use crate::error::BulkError;

/// One batch of rows destined for a single statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    index: usize,
    rows: Range<usize>,
    values_per_row: usize,
}

impl Batch {
    /// Zero-based position of this batch in execution order.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Row range covered by this batch.
    #[inline]
    #[must_use]
    pub fn rows(&self) -> Range<usize> {
        self.rows.clone()
    }

    /// Range of the flat value list covered by this batch.
    #[inline]
    #[must_use]
    pub const fn values(&self) -> Range<usize> {
        self.rows.start * self.values_per_row..self.rows.end * self.values_per_row
    }

    /// Number of rows in this batch.
    #[inline]
    #[must_use]
    pub const fn row_count(&self) -> usize {
        self.rows.end - self.rows.start
    }

    /// Number of parameters this batch binds.
    #[inline]
    #[must_use]
    pub const fn param_count(&self) -> usize {
        self.row_count() * self.values_per_row
    }
}

/// The ordered set of batches for one insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    batches: Vec<Batch>,
    rows_per_batch: usize,
}

impl BatchPlan {
    /// Plan batches for `row_count` rows of `values_per_row` values each.
    ///
    /// When all values fit under `placeholder_limit` there is exactly one
    /// batch. Otherwise each batch holds `rows_per_batch = placeholder_limit /
    /// values_per_row` whole rows, and the batch count is
    /// `ceil(row_count / rows_per_batch)`. This equals `ceil(total_values /
    /// placeholder_limit)` whenever the last batch fits. When it would not,
    /// one more batch is planned so no statement exceeds the limit: 10 rows of
    /// 3 values under a limit of 10 give 4 batches (3 + 3 + 3 + 1 rows), where
    /// three batches would leave 12 values in the last one.
    ///
    /// ```
    /// use sql_bulk::BatchPlan;
    ///
    /// // 4 rows x 2 values under a limit of 5: two rows fit per statement
    /// let plan = BatchPlan::new(4, 2, 5).unwrap();
    /// assert_eq!(plan.len(), 2);
    /// assert_eq!(plan.batches()[0].rows(), 0..2);
    /// assert_eq!(plan.batches()[1].rows(), 2..4);
    ///
    /// // rows never straddle a batch, so the remainder gets its own statement
    /// let plan = BatchPlan::new(10, 3, 10).unwrap();
    /// assert_eq!(plan.len(), 4);
    /// assert!(plan.iter().all(|b| b.param_count() <= 10));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if `values_per_row` is zero or no single
    /// row fits under `placeholder_limit`.
    pub fn new(
        row_count: usize,
        values_per_row: usize,
        placeholder_limit: usize,
    ) -> Result<Self, BulkError> {
        let rows_per_batch = rows_per_batch(values_per_row, placeholder_limit)?;

        if row_count == 0 {
            return Ok(Self {
                batches: Vec::new(),
                rows_per_batch,
            });
        }

        let total = row_count.saturating_mul(values_per_row);
        if total < placeholder_limit {
            return Ok(Self {
                batches: vec![Batch {
                    index: 0,
                    rows: 0..row_count,
                    values_per_row,
                }],
                rows_per_batch,
            });
        }

        let batch_count = row_count.div_ceil(rows_per_batch);
        let batches = (0..batch_count)
            .map(|index| {
                let start = index * rows_per_batch;
                // last batch absorbs the remainder
                let end = if index + 1 == batch_count {
                    row_count
                } else {
                    start + rows_per_batch
                };
                Batch {
                    index,
                    rows: start..end,
                    values_per_row,
                }
            })
            .collect();

        Ok(Self {
            batches,
            rows_per_batch,
        })
    }

    /// The planned batches in execution order.
    #[inline]
    #[must_use]
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Iterate over the batches in execution order.
    pub fn iter(&self) -> std::slice::Iter<'_, Batch> {
        self.batches.iter()
    }

    /// Number of batches.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Returns `true` when there is nothing to insert.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Maximum rows a single batch may hold under the limit.
    #[inline]
    #[must_use]
    pub const fn rows_per_batch(&self) -> usize {
        self.rows_per_batch
    }
}

impl<'a> IntoIterator for &'a BatchPlan {
    type Item = &'a Batch;
    type IntoIter = std::slice::Iter<'a, Batch>;

    fn into_iter(self) -> Self::IntoIter {
        self.batches.iter()
    }
}

/// Rows that fit in one statement, or an error if not even one does.
pub(crate) fn rows_per_batch(
    values_per_row: usize,
    placeholder_limit: usize,
) -> Result<usize, BulkError> {
    if values_per_row == 0 {
        return Err(BulkError::ConfigurationError(
            "rows must have at least one value".to_string(),
        ));
    }
    if placeholder_limit == 0 {
        return Err(BulkError::ConfigurationError(
            "placeholder limit must be at least 1".to_string(),
        ));
    }
    if values_per_row > placeholder_limit {
        return Err(BulkError::ConfigurationError(format!(
            "a row of {values_per_row} values exceeds the placeholder limit of {placeholder_limit}"
        )));
    }
    Ok(placeholder_limit / values_per_row)
}

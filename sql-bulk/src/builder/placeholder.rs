//! Placeholder group generation.

use crate::error::BulkError;

/// The placeholder group for one row, e.g. `(?,?,?)` for three columns.
///
/// Computed once per builder and repeated for every row of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderGroup {
    text: String,
    columns: usize,
}

impl PlaceholderGroup {
    /// Create the group for `columns` values per row.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if `columns` is zero.
    pub fn new(columns: usize) -> Result<Self, BulkError> {
        if columns == 0 {
            return Err(BulkError::ConfigurationError(
                "at least one column is required".to_string(),
            ));
        }

        let mut text = String::with_capacity(2 * columns + 1);
        text.push_str("(?");
        for _ in 1..columns {
            text.push_str(",?");
        }
        text.push(')');

        Ok(Self { text, columns })
    }

    /// The group text without a trailing separator.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of placeholders in the group.
    #[inline]
    #[must_use]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// Characters one row occupies in a rendered batch, separator included.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        2 * (self.columns + 1)
    }

    /// Render `rows` groups joined by `,`.
    ///
    /// ```
    /// use sql_bulk::PlaceholderGroup;
    ///
    /// let group = PlaceholderGroup::new(2).unwrap();
    /// assert_eq!(group.render(3), "(?,?),(?,?),(?,?)");
    /// assert_eq!(group.render(0), "");
    /// ```
    #[must_use]
    pub fn render(&self, rows: usize) -> String {
        let mut out = String::with_capacity((rows * self.width()).saturating_sub(1));
        self.render_into(rows, &mut out);
        out
    }

    /// Append `rows` groups joined by `,` to `out`.
    pub fn render_into(&self, rows: usize, out: &mut String) {
        for i in 0..rows {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&self.text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_text() {
        assert_eq!(PlaceholderGroup::new(1).unwrap().as_str(), "(?)");
        assert_eq!(PlaceholderGroup::new(2).unwrap().as_str(), "(?,?)");
        assert_eq!(PlaceholderGroup::new(4).unwrap().as_str(), "(?,?,?,?)");
    }

    #[test]
    fn test_zero_columns_rejected() {
        let err = PlaceholderGroup::new(0).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_width_matches_rendered_text() {
        for columns in 1..=12 {
            let group = PlaceholderGroup::new(columns).unwrap();
            // one group plus its separator
            assert_eq!(group.as_str().len() + 1, group.width());
            // n rows render to n widths minus the final separator
            assert_eq!(group.render(5).len(), 5 * group.width() - 1);
        }
    }

    #[test]
    fn test_render_never_ends_with_separator() {
        let group = PlaceholderGroup::new(3).unwrap();
        let text = group.render(10);
        assert!(text.ends_with(')'));
        assert_eq!(text.matches('?').count(), 30);
        assert_eq!(text.matches("),(").count(), 9);
    }

    #[test]
    fn test_render_into_appends() {
        let group = PlaceholderGroup::new(1).unwrap();
        let mut sql = String::from("VALUES ");
        group.render_into(2, &mut sql);
        assert_eq!(sql, "VALUES (?),(?)");
    }
}

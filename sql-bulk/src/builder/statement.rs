//! Statement assembly.

use crate::value::Value;

use super::placeholder::PlaceholderGroup;

/// Keyword introducing the upsert clause.
const UPSERT_KEYWORD: &str = " ON DUPLICATE KEY UPDATE ";

/// Build the upsert assignments for `columns`.
///
/// ```
/// use sql_bulk::upsert_clause;
///
/// assert_eq!(upsert_clause(&["a", "b"]), "a=VALUES(a),b=VALUES(b)");
/// ```
#[must_use]
pub fn upsert_clause<S: AsRef<str>>(columns: &[S]) -> String {
    columns
        .iter()
        .map(|c| {
            let c = c.as_ref();
            format!("{c}=VALUES({c})")
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// A finished statement for one batch.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "BatchStatement must be used to execute the batch"]
pub struct BatchStatement<'a> {
    /// Zero-based batch index.
    pub batch: usize,
    /// SQL text with positional placeholders.
    pub sql: String,
    /// Values bound to the placeholders, in order.
    pub params: &'a [Value],
}

/// The fixed parts of every statement a builder emits.
#[derive(Debug, Clone)]
pub(crate) struct StatementTemplate {
    prefix: String,
    group: PlaceholderGroup,
    upsert: String,
}

impl StatementTemplate {
    pub(crate) fn new(table: &str, columns: &[String], group: PlaceholderGroup) -> Self {
        let prefix = format!("INSERT INTO {table}({}) VALUES ", columns.join(", "));
        let upsert = format!("{UPSERT_KEYWORD}{}", upsert_clause(columns));
        Self {
            prefix,
            group,
            upsert,
        }
    }

    #[cfg(test)]
    pub(crate) fn prefix(&self) -> &str {
        &self.prefix
    }

    pub(crate) const fn group(&self) -> &PlaceholderGroup {
        &self.group
    }

    /// SQL for a batch of `rows` rows.
    pub(crate) fn assemble(&self, rows: usize, upsert: bool) -> String {
        let upsert_len = if upsert { self.upsert.len() } else { 0 };
        let mut sql = String::with_capacity(
            self.prefix.len() + rows * self.group.width() + upsert_len,
        );
        sql.push_str(&self.prefix);
        self.group.render_into(rows, &mut sql);
        if upsert {
            sql.push_str(&self.upsert);
        }
        sql
    }
}

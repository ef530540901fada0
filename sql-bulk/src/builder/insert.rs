//! Bulk INSERT builder.

use miniserde::json::Value as JsonValue;
use tracing::{debug, trace, warn};

use crate::config::BulkConfig;
use crate::error::BulkError;
use crate::executor::Executor;
use crate::value::Value;

use super::placeholder::PlaceholderGroup;
use super::plan::{BatchPlan, rows_per_batch};
use super::statement::{BatchStatement, StatementTemplate};

/// Accumulates rows for one table and inserts them in placeholder-bounded batches.
///
/// ```
/// use sql_bulk::{BulkConfig, BulkInsert, Value};
///
/// let config = BulkConfig::new().with_placeholder_limit(5);
/// let mut bulk = BulkInsert::with_config("points", ["x", "y"], config).unwrap();
/// for i in 0..4 {
///     bulk.accumulate_row([Value::Int(i), Value::Int(i * 10)]).unwrap();
/// }
///
/// let statements = bulk.statements(false).unwrap();
/// assert_eq!(statements.len(), 2);
/// assert_eq!(statements[0].sql, "INSERT INTO points(x, y) VALUES (?,?),(?,?)");
/// assert_eq!(statements[1].params, &[2, 20, 3, 30].map(Value::Int)[..]);
/// ```
#[derive(Debug, Clone)]
pub struct BulkInsert {
    table: String,
    columns: Vec<String>,
    template: StatementTemplate,
    values: Vec<Value>,
    row_count: usize,
    config: BulkConfig,
}

/// Outcome of a successful [`BulkInsert::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct InsertSummary {
    /// Number of statements executed.
    pub batches: usize,
    /// Number of rows sent.
    pub rows: usize,
    /// Sum of the affected-row counts reported by the executor.
    pub affected: u64,
}

impl BulkInsert {
    /// Create a builder with the default configuration.
    pub fn new<I, S>(table: impl Into<String>, columns: I) -> Result<Self, BulkError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_config(table, columns, BulkConfig::default())
    }

    /// Create a builder with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if `columns` is empty, the placeholder
    /// limit is zero, or a single row would not fit under the limit.
    pub fn with_config<I, S>(
        table: impl Into<String>,
        columns: I,
        config: BulkConfig,
    ) -> Result<Self, BulkError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let table = table.into();
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();

        let group = PlaceholderGroup::new(columns.len())?;
        rows_per_batch(columns.len(), config.placeholder_limit())?;
        let template = StatementTemplate::new(&table, &columns, group);

        Ok(Self {
            table,
            columns,
            template,
            values: Vec::new(),
            row_count: 0,
            config,
        })
    }

    /// Target table name.
    #[inline]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Configured columns, in statement order.
    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values each row must supply.
    #[inline]
    pub fn values_per_row(&self) -> usize {
        self.columns.len()
    }

    /// Number of accumulated rows.
    #[inline]
    pub const fn row_count(&self) -> usize {
        self.row_count
    }

    /// Returns `true` if no rows have been accumulated.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// All accumulated values, row after row.
    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// The configuration this builder was created with.
    #[inline]
    pub const fn config(&self) -> &BulkConfig {
        &self.config
    }

    /// Placeholder groups for every accumulated row, joined by `,`.
    pub fn placeholders(&self) -> String {
        self.template.group().render(self.row_count)
    }

    /// Append one row.
    ///
    /// # Errors
    ///
    /// Returns `ArityMismatch` if the row does not have exactly one value per
    /// column. The builder is left untouched in that case.
    pub fn accumulate_row<I, V>(&mut self, row: I) -> Result<(), BulkError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let row: Vec<Value> = row.into_iter().map(Into::into).collect();
        self.check_arity(row.len(), None)?;
        self.push_row(row);
        Ok(())
    }

    /// Append several rows, stopping at the first one with the wrong arity.
    ///
    /// Rows before the rejected one stay accumulated. The error carries the
    /// rejected row's index within `rows`.
    pub fn accumulate_rows<R, I, V>(&mut self, rows: R) -> Result<(), BulkError>
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        for (idx, row) in rows.into_iter().enumerate() {
            let row: Vec<Value> = row.into_iter().map(Into::into).collect();
            self.check_arity(row.len(), Some(idx))?;
            self.push_row(row);
        }
        Ok(())
    }

    /// Append rows from a JSON array of arrays, e.g. `[[1, "a"], [2, "b"]]`.
    ///
    /// The whole document is validated before any row is added, so on error
    /// the builder is left untouched. Returns the number of rows added.
    ///
    /// ```
    /// use sql_bulk::{BulkInsert, Value};
    ///
    /// let mut bulk = BulkInsert::new("users", ["id", "name"]).unwrap();
    /// let added = bulk.accumulate_json(r#"[[1, "alice"], [2, null]]"#).unwrap();
    /// assert_eq!(added, 2);
    /// assert_eq!(bulk.values()[3], Value::Null);
    /// ```
    pub fn accumulate_json(&mut self, json: &str) -> Result<usize, BulkError> {
        let parsed: JsonValue = miniserde::json::from_str(json)
            .map_err(|_| BulkError::InvalidJson("document is not valid JSON".to_string()))?;

        let JsonValue::Array(rows) = parsed else {
            return Err(BulkError::InvalidJson(
                "expected an array of rows".to_string(),
            ));
        };

        let mut decoded = Vec::with_capacity(rows.len() * self.values_per_row());
        for (idx, row) in rows.iter().enumerate() {
            let JsonValue::Array(items) = row else {
                return Err(BulkError::InvalidJson(format!(
                    "row {idx} is not an array"
                )));
            };
            self.check_arity(items.len(), Some(idx))?;
            for item in items.iter() {
                let value = Value::from_json(item).ok_or_else(|| match item {
                    JsonValue::Array(_) | JsonValue::Object(_) => {
                        BulkError::InvalidJson(format!("row {idx} contains a non-scalar value"))
                    },
                    _ => BulkError::InvalidJson(format!(
                        "row {idx} contains an integer outside the i64 range"
                    )),
                })?;
                decoded.push(value);
            }
        }

        let added = rows.len();
        self.values.extend(decoded);
        self.row_count += added;
        Ok(added)
    }

    /// Split the accumulated rows into batches under the placeholder limit.
    pub fn plan(&self) -> Result<BatchPlan, BulkError> {
        BatchPlan::new(
            self.row_count,
            self.values_per_row(),
            self.config.placeholder_limit(),
        )
    }

    /// Assemble every batch statement without executing anything.
    pub fn statements(&self, upsert: bool) -> Result<Vec<BatchStatement<'_>>, BulkError> {
        let plan = self.plan()?;
        Ok(plan
            .iter()
            .map(|batch| BatchStatement {
                batch: batch.index(),
                sql: self.template.assemble(batch.row_count(), upsert),
                params: &self.values[batch.values()],
            })
            .collect())
    }

    /// Insert all accumulated rows, one batch at a time.
    ///
    /// With `upsert`, each statement ends in an `ON DUPLICATE KEY UPDATE`
    /// clause covering every column. Batches run strictly in order and the
    /// first prepare or execute failure stops the run. Batches that already
    /// ran are not rolled back.
    pub fn insert<E: Executor>(
        self,
        mut executor: E,
        upsert: bool,
    ) -> Result<InsertSummary, BulkError> {
        let plan = self.plan()?;
        debug!(
            table = %self.table,
            rows = self.row_count,
            batches = plan.len(),
            rows_per_batch = plan.rows_per_batch(),
            placeholder_limit = self.config.placeholder_limit(),
            upsert,
            "bulk insert planned"
        );

        let mut summary = InsertSummary::default();
        for batch in &plan {
            let index = batch.index();
            let sql = self.template.assemble(batch.row_count(), upsert);
            let params = &self.values[batch.values()];

            debug!(
                batch = index,
                rows = batch.row_count(),
                params = params.len(),
                sql_len = sql.len(),
                "preparing batch"
            );
            trace!(batch = index, sql = %sql, "batch statement");

            let mut statement = executor.prepare(&sql).map_err(|e| {
                warn!(batch = index, stage = "prepare", error = %e, "batch failed");
                BulkError::PrepareFailure {
                    batch: index,
                    source: Box::new(e),
                }
            })?;

            let affected = executor.execute(&mut statement, params).map_err(|e| {
                warn!(batch = index, stage = "execute", error = %e, "batch failed");
                BulkError::ExecuteFailure {
                    batch: index,
                    source: Box::new(e),
                }
            })?;

            summary.batches += 1;
            summary.rows += batch.row_count();
            summary.affected = summary.affected.saturating_add(affected);
        }

        debug!(
            table = %self.table,
            batches = summary.batches,
            rows = summary.rows,
            affected = summary.affected,
            "bulk insert finished"
        );
        Ok(summary)
    }

    fn check_arity(&self, supplied: usize, row: Option<usize>) -> Result<(), BulkError> {
        let required = self.values_per_row();
        if supplied == required {
            Ok(())
        } else {
            Err(BulkError::ArityMismatch {
                supplied,
                required,
                row,
            })
        }
    }

    fn push_row(&mut self, row: Vec<Value>) {
        self.values.extend(row);
        self.row_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct ScriptedError(&'static str);

    impl fmt::Display for ScriptedError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl std::error::Error for ScriptedError {}

    /// Records every call and fails on request.
    #[derive(Debug, Default)]
    struct ScriptedExecutor {
        fail_prepare_at: Option<usize>,
        fail_execute_at: Option<usize>,
        prepared: Vec<String>,
        executed: Vec<(String, Vec<Value>)>,
    }

    impl Executor for ScriptedExecutor {
        type Statement = String;
        type Error = ScriptedError;

        fn prepare(&mut self, sql: &str) -> Result<String, ScriptedError> {
            if self.fail_prepare_at == Some(self.prepared.len()) {
                return Err(ScriptedError("syntax error"));
            }
            self.prepared.push(sql.to_string());
            Ok(sql.to_string())
        }

        fn execute(&mut self, sql: &mut String, params: &[Value]) -> Result<u64, ScriptedError> {
            if self.fail_execute_at == Some(self.executed.len()) {
                return Err(ScriptedError("constraint violation"));
            }
            self.executed.push((sql.clone(), params.to_vec()));
            Ok(params.len() as u64)
        }
    }

    fn limited(limit: usize, columns: &[&str]) -> BulkInsert {
        let config = BulkConfig::new().with_placeholder_limit(limit);
        BulkInsert::with_config("t", columns.iter().copied(), config).unwrap()
    }

    fn fill(bulk: &mut BulkInsert, rows: i64) {
        let width = bulk.values_per_row() as i64;
        for r in 0..rows {
            bulk.accumulate_row((0..width).map(|c| r * 100 + c)).unwrap();
        }
    }

    #[test]
    fn test_init_derives_prefix_and_group() {
        let bulk = BulkInsert::new("users", ["id", "name"]).unwrap();
        assert_eq!(bulk.table(), "users");
        assert_eq!(bulk.columns(), ["id", "name"]);
        assert_eq!(bulk.values_per_row(), 2);
        assert_eq!(bulk.config().placeholder_limit(), 60_000);
        assert!(bulk.is_empty());
        assert_eq!(bulk.placeholders(), "");
    }

    #[test]
    fn test_init_rejects_no_columns() {
        let err = BulkInsert::new("t", Vec::<String>::new()).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_init_rejects_row_wider_than_limit() {
        let config = BulkConfig::new().with_placeholder_limit(2);
        let err = BulkInsert::with_config("t", ["a", "b", "c"], config).unwrap_err();
        assert!(matches!(err, BulkError::ConfigurationError(_)));
    }

    #[test]
    fn test_accumulate_tracks_rows_values_and_groups() {
        let mut bulk = limited(100, &["a", "b", "c"]);
        fill(&mut bulk, 4);
        assert_eq!(bulk.row_count(), 4);
        assert_eq!(bulk.values().len(), 12);
        assert_eq!(bulk.placeholders().matches("(?,?,?)").count(), 4);
        assert_eq!(bulk.values()[3], Value::Int(100));
    }

    #[test]
    fn test_wrong_arity_leaves_state_untouched() {
        let mut bulk = limited(100, &["a", "b"]);
        fill(&mut bulk, 2);
        let before_values = bulk.values().to_vec();
        let before_placeholders = bulk.placeholders();

        let err = bulk.accumulate_row([1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            BulkError::ArityMismatch {
                supplied: 3,
                required: 2,
                row: None
            }
        ));

        let err = bulk.accumulate_row(Vec::<Value>::new()).unwrap_err();
        assert!(err.is_input_error());

        assert_eq!(bulk.row_count(), 2);
        assert_eq!(bulk.values(), &before_values[..]);
        assert_eq!(bulk.placeholders(), before_placeholders);
    }

    #[test]
    fn test_accumulate_rows_reports_offending_index() {
        let mut bulk = limited(100, &["a", "b"]);
        let rows = vec![vec![1, 2], vec![3, 4], vec![5], vec![7, 8]];
        let err = bulk.accumulate_rows(rows).unwrap_err();
        assert!(matches!(
            err,
            BulkError::ArityMismatch { row: Some(2), .. }
        ));
        // rows before the rejected one are kept
        assert_eq!(bulk.row_count(), 2);
        assert_eq!(bulk.values().len(), 4);
    }

    #[test]
    fn test_accumulate_json() {
        let mut bulk = limited(100, &["id", "name", "score"]);
        let added = bulk
            .accumulate_json(r#"[[1, "a", 1.5], [2, null, false]]"#)
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(
            bulk.values(),
            &[
                Value::Int(1),
                Value::String("a".into()),
                Value::Float(1.5),
                Value::Int(2),
                Value::Null,
                Value::Bool(false),
            ]
        );
    }

    #[test]
    fn test_accumulate_json_is_all_or_nothing() {
        let mut bulk = limited(100, &["a", "b"]);
        fill(&mut bulk, 1);

        for bad in [
            "not json",
            r#"{"a": 1}"#,
            "[1, 2]",
            "[[1, 2], [3, [4]]]",
            r#"[[1, 2], [3, {"x": 1}]]"#,
        ] {
            let err = bulk.accumulate_json(bad).unwrap_err();
            assert!(matches!(err, BulkError::InvalidJson(_)), "{bad}: {err}");
        }

        let err = bulk.accumulate_json("[[1, 2], [3]]").unwrap_err();
        assert!(matches!(
            err,
            BulkError::ArityMismatch {
                supplied: 1,
                required: 2,
                row: Some(1)
            }
        ));

        assert_eq!(bulk.row_count(), 1);
        assert_eq!(bulk.values().len(), 2);
    }

    #[test]
    fn test_accumulate_json_reports_out_of_range_integer() {
        let mut bulk = limited(100, &["a", "b"]);

        let err = bulk
            .accumulate_json("[[1, 2], [3, 18446744073709551615]]")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid JSON rows: row 1 contains an integer outside the i64 range"
        );

        let err = bulk.accumulate_json("[[1, [2]]]").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid JSON rows: row 0 contains a non-scalar value"
        );

        // i64::MAX itself still fits
        bulk.accumulate_json("[[9223372036854775807, 0]]").unwrap();
        assert_eq!(bulk.values()[0], Value::Int(i64::MAX));
        assert_eq!(bulk.row_count(), 1);
    }

    #[test]
    fn test_single_row_statement() {
        let mut bulk = BulkInsert::new("t", ["id"]).unwrap();
        bulk.accumulate_row([7]).unwrap();

        let mut exec = ScriptedExecutor::default();
        let summary = bulk.insert(&mut exec, false).unwrap();

        assert_eq!(summary.batches, 1);
        assert_eq!(summary.rows, 1);
        assert_eq!(
            exec.executed,
            vec![("INSERT INTO t(id) VALUES (?)".to_string(), vec![Value::Int(7)])]
        );
    }

    #[test]
    fn test_split_into_two_batches() {
        let mut bulk = limited(5, &["x", "y"]);
        fill(&mut bulk, 4);

        let mut exec = ScriptedExecutor::default();
        let summary = bulk.insert(&mut exec, false).unwrap();

        assert_eq!(summary.batches, 2);
        assert_eq!(summary.rows, 4);
        assert_eq!(summary.affected, 8);
        assert_eq!(exec.executed.len(), 2);
        assert_eq!(exec.executed[0].0, "INSERT INTO t(x, y) VALUES (?,?),(?,?)");
        assert_eq!(
            exec.executed[0].1,
            [0, 1, 100, 101].map(Value::Int).to_vec()
        );
        assert_eq!(
            exec.executed[1].1,
            [200, 201, 300, 301].map(Value::Int).to_vec()
        );
    }

    #[test]
    fn test_upsert_statement_snapshot() {
        let mut bulk = limited(100, &["a", "b"]);
        fill(&mut bulk, 2);
        let statements = bulk.statements(true).unwrap();
        let sql = &statements[0].sql;
        insta::assert_snapshot!(
            sql,
            @"INSERT INTO t(a, b) VALUES (?,?),(?,?) ON DUPLICATE KEY UPDATE a=VALUES(a),b=VALUES(b)"
        );
    }

    #[test]
    fn test_upsert_clause_on_every_batch() {
        let mut bulk = limited(4, &["a", "b"]);
        fill(&mut bulk, 5);
        let statements = bulk.statements(true).unwrap();
        assert_eq!(statements.len(), 3);
        for stmt in &statements {
            assert!(
                stmt.sql
                    .ends_with(" ON DUPLICATE KEY UPDATE a=VALUES(a),b=VALUES(b)")
            );
        }
    }

    #[test]
    fn test_prepare_failure_stops_remaining_batches() {
        let mut bulk = limited(2, &["v"]);
        fill(&mut bulk, 6); // three batches of two rows

        let mut exec = ScriptedExecutor {
            fail_prepare_at: Some(1),
            ..ScriptedExecutor::default()
        };
        let err = bulk.insert(&mut exec, false).unwrap_err();

        assert!(matches!(err, BulkError::PrepareFailure { batch: 1, .. }));
        assert_eq!(err.failed_batch(), Some(1));
        // batch 0 ran, batch 2 was never attempted
        assert_eq!(exec.executed.len(), 1);
        assert_eq!(exec.prepared.len(), 1);
    }

    #[test]
    fn test_execute_failure_stops_remaining_batches() {
        let mut bulk = limited(2, &["v"]);
        fill(&mut bulk, 6);

        let mut exec = ScriptedExecutor {
            fail_execute_at: Some(0),
            ..ScriptedExecutor::default()
        };
        let err = bulk.insert(&mut exec, false).unwrap_err();

        assert!(matches!(err, BulkError::ExecuteFailure { batch: 0, .. }));
        assert_eq!(err.to_string(), "failed to execute batch 0: constraint violation");
        assert_eq!(exec.prepared.len(), 1);
        assert!(exec.executed.is_empty());
    }

    #[test]
    fn test_empty_insert_touches_nothing() {
        let bulk = limited(10, &["a"]);
        let mut exec = ScriptedExecutor::default();
        let summary = bulk.insert(&mut exec, true).unwrap();
        assert_eq!(summary, InsertSummary::default());
        assert!(exec.prepared.is_empty());
    }

    #[test]
    fn test_statement_placeholders_match_params() {
        let mut bulk = limited(7, &["a", "b", "c"]);
        fill(&mut bulk, 11);
        let statements = bulk.statements(false).unwrap();
        let mut total = 0;
        for stmt in &statements {
            assert_eq!(stmt.sql.matches('?').count(), stmt.params.len());
            assert!(stmt.params.len() <= 7);
            total += stmt.params.len();
        }
        assert_eq!(total, 33);
    }
}

//! The database collaborator that prepares and runs batch statements.
//!
//! The builder only needs two operations from a driver: compile SQL text with
//! positional `?` placeholders, and run a compiled statement with values bound
//! in order. Connection handling, pooling, and transactions stay with the
//! implementor.
//!
//! # Example
//!
//! ```
//! use sql_bulk::{Executor, Value};
//!
//! /// Collects statements instead of running them.
//! #[derive(Default)]
//! struct Recorder {
//!     executed: Vec<(String, usize)>,
//! }
//!
//! impl Executor for Recorder {
//!     type Statement = String;
//!     type Error = std::io::Error;
//!
//!     fn prepare(&mut self, sql: &str) -> Result<String, Self::Error> {
//!         Ok(sql.to_string())
//!     }
//!
//!     fn execute(&mut self, sql: &mut String, params: &[Value]) -> Result<u64, Self::Error> {
//!         self.executed.push((sql.clone(), params.len()));
//!         Ok(1)
//!     }
//! }
//! ```

use crate::value::Value;

/// A driver able to prepare and execute parameterized statements.
pub trait Executor {
    /// Compiled statement handle.
    type Statement;

    /// Driver error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Compile `sql` into an executable statement.
    fn prepare(&mut self, sql: &str) -> Result<Self::Statement, Self::Error>;

    /// Bind `params` positionally and run the statement.
    ///
    /// Returns the number of rows the driver reports as affected.
    fn execute(
        &mut self,
        statement: &mut Self::Statement,
        params: &[Value],
    ) -> Result<u64, Self::Error>;
}

impl<E: Executor + ?Sized> Executor for &mut E {
    type Statement = E::Statement;
    type Error = E::Error;

    #[inline]
    fn prepare(&mut self, sql: &str) -> Result<Self::Statement, Self::Error> {
        (**self).prepare(sql)
    }

    #[inline]
    fn execute(
        &mut self,
        statement: &mut Self::Statement,
        params: &[Value],
    ) -> Result<u64, Self::Error> {
        (**self).execute(statement, params)
    }
}

#[cfg(feature = "rusqlite")]
impl<'conn> Executor for &'conn rusqlite::Connection {
    type Statement = rusqlite::Statement<'conn>;
    type Error = rusqlite::Error;

    fn prepare(&mut self, sql: &str) -> Result<Self::Statement, Self::Error> {
        let conn: &'conn rusqlite::Connection = *self;
        conn.prepare(sql)
    }

    fn execute(
        &mut self,
        statement: &mut Self::Statement,
        params: &[Value],
    ) -> Result<u64, Self::Error> {
        let changed = statement.execute(rusqlite::params_from_iter(params.iter()))?;
        Ok(u64::try_from(changed).unwrap_or(u64::MAX))
    }
}

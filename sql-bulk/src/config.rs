//! Builder configuration.
//!
//! The only knob is the placeholder limit: the maximum number of bound
//! parameters a single prepared statement may carry. Drivers and servers
//! impose different ceilings, so the limit travels with the builder instead of
//! being compiled in.
//!
//! ```
//! use sql_bulk::BulkConfig;
//!
//! let config = BulkConfig::default();
//! assert_eq!(config.placeholder_limit(), 60_000);
//!
//! let config = BulkConfig::sqlite();
//! assert_eq!(config.placeholder_limit(), 32_766);
//!
//! let env = vec![("SQL_BULK_PLACEHOLDER_LIMIT".to_string(), "1000".to_string())];
//! let config = BulkConfig::from_env(&env).unwrap();
//! assert_eq!(config.placeholder_limit(), 1000);
//! ```

use std::env::VarError;

use crate::error::BulkError;

/// Default placeholder limit per statement.
pub const DEFAULT_PLACEHOLDER_LIMIT: usize = 60_000;

/// Maximum parameter count for MySQL prepared statements.
pub const MYSQL_MAX_PARAMS: usize = 65_535;

/// Maximum parameter count for PostgreSQL.
pub const POSTGRES_MAX_PARAMS: usize = 65_535;

/// Maximum parameter count for SQLite (SQLITE_MAX_VARIABLE_NUMBER default).
pub const SQLITE_MAX_PARAMS: usize = 32_766;

/// Environment variable overriding the placeholder limit.
pub const PLACEHOLDER_LIMIT_ENV: &str = "SQL_BULK_PLACEHOLDER_LIMIT";

/// Configuration for a [`BulkInsert`](crate::BulkInsert).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct BulkConfig {
    placeholder_limit: usize,
}

impl BulkConfig {
    /// Create a config with the default placeholder limit.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            placeholder_limit: DEFAULT_PLACEHOLDER_LIMIT,
        }
    }

    /// Limit matching MySQL's prepared statement ceiling.
    #[must_use]
    pub const fn mysql() -> Self {
        Self::new().with_placeholder_limit(MYSQL_MAX_PARAMS)
    }

    /// Limit matching PostgreSQL's bind parameter ceiling.
    #[must_use]
    pub const fn postgres() -> Self {
        Self::new().with_placeholder_limit(POSTGRES_MAX_PARAMS)
    }

    /// Limit matching SQLite's default variable ceiling.
    #[must_use]
    pub const fn sqlite() -> Self {
        Self::new().with_placeholder_limit(SQLITE_MAX_PARAMS)
    }

    /// Override the placeholder limit.
    ///
    /// A limit of zero is accepted here and rejected when a builder is
    /// created with it.
    #[must_use]
    pub const fn with_placeholder_limit(mut self, limit: usize) -> Self {
        self.placeholder_limit = limit;
        self
    }

    /// Maximum number of parameters per statement.
    #[inline]
    #[must_use]
    pub const fn placeholder_limit(&self) -> usize {
        self.placeholder_limit
    }

    /// Build a config from environment pairs.
    ///
    /// Reads [`PLACEHOLDER_LIMIT_ENV`]; when unset the default limit is used.
    pub fn from_env(env: &[(String, String)]) -> Result<Self, BulkError> {
        env.iter()
            .find(|(k, _)| k == PLACEHOLDER_LIMIT_ENV)
            .map_or_else(|| Ok(Self::new()), |(_, raw)| Self::parse_limit(raw))
    }

    /// Build a config from the current process environment.
    ///
    /// Only [`PLACEHOLDER_LIMIT_ENV`] is read. A value that is not valid
    /// unicode is reported as `InvalidConfig`.
    pub fn from_process_env() -> Result<Self, BulkError> {
        Self::from_var(std::env::var(PLACEHOLDER_LIMIT_ENV))
    }

    fn from_var(var: Result<String, VarError>) -> Result<Self, BulkError> {
        match var {
            Ok(raw) => Self::parse_limit(&raw),
            Err(VarError::NotPresent) => Ok(Self::new()),
            Err(VarError::NotUnicode(raw)) => Err(BulkError::InvalidConfig {
                key: PLACEHOLDER_LIMIT_ENV,
                value: raw.to_string_lossy().into_owned(),
            }),
        }
    }

    fn parse_limit(raw: &str) -> Result<Self, BulkError> {
        match raw.trim().parse::<usize>() {
            Ok(limit) if limit > 0 => Ok(Self::new().with_placeholder_limit(limit)),
            _ => Err(BulkError::InvalidConfig {
                key: PLACEHOLDER_LIMIT_ENV,
                value: raw.to_string(),
            }),
        }
    }
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self::new()
    }
}

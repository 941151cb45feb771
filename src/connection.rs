//! DuckDB connection wrapper with bounded acquisition and commit timestamps.
//!
//! A single DuckDB connection is shared behind a mutex. Every call waits at
//! most `busy_timeout` for it; a caller that cannot get the connection in time
//! receives [`StackTrackError::StoreBusy`], which is retryable.
//!
//! Writes go through [`Connection::commit`], which opens a transaction and
//! hands the closure a store-assigned commit timestamp. Timestamps are
//! microseconds since the Unix epoch and strictly increase for the lifetime
//! of the connection, so rows created later always sort later.

use crate::error::{Result, StackTrackError};
use chrono::Utc;
use duckdb::{types::ValueRef, Connection as DuckDbConnection, ToSql};
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// A result row keyed by column name.
pub type Row = HashMap<String, serde_json::Value>;

struct Session {
    db: DuckDbConnection,
    last_commit_us: i64,
}

/// Wraps a DuckDB connection shared by all store wrappers.
pub struct Connection {
    session: Mutex<Session>,
    busy_timeout: Duration,
}

impl Connection {
    /// Open an in-memory database. Data lives as long as the connection.
    pub fn open_in_memory(busy_timeout: Duration) -> Result<Self> {
        let db = DuckDbConnection::open_in_memory()?;
        Ok(Self::from_duckdb(db, busy_timeout))
    }

    /// Open (or create) a database file, creating parent directories as needed.
    pub fn open<P: AsRef<Path>>(path: P, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let db = DuckDbConnection::open(path)?;
        tracing::info!(path = %path.display(), "opened store database");
        Ok(Self::from_duckdb(db, busy_timeout))
    }

    fn from_duckdb(db: DuckDbConnection, busy_timeout: Duration) -> Self {
        Self {
            session: Mutex::new(Session {
                db,
                last_commit_us: 0,
            }),
            busy_timeout,
        }
    }

    /// How long a call waits for the shared connection.
    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }

    fn session(&self) -> Result<MutexGuard<'_, Session>> {
        self.session
            .try_lock_for(self.busy_timeout)
            .ok_or(StackTrackError::StoreBusy(self.busy_timeout))
    }

    /// Execute SQL and return results as a `Vec` of `HashMap`s.
    ///
    /// Parameters bind to `?` placeholders in order, as produced by
    /// [`SqlBuilder::build`](crate::SqlBuilder::build).
    pub fn execute(&self, sql: &str, params: &[String]) -> Result<Vec<Row>> {
        let param_values: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();
        let session = self.session()?;
        query_rows(&session.db, sql, &param_values)
    }

    /// Execute SQL and return the first column of the first row.
    ///
    /// Returns `None` if the result set is empty.
    pub fn execute_scalar(&self, sql: &str, params: &[String]) -> Result<Option<serde_json::Value>> {
        let param_values: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();
        let session = self.session()?;
        let mut stmt = session.db.prepare(sql)?;
        let mut rows = stmt.query(param_values.as_slice())?;

        if let Some(row) = rows.next()? {
            Ok(Some(convert_value_ref(row.get_ref(0)?)))
        } else {
            Ok(None)
        }
    }

    /// Run one or more statements without parameters (DDL, maintenance).
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let session = self.session()?;
        session.db.execute_batch(sql)?;
        Ok(())
    }

    /// Run `op` inside a transaction with a fresh commit timestamp.
    ///
    /// The transaction commits only if `op` succeeds; the timestamp is
    /// recorded as used only after the commit.
    pub fn commit<T>(&self, op: impl FnOnce(&Writer<'_>) -> Result<T>) -> Result<T> {
        let mut guard = self.session()?;
        let session = &mut *guard;

        let commit_us = Utc::now().timestamp_micros().max(session.last_commit_us + 1);
        let tx = session.db.transaction()?;
        let out = op(&Writer {
            db: &tx,
            commit_us,
        })?;
        tx.commit()?;

        session.last_commit_us = commit_us;
        Ok(out)
    }

    /// Never hand out a commit timestamp at or below `us`.
    ///
    /// Used after opening an existing database so new rows sort after the
    /// ones already persisted, even if the wall clock went backwards.
    pub fn observe_commit_time(&self, us: i64) -> Result<()> {
        let mut session = self.session()?;
        session.last_commit_us = session.last_commit_us.max(us);
        Ok(())
    }
}

/// Handle given to [`Connection::commit`] closures.
pub struct Writer<'a> {
    db: &'a DuckDbConnection,
    commit_us: i64,
}

impl Writer<'_> {
    /// Store-assigned timestamp of this commit, in microseconds since the epoch.
    pub fn commit_us(&self) -> i64 {
        self.commit_us
    }

    /// Execute a statement and return the number of affected rows.
    pub fn execute(&self, sql: &str, params: &[&dyn ToSql]) -> Result<usize> {
        Ok(self.db.execute(sql, params)?)
    }

    /// Query inside the transaction; sees this transaction's own writes.
    pub fn query(&self, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>> {
        query_rows(self.db, sql, params)
    }
}

fn query_rows(db: &DuckDbConnection, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>> {
    let mut stmt = db.prepare(sql)?;
    let mut rows_result = stmt.query(params)?;

    // Column metadata is only available after the query has executed
    let (column_names, column_count) = match rows_result.as_ref() {
        Some(s) => (s.column_names(), s.column_count()),
        None => return Ok(Vec::new()),
    };

    let mut out: Vec<Row> = Vec::new();
    while let Some(row) = rows_result.next()? {
        let mut map = HashMap::with_capacity(column_count);
        for (i, col_name) in column_names.iter().enumerate().take(column_count) {
            map.insert(col_name.to_string(), convert_value_ref(row.get_ref(i)?));
        }
        out.push(map);
    }

    Ok(out)
}

/// Convert a DuckDB `ValueRef` to a `serde_json::Value`.
fn convert_value_ref(val: ValueRef<'_>) -> serde_json::Value {
    match val {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::SmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::Int(n) => serde_json::Value::Number(n.into()),
        ValueRef::BigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::HugeInt(n) => {
            // HugeInt may not fit in i64; fall back to string
            if let Ok(i) = i64::try_from(n) {
                serde_json::Value::Number(i.into())
            } else {
                serde_json::Value::String(n.to_string())
            }
        }
        ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) => serde_json::Value::String(String::from_utf8_lossy(bytes).to_string()),
        // Timestamps are stored as BIGINT microseconds, so no temporal types are read
        _ => serde_json::Value::Null,
    }
}

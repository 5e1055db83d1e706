///
/// SQLite driver state.
///
/// Uses three handle registries:
/// - connections: open `rusqlite::Connection`s
/// - statements: SQL text plus bound parameters, validated at prepare time
/// - result sets: rows buffered at execution time, fetched in chunks
///
/// Statements and result sets remember the raw handle of the connection they
/// came from; closing a connection frees them first. Query rows are buffered
/// eagerly so no result set borrows from its connection.
///

use hostdbi_core::materialize::{self, Field, Schema};
use hostdbi_core::strings::copy_string;
use hostdbi_core::{DbiConfig, DbiError, ElementType, Registry, Table};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use tracing::{debug, info, warn};

use crate::convert::{infer_element_type, write_cell};

fn driver_error(e: rusqlite::Error) -> DbiError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _) => {
            DbiError::Driver(format!("{} (code {})", e, err.extended_code))
        }
        _ => DbiError::Driver(e.to_string()),
    }
}

/// A value bound to a statement placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Param {
    fn to_value(&self) -> SqlValue {
        match self {
            Param::Null => SqlValue::Null,
            Param::Int(i) => SqlValue::Integer(*i),
            Param::Float(f) => SqlValue::Real(*f),
            Param::Text(s) => SqlValue::Text(s.clone()),
        }
    }
}

struct ConnEntry {
    conn: Connection,
    path: String,
}

struct StmtEntry {
    conn: i64,
    sql: String,
    params: Vec<Param>,
}

struct ResultSet {
    conn: i64,
    statement: String,
    fields: Vec<Field>,
    rows: Vec<Vec<SqlValue>>,
    cursor: usize,
    rows_affected: i64,
}

/// Snapshot of a result set's progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultInfo {
    pub statement: String,
    /// Rows handed out by `fetch` so far.
    pub row_count: usize,
    /// Rows changed by a statement that returns no columns.
    pub rows_affected: i64,
    pub fields: Vec<Field>,
    pub completed: bool,
}

/// Description of one open connection.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionInfo {
    pub handle: i64,
    pub path: String,
    pub result_sets: usize,
    pub statements: usize,
}

pub struct Driver {
    config: DbiConfig,
    connections: Registry<ConnEntry>,
    statements: Registry<StmtEntry>,
    results: Registry<ResultSet>,
}

impl Driver {
    pub fn new(config: DbiConfig) -> Self {
        let limits = &config.limits;
        let connections = Registry::new("connection", limits.max_connections);
        let statements = Registry::new("statement", limits.max_statements);
        let results = Registry::new("result set", limits.max_result_sets);
        Self {
            config,
            connections,
            statements,
            results,
        }
    }

    pub fn config(&self) -> &DbiConfig {
        &self.config
    }

    pub fn connect(&mut self, path: &str) -> Result<i64, DbiError> {
        self.ensure_connection_slot()?;
        let conn = Connection::open(path).map_err(driver_error)?;
        self.register_connection(conn, path)
    }

    pub fn connect_in_memory(&mut self) -> Result<i64, DbiError> {
        self.ensure_connection_slot()?;
        let conn = Connection::open_in_memory().map_err(driver_error)?;
        self.register_connection(conn, ":memory:")
    }

    fn ensure_connection_slot(&self) -> Result<(), DbiError> {
        if self.connections.is_full() {
            return Err(DbiError::Full {
                class: self.connections.class(),
                capacity: self.connections.capacity(),
            });
        }
        Ok(())
    }

    fn register_connection(&mut self, conn: Connection, path: &str) -> Result<i64, DbiError> {
        let handle = self.connections.allocate(ConnEntry {
            conn,
            path: path.to_string(),
        })?;
        info!(handle = handle.raw(), path, "opened sqlite connection");
        Ok(handle.raw())
    }

    fn connection(&self, conn: i64) -> Result<&Connection, DbiError> {
        let handle = self.connections.resolve(conn)?;
        Ok(&self.connections.get(&handle)?.conn)
    }

    /// Close a connection after freeing every statement and result set
    /// created on it.
    pub fn disconnect(&mut self, conn: i64) -> Result<(), DbiError> {
        let handle = self.connections.resolve(conn)?;

        let results: Vec<i64> = self
            .results
            .iter()
            .filter(|(_, rs)| rs.conn == conn)
            .map(|(h, _)| h)
            .collect();
        for raw in results {
            let rs = self.results.resolve(raw)?;
            self.results.free(rs)?;
            debug!(conn, result_set = raw, "freed result set with its connection");
        }

        let statements: Vec<i64> = self
            .statements
            .iter()
            .filter(|(_, st)| st.conn == conn)
            .map(|(h, _)| h)
            .collect();
        for raw in statements {
            let st = self.statements.resolve(raw)?;
            self.statements.free(st)?;
            debug!(conn, statement = raw, "freed statement with its connection");
        }

        let entry = self.connections.free(handle)?;
        entry.conn.close().map_err(|(_, e)| driver_error(e))?;
        info!(handle = conn, path = %entry.path, "closed sqlite connection");
        Ok(())
    }

    /// Run one or more statements that return no rows. Returns rows changed
    /// by the last of them.
    pub fn exec(&mut self, conn: i64, sql: &str) -> Result<i64, DbiError> {
        let conn = self.connection(conn)?;
        conn.execute_batch(sql).map_err(driver_error)?;
        Ok(conn.changes() as i64)
    }

    pub fn begin(&mut self, conn: i64) -> Result<(), DbiError> {
        self.exec(conn, "BEGIN").map(|_| ())
    }

    pub fn commit(&mut self, conn: i64) -> Result<(), DbiError> {
        self.exec(conn, "COMMIT").map(|_| ())
    }

    pub fn rollback(&mut self, conn: i64) -> Result<(), DbiError> {
        self.exec(conn, "ROLLBACK").map(|_| ())
    }

    pub fn changes(&self, conn: i64) -> Result<i64, DbiError> {
        Ok(self.connection(conn)?.changes() as i64)
    }

    pub fn last_insert_id(&self, conn: i64) -> Result<i64, DbiError> {
        Ok(self.connection(conn)?.last_insert_rowid())
    }

    /// Check `sql` against the connection and keep it as a statement.
    pub fn prepare(&mut self, conn: i64, sql: &str) -> Result<i64, DbiError> {
        self.connection(conn)?.prepare(sql).map_err(driver_error)?;
        let handle = self.statements.allocate(StmtEntry {
            conn,
            sql: sql.to_string(),
            params: Vec::new(),
        })?;
        Ok(handle.raw())
    }

    /// Replace the statement's bound parameters.
    pub fn bind(&mut self, stmt: i64, params: Vec<Param>) -> Result<(), DbiError> {
        let handle = self.statements.resolve(stmt)?;
        self.statements.get_mut(&handle)?.params = params;
        Ok(())
    }

    pub fn finalize(&mut self, stmt: i64) -> Result<(), DbiError> {
        let handle = self.statements.resolve(stmt)?;
        self.statements.free(handle)?;
        Ok(())
    }

    /// Run a prepared statement with its bound parameters.
    pub fn execute(&mut self, stmt: i64) -> Result<i64, DbiError> {
        let handle = self.statements.resolve(stmt)?;
        let entry = self.statements.get(&handle)?;
        let (conn, sql, params) = (entry.conn, entry.sql.clone(), entry.params.clone());
        self.run_query(conn, &sql, &params)
    }

    pub fn send_query(&mut self, conn: i64, sql: &str) -> Result<i64, DbiError> {
        self.run_query(conn, sql, &[])
    }

    fn run_query(&mut self, conn: i64, sql: &str, params: &[Param]) -> Result<i64, DbiError> {
        if self.results.is_full() {
            return Err(DbiError::Full {
                class: self.results.class(),
                capacity: self.results.capacity(),
            });
        }

        let connection = self.connection(conn)?;
        let mut stmt = connection.prepare(sql).map_err(driver_error)?;
        let col_count = stmt.column_count();
        let names: Vec<String> = (0..col_count)
            .map(|i| copy_string(stmt.column_name(i).unwrap_or("")))
            .collect();

        let mut rows = Vec::new();
        let mut cursor = stmt
            .query(params_from_iter(params.iter().map(Param::to_value)))
            .map_err(driver_error)?;
        while let Some(row) = cursor.next().map_err(driver_error)? {
            let mut values = Vec::with_capacity(col_count);
            for i in 0..col_count {
                values.push(row.get::<_, SqlValue>(i).map_err(driver_error)?);
            }
            rows.push(values);
        }
        drop(cursor);
        drop(stmt);
        let rows_affected = if col_count == 0 {
            connection.changes() as i64
        } else {
            0
        };

        let fields = names
            .into_iter()
            .enumerate()
            .map(|(j, name)| {
                let ty = infer_element_type(rows.iter().map(|r| &r[j]));
                Field::new(name, ty, rows.len())
            })
            .collect();

        let handle = self.results.allocate(ResultSet {
            conn,
            statement: sql.to_string(),
            fields,
            rows,
            cursor: 0,
            rows_affected,
        })?;
        debug!(conn, result_set = handle.raw(), "buffered query result");
        Ok(handle.raw())
    }

    /// Materialize up to `n` of the remaining rows as a framed table.
    /// A negative `n` fetches everything that is left.
    pub fn fetch(&mut self, res: i64, n: i64) -> Result<Table, DbiError> {
        let trim = self.config.fetch.trim_trailing_blanks;
        let batch = self.config.fetch.default_batch.max(1);
        let handle = self.results.resolve(res)?;
        let rs = self.results.get_mut(&handle)?;

        let remaining = rs.rows.len() - rs.cursor;
        let (mut capacity, limit) = if n < 0 {
            (batch.min(remaining.max(1)), remaining)
        } else {
            let wanted = usize::try_from(n).unwrap_or(usize::MAX).min(remaining);
            (wanted, wanted)
        };

        let schema = Schema::new(rs.fields.clone());
        let mut table = materialize::allocate(&schema, capacity)?;
        let mut cursor = rs.cursor;
        let mut written = 0;
        while written < limit {
            if written == capacity {
                capacity = capacity.saturating_mul(2).max(1);
                materialize::resize(&mut table, capacity)?;
            }
            for (j, value) in rs.rows[cursor].iter().enumerate() {
                if let Some(column) = table.column_at_mut(j) {
                    write_cell(column, written, value, trim);
                }
            }
            cursor += 1;
            written += 1;
        }
        if written != capacity {
            materialize::resize(&mut table, written)?;
        }
        materialize::frame(&mut table);

        rs.cursor = cursor;
        debug!(result_set = res, rows = written, "fetched rows");
        Ok(table)
    }

    pub fn result_info(&self, res: i64) -> Result<ResultInfo, DbiError> {
        let handle = self.results.resolve(res)?;
        let rs = self.results.get(&handle)?;
        Ok(ResultInfo {
            statement: rs.statement.clone(),
            row_count: rs.cursor,
            rows_affected: rs.rows_affected,
            fields: rs.fields.clone(),
            completed: rs.cursor == rs.rows.len(),
        })
    }

    pub fn clear_result(&mut self, res: i64) -> Result<(), DbiError> {
        let handle = self.results.resolve(res)?;
        self.results.free(handle)?;
        Ok(())
    }

    pub fn list_connections(&self) -> Vec<i64> {
        self.connections.active_handles()
    }

    pub fn connection_info(&self, conn: i64) -> Result<ConnectionInfo, DbiError> {
        let handle = self.connections.resolve(conn)?;
        let entry = self.connections.get(&handle)?;
        Ok(ConnectionInfo {
            handle: conn,
            path: entry.path.clone(),
            result_sets: self.results.iter().filter(|(_, rs)| rs.conn == conn).count(),
            statements: self.statements.iter().filter(|(_, st)| st.conn == conn).count(),
        })
    }

    /// Result sets still open on `conn`, in handle order.
    pub fn list_results(&self, conn: i64) -> Result<Vec<i64>, DbiError> {
        self.connections.resolve(conn)?;
        Ok(self
            .results
            .iter()
            .filter(|(_, rs)| rs.conn == conn)
            .map(|(h, _)| h)
            .collect())
    }

    /// Free every result set and statement and close every connection.
    /// Returns the number of connections closed.
    pub fn close_all(&mut self) -> usize {
        let results = self.results.drain().len();
        let statements = self.statements.drain().len();
        let connections = self.connections.drain();
        let closed = connections.len();
        for entry in connections {
            if let Err((_, e)) = entry.conn.close() {
                warn!(path = %entry.path, error = %e, "sqlite connection did not close cleanly");
            }
        }
        info!(connections = closed, statements, results, "closed all driver resources");
        closed
    }

    /// Run `sql`, fetch every row and release the result set.
    pub fn get_query(&mut self, conn: i64, sql: &str) -> Result<Table, DbiError> {
        let res = self.send_query(conn, sql)?;
        let fetched = self.fetch(res, -1);
        self.clear_result(res)?;
        fetched
    }

    /// Quote-double each value for use inside an SQL string literal.
    pub fn escape_strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.replace('\'', "''")).collect()
    }

    /// The SQLite library linked into the driver.
    pub fn library_versions() -> Vec<(String, i64)> {
        vec![(
            format!("SQLite {}", rusqlite::version()),
            i64::from(rusqlite::version_number()),
        )]
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new(DbiConfig::default())
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        if !self.connections.is_empty() {
            self.close_all();
        }
    }
}

/// Element type of each field, in field order.
pub fn field_types(fields: &[Field]) -> Vec<ElementType> {
    fields.iter().map(|f| f.element_type).collect()
}

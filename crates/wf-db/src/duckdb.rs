//! DuckDB warehouse backend implementation

use crate::entry::WarehouseEntry;
use crate::error::{DbError, DbResult};
use crate::sql::quote_ident;
use crate::traits::Warehouse;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use duckdb::{params, params_from_iter, Connection, OptionalExt};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use wf_core::{table_checksum, Table, Value};

/// Catalog table holding per-materialization metadata.
const CATALOG_TABLE: &str = "_weft_catalog";

/// DuckDB warehouse backend
pub struct DuckDbWarehouse {
    conn: Mutex<Connection>,
}

impl DuckDbWarehouse {
    /// Create a new in-memory DuckDB warehouse
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Self::with_connection(conn)
    }

    /// Create a new DuckDB warehouse from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path).map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Self::with_connection(conn)
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn with_connection(conn: Connection) -> DbResult<Self> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                table_name VARCHAR PRIMARY KEY,
                row_count BIGINT,
                schema_json VARCHAR,
                content_hash VARCHAR,
                created_at VARCHAR,
                updated_at VARCHAR
            )",
            CATALOG_TABLE
        ))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn columns_sync(conn: &Connection, name: &str) -> DbResult<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT column_name FROM information_schema.columns
             WHERE table_schema = 'main' AND table_name = ?
             ORDER BY ordinal_position",
        )?;
        let mut rows = stmt.query(params![name])?;
        let mut columns = Vec::new();
        while let Some(row) = rows.next()? {
            columns.push(row.get::<_, String>(0)?);
        }
        if columns.is_empty() {
            return Err(DbError::TableNotFound(name.to_string()));
        }
        Ok(columns)
    }

    fn exists_sync(conn: &Connection, name: &str) -> DbResult<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables
             WHERE table_schema = 'main' AND table_name = ?",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn entry_sync(conn: &Connection, name: &str) -> DbResult<Option<WarehouseEntry>> {
        let row: Option<(i64, String, String, String, String)> = conn
            .query_row(
                &format!(
                    "SELECT row_count, schema_json, content_hash, created_at, updated_at
                     FROM {} WHERE table_name = ?",
                    CATALOG_TABLE
                ),
                params![name],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((row_count, schema_json, content_hash, created_at, updated_at)) = row else {
            return Ok(None);
        };

        let schema: BTreeMap<String, String> =
            serde_json::from_str(&schema_json).map_err(|e| DbError::CatalogError {
                table: name.to_string(),
                message: format!("unreadable schema snapshot: {}", e),
            })?;
        let parse_ts = |raw: &str| -> DbResult<DateTime<Utc>> {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| DbError::CatalogError {
                    table: name.to_string(),
                    message: format!("bad timestamp '{}': {}", raw, e),
                })
        };

        Ok(Some(WarehouseEntry {
            table_name: name.to_string(),
            row_count: row_count.max(0) as usize,
            schema,
            content_hash,
            created_at: parse_ts(&created_at)?,
            updated_at: parse_ts(&updated_at)?,
        }))
    }

    fn to_duck(value: &Value) -> duckdb::types::Value {
        match value {
            Value::Null => duckdb::types::Value::Null,
            Value::Bool(b) => duckdb::types::Value::Boolean(*b),
            Value::Int(i) => duckdb::types::Value::BigInt(*i),
            Value::Float(f) => duckdb::types::Value::Double(*f),
            Value::Text(s) => duckdb::types::Value::Text(s.clone()),
        }
    }

    fn from_duck(value: duckdb::types::Value) -> Value {
        match value {
            duckdb::types::Value::Null => Value::Null,
            duckdb::types::Value::Boolean(b) => Value::Bool(b),
            duckdb::types::Value::TinyInt(i) => Value::Int(i as i64),
            duckdb::types::Value::SmallInt(i) => Value::Int(i as i64),
            duckdb::types::Value::Int(i) => Value::Int(i as i64),
            duckdb::types::Value::BigInt(i) => Value::Int(i),
            duckdb::types::Value::Float(f) => Value::Float(f as f64),
            duckdb::types::Value::Double(f) => Value::Float(f),
            duckdb::types::Value::Text(s) => Value::Text(s),
            other => Value::Text(format!("{:?}", other)),
        }
    }
}

#[async_trait]
impl Warehouse for DuckDbWarehouse {
    async fn store_table(&self, name: &str, table: &Table) -> DbResult<WarehouseEntry> {
        if table.columns().is_empty() {
            return Err(DbError::ExecutionError(format!(
                "cannot materialize '{}': table has no columns",
                name
            )));
        }

        let schema = table.infer_schema();
        let schema_strings: BTreeMap<String, String> = schema
            .iter()
            .map(|(col, ty)| (col.clone(), ty.sql_type().to_string()))
            .collect();
        let schema_json = serde_json::to_string(&schema_strings).map_err(|e| {
            DbError::CatalogError {
                table: name.to_string(),
                message: e.to_string(),
            }
        })?;
        let content_hash = table_checksum(table);
        let now = Utc::now();

        let mut conn = self.lock()?;

        // Preserve the original creation timestamp across replaces.
        let created_at = Self::entry_sync(&conn, name)?
            .map(|e| e.created_at)
            .unwrap_or(now);

        let qname = quote_ident(name);
        let tx = conn.transaction()?;
        {
            tx.execute(&format!("DROP TABLE IF EXISTS {}", qname), [])?;

            let defs: Vec<String> = table
                .columns()
                .iter()
                .map(|col| format!("{} {}", quote_ident(col), schema[col].sql_type()))
                .collect();
            tx.execute(
                &format!("CREATE TABLE {} ({})", qname, defs.join(", ")),
                [],
            )?;

            let placeholders = vec!["?"; table.columns().len()].join(", ");
            let mut stmt =
                tx.prepare(&format!("INSERT INTO {} VALUES ({})", qname, placeholders))?;
            for row in table.rows() {
                stmt.execute(params_from_iter(row.iter().map(Self::to_duck)))?;
            }

            tx.execute(
                &format!("DELETE FROM {} WHERE table_name = ?", CATALOG_TABLE),
                params![name],
            )?;
            tx.execute(
                &format!(
                    "INSERT INTO {} VALUES (?, ?, ?, ?, ?, ?)",
                    CATALOG_TABLE
                ),
                params![
                    name,
                    table.row_count() as i64,
                    schema_json,
                    content_hash,
                    created_at.to_rfc3339(),
                    now.to_rfc3339(),
                ],
            )?;
        }
        tx.commit()?;

        log::debug!(
            "materialized {} rows into '{}' ({} columns)",
            table.row_count(),
            name,
            table.columns().len()
        );

        Ok(WarehouseEntry {
            table_name: name.to_string(),
            row_count: table.row_count(),
            schema: schema_strings,
            content_hash,
            created_at,
            updated_at: now,
        })
    }

    async fn fetch_table(&self, name: &str) -> DbResult<Table> {
        let conn = self.lock()?;
        let columns = Self::columns_sync(&conn, name)?;
        let width = columns.len();

        let mut stmt = conn.prepare(&format!("SELECT * FROM {}", quote_ident(name)))?;
        let mut rows = stmt.query([])?;
        let mut table = Table::new(columns);
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                let cell: duckdb::types::Value = row.get(i)?;
                cells.push(Self::from_duck(cell));
            }
            table
                .push_row(cells)
                .map_err(|e| DbError::ExecutionError(e.to_string()))?;
        }
        Ok(table)
    }

    async fn fetch_columns(&self, name: &str) -> DbResult<Vec<String>> {
        let conn = self.lock()?;
        Self::columns_sync(&conn, name)
    }

    async fn table_exists(&self, name: &str) -> DbResult<bool> {
        let conn = self.lock()?;
        Self::exists_sync(&conn, name)
    }

    async fn entry(&self, name: &str) -> DbResult<Option<WarehouseEntry>> {
        let conn = self.lock()?;
        Self::entry_sync(&conn, name)
    }

    async fn drop_table(&self, name: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(name)), [])?;
        conn.execute(
            &format!("DELETE FROM {} WHERE table_name = ?", CATALOG_TABLE),
            params![name],
        )?;
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "duckdb"
    }
}

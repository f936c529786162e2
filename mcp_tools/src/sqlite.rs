use crate::tool_trait::{required_arg, Tool, ToolError};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Statement};
use serde_json::{json, Value};
use shared_protocol_objects::{error_result, structured_result, CallToolParams, CallToolResult, ToolInfo};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub const SERVER_NAME: &str = "sqlite";

const DEFAULT_ROW_LIMIT: i64 = 10;
const MAX_ROW_LIMIT: i64 = 1000;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Handle to a sqlite database file. A connection is opened per call on a
/// blocking thread, so the handle itself is cheap to share.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    path: PathBuf,
}

impl SqliteDatabase {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&path)
                .with_context(|| format!("Failed to open database {}", path.display()))?;
            f(&conn)
        })
        .await
        .map_err(|e| anyhow!("Database task failed: {}", e))?
    }

    pub async fn list_tables(&self) -> Result<Value> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )?;
            let tables = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(json!({ "tables": tables, "count": tables.len() }))
        })
        .await
    }

    pub async fn query(&self, sql: String) -> Result<Value> {
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            if stmt.column_count() > 0 {
                let (columns, rows) = collect_rows(&mut stmt, [])?;
                let row_count = rows.len();
                Ok(json!({ "columns": columns, "rows": rows, "row_count": row_count }))
            } else {
                let affected = stmt.execute([])?;
                Ok(json!({
                    "rows_affected": affected,
                    "message": format!("Query executed successfully. Rows affected: {}", affected),
                }))
            }
        })
        .await
    }

    pub async fn describe_table(&self, table: String) -> Result<Value> {
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{}\")", table))?;
            let columns = stmt
                .query_map([], |row| {
                    Ok(json!({
                        "name": row.get::<_, String>(1)?,
                        "type": row.get::<_, String>(2)?,
                        "not_null": row.get::<_, i64>(3)? != 0,
                        "primary_key": row.get::<_, i64>(5)? != 0,
                    }))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            if columns.is_empty() {
                return Err(anyhow!("Table '{}' does not exist", table));
            }
            Ok(json!({ "table": table, "columns": columns }))
        })
        .await
    }

    pub async fn table_data(&self, table: String, limit: i64) -> Result<Value> {
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(&format!("SELECT * FROM \"{}\" LIMIT ?1", table))?;
            let (columns, rows) = collect_rows(&mut stmt, [limit])?;
            let row_count = rows.len();
            Ok(json!({ "table": table, "columns": columns, "rows": rows, "row_count": row_count }))
        })
        .await
    }
}

fn collect_rows<P: rusqlite::Params>(
    stmt: &mut Statement<'_>,
    params: P,
) -> Result<(Vec<String>, Vec<Value>)> {
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query(params)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            values.push(value_to_json(row.get_ref(i)?));
        }
        out.push(Value::Array(values));
    }
    Ok((columns, out))
}

fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => json!(i),
        ValueRef::Real(f) => json!(f),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(format!("<blob {} bytes>", b.len())),
    }
}

fn table_name_arg(params: &CallToolParams) -> Result<String, ToolError> {
    let table = required_arg(params, "table_name")?;
    let table = table.trim().to_string();
    if !IDENTIFIER.is_match(&table) {
        return Err(ToolError::InvalidArgument {
            name: "table_name".into(),
            reason: format!("'{}' is not a valid table identifier", table),
        });
    }
    Ok(table)
}

fn limit_arg(params: &CallToolParams) -> Result<i64, ToolError> {
    match params.arg_str("limit") {
        None => Ok(DEFAULT_ROW_LIMIT),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|n| *n > 0)
            .map(|n| n.min(MAX_ROW_LIMIT))
            .ok_or_else(|| ToolError::InvalidArgument {
                name: "limit".into(),
                reason: format!("'{}' is not a positive integer", raw),
            }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqliteOp {
    ListTables,
    QueryDatabase,
    DescribeTable,
    GetTableData,
}

impl SqliteOp {
    pub const ALL: [SqliteOp; 4] = [
        SqliteOp::ListTables,
        SqliteOp::QueryDatabase,
        SqliteOp::DescribeTable,
        SqliteOp::GetTableData,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SqliteOp::ListTables => "list_tables",
            SqliteOp::QueryDatabase => "query_database",
            SqliteOp::DescribeTable => "describe_table",
            SqliteOp::GetTableData => "get_table_data",
        }
    }

    pub fn info(&self) -> ToolInfo {
        let (description, input_schema) = match self {
            SqliteOp::ListTables => (
                "List all tables in the database",
                json!({ "type": "object", "properties": {} }),
            ),
            SqliteOp::QueryDatabase => (
                "Execute a SQL query against the database",
                json!({
                    "type": "object",
                    "properties": {
                        "query": { "type": "string", "description": "SQL statement to run" }
                    },
                    "required": ["query"]
                }),
            ),
            SqliteOp::DescribeTable => (
                "Get the column structure of a table",
                json!({
                    "type": "object",
                    "properties": {
                        "table_name": { "type": "string" }
                    },
                    "required": ["table_name"]
                }),
            ),
            SqliteOp::GetTableData => (
                "Fetch the first rows of a table",
                json!({
                    "type": "object",
                    "properties": {
                        "table_name": { "type": "string" },
                        "limit": { "type": "integer", "minimum": 1, "default": DEFAULT_ROW_LIMIT }
                    },
                    "required": ["table_name"]
                }),
            ),
        };
        ToolInfo {
            name: self.name().to_string(),
            description: Some(description.to_string()),
            input_schema,
        }
    }
}

#[derive(Debug)]
pub struct SqliteTool {
    op: SqliteOp,
    db: Arc<SqliteDatabase>,
}

impl SqliteTool {
    pub fn new(op: SqliteOp, db: Arc<SqliteDatabase>) -> Self {
        Self { op, db }
    }

    /// One tool per operation, all sharing the same database handle.
    pub fn all(db: Arc<SqliteDatabase>) -> Vec<SqliteTool> {
        SqliteOp::ALL
            .iter()
            .map(|op| SqliteTool::new(*op, Arc::clone(&db)))
            .collect()
    }
}

#[async_trait]
impl Tool for SqliteTool {
    fn name(&self) -> &str {
        self.op.name()
    }

    fn server(&self) -> &str {
        SERVER_NAME
    }

    fn info(&self) -> ToolInfo {
        self.op.info()
    }

    async fn execute(&self, params: CallToolParams) -> Result<CallToolResult> {
        debug!("sqlite tool {} on {}", self.op.name(), self.db.path().display());
        let outcome = match self.op {
            SqliteOp::ListTables => self.db.list_tables().await,
            SqliteOp::QueryDatabase => {
                let sql = required_arg(&params, "query")?;
                self.db.query(sql.trim().to_string()).await
            }
            SqliteOp::DescribeTable => {
                let table = table_name_arg(&params)?;
                self.db.describe_table(table).await
            }
            SqliteOp::GetTableData => {
                let table = table_name_arg(&params)?;
                let limit = limit_arg(&params)?;
                self.db.table_data(table, limit).await
            }
        };

        Ok(match outcome {
            Ok(value) => structured_result(value),
            Err(e) => {
                warn!("sqlite tool {} failed: {:#}", self.op.name(), e);
                error_result(format!("SQLite tool execution failed: {:#}", e))
            }
        })
    }
}

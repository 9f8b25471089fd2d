//! Builds parameterized SELECT, INSERT, UPDATE, DELETE from a static table descriptor.

use crate::entity::{Row, RowVersion};
use crate::table::{Column, Table, VERSION_COLUMN};
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: only from descriptors and config).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Push a value and return its placeholder, cast to the column type.
    fn push_param(&mut self, v: Value, col: &Column) -> String {
        self.params.push(v);
        format!("${}::{}", self.params.len(), col.pg_type.cast_name())
    }
}

/// SELECT list: every column plus the row version.
fn select_column_list(table: &Table) -> String {
    table
        .all_columns()
        .map(|c| quoted(c.name))
        .chain(std::iter::once(quoted(VERSION_COLUMN)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// SELECT all rows ordered by key.
pub fn select_all(table: &Table, schema: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {} ORDER BY {}",
        select_column_list(table),
        qualified_table(schema, table.name),
        quoted(table.key.name)
    );
    q
}

/// SELECT one row by key.
pub fn select_by_key(table: &Table, schema: &str, key: Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(key, &table.key);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select_column_list(table),
        qualified_table(schema, table.name),
        quoted(table.key.name),
        ph
    );
    q
}

/// SELECT EXISTS for a key; independent of any pending write.
pub fn exists_by_key(table: &Table, schema: &str, key: Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(key, &table.key);
    q.sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = {})",
        qualified_table(schema, table.name),
        quoted(table.key.name),
        ph
    );
    q
}

/// INSERT one row. The key column is omitted when the store assigns it.
/// The row version starts at the column default.
pub fn insert(table: &Table, schema: &str, row: &Row, include_key: bool) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in table.all_columns() {
        if c.name == table.key.name && !include_key {
            continue;
        }
        let val = row.get(c.name).cloned().unwrap_or(Value::Null);
        placeholders.push(q.push_param(val, c));
        cols.push(quoted(c.name));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        qualified_table(schema, table.name),
        cols.join(", "),
        placeholders.join(", "),
        select_column_list(table)
    );
    q
}

/// UPDATE every non-key column of one row and bump its version.
///
/// The row only matches while its version is still `expected`, so a stale write matches nothing.
/// Returns the new version when a row matched.
pub fn update_versioned(
    table: &Table,
    schema: &str,
    key: Value,
    row: &Row,
    expected: RowVersion,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let version = quoted(VERSION_COLUMN);
    let mut sets = Vec::new();
    for c in table.columns {
        let val = row.get(c.name).cloned().unwrap_or(Value::Null);
        let ph = q.push_param(val, c);
        sets.push(format!("{} = {}", quoted(c.name), ph));
    }
    sets.push(format!("{} = {} + 1", version, version));
    let key_ph = q.push_param(key, &table.key);
    q.params.push(Value::from(expected.0));
    let where_clause = format!(
        "{} = {} AND {} = ${}::bigint",
        quoted(table.key.name),
        key_ph,
        version,
        q.params.len()
    );
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} RETURNING {}",
        qualified_table(schema, table.name),
        sets.join(", "),
        where_clause,
        version
    );
    q
}

/// DELETE by key.
pub fn delete(table: &Table, schema: &str, key: Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(key, &table.key);
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {}",
        qualified_table(schema, table.name),
        quoted(table.key.name),
        ph
    );
    q
}

//! Create the schema and the six entity tables when missing.
//! Tables are created in dependency order so foreign keys can name their targets.

use crate::model::all_tables;
use crate::sql::{qualified_table, quoted};
use crate::store::StoreError;
use crate::table::{Column, PgType, Table, VERSION_COLUMN};
use sqlx::PgPool;

/// Idempotent: CREATE SCHEMA / CREATE TABLE IF NOT EXISTS.
pub async fn ensure_tables(pool: &PgPool, schema: &str) -> Result<(), StoreError> {
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema)))
        .execute(pool)
        .await?;
    for table in all_tables() {
        let ddl = create_table_sql(table, schema);
        tracing::debug!(sql = %ddl, "migration");
        sqlx::query(&ddl).execute(pool).await?;
    }
    tracing::info!(schema = %schema, "tables ready");
    Ok(())
}

fn column_type(col: &Column, is_key: bool) -> String {
    match (col.pg_type, col.max_length) {
        (PgType::Integer, _) if is_key => "SERIAL".into(),
        (PgType::Varchar, Some(n)) => format!("VARCHAR({})", n),
        (t, _) => t.cast_name().to_uppercase(),
    }
}

/// Key column of the table named `name`, for REFERENCES clauses.
fn key_of(name: &str) -> Option<&'static str> {
    all_tables()
        .into_iter()
        .find(|t| t.name == name)
        .map(|t| t.key.name)
}

pub fn create_table_sql(table: &Table, schema: &str) -> String {
    let mut col_defs = Vec::new();
    for col in table.all_columns() {
        let is_key = col.name == table.key.name;
        let mut def = format!("{} {}", quoted(col.name), column_type(col, is_key));
        if is_key {
            def.push_str(" PRIMARY KEY");
        } else if col.required {
            def.push_str(" NOT NULL");
        }
        if let Some(target) = col.references {
            if let Some(target_key) = key_of(target) {
                def.push_str(&format!(
                    " REFERENCES {} ({})",
                    qualified_table(schema, target),
                    quoted(target_key)
                ));
            }
        }
        col_defs.push(def);
    }
    col_defs.push(format!("{} BIGINT NOT NULL DEFAULT 1", quoted(VERSION_COLUMN)));
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        qualified_table(schema, table.name),
        col_defs.join(", ")
    )
}

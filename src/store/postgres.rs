//! PostgreSQL store: one pooled connection per session, returned to the pool on drop.

use super::{Session, StoreError, StoreFactory};
use crate::entity::{from_row, key_value, to_row, Entity, EntityKey, Row, RowVersion, Snapshot};
use crate::sql::{self, PgBindValue, QueryBuf};
use crate::table::VERSION_COLUMN;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgQueryResult, PgRow};
use sqlx::{ConnectOptions, PgPool, Postgres, Row as _};
use std::str::FromStr;
use std::sync::Arc;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    schema: Arc<str>,
}

impl PgStore {
    /// Store over `pool`, with all tables living in `schema`.
    pub fn new(pool: PgPool, schema: impl Into<Arc<str>>) -> Self {
        PgStore {
            pool,
            schema: schema.into(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }
}

#[async_trait]
impl StoreFactory for PgStore {
    type Session = PgSession;

    async fn open(&self) -> Result<PgSession, StoreError> {
        let conn = self.pool.acquire().await?;
        Ok(PgSession {
            conn,
            schema: Arc::clone(&self.schema),
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

pub struct PgSession {
    conn: PoolConnection<Postgres>,
    schema: Arc<str>,
}

impl PgSession {
    async fn fetch_all(&mut self, q: &QueryBuf) -> Result<Vec<PgRow>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        Ok(query.fetch_all(&mut *self.conn).await?)
    }

    async fn fetch_optional(&mut self, q: &QueryBuf) -> Result<Option<PgRow>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        Ok(query.fetch_optional(&mut *self.conn).await?)
    }

    async fn execute(&mut self, q: &QueryBuf) -> Result<PgQueryResult, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        Ok(query.execute(&mut *self.conn).await?)
    }
}

#[async_trait]
impl Session for PgSession {
    async fn list<E: Entity>(&mut self) -> Result<Vec<Snapshot<E>>, StoreError> {
        let q = sql::select_all(E::table(), &self.schema);
        let rows = self.fetch_all(&q).await?;
        rows.iter().map(snapshot_from_row::<E>).collect()
    }

    async fn find<E: Entity>(&mut self, key: &E::Key) -> Result<Option<Snapshot<E>>, StoreError> {
        let q = sql::select_by_key(E::table(), &self.schema, key_value::<E>(key)?);
        let row = self.fetch_optional(&q).await?;
        row.as_ref().map(snapshot_from_row::<E>).transpose()
    }

    async fn insert<E: Entity>(&mut self, entity: E) -> Result<Snapshot<E>, StoreError> {
        let row = to_row(&entity)?;
        let q = sql::insert(E::table(), &self.schema, &row, !E::Key::STORE_ASSIGNED);
        let created = self
            .fetch_optional(&q)
            .await?
            .ok_or_else(|| StoreError::Decode(format!("insert into {} returned no row", E::table().name)))?;
        snapshot_from_row::<E>(&created)
    }

    async fn replace<E: Entity>(
        &mut self,
        entity: E,
        expected: RowVersion,
    ) -> Result<RowVersion, StoreError> {
        let row = to_row(&entity)?;
        let key = key_value::<E>(&entity.key())?;
        let q = sql::update_versioned(E::table(), &self.schema, key, &row, expected);
        match self.fetch_optional(&q).await? {
            Some(updated) => Ok(RowVersion(updated.try_get::<i64, _>(VERSION_COLUMN)?)),
            None => Err(StoreError::Concurrency),
        }
    }

    async fn remove<E: Entity>(&mut self, key: &E::Key) -> Result<bool, StoreError> {
        let q = sql::delete(E::table(), &self.schema, key_value::<E>(key)?);
        let result = self.execute(&q).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists<E: Entity>(&mut self, key: &E::Key) -> Result<bool, StoreError> {
        let q = sql::exists_by_key(E::table(), &self.schema, key_value::<E>(key)?);
        let row = self
            .fetch_optional(&q)
            .await?
            .ok_or_else(|| StoreError::Decode("EXISTS returned no row".into()))?;
        Ok(row.try_get::<bool, _>(0)?)
    }
}

fn snapshot_from_row<E: Entity>(row: &PgRow) -> Result<Snapshot<E>, StoreError> {
    let mut map = row_to_json(row);
    let version = map
        .remove(VERSION_COLUMN)
        .and_then(|v| v.as_i64())
        .map(RowVersion)
        .ok_or_else(|| StoreError::Decode(format!("{} row without {}", E::table().name, VERSION_COLUMN)))?;
    Ok(Snapshot::new(from_row::<E>(map)?, version))
}

fn row_to_json(row: &PgRow) -> Row {
    use sqlx::Column;
    let mut map = Row::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    map
}

/// Decode one cell by trying the column types the Northwind tables use.
fn cell_to_value(row: &PgRow, name: &str) -> Value {
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    Value::Null
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), StoreError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", sql::quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), StoreError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| StoreError::Unavailable("DATABASE_URL has no database path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

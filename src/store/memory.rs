//! In-process store with the same contract as the PostgreSQL one.
//!
//! Rows are kept column-keyed per table. Key uniqueness, the foreign keys declared on the table
//! descriptors and row versions are enforced here just as the database enforces them, so the
//! resource layer cannot tell the two apart. Concurrent sessions are bounded by a semaphore; a
//! session's permit goes back when the session drops.

use super::{IntegrityKind, Session, StoreError, StoreFactory};
use crate::entity::{from_row, key_value, to_row, Entity, EntityKey, Row, RowVersion, Snapshot};
use crate::table::Table;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Ordered key so integer keys list numerically.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum KeyRepr {
    Int(i64),
    Text(String),
}

impl KeyRepr {
    fn of(v: &Value) -> Option<Self> {
        match v {
            Value::Number(n) => n.as_i64().map(KeyRepr::Int),
            Value::String(s) => Some(KeyRepr::Text(s.clone())),
            _ => None,
        }
    }
}

struct StoredRow {
    row: Row,
    version: RowVersion,
}

struct MemTable {
    desc: &'static Table,
    rows: BTreeMap<KeyRepr, StoredRow>,
    /// Last key handed out for store-assigned keys.
    sequence: i64,
}

#[derive(Default)]
struct Tables {
    by_name: HashMap<&'static str, MemTable>,
}

impl Tables {
    fn get(&self, desc: &Table) -> Option<&MemTable> {
        self.by_name.get(desc.name)
    }

    fn get_mut(&mut self, desc: &'static Table) -> &mut MemTable {
        self.by_name.entry(desc.name).or_insert_with(|| MemTable {
            desc,
            rows: BTreeMap::new(),
            sequence: 0,
        })
    }

    fn contains(&self, table: &str, key: &KeyRepr) -> bool {
        self.by_name
            .get(table)
            .is_some_and(|t| t.rows.contains_key(key))
    }

    /// Every non-null foreign key in `row` must name an existing row.
    fn check_references(&self, desc: &Table, row: &Row) -> Result<(), StoreError> {
        for col in desc.all_columns() {
            let Some(target) = col.references else { continue };
            let Some(value) = row.get(col.name).filter(|v| !v.is_null()) else { continue };
            let present = KeyRepr::of(value).is_some_and(|k| self.contains(target, &k));
            if !present {
                return Err(StoreError::integrity(
                    IntegrityKind::ForeignKey,
                    format!("{}.{} = {} has no matching row in {}", desc.name, col.name, value, target),
                ));
            }
        }
        Ok(())
    }

    /// First (table, column) still pointing at `key` in `desc`, if any.
    fn referenced_by(&self, desc: &Table, key: &KeyRepr) -> Option<(&'static str, &'static str)> {
        for t in self.by_name.values() {
            for col in t.desc.columns_referencing(desc.name) {
                let points_here = t
                    .rows
                    .values()
                    .any(|r| r.row.get(col.name).and_then(KeyRepr::of).as_ref() == Some(key));
                if points_here {
                    return Some((t.desc.name, col.name));
                }
            }
        }
        None
    }
}

fn row_key(desc: &Table, row: &Row) -> Result<KeyRepr, StoreError> {
    row.get(desc.key.name)
        .and_then(KeyRepr::of)
        .ok_or_else(|| StoreError::Decode(format!("{} row without a usable {}", desc.name, desc.key.name)))
}

fn lookup_key<E: Entity>(key: &E::Key) -> Result<KeyRepr, StoreError> {
    let value = key_value::<E>(key)?;
    KeyRepr::of(&value).ok_or_else(|| StoreError::Decode(format!("unusable {} key {}", E::NAME, value)))
}

#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    sessions: Arc<Semaphore>,
}

impl MemoryStore {
    pub const DEFAULT_MAX_SESSIONS: usize = 16;

    pub fn new() -> Self {
        Self::with_max_sessions(Self::DEFAULT_MAX_SESSIONS)
    }

    /// Store allowing at most `max` sessions open at once; `open` waits for a free slot.
    pub fn with_max_sessions(max: usize) -> Self {
        MemoryStore {
            tables: Arc::new(RwLock::new(Tables::default())),
            sessions: Arc::new(Semaphore::new(max)),
        }
    }

    /// Number of sessions that could be opened right now without waiting.
    pub fn available_sessions(&self) -> usize {
        self.sessions.available_permits()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreFactory for MemoryStore {
    type Session = MemorySession;

    async fn open(&self) -> Result<MemorySession, StoreError> {
        let permit = Arc::clone(&self.sessions)
            .acquire_owned()
            .await
            .map_err(|_| StoreError::Unavailable("memory store closed".into()))?;
        Ok(MemorySession {
            store: self.clone(),
            _permit: permit,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.read().map(|_| ())
    }
}

pub struct MemorySession {
    store: MemoryStore,
    _permit: OwnedSemaphorePermit,
}

impl MemorySession {
    fn list_rows(&self, desc: &Table) -> Result<Vec<(Row, RowVersion)>, StoreError> {
        let tables = self.store.read()?;
        Ok(tables
            .get(desc)
            .map(|t| t.rows.values().map(|r| (r.row.clone(), r.version)).collect())
            .unwrap_or_default())
    }

    fn find_row(&self, desc: &Table, key: &KeyRepr) -> Result<Option<(Row, RowVersion)>, StoreError> {
        let tables = self.store.read()?;
        Ok(tables
            .get(desc)
            .and_then(|t| t.rows.get(key))
            .map(|r| (r.row.clone(), r.version)))
    }

    fn insert_entity<E: Entity>(&self, mut entity: E) -> Result<Snapshot<E>, StoreError> {
        let desc = E::table();
        let mut tables = self.store.write()?;
        if E::Key::STORE_ASSIGNED {
            let next = tables.get_mut(desc).sequence + 1;
            let key = E::Key::from_sequence(next).ok_or_else(|| {
                StoreError::integrity(IntegrityKind::Constraint, format!("{} key sequence exhausted", desc.name))
            })?;
            entity.set_key(key);
        }
        let row = to_row(&entity)?;
        let key = row_key(desc, &row)?;
        tables.check_references(desc, &row)?;
        let table = tables.get_mut(desc);
        if table.rows.contains_key(&key) {
            return Err(StoreError::integrity(
                IntegrityKind::DuplicateKey,
                format!("{} already holds key {:?}", desc.name, key),
            ));
        }
        if E::Key::STORE_ASSIGNED {
            table.sequence += 1;
        }
        table.rows.insert(
            key,
            StoredRow {
                row,
                version: RowVersion::INITIAL,
            },
        );
        Ok(Snapshot::new(entity, RowVersion::INITIAL))
    }

    fn replace_entity<E: Entity>(&self, entity: E, expected: RowVersion) -> Result<RowVersion, StoreError> {
        let desc = E::table();
        let row = to_row(&entity)?;
        let key = row_key(desc, &row)?;
        let mut tables = self.store.write()?;
        let current = tables.get(desc).and_then(|t| t.rows.get(&key)).map(|r| r.version);
        if current != Some(expected) {
            return Err(StoreError::Concurrency);
        }
        tables.check_references(desc, &row)?;
        let stored = tables
            .get_mut(desc)
            .rows
            .get_mut(&key)
            .ok_or(StoreError::Concurrency)?;
        stored.row = row;
        stored.version = stored.version.next();
        Ok(stored.version)
    }

    fn remove_key(&self, desc: &'static Table, key: &KeyRepr) -> Result<bool, StoreError> {
        let mut tables = self.store.write()?;
        if !tables.contains(desc.name, key) {
            return Ok(false);
        }
        if let Some((table, column)) = tables.referenced_by(desc, key) {
            return Err(StoreError::integrity(
                IntegrityKind::ForeignKey,
                format!("{} {:?} is still referenced by {}.{}", desc.name, key, table, column),
            ));
        }
        Ok(tables.get_mut(desc).rows.remove(key).is_some())
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn list<E: Entity>(&mut self) -> Result<Vec<Snapshot<E>>, StoreError> {
        self.list_rows(E::table())?
            .into_iter()
            .map(|(row, version)| -> Result<Snapshot<E>, StoreError> {
                Ok(Snapshot::new(from_row::<E>(row)?, version))
            })
            .collect()
    }

    async fn find<E: Entity>(&mut self, key: &E::Key) -> Result<Option<Snapshot<E>>, StoreError> {
        let key = lookup_key::<E>(key)?;
        match self.find_row(E::table(), &key)? {
            Some((row, version)) => Ok(Some(Snapshot::new(from_row::<E>(row)?, version))),
            None => Ok(None),
        }
    }

    async fn insert<E: Entity>(&mut self, entity: E) -> Result<Snapshot<E>, StoreError> {
        self.insert_entity(entity)
    }

    async fn replace<E: Entity>(
        &mut self,
        entity: E,
        expected: RowVersion,
    ) -> Result<RowVersion, StoreError> {
        self.replace_entity(entity, expected)
    }

    async fn remove<E: Entity>(&mut self, key: &E::Key) -> Result<bool, StoreError> {
        let key = lookup_key::<E>(key)?;
        self.remove_key(E::table(), &key)
    }

    async fn exists<E: Entity>(&mut self, key: &E::Key) -> Result<bool, StoreError> {
        let key = lookup_key::<E>(key)?;
        Ok(self.find_row(E::table(), &key)?.is_some())
    }
}

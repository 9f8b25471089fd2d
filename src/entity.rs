//! Entity and key traits shared by every resource family, and the versioned snapshot carried on the wire.

use crate::case::{keys_to_columns, keys_to_fields};
use crate::table::Table;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{self, Debug, Display};
use std::str::FromStr;

/// Column-keyed row as exchanged with the store.
pub type Row = Map<String, Value>;

/// Store-managed version token. Every successful replace moves it forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowVersion(pub i64);

impl RowVersion {
    /// Version of a freshly inserted row.
    pub const INITIAL: RowVersion = RowVersion(1);

    pub fn next(self) -> Self {
        RowVersion(self.0 + 1)
    }
}

impl Display for RowVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Primary key representation. Integer surrogate keys are assigned by the store; string business keys by the caller.
pub trait EntityKey:
    Clone + Debug + Display + FromStr + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Whether the store assigns the authoritative key on insert.
    const STORE_ASSIGNED: bool;

    /// Key for the n-th value of a store sequence. `None` for caller-assigned keys or when out of range.
    fn from_sequence(n: i64) -> Option<Self>;
}

impl EntityKey for i32 {
    const STORE_ASSIGNED: bool = true;

    fn from_sequence(n: i64) -> Option<Self> {
        i32::try_from(n).ok()
    }
}

impl EntityKey for String {
    const STORE_ASSIGNED: bool = false;

    fn from_sequence(_n: i64) -> Option<Self> {
        None
    }
}

/// One of the business record types exposed as a resource family.
pub trait Entity: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    type Key: EntityKey;

    /// Singular lower-case name for logs and messages (e.g. "supplier").
    const NAME: &'static str;

    fn table() -> &'static Table;

    fn key(&self) -> Self::Key;

    fn set_key(&mut self, key: Self::Key);
}

/// An entity together with the row version it was read at.
///
/// On the wire the entity fields are flattened next to a `RowVersion` field. Clients echo the
/// version back on replace; the store rejects the write if the row has moved on since.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<E> {
    #[serde(flatten)]
    pub entity: E,
    #[serde(rename = "RowVersion", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<RowVersion>,
}

impl<E> Snapshot<E> {
    pub fn new(entity: E, version: RowVersion) -> Self {
        Snapshot {
            entity,
            version: Some(version),
        }
    }

    /// Snapshot without a version, as sent on create. Replace rejects it.
    pub fn unversioned(entity: E) -> Self {
        Snapshot {
            entity,
            version: None,
        }
    }
}

/// Serialize an entity into a column-keyed row.
pub fn to_row<E: Entity>(entity: &E) -> Result<Row, serde_json::Error> {
    match serde_json::to_value(entity)? {
        Value::Object(fields) => Ok(keys_to_columns(fields)),
        other => Err(serde::ser::Error::custom(format!(
            "{} serialized to a non-object value: {}",
            E::NAME,
            other
        ))),
    }
}

/// Deserialize an entity from a column-keyed row. Columns unknown to the entity are ignored.
pub fn from_row<E: Entity>(row: Row) -> Result<E, serde_json::Error> {
    serde_json::from_value(Value::Object(keys_to_fields(row)))
}

/// Key as a JSON value, for binding and for key lookups in rows.
pub fn key_value<E: Entity>(key: &E::Key) -> Result<Value, serde_json::Error> {
    serde_json::to_value(key)
}

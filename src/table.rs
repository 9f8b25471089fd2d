//! Static table descriptors: the only source of SQL identifiers and validation rules.

/// Column name of the store-managed row version, present on every table.
pub const VERSION_COLUMN: &str = "version";

/// PostgreSQL column types used by the Northwind tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PgType {
    Integer,
    SmallInt,
    Double,
    Varchar,
    Text,
    Timestamp,
}

impl PgType {
    /// Name used in parameter casts (e.g. `$1::integer`).
    pub fn cast_name(self) -> &'static str {
        match self {
            PgType::Integer => "integer",
            PgType::SmallInt => "smallint",
            PgType::Double => "double precision",
            PgType::Varchar => "varchar",
            PgType::Text => "text",
            PgType::Timestamp => "timestamp",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Column {
    pub name: &'static str,
    pub pg_type: PgType,
    /// Upper bound on string length in characters (VARCHAR(n)).
    pub max_length: Option<u32>,
    /// Must be present and non-null (and non-blank for strings).
    pub required: bool,
    /// Table name this column is a foreign key into. The target's key column is implied.
    pub references: Option<&'static str>,
}

impl Column {
    pub const fn new(name: &'static str, pg_type: PgType) -> Self {
        Column {
            name,
            pg_type,
            max_length: None,
            required: false,
            references: None,
        }
    }

    pub const fn varchar(name: &'static str, max_length: u32) -> Self {
        Column {
            name,
            pg_type: PgType::Varchar,
            max_length: Some(max_length),
            required: false,
            references: None,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn references(mut self, table: &'static str) -> Self {
        self.references = Some(table);
        self
    }
}

#[derive(Debug)]
pub struct Table {
    /// Table name in the store (e.g. "suppliers").
    pub name: &'static str,
    /// Resource path segment on the wire (e.g. "Suppliers").
    pub path: &'static str,
    /// Primary key column.
    pub key: Column,
    /// All other columns, in DDL order.
    pub columns: &'static [Column],
}

impl Table {
    /// Key column first, then the value columns.
    pub fn all_columns(&self) -> impl Iterator<Item = &Column> {
        std::iter::once(&self.key).chain(self.columns.iter())
    }

    /// Columns of this table that reference `target`.
    pub fn columns_referencing<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a Column> + 'a {
        self.all_columns().filter(move |c| c.references == Some(target))
    }
}

//! Northwind API: REST resources over the Northwind business records, with optimistic
//! concurrency on replace.

pub mod case;
pub mod config;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod model;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;
pub mod table;

pub use config::{AppConfig, StoreKind};
pub use entity::{Entity, EntityKey, RowVersion, Snapshot};
pub use error::{AppError, ConfigError};
pub use migration::ensure_tables;
pub use model::{Category, Customer, Order, OrderDetail, Shipper, Supplier};
pub use response::{success_many, success_one, success_one_ok};
pub use routes::{build_router, common_routes, entity_routes, resource_routes};
pub use service::{RequestValidator, ResourceService};
pub use state::AppState;
pub use store::{ensure_database_exists, MemoryStore, PgStore, Session, StoreError, StoreFactory};

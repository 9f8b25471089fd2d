//! Generic resource operations: one implementation serves every entity family.
//!
//! Store failures are logged here, once, with the entity, operation and key, and leave as an
//! [`AppError`] already classified for the HTTP layer.

use crate::entity::{Entity, RowVersion, Snapshot};
use crate::error::AppError;
use crate::service::RequestValidator;
use crate::store::{Session, StoreError, StoreFactory};
use std::fmt::Display;
use std::marker::PhantomData;

pub struct ResourceService<E> {
    _entity: PhantomData<E>,
}

impl<E: Entity> ResourceService<E> {
    pub async fn list<F: StoreFactory>(store: &F) -> Result<Vec<Snapshot<E>>, AppError> {
        let mut session = open::<E, F>(store, "list").await?;
        session
            .list::<E>()
            .await
            .map_err(|e| store_failure::<E>("list", &"*", e))
    }

    pub async fn get<F: StoreFactory>(store: &F, key: &E::Key) -> Result<Snapshot<E>, AppError> {
        let mut session = open::<E, F>(store, "get").await?;
        match session.find::<E>(key).await {
            Ok(Some(found)) => Ok(found),
            Ok(None) => Err(not_found::<E>("get", key)),
            Err(e) => Err(store_failure::<E>("get", key, e)),
        }
    }

    /// Insert a new record. A supplied `RowVersion` is ignored; store-assigned keys are replaced.
    pub async fn create<F: StoreFactory>(
        store: &F,
        snapshot: Snapshot<E>,
    ) -> Result<Snapshot<E>, AppError> {
        let entity = snapshot.entity;
        let key = entity.key();
        RequestValidator::validate(&entity).map_err(|e| rejected::<E>("create", &key, e))?;
        let mut session = open::<E, F>(store, "create").await?;
        let created = session
            .insert(entity)
            .await
            .map_err(|e| store_failure::<E>("create", &key, e))?;
        tracing::info!(entity = E::NAME, op = "create", key = %created.entity.key(), "created");
        Ok(created)
    }

    /// Overwrite the record at `key`, provided it still sits at the `RowVersion` the caller read.
    /// Returns the version the row moved to. Store failures other than a lost race are server-side.
    pub async fn replace<F: StoreFactory>(
        store: &F,
        key: &E::Key,
        snapshot: Snapshot<E>,
    ) -> Result<RowVersion, AppError> {
        let Snapshot { entity, version } = snapshot;
        let body_key = entity.key();
        if body_key != *key {
            return Err(rejected::<E>(
                "replace",
                key,
                AppError::BadRequest(format!(
                    "{} key in the body ({}) does not match the key in the path ({})",
                    E::NAME,
                    body_key,
                    key
                )),
            ));
        }
        let Some(expected) = version else {
            return Err(rejected::<E>(
                "replace",
                key,
                AppError::BadRequest(format!("RowVersion is required to replace a {}", E::NAME)),
            ));
        };
        RequestValidator::validate(&entity).map_err(|e| rejected::<E>("replace", key, e))?;

        let mut session = open::<E, F>(store, "replace").await?;
        match session.replace(entity, expected).await {
            Ok(next) => {
                tracing::info!(entity = E::NAME, op = "replace", key = %key, version = %next, "replaced");
                Ok(next)
            }
            Err(StoreError::Concurrency) => match session.exists::<E>(key).await {
                Ok(false) => Err(not_found::<E>("replace", key)),
                Ok(true) => {
                    tracing::error!(
                        entity = E::NAME,
                        op = "replace",
                        key = %key,
                        expected = %expected,
                        "row was modified by a concurrent writer"
                    );
                    Err(AppError::Conflict(format!(
                        "{} {} changed since version {}",
                        E::NAME,
                        key,
                        expected
                    )))
                }
                Err(e) => Err(replace_failure::<E>(key, e)),
            },
            Err(e) => Err(replace_failure::<E>(key, e)),
        }
    }

    /// Remove the record at `key`. Absent rows are reported before any write is attempted.
    pub async fn delete<F: StoreFactory>(store: &F, key: &E::Key) -> Result<(), AppError> {
        let mut session = open::<E, F>(store, "delete").await?;
        match session.find::<E>(key).await {
            Ok(Some(_)) => {}
            Ok(None) => return Err(not_found::<E>("delete", key)),
            Err(e) => return Err(store_failure::<E>("delete", key, e)),
        }
        match session.remove::<E>(key).await {
            Ok(true) => {
                tracing::info!(entity = E::NAME, op = "delete", key = %key, "deleted");
                Ok(())
            }
            // Removed by someone else between the lookup and the delete.
            Ok(false) => Err(not_found::<E>("delete", key)),
            Err(e) => Err(store_failure::<E>("delete", key, e)),
        }
    }
}

async fn open<E: Entity, F: StoreFactory>(
    store: &F,
    op: &'static str,
) -> Result<F::Session, AppError> {
    store.open().await.map_err(|e| {
        tracing::error!(entity = E::NAME, op, error = %e, "could not open store session");
        AppError::Internal(e.to_string())
    })
}

fn action(op: &str) -> &'static str {
    match op {
        "create" => "creating",
        "delete" => "deleting",
        _ => "reading",
    }
}

fn not_found<E: Entity>(op: &'static str, key: &E::Key) -> AppError {
    tracing::debug!(entity = E::NAME, op, key = %key, "not found");
    AppError::NotFound(format!("{} {} not found", E::NAME, key))
}

fn rejected<E: Entity>(op: &'static str, key: &dyn Display, err: AppError) -> AppError {
    tracing::warn!(entity = E::NAME, op, key = %key, error = %err, "request rejected");
    err
}

fn store_failure<E: Entity>(op: &'static str, key: &dyn Display, err: StoreError) -> AppError {
    match err {
        StoreError::Integrity { kind, detail } => {
            tracing::warn!(entity = E::NAME, op, key = %key, %detail, "integrity violation");
            AppError::BadRequest(format!(
                "error {} the {}: {}",
                action(op),
                E::NAME,
                kind.reason()
            ))
        }
        other => {
            tracing::error!(entity = E::NAME, op, key = %key, error = %other, "store failure");
            AppError::Internal(other.to_string())
        }
    }
}

/// Replace has no client-rejected store outcome: integrity failures are server errors too.
fn replace_failure<E: Entity>(key: &dyn Display, err: StoreError) -> AppError {
    tracing::error!(entity = E::NAME, op = "replace", key = %key, error = %err, "store failure");
    AppError::Internal(err.to_string())
}

//! Resource handlers, instantiated once per entity family: list, read, create, replace, delete.

use crate::entity::{Entity, Snapshot};
use crate::error::AppError;
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::ResourceService;
use crate::state::AppState;
use crate::store::StoreFactory;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::Value;

fn parse_key<E: Entity>(raw: &str) -> Result<E::Key, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid {} key: '{}'", E::NAME, raw)))
}

fn parse_body<E: Entity>(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Snapshot<E>, AppError> {
    let Json(body) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    if !body.is_object() {
        return Err(AppError::BadRequest("body must be a JSON object".into()));
    }
    serde_json::from_value(body)
        .map_err(|e| AppError::BadRequest(format!("invalid {}: {}", E::NAME, e)))
}

pub async fn list<E: Entity, F: StoreFactory>(
    State(state): State<AppState<F>>,
) -> Result<impl IntoResponse, AppError> {
    let rows = ResourceService::<E>::list(&state.store).await?;
    Ok(success_many(rows))
}

pub async fn read<E: Entity, F: StoreFactory>(
    State(state): State<AppState<F>>,
    Path(raw_key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let key = parse_key::<E>(&raw_key)?;
    let row = ResourceService::<E>::get(&state.store, &key).await?;
    Ok(success_one_ok(row))
}

/// Path of a record, with the key percent-encoded so it is always a valid header value.
fn location<E: Entity>(key: &E::Key) -> String {
    format!("/{}/{}", E::table().path, urlencoding::encode(&key.to_string()))
}

/// 201 with a Location header naming the new record.
pub async fn create<E: Entity, F: StoreFactory>(
    State(state): State<AppState<F>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = parse_body::<E>(body)?;
    let created = ResourceService::<E>::create(&state.store, snapshot).await?;
    let path = location::<E>(&created.entity.key());
    Ok(([(header::LOCATION, path)], success_one(created)))
}

pub async fn replace<E: Entity, F: StoreFactory>(
    State(state): State<AppState<F>>,
    Path(raw_key): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let key = parse_key::<E>(&raw_key)?;
    let snapshot = parse_body::<E>(body)?;
    ResourceService::<E>::replace(&state.store, &key, snapshot).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete<E: Entity, F: StoreFactory>(
    State(state): State<AppState<F>>,
    Path(raw_key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let key = parse_key::<E>(&raw_key)?;
    ResourceService::<E>::delete(&state.store, &key).await?;
    Ok(StatusCode::NO_CONTENT)
}

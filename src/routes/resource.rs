//! Resource routes: `/<Path>` and `/<Path>/:key` for every entity family.

use crate::entity::Entity;
use crate::handlers::resource::{create, delete, list, read, replace};
use crate::model::{Category, Customer, Order, OrderDetail, Shipper, Supplier};
use crate::state::AppState;
use crate::store::StoreFactory;
use axum::{routing::get, Router};

/// Routes for one entity family, mounted under its table path.
pub fn resource_routes<E: Entity, F: StoreFactory>() -> Router<AppState<F>> {
    let base = format!("/{}", E::table().path);
    Router::new()
        .route(&base, get(list::<E, F>).post(create::<E, F>))
        .route(
            &format!("{}/:key", base),
            get(read::<E, F>)
                .put(replace::<E, F>)
                .delete(delete::<E, F>),
        )
}

/// All six resource families.
pub fn entity_routes<F: StoreFactory>(state: AppState<F>) -> Router {
    Router::new()
        .merge(resource_routes::<Category, F>())
        .merge(resource_routes::<Customer, F>())
        .merge(resource_routes::<Order, F>())
        .merge(resource_routes::<OrderDetail, F>())
        .merge(resource_routes::<Shipper, F>())
        .merge(resource_routes::<Supplier, F>())
        .with_state(state)
}

//! Shared application state for all routes.

/// Holds the store factory; each request opens its own session from it.
#[derive(Clone)]
pub struct AppState<F> {
    pub store: F,
}

impl<F> AppState<F> {
    pub fn new(store: F) -> Self {
        AppState { store }
    }
}

//! Application state shared across handlers

use std::sync::Arc;

use crate::store::ToyStore;

/// Shared application state
///
/// Holds the one store handle opened at startup. It lives until the process
/// exits; nothing closes it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn ToyStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn ToyStore>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { store }),
        }
    }

    pub fn store(&self) -> &dyn ToyStore {
        self.inner.store.as_ref()
    }
}

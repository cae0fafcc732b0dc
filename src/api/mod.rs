//! HTTP handlers: the system probes and the items CRUD.

pub mod extract;
pub mod items;
pub mod system;

pub use extract::*;
pub use system::*;

/// Application state of the items service.
#[derive(Debug, Clone)]
pub struct AppState<R> {
    pub items: R,
}

impl<R> AppState<R> {
    pub fn new(items: R) -> Self {
        AppState { items }
    }
}

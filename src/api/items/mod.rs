//! Items CRUD mounted under `/api/v1/items`.

mod handlers;
mod model;
mod query;

pub use handlers::*;
pub use model::*;
pub use query::*;

use {
    crate::{api::AppState, repository::ItemRepository},
    axum::{Router, routing::get},
};

/// Mount point of [`router`].
pub const ITEMS_PATH: &str = "/api/v1/items";

/// Routes relative to [`ITEMS_PATH`].
pub fn router<R: ItemRepository>() -> Router<AppState<R>> {
    Router::new()
        .route("/", get(list_items::<R>).post(create_item::<R>))
        .route(
            "/{id}",
            get(get_item::<R>)
                .patch(update_item::<R>)
                .put(replace_item::<R>)
                .delete(delete_item::<R>),
        )
}

use {
    super::{CreateItem, Item, ItemPage, ItemQuery, ListParams, UpdateItem},
    crate::{
        Error, Result,
        api::{
            AppState,
            extract::{ItemId, ValidJson, ValidQuery},
        },
        repository::ItemRepository,
    },
    axum::{Json, extract::State, http::StatusCode},
};

#[cfg(feature = "openapi")]
use crate::ErrorResponse;

pub(crate) const ITEM_NOT_FOUND: &str = "No item exists with the provided identifier.";

fn found(item: Option<Item>) -> Result<Json<Item>> {
    let item = item.ok_or_else(|| Error::not_found(ITEM_NOT_FOUND))?;
    Ok(Json(item.checked()?))
}

/// Create an item.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/items",
    tag = "items",
    request_body = CreateItem,
    responses(
        (status = 201, description = "Item created", body = Item),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 415, description = "Unsupported content type", body = ErrorResponse),
    )
))]
pub async fn create_item<R: ItemRepository>(
    State(state): State<AppState<R>>,
    ValidJson(input): ValidJson<CreateItem>,
) -> Result<(StatusCode, Json<Item>)> {
    let item = state.items.create(input).await?;
    tracing::info!(item_id = %item.id, "item created");
    Ok((StatusCode::CREATED, Json(item.checked()?)))
}

/// List items with search, price range, sorting and pagination.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/items",
    tag = "items",
    params(ItemQuery),
    responses(
        (status = 200, description = "One page of items", body = ItemPage),
        (status = 400, description = "Invalid query", body = ErrorResponse),
    )
))]
pub async fn list_items<R: ItemRepository>(
    State(state): State<AppState<R>>,
    ValidQuery(query): ValidQuery<ItemQuery>,
) -> Result<Json<ItemPage>> {
    let params = ListParams::from(query);
    let mut page = state.items.list(&params).await?;
    page.data = page
        .data
        .into_iter()
        .map(Item::checked)
        .collect::<Result<_>>()?;
    Ok(Json(page))
}

/// Fetch one item.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/items/{id}",
    tag = "items",
    params(("id" = String, Path, description = "16 character item identifier")),
    responses(
        (status = 200, description = "The item", body = Item),
        (status = 400, description = "Malformed identifier", body = ErrorResponse),
        (status = 404, description = "No such item", body = ErrorResponse),
    )
))]
pub async fn get_item<R: ItemRepository>(
    State(state): State<AppState<R>>,
    ItemId(id): ItemId,
) -> Result<Json<Item>> {
    found(state.items.get(&id).await?)
}

/// Update some fields of an item.
#[cfg_attr(feature = "openapi", utoipa::path(
    patch,
    path = "/api/v1/items/{id}",
    tag = "items",
    params(("id" = String, Path, description = "16 character item identifier")),
    request_body = UpdateItem,
    responses(
        (status = 200, description = "The updated item", body = Item),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "No such item", body = ErrorResponse),
    )
))]
pub async fn update_item<R: ItemRepository>(
    State(state): State<AppState<R>>,
    ItemId(id): ItemId,
    ValidJson(patch): ValidJson<UpdateItem>,
) -> Result<Json<Item>> {
    found(state.items.update(&id, patch).await?)
}

/// Replace every field of an item.
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/v1/items/{id}",
    tag = "items",
    params(("id" = String, Path, description = "16 character item identifier")),
    request_body = CreateItem,
    responses(
        (status = 200, description = "The replaced item", body = Item),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "No such item", body = ErrorResponse),
    )
))]
pub async fn replace_item<R: ItemRepository>(
    State(state): State<AppState<R>>,
    ItemId(id): ItemId,
    ValidJson(input): ValidJson<CreateItem>,
) -> Result<Json<Item>> {
    found(state.items.replace(&id, input).await?)
}

/// Delete an item and return it.
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/api/v1/items/{id}",
    tag = "items",
    params(("id" = String, Path, description = "16 character item identifier")),
    responses(
        (status = 200, description = "The removed item", body = Item),
        (status = 400, description = "Malformed identifier", body = ErrorResponse),
        (status = 404, description = "No such item", body = ErrorResponse),
    )
))]
pub async fn delete_item<R: ItemRepository>(
    State(state): State<AppState<R>>,
    ItemId(id): ItemId,
) -> Result<Json<Item>> {
    let removed = state.items.remove(&id).await?;
    if let Some(item) = &removed {
        tracing::info!(item_id = %item.id, "item deleted");
    }
    found(removed)
}

//! Storage for items.
//!
//! Handlers only see the [`ItemRepository`] trait. Two implementations exist:
//! [`MemoryItemRepository`] keeps everything in a `DashMap`, and
//! `PgItemRepository` (feature `postgres`) stores items in a PostgreSQL table.
//! Both register themselves with the [`Lifecycle`](crate::Lifecycle) as the
//! service named [`DATABASE_SERVICE`], which `/system` reports on.

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

pub use memory::*;
#[cfg(feature = "postgres")]
pub use postgres::*;

use {
    crate::{
        Result,
        api::items::{CreateItem, Item, ItemPage, ListParams, UpdateItem},
    },
    std::future::Future,
};

/// Name under which every repository registers with the lifecycle.
pub const DATABASE_SERVICE: &str = "database";

/// Item persistence used by the `/api/v1/items` handlers.
///
/// Lookups by identifier return `Ok(None)` when the item does not exist, so
/// that the handler decides how a miss is reported.
pub trait ItemRepository: Clone + Send + Sync + 'static {
    fn create(&self, input: CreateItem) -> impl Future<Output = Result<Item>> + Send;

    /// Filters, sorts and paginates the stored items.
    fn list(&self, params: &ListParams) -> impl Future<Output = Result<ItemPage>> + Send;

    fn get(&self, id: &str) -> impl Future<Output = Result<Option<Item>>> + Send;

    /// Applies the fields present in `patch`.
    fn update(
        &self,
        id: &str,
        patch: UpdateItem,
    ) -> impl Future<Output = Result<Option<Item>>> + Send;

    /// Replaces every user supplied field.
    fn replace(
        &self,
        id: &str,
        input: CreateItem,
    ) -> impl Future<Output = Result<Option<Item>>> + Send;

    /// Deletes the item and returns it.
    fn remove(&self, id: &str) -> impl Future<Output = Result<Option<Item>>> + Send;

    /// Returns true when the backing store answers.
    fn ping(&self) -> impl Future<Output = bool> + Send;
}

use {
    super::{DATABASE_SERVICE, ItemRepository},
    crate::{
        BoxFuture, LifecycleService, Result,
        api::items::{CreateItem, Item, ItemPage, ListParams, UpdateItem},
    },
    dashmap::DashMap,
    std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

/// Items kept in process memory.
///
/// Clones share the same map. The store reports itself connected between
/// lifecycle `start` and `stop`.
#[derive(Debug, Clone, Default)]
pub struct MemoryItemRepository {
    items: Arc<DashMap<String, Item>>,
    connected: Arc<AtomicBool>,
}

impl MemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the repository as a lifecycle service sharing this store.
    pub fn into_service(&self) -> Arc<dyn LifecycleService> {
        Arc::new(self.clone())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ItemRepository for MemoryItemRepository {
    async fn create(&self, input: CreateItem) -> Result<Item> {
        let item = Item::new(input);
        self.items.insert(item.id.clone(), item.clone());
        Ok(item)
    }

    async fn list(&self, params: &ListParams) -> Result<ItemPage> {
        let mut matching: Vec<Item> = self
            .items
            .iter()
            .filter(|entry| params.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        matching.sort_by(|a, b| params.compare(a, b));

        let total = matching.len() as u64;
        let data = matching
            .into_iter()
            .skip(params.offset() as usize)
            .take(params.limit as usize)
            .collect();

        Ok(ItemPage {
            data,
            total,
            page: params.page,
            limit: params.limit,
        })
    }

    async fn get(&self, id: &str) -> Result<Option<Item>> {
        Ok(self.items.get(id).map(|entry| entry.value().clone()))
    }

    async fn update(&self, id: &str, patch: UpdateItem) -> Result<Option<Item>> {
        Ok(self.items.get_mut(id).map(|mut entry| {
            entry.apply(patch);
            entry.clone()
        }))
    }

    async fn replace(&self, id: &str, input: CreateItem) -> Result<Option<Item>> {
        Ok(self.items.get_mut(id).map(|mut entry| {
            entry.replace(input);
            entry.clone()
        }))
    }

    async fn remove(&self, id: &str) -> Result<Option<Item>> {
        Ok(self.items.remove(id).map(|(_, item)| item))
    }

    async fn ping(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl LifecycleService for MemoryItemRepository {
    fn name(&self) -> &str {
        DATABASE_SERVICE
    }

    fn start(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.connected.store(true, Ordering::SeqCst);
            tracing::debug!(items = self.items.len(), "in-memory item store opened");
            Ok(())
        })
    }

    fn stop(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.connected.store(false, Ordering::SeqCst);
            tracing::debug!(items = self.items.len(), "in-memory item store closed");
            Ok(())
        })
    }

    fn is_healthy(&self) -> BoxFuture<'_, bool> {
        Box::pin(self.ping())
    }
}

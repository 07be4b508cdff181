//! In-memory item store
//!
//! The store is the only shared mutable state of a batch session. Intake
//! appends to it, the scheduler patches statuses, and user actions remove,
//! clear or rename. Every update replaces one item under the write lock, so
//! readers never observe a half-applied patch.

use crate::handle::{HandleId, HandleRegistry, MemoryHandleRegistry};
use crate::item::{ItemId, ItemStatus, ResultHandle, SourceFile, WorkItem};
use crate::rules::{NameDeriver, RenameRule};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Partial status update applied by the scheduler.
#[derive(Debug, Clone)]
pub enum StatusPatch {
    Pending,
    Processing,
    Done(Arc<[u8]>),
    Failed(String),
}

pub struct ItemStore {
    items: RwLock<Vec<WorkItem>>,
    handles: Arc<dyn HandleRegistry>,
}

impl ItemStore {
    pub fn new(handles: Arc<dyn HandleRegistry>) -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            handles,
        }
    }

    /// Store backed by a [`MemoryHandleRegistry`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryHandleRegistry::new()))
    }

    pub fn handles(&self) -> &Arc<dyn HandleRegistry> {
        &self.handles
    }

    /// Appends items in arrival order and returns their ids.
    pub fn add(&self, items: Vec<WorkItem>) -> Vec<ItemId> {
        let ids: Vec<ItemId> = items.iter().map(WorkItem::id).collect();
        self.items.write().extend(items);
        ids
    }

    /// Removes one item after revoking every handle it owns.
    ///
    /// Handles are revoked while the item is still held under the write lock.
    pub fn remove(&self, id: ItemId) -> bool {
        let mut items = self.items.write();
        let Some(index) = items.iter().position(|item| item.id() == id) else {
            return false;
        };

        self.release(items[index].take_handles());
        let item = items.remove(index);
        drop(items);

        debug!("Removed item {} ({})", id, item.original_name());
        true
    }

    /// Empties the store once `confirm` agrees, returning how many items were dropped.
    ///
    /// `confirm` receives the current item count. Declining leaves the store untouched.
    pub fn clear<F>(&self, confirm: F) -> usize
    where
        F: FnOnce(usize) -> bool,
    {
        let count = self.len();
        if count == 0 || !confirm(count) {
            return 0;
        }

        let drained: Vec<WorkItem> = std::mem::take(&mut *self.items.write());
        let count = drained.len();
        for mut item in drained {
            self.release(item.take_handles());
        }
        debug!("Cleared {} items", count);
        count
    }

    /// Applies `patch` to the item with `id`.
    ///
    /// Returns `false` when the item no longer exists; the patch is dropped
    /// and nothing is re-created.
    pub fn update_status(&self, id: ItemId, patch: StatusPatch) -> bool {
        let mut items = self.items.write();
        let Some(item) = items.iter_mut().find(|item| item.id() == id) else {
            return false;
        };

        let dropped = self.apply(item, patch);
        drop(items);

        if let Some(result) = dropped {
            self.release(vec![result.display]);
        }
        true
    }

    /// Moves a pending item to processing and hands back its source.
    ///
    /// Items that are missing or not pending are left alone.
    pub fn claim(&self, id: ItemId) -> Option<SourceFile> {
        let mut items = self.items.write();
        let item = items
            .iter_mut()
            .find(|item| item.id() == id && item.status() == ItemStatus::Pending)?;
        // Pending items never hold a result.
        let _ = item.mark_processing();
        Some(item.source().clone())
    }

    /// Resets every item to pending and discards previous results.
    pub fn reset_all(&self) -> Vec<ItemId> {
        let mut released = Vec::new();
        let ids = {
            let mut items = self.items.write();
            items
                .iter_mut()
                .map(|item| {
                    released.extend(self.apply(item, StatusPatch::Pending).map(|result| result.display));
                    item.id()
                })
                .collect()
        };
        self.release(released);
        ids
    }

    /// Recomputes every derived name from the original names under `rule`.
    ///
    /// Manual edits are overwritten. An empty computed name keeps the current one.
    pub fn recompute(&self, rule: &RenameRule) {
        let deriver = NameDeriver::new(rule);
        let mut items = self.items.write();
        for (index, item) in items.iter_mut().enumerate() {
            let name = deriver.derive(item.original_name(), index);
            if !item.set_derived_name(name) {
                debug!("Rule produced an empty name for {}, keeping {}", item.original_name(), item.derived_name());
            }
        }
    }

    /// Manual per-item override, kept until the next recompute.
    pub fn set_derived_name(&self, id: ItemId, name: impl Into<String>) -> bool {
        let mut items = self.items.write();
        items
            .iter_mut()
            .find(|item| item.id() == id)
            .map(|item| item.set_derived_name(name.into()))
            .unwrap_or(false)
    }

    /// Restores every derived name to the original name.
    pub fn reset_names(&self) {
        let mut items = self.items.write();
        for item in items.iter_mut() {
            let original = item.original_name().to_string();
            item.set_derived_name(original);
        }
    }

    pub fn find_by_original_name(&self, name: &str) -> Option<ItemId> {
        self.items
            .read()
            .iter()
            .find(|item| item.original_name() == name)
            .map(WorkItem::id)
    }

    pub fn get(&self, id: ItemId) -> Option<WorkItem> {
        self.items.read().iter().find(|item| item.id() == id).cloned()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.read().iter().any(|item| item.id() == id)
    }

    /// Copy of every item in store order.
    pub fn snapshot(&self) -> Vec<WorkItem> {
        self.items.read().clone()
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.items.read().iter().map(WorkItem::id).collect()
    }

    pub fn count_with_status(&self, status: ItemStatus) -> usize {
        self.items
            .read()
            .iter()
            .filter(|item| item.status() == status)
            .count()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    // Returns the result the item held before the patch, if any.
    fn apply(&self, item: &mut WorkItem, patch: StatusPatch) -> Option<ResultHandle> {
        match patch {
            StatusPatch::Pending => item.reset(),
            StatusPatch::Processing => item.mark_processing(),
            StatusPatch::Done(bytes) => {
                let display = self.handles.allocate(bytes.clone());
                item.mark_done(ResultHandle { bytes, display })
            }
            StatusPatch::Failed(message) => item.mark_error(message),
        }
    }

    fn release(&self, handles: Vec<HandleId>) {
        for handle in handles {
            if !self.handles.revoke(handle) {
                debug!("Handle {} was already revoked", handle);
            }
        }
    }
}

impl Drop for ItemStore {
    fn drop(&mut self) {
        let items = std::mem::take(self.items.get_mut());
        for mut item in items {
            let handles = item.take_handles();
            self.release(handles);
        }
    }
}

impl std::fmt::Debug for ItemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemStore").field("items", &self.len()).finish()
    }
}

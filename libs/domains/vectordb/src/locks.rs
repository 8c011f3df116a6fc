use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// One async mutex per collection id, serialising insert, delete and drop.
///
/// Collection ids are never reused, so a dropped collection's entry can be
/// forgotten: late waiters re-resolve the collection after locking and see
/// it gone.
#[derive(Clone, Default)]
pub struct CollectionLocks {
    locks: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl CollectionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, collection_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(collection_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub fn forget(&self, collection_id: Uuid) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.remove(&collection_id);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

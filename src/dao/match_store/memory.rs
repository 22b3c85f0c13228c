use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::{
    dao::{
        match_store::{MatchStore, newest},
        models::SavedMatchEntity,
        storage::StorageResult,
    },
    state::match_state::TableId,
};

/// Process-local store; records are lost on restart.
#[derive(Clone, Default)]
pub struct MemoryMatchStore {
    records: Arc<RwLock<Vec<SavedMatchEntity>>>,
}

impl MemoryMatchStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record saved so far, oldest first.
    pub async fn records(&self) -> Vec<SavedMatchEntity> {
        self.records.read().await.clone()
    }
}

impl MatchStore for MemoryMatchStore {
    fn save_match(&self, record: SavedMatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let records = self.records.clone();
        Box::pin(async move {
            records.write().await.push(record);
            Ok(())
        })
    }

    fn latest_match(
        &self,
        table: Option<TableId>,
    ) -> BoxFuture<'static, StorageResult<Option<SavedMatchEntity>>> {
        let records = self.records.clone();
        Box::pin(async move {
            let guard = records.read().await;
            Ok(newest(guard.iter(), table.as_ref()).cloned())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

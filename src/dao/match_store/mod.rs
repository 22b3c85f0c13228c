//! Storage backends for saved matches.

/// CouchDB backend.
#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod file;
/// In-memory backend for tests and ephemeral runs.
pub mod memory;

use futures::future::BoxFuture;

use crate::dao::models::SavedMatchEntity;
use crate::dao::storage::StorageResult;
use crate::state::match_state::TableId;

/// Abstraction over the persistence collaborator that stores finished matches.
pub trait MatchStore: Send + Sync {
    /// Persist `record` as a new saved match.
    fn save_match(&self, record: SavedMatchEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Most recently saved match, optionally restricted to one table.
    fn latest_match(
        &self,
        table: Option<TableId>,
    ) -> BoxFuture<'static, StorageResult<Option<SavedMatchEntity>>>;
    /// Check that the backend is reachable and writable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Pick the newest record of `records` matching `table`.
fn newest<'a, I>(records: I, table: Option<&TableId>) -> Option<&'a SavedMatchEntity>
where
    I: IntoIterator<Item = &'a SavedMatchEntity>,
{
    records
        .into_iter()
        .filter(|record| table.is_none_or(|table| &record.table_id == table))
        .max_by_key(|record| record.saved_at)
}

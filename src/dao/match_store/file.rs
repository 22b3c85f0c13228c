//! JSON-file backed match store: one pretty-printed file per save.

use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use time::{format_description::FormatItem, macros::format_description};
use tokio::fs;
use tracing::{info, warn};

use crate::{
    dao::{
        match_store::{MatchStore, newest},
        models::SavedMatchEntity,
        storage::{StorageError, StorageResult},
    },
    state::match_state::TableId,
};

const FILE_STAMP: &[FormatItem<'static>] =
    format_description!("[year][month][day]_[hour][minute][second]_[subsecond digits:3]");

/// Match store writing each save to its own JSON file under one directory.
#[derive(Clone)]
pub struct FileMatchStore {
    dir: Arc<PathBuf>,
}

impl FileMatchStore {
    /// Open the store rooted at `dir`, creating the directory when needed.
    pub async fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(|source| {
            StorageError::unavailable(format!("cannot create `{}`", dir.display()), source)
        })?;
        Ok(Self { dir: Arc::new(dir) })
    }

    /// Directory holding the saved matches.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(record: &SavedMatchEntity) -> String {
        let stamp = record
            .saved_at
            .format(FILE_STAMP)
            .unwrap_or_else(|_| record.id.simple().to_string());
        format!(
            "game_{}_{}_table{}.json",
            sanitize(&record.game_number),
            stamp,
            record.table_id
        )
    }

    async fn read_all(dir: &Path) -> StorageResult<Vec<SavedMatchEntity>> {
        let unavailable = |source: io::Error| {
            StorageError::unavailable(format!("cannot list `{}`", dir.display()), source)
        };

        let mut entries = fs::read_dir(dir).await.map_err(unavailable)?;
        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(unavailable)? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }

            let contents = match fs::read_to_string(&path).await {
                Ok(contents) => contents,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable score file");
                    continue;
                }
            };
            match serde_json::from_str::<SavedMatchEntity>(&contents) {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping malformed score file");
                }
            }
        }

        Ok(records)
    }
}

/// Write through a sibling `.tmp` file so a save abandoned midway never leaves a partial
/// record that listings would pick up.
async fn write_atomically(path: &Path, payload: &[u8]) -> StorageResult<()> {
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, payload).await.map_err(|source| {
        StorageError::unavailable(format!("cannot write `{}`", staging.display()), source)
    })?;
    if let Err(source) = fs::rename(&staging, path).await {
        let _ = fs::remove_file(&staging).await;
        return Err(StorageError::unavailable(
            format!("cannot move record to `{}`", path.display()),
            source,
        ));
    }
    Ok(())
}

/// Keep game numbers filesystem-friendly.
fn sanitize(game_number: &str) -> String {
    let cleaned: String = game_number
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "unknown".into()
    } else {
        cleaned
    }
}

impl MatchStore for FileMatchStore {
    fn save_match(&self, record: SavedMatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let dir = self.dir.clone();
        Box::pin(async move {
            let path = dir.join(Self::file_name(&record));
            let payload = serde_json::to_vec_pretty(&record).map_err(|source| {
                StorageError::Corrupted {
                    location: path.display().to_string(),
                    source,
                }
            })?;
            write_atomically(&path, &payload).await?;
            info!(path = %path.display(), game = %record.game_number, "match saved");
            Ok(())
        })
    }

    fn latest_match(
        &self,
        table: Option<TableId>,
    ) -> BoxFuture<'static, StorageResult<Option<SavedMatchEntity>>> {
        let dir = self.dir.clone();
        Box::pin(async move {
            let records = Self::read_all(&dir).await?;
            Ok(newest(records.iter(), table.as_ref()).cloned())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let dir = self.dir.clone();
        Box::pin(async move {
            let metadata = fs::metadata(dir.as_path()).await.map_err(|source| {
                StorageError::unavailable(format!("cannot stat `{}`", dir.display()), source)
            })?;
            if metadata.is_dir() {
                Ok(())
            } else {
                Err(StorageError::unavailable(
                    format!("`{}` is not a directory", dir.display()),
                    io::Error::from(io::ErrorKind::NotADirectory),
                ))
            }
        })
    }
}

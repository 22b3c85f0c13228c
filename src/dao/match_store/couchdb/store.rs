use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, info};

use crate::{
    dao::{
        match_store::{MatchStore, newest},
        models::SavedMatchEntity,
        storage::StorageResult,
    },
    state::match_state::TableId,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{AllDocsResponse, CouchMatchDocument, END_SUFFIX, MATCH_PREFIX},
};

const ALL_DOCS: &str = "_all_docs";

/// Append-only match archive kept in a CouchDB database; one document per save.
#[derive(Clone)]
pub struct CouchMatchStore {
    client: Client,
    database_url: Arc<str>,
    credentials: Option<Arc<(String, String)>>,
}

impl CouchMatchStore {
    /// Build the client and create the database when it does not exist yet.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder().build().map_err(CouchDaoError::Client)?;
        let database_url = format!(
            "{}/{}",
            config.base_url.trim_end_matches('/'),
            config.database
        );

        let store = Self {
            client,
            database_url: Arc::from(database_url),
            credentials: config.credentials.map(Arc::new),
        };
        store.ensure_database().await?;
        info!(database = %config.database, "connected to CouchDB match store");
        Ok(store)
    }

    /// Request against `path` below the database; an empty path targets the database itself.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = if path.is_empty() {
            self.database_url.to_string()
        } else {
            format!("{}/{}", self.database_url, path)
        };
        let builder = self.client.request(method, url);
        match self.credentials.as_deref() {
            Some((user, password)) => builder.basic_auth(user, Some(password)),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, path: &str) -> CouchResult<Response> {
        builder.send().await.map_err(|source| CouchDaoError::Transport {
            path: path.to_string(),
            source,
        })
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let response = self.send(self.request(Method::GET, ""), &self.database_url).await?;
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                debug!(url = %self.database_url, "creating CouchDB database");
                let created = self.send(self.request(Method::PUT, ""), &self.database_url).await?;
                expect_success(created, &self.database_url)
            }
            status => Err(CouchDaoError::Status {
                path: self.database_url.to_string(),
                status,
            }),
        }
    }

    async fn put_document(&self, document: &CouchMatchDocument) -> CouchResult<()> {
        let builder = self.request(Method::PUT, &document.id).json(document);
        let response = self.send(builder, &document.id).await?;
        expect_success(response, &document.id)
    }

    async fn list_matches(&self) -> CouchResult<Vec<SavedMatchEntity>> {
        let query = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{MATCH_PREFIX}\"")),
            ("endkey", format!("\"{MATCH_PREFIX}{END_SUFFIX}\"")),
        ];
        let builder = self.request(Method::GET, ALL_DOCS).query(&query);
        let response = self.send(builder, ALL_DOCS).await?;
        if !response.status().is_success() {
            return Err(CouchDaoError::Status {
                path: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        let payload: AllDocsResponse =
            response
                .json()
                .await
                .map_err(|source| CouchDaoError::Decode {
                    path: ALL_DOCS.to_string(),
                    source,
                })?;

        payload
            .rows
            .into_iter()
            .filter_map(|row| row.doc)
            .map(|doc| {
                serde_json::from_value::<CouchMatchDocument>(doc)
                    .map(|doc| doc.record)
                    .map_err(|source| CouchDaoError::Document {
                        path: ALL_DOCS.to_string(),
                        source,
                    })
            })
            .collect()
    }
}

fn expect_success(response: Response, path: &str) -> CouchResult<()> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(CouchDaoError::Status {
            path: path.to_string(),
            status: response.status(),
        })
    }
}

impl MatchStore for CouchMatchStore {
    fn save_match(&self, record: SavedMatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let document = CouchMatchDocument::from(record);
            store.put_document(&document).await?;
            info!(doc = %document.id, game = %document.record.game_number, "match saved");
            Ok(())
        })
    }

    fn latest_match(
        &self,
        table: Option<TableId>,
    ) -> BoxFuture<'static, StorageResult<Option<SavedMatchEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let records = store.list_matches().await?;
            Ok(newest(records.iter(), table.as_ref()).cloned())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let response = store.send(store.request(Method::GET, ""), &store.database_url).await?;
            expect_success(response, &store.database_url)?;
            Ok(())
        })
    }
}

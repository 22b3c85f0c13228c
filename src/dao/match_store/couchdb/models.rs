use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::dao::models::SavedMatchEntity;

/// Id prefix of match documents.
pub const MATCH_PREFIX: &str = "match::";
/// Upper bound appended to a prefix for `_all_docs` range queries.
pub const END_SUFFIX: &str = "\u{ffff}";

/// Body of an `_all_docs` query.
#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    /// Matching documents.
    pub rows: Vec<AllDocsRow>,
}

/// One row of `_all_docs`.
#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    /// Document id.
    #[allow(dead_code)]
    pub id: String,
    /// Document body, present with `include_docs=true`.
    #[serde(default)]
    pub doc: Option<Value>,
}

/// A saved match as stored in CouchDB; the entity is flattened next to `_id`/`_rev`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchMatchDocument {
    /// `match::<uuid>`.
    #[serde(rename = "_id")]
    pub id: String,
    /// Revision, absent for new documents.
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// The match itself.
    #[serde(flatten)]
    pub record: SavedMatchEntity,
}

impl From<SavedMatchEntity> for CouchMatchDocument {
    fn from(record: SavedMatchEntity) -> Self {
        Self {
            id: match_doc_id(record.id),
            rev: None,
            record,
        }
    }
}

/// Document id of the match `id`.
pub fn match_doc_id(id: Uuid) -> String {
    format!("{}{}", MATCH_PREFIX, id)
}

use std::env;

use super::error::{CouchDaoError, CouchResult};

const DEFAULT_DATABASE: &str = "matches";

/// Where the match archive lives and how to authenticate against it.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Server URL, e.g. `http://127.0.0.1:5984`.
    pub base_url: String,
    /// Database holding the matches.
    pub database: String,
    /// Basic-auth user and password, sent only when both are configured.
    pub credentials: Option<(String, String)>,
}

impl CouchConfig {
    /// Configuration without credentials.
    pub fn new(base_url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            database: database.into(),
            credentials: None,
        }
    }

    /// Read `COUCH_BASE_URL` (required), `COUCH_DB` (default `matches`) and the optional
    /// `COUCH_USERNAME`/`COUCH_PASSWORD` pair.
    pub fn from_env() -> CouchResult<Self> {
        let base_url =
            non_empty_var("COUCH_BASE_URL").ok_or(CouchDaoError::MissingEnv("COUCH_BASE_URL"))?;
        let database = non_empty_var("COUCH_DB").unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        Ok(Self {
            credentials: non_empty_var("COUCH_USERNAME").zip(non_empty_var("COUCH_PASSWORD")),
            ..Self::new(base_url, database)
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

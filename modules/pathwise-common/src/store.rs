// DocumentStore: the only persistence seam. Firestore in production,
// MemoryStore for tests and local runs without a project configured.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use firestore_client::FirestoreClient;
use tracing::{info, warn};

use crate::config::Config;
use crate::types::TIMESTAMP_FIELDS;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document as plain JSON.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Insert if absent, atomically per document. Returns `false` (and
    /// writes nothing) when `id` is already taken.
    async fn create(&self, collection: &str, id: &str, document: Value) -> Result<bool>;

    /// Write the document's top-level fields, merging into any existing one.
    async fn merge(&self, collection: &str, id: &str, document: Value) -> Result<()>;

    fn name(&self) -> &str {
        "unknown"
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        Ok(FirestoreClient::get(self, collection, id)
            .await?
            .map(|doc| doc.to_json()))
    }

    async fn create(&self, collection: &str, id: &str, document: Value) -> Result<bool> {
        Ok(FirestoreClient::create(self, collection, id, &document).await?)
    }

    async fn merge(&self, collection: &str, id: &str, document: Value) -> Result<()> {
        Ok(FirestoreClient::merge(self, collection, id, &document).await?)
    }

    fn name(&self) -> &str {
        "firestore"
    }
}

/// Firestore when `FIRESTORE_PROJECT_ID` is set, otherwise an in-memory
/// store that is lost on exit.
pub fn store_from_config(config: &Config) -> Arc<dyn DocumentStore> {
    match config.firestore_project_id.as_deref() {
        Some(project_id) => {
            info!(project_id, "Using Firestore document store");
            Arc::new(firestore_client(config, project_id))
        }
        None => {
            warn!("FIRESTORE_PROJECT_ID not set, documents are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    }
}

fn firestore_client(config: &Config, project_id: &str) -> FirestoreClient {
    let client = FirestoreClient::new(project_id, config.firestore_token.as_deref())
        .with_timestamp_fields(TIMESTAMP_FIELDS);
    match config.firestore_base_url {
        Some(ref url) => client.with_base_url(url),
        None => client,
    }
}

/// In-process store keyed by `(collection, id)`.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<(String, String), Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `collection`.
    pub fn count(&self, collection: &str) -> usize {
        self.lock()
            .map(|docs| docs.keys().filter(|(c, _)| c == collection).count())
            .unwrap_or(0)
    }

    /// Ids in `collection`, sorted.
    pub fn ids(&self, collection: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .lock()
            .map(|docs| {
                docs.keys()
                    .filter(|(c, _)| c == collection)
                    .map(|(_, id)| id.clone())
                    .collect()
            })
            .unwrap_or_default();
        ids.sort();
        ids
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<(String, String), Value>>> {
        self.documents
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        Ok(self
            .lock()?
            .get(&(collection.to_string(), id.to_string()))
            .cloned())
    }

    async fn create(&self, collection: &str, id: &str, document: Value) -> Result<bool> {
        let mut docs = self.lock()?;
        let key = (collection.to_string(), id.to_string());
        if docs.contains_key(&key) {
            return Ok(false);
        }
        docs.insert(key, document);
        Ok(true)
    }

    async fn merge(&self, collection: &str, id: &str, document: Value) -> Result<()> {
        let Value::Object(fields) = document else {
            return Err(anyhow!("document for {collection}/{id} is not a JSON object"));
        };

        let mut docs = self.lock()?;
        let entry = docs
            .entry((collection.to_string(), id.to_string()))
            .or_insert_with(|| Value::Object(Default::default()));
        if let Value::Object(existing) = entry {
            existing.extend(fields);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

pub mod error;
pub mod types;

pub use error::{FirestoreError, Result};
pub use types::{decode_fields, decode_value, encode_document, encode_fields, encode_value, Document};

use reqwest::StatusCode;
use serde_json::Value;

const BASE_URL: &str = "https://firestore.googleapis.com/v1";

pub struct FirestoreClient {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    /// OAuth access token; the local emulator accepts unauthenticated calls.
    token: Option<String>,
    /// Top-level fields written as `timestampValue`.
    timestamp_fields: Vec<String>,
}

impl FirestoreClient {
    pub fn new(project_id: &str, token: Option<&str>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: BASE_URL.to_string(),
            project_id: project_id.to_string(),
            token: token.map(str::to_owned),
            timestamp_fields: Vec::new(),
        }
    }

    /// Point at a different host, e.g. `http://localhost:8080/v1` for the
    /// local emulator.
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Write these top-level fields as Firestore timestamps whenever they
    /// hold RFC 3339 text.
    pub fn with_timestamp_fields(mut self, fields: &[&str]) -> Self {
        self.timestamp_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn timestamp_fields(&self) -> &[String] {
        &self.timestamp_fields
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.base_url, self.project_id
        )
    }

    fn document_fields(&self, document: &Value) -> Result<serde_json::Map<String, Value>> {
        match document {
            Value::Object(map) => Ok(encode_document(map, &self.timestamp_fields)),
            other => Err(FirestoreError::InvalidDocument(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    /// Send `request` with credentials attached. A response carrying
    /// `expected_miss` comes back as `Ok(None)`; any other non-2xx is an
    /// [`FirestoreError::Api`].
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        expected_miss: Option<StatusCode>,
    ) -> Result<Option<reqwest::Response>> {
        let request = match self.token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;

        match response.status() {
            status if Some(status) == expected_miss => Ok(None),
            status if status.is_success() => Ok(Some(response)),
            status => Err(FirestoreError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// Fetch one document. `Ok(None)` when it does not exist.
    pub async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let url = format!("{}/{collection}/{id}", self.documents_url());
        match self
            .send(self.client.get(&url), Some(StatusCode::NOT_FOUND))
            .await?
        {
            Some(response) => Ok(Some(response.json().await?)),
            None => Ok(None),
        }
    }

    /// Create a document only if `id` is free. Returns `false` when a
    /// document already exists; the existing one is left untouched.
    pub async fn create(&self, collection: &str, id: &str, document: &Value) -> Result<bool> {
        let body = serde_json::json!({ "fields": self.document_fields(document)? });
        let url = format!("{}/{collection}", self.documents_url());
        let request = self
            .client
            .post(&url)
            .query(&[("documentId", id)])
            .json(&body);

        let created = self
            .send(request, Some(StatusCode::CONFLICT))
            .await?
            .is_some();
        if !created {
            tracing::debug!(collection, id, "Document already exists");
        }
        Ok(created)
    }

    /// Write the given top-level fields, merging into any existing document.
    pub async fn merge(&self, collection: &str, id: &str, document: &Value) -> Result<()> {
        let fields = self.document_fields(document)?;
        let url = format!("{}/{collection}/{id}", self.documents_url());
        let mask: Vec<(&str, &str)> = fields
            .keys()
            .map(|k| ("updateMask.fieldPaths", k.as_str()))
            .collect();
        let request = self
            .client
            .patch(&url)
            .query(&mask)
            .json(&serde_json::json!({ "fields": fields }));

        self.send(request, None).await?;
        Ok(())
    }
}

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use pathwise_common::{CollegeRecord, DocumentStore};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub written: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Merge `records` into `collection`, keyed by the dataset id when present
/// and the derived key otherwise. Re-seeding updates fields in place.
pub async fn seed_colleges(
    store: &dyn DocumentStore,
    collection: &str,
    records: &[CollegeRecord],
) -> SeedSummary {
    let mut summary = SeedSummary::default();
    info!(collection, records = records.len(), store = store.name(), "Seeding colleges");

    for record in records {
        let id = record.id.clone().unwrap_or_else(|| record.derived_key());
        match write_record(store, collection, &id, record).await {
            Ok(()) => summary.written += 1,
            Err(e) => {
                warn!(id = %id, error = %e, "Failed to seed college");
                summary.failed += 1;
                summary.errors.push(format!("{id}: {e:#}"));
            }
        }
    }

    info!(
        written = summary.written,
        failed = summary.failed,
        "Seeding finished"
    );
    summary
}

async fn write_record(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
    record: &CollegeRecord,
) -> Result<()> {
    let mut document = serde_json::to_value(record).context("serialize college")?;
    if let Value::Object(ref mut fields) = document {
        fields.insert("updatedAt".to_string(), Value::String(Utc::now().to_rfc3339()));
    }
    store.merge(collection, id, document).await
}

/// Read a seed dataset: a JSON array of college records.
pub fn load_dataset(path: &std::path::Path) -> Result<Vec<CollegeRecord>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
}

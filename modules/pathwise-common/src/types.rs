use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::PathwiseError;

// --- Ownership ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ownership {
    Government,
    Private,
    #[default]
    Unknown,
}

impl Ownership {
    /// Classify free text from a listing ("Private University", "Govt.
    /// College", "Public") by substring. "private" wins over public signals.
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("private") {
            Ownership::Private
        } else if lower.contains("public") || lower.contains("government") || lower.contains("govt")
        {
            Ownership::Government
        } else {
            Ownership::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Ownership::Government => "government",
            Ownership::Private => "private",
            Ownership::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ownership {
    type Err = PathwiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "government" => Ok(Ownership::Government),
            "private" => Ok(Ownership::Private),
            "unknown" => Ok(Ownership::Unknown),
            other => Err(PathwiseError::Validation(format!(
                "unknown ownership '{other}', expected government or private"
            ))),
        }
    }
}

// --- CollegeRecord ---

/// Category used when a listing does not say.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

fn unknown_category() -> String {
    UNKNOWN_CATEGORY.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollegeRecord {
    /// Numeric id from seed datasets. Scraped records are keyed by
    /// [`CollegeRecord::derived_key`] instead.
    #[serde(
        default,
        deserialize_with = "id_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub name: String,
    pub city: String,
    pub state: String,
    #[serde(default = "unknown_category")]
    pub category: String,
    #[serde(default)]
    pub ownership: Ownership,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl CollegeRecord {
    pub fn new(name: impl Into<String>, city: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            city: city.into(),
            state: state.into(),
            category: unknown_category(),
            ownership: Ownership::Unknown,
            website: None,
            aliases: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_ownership(mut self, ownership: Ownership) -> Self {
        self.ownership = ownership;
        self
    }

    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    /// Storage id used for deduplication: `normalized(name)-normalized(city)`.
    pub fn derived_key(&self) -> String {
        format!(
            "{}-{}",
            normalize_key_part(&self.name),
            normalize_key_part(&self.city)
        )
    }

    /// Name, city and state are all present, and name and city each keep
    /// an alphanumeric character after key normalization.
    pub fn is_complete(&self) -> bool {
        has_key_text(&self.name) && has_key_text(&self.city) && !self.state.trim().is_empty()
    }
}

/// Lower-case, collapse whitespace runs to `-`, and drop anything that is
/// neither alphanumeric nor `-` so the result is a valid document id.
pub fn normalize_key_part(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            word.to_lowercase()
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '-')
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn has_key_text(text: &str) -> bool {
    normalize_key_part(text).chars().any(char::is_alphanumeric)
}

fn id_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    }))
}

// --- StoredCollege ---

/// Document fields that hold write times and are stored as timestamps.
pub const TIMESTAMP_FIELDS: &[&str] = &["createdAt", "updatedAt"];

/// A college document as written to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCollege {
    #[serde(flatten)]
    pub record: CollegeRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredCollege {
    pub fn new(record: CollegeRecord, now: DateTime<Utc>) -> Self {
        Self {
            record,
            created_at: now,
            updated_at: now,
        }
    }
}

// --- ScrapeSummary ---

/// Outcome of one acquisition run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeSummary {
    pub total_scraped: usize,
    pub total_inserted: usize,
    pub total_skipped: usize,
    pub errors: Vec<String>,
}

impl ScrapeSummary {
    pub fn record_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

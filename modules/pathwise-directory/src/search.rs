use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use pathwise_common::{CollegeRecord, Ownership, PathwiseError};

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 50;

/// Filters for a directory search. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub state: Option<String>,
    /// `government`, `private` or `unknown`, any case.
    pub ownership: Option<String>,
    pub category: Option<String>,
    /// Substring of name, city or an alias.
    pub query: Option<String>,
    pub limit: Option<usize>,
    /// Offset from a previous page's `nextCursor`.
    pub cursor: Option<usize>,
}

impl SearchQuery {
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub colleges: Vec<CollegeRecord>,
    /// Offset of the next page, `null` once every match has been returned.
    pub next_cursor: Option<usize>,
}

/// Read-only college dataset loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct DirectoryIndex {
    colleges: Vec<CollegeRecord>,
}

impl DirectoryIndex {
    pub fn new(colleges: Vec<CollegeRecord>) -> Self {
        Self { colleges }
    }

    pub fn from_json(json: &str) -> Result<Self, PathwiseError> {
        let colleges: Vec<CollegeRecord> = serde_json::from_str(json)
            .map_err(|e| PathwiseError::Parse(format!("college dataset: {e}")))?;
        Ok(Self::new(colleges))
    }

    pub fn load(path: &Path) -> Result<Self, PathwiseError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            PathwiseError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let index = Self::from_json(&json)?;
        info!(path = %path.display(), colleges = index.len(), "Loaded college dataset");
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.colleges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colleges.is_empty()
    }

    pub fn colleges(&self) -> &[CollegeRecord] {
        &self.colleges
    }

    pub fn search(&self, query: &SearchQuery) -> Result<SearchPage, PathwiseError> {
        let ownership = query
            .ownership
            .as_deref()
            .filter(|o| !o.trim().is_empty())
            .map(str::parse::<Ownership>)
            .transpose()?;
        let offset = query.cursor.unwrap_or(0);
        let limit = query.effective_limit();
        let needle = query
            .query
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());

        let matches: Vec<&CollegeRecord> = self
            .colleges
            .iter()
            .filter(|c| matches_field(&c.state, query.state.as_deref()))
            .filter(|c| matches_field(&c.category, query.category.as_deref()))
            .filter(|c| ownership.map_or(true, |o| c.ownership == o))
            .filter(|c| needle.as_deref().map_or(true, |n| mentions(c, n)))
            .collect();

        let colleges: Vec<CollegeRecord> = matches
            .iter()
            .skip(offset)
            .take(limit)
            .map(|c| (*c).clone())
            .collect();

        let consumed = offset + colleges.len();
        let next_cursor = (consumed < matches.len()).then_some(consumed);

        Ok(SearchPage {
            colleges,
            next_cursor,
        })
    }
}

/// Whole-value, case-insensitive comparison. No filter matches everything.
fn matches_field(value: &str, filter: Option<&str>) -> bool {
    match filter.map(str::trim).filter(|f| !f.is_empty()) {
        Some(filter) => value.trim().eq_ignore_ascii_case(filter),
        None => true,
    }
}

fn mentions(college: &CollegeRecord, needle: &str) -> bool {
    college.name.to_lowercase().contains(needle)
        || college.city.to_lowercase().contains(needle)
        || college
            .aliases
            .iter()
            .any(|alias| alias.to_lowercase().contains(needle))
}

//! Test doubles for the acquisition pipeline. Enabled with the
//! `test-support` feature.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use pathwise_common::{CollegeRecord, DocumentStore, MemoryStore};

use crate::fetcher::{FetchError, PageFetcher};

/// Scripted page responses, consumed in order per page number. The last
/// response for a page repeats, so the same fetcher can drive several runs.
/// Unscripted pages return an empty listing.
#[derive(Default)]
pub struct MockFetcher {
    scripts: Mutex<HashMap<u32, VecDeque<Result<String, FetchError>>>>,
    attempts: Mutex<HashMap<u32, u32>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, page: u32, body: impl Into<String>) -> Self {
        self.push(page, Ok(body.into()))
    }

    pub fn fail(self, page: u32, error: FetchError) -> Self {
        self.push(page, Err(error))
    }

    /// A page listing `records` in the default card markup.
    pub fn listing(self, page: u32, records: &[CollegeRecord]) -> Self {
        self.page(page, listing_html(records))
    }

    fn push(self, page: u32, response: Result<String, FetchError>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(page)
            .or_default()
            .push_back(response);
        self
    }

    /// How many times `page` was requested.
    pub fn attempts(&self, page: u32) -> u32 {
        self.attempts.lock().unwrap().get(&page).copied().unwrap_or(0)
    }

    /// Every page requested at least once, ascending.
    pub fn pages_requested(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = self.attempts.lock().unwrap().keys().copied().collect();
        pages.sort_unstable();
        pages
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, page: u32) -> Result<String, FetchError> {
        *self.attempts.lock().unwrap().entry(page).or_insert(0) += 1;

        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(&page) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_else(|| Ok(empty_listing())),
            Some(queue) => queue.front().cloned().unwrap_or_else(|| Ok(empty_listing())),
            None => Ok(empty_listing()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub fn empty_listing() -> String {
    "<html><body><p>No more colleges.</p></body></html>".to_string()
}

/// Render records as `.college-card` markup understood by
/// [`CardListingParser`](crate::parser::CardListingParser).
pub fn listing_html(records: &[CollegeRecord]) -> String {
    let cards: String = records
        .iter()
        .map(|r| {
            let website = r
                .website
                .as_deref()
                .map(|url| format!(r#"<a class="college-website" href="{url}">Website</a>"#))
                .unwrap_or_default();
            format!(
                r#"<div class="college-card">
  <h3 class="college-name">{}</h3>
  <span class="college-city">{}</span>
  <span class="college-state">{}</span>
  <span class="college-category">{}</span>
  <span class="college-ownership">{}</span>
  {website}
</div>
"#,
                r.name, r.city, r.state, r.category, r.ownership
            )
        })
        .collect();
    format!("<html><body><div class=\"results\">\n{cards}</div></body></html>")
}

/// `count` distinct complete records: "College {offset+i}" in "City {offset+i}".
pub fn sample_records(offset: usize, count: usize) -> Vec<CollegeRecord> {
    (offset..offset + count)
        .map(|i| {
            CollegeRecord::new(format!("College {i}"), format!("City {i}"), "Karnataka")
                .with_category("Engineering")
        })
        .collect()
}

/// A [`MemoryStore`] whose `create` fails for chosen ids.
#[derive(Default)]
pub struct FailingStore {
    pub inner: MemoryStore,
    failing: HashSet<String>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(mut self, id: impl Into<String>) -> Self {
        self.failing.insert(id.into());
        self
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        self.inner.get(collection, id).await
    }

    async fn create(&self, collection: &str, id: &str, document: Value) -> Result<bool> {
        if self.failing.contains(id) {
            return Err(anyhow!("write rejected for {collection}/{id}"));
        }
        self.inner.create(collection, id, document).await
    }

    async fn merge(&self, collection: &str, id: &str, document: Value) -> Result<()> {
        if self.failing.contains(id) {
            return Err(anyhow!("write rejected for {collection}/{id}"));
        }
        self.inner.merge(collection, id, document).await
    }

    fn name(&self) -> &str {
        "failing"
    }
}

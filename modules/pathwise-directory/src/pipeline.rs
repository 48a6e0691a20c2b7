use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, warn};

use pathwise_common::{
    CollegeRecord, Config, DocumentStore, PathwiseError, ScrapeConfig, ScrapeSummary, StoredCollege,
};

use crate::fetcher::{fetch_with_retry, HttpPageFetcher, PageFetcher, RetryPolicy};
use crate::parser::{CardListingParser, DirectoryParser};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Pages `1..=max_pages` are processed at most.
    pub max_pages: u32,
    pub retry: RetryPolicy,
    pub page_delay: Duration,
    pub collection: String,
}

impl PipelineOptions {
    pub fn from_config(scrape: &ScrapeConfig, collection: &str) -> Self {
        Self {
            max_pages: scrape.max_pages,
            retry: RetryPolicy::new(scrape.max_retries, scrape.retry_base),
            page_delay: scrape.page_delay,
            collection: collection.to_string(),
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_config(&ScrapeConfig::default(), "colleges")
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The page parsed to zero records.
    EmptyPage(u32),
    /// The page could not be fetched within the retry budget.
    FetchFailed(u32),
    /// At least one record on the page failed to persist.
    PersistFailed(u32),
    /// Every page up to the ceiling was processed.
    PageCeiling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub summary: ScrapeSummary,
    pub stop: StopReason,
    /// Pages whose records were persisted.
    pub pages_processed: u32,
}

/// Outcome of persisting one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persisted {
    Inserted,
    Skipped,
}

/// Fetch → parse → dedupe/insert, one page at a time.
pub struct AcquisitionPipeline {
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<dyn DirectoryParser>,
    store: Arc<dyn DocumentStore>,
    options: PipelineOptions,
}

impl AcquisitionPipeline {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        parser: Arc<dyn DirectoryParser>,
        store: Arc<dyn DocumentStore>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            fetcher,
            parser,
            store,
            options,
        }
    }

    /// HTTP fetcher and card parser for `SCRAPE_SOURCE_URL`.
    pub fn from_config(config: &Config, store: Arc<dyn DocumentStore>) -> Result<Self, PathwiseError> {
        let source_url = config.scrape.source_url.as_deref().ok_or_else(|| {
            PathwiseError::Config("SCRAPE_SOURCE_URL is not set".to_string())
        })?;
        let fetcher = HttpPageFetcher::new(source_url, &config.scrape.user_agent)
            .map_err(|e| PathwiseError::Config(e.to_string()))?;

        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(CardListingParser::default()),
            store,
            PipelineOptions::from_config(&config.scrape, &config.colleges_collection),
        ))
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// One full run from page 1. Always produces a summary; failures are
    /// recorded in `summary.errors` and end the run.
    pub async fn run(&self) -> RunReport {
        let opts = &self.options;
        let mut summary = ScrapeSummary::default();
        let mut page = 1;

        info!(
            fetcher = self.fetcher.name(),
            parser = self.parser.name(),
            store = self.store.name(),
            max_pages = opts.max_pages,
            "Starting directory acquisition"
        );

        let stop = loop {
            if page > opts.max_pages {
                info!(max_pages = opts.max_pages, "Page ceiling reached");
                break StopReason::PageCeiling;
            }

            let html = match fetch_with_retry(self.fetcher.as_ref(), page, opts.retry).await {
                Ok(html) => html,
                Err(e) => {
                    summary.record_error(format!(
                        "Failed to fetch page {page} after {} attempts: {e}",
                        opts.retry.max_attempts
                    ));
                    break StopReason::FetchFailed(page);
                }
            };

            let records = self.parser.parse(&html);
            if records.is_empty() {
                info!(page, "No records on page, assuming end of listing");
                break StopReason::EmptyPage(page);
            }

            summary.total_scraped += records.len();
            let failed = self.persist_page(page, records, &mut summary).await;

            info!(
                page,
                scraped = summary.total_scraped,
                inserted = summary.total_inserted,
                skipped = summary.total_skipped,
                "Page processed"
            );

            if failed > 0 {
                warn!(page, failed, "Persistence failed, stopping run");
                break StopReason::PersistFailed(page);
            }

            page += 1;
            if page <= opts.max_pages && !opts.page_delay.is_zero() {
                tokio::time::sleep(opts.page_delay).await;
            }
        };

        let pages_processed = match stop {
            StopReason::PageCeiling => opts.max_pages,
            StopReason::PersistFailed(p) => p,
            StopReason::EmptyPage(p) | StopReason::FetchFailed(p) => p - 1,
        };

        info!(
            ?stop,
            pages_processed,
            total_scraped = summary.total_scraped,
            total_inserted = summary.total_inserted,
            total_skipped = summary.total_skipped,
            errors = summary.errors.len(),
            "Directory acquisition finished"
        );

        RunReport {
            summary,
            stop,
            pages_processed,
        }
    }

    /// Persist a page's records concurrently, tallying each outcome.
    /// Returns how many records failed.
    async fn persist_page(
        &self,
        page: u32,
        records: Vec<CollegeRecord>,
        summary: &mut ScrapeSummary,
    ) -> usize {
        let keys: Vec<String> = records.iter().map(CollegeRecord::derived_key).collect();
        let results = join_all(records.into_iter().map(|record| self.persist(record))).await;

        let mut failed = 0;
        for (key, result) in keys.into_iter().zip(results) {
            match result {
                Ok(Persisted::Inserted) => summary.total_inserted += 1,
                Ok(Persisted::Skipped) => summary.total_skipped += 1,
                Err(e) => {
                    failed += 1;
                    summary.record_error(format!("Failed to persist {key} from page {page}: {e:#}"));
                }
            }
        }
        failed
    }

    /// Insert `record` under its derived key unless a document already exists.
    pub async fn persist(&self, record: CollegeRecord) -> Result<Persisted> {
        if !record.is_complete() {
            bail!("record '{}' in '{}' has no usable name or city", record.name, record.city);
        }
        let collection = &self.options.collection;
        let key = record.derived_key();

        if self.store.get(collection, &key).await?.is_some() {
            debug!(key = %key, "College already stored, skipping");
            return Ok(Persisted::Skipped);
        }

        let document = serde_json::to_value(StoredCollege::new(record, Utc::now()))?;
        if self.store.create(collection, &key, document).await? {
            debug!(key = %key, "College inserted");
            Ok(Persisted::Inserted)
        } else {
            // Lost a race with a concurrent writer.
            debug!(key = %key, "College created concurrently, skipping");
            Ok(Persisted::Skipped)
        }
    }
}

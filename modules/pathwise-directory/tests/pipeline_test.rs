//! Acquisition pipeline runs against a scripted listing and in-memory store.

use std::sync::Arc;
use std::time::Duration;

use pathwise_common::{DocumentStore, MemoryStore};
use pathwise_directory::testing::{sample_records, FailingStore, MockFetcher};
use pathwise_directory::{
    AcquisitionPipeline, CardListingParser, FetchError, PipelineOptions, RetryPolicy, StopReason,
};

const COLLECTION: &str = "colleges";

fn options(max_pages: u32) -> PipelineOptions {
    PipelineOptions {
        max_pages,
        retry: RetryPolicy::new(3, Duration::ZERO),
        page_delay: Duration::ZERO,
        collection: COLLECTION.to_string(),
    }
}

fn pipeline(
    fetcher: Arc<MockFetcher>,
    store: Arc<dyn DocumentStore>,
    max_pages: u32,
) -> AcquisitionPipeline {
    AcquisitionPipeline::new(
        fetcher,
        Arc::new(CardListingParser::default()),
        store,
        options(max_pages),
    )
}

#[tokio::test]
async fn twenty_new_records_then_rerun_skips_all() {
    let fetcher = Arc::new(MockFetcher::new().listing(1, &sample_records(0, 20)));
    let store = Arc::new(MemoryStore::new());

    let first = pipeline(fetcher.clone(), store.clone(), 50).run().await;
    assert_eq!(first.summary.total_scraped, 20);
    assert_eq!(first.summary.total_inserted, 20);
    assert_eq!(first.summary.total_skipped, 0);
    assert!(first.summary.is_clean());
    assert_eq!(first.stop, StopReason::EmptyPage(2));

    let second = pipeline(fetcher, store.clone(), 50).run().await;
    assert_eq!(second.summary.total_scraped, 20);
    assert_eq!(second.summary.total_inserted, 0);
    assert_eq!(second.summary.total_skipped, 20);

    assert_eq!(store.count(COLLECTION), 20);
}

#[tokio::test]
async fn same_record_across_runs_is_stored_once() {
    let record = sample_records(7, 1);
    let store = Arc::new(MemoryStore::new());

    let run_a = pipeline(Arc::new(MockFetcher::new().listing(1, &record)), store.clone(), 5)
        .run()
        .await;
    let run_b = pipeline(Arc::new(MockFetcher::new().listing(1, &record)), store.clone(), 5)
        .run()
        .await;

    assert_eq!(run_a.summary.total_inserted, 1);
    assert_eq!(run_b.summary.total_inserted, 0);
    assert_eq!(run_b.summary.total_skipped, 1);
    assert_eq!(store.ids(COLLECTION), vec!["college-7-city-7"]);
}

#[tokio::test]
async fn empty_third_page_ends_the_run() {
    let fetcher = Arc::new(
        MockFetcher::new()
            .listing(1, &sample_records(0, 5))
            .listing(2, &sample_records(5, 3))
            .page(3, "<html><body><div class=\"results\"></div></body></html>")
            .listing(4, &sample_records(8, 4)),
    );
    let store = Arc::new(MemoryStore::new());

    let report = pipeline(fetcher.clone(), store.clone(), 50).run().await;

    assert_eq!(report.summary.total_scraped, 8);
    assert_eq!(report.summary.total_inserted, 8);
    assert_eq!(report.stop, StopReason::EmptyPage(3));
    assert_eq!(report.pages_processed, 2);
    assert_eq!(fetcher.pages_requested(), vec![1, 2, 3]);
    assert_eq!(store.count(COLLECTION), 8);
}

#[tokio::test]
async fn fetch_exhaustion_on_page_two_stops_with_error() {
    let down = || FetchError::Status {
        status: 503,
        url: "https://listing.test/colleges?page=2".to_string(),
    };
    let fetcher = Arc::new(
        MockFetcher::new()
            .listing(1, &sample_records(0, 4))
            .fail(2, down())
            .fail(2, down())
            .fail(2, down())
            .listing(2, &sample_records(4, 4))
            .listing(3, &sample_records(8, 4)),
    );
    let store = Arc::new(MemoryStore::new());

    let report = pipeline(fetcher.clone(), store.clone(), 50).run().await;

    assert_eq!(report.stop, StopReason::FetchFailed(2));
    assert_eq!(report.summary.total_scraped, 4);
    assert_eq!(report.summary.errors.len(), 1);
    assert!(report.summary.errors[0].contains("page 2"));
    assert_eq!(fetcher.attempts(2), 3);
    assert_eq!(fetcher.attempts(3), 0);
    assert_eq!(store.count(COLLECTION), 4);
}

#[tokio::test]
async fn transient_fetch_failure_is_retried() {
    let fetcher = Arc::new(
        MockFetcher::new()
            .fail(1, FetchError::Http("connection reset".into()))
            .listing(1, &sample_records(0, 2)),
    );

    let report = pipeline(fetcher.clone(), Arc::new(MemoryStore::new()), 1)
        .run()
        .await;

    assert!(report.summary.is_clean());
    assert_eq!(report.summary.total_inserted, 2);
    assert_eq!(fetcher.attempts(1), 2);
}

#[tokio::test]
async fn page_ceiling_limits_the_run() {
    let fetcher = Arc::new(
        MockFetcher::new()
            .listing(1, &sample_records(0, 2))
            .listing(2, &sample_records(2, 2))
            .listing(3, &sample_records(4, 2)),
    );

    let report = pipeline(fetcher.clone(), Arc::new(MemoryStore::new()), 2)
        .run()
        .await;

    assert_eq!(report.stop, StopReason::PageCeiling);
    assert_eq!(report.pages_processed, 2);
    assert_eq!(report.summary.total_scraped, 4);
    assert_eq!(fetcher.pages_requested(), vec![1, 2]);
}

#[tokio::test]
async fn failed_record_does_not_mask_siblings() {
    let fetcher = Arc::new(
        MockFetcher::new()
            .listing(1, &sample_records(0, 5))
            .listing(2, &sample_records(5, 5)),
    );
    let store = Arc::new(FailingStore::new().fail_on("college-2-city-2"));

    let report = pipeline(fetcher.clone(), store.clone(), 50).run().await;

    assert_eq!(report.stop, StopReason::PersistFailed(1));
    assert_eq!(report.summary.total_scraped, 5);
    assert_eq!(report.summary.total_inserted, 4);
    assert_eq!(report.summary.total_skipped, 0);
    assert_eq!(report.summary.errors.len(), 1);
    assert!(report.summary.errors[0].contains("college-2-city-2"));
    assert_eq!(fetcher.attempts(2), 0);
    assert_eq!(store.inner.count(COLLECTION), 4);
}

#[tokio::test]
async fn incomplete_cards_are_not_counted() {
    let html = r#"<html><body>
        <div class="college-card"><h3 class="college-name">Hansraj College</h3>
          <span class="college-city">Delhi</span><span class="college-state">Delhi</span></div>
        <div class="college-card"><h3 class="college-name">Nameless City</h3></div>
    </body></html>"#;
    let fetcher = Arc::new(MockFetcher::new().page(1, html));

    let report = pipeline(fetcher, Arc::new(MemoryStore::new()), 1).run().await;

    assert_eq!(report.summary.total_scraped, 1);
    assert_eq!(report.summary.total_inserted, 1);
}

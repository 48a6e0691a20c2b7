pub mod fetcher;
pub mod parser;
pub mod pipeline;
pub mod search;
pub mod seed;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use fetcher::{FetchError, HttpPageFetcher, PageFetcher, RetryPolicy};
pub use parser::{CardListingParser, DirectoryParser, ListingSelectors};
pub use pipeline::{AcquisitionPipeline, Persisted, PipelineOptions, RunReport, StopReason};
pub use search::{DirectoryIndex, SearchPage, SearchQuery};
pub use seed::{load_dataset, seed_colleges, SeedSummary};

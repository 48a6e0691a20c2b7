pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use config::{Config, ScrapeConfig};
pub use error::PathwiseError;
pub use store::{store_from_config, DocumentStore, MemoryStore};
pub use types::*;

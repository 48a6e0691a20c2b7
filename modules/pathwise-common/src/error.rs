use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathwiseError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<firestore_client::FirestoreError> for PathwiseError {
    fn from(err: firestore_client::FirestoreError) -> Self {
        PathwiseError::Store(err.to_string())
    }
}

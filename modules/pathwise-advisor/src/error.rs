use ai_client::DispatchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Failed to save career plan: {0}")]
    Store(String),
}

impl AdvisorError {
    /// Every candidate model was rate limited or unavailable.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, AdvisorError::Dispatch(DispatchError::Exhausted { .. }))
    }
}

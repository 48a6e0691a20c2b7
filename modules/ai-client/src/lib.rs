pub mod dispatch;
pub mod error;
pub mod openai;
pub mod template;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod util;

pub use dispatch::{
    classify, AttemptOutcome, DispatchError, Dispatched, Dispatcher, FailureKind, ModelAttempt,
    ModelRotation, PromptRequest, PromptSpec,
};
pub use error::AiError;
pub use openai::{OpenAi, StructuredOutput};
pub use traits::{Message, MessageRole, ModelBackend};
pub use util::{strip_code_blocks, truncate_to_char_boundary};

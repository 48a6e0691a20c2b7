use crate::error::AiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Rate limiting, server error, or quota exhaustion. Try the next model.
    Retryable,
    /// Anything else. Surface to the caller.
    Fatal,
}

/// Decide whether a backend failure is worth retrying on another model.
///
/// A reported HTTP status always wins: 429 and 5xx are retryable, every other
/// status is fatal. Errors without a status fall back to message matching on
/// "429" and "quota".
pub fn classify(error: &AiError) -> FailureKind {
    match error {
        AiError::Api { status, .. } => classify_status(*status),
        AiError::Network(message) | AiError::Other(message) => classify_message(message),
        AiError::Config(_) | AiError::Parse(_) => FailureKind::Fatal,
    }
}

fn classify_status(status: u16) -> FailureKind {
    if status == 429 || status >= 500 {
        FailureKind::Retryable
    } else {
        FailureKind::Fatal
    }
}

fn classify_message(message: &str) -> FailureKind {
    let lower = message.to_lowercase();
    if lower.contains("429") || lower.contains("quota") {
        FailureKind::Retryable
    } else {
        FailureKind::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_and_server_errors_are_retryable() {
        assert_eq!(classify(&AiError::api(429, "slow down")), FailureKind::Retryable);
        assert_eq!(classify(&AiError::api(500, "boom")), FailureKind::Retryable);
        assert_eq!(classify(&AiError::api(503, "unavailable")), FailureKind::Retryable);
    }

    #[test]
    fn client_errors_are_fatal_even_with_quota_text() {
        assert_eq!(classify(&AiError::api(400, "bad request")), FailureKind::Fatal);
        assert_eq!(classify(&AiError::api(403, "quota project not set")), FailureKind::Fatal);
    }

    #[test]
    fn untyped_errors_fall_back_to_message() {
        assert_eq!(
            classify(&AiError::Other("Resource has been exhausted (e.g. check quota).".into())),
            FailureKind::Retryable
        );
        assert_eq!(
            classify(&AiError::Network("upstream said 429".into())),
            FailureKind::Retryable
        );
        assert_eq!(
            classify(&AiError::Network("connection reset".into())),
            FailureKind::Fatal
        );
    }

    #[test]
    fn parse_and_config_errors_are_fatal() {
        assert_eq!(classify(&AiError::Parse("quota".into())), FailureKind::Fatal);
        assert_eq!(classify(&AiError::Config("missing key".into())), FailureKind::Fatal);
    }
}

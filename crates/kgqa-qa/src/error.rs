use kgqa_store::StoreError;

/// Failures talking to the language model service.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("failed to reach model service at {url} (is it running?): {message}")]
    Unreachable { url: String, message: String },
    #[error("model service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("model request timed out after {secs}s")]
    Timeout { secs: u64 },
    #[error("model returned an unusable response: {0}")]
    InvalidResponse(String),
    #[error("invalid model configuration: {0}")]
    Config(String),
}

impl LlmError {
    /// Transport-level failures worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Unreachable { .. } | LlmError::Timeout { .. } => true,
            LlmError::Http { status, .. } => *status == 429 || *status >= 500,
            LlmError::InvalidResponse(_) | LlmError::Config(_) => false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QaError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("question timed out after {secs}s")]
    Timeout { secs: u64 },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid question file: {0}")]
    QuestionFile(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(LlmError::Timeout { secs: 1 }.is_transient());
        assert!(LlmError::Http { status: 503, body: String::new() }.is_transient());
        assert!(LlmError::Http { status: 429, body: String::new() }.is_transient());
        assert!(!LlmError::Http { status: 404, body: String::new() }.is_transient());
        assert!(!LlmError::InvalidResponse("x".into()).is_transient());
    }
}

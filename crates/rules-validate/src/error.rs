use rules_common::Span;
use std::fmt;

/// A single non-fatal semantic finding (§4.3). The validator never throws;
/// callers collect the whole list before deciding whether to proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
    pub span: Span,
}

impl ValidationError {
    pub fn new(code: &'static str, message: impl Into<String>, span: Span) -> Self {
        ValidationError { code, message: message.into(), span }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

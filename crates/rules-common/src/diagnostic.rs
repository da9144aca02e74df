//! The common diagnostic carrier shared by lexer, parser, and validator
//! errors. Wire codes are stable strings (§6.3 of the rules engine spec).

use crate::span::SourceLocation;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub message: String,
    pub location: SourceLocation,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    pub fn new(code: impl Into<String>, message: impl Into<String>, location: SourceLocation) -> Self {
        Diagnostic {
            code: code.into(),
            message: message.into(),
            location,
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} at line {}, column {}",
            self.code, self.message, self.location.line, self.location.column
        )
    }
}

impl std::error::Error for Diagnostic {}

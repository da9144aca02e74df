use rules_common::Span;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    EmptySource,
    Lex(String, String), // (wrapped LEX_00N code, message)
    Unexpected { expected: String, found: String },
    Validation(String),
}

impl ParseError {
    pub fn empty_source(span: Span) -> Self {
        ParseError { kind: ParseErrorKind::EmptySource, span, suggestions: vec![] }
    }

    pub fn unexpected(expected: impl Into<String>, found: impl Into<String>, span: Span) -> Self {
        ParseError {
            kind: ParseErrorKind::Unexpected { expected: expected.into(), found: found.into() },
            span,
            suggestions: vec![],
        }
    }

    pub fn validation(message: impl Into<String>, span: Span) -> Self {
        ParseError { kind: ParseErrorKind::Validation(message.into()), span, suggestions: vec![] }
    }

    pub fn from_lex(code: &str, message: String, span: Span) -> Self {
        ParseError { kind: ParseErrorKind::Lex(code.to_string(), message), span, suggestions: vec![] }
    }

    pub fn code(&self) -> String {
        match &self.kind {
            ParseErrorKind::EmptySource => "PARSE_EMPTY_SOURCE".to_string(),
            ParseErrorKind::Lex(code, _) => format!("PARSE_{code}"),
            ParseErrorKind::Unexpected { .. } => "PARSE_UNEXPECTED".to_string(),
            ParseErrorKind::Validation(_) => "PARSE_VALIDATION_001".to_string(),
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ParseErrorKind::EmptySource => write!(f, "source is empty"),
            ParseErrorKind::Lex(_, msg) => write!(f, "{msg}"),
            ParseErrorKind::Unexpected { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            ParseErrorKind::Validation(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ParseError {}

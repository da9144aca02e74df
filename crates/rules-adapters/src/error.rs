//! The one place in this codebase that reaches for `thiserror`: adapter
//! failures cross a process/network boundary and need to carry a source
//! error without the engine's own span-carrying diagnostics machinery.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdaptersError {
    #[error("http request to '{url}' failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("http request to '{url}' returned status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("json-path query '{path}' failed: {reason}")]
    JsonPath { path: String, reason: String },

    #[error("cache file '{path}' could not be read or written: {source}")]
    CacheIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("function '{name}' received the wrong argument count: expected {expected}, got {got}")]
    ArgCount { name: String, expected: String, got: usize },

    #[error("function '{name}' received an argument of the wrong type: {reason}")]
    ArgType { name: String, reason: String },
}

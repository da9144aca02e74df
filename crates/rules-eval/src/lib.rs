//! Evaluates a parsed rules document against an environment (§4.4).
//!
//! This crate depends only on the [`adapters`] traits for constants,
//! functions, caching, and auditing; `rules-adapters` supplies concrete
//! implementations.

pub mod adapters;
pub mod decimal;
pub mod environment;
pub mod error;
mod eval;
mod opcode;
pub mod predicates;

pub use environment::Environment;
pub use error::EvalError;
pub use eval::{evaluate_document, EvalConfig, EvalResult};

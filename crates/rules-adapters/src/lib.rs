//! Concrete `ConstantsProvider`/`FunctionRegistry`/`CacheProvider`/`AuditSink`
//! implementations for `rules-eval`'s adapter traits.

pub mod audit;
pub mod cache;
pub mod caching_registry;
pub mod constants;
pub mod error;
pub mod functions;
pub mod json_bridge;

pub use audit::TracingAuditSink;
pub use cache::{FileCache, MemoryCache};
pub use caching_registry::CachingFunctionRegistry;
pub use constants::StaticConstantsProvider;
pub use error::AdaptersError;
pub use functions::BuiltinFunctionRegistry;

//! Adapter trait contracts (§4.5). `rules-eval` depends only on these
//! traits; concrete implementations live in `rules-adapters` so the
//! evaluator stays testable against fakes.

use crate::error::EvalError;
use rules_common::Value;
use rustc_hash::FxHashMap;
use std::time::Duration;

/// Resolves constant codes to values at the start of evaluation. The
/// evaluator blocks on this exactly once per document run (§4.5).
pub trait ConstantsProvider {
    fn resolve(&self, codes: &[String]) -> FxHashMap<String, Value>;
}

/// Invokes named built-in or user-registered functions (§4.5).
pub trait FunctionRegistry {
    fn exists(&self, name: &str) -> bool;
    fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, EvalError>;
}

/// Memoizes parsed ASTs (or any keyed blob) with a TTL (§4.5, §2 of
/// SPEC_FULL.md: two concrete backends implement this one trait).
pub trait CacheProvider {
    fn get(&self, key: &str) -> Option<Value>;
    fn put(&self, key: &str, value: Value, ttl: Duration);
    fn evict(&self, key: &str);
    fn clear(&self);
    fn stats(&self) -> CacheStats;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub approximate_size: u64,
}

/// Fire-and-forget audit event recording; failures are logged, never
/// propagated (§4.5).
pub trait AuditSink {
    fn record(&self, event: AuditEvent);
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    pub rule_name: Option<String>,
    pub success: bool,
    pub condition_result: bool,
    pub circuit_breaker_triggered: bool,
}

/// An `AuditSink` that drops every event, for callers with no audit
/// backend wired up.
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: AuditEvent) {}
}

//! An `AuditSink` that emits structured `tracing` events. Failures to record
//! (there are none here — tracing never fails) are not a concern, but the
//! trait's fire-and-forget contract means a sink backed by a network call
//! would swallow its own errors the same way.

use rules_eval::adapters::{AuditEvent, AuditSink};

pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        tracing::info!(
            rule = event.rule_name.as_deref().unwrap_or("<unnamed>"),
            success = event.success,
            condition_result = event.condition_result,
            circuit_breaker_triggered = event.circuit_breaker_triggered,
            "rule evaluated"
        );
    }
}

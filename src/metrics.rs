//! Process-wide counters and tracing spans.
//!
//! [`METRICS`] counts the work done by the grammar decoder, the query
//! compilers and key inference. With the `tracing` feature the same places
//! enter the spans built by [`tracing_helpers`].

use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};

pub static METRICS: Lazy<CoreMetrics> = Lazy::new(CoreMetrics::default);

#[derive(Debug, Default)]
pub struct CoreMetrics {
    entities_decoded: AtomicU64,
    decode_failures: AtomicU64,
    queries_compiled: AtomicU64,
    keys_resolved: AtomicU64,
}

/// Point-in-time copy of [`CoreMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub entities_decoded: u64,
    pub decode_failures: u64,
    pub queries_compiled: u64,
    pub keys_resolved: u64,
}

impl CoreMetrics {
    pub fn record_decode(&self, ok: bool) {
        if ok {
            self.entities_decoded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.decode_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_compile(&self) {
        self.queries_compiled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_key_resolution(&self) {
        self.keys_resolved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            entities_decoded: self.entities_decoded.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            queries_compiled: self.queries_compiled.load(Ordering::Relaxed),
            keys_resolved: self.keys_resolved.load(Ordering::Relaxed),
        }
    }
}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::{debug_span, Span};

    /// Span around decoding one grammar payload
    pub fn decode_span(entity_name: &str) -> Span {
        debug_span!("datacore.decode", entity = %entity_name)
    }

    /// Span around compiling a query; `target` is `odata` or `sql`
    pub fn compile_span(entity_name: &str, target: &'static str) -> Span {
        debug_span!("datacore.compile", entity = %entity_name, target)
    }

    /// Span around primary/parent key inference for a table
    pub fn resolve_key_span(table: &str) -> Span {
        debug_span!("datacore.resolve_key", table = %table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = CoreMetrics::default();
        metrics.record_decode(true);
        metrics.record_decode(false);
        metrics.record_compile();
        let snap = metrics.snapshot();
        assert_eq!(snap.entities_decoded, 1);
        assert_eq!(snap.decode_failures, 1);
        assert_eq!(snap.queries_compiled, 1);
        assert_eq!(snap.keys_resolved, 0);
    }
}

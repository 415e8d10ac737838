/*!
 * Invocation Tracing
 * Structured tracing for unit invocations using the tracing crate
 *
 * Features:
 * - Trace ID per top-level invocation for correlating nested calls
 * - JSON-formatted logs for structured parsing
 * - Outcome and duration recorded on every invocation span
 */

use crate::core::id::UnitId;
use std::time::Instant;
use tracing::{debug, field, info, span, warn, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Invocations slower than this are reported at `warn`
const SLOW_INVOCATION_MS: u128 = 100;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - CONFINE_TRACE_JSON: Enable JSON output (default: false)
///
/// Calling this again after a subscriber is installed is a no-op.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("CONFINE_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    };

    if installed.is_ok() {
        debug!(json = use_json, "structured tracing initialized");
    }
}

/// Generate a unique trace ID for invocation correlation
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering one unit invocation
///
/// Top-level invocations open an `info` span with a fresh trace id; nested
/// ones open a `debug` span and inherit the trace id through span context.
pub struct InvocationSpan {
    span: Span,
    start: Instant,
    unit: UnitId,
    trace_id: Option<String>,
}

impl InvocationSpan {
    pub fn new(unit: UnitId, name: &str, depth: usize) -> Self {
        let (span, trace_id) = if depth == 0 {
            let trace_id = generate_trace_id();
            let span = span!(
                Level::INFO,
                "invoke",
                trace_id = %trace_id,
                unit = %unit,
                unit_name = name,
                depth,
                outcome = field::Empty,
            );
            (span, Some(trace_id))
        } else {
            let span = span!(
                Level::DEBUG,
                "invoke",
                unit = %unit,
                unit_name = name,
                depth,
                outcome = field::Empty,
            );
            (span, None)
        };

        Self {
            span,
            start: Instant::now(),
            unit,
            trace_id,
        }
    }

    /// Trace id, present on top-level invocations only
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    /// Record how the invocation ended
    pub fn record_outcome(&self, outcome: &str) {
        self.span.record("outcome", outcome);
    }
}

impl Drop for InvocationSpan {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let _entered = self.span.enter();

        if elapsed.as_millis() > SLOW_INVOCATION_MS {
            warn!(
                unit = %self.unit,
                duration_ms = elapsed.as_millis(),
                slow = true,
                "slow invocation"
            );
        } else if self.trace_id.is_some() {
            info!(
                unit = %self.unit,
                duration_us = elapsed.as_micros(),
                "invocation completed"
            );
        } else {
            debug!(
                unit = %self.unit,
                duration_us = elapsed.as_micros(),
                "invocation completed"
            );
        }
    }
}

/*!
 * Monitoring Module
 * Tracing setup and invocation spans
 */

pub mod tracer;

pub use tracer::{generate_trace_id, init_tracing, InvocationSpan};

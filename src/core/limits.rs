/*!
 * Engine Limits and Constants
 *
 * Centralized location for bounds enforced by the confinement engine.
 * Security-critical constants are marked with [SECURITY].
 */

use std::time::Duration;

// =============================================================================
// CALL PATH
// =============================================================================

/// Maximum nesting of confined invocations on one thread
/// [SECURITY] Runaway recursion through `call` fails instead of overflowing the native stack
pub const MAX_CALL_DEPTH: usize = 256;

/// Initial capacity reserved for a thread's call path
pub const CALL_PATH_INITIAL_CAPACITY: usize = 16;

// =============================================================================
// SCRIPT COMPILER
// =============================================================================

/// Maximum expression nesting accepted by the script parser
/// [SECURITY] Parsing and evaluation recurse per level; deeper source is a compile error
pub const MAX_NESTING: usize = 64;

// =============================================================================
// SECURITY & AUDIT
// =============================================================================

/// Maximum audit events stored globally (10,000 events)
/// [SECURITY] Prevents audit log from consuming excessive memory
pub const MAX_AUDIT_EVENTS: usize = 10_000;

/// Maximum audit events kept per code unit (100 events)
pub const MAX_AUDIT_EVENTS_PER_UNIT: usize = 100;

// =============================================================================
// HOST OPERATIONS
// =============================================================================

/// Timeout applied to `connect` from confined code
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum bytes returned by `read_file` to a unit (1MB)
pub const MAX_READ_BYTES: u64 = 1024 * 1024;

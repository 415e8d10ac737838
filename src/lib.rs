/*!
 * Confinement Engine Library
 * Runs dynamically compiled code units under explicit capability grants
 *
 * A unit confined to a grant can only perform the sensitive operations its
 * grant names, and so can everything it calls. Units with no grant run with
 * ambient trust.
 */

pub mod core;
pub mod monitoring;
pub mod permissions;
pub mod runtime;
pub mod sandbox;
pub mod script;
pub mod security;

// Re-exports
pub use crate::core::{
    AccessDenied, CompileError, CompileResult, ConfigError, ConfineError, EngineConfig,
    ExecError, ExecResult, UnitId,
};
pub use monitoring::init_tracing;
pub use permissions::{Action, AuditLogger, ConfinementRegistry, DefaultPolicy, Policy};
pub use runtime::{CodeUnit, Compiler, Context, Entry, Value};
pub use sandbox::{Sandbox, SandboxStats};
pub use script::ScriptCompiler;
pub use security::{CapabilitySet, Permission};

/*!
 * Permissions Module
 * Confinement registry, call-path inspection, policy and audit
 *
 * ## Usage
 * ```ignore
 * use confine_engine::permissions::{AccessChecker, Action, ConfinementRegistry, DefaultPolicy};
 *
 * let registry = Arc::new(ConfinementRegistry::new());
 * registry.confine(unit.id(), CapabilitySet::NONE);
 *
 * let checker = AccessChecker::new(registry, Arc::new(DefaultPolicy), Arc::new(AuditLogger::new()));
 * checker.check_action(Action::DeleteFile)?;
 * ```
 */

pub mod audit;
pub mod call_path;
pub mod checker;
pub mod policy;
pub mod registry;
pub mod traits;

// Re-export commonly used items
pub use audit::{AuditEvent, AuditLogger, AuditSeverity, AuditStats};
pub use call_path::{Frame, FrameGuard};
pub use checker::AccessChecker;
pub use policy::{Action, DefaultPolicy, Policy, StrictPolicy};
pub use registry::{ConfinementRegistry, RegistrySnapshot, RegistryStats};
pub use traits::PermissionChecker;

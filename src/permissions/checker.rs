/*!
 * Access Checker
 * Decides whether the current thread's call path may perform an action
 *
 * The effective grant is the intersection of the grants of every confined
 * frame on the path. Unconfined frames contribute nothing, so trust can only
 * shrink as a call crosses confined boundaries; calling a less restricted
 * helper never widens it.
 */

use super::audit::{AuditEvent, AuditLogger};
use super::call_path::{self, Frame};
use super::policy::{Action, Policy};
use super::registry::{ConfinementRegistry, RegistrySnapshot};
use super::traits::PermissionChecker;
use crate::security::{AccessDenied, CapabilitySet};
use std::sync::Arc;
use tracing::{trace, warn};

/// Access checker bound to one registry and policy
#[derive(Clone)]
pub struct AccessChecker {
    registry: Arc<ConfinementRegistry>,
    policy: Arc<dyn Policy>,
    audit: Arc<AuditLogger>,
    audit_allowed: bool,
}

impl AccessChecker {
    pub fn new(
        registry: Arc<ConfinementRegistry>,
        policy: Arc<dyn Policy>,
        audit: Arc<AuditLogger>,
    ) -> Self {
        Self {
            registry,
            policy,
            audit,
            audit_allowed: false,
        }
    }

    /// Also record allowed checks in the audit log
    #[must_use]
    pub fn with_audit_allowed(mut self, enabled: bool) -> Self {
        self.audit_allowed = enabled;
        self
    }

    pub fn policy(&self) -> &dyn Policy {
        self.policy.as_ref()
    }

    /// Evaluate `required` against the current path without side effects
    pub fn evaluate(&self, required: CapabilitySet) -> Result<CapabilitySet, AccessDenied> {
        let records = self.registry.snapshot();
        call_path::with_path(|frames| evaluate_path(frames, &records, required))
    }

    /// Gate an action: look up what it requires and check the current path
    ///
    /// Non-sensitive actions return immediately without consulting the path.
    /// A denial is latched on the innermost frame so the invocation fails
    /// even if unit code discards the returned error.
    pub fn check_action(&self, action: Action) -> Result<(), AccessDenied> {
        let required = self.policy.requirements(action);
        if required.is_empty() {
            return Ok(());
        }

        match self.evaluate(required) {
            Ok(_) => {
                trace!(action = %action, required = %required, "access granted");
                if self.audit_allowed {
                    self.audit.log(AuditEvent::allowed(
                        action,
                        required,
                        call_path::current_unit(),
                    ));
                }
                Ok(())
            }
            Err(denial) => {
                warn!(
                    action = %action,
                    permission = %denial.permission,
                    unit = %denial.unit,
                    unit_name = %denial.unit_name,
                    "access denied"
                );
                call_path::latch(&denial);
                self.audit.log(AuditEvent::denied(action, required, &denial));
                Err(denial)
            }
        }
    }

    /// Effective grant of the current path
    pub fn effective(&self) -> CapabilitySet {
        let records = self.registry.snapshot();
        call_path::with_path(|frames| effective_grant(frames, &records))
    }
}

impl PermissionChecker for AccessChecker {
    fn check(&self, action: Action) -> Result<(), AccessDenied> {
        self.check_action(action)
    }

    fn effective_grant(&self) -> CapabilitySet {
        self.effective()
    }
}

/// Intersection of every registered grant on the path
pub fn effective_grant(frames: &[Frame], records: &RegistrySnapshot) -> CapabilitySet {
    frames
        .iter()
        .filter_map(|frame| records.lookup(frame.unit))
        .fold(CapabilitySet::ALL, CapabilitySet::intersect)
}

/// Walk `frames` innermost first and decide `required`
///
/// On denial the culprit is the innermost frame whose own grant lacks the
/// permission the denial reports.
pub fn evaluate_path(
    frames: &[Frame],
    records: &RegistrySnapshot,
    required: CapabilitySet,
) -> Result<CapabilitySet, AccessDenied> {
    let effective = effective_grant(frames, records);
    let missing = required.difference(effective);
    let Some(reported) = missing.first() else {
        return Ok(effective);
    };

    // Some frame's grant removed `reported`; the innermost frame is only a fallback.
    let culprit = frames
        .iter()
        .rev()
        .find(|frame| {
            records
                .lookup(frame.unit)
                .is_some_and(|grant| !grant.implies(reported))
        })
        .or_else(|| frames.last());

    match culprit {
        Some(frame) => Err(AccessDenied::new(missing, frame.unit, &*frame.name)),
        None => Ok(effective),
    }
}

/*!
 * Permission Traits
 * Interfaces for access checking
 */

use super::policy::Action;
use crate::security::{AccessDenied, CapabilitySet};

/// Core access checking interface
pub trait PermissionChecker: Send + Sync {
    /// Check whether the current call path may perform `action`
    fn check(&self, action: Action) -> Result<(), AccessDenied>;

    /// Effective grant of the current call path
    fn effective_grant(&self) -> CapabilitySet;

    /// Batch check multiple actions
    fn check_batch(&self, actions: &[Action]) -> Vec<Result<(), AccessDenied>> {
        actions.iter().map(|action| self.check(*action)).collect()
    }
}

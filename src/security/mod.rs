/*!
 * Security Module
 * Permission categories, capability sets and the access-denied signal
 */

pub mod capability;
pub mod types;

// Re-export for convenience
pub use capability::CapabilitySet;
pub use types::{AccessDenied, Permission, UnknownPermission};

/*!
 * Code-Unit Identity
 * Process-wide, never-recycled identifiers for compiled units
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic source of unit identities
///
/// Identities are never recycled: a registry record keyed by a stale id can
/// never be picked up by a unit compiled later.
static NEXT_UNIT_ID: AtomicU64 = AtomicU64::new(1);

/// Stable handle naming one compiled/loaded code unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(u64);

impl UnitId {
    /// Allocate a fresh identity
    #[inline]
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_UNIT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

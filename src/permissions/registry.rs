/*!
 * Confinement Registry
 * Unit identity → capability grant, published RCU-style for lock-free checks
 *
 * Readers load one immutable snapshot per check, so a check never observes a
 * half-applied registration and later writes never change a check already in
 * flight. Writers clone-modify-swap; registrations are rare next to checks.
 */

use crate::core::id::UnitId;
use crate::security::CapabilitySet;
use ahash::HashMap;
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

type RecordMap = HashMap<UnitId, CapabilitySet>;

/// Process-lifetime store of confinement records
pub struct ConfinementRegistry {
    records: ArcSwap<RecordMap>,
    writes: AtomicU64,
    lookups: AtomicU64,
}

impl ConfinementRegistry {
    pub fn new() -> Self {
        debug!("Confinement registry initialized");
        Self {
            records: ArcSwap::from_pointee(RecordMap::default()),
            writes: AtomicU64::new(0),
            lookups: AtomicU64::new(0),
        }
    }

    /// Register or overwrite the grant for `unit`
    ///
    /// Last write wins. The store is published with release ordering, so any
    /// thread that later learns of `unit` through a synchronizing channel
    /// (spawn, channel send, lock) observes the grant. Returns the replaced
    /// grant, if any.
    pub fn confine(&self, unit: UnitId, capabilities: CapabilitySet) -> Option<CapabilitySet> {
        let previous = self.records.rcu(|current| {
            let mut next = RecordMap::clone(current);
            next.insert(unit, capabilities);
            next
        });
        self.writes.fetch_add(1, Ordering::Relaxed);

        let replaced = previous.get(&unit).copied();
        match replaced {
            Some(old) if old != capabilities => {
                info!(unit = %unit, from = %old, to = %capabilities, "Re-confined unit")
            }
            Some(_) => debug!(unit = %unit, grant = %capabilities, "Re-confined unit with identical grant"),
            None => info!(unit = %unit, grant = %capabilities, "Confined unit"),
        }
        replaced
    }

    /// Merge `capabilities` into the unit's existing grant
    ///
    /// Inserts the grant as-is when the unit has no record. Returns the merged
    /// grant now in effect.
    pub fn grant(&self, unit: UnitId, capabilities: CapabilitySet) -> CapabilitySet {
        let previous = self.records.rcu(|current| {
            let mut next = RecordMap::clone(current);
            next.entry(unit)
                .and_modify(|grant| *grant = grant.union(capabilities))
                .or_insert(capabilities);
            next
        });
        self.writes.fetch_add(1, Ordering::Relaxed);

        let merged = previous
            .get(&unit)
            .map_or(capabilities, |old| old.union(capabilities));
        info!(unit = %unit, added = %capabilities, grant = %merged, "Extended unit grant");
        merged
    }

    /// Remove the record for `unit`, restoring ambient trust
    ///
    /// Only for hosts that unload the unit; the registry never drops a record
    /// on its own.
    pub fn release(&self, unit: UnitId) -> Option<CapabilitySet> {
        if !self.records.load().contains_key(&unit) {
            return None;
        }

        let previous = self.records.rcu(|current| {
            let mut next = RecordMap::clone(current);
            next.remove(&unit);
            next
        });
        self.writes.fetch_add(1, Ordering::Relaxed);

        let removed = previous.get(&unit).copied();
        if removed.is_some() {
            info!(unit = %unit, "Released unit confinement");
        }
        removed
    }

    /// Grant registered for `unit`; `None` means ambient trust
    #[inline]
    pub fn lookup(&self, unit: UnitId) -> Option<CapabilitySet> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.records.load().get(&unit).copied()
    }

    /// Whether `unit` has a record
    pub fn is_confined(&self, unit: UnitId) -> bool {
        self.records.load().contains_key(&unit)
    }

    /// Immutable view of every record at this instant
    #[inline]
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        RegistrySnapshot {
            records: self.records.load_full(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.load().is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            records: self.len(),
            writes: self.writes.load(Ordering::Relaxed),
            lookups: self.lookups.load(Ordering::Relaxed),
        }
    }
}

impl Default for ConfinementRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time registry contents used by a single check
#[derive(Clone)]
pub struct RegistrySnapshot {
    records: Arc<RecordMap>,
}

impl RegistrySnapshot {
    #[inline]
    pub fn lookup(&self, unit: UnitId) -> Option<CapabilitySet> {
        self.records.get(&unit).copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records sorted by unit identity
    pub fn records(&self) -> Vec<(UnitId, CapabilitySet)> {
        let mut records: Vec<_> = self.records.iter().map(|(k, v)| (*k, *v)).collect();
        records.sort_by_key(|(unit, _)| *unit);
        records
    }
}

/// Registry statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryStats {
    pub records: usize,
    pub writes: u64,
    pub lookups: u64,
}

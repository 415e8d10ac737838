/*!
 * Confinement Audit Trail
 * Tracks access checks and denials for security monitoring
 */

use super::policy::Action;
use crate::core::id::UnitId;
use crate::core::limits::{MAX_AUDIT_EVENTS, MAX_AUDIT_EVENTS_PER_UNIT};
use crate::security::{AccessDenied, CapabilitySet, Permission};
use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TimestampSeconds};
use std::collections::VecDeque;
use std::time::SystemTime;

/// Audit event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    Info,
    Warning,
    Critical,
}

/// One access check outcome
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AuditEvent {
    pub action: Action,
    pub required: CapabilitySet,
    pub allowed: bool,
    /// Innermost unit for allowed checks, excluding unit for denials
    pub unit: Option<UnitId>,
    pub unit_name: Option<String>,
    pub denied: Option<Permission>,
    pub severity: AuditSeverity,
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub logged_at: SystemTime,
}

impl AuditEvent {
    pub fn allowed(action: Action, required: CapabilitySet, unit: Option<UnitId>) -> Self {
        Self {
            action,
            required,
            allowed: true,
            unit,
            unit_name: None,
            denied: None,
            severity: AuditSeverity::Info,
            logged_at: SystemTime::now(),
        }
    }

    pub fn denied(action: Action, required: CapabilitySet, denial: &AccessDenied) -> Self {
        // Escalation attempts are more severe than ordinary resource access
        let severity = match denial.permission {
            Permission::SuppressAccessChecks | Permission::ExecProcess | Permission::DefineUnit => {
                AuditSeverity::Critical
            }
            _ => AuditSeverity::Warning,
        };

        Self {
            action,
            required,
            allowed: false,
            unit: Some(denial.unit),
            unit_name: Some(denial.unit_name.clone()),
            denied: Some(denial.permission),
            severity,
            logged_at: SystemTime::now(),
        }
    }

    pub fn with_severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = severity;
        self
    }
}

/// Bounded in-memory audit log
pub struct AuditLogger {
    /// Global event log (ring buffer)
    events: RwLock<VecDeque<AuditEvent>>,
    /// Per-unit event logs
    unit_events: DashMap<UnitId, VecDeque<AuditEvent>, RandomState>,
    /// Denial counters for monitoring
    denial_counts: DashMap<UnitId, u64, RandomState>,
    capacity: usize,
    per_unit: usize,
}

impl AuditLogger {
    pub fn new() -> Self {
        Self::with_capacity(MAX_AUDIT_EVENTS, MAX_AUDIT_EVENTS_PER_UNIT)
    }

    pub fn with_capacity(capacity: usize, per_unit: usize) -> Self {
        Self {
            events: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
            unit_events: DashMap::with_hasher(RandomState::new()),
            denial_counts: DashMap::with_hasher(RandomState::new()),
            capacity,
            per_unit,
        }
    }

    /// Record an event
    pub fn log(&self, event: AuditEvent) {
        if self.capacity == 0 {
            return;
        }
        let unit = event.unit;
        let is_denied = !event.allowed;

        {
            let mut events = self.events.write();
            if events.len() >= self.capacity {
                events.pop_front();
            }
            events.push_back(event.clone());
        }

        let Some(unit) = unit else {
            return;
        };

        if self.per_unit > 0 {
            let mut entry = self
                .unit_events
                .entry(unit)
                .or_insert_with(|| VecDeque::with_capacity(self.per_unit.min(64)));
            if entry.len() >= self.per_unit {
                entry.pop_front();
            }
            entry.push_back(event);
        }

        if is_denied {
            *self.denial_counts.entry(unit).or_insert(0) += 1;
        }
    }

    /// Most recent events, newest first
    pub fn recent(&self, limit: usize) -> Vec<AuditEvent> {
        let events = self.events.read();
        events.iter().rev().take(limit).cloned().collect()
    }

    /// Events attributed to a unit, newest first
    pub fn for_unit(&self, unit: UnitId, limit: usize) -> Vec<AuditEvent> {
        self.unit_events
            .get(&unit)
            .map(|entry| entry.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub fn denial_count(&self, unit: UnitId) -> u64 {
        self.denial_counts.get(&unit).map(|e| *e).unwrap_or(0)
    }

    /// Every unit that caused at least one denial
    pub fn units_with_denials(&self) -> Vec<(UnitId, u64)> {
        let mut units: Vec<_> = self
            .denial_counts
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();
        units.sort_by_key(|(unit, _)| *unit);
        units
    }

    /// Drop the logs of one unit
    pub fn clear_unit(&self, unit: UnitId) {
        self.unit_events.remove(&unit);
        self.denial_counts.remove(&unit);
    }

    pub fn clear(&self) {
        self.events.write().clear();
        self.unit_events.clear();
        self.denial_counts.clear();
    }

    pub fn stats(&self) -> AuditStats {
        AuditStats {
            total_events: self.events.read().len(),
            total_denials: self.denial_counts.iter().map(|e| *e.value()).sum(),
            units_tracked: self.unit_events.len(),
        }
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Audit statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStats {
    pub total_events: usize,
    pub total_denials: u64,
    pub units_tracked: usize,
}

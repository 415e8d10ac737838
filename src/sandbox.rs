/*!
 * Sandbox
 * Confinement façade: registers grants, compiles and links units, and
 * invokes them with their frame on the call path
 *
 * A `Sandbox` is an explicitly constructed service. Clones share the same
 * registry, audit trail, library and host properties, so one instance can be
 * handed to many threads.
 */

use crate::core::config::EngineConfig;
use crate::core::errors::{CompileResult, ExecError, ExecResult};
use crate::monitoring::InvocationSpan;
use crate::permissions::call_path::{self, FrameGuard};
use crate::permissions::{
    AccessChecker, Action, AuditLogger, ConfinementRegistry, DefaultPolicy, Policy,
};
use crate::runtime::{CodeUnit, Compiler, Context, Value};
use crate::script::ScriptCompiler;
use crate::security::CapabilitySet;
use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Confinement façade
#[derive(Clone)]
pub struct Sandbox {
    registry: Arc<ConfinementRegistry>,
    audit: Arc<AuditLogger>,
    checker: AccessChecker,
    compiler: Arc<dyn Compiler>,
    /// Units published for invocation by name
    library: Arc<DashMap<String, CodeUnit, RandomState>>,
    properties: Arc<RwLock<HashMap<String, String>>>,
    config: Arc<EngineConfig>,
    counters: Arc<Counters>,
}

#[derive(Default)]
struct Counters {
    invocations: AtomicU64,
    denials: AtomicU64,
}

/// Sandbox-wide counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SandboxStats {
    pub invocations: u64,
    /// Top-level invocations that ended in a denial
    pub denials: u64,
    pub confined_units: usize,
    pub linked_units: usize,
}

impl Sandbox {
    /// Sandbox with default configuration, policy and script compiler
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        info!(
            max_call_depth = config.max_call_depth,
            audit_capacity = config.audit_capacity,
            "initializing sandbox"
        );

        let registry = Arc::new(ConfinementRegistry::new());
        let audit = Arc::new(AuditLogger::with_capacity(
            config.audit_capacity,
            config.audit_per_unit,
        ));
        let checker = AccessChecker::new(registry.clone(), Arc::new(DefaultPolicy), audit.clone())
            .with_audit_allowed(config.audit_allowed);
        let properties = config
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self {
            registry,
            audit,
            checker,
            compiler: Arc::new(ScriptCompiler::new()),
            library: Arc::new(DashMap::with_hasher(RandomState::new())),
            properties: Arc::new(RwLock::new(properties)),
            config: Arc::new(config),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Replace the policy that maps actions to required capabilities
    #[must_use]
    pub fn with_policy(mut self, policy: impl Policy + 'static) -> Self {
        debug!(policy = policy.name(), "installing policy");
        self.checker = AccessChecker::new(
            self.registry.clone(),
            Arc::new(policy),
            self.audit.clone(),
        )
        .with_audit_allowed(self.config.audit_allowed);
        self
    }

    /// Replace the compilation boundary
    #[must_use]
    pub fn with_compiler(mut self, compiler: impl Compiler + 'static) -> Self {
        self.compiler = Arc::new(compiler);
        self
    }

    // ------------------------------------------------------------------
    // Grants
    // ------------------------------------------------------------------

    /// Confine `unit` to exactly `capabilities`
    ///
    /// Must be called before the unit is invoked under that grant. Re-confining
    /// overwrites; the previous grant is returned.
    pub fn confine(&self, unit: &CodeUnit, capabilities: CapabilitySet) -> Option<CapabilitySet> {
        self.registry.confine(unit.id(), capabilities)
    }

    /// Widen an existing grant (or confine an unconfined unit to `capabilities`)
    pub fn grant(&self, unit: &CodeUnit, capabilities: CapabilitySet) -> CapabilitySet {
        self.registry.grant(unit.id(), capabilities)
    }

    /// Remove a unit's record, returning it to ambient trust
    ///
    /// The unit's per-unit audit log and denial count go with it; the global
    /// audit ring keeps its events.
    pub fn release(&self, unit: &CodeUnit) -> Option<CapabilitySet> {
        self.audit.clear_unit(unit.id());
        self.registry.release(unit.id())
    }

    pub fn grant_of(&self, unit: &CodeUnit) -> Option<CapabilitySet> {
        self.registry.lookup(unit.id())
    }

    // ------------------------------------------------------------------
    // Units
    // ------------------------------------------------------------------

    /// Compile source text through the installed compiler
    pub fn compile(&self, name: &str, source: &str) -> CompileResult<CodeUnit> {
        let unit = self.compiler.compile(name, source)?;
        debug!(unit = %unit.id(), name, "compiled unit");
        Ok(unit)
    }

    /// Publish a unit by name so other units can `call` it
    pub fn link(&self, unit: CodeUnit) -> Option<CodeUnit> {
        debug!(unit = %unit.id(), name = unit.name(), "linking unit");
        self.library.insert(unit.name().to_string(), unit)
    }

    pub fn linked(&self, name: &str) -> Option<CodeUnit> {
        self.library.get(name).map(|entry| entry.value().clone())
    }

    /// Run `unit` with its frame on the current thread's call path
    ///
    /// A denial raised anywhere beneath this invocation fails it, even when
    /// the unit caught the error and returned normally.
    pub fn invoke(&self, unit: &CodeUnit, args: &[Value]) -> ExecResult<Value> {
        let depth = call_path::depth();
        let span = InvocationSpan::new(unit.id(), unit.name(), depth);
        let _entered = span.enter();

        self.counters.invocations.fetch_add(1, Ordering::Relaxed);
        let guard = FrameGuard::enter(unit.id(), unit.name_arc(), self.config.max_call_depth)?;

        let ctx = Context::new(self, unit, args);
        let result = unit.entry().run(&ctx);

        match guard.exit() {
            Some(denial) => {
                span.record_outcome("denied");
                if depth == 0 {
                    self.counters.denials.fetch_add(1, Ordering::Relaxed);
                }
                if !matches!(result, Err(ExecError::AccessDenied(_))) {
                    warn!(
                        unit = %unit.id(),
                        permission = %denial.permission,
                        "unit discarded an access denial"
                    );
                }
                Err(denial.into())
            }
            None => {
                span.record_outcome(if result.is_ok() { "ok" } else { "failed" });
                result
            }
        }
    }

    /// Gate a host operation with the same checker units are subject to
    pub fn check(&self, action: Action) -> ExecResult<()> {
        self.checker.check_action(action).map_err(ExecError::from)
    }

    // ------------------------------------------------------------------
    // Host properties
    // ------------------------------------------------------------------

    /// Read a host property without any access check
    pub fn property(&self, name: &str) -> Option<String> {
        self.properties.read().get(name).cloned()
    }

    /// Set a host property without any access check
    pub fn set_property(&self, name: &str, value: &str) -> Option<String> {
        self.properties
            .write()
            .insert(name.to_string(), value.to_string())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn registry(&self) -> &ConfinementRegistry {
        &self.registry
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn checker(&self) -> &AccessChecker {
        &self.checker
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> SandboxStats {
        SandboxStats {
            invocations: self.counters.invocations.load(Ordering::Relaxed),
            denials: self.counters.denials.load(Ordering::Relaxed),
            confined_units: self.registry.len(),
            linked_units: self.library.len(),
        }
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

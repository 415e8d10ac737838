/*!
 * Confinement Policy
 * Maps each host action a unit can perform to the categories it requires
 *
 * The line between free metadata access and gated reflection lives here as
 * data: type literals and name resolution require nothing, locating a
 * declared member requires `reflect_members`, and suppressing access checks
 * on it separately requires `suppress_access_checks`.
 */

use crate::security::{CapabilitySet, Permission};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Concrete host operation requested by a running unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Reference a type by literal name
    TypeLiteral,
    /// Resolve a type by fully-qualified name
    ResolveType,
    /// Read an invocation argument
    ReadArgument,
    /// Invoke another linked unit
    InvokeUnit,
    ReadProperty,
    WriteProperty,
    ReadFile,
    WriteFile,
    DeleteFile,
    ExecProcess,
    Connect,
    /// Locate a declared member of a type reflectively
    DeclaredMember,
    /// Make a located member accessible
    SuppressAccessChecks,
    /// Compile and run source text at runtime
    DefineUnit,
}

impl Action {
    pub const fn as_str(self) -> &'static str {
        match self {
            Action::TypeLiteral => "type_literal",
            Action::ResolveType => "resolve_type",
            Action::ReadArgument => "read_argument",
            Action::InvokeUnit => "invoke_unit",
            Action::ReadProperty => "read_property",
            Action::WriteProperty => "write_property",
            Action::ReadFile => "read_file",
            Action::WriteFile => "write_file",
            Action::DeleteFile => "delete_file",
            Action::ExecProcess => "exec_process",
            Action::Connect => "connect",
            Action::DeclaredMember => "declared_member",
            Action::SuppressAccessChecks => "suppress_access_checks",
            Action::DefineUnit => "define_unit",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy deciding which categories an action requires
pub trait Policy: Send + Sync {
    /// Categories that must all be in the effective grant; empty = not sensitive
    fn requirements(&self, action: Action) -> CapabilitySet;

    /// Policy name
    fn name(&self) -> &str;

    /// Whether the action is gated at all
    fn is_sensitive(&self, action: Action) -> bool {
        !self.requirements(action).is_empty()
    }
}

/// Built-in policy table
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

impl Policy for DefaultPolicy {
    fn requirements(&self, action: Action) -> CapabilitySet {
        let permission = match action {
            Action::TypeLiteral
            | Action::ResolveType
            | Action::ReadArgument
            | Action::InvokeUnit => return CapabilitySet::NONE,
            Action::ReadProperty => Permission::ReadProperty,
            Action::WriteProperty => Permission::WriteProperty,
            Action::ReadFile => Permission::ReadFile,
            Action::WriteFile => Permission::WriteFile,
            Action::DeleteFile => Permission::DeleteFile,
            Action::ExecProcess => Permission::ExecProcess,
            Action::Connect => Permission::Connect,
            Action::DeclaredMember => Permission::ReflectMembers,
            Action::SuppressAccessChecks => Permission::SuppressAccessChecks,
            Action::DefineUnit => Permission::DefineUnit,
        };
        CapabilitySet::from(permission)
    }

    fn name(&self) -> &str {
        "default"
    }
}

/// Policy layering extra requirements over another policy
///
/// Requirements only grow: an override can never make an action cheaper
/// than the inner policy says.
pub struct StrictPolicy<P: Policy> {
    inner: P,
    overrides: Vec<(Action, CapabilitySet)>,
}

impl<P: Policy> StrictPolicy<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            overrides: Vec::new(),
        }
    }

    /// Add `extra` to the requirements of `action`
    #[must_use]
    pub fn require(mut self, action: Action, extra: CapabilitySet) -> Self {
        self.overrides.push((action, extra));
        self
    }
}

impl<P: Policy> Policy for StrictPolicy<P> {
    fn requirements(&self, action: Action) -> CapabilitySet {
        self.overrides
            .iter()
            .filter(|(a, _)| *a == action)
            .fold(self.inner.requirements(action), |acc, (_, extra)| {
                acc.union(*extra)
            })
    }

    fn name(&self) -> &str {
        "strict"
    }
}

/*!
 * Security Types
 * The closed universe of sensitive-operation categories and the denial signal
 */

use super::capability::CapabilitySet;
use crate::core::id::UnitId;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Sensitive-operation categories that can be granted to confined units
///
/// The discriminant is the bit position inside a [`CapabilitySet`]; adding a
/// category means appending a variant and extending [`Permission::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Permission {
    /// Read a named host property
    ReadProperty = 0,
    /// Set a named host property
    WriteProperty = 1,
    /// Read file contents
    ReadFile = 2,
    /// Create or overwrite a file
    WriteFile = 3,
    /// Delete a file
    DeleteFile = 4,
    /// Spawn an external process
    ExecProcess = 5,
    /// Open an outbound network connection
    Connect = 6,
    /// Locate declared members of a type reflectively
    ReflectMembers = 7,
    /// Make an inaccessible member accessible
    SuppressAccessChecks = 8,
    /// Compile and run new code at runtime
    DefineUnit = 9,
}

impl Permission {
    /// Every category, in declaration order
    pub const ALL: [Permission; 10] = [
        Permission::ReadProperty,
        Permission::WriteProperty,
        Permission::ReadFile,
        Permission::WriteFile,
        Permission::DeleteFile,
        Permission::ExecProcess,
        Permission::Connect,
        Permission::ReflectMembers,
        Permission::SuppressAccessChecks,
        Permission::DefineUnit,
    ];

    /// Single-bit mask for this category
    #[inline]
    pub const fn bit(self) -> u16 {
        1 << (self as u8)
    }

    /// Stable snake_case name
    pub const fn as_str(self) -> &'static str {
        match self {
            Permission::ReadProperty => "read_property",
            Permission::WriteProperty => "write_property",
            Permission::ReadFile => "read_file",
            Permission::WriteFile => "write_file",
            Permission::DeleteFile => "delete_file",
            Permission::ExecProcess => "exec_process",
            Permission::Connect => "connect",
            Permission::ReflectMembers => "reflect_members",
            Permission::SuppressAccessChecks => "suppress_access_checks",
            Permission::DefineUnit => "define_unit",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised permission name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown permission '{0}'")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownPermission(wanted.to_string()))
    }
}

/// Denial raised by the access checker
///
/// Carries the first missing category, the full missing set, and the
/// innermost frame whose grant excluded the operation.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
#[serde(rename_all = "snake_case")]
#[error("Access denied: {permission} (excluded by '{unit_name}' {unit})")]
#[diagnostic(
    code(confine::access_denied),
    help("The effective grant on the call path does not include this category. Relax the grant with Sandbox::confine if the operation is intended.")
)]
pub struct AccessDenied {
    /// First missing category in declaration order
    pub permission: Permission,
    /// Every required category the effective grant lacked
    pub missing: CapabilitySet,
    /// Innermost frame whose grant excluded the operation
    pub unit: UnitId,
    /// Name of that frame's unit
    pub unit_name: String,
}

impl AccessDenied {
    /// Build a denial from a non-empty missing set
    ///
    /// An empty set cannot be denied; it is reported as the first category so
    /// the signal still fails closed.
    pub fn new(missing: CapabilitySet, unit: UnitId, unit_name: impl Into<String>) -> Self {
        let permission = missing.first().unwrap_or(Permission::ReadProperty);
        Self {
            permission,
            missing,
            unit,
            unit_name: unit_name.into(),
        }
    }
}

/*!
 * Well-Known Types
 * Fixed catalogue of host types visible to units through reflection
 */

use serde::Serialize;
use std::fmt;

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
}

/// Declared field of a well-known type
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct FieldDesc {
    pub name: &'static str,
    pub visibility: Visibility,
}

/// A well-known type
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct TypeDesc {
    /// Short name usable as a literal
    pub name: &'static str,
    /// Fully-qualified name usable with `resolve`
    pub fqn: &'static str,
    pub fields: &'static [FieldDesc],
}

impl TypeDesc {
    pub fn field(&'static self, name: &str) -> Option<&'static FieldDesc> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.fqn)
    }
}

const fn public(name: &'static str) -> FieldDesc {
    FieldDesc {
        name,
        visibility: Visibility::Public,
    }
}

const fn private(name: &'static str) -> FieldDesc {
    FieldDesc {
        name,
        visibility: Visibility::Private,
    }
}

/// Every type a unit can name
pub static WELL_KNOWN_TYPES: &[TypeDesc] = &[
    TypeDesc {
        name: "Object",
        fqn: "core.Object",
        fields: &[],
    },
    TypeDesc {
        name: "String",
        fqn: "core.String",
        fields: &[private("value"), private("hash")],
    },
    TypeDesc {
        name: "System",
        fqn: "core.System",
        fields: &[public("out"), public("err"), private("props")],
    },
    TypeDesc {
        name: "File",
        fqn: "io.File",
        fields: &[private("path"), public("separator")],
    },
];

/// Look up a type by its short name
pub fn by_name(name: &str) -> Option<&'static TypeDesc> {
    WELL_KNOWN_TYPES.iter().find(|t| t.name == name)
}

/// Look up a type by its fully-qualified name
pub fn by_fqn(fqn: &str) -> Option<&'static TypeDesc> {
    WELL_KNOWN_TYPES.iter().find(|t| t.fqn == fqn)
}

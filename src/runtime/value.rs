/*!
 * Runtime Values
 * Values exchanged between hosts and code units
 */

use super::types::{FieldDesc, TypeDesc};
use crate::core::errors::{ExecError, ExecResult};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Handle to a well-known type
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(transparent)]
pub struct TypeHandle(pub &'static TypeDesc);

impl TypeHandle {
    pub fn name(&self) -> &'static str {
        self.0.name
    }

    pub fn fqn(&self) -> &'static str {
        self.0.fqn
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

/// Handle to a located field, optionally made accessible
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldHandle {
    pub owner: TypeHandle,
    pub field: &'static FieldDesc,
    pub accessible: bool,
}

impl FieldHandle {
    pub fn name(&self) -> &'static str {
        self.field.name
    }
}

/// Dynamically typed value
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Str(Arc<str>),
    Type(TypeHandle),
    Field(FieldHandle),
}

impl Value {
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::Type(_) => "type",
            Value::Field(_) => "field",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> ExecResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch("bool", other)),
        }
    }

    pub fn as_int(&self) -> ExecResult<i64> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(mismatch("int", other)),
        }
    }

    pub fn as_str(&self) -> ExecResult<&str> {
        match self {
            Value::Str(s) => Ok(&**s),
            other => Err(mismatch("string", other)),
        }
    }

    pub fn as_type(&self) -> ExecResult<TypeHandle> {
        match self {
            Value::Type(t) => Ok(*t),
            other => Err(mismatch("type", other)),
        }
    }

    pub fn as_field(&self) -> ExecResult<FieldHandle> {
        match self {
            Value::Field(f) => Ok(*f),
            other => Err(mismatch("field", other)),
        }
    }
}

fn mismatch(expected: &str, found: &Value) -> ExecError {
    ExecError::TypeMismatch {
        expected: expected.to_string(),
        found: found.type_name().to_string(),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Str(s) => f.write_str(s),
            Value::Type(t) => write!(f, "type {}", t.fqn()),
            Value::Field(field) => write!(f, "field {}.{}", field.owner.fqn(), field.name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

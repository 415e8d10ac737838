/*!
 * Host Context
 * The only surface through which a running unit reaches the outside world
 *
 * Every sensitive method asks the sandbox's access checker first, on the
 * calling thread, before touching the resource. Denials come back as
 * `ExecError::AccessDenied` and are also latched on the call path.
 */

use super::types;
use super::unit::CodeUnit;
use super::value::{FieldHandle, TypeHandle, Value};
use crate::core::errors::{ExecError, ExecResult};
use crate::core::limits::{CONNECT_TIMEOUT, MAX_READ_BYTES};
use crate::permissions::Action;
use crate::sandbox::Sandbox;
use std::io::Read;
use std::marker::PhantomData;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Execution context handed to a unit's entry point
///
/// Checks consult the call path of the thread they run on, so a context is
/// bound to the invoking thread and cannot be shared with another one:
///
/// ```compile_fail
/// use confine_engine::{CapabilitySet, CodeUnit, Sandbox, Value};
///
/// let sandbox = Sandbox::new();
/// let unit = CodeUnit::native("escape", |ctx| {
///     std::thread::scope(|s| {
///         s.spawn(|| ctx.set_property("key", "value"));
///     });
///     Ok(Value::Null)
/// });
/// sandbox.confine(&unit, CapabilitySet::NONE);
/// let _ = sandbox.invoke(&unit, &[]);
/// ```
pub struct Context<'a> {
    sandbox: &'a Sandbox,
    unit: &'a CodeUnit,
    args: &'a [Value],
    _thread_bound: PhantomData<*const ()>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(sandbox: &'a Sandbox, unit: &'a CodeUnit, args: &'a [Value]) -> Self {
        Self {
            sandbox,
            unit,
            args,
            _thread_bound: PhantomData,
        }
    }

    /// Unit currently executing
    pub fn unit(&self) -> &CodeUnit {
        self.unit
    }

    /// Gate an action against the current call path
    pub fn check(&self, action: Action) -> ExecResult<()> {
        self.sandbox.check(action)
    }

    /// Invocation arguments
    pub fn args(&self) -> &[Value] {
        self.args
    }

    /// Positional argument; `null` when out of range
    pub fn arg(&self, index: usize) -> ExecResult<Value> {
        self.check(Action::ReadArgument)?;
        Ok(self.args.get(index).cloned().unwrap_or_default())
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    /// Read a host property; `null` when unset
    pub fn property(&self, name: &str) -> ExecResult<Value> {
        self.check(Action::ReadProperty)?;
        Ok(self.sandbox.property(name).into())
    }

    /// Set a host property, returning the previous value
    pub fn set_property(&self, name: &str, value: &str) -> ExecResult<Value> {
        self.check(Action::WriteProperty)?;
        Ok(self.sandbox.set_property(name, value).into())
    }

    // ------------------------------------------------------------------
    // Files
    // ------------------------------------------------------------------

    pub fn read_file(&self, path: &str) -> ExecResult<String> {
        self.check(Action::ReadFile)?;
        let file = std::fs::File::open(path)?;
        let mut contents = String::new();
        file.take(MAX_READ_BYTES).read_to_string(&mut contents)?;
        Ok(contents)
    }

    pub fn write_file(&self, path: &str, contents: &str) -> ExecResult<()> {
        self.check(Action::WriteFile)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Delete a file; `false` when there was nothing to delete
    pub fn delete_file(&self, path: &str) -> ExecResult<bool> {
        self.check(Action::DeleteFile)?;
        match std::fs::remove_file(Path::new(path)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    // ------------------------------------------------------------------
    // Processes and network
    // ------------------------------------------------------------------

    /// Run a whitespace-separated command line; `true` when it exits successfully
    pub fn exec(&self, command_line: &str) -> ExecResult<bool> {
        self.check(Action::ExecProcess)?;
        let mut parts = command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| ExecError::fault(self.unit.name(), "empty command line"))?;

        debug!(unit = %self.unit.id(), program, "spawning process");
        let status = Command::new(program)
            .args(parts)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        Ok(status.success())
    }

    /// Open and immediately close a TCP connection to `host:port`
    pub fn connect(&self, address: &str) -> ExecResult<bool> {
        self.check(Action::Connect)?;
        let addrs = address.to_socket_addrs()?;
        for addr in addrs {
            if TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).is_ok() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // ------------------------------------------------------------------
    // Types and reflection
    // ------------------------------------------------------------------

    /// Reference a well-known type by its short name
    pub fn type_literal(&self, name: &str) -> ExecResult<TypeHandle> {
        self.check(Action::TypeLiteral)?;
        types::by_name(name)
            .map(TypeHandle)
            .ok_or_else(|| ExecError::UnknownType(name.to_string()))
    }

    /// Resolve a type by fully-qualified name
    pub fn resolve_type(&self, fqn: &str) -> ExecResult<TypeHandle> {
        self.check(Action::ResolveType)?;
        types::by_fqn(fqn)
            .map(TypeHandle)
            .ok_or_else(|| ExecError::UnknownType(fqn.to_string()))
    }

    /// Locate a declared field
    ///
    /// The check precedes the lookup, so a denied unit cannot discover which
    /// fields exist.
    pub fn declared_field(&self, owner: TypeHandle, name: &str) -> ExecResult<FieldHandle> {
        self.check(Action::DeclaredMember)?;
        let field = owner.0.field(name).ok_or_else(|| ExecError::NoSuchField {
            ty: owner.fqn().to_string(),
            field: name.to_string(),
        })?;
        Ok(FieldHandle {
            owner,
            field,
            accessible: false,
        })
    }

    /// Change a field's accessibility; enabling requires suppressing access checks
    pub fn set_accessible(&self, field: FieldHandle, accessible: bool) -> ExecResult<FieldHandle> {
        if accessible {
            self.check(Action::SuppressAccessChecks)?;
        }
        Ok(FieldHandle { accessible, ..field })
    }

    // ------------------------------------------------------------------
    // Units
    // ------------------------------------------------------------------

    /// Invoke a linked unit by name
    ///
    /// The callee runs on top of the current frame, so it is bounded by the
    /// caller's grant as well as its own.
    pub fn call(&self, name: &str, args: &[Value]) -> ExecResult<Value> {
        self.check(Action::InvokeUnit)?;
        let unit = self
            .sandbox
            .linked(name)
            .ok_or_else(|| ExecError::UnknownUnit(name.to_string()))?;
        self.sandbox.invoke(&unit, args)
    }

    /// Compile `source` and run it immediately beneath the current frame
    pub fn eval(&self, source: &str) -> ExecResult<Value> {
        self.check(Action::DefineUnit)?;
        let name = format!("{}/eval", self.unit.name());
        let unit = self.sandbox.compile(&name, source)?;
        let result = self.sandbox.invoke(&unit, &[]);
        // The unit is unreachable once it returns.
        self.sandbox.audit().clear_unit(unit.id());
        result
    }
}

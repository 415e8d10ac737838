/*!
 * Code Units
 * Compiled executable units and the compilation boundary
 */

use super::context::Context;
use super::value::Value;
use crate::core::errors::{CompileResult, ExecResult};
use crate::core::id::UnitId;
use std::fmt;
use std::sync::Arc;

/// Executable behavior of a unit
pub trait Entry: Send + Sync {
    /// Run the unit; every sensitive operation goes through `ctx`
    fn run(&self, ctx: &Context<'_>) -> ExecResult<Value>;
}

/// Host-provided unit implemented as a closure
pub struct NativeEntry<F>(F);

impl<F> Entry for NativeEntry<F>
where
    F: Fn(&Context<'_>) -> ExecResult<Value> + Send + Sync,
{
    fn run(&self, ctx: &Context<'_>) -> ExecResult<Value> {
        (self.0)(ctx)
    }
}

/// One compiled/loaded code unit
///
/// Cloning shares the identity: every clone is the same unit to the
/// confinement registry.
#[derive(Clone)]
pub struct CodeUnit {
    id: UnitId,
    name: Arc<str>,
    entry: Arc<dyn Entry>,
}

impl CodeUnit {
    /// Wrap an entry point under a fresh identity
    pub fn new(name: impl AsRef<str>, entry: impl Entry + 'static) -> Self {
        Self {
            id: UnitId::next(),
            name: Arc::from(name.as_ref()),
            entry: Arc::new(entry),
        }
    }

    /// Unit backed by a host closure
    pub fn native<F>(name: impl AsRef<str>, f: F) -> Self
    where
        F: Fn(&Context<'_>) -> ExecResult<Value> + Send + Sync + 'static,
    {
        Self::new(name, NativeEntry(f))
    }

    #[inline]
    pub fn id(&self) -> UnitId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    pub(crate) fn entry(&self) -> &dyn Entry {
        self.entry.as_ref()
    }
}

impl fmt::Debug for CodeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeUnit")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CodeUnit {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CodeUnit {}

/// Compilation boundary: turns source text into an executable unit
///
/// Compile errors are surfaced to the caller unmodified; nothing is
/// registered or executed when compilation fails.
pub trait Compiler: Send + Sync {
    fn compile(&self, name: &str, source: &str) -> CompileResult<CodeUnit>;
}

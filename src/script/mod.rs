/*!
 * Script Module
 * Reference compilation boundary: a small expression language whose host
 * operations all go through the gated `Context`
 *
 * ```text
 * let name = property("user.home");
 * let f = field(System, "props").set_accessible(true);
 * return f.name() == "props";
 * ```
 */

pub mod interp;
pub mod lexer;
pub mod parser;

pub use interp::ScriptEntry;

use crate::core::errors::CompileResult;
use crate::runtime::{CodeUnit, Compiler};
use tracing::debug;

/// Compiler for the built-in script language
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptCompiler;

impl ScriptCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl Compiler for ScriptCompiler {
    fn compile(&self, name: &str, source: &str) -> CompileResult<CodeUnit> {
        let tokens = lexer::tokenize(source)?;
        let program = parser::parse(tokens).map_err(|err| {
            debug!(name, line = err.line, col = err.col, error = %err.message, "script rejected");
            err
        })?;
        debug!(name, statements = program.stmts.len(), "script compiled");
        Ok(CodeUnit::new(name, ScriptEntry::new(program)))
    }
}

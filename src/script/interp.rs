/*!
 * Script Interpreter
 * Evaluates a checked program against the host context
 */

use super::parser::{Builtin, Expr, Method, Program, Stmt};
use crate::core::errors::{ExecError, ExecResult};
use crate::runtime::{Context, Entry, TypeHandle, Value};

/// Entry point of a compiled script
#[derive(Debug)]
pub struct ScriptEntry {
    program: Program,
}

impl ScriptEntry {
    pub fn new(program: Program) -> Self {
        Self { program }
    }
}

impl Entry for ScriptEntry {
    fn run(&self, ctx: &Context<'_>) -> ExecResult<Value> {
        let mut frame = Interpreter {
            ctx,
            slots: vec![Value::Null; self.program.slots],
        };
        for stmt in &self.program.stmts {
            match stmt {
                Stmt::Let { slot, value } => {
                    let value = frame.eval(value)?;
                    frame.slots[*slot] = value;
                }
                Stmt::Return(expr) => return frame.eval(expr),
                Stmt::Expr(expr) => {
                    frame.eval(expr)?;
                }
            }
        }
        Ok(Value::Null)
    }
}

struct Interpreter<'c, 'a> {
    ctx: &'c Context<'a>,
    slots: Vec<Value>,
}

impl Interpreter<'_, '_> {
    fn eval(&self, expr: &Expr) -> ExecResult<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Var(slot) => Ok(self.slots[*slot].clone()),
            Expr::TypeLiteral(desc) => self.ctx.type_literal(desc.name).map(Value::Type),
            Expr::Not(inner) => Ok(Value::Bool(!self.eval(inner)?.as_bool()?)),
            Expr::Compare { lhs, rhs, negate } => {
                let equal = self.eval(lhs)? == self.eval(rhs)?;
                Ok(Value::Bool(equal != *negate))
            }
            Expr::Builtin { op, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<ExecResult<Vec<_>>>()?;
                self.builtin(*op, &args)
            }
            Expr::Method {
                receiver,
                method,
                args,
            } => {
                let receiver = self.eval(receiver)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<ExecResult<Vec<_>>>()?;
                self.method(&receiver, *method, &args)
            }
        }
    }

    fn builtin(&self, op: Builtin, args: &[Value]) -> ExecResult<Value> {
        let ctx = self.ctx;
        match op {
            Builtin::Property => ctx.property(args[0].as_str()?),
            Builtin::SetProperty => ctx.set_property(args[0].as_str()?, args[1].as_str()?),
            Builtin::ReadFile => ctx.read_file(args[0].as_str()?).map(Value::from),
            Builtin::WriteFile => ctx
                .write_file(args[0].as_str()?, args[1].as_str()?)
                .map(|()| Value::Null),
            Builtin::DeleteFile => ctx.delete_file(args[0].as_str()?).map(Value::Bool),
            Builtin::Exec => ctx.exec(args[0].as_str()?).map(Value::Bool),
            Builtin::Connect => ctx.connect(args[0].as_str()?).map(Value::Bool),
            Builtin::Resolve => ctx.resolve_type(args[0].as_str()?).map(Value::Type),
            Builtin::Field => {
                let owner: TypeHandle = args[0].as_type()?;
                ctx.declared_field(owner, args[1].as_str()?)
                    .map(Value::Field)
            }
            Builtin::Call => ctx.call(args[0].as_str()?, &[]),
            Builtin::Eval => ctx.eval(args[0].as_str()?),
            Builtin::Arg => {
                // Negative indices are simply out of range.
                let index = usize::try_from(args[0].as_int()?).unwrap_or(usize::MAX);
                ctx.arg(index)
            }
        }
    }

    fn method(&self, receiver: &Value, method: Method, args: &[Value]) -> ExecResult<Value> {
        match (method, receiver) {
            (Method::SetAccessible, Value::Field(field)) => self
                .ctx
                .set_accessible(*field, args[0].as_bool()?)
                .map(Value::Field),
            (Method::SetAccessible, other) => Err(ExecError::TypeMismatch {
                expected: "field".into(),
                found: other.type_name().into(),
            }),
            (Method::Name, Value::Type(ty)) => Ok(Value::str(ty.name())),
            (Method::Name, Value::Field(field)) => Ok(Value::str(field.name())),
            (Method::Name, other) => Err(ExecError::TypeMismatch {
                expected: "type or field".into(),
                found: other.type_name().into(),
            }),
        }
    }
}

/*!
 * Script Parser
 * Builds a checked program from tokens
 *
 * Name resolution happens here: variables become slot indices, bare type
 * names become type literals, and builtin/method arity is verified. Anything
 * that fails these checks is a compile error and nothing runs.
 */

use super::lexer::{Token, TokenKind};
use crate::core::errors::{CompileError, CompileResult};
use crate::core::limits::MAX_NESTING;
use crate::runtime::types::{self, TypeDesc};
use crate::runtime::Value;
use std::collections::HashMap;

/// Host operations reachable from scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Property,
    SetProperty,
    ReadFile,
    WriteFile,
    DeleteFile,
    Exec,
    Connect,
    Resolve,
    Field,
    Call,
    Eval,
    Arg,
}

impl Builtin {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "property" => Builtin::Property,
            "set_property" => Builtin::SetProperty,
            "read_file" => Builtin::ReadFile,
            "write_file" => Builtin::WriteFile,
            "delete_file" => Builtin::DeleteFile,
            "exec" => Builtin::Exec,
            "connect" => Builtin::Connect,
            "resolve" => Builtin::Resolve,
            "field" => Builtin::Field,
            "call" => Builtin::Call,
            "eval" => Builtin::Eval,
            "arg" => Builtin::Arg,
            _ => return None,
        })
    }

    pub fn arity(self) -> usize {
        match self {
            Builtin::SetProperty | Builtin::WriteFile | Builtin::Field => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    SetAccessible,
    Name,
}

impl Method {
    fn lookup(name: &str) -> Option<Self> {
        match name {
            "set_accessible" => Some(Method::SetAccessible),
            "name" => Some(Method::Name),
            _ => None,
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Method::SetAccessible => 1,
            Method::Name => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Value),
    Var(usize),
    TypeLiteral(&'static TypeDesc),
    Builtin { op: Builtin, args: Vec<Expr> },
    Method {
        receiver: Box<Expr>,
        method: Method,
        args: Vec<Expr>,
    },
    Not(Box<Expr>),
    Compare {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        negate: bool,
    },
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Let { slot: usize, value: Expr },
    Return(Expr),
    Expr(Expr),
}

/// Checked program ready for interpretation
#[derive(Debug, Clone)]
pub struct Program {
    pub stmts: Vec<Stmt>,
    /// Number of variable slots
    pub slots: usize,
}

/// Parse a token stream produced by `lexer::tokenize`
pub fn parse(tokens: Vec<Token>) -> CompileResult<Program> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        scope: HashMap::new(),
        slots: 0,
        depth: 0,
    };
    let mut stmts = Vec::new();
    while !parser.at(&TokenKind::Eof) {
        stmts.push(parser.statement()?);
    }
    Ok(Program {
        stmts,
        slots: parser.slots,
    })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    scope: HashMap<String, usize>,
    slots: usize,
    /// Nesting level of the expression being built
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // The lexer always terminates the stream with Eof, and `advance` never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn at(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn error_at(token: &Token, message: impl Into<String>) -> CompileError {
        CompileError::new(message, token.line, token.col)
    }

    fn expect(&mut self, kind: TokenKind) -> CompileResult<Token> {
        let token = self.advance();
        if token.kind == kind {
            Ok(token)
        } else {
            Err(Self::error_at(
                &token,
                format!("expected {}, found {}", kind, token.kind),
            ))
        }
    }

    /// Enter one more level of nesting at `token`
    fn descend(&mut self, token: &Token) -> CompileResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(Self::error_at(
                token,
                format!("expression nested deeper than {} levels", MAX_NESTING),
            ));
        }
        Ok(())
    }

    fn ident(&mut self) -> CompileResult<(String, Token)> {
        let token = self.advance();
        match &token.kind {
            TokenKind::Ident(name) => Ok((name.clone(), token)),
            other => Err(Self::error_at(
                &token,
                format!("expected identifier, found {}", other),
            )),
        }
    }

    fn statement(&mut self) -> CompileResult<Stmt> {
        let stmt = match self.peek().kind {
            TokenKind::Let => {
                self.advance();
                let (name, _) = self.ident()?;
                self.expect(TokenKind::Assign)?;
                // The initializer cannot see the name it defines.
                let value = self.expr()?;
                let slot = self.slots;
                self.slots += 1;
                self.scope.insert(name, slot);
                Stmt::Let { slot, value }
            }
            TokenKind::Return => {
                self.advance();
                Stmt::Return(self.expr()?)
            }
            _ => Stmt::Expr(self.expr()?),
        };
        self.expect(TokenKind::Semi)?;
        Ok(stmt)
    }

    fn expr(&mut self) -> CompileResult<Expr> {
        let depth = self.depth;
        let start = self.peek().clone();
        self.descend(&start)?;

        let mut lhs = self.unary()?;
        loop {
            let negate = match self.peek().kind {
                TokenKind::EqEq => false,
                TokenKind::NotEq => true,
                _ => {
                    self.depth = depth;
                    return Ok(lhs);
                }
            };
            // Each comparison wraps everything to its left.
            let op = self.advance();
            self.descend(&op)?;
            let rhs = self.unary()?;
            lhs = Expr::Compare {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                negate,
            };
        }
    }

    fn unary(&mut self) -> CompileResult<Expr> {
        if self.at(&TokenKind::Bang) {
            let bang = self.advance();
            self.descend(&bang)?;
            let inner = self.unary()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> CompileResult<Expr> {
        let depth = self.depth;
        let mut expr = self.primary()?;
        while self.at(&TokenKind::Dot) {
            let dot = self.advance();
            self.descend(&dot)?;
            let (name, token) = self.ident()?;
            let method = Method::lookup(&name)
                .ok_or_else(|| Self::error_at(&token, format!("unknown method '{}'", name)))?;
            let args = self.arguments()?;
            check_arity(&token, &name, method.arity(), args.len())?;
            expr = Expr::Method {
                receiver: Box::new(expr),
                method,
                args,
            };
        }
        self.depth = depth;
        Ok(expr)
    }

    fn primary(&mut self) -> CompileResult<Expr> {
        let token = self.advance();
        let expr = match token.kind {
            TokenKind::True => Expr::Literal(Value::Bool(true)),
            TokenKind::False => Expr::Literal(Value::Bool(false)),
            TokenKind::Null => Expr::Literal(Value::Null),
            TokenKind::Int(n) => Expr::Literal(Value::Int(n)),
            TokenKind::Str(ref s) => Expr::Literal(Value::str(s)),
            TokenKind::LParen => {
                let inner = self.expr()?;
                self.expect(TokenKind::RParen)?;
                inner
            }
            TokenKind::Ident(ref name) if self.at(&TokenKind::LParen) => {
                self.builtin(name, &token)?
            }
            TokenKind::Ident(ref name) => self.name(name, &token)?,
            ref other => {
                return Err(Self::error_at(
                    &token,
                    format!("expected expression, found {}", other),
                ))
            }
        };
        Ok(expr)
    }

    fn builtin(&mut self, name: &str, token: &Token) -> CompileResult<Expr> {
        if name == "type" {
            self.expect(TokenKind::LParen)?;
            let (ty, ty_token) = self.ident()?;
            let desc = types::by_name(&ty)
                .ok_or_else(|| Self::error_at(&ty_token, format!("unknown type '{}'", ty)))?;
            self.expect(TokenKind::RParen)?;
            return Ok(Expr::TypeLiteral(desc));
        }

        let op = Builtin::lookup(name)
            .ok_or_else(|| Self::error_at(token, format!("unknown builtin '{}'", name)))?;
        let args = self.arguments()?;
        check_arity(token, name, op.arity(), args.len())?;
        Ok(Expr::Builtin { op, args })
    }

    /// Bare identifier: a variable in scope, otherwise a well-known type name
    fn name(&self, name: &str, token: &Token) -> CompileResult<Expr> {
        if let Some(slot) = self.scope.get(name) {
            return Ok(Expr::Var(*slot));
        }
        types::by_name(name)
            .map(Expr::TypeLiteral)
            .ok_or_else(|| Self::error_at(token, format!("undefined name '{}'", name)))
    }

    fn arguments(&mut self) -> CompileResult<Vec<Expr>> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if self.at(&TokenKind::RParen) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            if self.at(&TokenKind::Comma) {
                self.advance();
                continue;
            }
            self.expect(TokenKind::RParen)?;
            return Ok(args);
        }
    }
}

fn check_arity(token: &Token, name: &str, expected: usize, found: usize) -> CompileResult<()> {
    if expected == found {
        return Ok(());
    }
    Err(CompileError::new(
        format!(
            "'{}' takes {} argument{}, found {}",
            name,
            expected,
            if expected == 1 { "" } else { "s" },
            found
        ),
        token.line,
        token.col,
    ))
}

/*!
 * Script Lexer
 * Splits source text into positioned tokens
 */

use crate::core::errors::{CompileError, CompileResult};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    Int(i64),
    Str(String),
    Let,
    Return,
    True,
    False,
    Null,
    LParen,
    RParen,
    Comma,
    Dot,
    Semi,
    Assign,
    EqEq,
    NotEq,
    Bang,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "identifier '{}'", name),
            TokenKind::Int(n) => write!(f, "integer {}", n),
            TokenKind::Str(_) => write!(f, "string literal"),
            TokenKind::Let => write!(f, "'let'"),
            TokenKind::Return => write!(f, "'return'"),
            TokenKind::True => write!(f, "'true'"),
            TokenKind::False => write!(f, "'false'"),
            TokenKind::Null => write!(f, "'null'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::Semi => write!(f, "';'"),
            TokenKind::Assign => write!(f, "'='"),
            TokenKind::EqEq => write!(f, "'=='"),
            TokenKind::NotEq => write!(f, "'!='"),
            TokenKind::Bang => write!(f, "'!'"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

/// Token with its 1-based source position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub col: usize,
}

struct Cursor<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    col: usize,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            col: 1,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }
}

/// Tokenize `source`; the result always ends with `Eof`
pub fn tokenize(source: &str) -> CompileResult<Vec<Token>> {
    let mut cursor = Cursor::new(source);
    let mut tokens = Vec::new();

    loop {
        skip_trivia(&mut cursor);
        let (line, col) = (cursor.line, cursor.col);
        let Some(c) = cursor.bump() else {
            tokens.push(Token {
                kind: TokenKind::Eof,
                line,
                col,
            });
            return Ok(tokens);
        };

        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ';' => TokenKind::Semi,
            '=' if cursor.eat('=') => TokenKind::EqEq,
            '=' => TokenKind::Assign,
            '!' if cursor.eat('=') => TokenKind::NotEq,
            '!' => TokenKind::Bang,
            '"' => TokenKind::Str(string_literal(&mut cursor, line, col)?),
            c if c.is_ascii_digit() => TokenKind::Int(int_literal(&mut cursor, c, line, col)?),
            c if c.is_alphabetic() || c == '_' => keyword_or_ident(identifier(&mut cursor, c)),
            other => {
                return Err(CompileError::new(
                    format!("unexpected character '{}'", other),
                    line,
                    col,
                ))
            }
        };
        tokens.push(Token { kind, line, col });
    }
}

fn skip_trivia(cursor: &mut Cursor<'_>) {
    loop {
        match cursor.peek() {
            Some(c) if c.is_whitespace() => {
                cursor.bump();
            }
            Some('/') => {
                // Only `//` line comments exist; a lone '/' is left for the caller to reject.
                let mut lookahead = cursor.chars.clone();
                lookahead.next();
                if lookahead.next() != Some('/') {
                    return;
                }
                while let Some(c) = cursor.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            _ => return,
        }
    }
}

fn string_literal(cursor: &mut Cursor<'_>, line: usize, col: usize) -> CompileResult<String> {
    let mut out = String::new();
    loop {
        match cursor.bump() {
            Some('"') => return Ok(out),
            Some('\\') => {
                let escaped = match cursor.bump() {
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some('\\') => '\\',
                    Some('"') => '"',
                    Some(other) => {
                        return Err(CompileError::new(
                            format!("unknown escape '\\{}'", other),
                            cursor.line,
                            cursor.col.saturating_sub(2).max(1),
                        ))
                    }
                    None => break,
                };
                out.push(escaped);
            }
            Some(c) => out.push(c),
            None => break,
        }
    }
    Err(CompileError::new("unterminated string literal", line, col))
}

fn int_literal(cursor: &mut Cursor<'_>, first: char, line: usize, col: usize) -> CompileResult<i64> {
    let mut digits = String::from(first);
    while let Some(c) = cursor.peek().filter(char::is_ascii_digit) {
        digits.push(c);
        cursor.bump();
    }
    digits
        .parse()
        .map_err(|_| CompileError::new(format!("integer literal {} out of range", digits), line, col))
}

fn identifier(cursor: &mut Cursor<'_>, first: char) -> String {
    let mut name = String::from(first);
    while let Some(c) = cursor.peek().filter(|c| c.is_alphanumeric() || *c == '_') {
        name.push(c);
        cursor.bump();
    }
    name
}

fn keyword_or_ident(word: String) -> TokenKind {
    match word.as_str() {
        "let" => TokenKind::Let,
        "return" => TokenKind::Return,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        _ => TokenKind::Ident(word),
    }
}

// Recursive-descent interpreter for contract scripts.
//
// Grammar:
//   script  := directive* (export | expr) ';'? EOF
//   export  := 'module' '.' 'exports' '=' expr
//   expr    := literal | object | array | call | ('-' | '+') number
//   object  := '{' (key ':' expr (',' key ':' expr)* ','?)? '}'
//   array   := '[' (expr (',' expr)* ','?)? ']'
//   call    := IDENT '(' (expr (',' expr)* ','?)? ')'
//
// Calls resolve against the binding table; there is no other way to reach
// host functionality.

use super::builtins::Bindings;
use super::error::ScriptError;
use super::lexer::{Lexer, Token, TokenKind};
use super::SandboxLimits;
use crate::dsl::ValueNode;
use serde_json::{Number, Value};
use std::time::Instant;

/// Identifiers that name host facilities in a JavaScript runtime.
const FORBIDDEN: &[&str] = &[
    "require",
    "eval",
    "process",
    "Function",
    "import",
    "globalThis",
    "global",
    "window",
    "this",
    "constructor",
    "fetch",
    "setTimeout",
    "setInterval",
];

/// How often (in tokens) the deadline is checked.
const DEADLINE_CHECK_INTERVAL: usize = 64;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    bindings: &'a Bindings,
    limits: &'a SandboxLimits,
    started: Instant,
    depth: usize,
    nodes: usize,
    tokens: usize,
}

impl<'a> Parser<'a> {
    pub fn new(
        source: &'a str,
        bindings: &'a Bindings,
        limits: &'a SandboxLimits,
    ) -> Result<Self, ScriptError> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            bindings,
            limits,
            started: Instant::now(),
            depth: 0,
            nodes: 0,
            tokens: 1,
        })
    }

    pub fn parse_script(&mut self) -> Result<ValueNode, ScriptError> {
        // Directive prologue, e.g. 'use strict';
        while matches!(self.current.kind, TokenKind::Str(_)) {
            let directive = self.current.clone();
            self.bump()?;
            if self.current.kind == TokenKind::Semicolon {
                self.bump()?;
            } else {
                // A bare string is the exported value.
                self.current = directive;
                break;
            }
        }

        if self.current.kind == TokenKind::Eof {
            return Err(ScriptError::NoExport);
        }

        if self.current.kind == TokenKind::Ident("module".into()) {
            self.bump()?;
            self.expect(TokenKind::Dot)?;
            match &self.current.kind {
                TokenKind::Ident(name) if name == "exports" => self.bump()?,
                other => return Err(self.syntax(format!("expected `exports`, found {}", other.describe()))),
            }
            self.expect(TokenKind::Equals)?;
        }

        let exported = self.parse_expr()?;
        while self.current.kind == TokenKind::Semicolon {
            self.bump()?;
        }
        if self.current.kind != TokenKind::Eof {
            return Err(self.unexpected());
        }
        exported.ok_or(ScriptError::NoExport)
    }

    fn bump(&mut self) -> Result<(), ScriptError> {
        self.current = self.lexer.next_token()?;
        self.tokens += 1;
        if self.tokens % DEADLINE_CHECK_INTERVAL == 0 && self.started.elapsed() > self.limits.timeout {
            return Err(ScriptError::Timeout(self.limits.timeout));
        }
        Ok(())
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ScriptError> {
        if self.current.kind == kind {
            self.bump()
        } else {
            Err(self.unexpected())
        }
    }

    fn syntax(&self, message: String) -> ScriptError {
        ScriptError::Syntax {
            line: self.current.line,
            col: self.current.col,
            message,
        }
    }

    fn unexpected(&self) -> ScriptError {
        self.syntax(format!("unexpected {}", self.current.kind.describe()))
    }

    fn count_node(&mut self) -> Result<(), ScriptError> {
        self.nodes += 1;
        if self.nodes > self.limits.max_nodes {
            return Err(ScriptError::LimitExceeded {
                limit: "node count",
                max: self.limits.max_nodes,
            });
        }
        Ok(())
    }

    fn enter(&mut self) -> Result<(), ScriptError> {
        self.depth += 1;
        if self.depth > self.limits.max_depth {
            return Err(ScriptError::LimitExceeded {
                limit: "nesting depth",
                max: self.limits.max_depth,
            });
        }
        Ok(())
    }

    /// Parse one expression. `None` is `undefined`.
    fn parse_expr(&mut self) -> Result<Option<ValueNode>, ScriptError> {
        self.count_node()?;
        let token = self.current.clone();
        match token.kind {
            TokenKind::LeftBrace => self.parse_object().map(Some),
            TokenKind::LeftBracket => self.parse_array().map(Some),
            TokenKind::Str(s) => {
                self.bump()?;
                Ok(Some(ValueNode::Constant(Value::String(s))))
            }
            TokenKind::Num(n) => {
                self.bump()?;
                Ok(Some(ValueNode::Constant(Value::Number(n))))
            }
            TokenKind::Minus | TokenKind::Plus => {
                let negate = token.kind == TokenKind::Minus;
                self.bump()?;
                let TokenKind::Num(n) = self.current.kind.clone() else {
                    return Err(self.unexpected());
                };
                self.bump()?;
                let n = if negate { negate_number(&n) } else { Some(n) };
                n.map(|n| Some(ValueNode::Constant(Value::Number(n))))
                    .ok_or_else(|| self.syntax("number out of range".into()))
            }
            TokenKind::Ident(name) => self.parse_identifier(name),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_identifier(&mut self, name: String) -> Result<Option<ValueNode>, ScriptError> {
        if FORBIDDEN.contains(&name.as_str()) {
            return Err(ScriptError::Forbidden(name));
        }
        self.bump()?;
        match name.as_str() {
            "undefined" => return Ok(None),
            "null" => return Ok(Some(ValueNode::Constant(Value::Null))),
            "true" => return Ok(Some(ValueNode::Constant(Value::Bool(true)))),
            "false" => return Ok(Some(ValueNode::Constant(Value::Bool(false)))),
            _ => {}
        }
        if self.current.kind != TokenKind::LeftParen {
            return Err(ScriptError::UnknownIdentifier(name));
        }
        let builtin = self
            .bindings
            .lookup(&name)
            .ok_or(ScriptError::UnknownFunction(name))?;
        self.bump()?;
        self.enter()?;
        let mut args = Vec::new();
        while self.current.kind != TokenKind::RightParen {
            args.push(self.parse_expr()?);
            if self.current.kind == TokenKind::Comma {
                self.bump()?;
            } else if self.current.kind != TokenKind::RightParen {
                return Err(self.unexpected());
            }
        }
        self.bump()?;
        self.depth -= 1;
        builtin.apply(args).map(Some)
    }

    fn parse_object(&mut self) -> Result<ValueNode, ScriptError> {
        self.bump()?;
        self.enter()?;
        let mut fields: Vec<(String, ValueNode)> = Vec::new();
        while self.current.kind != TokenKind::RightBrace {
            let key = match &self.current.kind {
                TokenKind::Ident(name) | TokenKind::Str(name) => name.clone(),
                TokenKind::Num(n) => n.to_string(),
                _ => return Err(self.unexpected()),
            };
            self.bump()?;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expr()?;
            // Later duplicates win, as in a JavaScript object literal.
            fields.retain(|(existing, _)| existing != &key);
            if let Some(value) = value {
                fields.push((key, value));
            }
            if self.current.kind == TokenKind::Comma {
                self.bump()?;
            } else if self.current.kind != TokenKind::RightBrace {
                return Err(self.unexpected());
            }
        }
        self.bump()?;
        self.depth -= 1;
        Ok(ValueNode::Object(fields))
    }

    fn parse_array(&mut self) -> Result<ValueNode, ScriptError> {
        self.bump()?;
        self.enter()?;
        let mut items = Vec::new();
        while self.current.kind != TokenKind::RightBracket {
            let item = self.parse_expr()?;
            items.push(item.unwrap_or(ValueNode::Constant(Value::Null)));
            if self.current.kind == TokenKind::Comma {
                self.bump()?;
            } else if self.current.kind != TokenKind::RightBracket {
                return Err(self.unexpected());
            }
        }
        self.bump()?;
        self.depth -= 1;
        Ok(ValueNode::Array(items))
    }
}

fn negate_number(n: &Number) -> Option<Number> {
    if let Some(i) = n.as_i64() {
        if let Some(neg) = i.checked_neg() {
            return Some(Number::from(neg));
        }
    }
    n.as_f64().and_then(|f| Number::from_f64(-f))
}

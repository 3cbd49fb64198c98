//! Recursive-descent parser for binding expressions.
//!
//! Grammar (precedence low to high):
//!
//! ```text
//! statement  = member "=" or | or          (statement roles only)
//! or         = and ("||" and)*
//! and        = equality ("&&" equality)*
//! equality   = comparison (("==" | "!=") comparison)*
//! comparison = additive (("<" | "<=" | ">" | ">=") additive)*
//! additive   = multiplicative (("+" | "-") multiplicative)*
//! multiplicative = unary (("*" | "/" | "%") unary)*
//! unary      = ("!" | "-") unary | primary
//! primary    = literal | "(" or ")" | receiver ("." ident)*
//! receiver   = "this" | "$event"
//! ```
//!
//! Function calls are not part of the grammar. Every failure here is an
//! authoring error: malformed text aborts binding setup, it is never
//! deferred to evaluation.

use crate::error::BindError;
use crate::value::Value;

use super::lexer::{self, Token};

/// Which receiver a member chain is rooted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    /// `this` - the reactive view-model.
    This,
    /// `$event` - the triggering event (event/write-back bindings only).
    Event,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// Receiver-rooted member chain. An empty path is the bare receiver.
    Member { receiver: Receiver, path: Vec<String> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    /// `receiver.path = value`. Only produced for statement roles.
    Assign { receiver: Receiver, path: Vec<String>, value: Box<Expr> },
}

/// The semantic role an expression is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Must produce a value; assignment is a syntax error.
    Value,
    /// May be an assignment or a bare expression.
    Statement,
    /// Statement with the `$event` receiver in scope.
    Event,
}

impl Role {
    fn allows_assignment(self) -> bool {
        !matches!(self, Role::Value)
    }
}

/// Parse `text` for `role`.
pub fn parse(text: &str, role: Role) -> Result<Expr, BindError> {
    let tokens = lexer::scan(text)?;
    let mut parser = Parser { text, tokens, pos: 0 };

    if parser.tokens.is_empty() {
        return Err(BindError::authoring(text, "empty expression"));
    }

    let expr = parser.or()?;

    if parser.peek() == Some(&Token::Assign) {
        if !role.allows_assignment() {
            return Err(BindError::authoring(
                text,
                "assignment is not allowed in a value expression",
            ));
        }
        parser.advance();
        let Expr::Member { receiver, path } = expr else {
            return Err(BindError::authoring(
                text,
                "assignment target must be a member chain",
            ));
        };
        if path.is_empty() {
            return Err(BindError::authoring(text, "cannot assign to a bare receiver"));
        }
        let value = parser.or()?;
        parser.expect_end()?;
        return Ok(Expr::Assign { receiver, path, value: Box::new(value) });
    }

    parser.expect_end()?;
    Ok(expr)
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn error(&self, detail: impl Into<String>) -> BindError {
        BindError::authoring(self.text, detail)
    }

    fn expect_end(&self) -> Result<(), BindError> {
        if self.pos < self.tokens.len() {
            return Err(self.error(format!("unexpected token `{:?}`", self.tokens[self.pos])));
        }
        Ok(())
    }

    fn or(&mut self) -> Result<Expr, BindError> {
        let mut lhs = self.and()?;
        while self.peek() == Some(&Token::OrOr) {
            self.advance();
            let rhs = self.and()?;
            lhs = Expr::Binary { op: BinaryOp::Or, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, BindError> {
        let mut lhs = self.equality()?;
        while self.peek() == Some(&Token::AndAnd) {
            self.advance();
            let rhs = self.equality()?;
            lhs = Expr::Binary { op: BinaryOp::And, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> Result<Expr, BindError> {
        let mut lhs = self.comparison()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::NotEq,
                _ => break,
            };
            self.advance();
            let rhs = self.comparison()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn comparison(&mut self) -> Result<Expr, BindError> {
        let mut lhs = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            let rhs = self.additive()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn additive(&mut self) -> Result<Expr, BindError> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.multiplicative()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn multiplicative(&mut self) -> Result<Expr, BindError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => break,
            };
            self.advance();
            let rhs = self.unary()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, BindError> {
        let op = match self.peek() {
            Some(Token::Bang) => Some(UnaryOp::Not),
            Some(Token::Minus) => Some(UnaryOp::Neg),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.unary()?;
            return Ok(Expr::Unary { op, operand: Box::new(operand) });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, BindError> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Literal(Value::Number(n))),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::Str(s))),
            Some(Token::True) => Ok(Expr::Literal(Value::Bool(true))),
            Some(Token::False) => Ok(Expr::Literal(Value::Bool(false))),
            Some(Token::Null) => Ok(Expr::Literal(Value::Null)),
            Some(Token::LParen) => {
                let inner = self.or()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(self.error("expected `)`")),
                }
            }
            Some(Token::This) => self.member_chain(Receiver::This),
            Some(Token::Event) => self.member_chain(Receiver::Event),
            Some(Token::Ident(name)) => {
                Err(self.error(format!("unknown identifier `{name}` (paths must start with `this` or `$event`)")))
            }
            Some(other) => Err(self.error(format!("unexpected token `{other:?}`"))),
            None => Err(self.error("unexpected end of expression")),
        }
    }

    fn member_chain(&mut self, receiver: Receiver) -> Result<Expr, BindError> {
        let mut path = Vec::new();
        while self.peek() == Some(&Token::Dot) {
            self.advance();
            match self.advance() {
                Some(Token::Ident(name)) => path.push(name),
                // Keywords are valid field names after a dot.
                Some(Token::This) => path.push("this".to_string()),
                Some(Token::True) => path.push("true".to_string()),
                Some(Token::False) => path.push("false".to_string()),
                Some(Token::Null) => path.push("null".to_string()),
                _ => return Err(self.error("expected field name after `.`")),
            }
        }
        Ok(Expr::Member { receiver, path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_chain() {
        let expr = parse("this.user.name", Role::Value).unwrap();
        assert_eq!(
            expr,
            Expr::Member {
                receiver: Receiver::This,
                path: vec!["user".into(), "name".into()],
            }
        );
    }

    #[test]
    fn test_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        let expr = parse("1 + 2 * 3", Role::Value).unwrap();
        let Expr::Binary { op: BinaryOp::Add, rhs, .. } = expr else {
            panic!("expected addition at the root");
        };
        assert!(matches!(*rhs, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn test_assignment_requires_statement_role() {
        assert!(parse("this.count = 1", Role::Statement).is_ok());
        assert!(parse("this.count = $event.target.valueAsNumber", Role::Event).is_ok());

        let err = parse("this.count = 1", Role::Value).unwrap_err();
        assert!(matches!(err, BindError::Authoring { .. }));
    }

    #[test]
    fn test_assignment_target_must_be_member() {
        assert!(parse("1 = 2", Role::Statement).is_err());
        assert!(parse("this = 2", Role::Statement).is_err());
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        assert!(parse("this.a this.b", Role::Value).is_err());
        assert!(parse("this.a.", Role::Value).is_err());
        assert!(parse("", Role::Value).is_err());
    }

    #[test]
    fn test_calls_not_in_grammar() {
        assert!(parse("this.fn()", Role::Value).is_err());
    }

    #[test]
    fn test_grouping_and_unary() {
        assert!(parse("!(this.done || this.count > 3)", Role::Value).is_ok());
        assert!(parse("-this.count", Role::Value).is_ok());
    }
}

//! Expression compiler.
//!
//! Turns binding expression text into a compiled form evaluated against a
//! context. Compilation is eager and happens once per binding: malformed
//! text fails fast with an authoring error. Evaluation failures are deferred
//! errors the call sites absorb.
//!
//! The original design compiled text straight to host-language functions;
//! here the text is parsed once into a small AST and interpreted, which
//! preserves the fail-fast-on-syntax / fail-soft-on-evaluation split without
//! dynamic code generation.

pub mod eval;
pub mod lexer;
pub mod parser;

pub use eval::EvalContext;
pub use parser::Role;

use crate::error::BindError;
use crate::value::Value;

use parser::Expr;

/// A compiled binding expression: immutable text plus its parsed form.
#[derive(Debug, Clone)]
pub struct Expression {
    text: String,
    ast: Expr,
}

impl Expression {
    /// Compile `text` for `role`. Fails fast with [`BindError::Authoring`]
    /// on malformed text.
    pub fn compile(text: &str, role: Role) -> Result<Self, BindError> {
        let ast = parser::parse(text, role)?;
        Ok(Self { text: text.to_string(), ast })
    }

    /// The original expression text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Evaluate against `ctx`. Errors are recoverable evaluation failures
    /// (or structural errors surfaced by an assignment).
    pub fn eval(&self, ctx: &EvalContext<'_>) -> Result<Value, BindError> {
        eval::eval(&self.ast, &self.text, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::BindingRegistry;
    use crate::store::ViewModel;
    use std::rc::Rc;

    #[test]
    fn test_compile_once_eval_many() {
        let registry = Rc::new(BindingRegistry::new());
        let vm = ViewModel::new(
            Value::from([("count", Value::Number(1.0))]),
            registry,
        )
        .unwrap();

        let expr = Expression::compile("this.count + 1", Role::Value).unwrap();
        assert_eq!(expr.eval(&EvalContext::of(&vm)).unwrap(), Value::Number(2.0));

        vm.set("count", Value::Number(41.0)).unwrap();
        assert_eq!(expr.eval(&EvalContext::of(&vm)).unwrap(), Value::Number(42.0));
    }

    #[test]
    fn test_malformed_text_fails_at_compile() {
        let err = Expression::compile("this.count +", Role::Value).unwrap_err();
        assert!(matches!(err, BindError::Authoring { .. }));
    }
}

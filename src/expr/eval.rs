//! Expression evaluation against a live context.
//!
//! Every failure here is an evaluation error: the binding call sites catch
//! it, report it through `tracing`, and substitute a fallback. Nothing in
//! this module unwinds into the notification or event-dispatch machinery.
//!
//! Member-access semantics mirror the dynamic original: reading an absent
//! *leaf* field yields `Null`, but reading *through* null or a scalar is an
//! error.

use crate::element::Event;
use crate::error::BindError;
use crate::store::ViewModel;
use crate::value::Value;

use super::parser::{BinaryOp, Expr, Receiver, UnaryOp};

/// The context a compiled expression runs against.
///
/// `this` resolves to the view-model; `$event` is present only while an
/// event or write-back binding is firing.
pub struct EvalContext<'a> {
    pub vm: &'a ViewModel,
    pub event: Option<&'a Event>,
}

impl<'a> EvalContext<'a> {
    /// Context with no event in scope.
    pub fn of(vm: &'a ViewModel) -> Self {
        Self { vm, event: None }
    }

    /// Context for an event or write-back binding.
    pub fn with_event(vm: &'a ViewModel, event: &'a Event) -> Self {
        Self { vm, event: Some(event) }
    }
}

/// Evaluate `expr` (compiled from `text`) against `ctx`.
pub fn eval(expr: &Expr, text: &str, ctx: &EvalContext<'_>) -> Result<Value, BindError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),

        Expr::Member { receiver, path } => resolve_member(*receiver, path, text, ctx),

        Expr::Unary { op, operand } => {
            let value = eval(operand, text, ctx)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                UnaryOp::Neg => {
                    let n = value.as_number().ok_or_else(|| {
                        BindError::evaluation(
                            text,
                            format!("cannot negate a {}", value.type_name()),
                        )
                    })?;
                    Ok(Value::Number(-n))
                }
            }
        }

        Expr::Binary { op, lhs, rhs } => eval_binary(*op, lhs, rhs, text, ctx),

        Expr::Assign { receiver, path, value } => {
            let value = eval(value, text, ctx)?;
            assign(*receiver, path, value.clone(), text, ctx)?;
            Ok(value)
        }
    }
}

fn resolve_member(
    receiver: Receiver,
    path: &[String],
    text: &str,
    ctx: &EvalContext<'_>,
) -> Result<Value, BindError> {
    match receiver {
        Receiver::This => walk(ctx.vm.snapshot(), path, text),
        Receiver::Event => {
            let event = ctx.event.ok_or_else(|| {
                BindError::evaluation(text, "`$event` is not in scope for this binding")
            })?;
            let Some(first) = path.first() else {
                return Err(BindError::evaluation(text, "`$event` is not a value"));
            };
            match first.as_str() {
                "name" => walk(Value::Str(event.name.clone()), &path[1..], text),
                "target" => {
                    let Some(property) = path.get(1) else {
                        return Err(BindError::evaluation(
                            text,
                            "`$event.target` is not a value; read one of its properties",
                        ));
                    };
                    walk(event.target.get(property), &path[2..], text)
                }
                _ if path.len() == 1 => Ok(Value::Null),
                other => Err(BindError::evaluation(
                    text,
                    format!("cannot read through undefined event field `{other}`"),
                )),
            }
        }
    }
}

/// Walk `path` through `value` with undefined-leaf / error-through rules.
fn walk(mut value: Value, path: &[String], text: &str) -> Result<Value, BindError> {
    for (i, segment) in path.iter().enumerate() {
        let last = i + 1 == path.len();
        let fields = value.as_object().ok_or_else(|| {
            BindError::evaluation(
                text,
                format!("cannot read field `{segment}` of {}", value.type_name()),
            )
        })?;
        match fields.get(segment) {
            Some(next) => value = next.clone(),
            None if last => return Ok(Value::Null),
            None => {
                return Err(BindError::evaluation(
                    text,
                    format!("cannot read through undefined field `{segment}`"),
                ));
            }
        }
    }
    Ok(value)
}

fn assign(
    receiver: Receiver,
    path: &[String],
    value: Value,
    text: &str,
    ctx: &EvalContext<'_>,
) -> Result<(), BindError> {
    match receiver {
        Receiver::This => ctx.vm.set(&path.join("."), value),
        Receiver::Event => {
            let event = ctx.event.ok_or_else(|| {
                BindError::evaluation(text, "`$event` is not in scope for this binding")
            })?;
            match path {
                [target, property] if target == "target" => {
                    event.target.set(property, value);
                    Ok(())
                }
                _ => Err(BindError::evaluation(
                    text,
                    "only `$event.target.<property>` is assignable",
                )),
            }
        }
    }
}

fn eval_binary(
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    text: &str,
    ctx: &EvalContext<'_>,
) -> Result<Value, BindError> {
    // Short-circuit forms return an operand, not a bool.
    match op {
        BinaryOp::And => {
            let left = eval(lhs, text, ctx)?;
            if !left.is_truthy() {
                return Ok(left);
            }
            return eval(rhs, text, ctx);
        }
        BinaryOp::Or => {
            let left = eval(lhs, text, ctx)?;
            if left.is_truthy() {
                return Ok(left);
            }
            return eval(rhs, text, ctx);
        }
        _ => {}
    }

    let left = eval(lhs, text, ctx)?;
    let right = eval(rhs, text, ctx)?;

    match op {
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::NotEq => Ok(Value::Bool(left != right)),

        BinaryOp::Add => {
            if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) {
                return Ok(Value::Str(format!("{}{}", left.as_text(), right.as_text())));
            }
            let (a, b) = numeric_operands(op, &left, &right, text)?;
            Ok(Value::Number(a + b))
        }
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            let (a, b) = numeric_operands(op, &left, &right, text)?;
            Ok(Value::Number(match op {
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                _ => a % b,
            }))
        }

        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            compare(op, &left, &right, text)
        }

        BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
    }
}

fn numeric_operands(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    text: &str,
) -> Result<(f64, f64), BindError> {
    match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(BindError::evaluation(
            text,
            format!(
                "operator {op:?} requires numbers, got {} and {}",
                left.type_name(),
                right.type_name()
            ),
        )),
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value, text: &str) -> Result<Value, BindError> {
    let ordering = match (left, right) {
        // NaN comparisons are false, like the original host language.
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => {
            return Err(BindError::evaluation(
                text,
                format!(
                    "cannot compare {} with {}",
                    left.type_name(),
                    right.type_name()
                ),
            ));
        }
    };
    let result = match (op, ordering) {
        (_, None) => false,
        (BinaryOp::Lt, Some(o)) => o.is_lt(),
        (BinaryOp::Le, Some(o)) => o.is_le(),
        (BinaryOp::Gt, Some(o)) => o.is_gt(),
        (BinaryOp::Ge, Some(o)) => o.is_ge(),
        _ => unreachable!("compare called with non-comparison operator"),
    };
    Ok(Value::Bool(result))
}

//! The embedded expression interpreter.
//!
//! Evaluates parsed expressions against a binding [`Environment`] and the
//! model. Member access on a bound entity goes through the model's uniform
//! attribute accessor; everything an expression can observe about the model
//! is reachable that way.

use super::builtins;
use super::parser::{parse_expr, BinaryOp, Expr, Literal, UnaryOp};
use super::value::{Environment, EvalError, Value};
use crate::model::Model;

/// Evaluates a predicate source string to a boolean in the given binding
/// environment.
///
/// # Arguments
///
/// * `source` - The predicate text after interpolation
/// * `env` - The binding environment the match produced
/// * `model` - The model bound entities refer into
///
/// # Returns
///
/// The truthiness of the evaluated expression, or the first parse or
/// evaluation error.
pub fn eval_predicate(source: &str, env: &Environment, model: &Model) -> Result<bool, EvalError> {
    let expr = parse_expr(source)?;
    let value = Interpreter::new(model).eval(&expr, env)?;
    Ok(value.is_truthy())
}

/// The expression interpreter.
#[derive(Debug)]
pub struct Interpreter<'m> {
    model: &'m Model,
}

impl<'m> Interpreter<'m> {
    /// Creates an interpreter evaluating against the given model.
    pub fn new(model: &'m Model) -> Self {
        Self { model }
    }

    /// Evaluates an expression in an environment.
    pub fn eval(&self, expr: &Expr, env: &Environment) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(lit) => Ok(match lit {
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Int(n) => Value::Int(*n),
                Literal::Float(x) => Value::Float(*x),
                Literal::Str(s) => Value::Str(s.clone()),
            }),

            Expr::Identifier(name) => env
                .lookup(name)
                .cloned()
                .ok_or_else(|| EvalError::undefined_variable(name)),

            Expr::Member { object, member } => {
                let value = self.eval(object, env)?;
                match value {
                    Value::Node(id) => self.model.attr(id, member).ok_or_else(|| {
                        EvalError::undefined_member(member, &self.model.display(id))
                    }),
                    other => Err(EvalError::type_error("entity", other.type_name())),
                }
            }

            Expr::Index { object, index } => {
                let value = self.eval(object, env)?;
                let index = self.eval(index, env)?;
                let i = match index {
                    Value::Int(n) => n,
                    other => return Err(EvalError::type_error("Int", other.type_name())),
                };
                match value {
                    Value::List(items) => items
                        .get(usize::try_from(i).map_err(|_| {
                            EvalError::new(format!("index {} out of range", i))
                        })?)
                        .cloned()
                        .ok_or_else(|| EvalError::new(format!("index {} out of range", i))),
                    other => Err(EvalError::type_error("List", other.type_name())),
                }
            }

            Expr::Call { callee, args } => {
                let arg_values: Result<Vec<_>, _> =
                    args.iter().map(|a| self.eval(a, env)).collect();
                builtins::call_builtin(callee, &arg_values?, self.model)
            }

            Expr::Unary { op, operand } => {
                let value = self.eval(operand, env)?;
                match op {
                    UnaryOp::Neg => match value {
                        Value::Int(n) => Ok(Value::Int(-n)),
                        Value::Float(x) => Ok(Value::Float(-x)),
                        other => Err(EvalError::type_error("numeric", other.type_name())),
                    },
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                }
            }

            Expr::Binary { left, op, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                self.eval_binary(&left, *op, &right)
            }
        }
    }

    fn eval_binary(&self, left: &Value, op: BinaryOp, right: &Value) -> Result<Value, EvalError> {
        match op {
            BinaryOp::Add => match (left, right) {
                (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
                _ => self.arithmetic(left, op, right),
            },
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                self.arithmetic(left, op, right)
            }

            // Equality is lenient across types: mismatched types compare
            // unequal, numbers compare numerically.
            BinaryOp::Eq => Ok(Value::Bool(values_equal(left, right))),
            BinaryOp::Ne => Ok(Value::Bool(!values_equal(left, right))),

            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let ordering = match (left, right) {
                    (Value::Str(a), Value::Str(b)) => a.cmp(b),
                    _ => {
                        let (a, b) = (as_number(left)?, as_number(right)?);
                        a.partial_cmp(&b).ok_or_else(|| {
                            EvalError::new("cannot order NaN")
                        })?
                    }
                };
                Ok(Value::Bool(match op {
                    BinaryOp::Lt => ordering.is_lt(),
                    BinaryOp::Le => ordering.is_le(),
                    BinaryOp::Gt => ordering.is_gt(),
                    _ => ordering.is_ge(),
                }))
            }

            BinaryOp::And => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
            BinaryOp::Or => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
        }
    }

    fn arithmetic(&self, left: &Value, op: BinaryOp, right: &Value) -> Result<Value, EvalError> {
        if let (Value::Int(a), Value::Int(b)) = (left, right) {
            return match op {
                BinaryOp::Add => Ok(Value::Int(a + b)),
                BinaryOp::Sub => Ok(Value::Int(a - b)),
                BinaryOp::Mul => Ok(Value::Int(a * b)),
                BinaryOp::Div => {
                    if *b == 0 {
                        Err(EvalError::new("division by zero"))
                    } else {
                        Ok(Value::Int(a / b))
                    }
                }
                BinaryOp::Mod => {
                    if *b == 0 {
                        Err(EvalError::new("division by zero"))
                    } else {
                        Ok(Value::Int(a % b))
                    }
                }
                _ => unreachable!("non-arithmetic operator"),
            };
        }
        let (a, b) = (as_number(left)?, as_number(right)?);
        Ok(Value::Float(match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Mod => a % b,
            _ => unreachable!("non-arithmetic operator"),
        }))
    }
}

fn as_number(value: &Value) -> Result<f64, EvalError> {
    match value {
        Value::Int(n) => Ok(*n as f64),
        Value::Float(x) => Ok(*x),
        other => Err(EvalError::type_error("numeric", other.type_name())),
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
        _ => left == right,
    }
}

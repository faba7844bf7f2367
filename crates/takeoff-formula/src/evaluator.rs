//! Formula evaluator
//!
//! Evaluates formula ASTs against a table of variable values.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::FunctionRegistry;
use crate::parser::parse_formula;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::sync::OnceLock;

/// Global function registry (lazily initialized)
static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

fn get_function_registry() -> &'static FunctionRegistry {
    FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
}

/// Source of values for `[CODE]` references
pub trait VariableValues {
    /// Value bound to `code`, if any
    fn value_of(&self, code: &str) -> Option<f64>;
}

impl<S: BuildHasher> VariableValues for HashMap<String, f64, S> {
    fn value_of(&self, code: &str) -> Option<f64> {
        self.get(code).copied()
    }
}

impl VariableValues for ahash::AHashMap<String, f64> {
    fn value_of(&self, code: &str) -> Option<f64> {
        self.get(code).copied()
    }
}

impl VariableValues for BTreeMap<String, f64> {
    fn value_of(&self, code: &str) -> Option<f64> {
        self.get(code).copied()
    }
}

/// Evaluation context
pub struct EvaluationContext<'a> {
    values: &'a dyn VariableValues,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context
    pub fn new(values: &'a dyn VariableValues) -> Self {
        Self { values }
    }

    /// Context with no bound variables; every reference reads as 0
    pub fn simple() -> EvaluationContext<'static> {
        static EMPTY: NoValues = NoValues;
        EvaluationContext { values: &EMPTY }
    }

    /// Value of a referenced code; unknown codes read as 0
    pub fn get_value(&self, code: &str) -> f64 {
        self.values.value_of(code).unwrap_or(0.0)
    }
}

struct NoValues;

impl VariableValues for NoValues {
    fn value_of(&self, _code: &str) -> Option<f64> {
        None
    }
}

/// Outcome of evaluating expression text
///
/// Zero is a legitimate value; `Unresolvable` is kept separate so callers can
/// tell the two apart.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Value(f64),
    Unresolvable(FormulaError),
}

impl Evaluation {
    /// The value, if the expression resolved
    pub fn value(&self) -> Option<f64> {
        match self {
            Evaluation::Value(v) => Some(*v),
            Evaluation::Unresolvable(_) => None,
        }
    }

    pub fn is_unresolvable(&self) -> bool {
        matches!(self, Evaluation::Unresolvable(_))
    }

    /// The failure, if the expression did not resolve
    pub fn error(&self) -> Option<&FormulaError> {
        match self {
            Evaluation::Value(_) => None,
            Evaluation::Unresolvable(e) => Some(e),
        }
    }
}

impl From<FormulaResult<f64>> for Evaluation {
    fn from(result: FormulaResult<f64>) -> Self {
        match result {
            Ok(v) if v.is_finite() => Evaluation::Value(v),
            Ok(_) => Evaluation::Unresolvable(FormulaError::NonFinite),
            Err(e) => Evaluation::Unresolvable(e),
        }
    }
}

/// Parse and evaluate expression text in one step
///
/// Never panics and never fails: every problem with the text comes back as
/// [`Evaluation::Unresolvable`].
pub fn evaluate_expression(text: &str, values: &dyn VariableValues) -> Evaluation {
    let ctx = EvaluationContext::new(values);
    parse_formula(text)
        .and_then(|expr| evaluate(&expr, &ctx))
        .into()
}

/// Evaluate a formula expression
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaResult<f64> {
    match expr {
        FormulaExpr::Number(n) => Ok(*n),

        FormulaExpr::Reference(code) => Ok(ctx.get_value(code)),

        // === Operators ===
        FormulaExpr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, ctx),

        FormulaExpr::UnaryOp { op, operand } => {
            let value = evaluate(operand, ctx)?;
            match op {
                UnaryOperator::Negate => Ok(-value),
            }
        }

        // === Functions ===
        FormulaExpr::Function { name, args } => evaluate_function(name, args, ctx),
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &FormulaExpr,
    right: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<f64> {
    let l = evaluate(left, ctx)?;
    let r = evaluate(right, ctx)?;

    let result = match op {
        BinaryOperator::Add => l + r,
        BinaryOperator::Subtract => l - r,
        BinaryOperator::Multiply => l * r,
        BinaryOperator::Divide => {
            if r == 0.0 {
                return Err(FormulaError::DivisionByZero);
            }
            l / r
        }
    };

    if result.is_finite() {
        Ok(result)
    } else {
        Err(FormulaError::NonFinite)
    }
}

/// Evaluate a function call
fn evaluate_function(name: &str, args: &[FormulaExpr], ctx: &EvaluationContext) -> FormulaResult<f64> {
    let registry = get_function_registry();

    let func = registry
        .get(name)
        .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

    // Check argument count
    if args.len() < func.min_args {
        return Err(FormulaError::ArgumentCount {
            function: func.name.to_string(),
            expected: format!("at least {}", func.min_args),
            actual: args.len(),
        });
    }

    if let Some(max) = func.max_args {
        if args.len() > max {
            return Err(FormulaError::ArgumentCount {
                function: func.name.to_string(),
                expected: format!("at most {}", max),
                actual: args.len(),
            });
        }
    }

    let mut evaluated_args = Vec::with_capacity(args.len());
    for arg in args {
        evaluated_args.push(evaluate(arg, ctx)?);
    }

    (func.implementation)(&evaluated_args)
}

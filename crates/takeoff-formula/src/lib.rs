//! # takeoff-formula
//!
//! Formula parser and evaluator for takeoff.
//!
//! This crate provides:
//! - Formula parsing (text → AST) over a closed arithmetic grammar
//! - Structural rejection of half-typed expressions before any arithmetic
//! - Formula evaluation (AST → number) against a table of variable values
//! - An allow-listed function registry (ceiling only)
//! - `[CODE]` reference extraction and a dependency graph for ordering formulas
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use takeoff_formula::{evaluate_expression, Evaluation};
//!
//! let values = HashMap::from([("LG".to_string(), 4.0)]);
//! assert_eq!(evaluate_expression("Math.ceil([LG] / 3) * 2", &values), Evaluation::Value(4.0));
//! assert!(evaluate_expression("[LG] *", &values).is_unresolvable());
//! ```

pub mod ast;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod references;

pub use ast::{BinaryOperator, FormulaExpr, UnaryOperator};
pub use dependency::{DependencyGraph, FormulaKey, TopologicalOrder};
pub use error::{FormulaError, FormulaResult, Malformation};
pub use evaluator::{evaluate, evaluate_expression, Evaluation, EvaluationContext, VariableValues};
pub use parser::{parse_formula, MAX_FORMULA_TOKENS, MAX_NESTING_DEPTH};
pub use references::scan_references;

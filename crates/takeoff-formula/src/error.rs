//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Structural defects that make an expression unfit for evaluation
///
/// These are typical of an expression caught halfway through being typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformation {
    /// Expression ends with `+`, `-`, `*` or `/`
    TrailingOperator,
    /// Opening and closing parenthesis counts differ
    UnbalancedParentheses,
    /// Expression starts with `*` or `/`
    LeadingOperator,
    /// Two operators follow each other
    AdjacentOperators,
}

impl std::fmt::Display for Malformation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Malformation::TrailingOperator => "expression ends with an operator",
            Malformation::UnbalancedParentheses => "unbalanced parentheses",
            Malformation::LeadingOperator => "expression starts with '*' or '/'",
            Malformation::AdjacentOperators => "adjacent operators",
        };
        f.write_str(text)
    }
}

/// Errors that can occur during formula parsing or evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Expression rejected before parsing
    #[error("Malformed expression: {0}")]
    Malformed(Malformation),

    /// Formula parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Expression nests too deeply or has too many tokens
    #[error("Formula too complex: {0}")]
    TooComplex(String),

    /// Function not in the allow-list
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Division with a zero divisor
    #[error("Division by zero")]
    DivisionByZero,

    /// Result is infinite or NaN
    #[error("Result is not a finite number")]
    NonFinite,
}

//! # takeoff
//!
//! A materials estimating engine: users describe a job with a few measured
//! quantities, and formulas derive the full bill of materials.
//!
//! ## Features
//!
//! - Groups of variables and formulas, with a built-in catalogue
//! - A closed arithmetic formula language with `[CODE]` references
//! - Order-independent resolution with cycle detection
//! - Import of shared formula sets with per-formula review and merge
//! - Budget aggregation of the resulting items
//!
//! ## Example
//!
//! ```rust
//! use takeoff::prelude::*;
//!
//! let groups = builtin_groups();
//! let channels = groups.find_by_name("Channels").unwrap();
//!
//! let mut inputs = channels.initial_inputs();
//! inputs.set_number("CHANNEL_METERS", 9.0);
//! inputs.set_text("CHANNEL_SIZE", "38x38");
//!
//! let items = channels.resolve(&inputs);
//! assert_eq!(items[0], CalculatedItem::new("Channel 38x38", 9.0, "meters"));
//! assert!(items.iter().any(|i| i.name == "I-Splice" && i.quantity == 6.0));
//! ```

pub mod budget;
pub mod error;
pub mod import;
pub mod prelude;
pub mod resolution;

pub use budget::{Budget, BudgetItem};
pub use error::{Error, ImportError, Result};
pub use import::{
    diff, merge, parse_import_document, to_document, CandidateStatus, FormulaDiff,
    ImportCandidate, ImportSelection,
};
pub use resolution::{
    resolve, resolve_with_options, FormulaOutcome, FormulaReport, GroupResolveExt, Resolution,
    ResolutionStats, ResolutionStrategy, ResolveOptions, Unresolved,
};

// Re-export core types
pub use takeoff_core::{
    builtin_groups, sanitize_code, CalculatedItem, CalculationGroup, Formula, GroupCollection,
    InputState, InputValue, Variable, VariableUpdate, DEFAULT_UNIT,
};

// Re-export formula types
pub use takeoff_formula::{
    evaluate_expression, parse_formula, scan_references, Evaluation, FormulaError, FormulaExpr,
    Malformation,
};

//! # takeoff-core
//!
//! Core data structures for the takeoff estimating engine.
//!
//! This crate provides the types shared by the formula engine and the import
//! merger:
//! - [`Variable`] and [`Formula`] - named quantities and their derivations
//! - [`CalculationGroup`] - an independent bundle of variables and formulas
//! - [`GroupCollection`] - the never-empty set of groups a user works with
//! - [`InputState`] - raw values typed by the user, keyed by variable code
//! - [`CalculatedItem`] - a `(name, quantity, unit)` output record
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::builtin_groups;
//!
//! let groups = builtin_groups();
//! let lighting = groups.find_by_name("lighting").unwrap();
//!
//! let mut inputs = lighting.initial_inputs();
//! inputs.set_number("LG", 4.0);
//! assert_eq!(inputs.numeric("LG"), 4.0);
//! ```

pub mod collection;
pub mod defaults;
pub mod error;
pub mod formula;
pub mod group;
pub mod input;
pub mod item;
pub mod variable;

pub use collection::GroupCollection;
pub use defaults::builtin_groups;
pub use error::{Error, Result};
pub use formula::Formula;
pub use group::{sanitize_code, CalculationGroup, VariableUpdate};
pub use input::{InputState, InputValue};
pub use item::CalculatedItem;
pub use variable::Variable;

/// Unit shown for plain inputs that do not declare one
pub const DEFAULT_UNIT: &str = "un";

/// Name given to groups created without a name
pub const NEW_GROUP_NAME: &str = "New Group";

/// Name given to freshly added formulas
pub const NEW_FORMULA_NAME: &str = "New Item";

/// Description given to freshly added numeric variables
pub const NEW_VARIABLE_DESCRIPTION: &str = "New Variable";

/// Description given to freshly added info variables
pub const NEW_INFO_DESCRIPTION: &str = "New Info";

/// Generate a fresh opaque identifier with a readable prefix
pub fn new_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}

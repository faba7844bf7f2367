//! Allow-listed functions
//!
//! Formulas may call only the functions registered here. Anything else is
//! rejected as [`FormulaError::UnknownFunction`] before its arguments are
//! evaluated.

use crate::error::FormulaResult;
use std::collections::HashMap;

/// Function implementation signature
pub type FunctionImpl = fn(&[f64]) -> FormulaResult<f64>;

/// Function definition
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Alternative spellings, uppercase
    pub aliases: &'static [&'static str],
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
}

/// Function registry
pub struct FunctionRegistry {
    functions: Vec<FunctionDef>,
    by_name: HashMap<String, usize>,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: Vec::new(),
            by_name: HashMap::new(),
        };

        // CEIL, also written Math.ceil
        registry.register(FunctionDef {
            name: "CEIL",
            aliases: &["MATH.CEIL"],
            min_args: 1,
            max_args: Some(1),
            implementation: fn_ceil,
        });

        registry
    }

    /// Look up a function by name or alias, ignoring case
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.by_name
            .get(&name.to_uppercase())
            .map(|&index| &self.functions[index])
    }

    /// Register a function under its name and aliases
    pub fn register(&mut self, def: FunctionDef) {
        let index = self.functions.len();
        self.by_name.insert(def.name.to_uppercase(), index);
        for alias in def.aliases {
            self.by_name.insert(alias.to_uppercase(), index);
        }
        self.functions.push(def);
    }

    /// Canonical names of all registered functions
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.functions.iter().map(|def| def.name)
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Smallest integer not less than the argument
fn fn_ceil(args: &[f64]) -> FormulaResult<f64> {
    Ok(args.first().copied().unwrap_or(0.0).ceil())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = FunctionRegistry::new();
        for name in ["ceil", "CEIL", "Math.ceil", "MATH.CEIL", "math.Ceil"] {
            assert_eq!(registry.get(name).map(|f| f.name), Some("CEIL"), "{}", name);
        }
        assert!(registry.get("floor").is_none());
        assert!(registry.get("Math.max").is_none());
    }

    #[test]
    fn test_ceil() {
        assert_eq!(fn_ceil(&[1.2]).unwrap(), 2.0);
        assert_eq!(fn_ceil(&[3.0]).unwrap(), 3.0);
        assert_eq!(fn_ceil(&[-1.5]).unwrap(), -1.0);
    }

    #[test]
    fn test_names() {
        let registry = FunctionRegistry::new();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["CEIL"]);
    }
}

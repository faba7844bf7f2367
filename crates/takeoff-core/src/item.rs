//! Engine output records

use serde::{Deserialize, Serialize};
use std::fmt;

/// A `(name, quantity, unit)` line produced by resolving a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedItem {
    /// Display name, including any appended info labels
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

impl CalculatedItem {
    pub fn new(name: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit: unit.into(),
        }
    }
}

impl fmt::Display for CalculatedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.name, self.quantity, self.unit)
    }
}

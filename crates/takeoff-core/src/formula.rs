//! Formula definitions

use serde::{Deserialize, Serialize};

/// A named derivation
///
/// `value` is an arithmetic expression that references variables as
/// `[CODE]`, e.g. `Math.ceil([TRAY_METERS] / 2)`. Every formula owns exactly
/// one result variable (see [`Variable::formula_result`](crate::Variable::formula_result)).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Formula {
    pub id: String,
    pub name: String,
    /// Expression text
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub unit: String,
}

impl Formula {
    /// Create a new formula
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            value: value.into(),
            unit: unit.into(),
        }
    }
}

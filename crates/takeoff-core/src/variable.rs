//! Variable definitions

use serde::{Deserialize, Serialize};

/// A named quantity in a calculation group
///
/// A variable is either a plain input typed by the user, an info variable
/// holding free text (size, gauge, brand...), or the named result of exactly
/// one [`Formula`](crate::Formula). Formulas reference variables as `[CODE]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    /// Opaque identifier, stable across edits
    pub id: String,
    /// Symbolic name, unique within the group
    pub code: String,
    /// Human-readable label
    #[serde(default)]
    pub description: String,
    /// Free-text annotation, never used as a number
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_info: bool,
    /// Output of the formula named by `formula_id`
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_formula_result: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula_id: Option<String>,
    /// Info codes whose text is appended to this variable's label
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub info_dependencies: Vec<String>,
    /// Unit override for plain inputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Variable {
    /// Create a plain numeric input variable
    pub fn input(
        id: impl Into<String>,
        code: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    /// Create a free-text info variable
    pub fn info(
        id: impl Into<String>,
        code: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            is_info: true,
            ..Self::input(id, code, description)
        }
    }

    /// Create the result variable of a formula
    pub fn formula_result(
        id: impl Into<String>,
        code: impl Into<String>,
        description: impl Into<String>,
        formula_id: impl Into<String>,
    ) -> Self {
        Self {
            is_formula_result: true,
            formula_id: Some(formula_id.into()),
            ..Self::input(id, code, description)
        }
    }

    /// Set the unit of measure
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Set the info codes appended to this variable's label
    pub fn with_info_dependencies<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.info_dependencies = codes.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the value comes from the user rather than a formula
    pub fn is_plain_input(&self) -> bool {
        !self.is_formula_result
    }

    /// Whether this is a numeric user input (reported as a line item)
    pub fn is_quantity_input(&self) -> bool {
        !self.is_formula_result && !self.is_info
    }

    /// Whether this variable is the result of the given formula
    pub fn is_result_of(&self, formula_id: &str) -> bool {
        self.is_formula_result && self.formula_id.as_deref() == Some(formula_id)
    }

    /// Unit shown next to this variable's quantity
    pub fn display_unit(&self) -> &str {
        self.unit.as_deref().unwrap_or(crate::DEFAULT_UNIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let v = Variable::input("v1", "LG", "Large Luminaires");
        assert!(v.is_plain_input());
        assert!(v.is_quantity_input());
        assert_eq!(v.display_unit(), "un");

        let info = Variable::info("v2", "GAUGE", "Gauge");
        assert!(info.is_plain_input());
        assert!(!info.is_quantity_input());

        let result = Variable::formula_result("v3", "PLUG", "Plug", "f1");
        assert!(!result.is_plain_input());
        assert!(result.is_result_of("f1"));
        assert!(!result.is_result_of("f2"));
    }

    #[test]
    fn test_json_shape() {
        let v = Variable::input("var-p1", "CHANNEL_METERS", "Channel")
            .with_unit("meters")
            .with_info_dependencies(["CHANNEL_SIZE", "GAUGE"]);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "var-p1",
                "code": "CHANNEL_METERS",
                "description": "Channel",
                "infoDependencies": ["CHANNEL_SIZE", "GAUGE"],
                "unit": "meters"
            })
        );

        let parsed: Variable = serde_json::from_str(
            r#"{"id":"v","code":"X","description":"X","isFormulaResult":true,"formulaId":"f"}"#,
        )
        .unwrap();
        assert!(parsed.is_result_of("f"));
        assert!(!parsed.is_info);
    }
}

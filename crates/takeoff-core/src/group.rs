//! Calculation groups
//!
//! A group bundles the variables and formulas of one domain area
//! ("Lighting", "Conduit", ...). Groups never reference each other, so each
//! one is resolved on its own.

use crate::error::{Error, Result};
use crate::input::InputState;
use crate::{new_id, Formula, Variable};
use serde::{Deserialize, Serialize};

/// A named, independently resolvable bundle of variables and formulas
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub formulas: Vec<Formula>,
}

/// A single-field edit applied by [`CalculationGroup::update_variable`]
#[derive(Debug, Clone, PartialEq)]
pub enum VariableUpdate {
    Code(String),
    Description(String),
    Unit(Option<String>),
    IsInfo(bool),
}

/// Normalize a name into a variable code: uppercase ASCII letters and digits,
/// everything else becomes `_`
pub fn sanitize_code(name: &str) -> String {
    name.chars()
        .map(|c| {
            let c = c.to_ascii_uppercase();
            if c.is_ascii_uppercase() || c.is_ascii_digit() {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl CalculationGroup {
    /// Create an empty group
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            variables: Vec::new(),
            formulas: Vec::new(),
        }
    }

    /// Group names match case-insensitively, ignoring surrounding whitespace
    pub fn name_key(&self) -> String {
        name_key(&self.name)
    }

    // === Lookup ===

    pub fn variable(&self, id: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.id == id)
    }

    pub fn variable_by_code(&self, code: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.code == code)
    }

    pub fn formula(&self, id: &str) -> Option<&Formula> {
        self.formulas.iter().find(|f| f.id == id)
    }

    pub fn formula_by_name(&self, name: &str) -> Option<&Formula> {
        self.formulas.iter().find(|f| f.name == name)
    }

    /// The variable holding the result of the given formula
    pub fn result_variable(&self, formula_id: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.is_result_of(formula_id))
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.variables.iter().any(|v| v.code == code)
    }

    /// Return `base` if unused, otherwise the first free `base_1`, `base_2`, ...
    pub fn unique_code(&self, base: &str) -> String {
        if !self.has_code(base) {
            return base.to_string();
        }
        let mut counter = 1;
        loop {
            let candidate = format!("{}_{}", base, counter);
            if !self.has_code(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    /// Fresh input state: every plain input mapped to an empty value
    pub fn initial_inputs(&self) -> InputState {
        let mut inputs = InputState::new();
        for variable in self.variables.iter().filter(|v| v.is_plain_input()) {
            inputs.set_text(variable.code.clone(), "");
        }
        inputs
    }

    // === Editing ===

    /// Add a new numeric or info variable with a generated `VAR{n}` code
    pub fn add_variable(&mut self, is_info: bool) -> &Variable {
        let mut counter = self.variables.len() + 1;
        let mut code = format!("VAR{}", counter);
        while self.has_code(&code) {
            counter += 1;
            code = format!("VAR{}", counter);
        }

        let description = if is_info {
            crate::NEW_INFO_DESCRIPTION
        } else {
            crate::NEW_VARIABLE_DESCRIPTION
        };
        let mut variable = Variable::input(new_id("v"), code, description);
        variable.is_info = is_info;
        self.variables.push(variable);
        &self.variables[self.variables.len() - 1]
    }

    /// Add an empty formula together with its result variable
    ///
    /// Returns the id of the new formula.
    pub fn add_formula(&mut self) -> String {
        let formula_id = new_id("f");
        let name = crate::NEW_FORMULA_NAME;
        let code = self.unique_code(&sanitize_code(name));

        self.formulas.push(Formula::new(
            formula_id.clone(),
            name,
            "",
            crate::DEFAULT_UNIT,
        ));
        self.variables.push(Variable::formula_result(
            new_id("v"),
            code,
            name,
            formula_id.clone(),
        ));
        formula_id
    }

    /// Rename a formula, keeping its result variable's description in sync
    pub fn rename_formula(&mut self, formula_id: &str, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        let formula = self.formula_mut(formula_id)?;
        formula.name = name.clone();
        for variable in self.variables.iter_mut() {
            if variable.is_result_of(formula_id) {
                variable.description = name.clone();
            }
        }
        Ok(())
    }

    /// Replace a formula's expression text
    pub fn set_formula_expression(
        &mut self,
        formula_id: &str,
        value: impl Into<String>,
    ) -> Result<()> {
        self.formula_mut(formula_id)?.value = value.into();
        Ok(())
    }

    pub fn set_formula_unit(&mut self, formula_id: &str, unit: impl Into<String>) -> Result<()> {
        self.formula_mut(formula_id)?.unit = unit.into();
        Ok(())
    }

    /// Remove a formula and its result variable
    pub fn remove_formula(&mut self, formula_id: &str) -> Result<Formula> {
        let index = self
            .formulas
            .iter()
            .position(|f| f.id == formula_id)
            .ok_or_else(|| Error::FormulaNotFound(formula_id.to_string()))?;
        let removed = self.formulas.remove(index);
        self.variables
            .retain(|v| v.formula_id.as_deref() != Some(formula_id));
        Ok(removed)
    }

    /// Apply a single-field edit to a variable
    pub fn update_variable(&mut self, variable_id: &str, update: VariableUpdate) -> Result<()> {
        if let VariableUpdate::Code(code) = &update {
            if self
                .variables
                .iter()
                .any(|v| v.code == *code && v.id != variable_id)
            {
                return Err(Error::DuplicateCode(code.clone()));
            }
        }

        let variable = self.variable_mut(variable_id)?;
        match update {
            VariableUpdate::Code(code) => variable.code = code,
            VariableUpdate::Description(description) => variable.description = description,
            VariableUpdate::Unit(unit) => variable.unit = unit,
            VariableUpdate::IsInfo(is_info) => variable.is_info = is_info,
        }
        Ok(())
    }

    pub fn remove_variable(&mut self, variable_id: &str) -> Result<Variable> {
        let index = self
            .variables
            .iter()
            .position(|v| v.id == variable_id)
            .ok_or_else(|| Error::VariableNotFound(variable_id.to_string()))?;
        Ok(self.variables.remove(index))
    }

    /// Add `info_code` to a variable's info dependencies, or remove it if present
    ///
    /// Returns whether the code is a dependency after the call.
    pub fn toggle_info_dependency(&mut self, variable_id: &str, info_code: &str) -> Result<bool> {
        let variable = self.variable_mut(variable_id)?;
        if let Some(pos) = variable
            .info_dependencies
            .iter()
            .position(|c| c == info_code)
        {
            variable.info_dependencies.remove(pos);
            Ok(false)
        } else {
            variable.info_dependencies.push(info_code.to_string());
            Ok(true)
        }
    }

    fn formula_mut(&mut self, formula_id: &str) -> Result<&mut Formula> {
        self.formulas
            .iter_mut()
            .find(|f| f.id == formula_id)
            .ok_or_else(|| Error::FormulaNotFound(formula_id.to_string()))
    }

    fn variable_mut(&mut self, variable_id: &str) -> Result<&mut Variable> {
        self.variables
            .iter_mut()
            .find(|v| v.id == variable_id)
            .ok_or_else(|| Error::VariableNotFound(variable_id.to_string()))
    }
}

pub(crate) fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> CalculationGroup {
        let mut group = CalculationGroup::new("g1", "Lighting");
        group.variables = vec![
            Variable::input("v1", "LG", "Large Luminaires"),
            Variable::info("v2", "SIZE", "Size"),
            Variable::formula_result("v3", "PLUG", "Plug", "f1"),
        ];
        group.formulas = vec![Formula::new("f1", "Plug", "[LG]", "pc")];
        group
    }

    #[test]
    fn test_sanitize_code() {
        assert_eq!(sanitize_code("New Item"), "NEW_ITEM");
        assert_eq!(sanitize_code("Plugs/Caps 2"), "PLUGS_CAPS_2");
        assert_eq!(sanitize_code("Ø 3/4\""), "__3_4_");
    }

    #[test]
    fn test_unique_code() {
        let mut group = sample();
        assert_eq!(group.unique_code("NUT"), "NUT");
        assert_eq!(group.unique_code("LG"), "LG_1");

        group.variables.push(Variable::input("v4", "LG_1", "Other"));
        assert_eq!(group.unique_code("LG"), "LG_2");
    }

    #[test]
    fn test_add_variable_codes() {
        let mut group = sample();
        let code = group.add_variable(false).code.clone();
        assert_eq!(code, "VAR4");

        // VAR6 already taken: the counter skips ahead
        group.variables.push(Variable::input("x", "VAR6", "Taken"));
        let info = group.add_variable(true);
        assert_eq!(info.code, "VAR7");
        assert!(info.is_info);
        assert_eq!(info.description, "New Info");
    }

    #[test]
    fn test_add_formula_pairs_result_variable() {
        let mut group = sample();
        let first = group.add_formula();
        let second = group.add_formula();

        assert_eq!(group.result_variable(&first).unwrap().code, "NEW_ITEM");
        assert_eq!(group.result_variable(&second).unwrap().code, "NEW_ITEM_1");
        assert_eq!(group.formula(&first).unwrap().unit, "un");
        assert_eq!(group.formulas.len(), 3);
    }

    #[test]
    fn test_rename_formula_syncs_result_description() {
        let mut group = sample();
        group.rename_formula("f1", "Plug 10A").unwrap();
        assert_eq!(group.formula("f1").unwrap().name, "Plug 10A");
        assert_eq!(group.result_variable("f1").unwrap().description, "Plug 10A");
        assert_eq!(
            group.rename_formula("nope", "x"),
            Err(Error::FormulaNotFound("nope".into()))
        );
    }

    #[test]
    fn test_remove_formula_removes_result_variable() {
        let mut group = sample();
        group.remove_formula("f1").unwrap();
        assert!(group.formulas.is_empty());
        assert!(group.variable_by_code("PLUG").is_none());
        assert_eq!(group.variables.len(), 2);
    }

    #[test]
    fn test_update_variable_rejects_duplicate_code() {
        let mut group = sample();
        assert_eq!(
            group.update_variable("v1", VariableUpdate::Code("PLUG".into())),
            Err(Error::DuplicateCode("PLUG".into()))
        );
        group
            .update_variable("v1", VariableUpdate::Code("LARGE".into()))
            .unwrap();
        assert!(group.has_code("LARGE"));

        group
            .update_variable("v1", VariableUpdate::Unit(Some("pc".into())))
            .unwrap();
        assert_eq!(group.variable("v1").unwrap().display_unit(), "pc");
    }

    #[test]
    fn test_toggle_info_dependency() {
        let mut group = sample();
        assert!(group.toggle_info_dependency("v1", "SIZE").unwrap());
        assert!(group.toggle_info_dependency("v1", "GAUGE").unwrap());
        assert_eq!(
            group.variable("v1").unwrap().info_dependencies,
            vec!["SIZE".to_string(), "GAUGE".to_string()]
        );
        assert!(!group.toggle_info_dependency("v1", "SIZE").unwrap());
        assert_eq!(
            group.variable("v1").unwrap().info_dependencies,
            vec!["GAUGE".to_string()]
        );
    }

    #[test]
    fn test_initial_inputs_cover_plain_variables() {
        let inputs = sample().initial_inputs();
        assert_eq!(inputs.len(), 2);
        assert!(inputs.get("LG").is_some());
        assert!(inputs.get("SIZE").is_some());
        assert!(inputs.get("PLUG").is_none());
    }
}

//! Formula set import
//!
//! Formula sets travel between users as JSON documents: an array of
//! calculation groups, the same shape [`to_document`] writes. Importing is a
//! three-step affair:
//!
//! 1. [`parse_import_document`] validates the document as a whole.
//! 2. [`diff`] compares it against the active groups and lists what is new or
//!    changed, formula by formula.
//! 3. [`merge`] applies the formulas the user kept selected, pulling in the
//!    result variables and plain inputs they need.
//!
//! Groups are matched by name, ignoring case and surrounding whitespace;
//! formulas within a group are matched by exact name.

use crate::error::ImportError;
use crate::{CalculationGroup, Formula, Variable};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use takeoff_core::new_id;
use takeoff_formula::scan_references;

/// Whether a group or formula is unknown to the active set or differs from it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateStatus {
    New,
    Updated,
}

/// A formula that would change the active set
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaDiff {
    pub formula: Formula,
    pub status: CandidateStatus,
}

/// An incoming group that would change the active set
#[derive(Debug, Clone, PartialEq)]
pub struct ImportCandidate {
    pub group: CalculationGroup,
    pub status: CandidateStatus,
    /// New or changed formulas; unchanged ones are left out
    pub formulas: Vec<FormulaDiff>,
}

/// Formulas chosen for import, by incoming group id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSelection {
    selected: BTreeMap<String, BTreeSet<String>>,
}

impl ImportSelection {
    /// Empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Every listed formula of every candidate
    pub fn all(candidates: &[ImportCandidate]) -> Self {
        let mut selection = Self::new();
        for candidate in candidates {
            for diff in &candidate.formulas {
                selection.select(&candidate.group.id, &diff.formula.id);
            }
        }
        selection
    }

    pub fn select(&mut self, group_id: &str, formula_id: &str) {
        self.selected
            .entry(group_id.to_string())
            .or_default()
            .insert(formula_id.to_string());
    }

    pub fn deselect(&mut self, group_id: &str, formula_id: &str) {
        if let Some(formulas) = self.selected.get_mut(group_id) {
            formulas.remove(formula_id);
            if formulas.is_empty() {
                self.selected.remove(group_id);
            }
        }
    }

    /// Select or deselect every listed formula of one candidate
    pub fn set_group(&mut self, candidate: &ImportCandidate, select: bool) {
        for diff in &candidate.formulas {
            if select {
                self.select(&candidate.group.id, &diff.formula.id);
            } else {
                self.deselect(&candidate.group.id, &diff.formula.id);
            }
        }
    }

    pub fn is_selected(&self, group_id: &str, formula_id: &str) -> bool {
        self.selected
            .get(group_id)
            .map_or(false, |formulas| formulas.contains(formula_id))
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Number of selected formulas across all groups
    pub fn len(&self) -> usize {
        self.selected.values().map(BTreeSet::len).sum()
    }
}

/// Parse and validate a formula set document
///
/// The whole document is rejected on the first problem; nothing is partially
/// imported.
pub fn parse_import_document(json: &str) -> Result<Vec<CalculationGroup>, ImportError> {
    let document: serde_json::Value = serde_json::from_str(json)?;
    let elements = document.as_array().ok_or(ImportError::NotAnArray)?;

    for (index, element) in elements.iter().enumerate() {
        for field in ["id", "name"] {
            let present = element
                .get(field)
                .and_then(serde_json::Value::as_str)
                .map_or(false, |value| !value.is_empty());
            if !present {
                return Err(ImportError::MissingField { index, field });
            }
        }
    }

    elements
        .iter()
        .enumerate()
        .map(|(index, element)| {
            CalculationGroup::deserialize(element)
                .map_err(|source| ImportError::Invalid { index, source })
        })
        .collect()
}

/// Write groups as a formula set document
pub fn to_document(groups: &[CalculationGroup]) -> Result<String, ImportError> {
    Ok(serde_json::to_string_pretty(groups)?)
}

/// List the incoming groups that would change `active`
///
/// Groups identical to their active counterpart are skipped, as are changed
/// groups whose formulas are all unchanged.
pub fn diff(incoming: &[CalculationGroup], active: &[CalculationGroup]) -> Vec<ImportCandidate> {
    let mut candidates = Vec::new();

    for group in incoming {
        let existing = find_group(active, &group.name_key());

        let candidate = match existing {
            None => ImportCandidate {
                group: group.clone(),
                status: CandidateStatus::New,
                formulas: group
                    .formulas
                    .iter()
                    .map(|formula| FormulaDiff {
                        formula: formula.clone(),
                        status: CandidateStatus::New,
                    })
                    .collect(),
            },
            Some(existing) if existing == group => continue,
            Some(existing) => {
                let formulas: Vec<FormulaDiff> = group
                    .formulas
                    .iter()
                    .filter_map(|formula| {
                        let status = match existing.formula_by_name(&formula.name) {
                            None => CandidateStatus::New,
                            Some(current) if current != formula => CandidateStatus::Updated,
                            Some(_) => return None,
                        };
                        Some(FormulaDiff {
                            formula: formula.clone(),
                            status,
                        })
                    })
                    .collect();
                if formulas.is_empty() {
                    continue;
                }
                ImportCandidate {
                    group: group.clone(),
                    status: CandidateStatus::Updated,
                    formulas,
                }
            }
        };

        candidates.push(candidate);
    }

    candidates
}

/// Apply the selected formulas of `candidates` to a copy of `active`
///
/// For every selected formula the formula is upserted by name, its result
/// variable is upserted by description, and plain inputs it references that
/// the target group lacks are copied over. Candidates without a matching
/// active group become new groups holding only the selected content.
///
/// Incoming ids are kept unless they are already taken in the merged set, in
/// which case the group, formula or variable gets a fresh id.
pub fn merge(
    selection: &ImportSelection,
    candidates: &[ImportCandidate],
    active: &[CalculationGroup],
) -> Vec<CalculationGroup> {
    let mut groups = active.to_vec();

    for candidate in candidates {
        let incoming = &candidate.group;
        let selected: Vec<&Formula> = incoming
            .formulas
            .iter()
            .filter(|f| selection.is_selected(&incoming.id, &f.id))
            .collect();
        if selected.is_empty() {
            continue;
        }

        let key = incoming.name_key();
        let index = match groups.iter().position(|g| g.name_key() == key) {
            Some(index) => index,
            None => {
                let id = if groups.iter().any(|g| g.id == incoming.id) {
                    let id = new_id("group");
                    tracing::debug!(from = %incoming.id, to = %id, "reassigned taken group id");
                    id
                } else {
                    incoming.id.clone()
                };
                groups.push(CalculationGroup::new(id, incoming.name.clone()));
                groups.len() - 1
            }
        };
        let target = &mut groups[index];

        for formula in &selected {
            merge_formula(target, incoming, formula);
        }

        tracing::info!(
            group = %target.name,
            formulas = selected.len(),
            "merged imported formulas"
        );
    }

    groups
}

fn find_group<'a>(groups: &'a [CalculationGroup], key: &str) -> Option<&'a CalculationGroup> {
    groups.iter().find(|g| g.name_key() == key)
}

fn merge_formula(target: &mut CalculationGroup, incoming: &CalculationGroup, formula: &Formula) {
    let mut merged = formula.clone();
    let existing = target.formulas.iter().position(|f| f.name == formula.name);

    // An id held by another formula would make two formulas share a result
    let id_taken = target
        .formulas
        .iter()
        .enumerate()
        .any(|(pos, f)| f.id == merged.id && Some(pos) != existing);
    if id_taken {
        merged.id = new_id("f");
        tracing::debug!(
            group = %target.name,
            from = %formula.id,
            to = %merged.id,
            "reassigned taken formula id"
        );
    }
    let formula_id = merged.id.clone();

    // Formula, by name
    let previous_id = match existing {
        Some(pos) => {
            let previous = std::mem::replace(&mut target.formulas[pos], merged);
            Some(previous.id)
        }
        None => {
            target.formulas.push(merged);
            None
        }
    };

    // Result variable, by description
    if let Some(result) = incoming.result_variable(&formula.id) {
        let mut result = result.clone();
        result.formula_id = Some(formula_id);

        let slot = target
            .variables
            .iter()
            .position(|v| v.is_formula_result && v.description == result.description)
            .or_else(|| {
                let previous_id = previous_id.as_deref()?;
                target.variables.iter().position(|v| v.is_result_of(previous_id))
            });
        upsert_result_variable(target, slot, result);
    }

    // Plain inputs the expression reads
    for code in scan_references(&formula.value) {
        let Some(variable) = incoming.variable_by_code(&code) else {
            continue;
        };
        if variable.is_formula_result || target.has_code(&code) {
            continue;
        }
        let mut variable = variable.clone();
        if target.variable(&variable.id).is_some() {
            variable.id = new_id("v");
        }
        tracing::debug!(group = %target.name, %code, "copied input variable");
        target.variables.push(variable);
    }
}

fn upsert_result_variable(target: &mut CalculationGroup, slot: Option<usize>, mut result: Variable) {
    let position = slot.map(|pos| {
        target.variables.remove(pos);
        pos
    });

    if target.variable(&result.id).is_some() {
        result.id = new_id("v");
    }

    if target.has_code(&result.code) {
        let code = target.unique_code(&result.code);
        tracing::debug!(
            group = %target.name,
            from = %result.code,
            to = %code,
            "renamed colliding result variable"
        );
        result.code = code;
    }

    match position {
        Some(pos) => target.variables.insert(pos, result),
        None => target.variables.push(result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> CalculationGroup {
        let mut group = CalculationGroup::new("g1", "Lighting");
        group.variables = vec![
            Variable::input("v1", "LG", "Large"),
            Variable::formula_result("vf1", "PLUG", "Plug", "f1"),
        ];
        group.formulas = vec![Formula::new("f1", "Plug", "[LG]", "pc")];
        group
    }

    #[test]
    fn test_selection() {
        let mut selection = ImportSelection::new();
        selection.select("g", "f1");
        selection.select("g", "f2");
        assert!(selection.is_selected("g", "f1"));
        assert_eq!(selection.len(), 2);

        selection.deselect("g", "f1");
        selection.deselect("g", "f2");
        assert!(!selection.is_selected("g", "f1"));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_set_group() {
        let candidates = diff(&[sample()], &[]);
        let mut selection = ImportSelection::all(&candidates);
        assert!(selection.is_selected("g1", "f1"));

        selection.set_group(&candidates[0], false);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_result_code_collision_is_suffixed() {
        let mut active = CalculationGroup::new("a1", "lighting");
        active.variables = vec![Variable::input("x", "PLUG", "Plug count typed by hand")];

        let candidates = diff(&[sample()], &[active.clone()]);
        let merged = merge(&ImportSelection::all(&candidates), &candidates, &[active]);

        let codes: Vec<&str> = merged[0].variables.iter().map(|v| v.code.as_str()).collect();
        assert_eq!(codes, vec!["PLUG", "PLUG_1", "LG"]);
        assert_eq!(merged[0].result_variable("f1").map(|v| v.code.as_str()), Some("PLUG_1"));
    }

    #[test]
    fn test_replaced_formula_reuses_result_slot() {
        let mut active = sample();
        active.formulas[0].id = "old".into();
        active.variables[1] = Variable::formula_result("vold", "PLUG", "Plugs", "old");

        let incoming = sample();
        let candidates = diff(&[incoming], &[active.clone()]);
        assert_eq!(candidates[0].formulas[0].status, CandidateStatus::Updated);

        let merged = merge(&ImportSelection::all(&candidates), &candidates, &[active]);
        assert_eq!(merged[0].variables.len(), 2);
        assert_eq!(merged[0].variables[1].id, "vf1");
    }

    #[test]
    fn test_to_document_round_trips_through_parser() {
        let document = to_document(&[sample()]).unwrap();
        assert_eq!(parse_import_document(&document).unwrap(), vec![sample()]);
    }
}

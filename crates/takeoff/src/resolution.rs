//! Group resolution engine
//!
//! Turns a calculation group plus the user's raw inputs into the list of
//! [`CalculatedItem`]s: every positive quantity input, then every formula
//! whose result comes out positive.
//!
//! Formulas may read each other's results through their result variables'
//! codes, in any declaration order. Two strategies order that work:
//!
//! - [`ResolutionStrategy::Topological`] builds a [`DependencyGraph`] over the
//!   formulas and evaluates them once each, in dependency order. Formulas on a
//!   cycle are reported as [`Unresolved::CircularReference`].
//! - [`ResolutionStrategy::FixedPoint`] sweeps the pending formulas
//!   repeatedly, resolving whatever has become evaluable, until a sweep makes
//!   no progress.
//!
//! Both produce the same items. Resolution never fails: anything that cannot
//! be evaluated is left out of the items and reported in
//! [`Resolution::unresolved`].
//!
//! # Example
//!
//! ```rust
//! use takeoff::prelude::*;
//!
//! let groups = builtin_groups();
//! let lighting = groups.find_by_name("Lighting").unwrap();
//!
//! let mut inputs = lighting.initial_inputs();
//! inputs.set_number("LG", 4.0);
//!
//! let items = lighting.resolve(&inputs);
//! assert_eq!(items[0].name, "Large Luminaires");
//! assert_eq!(items[0].quantity, 4.0);
//! ```

use crate::{CalculatedItem, CalculationGroup, Formula, FormulaError, InputState, Variable};
use ahash::AHashMap;
use std::fmt;
use takeoff_formula::{
    evaluate, parse_formula, DependencyGraph, EvaluationContext, FormulaExpr, FormulaKey,
};

/// How formulas are ordered for evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionStrategy {
    /// Dependency graph, evaluated once in topological order
    #[default]
    Topological,
    /// Repeated sweeps until nothing changes
    FixedPoint,
}

/// Options for group resolution
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub strategy: ResolutionStrategy,
    /// Sweeps allowed beyond the formula count (fixed-point only, default: 5)
    pub extra_passes: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            strategy: ResolutionStrategy::default(),
            extra_passes: 5,
        }
    }
}

/// Why a formula has no value
#[derive(Debug, Clone, PartialEq)]
pub enum Unresolved {
    /// The expression itself is malformed or failed to evaluate
    Expression(FormulaError),
    /// The formula reads its own result, directly or through others
    CircularReference,
    /// A formula result this one reads is unresolved
    Dependency(String),
    /// No variable holds this formula's result
    MissingResultVariable,
    /// Fixed-point sweeps stopped making progress
    Stalled,
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unresolved::Expression(e) => write!(f, "{}", e),
            Unresolved::CircularReference => f.write_str("circular reference"),
            Unresolved::Dependency(code) => write!(f, "depends on unresolved [{}]", code),
            Unresolved::MissingResultVariable => f.write_str("no result variable"),
            Unresolved::Stalled => f.write_str("no progress"),
        }
    }
}

/// Per-formula outcome; a resolved zero is still resolved
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaOutcome {
    Resolved(f64),
    Unresolved(Unresolved),
}

impl FormulaOutcome {
    pub fn value(&self) -> Option<f64> {
        match self {
            FormulaOutcome::Resolved(v) => Some(*v),
            FormulaOutcome::Unresolved(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, FormulaOutcome::Resolved(_))
    }
}

/// Outcome of one formula, in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaReport {
    pub formula_id: String,
    pub name: String,
    pub outcome: FormulaOutcome,
}

/// Statistics from a resolution run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    /// Total number of formulas in the group
    pub formula_count: usize,
    /// Number of formulas with a value
    pub resolved: usize,
    /// Number of formulas without a value
    pub unresolved: usize,
    /// Number of formulas on a cycle
    pub circular_references: usize,
    /// Evaluation sweeps performed (1 for topological)
    pub passes: usize,
}

/// Full result of resolving a group
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Reported line items
    pub items: Vec<CalculatedItem>,
    /// One report per formula, in declaration order
    pub formulas: Vec<FormulaReport>,
    pub stats: ResolutionStats,
}

impl Resolution {
    /// Formulas that have no value, with the reason
    pub fn unresolved(&self) -> impl Iterator<Item = (&FormulaReport, &Unresolved)> {
        self.formulas.iter().filter_map(|report| match &report.outcome {
            FormulaOutcome::Unresolved(reason) => Some((report, reason)),
            FormulaOutcome::Resolved(_) => None,
        })
    }

    /// Value of a formula by id, if it resolved
    pub fn value_of(&self, formula_id: &str) -> Option<f64> {
        self.formulas
            .iter()
            .find(|report| report.formula_id == formula_id)
            .and_then(|report| report.outcome.value())
    }
}

/// Resolve a group with default options and return its line items
pub fn resolve(group: &CalculationGroup, inputs: &InputState) -> Vec<CalculatedItem> {
    resolve_with_options(group, inputs, &ResolveOptions::default()).items
}

/// Resolve a group and report the outcome of every formula
pub fn resolve_with_options(
    group: &CalculationGroup,
    inputs: &InputState,
    options: &ResolveOptions,
) -> Resolution {
    let mut engine = ResolutionEngine::new(group, inputs);
    let mut stats = ResolutionStats {
        formula_count: group.formulas.len(),
        ..Default::default()
    };

    match options.strategy {
        ResolutionStrategy::Topological => engine.run_topological(&mut stats),
        ResolutionStrategy::FixedPoint => engine.run_fixed_point(options.extra_passes, &mut stats),
    }

    let formulas = engine.reports();
    stats.resolved = formulas.iter().filter(|r| r.outcome.is_resolved()).count();
    stats.unresolved = stats.formula_count - stats.resolved;

    for report in &formulas {
        if let FormulaOutcome::Unresolved(reason) = &report.outcome {
            tracing::debug!(
                group = %group.name,
                formula = %report.name,
                %reason,
                "formula left unresolved"
            );
        }
    }
    tracing::trace!(group = %group.name, ?stats, "group resolved");

    let items = emit_items(group, inputs, &formulas);
    Resolution {
        items,
        formulas,
        stats,
    }
}

/// Extension trait for CalculationGroup to add resolution methods
pub trait GroupResolveExt {
    /// Resolve with default options and return the line items
    fn resolve(&self, inputs: &InputState) -> Vec<CalculatedItem>;

    /// Resolve with custom options
    fn resolve_with_options(&self, inputs: &InputState, options: &ResolveOptions) -> Resolution;
}

impl GroupResolveExt for CalculationGroup {
    fn resolve(&self, inputs: &InputState) -> Vec<CalculatedItem> {
        resolve(self, inputs)
    }

    fn resolve_with_options(&self, inputs: &InputState, options: &ResolveOptions) -> Resolution {
        resolve_with_options(self, inputs, options)
    }
}

/// A formula parsed once, ahead of evaluation
struct CompiledFormula<'g> {
    formula: &'g Formula,
    result: Option<&'g Variable>,
    ast: Result<FormulaExpr, FormulaError>,
    /// Referenced codes that hold other formulas' results
    result_refs: Vec<String>,
}

/// The resolution engine
struct ResolutionEngine<'g> {
    compiled: Vec<CompiledFormula<'g>>,
    /// Result code → index of the formula producing it
    result_owners: AHashMap<&'g str, usize>,
    /// Plain input values, then resolved results as they come in
    values: AHashMap<String, f64>,
    outcomes: Vec<Option<FormulaOutcome>>,
}

impl<'g> ResolutionEngine<'g> {
    fn new(group: &'g CalculationGroup, inputs: &InputState) -> Self {
        let values: AHashMap<String, f64> = group
            .variables
            .iter()
            .filter(|v| v.is_plain_input())
            .map(|v| (v.code.clone(), inputs.numeric(&v.code)))
            .collect();

        let mut result_owners = AHashMap::new();
        let mut compiled = Vec::with_capacity(group.formulas.len());
        for (index, formula) in group.formulas.iter().enumerate() {
            let result = group.result_variable(&formula.id);
            if let Some(variable) = result {
                result_owners.entry(variable.code.as_str()).or_insert(index);
            }
            compiled.push(CompiledFormula {
                formula,
                result,
                ast: parse_formula(&formula.value),
                result_refs: Vec::new(),
            });
        }

        for entry in compiled.iter_mut() {
            if let Ok(ast) = &entry.ast {
                entry.result_refs = ast
                    .references()
                    .into_iter()
                    .filter(|code| result_owners.contains_key(code.as_str()))
                    .collect();
            }
        }

        let outcomes = vec![None; compiled.len()];
        Self {
            compiled,
            result_owners,
            values,
            outcomes,
        }
    }

    /// Evaluate one formula against the values known so far
    ///
    /// `Err` carries the reason when it cannot be evaluated yet or at all.
    fn try_evaluate(&self, index: usize) -> Result<f64, Unresolved> {
        let entry = &self.compiled[index];
        let ast = entry.ast.as_ref().map_err(|e| Unresolved::Expression(e.clone()))?;

        if let Some(code) = entry
            .result_refs
            .iter()
            .find(|code| !self.values.contains_key(code.as_str()))
        {
            return Err(Unresolved::Dependency(code.clone()));
        }

        let ctx = EvaluationContext::new(&self.values);
        match evaluate(ast, &ctx) {
            Ok(value) if value.is_finite() => Ok(value),
            Ok(_) => Err(Unresolved::Expression(FormulaError::NonFinite)),
            Err(e) => Err(Unresolved::Expression(e)),
        }
    }

    fn record(&mut self, index: usize, outcome: FormulaOutcome) {
        if let (FormulaOutcome::Resolved(value), Some(variable)) =
            (&outcome, self.compiled[index].result)
        {
            // Only the first formula claiming a code publishes it
            if self.result_owners.get(variable.code.as_str()) == Some(&index) {
                self.values.insert(variable.code.clone(), *value);
            }
        }
        self.outcomes[index] = Some(outcome);
    }

    /// Indices of formulas that have a result variable; the rest are
    /// reported right away
    fn evaluable(&mut self) -> Vec<usize> {
        let mut evaluable = Vec::with_capacity(self.compiled.len());
        for index in 0..self.compiled.len() {
            if self.compiled[index].result.is_some() {
                evaluable.push(index);
            } else {
                self.outcomes[index] = Some(FormulaOutcome::Unresolved(
                    Unresolved::MissingResultVariable,
                ));
            }
        }
        evaluable
    }

    fn run_topological(&mut self, stats: &mut ResolutionStats) {
        let evaluable = self.evaluable();

        let mut graph = DependencyGraph::new();
        for &index in &evaluable {
            for code in &self.compiled[index].result_refs {
                if let Some(&owner) = self.result_owners.get(code.as_str()) {
                    graph.add_dependency(FormulaKey(owner), FormulaKey(index));
                }
            }
        }

        let keys: Vec<FormulaKey> = evaluable.iter().copied().map(FormulaKey).collect();
        let order = graph.topological_order(&keys);

        for FormulaKey(index) in order.ordered {
            let outcome = match self.try_evaluate(index) {
                Ok(value) => FormulaOutcome::Resolved(value),
                Err(reason) => FormulaOutcome::Unresolved(reason),
            };
            self.record(index, outcome);
        }

        for key in order.blocked {
            let reason = if graph.is_on_cycle(key) {
                stats.circular_references += 1;
                Unresolved::CircularReference
            } else {
                self.compiled[key.0]
                    .result_refs
                    .iter()
                    .find(|code| !self.values.contains_key(code.as_str()))
                    .map(|code| Unresolved::Dependency(code.clone()))
                    .unwrap_or(Unresolved::CircularReference)
            };
            self.record(key.0, FormulaOutcome::Unresolved(reason));
        }

        stats.passes = 1;
    }

    fn run_fixed_point(&mut self, extra_passes: usize, stats: &mut ResolutionStats) {
        let mut pending = self.evaluable();
        let mut last_failure: AHashMap<usize, Unresolved> = AHashMap::new();
        let max_passes = self.compiled.len() + extra_passes;

        while !pending.is_empty() && stats.passes < max_passes {
            stats.passes += 1;
            let before = pending.len();
            let mut remaining = Vec::with_capacity(pending.len());

            for index in pending {
                match self.try_evaluate(index) {
                    Ok(value) => self.record(index, FormulaOutcome::Resolved(value)),
                    Err(reason) => {
                        last_failure.insert(index, reason);
                        remaining.push(index);
                    }
                }
            }

            let progressed = remaining.len() < before;
            pending = remaining;
            if !progressed {
                break;
            }
        }

        for index in pending {
            let reason = match last_failure.remove(&index) {
                Some(reason @ Unresolved::Expression(_)) => reason,
                _ => Unresolved::Stalled,
            };
            self.record(index, FormulaOutcome::Unresolved(reason));
        }
    }

    fn reports(&self) -> Vec<FormulaReport> {
        self.compiled
            .iter()
            .zip(&self.outcomes)
            .map(|(entry, outcome)| FormulaReport {
                formula_id: entry.formula.id.clone(),
                name: entry.formula.name.clone(),
                outcome: outcome
                    .clone()
                    .unwrap_or(FormulaOutcome::Unresolved(Unresolved::Stalled)),
            })
            .collect()
    }
}

/// Build the line items: positive quantity inputs first, then positive
/// formula results, each in declaration order
fn emit_items(
    group: &CalculationGroup,
    inputs: &InputState,
    formulas: &[FormulaReport],
) -> Vec<CalculatedItem> {
    let mut items = Vec::new();

    for variable in group.variables.iter().filter(|v| v.is_quantity_input()) {
        let quantity = inputs.numeric(&variable.code);
        if quantity <= 0.0 {
            continue;
        }

        let mut name = labelled(&variable.description, &variable.info_dependencies, inputs);
        let specs: Vec<String> = ["_SPEC1", "_SPEC2"]
            .iter()
            .filter_map(|suffix| inputs.label(&format!("{}{}", variable.code, suffix)))
            .filter(|spec| !spec.trim().is_empty())
            .collect();
        if !specs.is_empty() {
            name = format!("{} ({})", name, specs.join("; "));
        }

        items.push(CalculatedItem::new(name, quantity, variable.display_unit()));
    }

    for (formula, report) in group.formulas.iter().zip(formulas) {
        let quantity = match report.outcome {
            FormulaOutcome::Resolved(value) => value.max(0.0),
            FormulaOutcome::Unresolved(_) => continue,
        };
        if quantity <= 0.0 {
            continue;
        }

        let name = match group.result_variable(&formula.id) {
            Some(variable) => labelled(&formula.name, &variable.info_dependencies, inputs),
            None => formula.name.clone(),
        };
        items.push(CalculatedItem::new(name, quantity, formula.unit.clone()));
    }

    items
}

/// Append the present values of the given info codes to a label
fn labelled(base: &str, info_codes: &[String], inputs: &InputState) -> String {
    let info: Vec<String> = info_codes
        .iter()
        .filter_map(|code| inputs.label(code))
        .collect();
    if info.is_empty() {
        base.to_string()
    } else {
        format!("{} {}", base, info.join(" "))
    }
}

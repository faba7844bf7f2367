//! Dependency tracking for formula ordering

use ahash::{AHashMap, AHashSet};
use std::collections::BTreeSet;

/// Key for a formula: its position in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormulaKey(pub usize);

/// Result of ordering a set of formulas
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologicalOrder {
    /// Formulas whose precedents all come earlier, in evaluation order
    pub ordered: Vec<FormulaKey>,
    /// Formulas on a cycle or downstream of one, in declaration order
    pub blocked: Vec<FormulaKey>,
}

/// Dependency graph between formulas
///
/// An edge `precedent -> dependent` means the dependent reads the
/// precedent's result.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Formula → Formulas that depend on it (dependents)
    dependents: AHashMap<FormulaKey, AHashSet<FormulaKey>>,
    /// Formula → Formulas it depends on (precedents)
    precedents: AHashMap<FormulaKey, AHashSet<FormulaKey>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dependency: dependent depends on precedent
    pub fn add_dependency(&mut self, precedent: FormulaKey, dependent: FormulaKey) {
        self.dependents
            .entry(precedent)
            .or_default()
            .insert(dependent);
        self.precedents
            .entry(dependent)
            .or_default()
            .insert(precedent);
    }

    /// Get formulas that depend on the given formula
    pub fn get_dependents(&self, key: FormulaKey) -> impl Iterator<Item = FormulaKey> + '_ {
        self.dependents
            .get(&key)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Get formulas that the given formula depends on
    pub fn get_precedents(&self, key: FormulaKey) -> impl Iterator<Item = FormulaKey> + '_ {
        self.precedents
            .get(&key)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Order `keys` so every formula follows its precedents (Kahn's algorithm)
    ///
    /// Among formulas that are ready at the same time the one declared first
    /// goes first. Edges to formulas outside `keys` are ignored.
    pub fn topological_order(&self, keys: &[FormulaKey]) -> TopologicalOrder {
        let members: AHashSet<FormulaKey> = keys.iter().copied().collect();

        let mut in_degree: AHashMap<FormulaKey, usize> = members
            .iter()
            .map(|&key| {
                let count = self
                    .get_precedents(key)
                    .filter(|p| members.contains(p))
                    .count();
                (key, count)
            })
            .collect();

        let mut ready: BTreeSet<FormulaKey> = in_degree
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(&key, _)| key)
            .collect();

        let mut ordered = Vec::with_capacity(members.len());
        while let Some(key) = ready.pop_first() {
            ordered.push(key);
            for dependent in self.get_dependents(key) {
                if let Some(count) = in_degree.get_mut(&dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        let placed: AHashSet<FormulaKey> = ordered.iter().copied().collect();
        let mut blocked: Vec<FormulaKey> = members
            .into_iter()
            .filter(|key| !placed.contains(key))
            .collect();
        blocked.sort();

        TopologicalOrder { ordered, blocked }
    }

    /// Whether the formula itself lies on a cycle
    pub fn is_on_cycle(&self, key: FormulaKey) -> bool {
        let mut visited = AHashSet::new();
        let mut stack: Vec<FormulaKey> = self.get_precedents(key).collect();
        while let Some(current) = stack.pop() {
            if current == key {
                return true;
            }
            if visited.insert(current) {
                stack.extend(self.get_precedents(current));
            }
        }
        false
    }
}

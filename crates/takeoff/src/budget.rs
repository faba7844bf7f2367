//! Budget aggregation
//!
//! Resolved items are collected into a budget under a sector. Adding the same
//! item to the same sector again accumulates its quantity.

use crate::CalculatedItem;
use serde::{Deserialize, Serialize};

/// A priced line of a budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetItem {
    pub id: u64,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    /// Free-form area of the job ("Ground floor", "Data room", ...)
    pub sector: String,
}

impl BudgetItem {
    pub fn total(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

/// Budget lines in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    items: Vec<BudgetItem>,
    #[serde(default)]
    next_id: u64,
}

impl Budget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[BudgetItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add calculated items under `sector`
    ///
    /// Items with a non-positive quantity are skipped. An item whose
    /// description already exists in the same sector adds to that line's
    /// quantity; anything else becomes a new line with a unit price of 0.
    pub fn add_items(&mut self, items: &[CalculatedItem], sector: &str) {
        for item in items {
            if !(item.quantity > 0.0) {
                continue;
            }

            match self
                .items
                .iter_mut()
                .find(|line| line.description == item.name && line.sector == sector)
            {
                Some(line) => line.quantity += item.quantity,
                None => {
                    let id = self.allocate_id();
                    self.items.push(BudgetItem {
                        id,
                        description: item.name.clone(),
                        quantity: item.quantity,
                        unit_price: 0.0,
                        sector: sector.to_string(),
                    });
                }
            }
        }
    }

    /// Set the unit price of a line; returns false if no line has that id
    pub fn set_unit_price(&mut self, id: u64, unit_price: f64) -> bool {
        match self.items.iter_mut().find(|line| line.id == id) {
            Some(line) => {
                line.unit_price = unit_price;
                true
            }
            None => false,
        }
    }

    pub fn remove_item(&mut self, id: u64) -> Option<BudgetItem> {
        let pos = self.items.iter().position(|line| line.id == id)?;
        Some(self.items.remove(pos))
    }

    /// Sum of quantities in a sector
    pub fn total_quantity(&self, sector: &str) -> f64 {
        self.items
            .iter()
            .filter(|line| line.sector == sector)
            .map(|line| line.quantity)
            .sum()
    }

    /// Sum of line totals across all sectors
    pub fn total_cost(&self) -> f64 {
        self.items.iter().map(BudgetItem::total).sum()
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        while self.items.iter().any(|line| line.id == self.next_id) {
            self.next_id += 1;
        }
        self.next_id
    }
}

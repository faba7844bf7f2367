//! The user's set of calculation groups

use crate::error::{Error, Result};
use crate::group::{name_key, CalculationGroup};
use crate::new_id;
use serde::{Deserialize, Serialize};

/// Ordered collection of calculation groups
///
/// The collection is never empty: construction rejects an empty list and the
/// last remaining group cannot be removed. It serializes as a plain JSON array
/// of groups, the same document shape the import merger reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CalculationGroup>", into = "Vec<CalculationGroup>")]
pub struct GroupCollection {
    groups: Vec<CalculationGroup>,
}

impl GroupCollection {
    /// Wrap a non-empty list of groups
    pub fn new(groups: Vec<CalculationGroup>) -> Result<Self> {
        if groups.is_empty() {
            return Err(Error::EmptyCollection);
        }
        Ok(Self { groups })
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn as_slice(&self) -> &[CalculationGroup] {
        &self.groups
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CalculationGroup> {
        self.groups.iter()
    }

    pub fn into_inner(self) -> Vec<CalculationGroup> {
        self.groups
    }

    pub fn group(&self, id: &str) -> Option<&CalculationGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn group_mut(&mut self, id: &str) -> Result<&mut CalculationGroup> {
        self.groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| Error::GroupNotFound(id.to_string()))
    }

    /// Find a group by name, ignoring case and surrounding whitespace
    pub fn find_by_name(&self, name: &str) -> Option<&CalculationGroup> {
        let key = name_key(name);
        self.groups.iter().find(|g| g.name_key() == key)
    }

    /// Append an empty group and return its id
    ///
    /// Blank names fall back to [`NEW_GROUP_NAME`](crate::NEW_GROUP_NAME).
    pub fn add_group(&mut self, name: &str) -> String {
        let name = match name.trim() {
            "" => crate::NEW_GROUP_NAME,
            trimmed => trimmed,
        };
        let id = new_id("group");
        self.groups.push(CalculationGroup::new(id.clone(), name));
        id
    }

    pub fn rename_group(&mut self, id: &str, name: impl Into<String>) -> Result<()> {
        self.group_mut(id)?.name = name.into();
        Ok(())
    }

    /// Remove a group; the last group cannot be removed
    pub fn remove_group(&mut self, id: &str) -> Result<CalculationGroup> {
        let index = self
            .groups
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| Error::GroupNotFound(id.to_string()))?;
        if self.groups.len() <= 1 {
            return Err(Error::LastGroup);
        }
        Ok(self.groups.remove(index))
    }
}

impl TryFrom<Vec<CalculationGroup>> for GroupCollection {
    type Error = Error;

    fn try_from(groups: Vec<CalculationGroup>) -> Result<Self> {
        Self::new(groups)
    }
}

impl From<GroupCollection> for Vec<CalculationGroup> {
    fn from(collection: GroupCollection) -> Self {
        collection.groups
    }
}

impl<'a> IntoIterator for &'a GroupCollection {
    type Item = &'a CalculationGroup;
    type IntoIter = std::slice::Iter<'a, CalculationGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

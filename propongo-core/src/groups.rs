//! Deliverable group registry.
//!
//! Groups live in the budget section, keyed by an opaque id, and are
//! referenced from line items by that id only. Deleting a group clears
//! every reference to it in the same operation.

use tracing::debug;
use uuid::Uuid;

use crate::error::{ProposalError, ProposalResult};
use crate::models::{BudgetSection, Group, DEFAULT_GROUP_NAME};

/// Prefix shared by every generated group id
pub const GROUP_ID_PREFIX: &str = "del";

/// Generates a fresh group id: a random unique part plus, for imports,
/// the position of the source deliverable
fn new_group_id(position: Option<usize>) -> String {
    let unique = Uuid::new_v4().simple();
    match position {
        Some(index) => format!("{}-{}-{}", GROUP_ID_PREFIX, unique, index),
        None => format!("{}-{}", GROUP_ID_PREFIX, unique),
    }
}

impl BudgetSection {
    /// Creates one group per deliverable name that has no group of that exact name yet
    ///
    /// Existing groups are left untouched, so importing the same list twice
    /// creates nothing the second time. Matching is by current group name:
    /// a renamed group no longer matches its original deliverable. Returns
    /// the groups created by this call.
    pub fn import_deliverables<S: AsRef<str>>(&mut self, names: &[S]) -> ProposalResult<Vec<Group>> {
        if names.is_empty() {
            return Err(ProposalError::rejected("no deliverables to import"));
        }

        let mut created = Vec::new();
        for (index, name) in names.iter().enumerate() {
            let name = name.as_ref();
            if name.trim().is_empty() {
                continue;
            }
            if self.deliverable_groups.values().any(|g| g.name == name) {
                continue;
            }

            let group = Group {
                id: new_group_id(Some(index)),
                name: name.to_string(),
            };
            self.deliverable_groups.insert(group.id.clone(), group.clone());
            created.push(group);
        }

        debug!(requested = names.len(), created = created.len(), "deliverables imported");
        Ok(created)
    }

    /// Adds a group unconditionally, even if another group has the same name
    pub fn add_group(&mut self, name: Option<&str>) -> Group {
        let group = Group {
            id: new_group_id(None),
            name: name.unwrap_or(DEFAULT_GROUP_NAME).to_string(),
        };
        self.deliverable_groups.insert(group.id.clone(), group.clone());
        debug!(id = %group.id, name = %group.name, "group added");
        group
    }

    /// Renames a group; names need not be unique
    pub fn rename_group(&mut self, id: &str, name: &str) -> ProposalResult<()> {
        let group = self
            .deliverable_groups
            .get_mut(id)
            .ok_or_else(|| ProposalError::UnknownGroup(id.to_string()))?;
        group.name = name.to_string();
        Ok(())
    }

    /// Deletes a group and ungroups every line item that referenced it
    pub fn remove_group(&mut self, id: &str) -> ProposalResult<Group> {
        // shift_remove keeps the display order of the remaining groups
        let group = self
            .deliverable_groups
            .shift_remove(id)
            .ok_or_else(|| ProposalError::UnknownGroup(id.to_string()))?;

        let mut detached = 0;
        for item in self.breakdown.iter_mut().filter(|item| item.deliverable_id == id) {
            item.deliverable_id.clear();
            detached += 1;
        }

        debug!(id, detached, "group removed");
        Ok(group)
    }

    /// Finds the first group with exactly this name
    pub fn find_group_by_name(&self, name: &str) -> Option<&Group> {
        self.deliverable_groups.values().find(|g| g.name == name)
    }
}

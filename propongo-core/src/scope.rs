//! Scope-of-work editing: objectives, deliverables and their dates,
//! free-text fields and custom sections.

use tracing::debug;
use uuid::Uuid;

use crate::error::{ProposalError, ProposalResult};
use crate::models::{set_text, CustomSection, DeliverableDates, ScopeSection};

/// Prefix shared by generated custom section ids
pub const SECTION_ID_PREFIX: &str = "section";

fn non_blank(value: &str, what: &str) -> ProposalResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProposalError::rejected(format!("{} is empty", what)));
    }
    Ok(trimmed.to_string())
}

/// Normalizes one side of a date range: blank means "not set"
fn date_side(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl ScopeSection {
    pub fn set_overview(&mut self, text: &str) -> bool {
        set_text(&mut self.overview, text)
    }

    pub fn set_timeline_notes(&mut self, text: &str) -> bool {
        set_text(&mut self.timeline_notes, text)
    }

    pub fn set_limitations(&mut self, text: &str) -> bool {
        set_text(&mut self.limitations, text)
    }

    pub fn add_objective(&mut self, objective: &str) -> ProposalResult<usize> {
        let objective = non_blank(objective, "objective")?;
        self.objectives.push(objective);
        Ok(self.objectives.len() - 1)
    }

    pub fn remove_objective(&mut self, index: usize) -> ProposalResult<String> {
        ProposalError::check_index(index, self.objectives.len())?;
        Ok(self.objectives.remove(index))
    }

    /// Appends a deliverable and returns its position
    pub fn add_deliverable(&mut self, name: &str) -> ProposalResult<usize> {
        let name = non_blank(name, "deliverable name")?;
        self.deliverables.push(name);
        Ok(self.deliverables.len() - 1)
    }

    /// Removes the deliverable at `index`
    ///
    /// Dates stay keyed by position, so the dates of later deliverables are
    /// not shifted down. Entries whose position no longer exists are pruned.
    pub fn remove_deliverable(&mut self, index: usize) -> ProposalResult<String> {
        ProposalError::check_index(index, self.deliverables.len())?;
        let removed = self.deliverables.remove(index);

        let len = self.deliverables.len();
        let stale = self.deliverable_dates.split_off(&len);
        if !stale.is_empty() {
            debug!(pruned = stale.len(), "dropped dates past the end of the deliverable list");
        }
        Ok(removed)
    }

    /// Sets the date range of one deliverable
    ///
    /// `None` or a blank string clears that side; the entry is dropped once
    /// both sides are clear. Dates are stored as given, unparsed.
    pub fn set_deliverable_dates(
        &mut self,
        index: usize,
        start: Option<&str>,
        end: Option<&str>,
    ) -> ProposalResult<()> {
        ProposalError::check_index(index, self.deliverables.len())?;
        let dates = DeliverableDates {
            start_date: date_side(start),
            end_date: date_side(end),
        };
        if dates.is_empty() {
            self.deliverable_dates.remove(&index);
        } else {
            self.deliverable_dates.insert(index, dates);
        }
        Ok(())
    }

    /// Date range of the deliverable at `index`, if any was set
    pub fn dates_for(&self, index: usize) -> Option<&DeliverableDates> {
        self.deliverable_dates.get(&index)
    }

    /// Adds an empty custom section and returns its id
    pub fn add_custom_section(&mut self, name: &str) -> ProposalResult<String> {
        let name = non_blank(name, "section name")?;
        let id = format!("{}-{}", SECTION_ID_PREFIX, Uuid::new_v4().simple());
        self.custom_sections.insert(
            id.clone(),
            CustomSection {
                name,
                content: String::new(),
            },
        );
        debug!(id = %id, "custom section added");
        Ok(id)
    }

    fn custom_section_mut(&mut self, id: &str) -> ProposalResult<&mut CustomSection> {
        self.custom_sections
            .get_mut(id)
            .ok_or_else(|| ProposalError::UnknownSection(id.to_string()))
    }

    pub fn rename_custom_section(&mut self, id: &str, name: &str) -> ProposalResult<()> {
        let name = non_blank(name, "section name")?;
        self.custom_section_mut(id)?.name = name;
        Ok(())
    }

    pub fn set_custom_section_content(&mut self, id: &str, content: &str) -> ProposalResult<()> {
        self.custom_section_mut(id)?.content = content.to_string();
        Ok(())
    }

    pub fn remove_custom_section(&mut self, id: &str) -> ProposalResult<CustomSection> {
        self.custom_sections
            .shift_remove(id)
            .ok_or_else(|| ProposalError::UnknownSection(id.to_string()))
    }
}

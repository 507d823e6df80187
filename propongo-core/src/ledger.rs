//! Budget line-item ledger.
//!
//! Line items are appended in insertion order and removed by position.
//! The only in-place change ever made to a stored item is clearing its
//! group reference when that group is deleted.

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{ProposalError, ProposalResult};
use crate::models::{set_text, BudgetSection, LineItem};
use crate::money;

/// Units assumed when the field is left blank
pub const DEFAULT_UNITS: &str = "1";

/// Cost per unit assumed when the field is left blank
pub const DEFAULT_COST_PER_UNIT: &str = "0";

/// Group selector value meaning "no group"
pub const NO_GROUP: &str = "none";

/// Input for a new budget line item
///
/// There is no amount field: the amount is always derived from units and
/// cost per unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewLineItem {
    pub description: String,
    pub units: String,
    pub cost_per_unit: String,
    /// Target group id; empty or `"none"` for an ungrouped item
    pub deliverable_id: String,
}

impl NewLineItem {
    pub fn new(description: impl Into<String>, units: impl Into<String>, cost_per_unit: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            units: units.into(),
            cost_per_unit: cost_per_unit.into(),
            deliverable_id: String::new(),
        }
    }

    /// Assigns the item to a deliverable group
    pub fn in_group(mut self, group_id: impl Into<String>) -> Self {
        self.deliverable_id = group_id.into();
        self
    }
}

/// `round_half_up(units * cost_per_unit, 2)`
///
/// Products too large to store as a two-decimal amount are rejected.
pub fn line_amount(units: Decimal, cost_per_unit: Decimal) -> ProposalResult<Decimal> {
    units
        .checked_mul(cost_per_unit)
        .filter(|amount| money::fits_money(*amount))
        .map(money::round_money)
        .ok_or_else(|| ProposalError::rejected("amount too large"))
}

/// Returns `value` trimmed, or `default` when it is blank
fn or_default(value: &str, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

impl BudgetSection {
    /// Validates and appends a line item, returning the stored item
    ///
    /// The description must be non-blank and the derived amount positive.
    /// A group reference to a group that does not exist is stored as empty.
    pub fn add_line_item(&mut self, input: NewLineItem) -> ProposalResult<LineItem> {
        let description = input.description.trim();
        if description.is_empty() {
            return Err(ProposalError::rejected("line item description is empty"));
        }

        let units = or_default(&input.units, DEFAULT_UNITS);
        let cost_per_unit = or_default(&input.cost_per_unit, DEFAULT_COST_PER_UNIT);
        let amount = line_amount(
            money::parse_formatted_number(&units),
            money::parse_formatted_number(&cost_per_unit),
        )?;
        if amount <= Decimal::ZERO {
            return Err(ProposalError::rejected(format!(
                "line item amount must be positive (got {})",
                money::to_fixed(amount)
            )));
        }

        let new_total = money::checked_sum(self.breakdown.iter().map(LineItem::amount_value).chain([amount]));
        if !new_total.map_or(false, money::fits_money) {
            return Err(ProposalError::rejected("amount too large"));
        }

        let group_ref = input.deliverable_id.trim();
        let deliverable_id = if group_ref != NO_GROUP && self.deliverable_groups.contains_key(group_ref) {
            group_ref.to_string()
        } else {
            if !group_ref.is_empty() && group_ref != NO_GROUP {
                debug!(group = group_ref, "line item references unknown group; storing ungrouped");
            }
            String::new()
        };

        let item = LineItem {
            description: description.to_string(),
            units,
            cost_per_unit,
            amount: money::to_fixed(amount),
            deliverable_id,
        };

        self.breakdown.push(item.clone());
        self.recompute_total();
        debug!(description = %item.description, amount = %item.amount, "line item added");
        Ok(item)
    }

    /// Removes the line item at `index`
    pub fn remove_line_item(&mut self, index: usize) -> ProposalResult<LineItem> {
        ProposalError::check_index(index, self.breakdown.len())?;
        let removed = self.breakdown.remove(index);
        self.recompute_total();
        debug!(index, description = %removed.description, "line item removed");
        Ok(removed)
    }

    /// Recomputes `total_amount` from the breakdown and returns it
    ///
    /// Totals of loaded blobs beyond the decimal range are clamped.
    pub fn recompute_total(&mut self) -> &str {
        let total = money::saturating_sum(self.breakdown.iter().map(LineItem::amount_value));
        self.total_amount = money::to_fixed(total);
        &self.total_amount
    }

    /// Sum of all line amounts as a fixed two-decimal string
    pub fn total_amount(&self) -> &str {
        &self.total_amount
    }

    /// Replaces the budget narrative; returns whether it changed
    pub fn set_payment_schedule(&mut self, text: &str) -> bool {
        set_text(&mut self.payment_schedule, text)
    }

    /// Replaces the contingency costs text; returns whether it changed
    pub fn set_additional_costs(&mut self, text: &str) -> bool {
        set_text(&mut self.additional_costs, text)
    }
}

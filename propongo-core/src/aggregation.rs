//! Grouping and aggregation of budget line items.
//!
//! Group membership is resolved here, at read time, against the live group
//! registry. An item whose reference is empty or names a group that no
//! longer exists is simply ungrouped. Sums are accumulated as exact
//! decimals and only formatted when a summary is produced.

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{BudgetSection, Group, LineItem};
use crate::money;

/// A line item together with its position in the breakdown
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Positioned<'a> {
    pub index: usize,
    pub item: &'a LineItem,
}

/// Line items split by group membership
#[derive(Debug, Clone, PartialEq)]
pub struct Partition<'a> {
    /// One bucket per registered group, in group order; buckets may be empty
    pub grouped: IndexMap<&'a str, Vec<Positioned<'a>>>,
    /// Items with no group or with a reference to a missing group
    pub ungrouped: Vec<Positioned<'a>>,
}

impl<'a> Partition<'a> {
    /// Number of items across all grouped buckets
    pub fn grouped_len(&self) -> usize {
        self.grouped.values().map(Vec::len).sum()
    }

    /// True when at least one item landed in a group
    pub fn has_grouped_items(&self) -> bool {
        self.grouped.values().any(|bucket| !bucket.is_empty())
    }
}

/// Splits `breakdown` into per-group buckets and an ungrouped bucket
///
/// Every item appears exactly once; relative order is preserved within
/// each bucket.
pub fn partition<'a>(breakdown: &'a [LineItem], groups: &'a IndexMap<String, Group>) -> Partition<'a> {
    let mut grouped: IndexMap<&'a str, Vec<Positioned<'a>>> =
        groups.keys().map(|id| (id.as_str(), Vec::new())).collect();
    let mut ungrouped = Vec::new();

    for (index, item) in breakdown.iter().enumerate() {
        let entry = Positioned { index, item };
        match grouped.get_mut(item.deliverable_id.as_str()) {
            Some(bucket) if item.has_group_ref() => bucket.push(entry),
            _ => ungrouped.push(entry),
        }
    }

    Partition { grouped, ungrouped }
}

/// Exact, unrounded sum of the items' amounts, clamped at the decimal range
pub fn subtotal<'a, I>(items: I) -> Decimal
where
    I: IntoIterator<Item = &'a LineItem>,
{
    money::saturating_sum(items.into_iter().map(LineItem::amount_value))
}

/// Sum of every line amount in the breakdown
pub fn grand_total(breakdown: &[LineItem]) -> Decimal {
    subtotal(breakdown)
}

/// A line item row in a budget summary
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    /// Position in the breakdown, usable for removal
    pub index: usize,
    pub description: String,
    pub units: String,
    pub cost_per_unit: String,
    pub amount: String,
}

impl SummaryRow {
    fn from_positioned(entry: &Positioned<'_>) -> Self {
        Self {
            index: entry.index,
            description: entry.item.description.clone(),
            units: entry.item.units.clone(),
            cost_per_unit: money::to_fixed(money::parse_formatted_number(&entry.item.cost_per_unit)),
            amount: money::to_fixed(entry.item.amount_value()),
        }
    }
}

/// One group with its items and subtotal
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub id: String,
    pub name: String,
    pub rows: Vec<SummaryRow>,
    /// Fixed two-decimal subtotal
    pub subtotal: String,
}

/// The fully derived budget view shared by the editor and the preview
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    /// Every registered group in order, including groups without items
    pub groups: Vec<GroupSummary>,
    pub ungrouped: Vec<SummaryRow>,
    pub ungrouped_subtotal: String,
    pub grand_total: String,
}

impl BudgetSummary {
    /// True when any group has at least one item
    pub fn has_grouped_items(&self) -> bool {
        self.groups.iter().any(|g| !g.rows.is_empty())
    }

    /// Total number of rows across groups and the ungrouped bucket
    pub fn row_count(&self) -> usize {
        self.groups.iter().map(|g| g.rows.len()).sum::<usize>() + self.ungrouped.len()
    }

    /// Checks that the subtotals add up to the grand total
    pub fn is_consistent(&self) -> bool {
        let parts = money::checked_sum(
            self.groups
                .iter()
                .map(|g| money::parse_formatted_number(&g.subtotal))
                .chain([money::parse_formatted_number(&self.ungrouped_subtotal)]),
        );
        parts == Some(money::parse_formatted_number(&self.grand_total))
    }
}

/// Builds the grouped summary of a budget
pub fn summarize(budget: &BudgetSection) -> BudgetSummary {
    let parts = partition(budget.breakdown(), budget.deliverable_groups());

    let groups = parts
        .grouped
        .iter()
        .filter_map(|(id, bucket)| {
            let group = budget.group(id)?;
            Some(GroupSummary {
                id: group.id.clone(),
                name: group.name.clone(),
                rows: bucket.iter().map(SummaryRow::from_positioned).collect(),
                subtotal: money::to_fixed(subtotal(bucket.iter().map(|e| e.item))),
            })
        })
        .collect();

    BudgetSummary {
        groups,
        ungrouped: parts.ungrouped.iter().map(SummaryRow::from_positioned).collect(),
        ungrouped_subtotal: money::to_fixed(subtotal(parts.ungrouped.iter().map(|e| e.item))),
        grand_total: money::to_fixed(grand_total(budget.breakdown())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::NewLineItem;

    fn sample_budget() -> (BudgetSection, String, String) {
        let mut budget = BudgetSection::default();
        let design = budget.add_group(Some("Design")).id;
        let build = budget.add_group(Some("Build")).id;
        budget
            .add_line_item(NewLineItem::new("Wireframes", "2", "150").in_group(&design))
            .unwrap();
        budget.add_line_item(NewLineItem::new("Project management", "10", "80")).unwrap();
        budget
            .add_line_item(NewLineItem::new("Mockups", "3", "99.99").in_group(&design))
            .unwrap();
        (budget, design, build)
    }

    #[test]
    fn test_partition_buckets() {
        let (budget, design, build) = sample_budget();
        let parts = partition(budget.breakdown(), budget.deliverable_groups());

        let design_items: Vec<_> = parts.grouped[design.as_str()]
            .iter()
            .map(|e| e.item.description.as_str())
            .collect();
        assert_eq!(design_items, vec!["Wireframes", "Mockups"]);
        assert!(parts.grouped[build.as_str()].is_empty());
        assert_eq!(parts.ungrouped.len(), 1);
        assert_eq!(parts.ungrouped[0].index, 1);
        assert_eq!(parts.grouped_len() + parts.ungrouped.len(), budget.breakdown().len());
    }

    #[test]
    fn test_partition_group_order_follows_registry() {
        let (budget, design, build) = sample_budget();
        let parts = partition(budget.breakdown(), budget.deliverable_groups());
        let keys: Vec<_> = parts.grouped.keys().copied().collect();
        assert_eq!(keys, vec![design.as_str(), build.as_str()]);
    }

    #[test]
    fn test_dangling_reference_is_ungrouped() {
        let json = r#"{
            "breakdown": [
                {"description": "Orphan", "units": "1", "costPerUnit": "10", "amount": "10.00", "deliverableId": "del-gone"}
            ],
            "deliverableGroups": {}
        }"#;
        let budget: BudgetSection = serde_json::from_str(json).unwrap();
        let parts = partition(budget.breakdown(), budget.deliverable_groups());
        assert_eq!(parts.ungrouped.len(), 1);
        assert!(!parts.has_grouped_items());
    }

    #[test]
    fn test_subtotal_is_exact() {
        let (budget, _, _) = sample_budget();
        // 300.00 + 800.00 + 299.97
        assert_eq!(money::to_fixed(grand_total(budget.breakdown())), "1399.97");
        assert_eq!(money::to_fixed(grand_total(budget.breakdown())), budget.total_amount());
    }

    #[test]
    fn test_many_small_amounts_do_not_drift() {
        let mut budget = BudgetSection::default();
        for _ in 0..1000 {
            budget.add_line_item(NewLineItem::new("Penny", "1", "0.01")).unwrap();
        }
        assert_eq!(budget.total_amount(), "10.00");
        assert_eq!(money::to_fixed(grand_total(budget.breakdown())), "10.00");
    }

    #[test]
    fn test_summarize() {
        let (budget, design, _) = sample_budget();
        let summary = summarize(&budget);

        assert_eq!(summary.groups.len(), 2);
        assert_eq!(summary.groups[0].id, design);
        assert_eq!(summary.groups[0].subtotal, "599.97");
        assert_eq!(summary.groups[1].rows.len(), 0);
        assert_eq!(summary.groups[1].subtotal, "0.00");
        assert_eq!(summary.ungrouped_subtotal, "800.00");
        assert_eq!(summary.grand_total, "1399.97");
        assert_eq!(summary.row_count(), 3);
        assert!(summary.has_grouped_items());
        assert!(summary.is_consistent());
    }

    #[test]
    fn test_summarize_empty_budget() {
        let summary = summarize(&BudgetSection::default());
        assert!(summary.groups.is_empty());
        assert_eq!(summary.grand_total, "0.00");
        assert!(summary.is_consistent());
    }
}

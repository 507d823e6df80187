//! Upgrade-on-load for persisted proposal blobs.
//!
//! Older blobs stored line items with only an `amount`, and had no group
//! registry or custom sections. Missing maps are filled in by the serde
//! defaults; this module fills in the missing line-item fields. Running
//! the upgrade on an already current document changes nothing.

use tracing::{debug, warn};

use crate::ledger::DEFAULT_UNITS;
use crate::models::ProposalDocument;
use crate::money;

/// How a blob was turned into a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The blob was already in the current shape
    Current,
    /// The blob was in an older shape and has been upgraded
    Upgraded,
    /// The blob was not a readable document; a fresh one was created
    Discarded,
}

/// Plain string form of an amount for use as a unit cost: `"150.00"` → `"150"`
fn plain_amount(amount: &str) -> String {
    money::parse_formatted_number(amount).normalize().to_string()
}

/// Brings a deserialized document up to the current shape
///
/// Returns whether anything was changed.
pub fn upgrade_legacy(doc: &mut ProposalDocument) -> bool {
    let mut changed = false;
    let budget = &mut doc.budget;

    for item in budget.breakdown.iter_mut() {
        let fixed = money::to_fixed(item.amount_value());
        if item.amount != fixed {
            debug!(description = %item.description, amount = %item.amount, "line item amount normalized");
            item.amount = fixed;
            changed = true;
        }

        let units_blank = item.units.trim().is_empty();
        let cost_blank = item.cost_per_unit.trim().is_empty();
        if !units_blank && !cost_blank {
            continue;
        }
        if units_blank {
            item.units = DEFAULT_UNITS.to_string();
        }
        if cost_blank {
            item.cost_per_unit = plain_amount(&item.amount);
        }
        debug!(description = %item.description, "line item upgraded");
        changed = true;
    }

    for (key, group) in budget.deliverable_groups.iter_mut() {
        if group.id != *key {
            group.id = key.clone();
            changed = true;
        }
    }

    let before = budget.total_amount.clone();
    if budget.recompute_total() != before {
        changed = true;
    }

    changed
}

/// Parses a persisted blob into an upgraded document
///
/// Anything that is not a readable document yields a fresh default
/// document rather than an error.
pub fn load_blob(raw: &str) -> (ProposalDocument, LoadOutcome) {
    let mut doc: ProposalDocument = match serde_json::from_str(raw) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(error = %e, "stored proposal is not readable; starting fresh");
            return (ProposalDocument::default(), LoadOutcome::Discarded);
        }
    };

    if upgrade_legacy(&mut doc) {
        warn!("stored proposal was in an older format and has been upgraded");
        (doc, LoadOutcome::Upgraded)
    } else {
        (doc, LoadOutcome::Current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::summarize;
    use crate::export::export_markdown;
    use crate::ledger::NewLineItem;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    const LEGACY_BLOB: &str = r#"{
        "clientName": "Acme",
        "projectTitle": "Storefront",
        "scope": {
            "overview": "Rebuild",
            "objectives": [],
            "deliverables": ["Design"],
            "deliverableDates": {},
            "timelineNotes": "",
            "limitations": ""
        },
        "budget": {
            "totalAmount": "0",
            "breakdown": [
                {"description": "Design work", "amount": "1500.00"},
                {"description": "Hosting", "units": "12", "amount": "300.00"}
            ],
            "paymentSchedule": "",
            "additionalCosts": ""
        },
        "qualifications": {
            "companyBackground": "",
            "teamMembers": [],
            "relevantExperience": [],
            "testimonials": []
        }
    }"#;

    #[test]
    fn test_legacy_line_items_are_upgraded() {
        let (doc, outcome) = load_blob(LEGACY_BLOB);
        assert_eq!(outcome, LoadOutcome::Upgraded);

        let items = doc.budget.breakdown();
        assert_eq!(items[0].units, "1");
        assert_eq!(items[0].cost_per_unit, "1500");
        assert_eq!(items[1].units, "12");
        assert_eq!(items[1].cost_per_unit, "300");
        assert_eq!(doc.budget.total_amount(), "1800.00");
        assert!(doc.budget.deliverable_groups().is_empty());
        assert!(doc.scope.custom_sections.is_empty());
    }

    #[test]
    fn test_upgrade_is_stable() {
        let (doc, _) = load_blob(LEGACY_BLOB);
        let saved = serde_json::to_string(&doc).unwrap();

        let (reloaded, outcome) = load_blob(&saved);
        assert_eq!(outcome, LoadOutcome::Current);
        assert_eq!(reloaded, doc);

        let mut again = reloaded.clone();
        assert!(!upgrade_legacy(&mut again));
        assert_eq!(again, reloaded);
    }

    #[test]
    fn test_invalid_blob_starts_fresh() {
        for raw in ["", "not json", "[1, 2, 3]", "{\"budget\": 5}"] {
            let (doc, outcome) = load_blob(raw);
            assert_eq!(outcome, LoadOutcome::Discarded, "blob: {raw}");
            assert_eq!(doc, ProposalDocument::default());
        }
    }

    #[test]
    fn test_current_document_round_trips() {
        let mut doc = ProposalDocument::new();
        doc.set_client_name("Acme");
        let group = doc.budget.add_group(Some("Design"));
        doc.budget
            .add_line_item(NewLineItem::new("Mockups", "3", "12.995").in_group(&group.id))
            .unwrap();
        doc.scope.add_deliverable("Design").unwrap();
        doc.scope
            .set_deliverable_dates(0, Some("2024-03-01"), Some("2024-03-10"))
            .unwrap();

        let raw = serde_json::to_string_pretty(&doc).unwrap();
        let (loaded, outcome) = load_blob(&raw);
        assert_eq!(outcome, LoadOutcome::Current);
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_group_id_follows_map_key() {
        let raw = r#"{"budget": {"deliverableGroups": {"del-1": {"name": "Design"}}}}"#;
        let (doc, outcome) = load_blob(raw);
        assert_eq!(outcome, LoadOutcome::Upgraded);
        assert_eq!(doc.budget.group("del-1").unwrap().id, "del-1");
    }

    #[test]
    fn test_sub_cent_amounts_are_normalized() {
        let raw = r#"{"budget": {
            "deliverableGroups": {"del-1": {"id": "del-1", "name": "Design"}},
            "breakdown": [
                {"description": "Sketch", "units": "1", "costPerUnit": "0.005", "amount": "0.005", "deliverableId": "del-1"},
                {"description": "Review", "amount": 0.005}
            ]
        }}"#;
        let (doc, outcome) = load_blob(raw);
        assert_eq!(outcome, LoadOutcome::Upgraded);

        let items = doc.budget.breakdown();
        assert_eq!(items[0].amount, "0.01");
        assert_eq!(items[1].amount, "0.01");
        assert_eq!(doc.budget.total_amount(), "0.02");
        assert!(summarize(&doc.budget).is_consistent());

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("proposal.md");
        let today = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        export_markdown(&doc, today, &path).unwrap();

        let mut again = doc.clone();
        assert!(!upgrade_legacy(&mut again));
    }
}

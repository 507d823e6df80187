use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::ProposalResult;
use crate::money;

/// Default name given to a manually added deliverable group
pub const DEFAULT_GROUP_NAME: &str = "New Deliverable";

/// The root aggregate: one business proposal
///
/// Every section is always present. Missing sections in a persisted blob
/// are filled with their defaults when the document is loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProposalDocument {
    /// Name of the client the proposal is prepared for
    pub client_name: String,

    /// Title of the proposed project
    pub project_title: String,

    /// Scope of work: overview, objectives, deliverables and their dates
    pub scope: ScopeSection,

    /// Budget: line items, deliverable groups and narrative
    pub budget: BudgetSection,

    /// Company background, team, experience and testimonials
    pub qualifications: QualificationsSection,
}

/// Outcome of a section update
#[derive(Debug, Clone, PartialEq)]
pub struct Updated<T> {
    /// Value returned by the operation
    pub value: T,
    /// Whether the section differs from its previous state
    pub changed: bool,
}

impl ProposalDocument {
    /// Creates an empty proposal
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `op` to a copy of the scope and replaces the section on success
    pub fn update_scope<T, F>(&mut self, op: F) -> ProposalResult<Updated<T>>
    where
        F: FnOnce(&mut ScopeSection) -> ProposalResult<T>,
    {
        replace_section(&mut self.scope, "scope", op)
    }

    /// Applies `op` to a copy of the budget and replaces the section on success
    pub fn update_budget<T, F>(&mut self, op: F) -> ProposalResult<Updated<T>>
    where
        F: FnOnce(&mut BudgetSection) -> ProposalResult<T>,
    {
        replace_section(&mut self.budget, "budget", op)
    }

    /// Applies `op` to a copy of the qualifications and replaces the section on success
    pub fn update_qualifications<T, F>(&mut self, op: F) -> ProposalResult<Updated<T>>
    where
        F: FnOnce(&mut QualificationsSection) -> ProposalResult<T>,
    {
        replace_section(&mut self.qualifications, "qualifications", op)
    }

    /// Sets the client name, returning whether it changed
    pub fn set_client_name(&mut self, name: &str) -> bool {
        set_text(&mut self.client_name, name)
    }

    /// Sets the project title, returning whether it changed
    pub fn set_project_title(&mut self, title: &str) -> bool {
        set_text(&mut self.project_title, title)
    }
}

/// Copy-on-write replacement of one section.
///
/// The operation runs against a clone; the original is only replaced when
/// the operation succeeds and the clone actually differs.
fn replace_section<S, T, F>(section: &mut S, name: &str, op: F) -> ProposalResult<Updated<T>>
where
    S: Clone + PartialEq,
    F: FnOnce(&mut S) -> ProposalResult<T>,
{
    let mut draft = section.clone();
    let value = op(&mut draft)?;
    let changed = draft != *section;
    if changed {
        debug!(section = name, "section replaced");
        *section = draft;
    }
    Ok(Updated { value, changed })
}

pub(crate) fn set_text(field: &mut String, value: &str) -> bool {
    if field == value {
        return false;
    }
    *field = value.to_string();
    true
}

// =========================================================================
// Scope
// =========================================================================

/// The scope-of-work section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScopeSection {
    pub overview: String,
    pub objectives: Vec<String>,

    /// Ordered deliverables; the position is the deliverable's identity
    pub deliverables: Vec<String>,

    /// Sparse per-deliverable date ranges keyed by deliverable position
    #[serde(deserialize_with = "deserialize_deliverable_dates")]
    pub deliverable_dates: BTreeMap<usize, DeliverableDates>,

    pub timeline_notes: String,

    /// Risks and limitations
    pub limitations: String,

    /// User-defined sections keyed by generated id, in creation order
    #[serde(deserialize_with = "null_as_default")]
    pub custom_sections: IndexMap<String, CustomSection>,
}

/// Optional start and end date of one deliverable, as ISO date strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverableDates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl DeliverableDates {
    /// True when neither side carries a value
    pub fn is_empty(&self) -> bool {
        let blank = |d: &Option<String>| d.as_deref().map_or(true, |s| s.trim().is_empty());
        blank(&self.start_date) && blank(&self.end_date)
    }
}

/// A named free-form section added to the scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomSection {
    pub name: String,
    pub content: String,
}

// =========================================================================
// Budget
// =========================================================================

/// The budget section
///
/// `total_amount` is derived from `breakdown` and recomputed by every
/// mutation, including deserialization, so it cannot drift from the line
/// items. The breakdown and the group registry are only reachable through
/// the ledger and registry operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "BudgetSectionRepr")]
pub struct BudgetSection {
    pub(crate) total_amount: String,
    pub(crate) breakdown: Vec<LineItem>,
    pub(crate) deliverable_groups: IndexMap<String, Group>,

    /// Budget narrative
    pub payment_schedule: String,

    /// Contingency costs
    pub additional_costs: String,
}

impl Default for BudgetSection {
    fn default() -> Self {
        Self {
            total_amount: money::to_fixed(rust_decimal::Decimal::ZERO),
            breakdown: Vec::new(),
            deliverable_groups: IndexMap::new(),
            payment_schedule: String::new(),
            additional_costs: String::new(),
        }
    }
}

impl BudgetSection {
    /// Line items in display order
    pub fn breakdown(&self) -> &[LineItem] {
        &self.breakdown
    }

    /// Deliverable groups in creation order
    pub fn deliverable_groups(&self) -> &IndexMap<String, Group> {
        &self.deliverable_groups
    }

    /// Looks up a group by id
    pub fn group(&self, id: &str) -> Option<&Group> {
        self.deliverable_groups.get(id)
    }
}

/// Wire shape of the budget section; `totalAmount` from the blob is ignored
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BudgetSectionRepr {
    #[serde(deserialize_with = "null_as_default")]
    breakdown: Vec<LineItem>,
    #[serde(deserialize_with = "null_as_default")]
    deliverable_groups: IndexMap<String, Group>,
    #[serde(deserialize_with = "null_as_default")]
    payment_schedule: String,
    #[serde(deserialize_with = "null_as_default")]
    additional_costs: String,
}

impl Default for BudgetSectionRepr {
    fn default() -> Self {
        Self {
            breakdown: Vec::new(),
            deliverable_groups: IndexMap::new(),
            payment_schedule: String::new(),
            additional_costs: String::new(),
        }
    }
}

impl From<BudgetSectionRepr> for BudgetSection {
    fn from(repr: BudgetSectionRepr) -> Self {
        let mut budget = BudgetSection {
            total_amount: String::new(),
            breakdown: repr.breakdown,
            deliverable_groups: repr.deliverable_groups,
            payment_schedule: repr.payment_schedule,
            additional_costs: repr.additional_costs,
        };
        budget.recompute_total();
        budget
    }
}

/// One row of the budget breakdown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    /// Quantity, as a decimal string
    #[serde(default, deserialize_with = "string_or_number")]
    pub units: String,

    /// Cost of one unit, as a decimal string
    #[serde(default, deserialize_with = "string_or_number")]
    pub cost_per_unit: String,

    /// `units * cost_per_unit`, rounded to cents, as a fixed two-decimal string
    #[serde(default, deserialize_with = "string_or_number")]
    pub amount: String,

    /// Id of the deliverable group this item belongs to, or empty when ungrouped.
    /// A plain identifier; it may name a group that no longer exists.
    #[serde(default, deserialize_with = "null_as_default")]
    pub deliverable_id: String,
}

impl LineItem {
    /// The stored amount as an exact decimal (zero when unparseable)
    pub fn amount_value(&self) -> rust_decimal::Decimal {
        money::parse_formatted_number(&self.amount)
    }

    /// True when the item carries a group reference
    pub fn has_group_ref(&self) -> bool {
        !self.deliverable_id.is_empty()
    }
}

/// A user-defined bucket for budget line items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    pub id: String,
    pub name: String,
}

// =========================================================================
// Qualifications
// =========================================================================

/// The qualifications section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QualificationsSection {
    pub company_background: String,
    pub team_members: Vec<TeamMember>,
    pub relevant_experience: Vec<String>,
    pub testimonials: Vec<Testimonial>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamMember {
    pub name: String,
    pub role: String,
    pub bio: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Testimonial {
    #[serde(default)]
    pub quote: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

// =========================================================================
// Lenient deserialization helpers
// =========================================================================

/// Treats an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
}

/// Accepts `"12.50"`, `12.5` or `null` for a decimal-string field
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        Some(Scalar::Text(s)) => s,
        Some(Scalar::Integer(n)) => n.to_string(),
        Some(Scalar::Float(f)) => f.to_string(),
        None => String::new(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DeliverableDatesRepr {
    Keyed(BTreeMap<String, Option<DeliverableDates>>),
    Positional(Vec<Option<DeliverableDates>>),
}

/// Accepts the keyed object form (`{"0": {...}}`) or a positional array.
/// Keys that are not deliverable positions are dropped.
fn deserialize_deliverable_dates<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<usize, DeliverableDates>, D::Error>
where
    D: Deserializer<'de>,
{
    let dates = match Option::<DeliverableDatesRepr>::deserialize(deserializer)? {
        Some(DeliverableDatesRepr::Keyed(map)) => map
            .into_iter()
            .filter_map(|(key, dates)| Some((key.trim().parse::<usize>().ok()?, dates?)))
            .collect(),
        Some(DeliverableDatesRepr::Positional(list)) => list
            .into_iter()
            .enumerate()
            .filter_map(|(index, dates)| Some((index, dates?)))
            .collect(),
        None => BTreeMap::new(),
    };
    Ok(dates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProposalError;

    #[test]
    fn test_default_document_is_complete() {
        let doc = ProposalDocument::new();
        assert_eq!(doc.budget.total_amount(), "0.00");
        assert!(doc.budget.breakdown().is_empty());
        assert!(doc.scope.deliverable_dates.is_empty());
        assert!(doc.scope.custom_sections.is_empty());
    }

    #[test]
    fn test_serialized_field_names() {
        let doc = ProposalDocument::new();
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("clientName").is_some());
        assert!(json.get("projectTitle").is_some());
        assert_eq!(json["budget"]["totalAmount"], "0.00");
        assert!(json["budget"]["deliverableGroups"].is_object());
        assert!(json["scope"]["deliverableDates"].is_object());
    }

    #[test]
    fn test_missing_sections_default() {
        let doc: ProposalDocument = serde_json::from_str(r#"{"clientName": "Acme"}"#).unwrap();
        assert_eq!(doc.client_name, "Acme");
        assert_eq!(doc.scope, ScopeSection::default());
        assert_eq!(doc.budget, BudgetSection::default());
    }

    #[test]
    fn test_total_amount_is_recomputed_on_load() {
        let json = r#"{
            "totalAmount": "999.99",
            "breakdown": [
                {"description": "Design", "units": "2", "costPerUnit": "50", "amount": "100.00", "deliverableId": ""},
                {"description": "Build", "units": "1", "costPerUnit": "20.5", "amount": "20.50", "deliverableId": ""}
            ]
        }"#;
        let budget: BudgetSection = serde_json::from_str(json).unwrap();
        assert_eq!(budget.total_amount(), "120.50");
    }

    #[test]
    fn test_numeric_line_item_fields() {
        let json = r#"{"description": "Audit", "units": 3, "costPerUnit": 12.5, "amount": "37.50"}"#;
        let item: LineItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.units, "3");
        assert_eq!(item.cost_per_unit, "12.5");
        assert_eq!(item.deliverable_id, "");
    }

    #[test]
    fn test_deliverable_dates_keyed_form() {
        let json = r#"{"deliverableDates": {"0": {"startDate": "2024-03-01"}, "bogus": {}, "2": {"endDate": "2024-04-01"}}}"#;
        let scope: ScopeSection = serde_json::from_str(json).unwrap();
        assert_eq!(scope.deliverable_dates.len(), 2);
        assert_eq!(
            scope.deliverable_dates[&0].start_date.as_deref(),
            Some("2024-03-01")
        );
        assert_eq!(scope.deliverable_dates[&2].end_date.as_deref(), Some("2024-04-01"));
    }

    #[test]
    fn test_deliverable_dates_positional_form() {
        let json = r#"{"deliverableDates": [null, {"startDate": "2024-03-01"}]}"#;
        let scope: ScopeSection = serde_json::from_str(json).unwrap();
        assert_eq!(scope.deliverable_dates.len(), 1);
        assert!(scope.deliverable_dates.contains_key(&1));
    }

    #[test]
    fn test_dates_serialize_with_string_keys() {
        let mut scope = ScopeSection::default();
        scope.deliverable_dates.insert(
            1,
            DeliverableDates {
                start_date: Some("2024-01-01".into()),
                end_date: None,
            },
        );
        let json = serde_json::to_value(&scope).unwrap();
        assert_eq!(json["deliverableDates"]["1"]["startDate"], "2024-01-01");
        assert!(json["deliverableDates"]["1"].get("endDate").is_none());
    }

    #[test]
    fn test_update_reports_change() {
        let mut doc = ProposalDocument::new();
        let outcome = doc
            .update_scope(|scope| {
                scope.overview = "A new website".into();
                Ok(())
            })
            .unwrap();
        assert!(outcome.changed);

        let outcome = doc
            .update_scope(|scope| {
                scope.overview = "A new website".into();
                Ok(())
            })
            .unwrap();
        assert!(!outcome.changed);
    }

    #[test]
    fn test_failed_update_leaves_section_untouched() {
        let mut doc = ProposalDocument::new();
        doc.scope.overview = "Original".into();

        let result = doc.update_scope(|scope| -> ProposalResult<()> {
            scope.overview = "Half-written".into();
            Err(ProposalError::rejected("boom"))
        });

        assert!(result.is_err());
        assert_eq!(doc.scope.overview, "Original");
    }

    #[test]
    fn test_set_client_name() {
        let mut doc = ProposalDocument::new();
        assert!(doc.set_client_name("Acme Corp"));
        assert!(!doc.set_client_name("Acme Corp"));
        assert!(doc.set_project_title("Website Redesign"));
    }
}

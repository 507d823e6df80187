//! Read-only rendering model of a proposal.
//!
//! The preview is built once from a document snapshot and handed to
//! exporters. It carries every derived value they need (grouped tables,
//! subtotals, totals, the timeline table) so no exporter recomputes money.

use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregation::{summarize, BudgetSummary, GroupSummary, SummaryRow};
use crate::models::{CustomSection, ProposalDocument, TeamMember, Testimonial};
use crate::timeline::parse_date;

pub const PROPOSAL_HEADING: &str = "Business Proposal";
pub const CLIENT_PLACEHOLDER: &str = "[Client Name]";
pub const CREDIT_LINE: &str = "Created with Propongo";
pub const OTHER_TASKS_HEADING: &str = "Other Tasks";
pub const DATE_PLACEHOLDER: &str = "TBD";
pub const CLOSING_LINES: [&str; 2] = [
    "Thank you for considering our proposal. We look forward to the opportunity to work with you on this project.",
    "For any questions or clarifications, please don't hesitate to contact us.",
];

/// Long date shown in the header, e.g. `March 1, 2024`
const HEADER_DATE_FORMAT: &str = "%B %-d, %Y";

/// Short date used in the timeline table, e.g. `3/1/2024`
const TABLE_DATE_FORMAT: &str = "%-m/%-d/%Y";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalPreview {
    pub heading: String,
    pub project_title: Option<String>,
    pub prepared_for: String,
    pub date: String,
    pub scope: ScopePreview,
    pub budget: BudgetPreview,
    pub qualifications: QualificationsPreview,
}

/// One row of the deliverable timeline table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineRow {
    pub deliverable: String,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopePreview {
    pub overview: Option<String>,
    pub objectives: Vec<String>,
    pub deliverables: Vec<String>,
    pub custom_sections: Vec<CustomSection>,
    /// One row per deliverable; empty when there are no deliverables
    pub timeline: Vec<TimelineRow>,
    pub timeline_notes: Option<String>,
    pub risks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetPreview {
    /// Full summary, including groups without items
    pub summary: BudgetSummary,
    /// Groups with at least one item, in group order
    pub groups: Vec<GroupSummary>,
    pub ungrouped: Vec<SummaryRow>,
    /// Heading and subtotal for ungrouped items appear only next to grouped ones
    pub show_other_tasks: bool,
    pub narrative: Option<String>,
    pub contingency: Option<String>,
}

impl BudgetPreview {
    pub fn has_items(&self) -> bool {
        self.summary.row_count() > 0
    }

    pub fn total(&self) -> &str {
        &self.summary.grand_total
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualificationsPreview {
    pub company_background: Option<String>,
    pub team_members: Vec<TeamMember>,
    pub relevant_experience: Vec<String>,
    pub testimonials: Vec<Testimonial>,
}

fn non_empty(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn table_date(value: Option<&String>) -> String {
    value
        .and_then(|s| parse_date(s))
        .map(|d| d.format(TABLE_DATE_FORMAT).to_string())
        .unwrap_or_else(|| DATE_PLACEHOLDER.to_string())
}

impl ProposalPreview {
    /// Builds the preview of `doc` as of `today`
    pub fn build(doc: &ProposalDocument, today: NaiveDate) -> Self {
        let scope = &doc.scope;
        let timeline = scope
            .deliverables
            .iter()
            .enumerate()
            .map(|(index, deliverable)| {
                let dates = scope.deliverable_dates.get(&index);
                TimelineRow {
                    deliverable: deliverable.clone(),
                    start: table_date(dates.and_then(|d| d.start_date.as_ref())),
                    end: table_date(dates.and_then(|d| d.end_date.as_ref())),
                }
            })
            .collect();

        let summary = summarize(&doc.budget);
        let groups: Vec<GroupSummary> = summary
            .groups
            .iter()
            .filter(|g| !g.rows.is_empty())
            .cloned()
            .collect();
        let show_other_tasks = !groups.is_empty();

        let quals = &doc.qualifications;

        Self {
            heading: PROPOSAL_HEADING.to_string(),
            project_title: non_empty(&doc.project_title),
            prepared_for: non_empty(&doc.client_name).unwrap_or_else(|| CLIENT_PLACEHOLDER.to_string()),
            date: today.format(HEADER_DATE_FORMAT).to_string(),
            scope: ScopePreview {
                overview: non_empty(&scope.overview),
                objectives: scope.objectives.clone(),
                deliverables: scope.deliverables.clone(),
                custom_sections: scope.custom_sections.values().cloned().collect(),
                timeline,
                timeline_notes: non_empty(&scope.timeline_notes),
                risks: non_empty(&scope.limitations),
            },
            budget: BudgetPreview {
                ungrouped: summary.ungrouped.clone(),
                groups,
                show_other_tasks,
                summary,
                narrative: non_empty(&doc.budget.payment_schedule),
                contingency: non_empty(&doc.budget.additional_costs),
            },
            qualifications: QualificationsPreview {
                company_background: non_empty(&quals.company_background),
                team_members: quals.team_members.clone(),
                relevant_experience: quals.relevant_experience.clone(),
                testimonials: quals.testimonials.clone(),
            },
        }
    }

    /// Checks that the budget figures handed to exporters add up
    pub fn is_consistent(&self) -> bool {
        self.budget.summary.is_consistent()
    }
}

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::aggregation::SummaryRow;
use crate::models::ProposalDocument;
use crate::money;
use crate::preview::{ProposalPreview, CLOSING_LINES, CREDIT_LINE, OTHER_TASKS_HEADING};
use crate::timeline::ChartDataset;
use crate::upgrade::{load_blob, LoadOutcome};

/// File name stem for exports of a proposal, e.g. `proposal-website-redesign`
pub fn export_file_stem(project_title: &str) -> String {
    let slug = project_title
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "proposal-download".to_string()
    } else {
        format!("proposal-{}", slug)
    }
}

fn money_cell(fixed: &str) -> String {
    money::format_money(money::parse_formatted_number(fixed))
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn push_item_table(output: &mut String, rows: &[SummaryRow], subtotal: Option<&str>) {
    output.push_str("| Description | Units | Cost/Unit | Total |\n");
    output.push_str("|---|:---:|:---:|---:|\n");
    for row in rows {
        output.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            cell(&row.description),
            cell(&row.units),
            money_cell(&row.cost_per_unit),
            money_cell(&row.amount)
        ));
    }
    if let Some(subtotal) = subtotal {
        output.push_str(&format!("| **Subtotal** | | | **{}** |\n", money_cell(subtotal)));
    }
    output.push('\n');
}

fn push_list(output: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    output.push_str(&format!("### {}\n\n", heading));
    for item in items {
        output.push_str(&format!("- {}\n", item));
    }
    output.push('\n');
}

fn push_paragraph(output: &mut String, heading: &str, text: Option<&String>) {
    if let Some(text) = text {
        output.push_str(&format!("### {}\n\n{}\n\n", heading, text));
    }
}

/// Renders a preview as a Markdown document
pub fn render_markdown(preview: &ProposalPreview) -> String {
    let mut output = String::new();

    // Header
    output.push_str(&format!("# {}\n\n", preview.heading));
    if let Some(title) = &preview.project_title {
        output.push_str(&format!("**{}**\n\n", title));
    }
    output.push_str(&format!("Prepared for: {}\n\n", preview.prepared_for));
    output.push_str(&format!("Date: {}\n\n", preview.date));
    output.push_str(&format!("*{}*\n\n", CREDIT_LINE));

    // Scope
    let scope = &preview.scope;
    output.push_str("## 1. Project Scope\n\n");
    push_paragraph(&mut output, "Overview", scope.overview.as_ref());
    push_list(&mut output, "Objectives", &scope.objectives);
    push_list(&mut output, "Deliverables", &scope.deliverables);
    for section in &scope.custom_sections {
        output.push_str(&format!("### {}\n\n{}\n\n", section.name, section.content));
    }
    if !scope.timeline.is_empty() {
        output.push_str("### Timeline\n\n");
        output.push_str("| Deliverable | Start Date | End Date |\n");
        output.push_str("|---|---|---|\n");
        for row in &scope.timeline {
            output.push_str(&format!("| {} | {} | {} |\n", cell(&row.deliverable), row.start, row.end));
        }
        output.push('\n');
        if let Some(notes) = &scope.timeline_notes {
            output.push_str(&format!("{}\n\n", notes));
        }
    }
    push_paragraph(&mut output, "Risks", scope.risks.as_ref());

    // Budget
    let budget = &preview.budget;
    output.push_str("## 2. Budget\n\n");
    output.push_str(&format!("### Total Budget\n\n**{}**\n\n", money_cell(budget.total())));
    if budget.has_items() {
        output.push_str("### Budget Tasks\n\n");
        for group in &budget.groups {
            output.push_str(&format!("#### {}\n\n", group.name));
            push_item_table(&mut output, &group.rows, Some(&group.subtotal));
        }
        if !budget.ungrouped.is_empty() {
            if budget.show_other_tasks {
                output.push_str(&format!("#### {}\n\n", OTHER_TASKS_HEADING));
                push_item_table(&mut output, &budget.ungrouped, Some(&budget.summary.ungrouped_subtotal));
            } else {
                push_item_table(&mut output, &budget.ungrouped, None);
            }
        }
        output.push_str(&format!("**Total Budget: {}**\n\n", money_cell(budget.total())));
    }
    push_paragraph(&mut output, "Budget Narrative", budget.narrative.as_ref());
    push_paragraph(&mut output, "Contingency Costs", budget.contingency.as_ref());

    // Qualifications
    let quals = &preview.qualifications;
    output.push_str("## 3. Qualifications\n\n");
    push_paragraph(&mut output, "Company Background", quals.company_background.as_ref());
    if !quals.team_members.is_empty() {
        output.push_str("### Team Members\n\n");
        for member in &quals.team_members {
            output.push_str(&format!("#### {}\n\n*{}*\n\n", member.name, member.role));
            if !member.bio.is_empty() {
                output.push_str(&format!("{}\n\n", member.bio));
            }
        }
    }
    push_list(&mut output, "Relevant Experience", &quals.relevant_experience);
    if !quals.testimonials.is_empty() {
        output.push_str("### Client Testimonials\n\n");
        for testimonial in &quals.testimonials {
            output.push_str(&format!("> \"{}\"\n>\n> — {}\n\n", testimonial.quote, testimonial.attribution()));
        }
    }

    // Conclusion
    output.push_str("---\n\n");
    for line in CLOSING_LINES {
        output.push_str(&format!("{}\n\n", line));
    }

    output
}

/// Writes the Markdown rendering of `doc` to `output_path`
pub fn export_markdown(doc: &ProposalDocument, today: NaiveDate, output_path: &Path) -> Result<()> {
    let preview = ProposalPreview::build(doc, today);
    if !preview.is_consistent() {
        anyhow::bail!("Budget subtotals do not add up to the total; refusing to export");
    }
    fs::write(output_path, render_markdown(&preview))
        .with_context(|| format!("Failed to write {:?}", output_path))?;
    info!(path = %output_path.display(), "markdown exported");
    Ok(())
}

/// Writes the document as pretty-printed JSON
pub fn export_json(doc: &ProposalDocument, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(doc).context("Failed to serialize proposal")?;
    fs::write(output_path, json).with_context(|| format!("Failed to write {:?}", output_path))?;
    info!(path = %output_path.display(), "proposal exported");
    Ok(())
}

/// Reads a document from a JSON file, upgrading older shapes
///
/// Unlike loading from the store, a file that is not a proposal is an error.
pub fn import_json(input_path: &Path) -> Result<(ProposalDocument, LoadOutcome)> {
    let json = fs::read_to_string(input_path)
        .with_context(|| format!("Failed to read {:?}", input_path))?;
    let (doc, outcome) = load_blob(&json);
    if outcome == LoadOutcome::Discarded {
        anyhow::bail!("{:?} is not a proposal file", input_path);
    }
    Ok((doc, outcome))
}

/// Writes a chart dataset as pretty-printed JSON
pub fn export_timeline_json(chart: &ChartDataset, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(chart).context("Failed to serialize timeline")?;
    fs::write(output_path, json).with_context(|| format!("Failed to write {:?}", output_path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::NewLineItem;
    use crate::timeline;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn sample_document() -> ProposalDocument {
        let mut doc = ProposalDocument::new();
        doc.set_client_name("Acme Corp");
        doc.set_project_title("Website Redesign");
        doc.scope.set_overview("A faster storefront.");
        doc.scope.add_objective("Double conversions").unwrap();
        doc.scope.add_deliverable("Design").unwrap();
        doc.scope
            .set_deliverable_dates(0, Some("2024-03-04"), Some("2024-03-15"))
            .unwrap();

        let design = doc.budget.add_group(Some("Design")).id;
        doc.budget
            .add_line_item(NewLineItem::new("Mockups", "3", "1200").in_group(&design))
            .unwrap();
        doc.budget.add_line_item(NewLineItem::new("Hosting", "12", "25")).unwrap();
        doc.qualifications
            .add_testimonial("Superb", "Jo", Some("Globex"))
            .unwrap();
        doc
    }

    #[test]
    fn test_export_file_stem() {
        assert_eq!(export_file_stem("Website  Redesign"), "proposal-website-redesign");
        assert_eq!(export_file_stem(""), "proposal-download");
    }

    #[test]
    fn test_render_markdown() {
        let preview = ProposalPreview::build(&sample_document(), today());
        let md = render_markdown(&preview);

        assert!(md.starts_with("# Business Proposal\n"));
        assert!(md.contains("Prepared for: Acme Corp"));
        assert!(md.contains("Date: March 1, 2024"));
        assert!(md.contains("| Design | 3/4/2024 | 3/15/2024 |"));
        assert!(md.contains("#### Design"));
        assert!(md.contains("| Mockups | 3 | $1,200.00 | $3,600.00 |"));
        assert!(md.contains("#### Other Tasks"));
        assert!(md.contains("| **Subtotal** | | | **$300.00** |"));
        assert!(md.contains("**Total Budget: $3,900.00**"));
        assert!(md.contains("> — Jo, Globex"));
        assert!(md.contains(CLOSING_LINES[0]));
    }

    #[test]
    fn test_render_markdown_without_groups() {
        let mut doc = ProposalDocument::new();
        doc.budget.add_line_item(NewLineItem::new("Audit", "1", "500")).unwrap();
        let md = render_markdown(&ProposalPreview::build(&doc, today()));

        assert!(md.contains("Prepared for: [Client Name]"));
        assert!(!md.contains("Other Tasks"));
        assert!(!md.contains("Subtotal"));
        assert!(md.contains("| Audit | 1 | $500.00 | $500.00 |"));
    }

    #[test]
    fn test_json_export_import() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("proposal.json");
        let doc = sample_document();

        export_json(&doc, &path).unwrap();
        let (loaded, outcome) = import_json(&path).unwrap();
        assert_eq!(loaded, doc);
        assert_eq!(outcome, LoadOutcome::Current);
    }

    #[test]
    fn test_import_rejects_non_proposal() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("junk.json");
        fs::write(&path, "hello").unwrap();
        assert!(import_json(&path).is_err());
    }

    #[test]
    fn test_export_markdown_and_timeline() {
        let temp_dir = TempDir::new().unwrap();
        let doc = sample_document();

        let md_path = temp_dir.path().join("proposal.md");
        export_markdown(&doc, today(), &md_path).unwrap();
        assert!(fs::read_to_string(&md_path).unwrap().contains("## 2. Budget"));

        let chart = timeline::derive(&doc.scope.deliverables, &doc.scope.deliverable_dates, today());
        let chart_path = temp_dir.path().join("timeline.json");
        export_timeline_json(&chart, &chart_path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&chart_path).unwrap()).unwrap();
        assert_eq!(value["items"][0]["duration"], 11);
    }
}

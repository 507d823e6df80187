mod cli;
mod prompts;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use propongo_core::db::migrate_backend;
use propongo_core::export::{
    export_file_stem, export_json, export_markdown, export_timeline_json, import_json, render_markdown,
};
use propongo_core::ledger::NO_GROUP;
use propongo_core::timeline::parse_date;
use propongo_core::{
    create_backend, derive_timeline, get_config_path, money, resolve_store_path, summarize, AppConfig,
    BackendType, BudgetSection, ChartDataset, LoadOutcome, NewLineItem, ProposalDocument, ProposalPreview,
    ProposalStorage, SummaryRow,
};

use crate::cli::{
    Cli, Command, ConfigCommand, DbCommand, DeliverableCommand, ExperienceCommand, GroupCommand, ItemCommand,
    ObjectiveCommand, ScopeCommand, SectionCommand, TeamCommand, TestimonialCommand,
};

/// Environment variable holding the log filter, e.g. `PROPONGO_LOG=debug`
const LOG_ENV: &str = "PROPONGO_LOG";

/// Width of the timeline bars in characters
const CHART_WIDTH: i64 = 48;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = get_config_path()?;
    let config = AppConfig::load_or_default(&config_path)?;

    if let Command::Config(cmd) = &cli.command {
        return handle_config_command(cmd, config, &config_path, cli.store.as_deref());
    }

    let backend = match cli.backend.as_deref() {
        Some(name) => Some(name.parse::<BackendType>()?),
        None => config.backend,
    };
    let store_path = resolve_store_path(cli.store.as_deref(), &config)?;
    let storage = ProposalStorage::open(&store_path, backend)?;
    debug!(
        location = %storage.backend().location(),
        backend = %storage.backend().backend_type(),
        "store opened"
    );

    match &cli.command {
        Command::Show => show_proposal(&storage)?,
        Command::Info { client, title } => {
            let changed = storage.update(|doc| {
                let mut changed = false;
                if let Some(client) = client {
                    changed |= doc.set_client_name(client.trim());
                }
                if let Some(title) = title {
                    changed |= doc.set_project_title(title.trim());
                }
                Ok(changed)
            })?;
            report_change(changed, "Proposal details updated.");
        }
        Command::Scope(cmd) => handle_scope_command(cmd, &storage)?,
        Command::Objective(cmd) => handle_objective_command(cmd, &storage)?,
        Command::Deliverable(cmd) => handle_deliverable_command(cmd, &storage)?,
        Command::Section(cmd) => handle_section_command(cmd, &storage)?,
        Command::Group(cmd) => handle_group_command(cmd, &storage)?,
        Command::Item(cmd) => handle_item_command(cmd, &storage)?,
        Command::Budget => show_budget(&load_document(&storage)?.budget),
        Command::Narrative { text } => {
            let doc = load_document(&storage)?;
            let text = text_or_editor(text, "Budget narrative:", &doc.budget.payment_schedule)?;
            let changed = storage.update(|doc| {
                Ok(doc
                    .update_budget(|budget| Ok(budget.set_payment_schedule(&text)))?
                    .value)
            })?;
            report_change(changed, "Budget narrative updated.");
        }
        Command::Contingency { text } => {
            let doc = load_document(&storage)?;
            let text = text_or_editor(text, "Contingency costs:", &doc.budget.additional_costs)?;
            let changed = storage.update(|doc| {
                Ok(doc
                    .update_budget(|budget| Ok(budget.set_additional_costs(&text)))?
                    .value)
            })?;
            report_change(changed, "Contingency costs updated.");
        }
        Command::Background { text } => {
            let doc = load_document(&storage)?;
            let text = text_or_editor(text, "Company background:", &doc.qualifications.company_background)?;
            let changed = storage.update(|doc| {
                Ok(doc
                    .update_qualifications(|quals| Ok(quals.set_company_background(&text)))?
                    .value)
            })?;
            report_change(changed, "Company background updated.");
        }
        Command::Team(cmd) => handle_team_command(cmd, &storage)?,
        Command::Experience(cmd) => handle_experience_command(cmd, &storage)?,
        Command::Testimonial(cmd) => handle_testimonial_command(cmd, &storage)?,
        Command::Timeline { today, json } => {
            let today = match today {
                Some(value) => parse_date(value).with_context(|| format!("Invalid date: {}", value))?,
                None => local_today(),
            };
            let doc = load_document(&storage)?;
            let chart = derive_timeline(&doc.scope.deliverables, &doc.scope.deliverable_dates, today);
            if *json {
                println!("{}", serde_json::to_string_pretty(&chart)?);
            } else {
                show_timeline(&chart);
            }
        }
        Command::Preview => {
            let doc = load_document(&storage)?;
            print!("{}", render_markdown(&ProposalPreview::build(&doc, local_today())));
        }
        Command::Export { format, output } => {
            let doc = load_document(&storage)?;
            handle_export_command(&doc, format, output.as_deref())?;
        }
        Command::Import { file, yes } => {
            let (doc, outcome) = import_json(file)?;
            if storage.exists()? && !*yes && !prompts::confirm("Replace the current proposal?")? {
                println!("{}", "Import cancelled.".yellow());
                return Ok(());
            }
            storage.save(&doc)?;
            if outcome == LoadOutcome::Upgraded {
                println!("{} Upgraded an older proposal format.", "ℹ".blue());
            }
            println!("{} Imported proposal from {}", "✓".green(), file.display());
        }
        Command::Reset { yes } => {
            if !*yes && !prompts::confirm("Delete the stored proposal?")? {
                println!("{}", "Reset cancelled.".yellow());
                return Ok(());
            }
            if storage.reset()? {
                println!("{} Proposal deleted.", "✓".green());
            } else {
                println!("{}", "Nothing to delete.".dimmed());
            }
        }
        Command::Db(cmd) => handle_db_command(cmd, &storage)?,
        Command::Config(_) => {}
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Loads the stored proposal, telling the user when it had to be discarded or upgraded
fn load_document(storage: &ProposalStorage) -> Result<ProposalDocument> {
    let (doc, outcome) = storage.load_with_outcome()?;
    match outcome {
        Some(LoadOutcome::Discarded) => eprintln!(
            "{} The stored proposal could not be read; starting from an empty one.",
            "!".yellow().bold()
        ),
        Some(LoadOutcome::Upgraded) => eprintln!("{} Upgraded an older proposal format.", "ℹ".blue()),
        _ => {}
    }
    Ok(doc)
}

/// Converts a 1-based position from the command line into an index
fn to_index(position: usize) -> Result<usize> {
    position
        .checked_sub(1)
        .context("Positions start at 1")
}

fn text_or_editor(text: &Option<String>, label: &str, current: &str) -> Result<String> {
    match text {
        Some(text) => Ok(text.clone()),
        None => prompts::prompt_text(label, current),
    }
}

fn report_change(changed: bool, message: &str) {
    if changed {
        println!("{} {}", "✓".green(), message);
    } else {
        println!("{}", "No changes.".dimmed());
    }
}

fn money_display(fixed: &str) -> String {
    money::format_money(money::parse_formatted_number(fixed))
}

/// Resolves a group given by id or exact name to its id
fn resolve_group(budget: &BudgetSection, group: &str) -> Result<String> {
    if budget.group(group).is_some() {
        return Ok(group.to_string());
    }
    budget
        .find_group_by_name(group)
        .map(|g| g.id.clone())
        .with_context(|| format!("No deliverable group with id or name '{}'", group))
}

fn show_proposal(storage: &ProposalStorage) -> Result<()> {
    let doc = load_document(storage)?;
    let or_unset = |s: &str| {
        if s.trim().is_empty() {
            "(not set)".dimmed().to_string()
        } else {
            s.to_string()
        }
    };

    println!("{}", "Proposal".blue().bold());
    println!("{}", "-".repeat(55));
    println!("{:<22} {}", "Client:", or_unset(&doc.client_name));
    println!("{:<22} {}", "Project title:", or_unset(&doc.project_title));
    println!();
    println!("{}", "Scope".blue().bold());
    println!("{:<22} {}", "Objectives:", doc.scope.objectives.len());
    println!("{:<22} {}", "Deliverables:", doc.scope.deliverables.len());
    println!("{:<22} {}", "Dated deliverables:", doc.scope.deliverable_dates.len());
    println!("{:<22} {}", "Custom sections:", doc.scope.custom_sections.len());
    println!();
    println!("{}", "Budget".blue().bold());
    println!("{:<22} {}", "Line items:", doc.budget.breakdown().len());
    println!("{:<22} {}", "Deliverable groups:", doc.budget.deliverable_groups().len());
    println!("{:<22} {}", "Total:", money_display(doc.budget.total_amount()).green());
    println!();
    println!("{}", "Qualifications".blue().bold());
    println!("{:<22} {}", "Team members:", doc.qualifications.team_members.len());
    println!("{:<22} {}", "Experience entries:", doc.qualifications.relevant_experience.len());
    println!("{:<22} {}", "Testimonials:", doc.qualifications.testimonials.len());
    Ok(())
}

fn handle_scope_command(cmd: &ScopeCommand, storage: &ProposalStorage) -> Result<()> {
    let doc = load_document(storage)?;
    let scope = &doc.scope;

    let changed = match cmd {
        ScopeCommand::Overview { text } => {
            let text = text_or_editor(text, "Project overview:", &scope.overview)?;
            storage.update(|doc| Ok(doc.update_scope(|s| Ok(s.set_overview(&text)))?.changed))?
        }
        ScopeCommand::Notes { text } => {
            let text = text_or_editor(text, "Timeline notes:", &scope.timeline_notes)?;
            storage.update(|doc| Ok(doc.update_scope(|s| Ok(s.set_timeline_notes(&text)))?.changed))?
        }
        ScopeCommand::Limitations { text } => {
            let text = text_or_editor(text, "Risks and limitations:", &scope.limitations)?;
            storage.update(|doc| Ok(doc.update_scope(|s| Ok(s.set_limitations(&text)))?.changed))?
        }
    };

    report_change(changed, "Scope updated.");
    Ok(())
}

fn handle_objective_command(cmd: &ObjectiveCommand, storage: &ProposalStorage) -> Result<()> {
    match cmd {
        ObjectiveCommand::Add { text } => {
            let index = storage.update(|doc| Ok(doc.update_scope(|s| s.add_objective(text))?.value))?;
            println!("{} Objective {} added.", "✓".green(), index + 1);
        }
        ObjectiveCommand::Remove { position } => {
            let index = to_index(*position)?;
            let removed = storage.update(|doc| Ok(doc.update_scope(|s| s.remove_objective(index))?.value))?;
            println!("{} Removed objective: {}", "✓".green(), removed);
        }
    }
    Ok(())
}

fn handle_deliverable_command(cmd: &DeliverableCommand, storage: &ProposalStorage) -> Result<()> {
    match cmd {
        DeliverableCommand::Add { name } => {
            let index = storage.update(|doc| Ok(doc.update_scope(|s| s.add_deliverable(name))?.value))?;
            println!("{} Deliverable {} added.", "✓".green(), index + 1);
        }
        DeliverableCommand::Remove { position } => {
            let index = to_index(*position)?;
            let removed = storage.update(|doc| Ok(doc.update_scope(|s| s.remove_deliverable(index))?.value))?;
            println!("{} Removed deliverable: {}", "✓".green(), removed);
        }
        DeliverableCommand::Dates { position, start, end } => {
            let index = to_index(*position)?;
            for value in [start, end].into_iter().flatten() {
                if !value.trim().is_empty() && parse_date(value).is_none() {
                    println!(
                        "{} '{}' is not a recognized date; it will show as TBD.",
                        "!".yellow().bold(),
                        value
                    );
                }
            }

            let changed = storage.update(|doc| {
                let updated = doc.update_scope(|s| {
                    // Sides not given on the command line keep their value
                    let current = s.dates_for(index).cloned().unwrap_or_default();
                    let start = start.as_deref().or(current.start_date.as_deref());
                    let end = end.as_deref().or(current.end_date.as_deref());
                    s.set_deliverable_dates(index, start, end)
                })?;
                Ok(updated.changed)
            })?;
            report_change(changed, "Deliverable dates updated.");
        }
        DeliverableCommand::List => {
            let doc = load_document(storage)?;
            let scope = &doc.scope;
            if scope.deliverables.is_empty() {
                println!("{}", "(No deliverables yet)".dimmed());
                return Ok(());
            }

            println!("{:<4} | {:<32} | {:<12} | {:<12}", "#", "Deliverable", "Start", "End");
            println!("{}", "-".repeat(70));
            for (index, name) in scope.deliverables.iter().enumerate() {
                let dates = scope.dates_for(index);
                let side = |d: Option<&String>| d.cloned().unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<4} | {:<32} | {:<12} | {:<12}",
                    index + 1,
                    name,
                    side(dates.and_then(|d| d.start_date.as_ref())),
                    side(dates.and_then(|d| d.end_date.as_ref()))
                );
            }
        }
    }
    Ok(())
}

fn handle_section_command(cmd: &SectionCommand, storage: &ProposalStorage) -> Result<()> {
    match cmd {
        SectionCommand::Add { name } => {
            let id = storage.update(|doc| Ok(doc.update_scope(|s| s.add_custom_section(name))?.value))?;
            println!("{} Section added: {}", "✓".green(), id.cyan());
        }
        SectionCommand::Rename { id, name } => {
            storage.update(|doc| Ok(doc.update_scope(|s| s.rename_custom_section(id, name))?.changed))?;
            println!("{} Section renamed.", "✓".green());
        }
        SectionCommand::Content { id, text } => {
            let doc = load_document(storage)?;
            let current = doc
                .scope
                .custom_sections
                .get(id)
                .with_context(|| format!("Custom section not found: {}", id))?;
            let text = text_or_editor(text, &format!("{}:", current.name), &current.content)?;
            let changed = storage.update(|doc| {
                Ok(doc
                    .update_scope(|s| s.set_custom_section_content(id, &text))?
                    .changed)
            })?;
            report_change(changed, "Section content updated.");
        }
        SectionCommand::Remove { id } => {
            let removed = storage.update(|doc| Ok(doc.update_scope(|s| s.remove_custom_section(id))?.value))?;
            println!("{} Removed section: {}", "✓".green(), removed.name);
        }
        SectionCommand::List => {
            let doc = load_document(storage)?;
            if doc.scope.custom_sections.is_empty() {
                println!("{}", "(No custom sections yet)".dimmed());
                return Ok(());
            }
            for (id, section) in &doc.scope.custom_sections {
                println!("{} {}", section.name.bold(), format!("({})", id).dimmed());
                if !section.content.is_empty() {
                    println!("  {}", section.content.replace('\n', "\n  "));
                }
            }
        }
    }
    Ok(())
}

fn handle_group_command(cmd: &GroupCommand, storage: &ProposalStorage) -> Result<()> {
    match cmd {
        GroupCommand::Add { name } => {
            let group = storage.update(|doc| {
                Ok(doc
                    .update_budget(|b| Ok(b.add_group(name.as_deref())))?
                    .value)
            })?;
            println!("{} Group '{}' added: {}", "✓".green(), group.name, group.id.cyan());
        }
        GroupCommand::Rename { group, name } => {
            let doc = load_document(storage)?;
            let id = resolve_group(&doc.budget, group)?;
            storage.update(|doc| Ok(doc.update_budget(|b| b.rename_group(&id, name))?.changed))?;
            println!("{} Group renamed to '{}'.", "✓".green(), name);
        }
        GroupCommand::Remove { group, yes } => {
            let doc = load_document(storage)?;
            let id = resolve_group(&doc.budget, group)?;
            let attached = doc
                .budget
                .breakdown()
                .iter()
                .filter(|item| item.deliverable_id == id)
                .count();

            if attached > 0
                && !*yes
                && !prompts::confirm(&format!("{} line item(s) will become ungrouped. Continue?", attached))?
            {
                println!("{}", "Removal cancelled.".yellow());
                return Ok(());
            }

            let removed = storage.update(|doc| Ok(doc.update_budget(|b| b.remove_group(&id))?.value))?;
            println!("{} Removed group '{}'.", "✓".green(), removed.name);
        }
        GroupCommand::Import => {
            let created = storage.update(|doc| {
                let deliverables = doc.scope.deliverables.clone();
                Ok(doc
                    .update_budget(|b| b.import_deliverables(deliverables.as_slice()))?
                    .value)
            })?;
            if created.is_empty() {
                println!("{}", "Every deliverable already has a group.".dimmed());
            }
            for group in &created {
                println!("{} Group '{}' created: {}", "✓".green(), group.name, group.id.cyan());
            }
        }
        GroupCommand::List => {
            let doc = load_document(storage)?;
            let groups = doc.budget.deliverable_groups();
            if groups.is_empty() {
                println!("{}", "(No deliverable groups yet)".dimmed());
                return Ok(());
            }

            println!("{:<44} | {:<28} | {:>5}", "ID", "Name", "Items");
            println!("{}", "-".repeat(83));
            for group in groups.values() {
                let items = doc
                    .budget
                    .breakdown()
                    .iter()
                    .filter(|item| item.deliverable_id == group.id)
                    .count();
                println!("{:<44} | {:<28} | {:>5}", group.id, group.name, items);
            }
        }
    }
    Ok(())
}

fn handle_item_command(cmd: &ItemCommand, storage: &ProposalStorage) -> Result<()> {
    match cmd {
        ItemCommand::Add {
            description,
            units,
            cost,
            group,
            interactive,
        } => {
            let doc = load_document(storage)?;
            let should_be_interactive = *interactive || description.is_none();

            let input = if should_be_interactive {
                let groups: Vec<_> = doc.budget.deliverable_groups().values().cloned().collect();
                prompts::prompt_new_line_item(&groups)?
            } else {
                let mut input = NewLineItem::new(
                    description.clone().unwrap_or_default(),
                    units.clone().unwrap_or_default(),
                    cost.clone().unwrap_or_default(),
                );
                if let Some(group) = group {
                    let id = if group == NO_GROUP {
                        NO_GROUP.to_string()
                    } else {
                        resolve_group(&doc.budget, group)?
                    };
                    input = input.in_group(id);
                }
                input
            };

            let item = storage.update(|doc| Ok(doc.update_budget(|b| b.add_line_item(input))?.value))?;
            println!(
                "{} Added '{}' ({} x {} = {})",
                "✓".green(),
                item.description,
                item.units,
                money_display(&item.cost_per_unit),
                money_display(&item.amount).green()
            );
        }
        ItemCommand::Remove { position } => {
            let index = to_index(*position)?;
            let removed = storage.update(|doc| Ok(doc.update_budget(|b| b.remove_line_item(index))?.value))?;
            println!("{} Removed line item: {}", "✓".green(), removed.description);
        }
        ItemCommand::List => {
            let doc = load_document(storage)?;
            let budget = &doc.budget;
            if budget.breakdown().is_empty() {
                println!("{}", "(No line items yet)".dimmed());
                return Ok(());
            }

            println!(
                "{:<4} | {:<30} | {:>8} | {:>12} | {:>12} | {:<20}",
                "#", "Description", "Units", "Cost/Unit", "Amount", "Group"
            );
            println!("{}", "-".repeat(103));
            for (index, item) in budget.breakdown().iter().enumerate() {
                let group = budget
                    .group(&item.deliverable_id)
                    .map(|g| g.name.clone())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<4} | {:<30} | {:>8} | {:>12} | {:>12} | {:<20}",
                    index + 1,
                    item.description,
                    item.units,
                    money_display(&item.cost_per_unit),
                    money_display(&item.amount),
                    group
                );
            }
            println!("{}", "-".repeat(103));
            println!("Total: {}", money_display(budget.total_amount()).green().bold());
        }
    }
    Ok(())
}

fn print_rows(rows: &[SummaryRow]) {
    for row in rows {
        println!(
            "  {:<4} {:<30} {:>8} {:>12} {:>12}",
            row.index + 1,
            row.description,
            row.units,
            money_display(&row.cost_per_unit),
            money_display(&row.amount)
        );
    }
}

fn show_budget(budget: &BudgetSection) {
    let summary = summarize(budget);

    for group in &summary.groups {
        println!("{} {}", group.name.blue().bold(), format!("({})", group.id).dimmed());
        if group.rows.is_empty() {
            println!("  {}", "(no line items)".dimmed());
        } else {
            print_rows(&group.rows);
            println!("  {:>70}", format!("Subtotal: {}", money_display(&group.subtotal)));
        }
        println!();
    }

    if !summary.ungrouped.is_empty() {
        if summary.has_grouped_items() {
            println!("{}", "Other Tasks".blue().bold());
            print_rows(&summary.ungrouped);
            println!(
                "  {:>70}",
                format!("Subtotal: {}", money_display(&summary.ungrouped_subtotal))
            );
        } else {
            print_rows(&summary.ungrouped);
        }
        println!();
    }

    if summary.row_count() == 0 {
        println!("{}", "(No line items yet)".dimmed());
    }
    println!("{}", "-".repeat(74));
    println!("Total Budget: {}", money_display(&summary.grand_total).green().bold());
}

fn handle_team_command(cmd: &TeamCommand, storage: &ProposalStorage) -> Result<()> {
    match cmd {
        TeamCommand::Add { name, role, bio } => {
            storage.update(|doc| {
                Ok(doc
                    .update_qualifications(|q| q.add_team_member(name, role, bio))?
                    .value)
            })?;
            println!("{} Team member '{}' added.", "✓".green(), name);
        }
        TeamCommand::Remove { position } => {
            let index = to_index(*position)?;
            let removed = storage.update(|doc| {
                Ok(doc
                    .update_qualifications(|q| q.remove_team_member(index))?
                    .value)
            })?;
            println!("{} Removed team member: {}", "✓".green(), removed.name);
        }
    }
    Ok(())
}

fn handle_experience_command(cmd: &ExperienceCommand, storage: &ProposalStorage) -> Result<()> {
    match cmd {
        ExperienceCommand::Add { text } => {
            let index = storage.update(|doc| Ok(doc.update_qualifications(|q| q.add_experience(text))?.value))?;
            println!("{} Experience entry {} added.", "✓".green(), index + 1);
        }
        ExperienceCommand::Remove { position } => {
            let index = to_index(*position)?;
            let removed =
                storage.update(|doc| Ok(doc.update_qualifications(|q| q.remove_experience(index))?.value))?;
            println!("{} Removed experience entry: {}", "✓".green(), removed);
        }
    }
    Ok(())
}

fn handle_testimonial_command(cmd: &TestimonialCommand, storage: &ProposalStorage) -> Result<()> {
    match cmd {
        TestimonialCommand::Add { quote, author, company } => {
            storage.update(|doc| {
                Ok(doc
                    .update_qualifications(|q| q.add_testimonial(quote, author, company.as_deref()))?
                    .value)
            })?;
            println!("{} Testimonial from {} added.", "✓".green(), author);
        }
        TestimonialCommand::Remove { position } => {
            let index = to_index(*position)?;
            let removed = storage.update(|doc| {
                Ok(doc
                    .update_qualifications(|q| q.remove_testimonial(index))?
                    .value)
            })?;
            println!("{} Removed testimonial from {}", "✓".green(), removed.attribution());
        }
    }
    Ok(())
}

fn show_timeline(chart: &ChartDataset) {
    if chart.is_empty() {
        println!("{}", "(No deliverables to chart)".dimmed());
        return;
    }

    let domain = (chart.domain.1 - chart.domain.0).max(1);
    let column = |offset: i64| (offset.clamp(0, domain) * CHART_WIDTH / domain) as usize;

    println!(
        "{} {} to {} ({} days)",
        "Timeline".blue().bold(),
        chart.earliest,
        chart.latest,
        chart.total_span
    );
    println!("{}", "-".repeat(28 + CHART_WIDTH as usize));

    for item in &chart.items {
        let start = column(item.offset);
        let end = column(item.offset + item.duration).max(start + 1);
        let bar = format!("{}{}", " ".repeat(start), "█".repeat(end - start));
        let bar = format!("{:<width$}", bar, width = CHART_WIDTH as usize);
        println!("{:<26} |{}|", item.name, bar.green());
        println!(
            "{:<26}  {}",
            "",
            format!("{} - {} ({} days)", item.start_label, item.end_label, item.duration).dimmed()
        );
    }

    let mut axis = " ".repeat(CHART_WIDTH as usize + 8);
    for tick in &chart.ticks {
        let at = column(tick.offset);
        if at + tick.label.len() <= axis.len() && axis[at..at + tick.label.len()].trim().is_empty() {
            axis.replace_range(at..at + tick.label.len(), &tick.label);
        }
    }
    println!("{:<26}  {}", "", axis.trim_end());

    if (chart.domain.0..=chart.domain.1).contains(&chart.today_offset) {
        println!(
            "{:<26}  {}{}",
            "",
            " ".repeat(column(chart.today_offset)),
            "^ today".red()
        );
    }
}

fn handle_export_command(doc: &ProposalDocument, format: &str, output: Option<&Path>) -> Result<()> {
    let stem = export_file_stem(&doc.project_title);
    let today = local_today();

    let path = match format.to_ascii_lowercase().as_str() {
        "markdown" | "md" => {
            let path = output.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(format!("{}.md", stem)));
            export_markdown(doc, today, &path)?;
            path
        }
        "json" => {
            let path = output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(format!("{}.json", stem)));
            export_json(doc, &path)?;
            path
        }
        "timeline" => {
            let path = output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(format!("{}-timeline.json", stem)));
            let chart = derive_timeline(&doc.scope.deliverables, &doc.scope.deliverable_dates, today);
            export_timeline_json(&chart, &path)?;
            path
        }
        other => anyhow::bail!("Unknown export format '{}' (expected markdown, json or timeline)", other),
    };

    println!("{} Exported to {}", "✓".green(), path.display());
    Ok(())
}

fn handle_db_command(cmd: &DbCommand, storage: &ProposalStorage) -> Result<()> {
    match cmd {
        DbCommand::Migrate { to, backend } => {
            let backend = backend.as_deref().map(str::parse::<BackendType>).transpose()?;
            let destination = create_backend(to, backend)?;
            let count = migrate_backend(storage.backend(), destination.as_ref())?;
            println!(
                "{} Migrated {} blob(s) from {} to {} ({})",
                "✓".green(),
                count,
                storage.backend().location(),
                destination.location(),
                destination.backend_type()
            );
        }
        DbCommand::Path => {
            println!("{}", storage.backend().location());
        }
        DbCommand::Stats => {
            let stats = storage.backend().stats()?;
            println!("{}", "Store Statistics".blue().bold());
            println!("{}", "-".repeat(40));
            println!("{:<14} {}", "Backend:", stats.backend_type);
            println!("{:<14} {}", "Location:", storage.backend().location());
            println!("{:<14} {}", "Blobs:", stats.blob_count);
            println!("{:<14} {}", "Size:", format!("{} bytes", stats.total_bytes));
            println!("{:<14} {}", "Proposal:", if storage.exists()? { "saved" } else { "none" });
        }
    }
    Ok(())
}

fn handle_config_command(
    cmd: &ConfigCommand,
    mut config: AppConfig,
    config_path: &Path,
    explicit_store: Option<&Path>,
) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let store_path = resolve_store_path(explicit_store, &config)?;
            println!("{}", "Configuration".blue().bold());
            println!("{}", "-".repeat(55));
            println!("{:<14} {}", "Config file:", config_path.display());
            println!("{:<14} {}", "Store:", store_path.display());
            println!(
                "{:<14} {}",
                "Backend:",
                config
                    .backend
                    .map(|b| b.to_string())
                    .unwrap_or_else(|| "inferred from path".to_string())
            );
            println!("{:<14} {}", "Help topics:", config.help_resources.len());
        }
        ConfigCommand::SetStore { path } => {
            config.store_path = Some(path.clone());
            config.save(config_path)?;
            println!("{} Store path set to {}", "✓".green(), path.display());
        }
        ConfigCommand::Help { topic } => match topic {
            Some(topic) => {
                let resource = config
                    .help(topic)
                    .with_context(|| format!("Unknown help topic '{}'", topic))?;
                println!("{}", resource.title.bold());
                println!("{}", resource.url.cyan());
                if let Some(description) = &resource.description {
                    println!("{}", description);
                }
            }
            None => {
                for (topic, resource) in &config.help_resources {
                    println!("{:<36} {}", topic.cyan(), resource.title);
                }
            }
        },
        ConfigCommand::SetHelp {
            topic,
            title,
            url,
            description,
        } => {
            config.update_help(topic, title.as_deref(), url.as_deref(), description.as_deref())?;
            config.save(config_path)?;
            println!("{} Help link for '{}' updated.", "✓".green(), topic);
        }
    }
    Ok(())
}

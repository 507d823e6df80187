use anyhow::Result;
use inquire::{Confirm, Editor, Select, Text};

use propongo_core::ledger::{DEFAULT_UNITS, NO_GROUP};
use propongo_core::{Group, NewLineItem};

const NO_GROUP_OPTION: &str = "No group";

/// Prompts the user for a new budget line item
pub fn prompt_new_line_item(groups: &[Group]) -> Result<NewLineItem> {
    let description = Text::new("Description:").prompt()?;
    let units = Text::new("Units:").with_default(DEFAULT_UNITS).prompt()?;
    let cost_per_unit = Text::new("Cost per unit:").prompt()?;

    let mut item = NewLineItem::new(description, units, cost_per_unit);

    if !groups.is_empty() {
        let mut options: Vec<String> = vec![NO_GROUP_OPTION.to_string()];
        options.extend(groups.iter().map(|g| format!("{} ({})", g.name, g.id)));

        let selection = Select::new("Deliverable group:", options.clone()).prompt()?;
        let group_id = options
            .iter()
            .position(|o| o == &selection)
            .and_then(|i| i.checked_sub(1))
            .map(|i| groups[i].id.clone())
            .unwrap_or_else(|| NO_GROUP.to_string());
        item = item.in_group(group_id);
    }

    Ok(item)
}

/// Opens the user's editor pre-filled with `current`
pub fn prompt_text(label: &str, current: &str) -> Result<String> {
    let text = Editor::new(label).with_predefined_text(current).prompt()?;
    Ok(text.trim_end().to_string())
}

/// Asks for confirmation before a destructive action
pub fn confirm(message: &str) -> Result<bool> {
    Ok(Confirm::new(message).with_default(false).prompt()?)
}

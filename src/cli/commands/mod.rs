use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::SelectionArgs;
use crate::deposit::{CommunitySelection, Record};

pub mod derive;
pub mod simulate;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

impl SelectionArgs {
    pub fn selection(&self) -> CommunitySelection {
        match (&self.community, self.deselect) {
            (_, true) => CommunitySelection::Deselected,
            (Some(id), false) => CommunitySelection::from_id(id.as_str()),
            (None, false) => CommunitySelection::Unresolved,
        }
    }
}

pub fn read_record(path: &Path) -> Result<Record> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read record file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse record file {}", path.display()))
}

pub fn print_json(value: &serde_json::Value, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}

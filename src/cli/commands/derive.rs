use anyhow::Result;
use serde_json::json;
use std::path::PathBuf;

use super::{print_json, read_record, Command};
use crate::cli::SelectionArgs;
use crate::deposit::derive_state;

pub struct DeriveCommand {
    pub record: PathBuf,
    pub selection: SelectionArgs,
    pub pretty: bool,
}

impl DeriveCommand {
    pub fn new(record: PathBuf, selection: SelectionArgs) -> Self {
        Self {
            record,
            selection,
            pretty: false,
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn render(&self) -> Result<serde_json::Value> {
        let record = read_record(&self.record)?;
        let state = derive_state(&record, &self.selection.selection());
        tracing::debug!(status = ?record.status, actions = ?state.actions, "Derived deposit state");

        Ok(json!({
            "selected_community": state.selected_community,
            "ui": state.ui,
            "actions": state.actions,
            "primary_action": state.primary_action(),
        }))
    }
}

impl Command for DeriveCommand {
    async fn execute(&self) -> Result<()> {
        print_json(&self.render()?, self.pretty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_published_record_without_community() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("record.json");
        std::fs::write(
            &path,
            r#"{"id": "r1", "status": "published", "parent": {"communities": {}}}"#,
        )
        .unwrap();

        let output = DeriveCommand::new(path, SelectionArgs::default())
            .render()
            .unwrap();
        assert_eq!(output["ui"]["hide_community_header"], json!(true));
        assert_eq!(output["ui"]["show_community_selection_button"], json!(false));
        assert_eq!(output["primary_action"], json!("publish"));
    }

    #[test]
    fn test_render_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = DeriveCommand::new(dir.path().join("missing.json"), SelectionArgs::default())
            .render()
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read record file"));
    }
}

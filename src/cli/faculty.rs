//! Faculty pool commands: import, list.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Subcommand;

use crate::model::FacultyMember;
use crate::scope::ViewScope;

use super::format::format_faculty;
use super::{Backend, InterruptGuard};

#[derive(Debug, Subcommand)]
pub enum FacultyCommand {
    /// Import faculty members from a JSON array into local storage.
    Import {
        /// JSON file: `[{"id": 3, "first_name": "...", "last_name": "..."}, ...]`.
        file: PathBuf,
    },

    /// List faculty available for meetings.
    List,
}

pub(super) fn cmd_import(backend: &Backend, file: &Path) -> Result<(), String> {
    let storage = backend.local()?;
    let contents = fs::read_to_string(file)
        .map_err(|e| format!("failed to read {}: {e}", file.display()))?;
    let members: Vec<FacultyMember> = serde_json::from_str(&contents)
        .map_err(|e| format!("invalid faculty list in {}: {e}", file.display()))?;

    let count = storage
        .import_faculty(&members)
        .map_err(|e| format!("failed to import faculty: {e}"))?;

    println!("Imported {count} faculty member(s)");
    Ok(())
}

pub(super) async fn cmd_list(backend: &Backend) -> Result<(), String> {
    let scope = ViewScope::new();
    let _interrupt = InterruptGuard::watch(scope.teardown_handle());
    let members = scope
        .run(backend.profiles().list_faculty())
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| format!("failed to list faculty: {e}"))?;

    if members.is_empty() {
        println!("No faculty available");
        return Ok(());
    }

    for member in &members {
        println!("{}", format_faculty(member));
    }
    Ok(())
}

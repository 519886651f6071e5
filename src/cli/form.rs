//! Form commands: import, list, show, fill.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Subcommand;

use crate::model::{FormDescriptor, FormId};
use crate::submission::{FormSession, Phase, SubmitAttempt};

use super::answer::{edits_for, resolve_field, split_assignment};
use super::format::{format_field, format_form_header};
use super::{Backend, InterruptGuard, confirm};

#[derive(Debug, Subcommand)]
pub enum FormCommand {
    /// Import a form descriptor from a JSON file into local storage.
    ///
    /// Re-importing a form with the same id replaces it; earlier
    /// submissions keep replaying against the fields they were made with.
    Import {
        /// JSON file holding one form (`id`, `title`, `form_fields`).
        file: PathBuf,
    },

    /// List forms in local storage.
    List,

    /// Show a form's fields.
    ///
    /// If the acting user already completed the form, shows their answers
    /// read-only instead.
    Show {
        /// Form id.
        id: u64,
    },

    /// Fill in a form and submit it.
    ///
    /// Fields are named by id or label. Checkbox values are comma-separated,
    /// dates are `YYYY-MM-DD`, date ranges are `START..END`.
    Fill {
        /// Form id.
        id: u64,

        /// An answer, as `FIELD=VALUE`. Can be specified multiple times.
        #[arg(long = "answer", value_name = "FIELD=VALUE")]
        answers: Vec<String>,

        /// Submit without asking for confirmation.
        #[arg(long)]
        yes: bool,
    },
}

pub(super) fn cmd_import(backend: &Backend, file: &Path) -> Result<(), String> {
    let storage = backend.local()?;
    let contents = fs::read_to_string(file)
        .map_err(|e| format!("failed to read {}: {e}", file.display()))?;
    let form: FormDescriptor = serde_json::from_str(&contents)
        .map_err(|e| format!("invalid form in {}: {e}", file.display()))?;

    storage
        .import_form(&form)
        .map_err(|e| format!("failed to import form: {e}"))?;

    println!("{}  {} ({} fields)", form.id, form.title, form.fields.len());
    Ok(())
}

pub(super) fn cmd_list(backend: &Backend) -> Result<(), String> {
    let forms = backend
        .local()?
        .list_forms()
        .map_err(|e| format!("failed to list forms: {e}"))?;

    if forms.is_empty() {
        println!("No forms");
        return Ok(());
    }

    for form in &forms {
        println!("{:>4}  {}  ({} fields)", form.id, form.title, form.fields.len());
    }
    Ok(())
}

pub(super) async fn cmd_show(backend: &Backend, id: u64) -> Result<(), String> {
    let session = open(backend, FormId(id)).await?;
    print_form(&session);
    Ok(())
}

pub(super) async fn cmd_fill(
    backend: &Backend,
    id: u64,
    answers: &[String],
    yes: bool,
) -> Result<(), String> {
    let mut session = open(backend, FormId(id)).await?;
    if session.is_view_only() {
        print_form(&session);
        return Err("You have already submitted this form".into());
    }

    for arg in answers {
        let (key, value) = split_assignment(arg)?;
        let form = session.form().ok_or("form is not loaded")?;
        let field = resolve_field(form, key)?;
        let field_id = field.id.clone();
        for edit in edits_for(field, value)? {
            session
                .edit(&field_id, edit)
                .map_err(|e| format!("{key}: {e}"))?;
        }
    }

    match session.request_submit().map_err(|e| e.to_string())? {
        SubmitAttempt::Invalid { errors } => {
            print_form(&session);
            return Err(format!("{} answer(s) need attention", errors.len()));
        }
        SubmitAttempt::AwaitingConfirmation => print_form(&session),
    }

    if !confirm("Submit this form?", yes).await? {
        session.cancel_submit().map_err(|e| e.to_string())?;
        println!("Not submitted");
        return Ok(());
    }

    {
        let _interrupt = InterruptGuard::watch(session.teardown_handle());
        session
            .confirm_submit(backend.sink())
            .await
            .map_err(|e| e.to_string())?;
    }

    match session.phase() {
        Phase::Submitted => {
            if let Some(notice) = session.notice() {
                println!("{notice}");
            }
            Ok(())
        }
        Phase::Disposed => Err("interrupted before the submission finished".into()),
        _ => Err(session
            .alert()
            .unwrap_or("Failed to submit form")
            .to_string()),
    }
}

/// Load a form, replaying the acting user's completed submission if any.
async fn open(backend: &Backend, id: FormId) -> Result<FormSession, String> {
    let mut session = FormSession::new(id).on_submitted(|record| {
        if let Some(id) = record.id {
            println!("Submission {id} recorded");
        }
    });

    {
        let _interrupt = InterruptGuard::watch(session.teardown_handle());
        session.load_with_prior(backend.forms()).await;
    }

    match session.phase() {
        Phase::LoadFailed(message) => Err(message),
        Phase::Disposed => Err("interrupted while loading".into()),
        _ => Ok(session),
    }
}

fn print_form(session: &FormSession) {
    if let Some(form) = session.form() {
        println!("{}", format_form_header(form, session.is_view_only()));
        println!();
    }
    for field in session.rendered() {
        println!("{}", format_field(&field));
    }
}

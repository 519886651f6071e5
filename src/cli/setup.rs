//! Candidate setup command.

use std::fs;
use std::path::PathBuf;

use clap::Args;

use crate::backend::HeadshotFile;
use crate::model::{FACULTY_SLOTS, ProfileDraft, VISIT_DATE_SLOTS};
use crate::wizard::{SetupWizard, Step, WizardPhase};

use super::answer::parse_range;
use super::format::{format_review, format_step_issues};
use super::{Backend, InterruptGuard, confirm};

#[derive(Debug, Args)]
pub struct SetupArgs {
    /// JSON file with the draft profile (keys as in the API, e.g.
    /// `current_title`, `abstract`, `travel_assistance`).
    #[arg(long)]
    profile: PathBuf,

    /// Image to upload as the headshot (under 5MB).
    #[arg(long)]
    headshot: Option<PathBuf>,

    /// Preferred visit window, as `START..END`. Up to three.
    #[arg(long = "visit", value_name = "START..END")]
    visits: Vec<String>,

    /// Faculty member to meet, by id, in order of preference. Up to four.
    #[arg(long = "faculty", value_name = "ID")]
    faculty: Vec<u64>,

    /// Submit without asking for confirmation.
    #[arg(long)]
    yes: bool,
}

pub(super) async fn cmd_setup(backend: &Backend, args: &SetupArgs) -> Result<(), String> {
    if args.visits.len() > VISIT_DATE_SLOTS {
        return Err(format!("at most {VISIT_DATE_SLOTS} --visit ranges"));
    }
    if args.faculty.len() > FACULTY_SLOTS {
        return Err(format!("at most {FACULTY_SLOTS} --faculty picks"));
    }

    let contents = fs::read_to_string(&args.profile)
        .map_err(|e| format!("failed to read {}: {e}", args.profile.display()))?;
    let draft: ProfileDraft = serde_json::from_str(&contents)
        .map_err(|e| format!("invalid profile in {}: {e}", args.profile.display()))?;

    let mut wizard = SetupWizard::with_draft(draft);
    {
        let _interrupt = InterruptGuard::watch(wizard.teardown_handle());
        wizard.start(backend.session(), backend.profiles()).await;
    }
    ensure_open(&wizard)?;
    if let Some(error) = wizard.error() {
        eprintln!("warning: {error}");
        wizard.dismiss_error();
    }

    for (slot, visit) in args.visits.iter().enumerate() {
        let range = parse_range(visit)?;
        wizard
            .set_visit_dates(slot, range)
            .map_err(|e| e.to_string())?;
    }
    for (slot, id) in args.faculty.iter().enumerate() {
        wizard
            .pick_faculty(slot, *id)
            .map_err(|e| e.to_string())?;
    }

    if let Some(path) = &args.headshot {
        let file = HeadshotFile::read(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        {
            let _interrupt = InterruptGuard::watch(wizard.teardown_handle());
            wizard
                .upload_headshot(&file, backend.uploader())
                .await
                .map_err(|e| e.to_string())?;
        }
        ensure_open(&wizard)?;
        // The headshot is optional; setup goes ahead without it.
        if let Some(error) = &wizard.upload().error {
            eprintln!("warning: {error}");
        }
    }

    // Walk the steps the way the wizard presents them; gaps are advisory.
    loop {
        let step = wizard.step();
        let issues = wizard.step_issues(step);
        if step != Step::ReviewAndSubmit && !issues.is_empty() {
            eprintln!("{}", format_step_issues(step, &issues));
        }
        if !wizard.next() {
            break;
        }
    }
    let missing = wizard.step_issues(Step::ReviewAndSubmit).len();
    if missing > 0 {
        eprintln!("warning: {missing} required field(s) still missing");
    }

    println!("{}", format_review(&wizard.payload(), wizard.faculty()));

    wizard.request_submit().map_err(|e| e.to_string())?;
    if !confirm("Complete setup?", args.yes).await? {
        wizard.cancel_submit().map_err(|e| e.to_string())?;
        wizard.close();
        println!("Not submitted");
        return Ok(());
    }

    {
        let _interrupt = InterruptGuard::watch(wizard.teardown_handle());
        wizard
            .confirm_submit(backend.profiles(), backend.session())
            .await
            .map_err(|e| e.to_string())?;
    }

    match wizard.phase() {
        WizardPhase::Completed => {
            println!("Setup complete");
            Ok(())
        }
        WizardPhase::Closed => Err("interrupted before setup finished".into()),
        _ => Err(wizard.error().unwrap_or("Failed to complete setup").to_string()),
    }
}

fn ensure_open(wizard: &SetupWizard) -> Result<(), String> {
    if wizard.phase() == WizardPhase::Closed {
        return Err("interrupted".into());
    }
    Ok(())
}

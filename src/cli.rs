//! CLI interface for Intake.
//!
//! Drives the form engine and the setup wizard from the command line. Every
//! command runs against one of two backends:
//!
//! - local storage (default): a `SQLite` stand-in for the API under
//!   `~/.intake/data/`, scoped to the acting user (`--as`).
//! - `--remote`: the REST API named by `api-url` in `~/.intake/config.toml`.
//!
//! Submitting anything asks for confirmation on stdin unless `--yes` is given.

mod answer;
mod faculty;
mod form;
mod format;
mod setup;

use std::io::{self, Write};

use clap::{Parser, Subcommand};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::backend::http::ApiClient;
use crate::backend::{FormSource, HeadshotUploader, ProfileService, SetupSession, SubmissionSink};
use crate::config::Config;
use crate::identity;
use crate::scope::TeardownHandle;
use crate::storage::Storage;

pub use faculty::FacultyCommand;
pub use form::FormCommand;
pub use setup::SetupArgs;

/// Intake — fill in recruiting-visit forms and candidate profiles.
#[derive(Debug, Parser)]
#[command(name = "intake", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Talk to the REST API from config instead of local storage.
    #[arg(long, global = true)]
    remote: bool,

    /// Acting user for local storage (e.g. `ada@example.edu`).
    /// Falls back to `INTAKE_USER`, then `user` in config.
    #[arg(long = "as", global = true)]
    user: Option<String>,

    /// Log engine activity to stderr.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: filling in a form locally
  1. intake form import visit-survey.json
  2. intake --as ada@example.edu form show 5
  3. intake --as ada@example.edu form fill 5 \
       --answer "First Name=Ada" --answer "Dates=2025-06-10..2025-06-12"
  4. intake --as ada@example.edu form show 5   (now view-only)

Candidate setup:
  intake faculty import faculty.json
  intake --as ada@example.edu setup --profile ada.json \
      --headshot me.png --visit 2025-06-10..2025-06-12 --faculty 3"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Work with dynamic forms: import, list, show, fill.
    Form {
        #[command(subcommand)]
        command: FormCommand,
    },

    /// Manage the faculty pool candidates pick from.
    Faculty {
        #[command(subcommand)]
        command: FacultyCommand,
    },

    /// Complete the candidate profile setup.
    ///
    /// Reads the draft profile from a JSON file, reports anything missing
    /// per step, shows the review, and submits after confirmation.
    Setup(SetupArgs),
}

/// Run the CLI, returning an error message on failure.
pub async fn run(cli: Cli, config: &Config) -> Result<(), String> {
    let backend = Backend::open(&cli, config)?;

    match cli.command {
        Command::Form { command } => match command {
            FormCommand::Import { file } => form::cmd_import(&backend, &file),
            FormCommand::List => form::cmd_list(&backend),
            FormCommand::Show { id } => form::cmd_show(&backend, id).await,
            FormCommand::Fill { id, answers, yes } => {
                form::cmd_fill(&backend, id, &answers, yes).await
            }
        },
        Command::Faculty { command } => match command {
            FacultyCommand::Import { file } => faculty::cmd_import(&backend, &file),
            FacultyCommand::List => faculty::cmd_list(&backend).await,
        },
        Command::Setup(args) => setup::cmd_setup(&backend, &args).await,
    }
}

/// Where collaborator calls go.
enum Backend {
    Local(Storage),
    Remote(ApiClient),
}

impl Backend {
    fn open(cli: &Cli, config: &Config) -> Result<Self, String> {
        if cli.remote {
            let url = config.require_api_url()?;
            debug!(%url, "using remote backend");
            return Ok(Self::Remote(ApiClient::new(url, config.api_token.as_deref())));
        }

        let root = Storage::default_root().ok_or("could not determine home directory")?;
        let mut storage = Storage::new(&root)
            .map_err(|e| format!("failed to open storage at {}: {e}", root.display()))?;
        if let Some(user) = identity::resolve_user(cli.user.as_deref(), config) {
            debug!(%user, "acting user");
            storage = storage.acting_as(user);
        }
        Ok(Self::Local(storage))
    }

    /// Local storage, for commands the API has no counterpart for.
    fn local(&self) -> Result<&Storage, String> {
        match self {
            Self::Local(storage) => Ok(storage),
            Self::Remote(_) => Err("this command only works on local storage (drop --remote)".into()),
        }
    }

    fn forms(&self) -> &dyn FormSource {
        match self {
            Self::Local(s) => s,
            Self::Remote(c) => c,
        }
    }

    fn sink(&self) -> &dyn SubmissionSink {
        match self {
            Self::Local(s) => s,
            Self::Remote(c) => c,
        }
    }

    fn uploader(&self) -> &dyn HeadshotUploader {
        match self {
            Self::Local(s) => s,
            Self::Remote(c) => c,
        }
    }

    fn profiles(&self) -> &dyn ProfileService {
        match self {
            Self::Local(s) => s,
            Self::Remote(c) => c,
        }
    }

    fn session(&self) -> &dyn SetupSession {
        match self {
            Self::Local(s) => s,
            Self::Remote(c) => c,
        }
    }
}

/// Tears a view down on Ctrl-C while alive.
struct InterruptGuard(JoinHandle<()>);

impl InterruptGuard {
    fn watch(handle: TeardownHandle) -> Self {
        Self(tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted");
                handle.teardown();
            }
        }))
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Ask a yes/no question on stdin. `yes` answers it up front.
async fn confirm(prompt: &str, yes: bool) -> Result<bool, String> {
    if yes {
        return Ok(true);
    }

    eprint!("{prompt} [y/N] ");
    io::stderr()
        .flush()
        .map_err(|e| format!("failed to write prompt: {e}"))?;

    let read = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        io::stdin().read_line(&mut line).map(|_| line)
    });
    let line = tokio::select! {
        joined = read => joined
            .map_err(|e| format!("failed to read answer: {e}"))?
            .map_err(|e| format!("failed to read answer: {e}"))?,
        _ = tokio::signal::ctrl_c() => return Err("interrupted".into()),
    };

    Ok(is_yes(&line))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_explicit_yes_confirms() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("n"));
        assert!(!is_yes("yep"));
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["intake", "form", "show", "5", "--as", "ada@example.edu"])
            .unwrap();
        assert_eq!(cli.user.as_deref(), Some("ada@example.edu"));
        assert!(!cli.remote);
        assert!(matches!(
            cli.command,
            Command::Form {
                command: FormCommand::Show { id: 5 }
            }
        ));
    }

    #[test]
    fn fill_collects_repeated_answers() {
        let cli = Cli::try_parse_from([
            "intake",
            "form",
            "fill",
            "5",
            "--answer",
            "First Name=Ada",
            "--answer",
            "Topics=Rust,Go",
            "--yes",
        ])
        .unwrap();
        let Command::Form {
            command: FormCommand::Fill { answers, yes, .. },
        } = cli.command
        else {
            panic!("expected form fill");
        };
        assert_eq!(answers, vec!["First Name=Ada", "Topics=Rust,Go"]);
        assert!(yes);
    }

    #[test]
    fn remote_commands_refuse_local_only_work() {
        let backend = Backend::Remote(ApiClient::new("http://localhost:1", None));
        assert!(backend.local().is_err());
    }
}

//! Collaborators the form engine talks to.
//!
//! The engine never knows whether it is talking to the REST API
//! ([`http::ApiClient`]) or to local storage ([`crate::storage::Storage`]);
//! both implement the traits here.

pub mod http;

use std::path::{Path, PathBuf};
use std::{fs, io};

use async_trait::async_trait;
use serde_json::Value;

use crate::model::{
    CurrentUser, FacultyMember, FormDescriptor, FormId, ProfilePayload, SubmissionPayload,
    SubmissionRecord,
};

/// Errors a collaborator can report.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("not found")]
    NotFound,

    /// The collaborator refused the request and said why.
    #[error("{message}")]
    Rejected { message: String },

    /// The API failed the request without saying why.
    #[error("request failed: {0}")]
    Status(reqwest::StatusCode),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(crate::storage::StorageError),

    #[error("{0}")]
    Invalid(String),
}

impl BackendError {
    /// The message to show a user, if the collaborator supplied one.
    ///
    /// Transport and decoding failures have no user-facing message; callers
    /// fall back to their own generic text.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message } | Self::Invalid(message) => Some(message),
            Self::NotFound
            | Self::Status(_)
            | Self::Http(_)
            | Self::Json(_)
            | Self::Storage(_) => None,
        }
    }
}

pub type Result<T> = core::result::Result<T, BackendError>;

/// Pull a human-readable message out of an error payload.
///
/// Looks at `detail`, then `error`, then `answers` (a string or the first
/// string of an array).
pub fn extract_message(body: &Value) -> Option<String> {
    let text = |v: &Value| v.as_str().filter(|s| !s.is_empty()).map(str::to_string);

    if let Some(m) = body.get("detail").and_then(text) {
        return Some(m);
    }
    if let Some(m) = body.get("error").and_then(text) {
        return Some(m);
    }
    match body.get("answers")? {
        Value::Array(items) => items.iter().find_map(text),
        other => text(other),
    }
}

/// Where form descriptors and prior submissions come from.
#[async_trait]
pub trait FormSource: Send + Sync {
    async fn fetch_form(&self, id: FormId) -> Result<FormDescriptor>;

    /// Submissions the acting user has made for a form.
    async fn fetch_submissions(&self, form: FormId) -> Result<Vec<SubmissionRecord>>;
}

/// Where completed submissions go.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmissionRecord>;
}

/// Accepts headshot images and returns the URL they are served from.
#[async_trait]
pub trait HeadshotUploader: Send + Sync {
    async fn upload_headshot(&self, file: &HeadshotFile) -> Result<String>;
}

/// Faculty pool and candidate profile completion.
#[async_trait]
pub trait ProfileService: Send + Sync {
    async fn list_faculty(&self) -> Result<Vec<FacultyMember>>;

    async fn complete_setup(&self, profile: &ProfilePayload) -> Result<()>;
}

/// The signed-in session, as seen by the setup wizard.
#[async_trait]
pub trait SetupSession: Send + Sync {
    async fn current_user(&self) -> Result<CurrentUser>;

    /// Record that the current user finished profile setup.
    async fn complete_setup(&self) -> Result<()>;
}

/// An image picked for upload as a headshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadshotFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    /// Set when the file was read from disk.
    pub source_path: Option<PathBuf>,
}

impl HeadshotFile {
    /// Read an image from disk, guessing its type from the extension.
    pub fn read(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let source_path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        Ok(Self {
            content_type: content_type_for(path).to_string(),
            file_name,
            bytes,
            source_path: Some(source_path),
        })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        Some("heic") => "image/heic",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn detail_wins_over_error() {
        let body = json!({"detail": "Not allowed", "error": "ignored"});
        assert_eq!(extract_message(&body).as_deref(), Some("Not allowed"));
    }

    #[test]
    fn answers_array_yields_first_string() {
        let body = json!({"answers": ["First Name is required", "Stay is required"]});
        assert_eq!(
            extract_message(&body).as_deref(),
            Some("First Name is required")
        );
    }

    #[test]
    fn answers_string_is_used_as_is() {
        let body = json!({"answers": "Answers must be a dictionary"});
        assert_eq!(
            extract_message(&body).as_deref(),
            Some("Answers must be a dictionary")
        );
    }

    #[test]
    fn unrecognized_payload_has_no_message() {
        assert_eq!(extract_message(&json!({"non_field_errors": ["x"]})), None);
        assert_eq!(extract_message(&json!("plain")), None);
    }

    #[test]
    fn user_message_only_for_explained_failures() {
        let rejected = BackendError::Rejected {
            message: "You have already submitted this form".into(),
        };
        assert_eq!(
            rejected.user_message(),
            Some("You have already submitted this form")
        );
        assert_eq!(BackendError::NotFound.user_message(), None);
        assert_eq!(
            BackendError::Status(reqwest::StatusCode::BAD_GATEWAY).user_message(),
            None
        );
    }

    #[test]
    fn reads_headshot_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("Me.JPG");
        fs::write(&path, b"\xff\xd8\xff").unwrap();

        let file = HeadshotFile::read(&path).unwrap();
        assert_eq!(file.file_name, "Me.JPG");
        assert_eq!(file.content_type, "image/jpeg");
        assert_eq!(file.size(), 3);
        assert!(file.source_path.is_some());
    }
}

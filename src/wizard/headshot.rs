//! Headshot selection and the upload side-channel.
//!
//! Uploads run alongside the rest of the wizard. Each selection gets a
//! ticket; a completion is applied only if its ticket is still current, so
//! removing or replacing the image makes any in-flight upload irrelevant.

use uuid::Uuid;

use crate::backend::HeadshotFile;

/// Largest accepted headshot, in bytes.
pub const MAX_HEADSHOT_BYTES: usize = 5 * 1024 * 1024;

/// Why a picked file was refused before any upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HeadshotError {
    #[error("Please upload an image file")]
    NotAnImage,

    #[error("Image must be smaller than 5MB")]
    TooLarge,
}

/// Check type and size locally.
pub fn check(file: &HeadshotFile) -> Result<(), HeadshotError> {
    if !file.content_type.starts_with("image/") {
        return Err(HeadshotError::NotAnImage);
    }
    if file.size() > MAX_HEADSHOT_BYTES {
        return Err(HeadshotError::TooLarge);
    }
    Ok(())
}

/// A URL the picked image can be previewed from before it is uploaded.
pub fn preview_url(file: &HeadshotFile) -> String {
    match &file.source_path {
        Some(path) => format!("file://{}", path.display()),
        None => format!("blob:{}", Uuid::new_v4()),
    }
}

/// Identifies one upload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTicket(u64);

/// Headshot state shown alongside the talk step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadState {
    /// Local preview, replaced by the server URL once uploaded.
    pub preview: Option<String>,
    pub uploading: bool,
    pub error: Option<String>,
    current: Option<UploadTicket>,
    issued: u64,
}

impl UploadState {
    /// Start a new upload attempt, superseding any earlier one.
    pub(super) fn begin(&mut self, preview: String) -> UploadTicket {
        self.issued += 1;
        let ticket = UploadTicket(self.issued);
        self.current = Some(ticket);
        self.preview = Some(preview);
        self.uploading = true;
        self.error = None;
        ticket
    }

    /// Apply an upload outcome. Returns the server URL when a current
    /// ticket succeeded; stale tickets change nothing.
    pub(super) fn finish(
        &mut self,
        ticket: UploadTicket,
        outcome: Result<String, String>,
    ) -> Option<String> {
        if self.current != Some(ticket) {
            return None;
        }
        self.current = None;
        self.uploading = false;
        match outcome {
            Ok(url) => {
                self.preview = Some(url.clone());
                Some(url)
            }
            Err(message) => {
                self.error = Some(message);
                None
            }
        }
    }

    pub(super) fn reject(&mut self, error: HeadshotError) {
        self.error = Some(error.to_string());
    }

    pub(super) fn clear(&mut self) {
        self.preview = None;
        self.uploading = false;
        self.error = None;
        self.current = None;
    }
}

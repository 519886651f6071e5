//! Collaborator trait implementations over local storage.
//!
//! `SQLite` and the filesystem block, so each call runs on tokio's blocking
//! pool against its own handle.

use async_trait::async_trait;
use tokio::task;

use crate::backend::{
    self, BackendError, FormSource, HeadshotFile, HeadshotUploader, ProfileService, SetupSession,
    SubmissionSink,
};
use crate::model::{
    CurrentUser, FacultyMember, FormDescriptor, FormId, ProfilePayload, SubmissionPayload,
    SubmissionRecord,
};

use super::{Storage, StorageError};

impl Storage {
    async fn blocking<T, F>(&self, op: F) -> backend::Result<T>
    where
        F: FnOnce(&Storage) -> super::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let storage = self.clone();
        let joined = task::spawn_blocking(move || op(&storage)).await;
        match joined {
            Ok(result) => Ok(result?),
            Err(e) => Err(BackendError::Storage(StorageError::Io(std::io::Error::other(e)))),
        }
    }
}

#[async_trait]
impl FormSource for Storage {
    async fn fetch_form(&self, id: FormId) -> backend::Result<FormDescriptor> {
        self.blocking(move |s| s.load_form(id)).await
    }

    async fn fetch_submissions(&self, form: FormId) -> backend::Result<Vec<SubmissionRecord>> {
        self.blocking(move |s| s.submissions_for(form)).await
    }
}

#[async_trait]
impl SubmissionSink for Storage {
    async fn submit(&self, payload: &SubmissionPayload) -> backend::Result<SubmissionRecord> {
        let payload = payload.clone();
        self.blocking(move |s| s.save_submission(&payload)).await
    }
}

#[async_trait]
impl HeadshotUploader for Storage {
    async fn upload_headshot(&self, file: &HeadshotFile) -> backend::Result<String> {
        let file = file.clone();
        self.blocking(move |s| s.save_headshot(&file)).await
    }
}

#[async_trait]
impl ProfileService for Storage {
    async fn list_faculty(&self) -> backend::Result<Vec<FacultyMember>> {
        self.blocking(Storage::list_faculty).await
    }

    async fn complete_setup(&self, profile: &ProfilePayload) -> backend::Result<()> {
        let profile = profile.clone();
        self.blocking(move |s| s.save_profile(&profile)).await
    }
}

#[async_trait]
impl SetupSession for Storage {
    async fn current_user(&self) -> backend::Result<CurrentUser> {
        self.blocking(Storage::current_user).await
    }

    async fn complete_setup(&self) -> backend::Result<()> {
        self.blocking(Storage::mark_setup_complete).await
    }
}

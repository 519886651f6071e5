//! Multi-step candidate setup wizard.
//!
//! Five fixed steps collect a [`ProfileDraft`]. Navigation is free: step
//! checks are advisory and never block moving on. A headshot upload can run
//! alongside editing, and the final submit goes through the same
//! confirm-then-send gate as a form session.

mod faculty;
mod headshot;
mod payload;
mod step;

pub use faculty::FacultyPicks;
pub use headshot::{HeadshotError, MAX_HEADSHOT_BYTES, UploadState, UploadTicket};
pub use step::Step;

use tracing::{debug, info, warn};

use crate::backend::{self, HeadshotFile, HeadshotUploader, ProfileService, SetupSession};
use crate::model::{DateRange, FacultyMember, ProfileDraft, ProfilePayload, VISIT_DATE_SLOTS};
use crate::scope::{Cancelled, TeardownHandle, ViewScope};

/// Where the wizard is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardPhase {
    Editing,
    ConfirmPending,
    Submitting,
    /// Setup completed; the draft has been discarded.
    Completed,
    /// Closed without completing, or torn down.
    Closed,
}

/// Misuse of the wizard.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("no faculty slot {0}")]
    NoSuchSlot(usize),

    #[error("no visit date slot {0}")]
    NoSuchVisitSlot(usize),

    #[error("faculty member {0} is not available")]
    UnknownFaculty(u64),

    #[error("faculty member {0} is already picked in another slot")]
    AlreadyPicked(u64),

    #[error("{0}")]
    Headshot(#[from] HeadshotError),

    #[error("wizard is not accepting that while {0:?}")]
    WrongPhase(WizardPhase),
}

/// The setup wizard for one candidate.
pub struct SetupWizard {
    step: Step,
    draft: ProfileDraft,
    upload: UploadState,
    picks: FacultyPicks,
    faculty: Vec<FacultyMember>,
    phase: WizardPhase,
    error: Option<String>,
    scope: ViewScope,
}

impl Default for SetupWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl SetupWizard {
    pub fn new() -> Self {
        Self {
            step: Step::PersonalInformation,
            draft: ProfileDraft::default(),
            upload: UploadState::default(),
            picks: FacultyPicks::default(),
            faculty: Vec::new(),
            phase: WizardPhase::Editing,
            error: None,
            scope: ViewScope::new(),
        }
    }

    /// Start from an existing draft, e.g. one read from a file.
    pub fn with_draft(draft: ProfileDraft) -> Self {
        Self {
            draft,
            ..Self::new()
        }
    }

    pub fn teardown_handle(&self) -> TeardownHandle {
        self.scope.teardown_handle()
    }

    /// Pre-fill the names from the session and fetch the faculty pool.
    ///
    /// Either failing leaves the wizard usable: names stay blank, and an
    /// empty pool just means no faculty can be picked.
    pub async fn start(&mut self, session: &dyn SetupSession, profiles: &dyn ProfileService) {
        match self.scope.run(session.current_user()).await {
            Err(Cancelled) => return self.close(),
            Ok(Ok(user)) => {
                debug!(user = %user.email, "pre-filling from session");
                if self.draft.first_name.is_empty() {
                    self.draft.first_name = user.first_name;
                }
                if self.draft.last_name.is_empty() {
                    self.draft.last_name = user.last_name;
                }
            }
            Ok(Err(e)) => warn!(error = %e, "could not read current user"),
        }

        match self.scope.run(profiles.list_faculty()).await {
            Err(Cancelled) => self.close(),
            Ok(Ok(pool)) => {
                debug!(count = pool.len(), "faculty pool loaded");
                self.faculty = pool;
            }
            Ok(Err(e)) => {
                warn!(error = %e, "could not load faculty");
                self.error = Some("Failed to load faculty members".into());
            }
        }
    }

    // ── Navigation ──

    /// Move forward one step. Returns false at the last step.
    pub fn next(&mut self) -> bool {
        self.go(self.step.next())
    }

    /// Move back one step. Returns false at the first step.
    pub fn back(&mut self) -> bool {
        self.go(self.step.prev())
    }

    fn go(&mut self, to: Option<Step>) -> bool {
        match to {
            Some(step) if self.phase() == WizardPhase::Editing => {
                let issues = step::issues(self.step, &self.draft);
                if !issues.is_empty() {
                    debug!(step = self.step.title(), missing = issues.len(), "leaving step with gaps");
                }
                self.step = step;
                true
            }
            _ => false,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    /// Missing required entries for `step`. Advisory only.
    pub fn step_issues(&self, step: Step) -> Vec<String> {
        step::issues(step, &self.draft)
    }

    // ── Editing ──

    pub fn draft(&self) -> &ProfileDraft {
        &self.draft
    }

    /// Edit the draft in place.
    pub fn update(&mut self, edit: impl FnOnce(&mut ProfileDraft)) -> Result<(), WizardError> {
        self.ensure_editing()?;
        edit(&mut self.draft);
        Ok(())
    }

    pub fn set_visit_dates(&mut self, slot: usize, range: DateRange) -> Result<(), WizardError> {
        self.ensure_editing()?;
        if slot >= VISIT_DATE_SLOTS {
            return Err(WizardError::NoSuchVisitSlot(slot));
        }
        self.draft.preferred_visit_dates[slot] = range;
        Ok(())
    }

    // ── Faculty ──

    pub fn faculty(&self) -> &[FacultyMember] {
        &self.faculty
    }

    /// Members selectable in `slot`.
    pub fn faculty_options(&self, slot: usize) -> Vec<&FacultyMember> {
        self.picks.options(slot, &self.faculty)
    }

    pub fn pick_faculty(&mut self, slot: usize, id: u64) -> Result<(), WizardError> {
        self.ensure_editing()?;
        self.picks.pick(slot, id, &self.faculty)
    }

    pub fn clear_faculty(&mut self, slot: usize) -> Result<(), WizardError> {
        self.ensure_editing()?;
        self.picks.clear(slot)
    }

    pub fn picks(&self) -> &FacultyPicks {
        &self.picks
    }

    // ── Headshot ──

    pub fn upload(&self) -> &UploadState {
        &self.upload
    }

    /// Accept a picked image for upload, or refuse it with an inline error.
    pub fn select_headshot(&mut self, file: &HeadshotFile) -> Result<UploadTicket, WizardError> {
        self.ensure_editing()?;
        if let Err(e) = headshot::check(file) {
            debug!(file = %file.file_name, error = %e, "headshot refused");
            self.upload.reject(e);
            return Err(e.into());
        }
        Ok(self.upload.begin(headshot::preview_url(file)))
    }

    /// Apply an upload outcome. Outcomes for superseded or removed
    /// selections are ignored.
    pub fn finish_headshot_upload(&mut self, ticket: UploadTicket, outcome: backend::Result<String>) {
        let outcome = outcome.map_err(|e| {
            warn!(error = %e, "headshot upload failed");
            e.user_message()
                .unwrap_or("Failed to upload headshot")
                .to_string()
        });
        if let Some(url) = self.upload.finish(ticket, outcome) {
            info!(%url, "headshot uploaded");
            self.draft.headshot_url = Some(url);
        }
    }

    /// Select and upload in one go.
    pub async fn upload_headshot(
        &mut self,
        file: &HeadshotFile,
        uploader: &dyn HeadshotUploader,
    ) -> Result<(), WizardError> {
        let ticket = self.select_headshot(file)?;
        match self.scope.run(uploader.upload_headshot(file)).await {
            Err(Cancelled) => self.close(),
            Ok(outcome) => self.finish_headshot_upload(ticket, outcome),
        }
        Ok(())
    }

    /// Drop the picked image and forget any in-flight upload.
    pub fn remove_headshot(&mut self) {
        self.upload.clear();
        self.draft.headshot_url = None;
    }

    // ── Submitting ──

    pub fn request_submit(&mut self) -> Result<(), WizardError> {
        self.ensure_editing()?;
        self.phase = WizardPhase::ConfirmPending;
        Ok(())
    }

    pub fn cancel_submit(&mut self) -> Result<(), WizardError> {
        self.expect_phase(&WizardPhase::ConfirmPending)?;
        self.phase = WizardPhase::Editing;
        Ok(())
    }

    /// The payload a confirm would send right now.
    pub fn payload(&self) -> ProfilePayload {
        payload::build(&self.draft, &self.picks)
    }

    /// Send the profile. On success the session is told setup is complete
    /// and the wizard closes; on failure it returns to editing with an
    /// error message and every entry intact.
    pub async fn confirm_submit(
        &mut self,
        service: &dyn ProfileService,
        session: &dyn SetupSession,
    ) -> Result<(), WizardError> {
        self.expect_phase(&WizardPhase::ConfirmPending)?;
        self.phase = WizardPhase::Submitting;
        self.error = None;

        let payload = self.payload();
        match self.scope.run(service.complete_setup(&payload)).await {
            Err(Cancelled) => {
                self.close();
                return Ok(());
            }
            Ok(Err(e)) => {
                warn!(error = %e, "profile completion failed");
                self.error = Some(
                    e.user_message()
                        .unwrap_or("Failed to complete setup")
                        .to_string(),
                );
                self.phase = WizardPhase::Editing;
                return Ok(());
            }
            Ok(Ok(())) => {}
        }

        match self.scope.run(session.complete_setup()).await {
            Err(Cancelled) | Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "session did not record completed setup"),
        }
        info!("candidate setup completed");
        self.discard();
        self.phase = WizardPhase::Completed;
        Ok(())
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Close without submitting.
    pub fn close(&mut self) {
        debug!("wizard closed");
        self.discard();
        self.phase = WizardPhase::Closed;
    }

    pub fn phase(&self) -> WizardPhase {
        if self.scope.is_torn_down() && self.phase != WizardPhase::Completed {
            WizardPhase::Closed
        } else {
            self.phase.clone()
        }
    }

    fn discard(&mut self) {
        self.draft = ProfileDraft::default();
        self.upload = UploadState::default();
        self.picks = FacultyPicks::default();
        self.step = Step::PersonalInformation;
    }

    fn ensure_editing(&self) -> Result<(), WizardError> {
        self.expect_phase(&WizardPhase::Editing)
    }

    fn expect_phase(&self, want: &WizardPhase) -> Result<(), WizardError> {
        let phase = self.phase();
        if phase == *want {
            Ok(())
        } else {
            Err(WizardError::WrongPhase(phase))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use jiff::civil::date;

    use crate::backend::BackendError;
    use crate::model::CurrentUser;

    struct FakeSession {
        completed: AtomicUsize,
    }

    impl FakeSession {
        fn new() -> Self {
            Self {
                completed: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SetupSession for FakeSession {
        async fn current_user(&self) -> backend::Result<CurrentUser> {
            Ok(CurrentUser {
                id: 7,
                email: "ada@example.edu".into(),
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                has_completed_setup: false,
            })
        }

        async fn complete_setup(&self) -> backend::Result<()> {
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeProfiles {
        sent: Mutex<Vec<ProfilePayload>>,
        fail: bool,
    }

    #[async_trait]
    impl ProfileService for FakeProfiles {
        async fn list_faculty(&self) -> backend::Result<Vec<FacultyMember>> {
            Ok([(1, "Alan"), (2, "Grace")]
                .into_iter()
                .map(|(id, name)| FacultyMember {
                    id,
                    first_name: name.into(),
                    last_name: "Faculty".into(),
                    email: String::new(),
                    room_number: None,
                })
                .collect())
        }

        async fn complete_setup(&self, profile: &ProfilePayload) -> backend::Result<()> {
            self.sent.lock().unwrap().push(profile.clone());
            if self.fail {
                return Err(BackendError::NotFound);
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingUploader {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HeadshotUploader for CountingUploader {
        async fn upload_headshot(&self, file: &HeadshotFile) -> backend::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("https://cdn.example/{}", file.file_name))
        }
    }

    fn image(bytes: usize) -> HeadshotFile {
        HeadshotFile {
            file_name: "me.png".into(),
            content_type: "image/png".into(),
            bytes: vec![0; bytes],
            source_path: None,
        }
    }

    async fn started() -> SetupWizard {
        let mut wizard = SetupWizard::new();
        wizard
            .start(&FakeSession::new(), &FakeProfiles::default())
            .await;
        wizard
    }

    #[tokio::test]
    async fn prefills_names_from_session() {
        let wizard = started().await;
        assert_eq!(wizard.draft().first_name, "Ada");
        assert_eq!(wizard.draft().last_name, "Lovelace");
        assert_eq!(wizard.faculty().len(), 2);
    }

    #[tokio::test]
    async fn navigation_is_not_gated_by_issues() {
        let mut wizard = SetupWizard::new();
        assert!(!wizard.step_issues(Step::PersonalInformation).is_empty());
        assert!(!wizard.back());
        for _ in 0..4 {
            assert!(wizard.next());
        }
        assert_eq!(wizard.step(), Step::ReviewAndSubmit);
        assert!(!wizard.next());
        assert!(wizard.back());
        assert_eq!(wizard.step(), Step::Preferences);
    }

    #[tokio::test]
    async fn oversized_image_never_reaches_uploader() {
        let mut wizard = SetupWizard::new();
        let uploader = CountingUploader::default();

        let err = wizard
            .upload_headshot(&image(6 * 1000 * 1000), &uploader)
            .await
            .unwrap_err();

        assert!(matches!(err, WizardError::Headshot(HeadshotError::TooLarge)));
        assert_eq!(uploader.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            wizard.upload().error.as_deref(),
            Some("Image must be smaller than 5MB")
        );
    }

    #[tokio::test]
    async fn successful_upload_sets_headshot_url() {
        let mut wizard = SetupWizard::new();
        let uploader = CountingUploader::default();
        wizard.upload_headshot(&image(100), &uploader).await.unwrap();

        assert_eq!(
            wizard.draft().headshot_url.as_deref(),
            Some("https://cdn.example/me.png")
        );
        assert_eq!(
            wizard.upload().preview.as_deref(),
            Some("https://cdn.example/me.png")
        );
        assert!(!wizard.upload().uploading);
    }

    #[test]
    fn completion_after_removal_is_ignored() {
        let mut wizard = SetupWizard::new();
        let ticket = wizard.select_headshot(&image(100)).unwrap();
        wizard.remove_headshot();
        let before = wizard.upload().clone();

        wizard.finish_headshot_upload(ticket, Ok("https://cdn.example/late.png".into()));

        assert_eq!(wizard.upload(), &before);
        assert_eq!(wizard.draft().headshot_url, None);
    }

    #[tokio::test]
    async fn faculty_slots_exclude_each_other() {
        let mut wizard = started().await;
        wizard.pick_faculty(0, 1).unwrap();

        let slot0: Vec<u64> = wizard.faculty_options(0).iter().map(|m| m.id).collect();
        let slot1: Vec<u64> = wizard.faculty_options(1).iter().map(|m| m.id).collect();
        assert_eq!(slot0, vec![1, 2]);
        assert_eq!(slot1, vec![2]);
        assert!(matches!(
            wizard.pick_faculty(1, 1),
            Err(WizardError::AlreadyPicked(1))
        ));
    }

    #[tokio::test]
    async fn confirmed_submit_completes_session_and_closes() {
        let session = FakeSession::new();
        let profiles = FakeProfiles::default();
        let mut wizard = SetupWizard::new();
        wizard.start(&session, &profiles).await;
        wizard.pick_faculty(2, 2).unwrap();
        wizard
            .set_visit_dates(0, DateRange::new(Some(date(2025, 6, 1)), Some(date(2025, 6, 3))))
            .unwrap();
        wizard
            .update(|d| d.talk_title = "Sparse Solvers".into())
            .unwrap();

        wizard.request_submit().unwrap();
        wizard.confirm_submit(&profiles, &session).await.unwrap();

        let sent = profiles.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].first_name, "Ada");
        assert_eq!(sent[0].talk_title, "Sparse Solvers");
        assert_eq!(sent[0].preferred_faculty, vec![2]);
        assert_eq!(sent[0].preferred_visit_dates.len(), 1);
        assert_eq!(session.completed.load(Ordering::SeqCst), 1);
        assert_eq!(wizard.phase(), WizardPhase::Completed);
        assert_eq!(wizard.draft(), &ProfileDraft::default());
    }

    #[tokio::test]
    async fn failed_submit_keeps_everything() {
        let session = FakeSession::new();
        let profiles = FakeProfiles {
            fail: true,
            ..Default::default()
        };
        let mut wizard = SetupWizard::new();
        wizard.start(&session, &profiles).await;
        wizard.update(|d| d.biography = "Bio".into()).unwrap();

        wizard.request_submit().unwrap();
        wizard.confirm_submit(&profiles, &session).await.unwrap();

        assert_eq!(wizard.phase(), WizardPhase::Editing);
        assert_eq!(wizard.error(), Some("Failed to complete setup"));
        assert_eq!(wizard.draft().biography, "Bio");
        assert_eq!(session.completed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn confirm_requires_request_first() {
        let mut wizard = SetupWizard::new();
        assert!(wizard.cancel_submit().is_err());
        wizard.request_submit().unwrap();
        assert!(wizard.update(|d| d.biography = "x".into()).is_err());
        wizard.cancel_submit().unwrap();
        assert_eq!(wizard.phase(), WizardPhase::Editing);
    }

    #[test]
    fn close_discards_the_draft() {
        let mut wizard = SetupWizard::with_draft(ProfileDraft {
            talk_title: "T".into(),
            ..Default::default()
        });
        wizard.close();
        assert_eq!(wizard.phase(), WizardPhase::Closed);
        assert_eq!(wizard.draft().talk_title, "");
        assert!(!wizard.next());
    }
}

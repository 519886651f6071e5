//! Form submission controller.
//!
//! A [`FormSession`] owns the answers for one form instance. It fetches the
//! descriptor, seeds an answer per field, validates on submit, waits for an
//! explicit confirmation, and only then hands the payload to the submit
//! collaborator. A session that has submitted (or was opened on a completed
//! submission) is view-only.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::backend::{BackendError, FormSource, SubmissionSink};
use crate::model::{
    AnswerValue, FieldId, FormDescriptor, FormId, SubmissionPayload, SubmissionRecord,
};
use crate::render::{self, EditError, FieldEdit, Mode, RenderedField};
use crate::scope::{Cancelled, TeardownHandle, ViewScope};
use crate::validate::{FieldErrors, validate_form};

pub const SUBMITTED_NOTICE: &str = "Form submitted successfully";

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the descriptor.
    Loading,

    /// The descriptor could not be loaded. Terminal.
    LoadFailed(String),

    /// Accepting edits (or showing a record, when view-only).
    Ready,

    /// Answers passed validation; waiting for the user to confirm.
    ConfirmPending,

    /// The submit collaborator has the payload.
    Submitting,

    /// The submission was accepted. Terminal.
    Submitted,

    /// The view was torn down. Terminal; late results are discarded.
    Disposed,
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::LoadFailed(_) => "load-failed",
            Self::Ready => "ready",
            Self::ConfirmPending => "confirm-pending",
            Self::Submitting => "submitting",
            Self::Submitted => "submitted",
            Self::Disposed => "disposed",
        }
    }
}

/// Outcome of asking to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitAttempt {
    /// Validation failed; nothing was sent.
    Invalid { errors: FieldErrors },

    /// Validation passed; call `confirm_submit` or `cancel_submit`.
    AwaitingConfirmation,
}

/// Misuse of a session. Collaborator failures never surface here.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("form is view-only")]
    ReadOnly,

    #[error("form has no field {0}")]
    UnknownField(FieldId),

    #[error("cannot do that while {0}")]
    WrongPhase(&'static str),

    #[error(transparent)]
    Edit(#[from] EditError),
}

type SubmittedCallback = Box<dyn FnOnce(&SubmissionRecord) + Send>;

/// The controller for one form instance.
pub struct FormSession {
    form_id: FormId,
    phase: Phase,
    form: Option<FormDescriptor>,
    answers: BTreeMap<FieldId, AnswerValue>,
    errors: FieldErrors,
    view_only: bool,
    submission: Option<SubmissionRecord>,
    alert: Option<String>,
    notice: Option<String>,
    on_submitted: Option<SubmittedCallback>,
    scope: ViewScope,
}

impl FormSession {
    /// A session that will fill in `form_id` from scratch.
    pub fn new(form_id: FormId) -> Self {
        Self {
            form_id,
            phase: Phase::Loading,
            form: None,
            answers: BTreeMap::new(),
            errors: FieldErrors::new(),
            view_only: false,
            submission: None,
            alert: None,
            notice: None,
            on_submitted: None,
            scope: ViewScope::new(),
        }
    }

    /// A view-only session replaying an existing submission.
    pub fn view_only(form_id: FormId, submission: SubmissionRecord) -> Self {
        Self {
            view_only: true,
            submission: Some(submission),
            ..Self::new(form_id)
        }
    }

    /// Called once, with the stored record, after a successful submit.
    #[must_use]
    pub fn on_submitted(mut self, callback: impl FnOnce(&SubmissionRecord) + Send + 'static) -> Self {
        self.on_submitted = Some(Box::new(callback));
        self
    }

    pub fn teardown_handle(&self) -> TeardownHandle {
        self.scope.teardown_handle()
    }

    // ── Loading ──

    /// Fetch the descriptor and seed the answers.
    pub async fn load(&mut self, source: &dyn FormSource) {
        if self.is_disposed() {
            return;
        }
        self.phase = Phase::Loading;
        debug!(form = %self.form_id, "loading form");

        let form = match self.scope.run(source.fetch_form(self.form_id)).await {
            Err(Cancelled) => return self.dispose(),
            Ok(Err(BackendError::NotFound)) => {
                warn!(form = %self.form_id, "form not found");
                self.phase = Phase::LoadFailed("Form not found".into());
                return;
            }
            Ok(Err(e)) => {
                warn!(form = %self.form_id, error = %e, "failed to load form");
                self.phase = Phase::LoadFailed("Failed to load form".into());
                return;
            }
            Ok(Ok(form)) => form,
        };

        self.answers = match (&self.submission, self.view_only) {
            (Some(record), true) => record.hydrate(&form),
            _ => form
                .fields
                .iter()
                .map(|f| (f.id.clone(), AnswerValue::default_for(&f.kind)))
                .collect(),
        };
        info!(form = %form.id, fields = form.fields.len(), view_only = self.view_only, "form loaded");
        self.form = Some(form);
        self.phase = Phase::Ready;
    }

    /// Like [`load`](Self::load), but first looks for a completed submission
    /// by the acting user and replays it view-only if there is one.
    ///
    /// Failing to fetch prior submissions is not fatal: the form opens for
    /// editing and the submit collaborator has the final say.
    pub async fn load_with_prior(&mut self, source: &dyn FormSource) {
        if self.is_disposed() {
            return;
        }
        match self.scope.run(source.fetch_submissions(self.form_id)).await {
            Err(Cancelled) => return self.dispose(),
            Ok(Ok(records)) => {
                if let Some(done) = records.into_iter().find(|r| r.is_completed) {
                    debug!(form = %self.form_id, submission = ?done.id, "replaying completed submission");
                    self.view_only = true;
                    self.submission = Some(done);
                }
            }
            Ok(Err(e)) => {
                warn!(form = %self.form_id, error = %e, "could not fetch prior submissions");
            }
        }
        self.load(source).await;
    }

    // ── Editing ──

    /// Apply one edit. Clears that field's validation error.
    pub fn edit(&mut self, field_id: &FieldId, edit: FieldEdit) -> Result<(), SessionError> {
        self.ensure_editable()?;
        let field = self
            .form
            .as_ref()
            .and_then(|f| f.field(field_id))
            .ok_or_else(|| SessionError::UnknownField(field_id.clone()))?;

        let fallback = AnswerValue::default_for(&field.kind);
        let current = self.answers.get(field_id).unwrap_or(&fallback);
        let value = render::apply_edit(field, current, edit)?;
        self.answers.insert(field_id.clone(), value);
        self.errors.remove(field_id);
        Ok(())
    }

    // ── Submitting ──

    /// Validate the answers and, if they pass, wait for confirmation.
    pub fn request_submit(&mut self) -> Result<SubmitAttempt, SessionError> {
        self.ensure_editable()?;
        let fields = self.form.as_ref().map_or(&[][..], |f| &f.fields[..]);
        let errors = validate_form(fields, &self.answers);
        if errors.is_empty() {
            self.errors.clear();
            self.phase = Phase::ConfirmPending;
            debug!(form = %self.form_id, "awaiting confirmation");
            Ok(SubmitAttempt::AwaitingConfirmation)
        } else {
            debug!(form = %self.form_id, invalid = errors.len(), "validation failed");
            self.errors = errors.clone();
            Ok(SubmitAttempt::Invalid { errors })
        }
    }

    /// Back out of the confirmation step.
    pub fn cancel_submit(&mut self) -> Result<(), SessionError> {
        self.expect_phase(&Phase::ConfirmPending)?;
        self.phase = Phase::Ready;
        Ok(())
    }

    /// Send the answers. Only valid after `request_submit` asked for
    /// confirmation.
    ///
    /// On failure the session returns to `Ready` with the answers intact and
    /// an alert describing what went wrong.
    pub async fn confirm_submit(&mut self, sink: &dyn SubmissionSink) -> Result<(), SessionError> {
        self.expect_phase(&Phase::ConfirmPending)?;
        self.phase = Phase::Submitting;
        self.alert = None;

        let payload = SubmissionPayload::completed(self.form_id, &self.answers);
        match self.scope.run(sink.submit(&payload)).await {
            Err(Cancelled) => self.dispose(),
            Ok(Ok(record)) => {
                info!(form = %self.form_id, submission = ?record.id, "form submitted");
                self.phase = Phase::Submitted;
                self.view_only = true;
                self.notice = Some(SUBMITTED_NOTICE.into());
                if let Some(callback) = self.on_submitted.take() {
                    callback(&record);
                }
                self.submission = Some(record);
            }
            Ok(Err(e)) => {
                warn!(form = %self.form_id, error = %e, "submission failed");
                self.alert = Some(
                    e.user_message()
                        .unwrap_or("Failed to submit form")
                        .to_string(),
                );
                self.phase = Phase::Ready;
            }
        }
        Ok(())
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    // ── Reading ──

    pub fn phase(&self) -> Phase {
        if self.is_disposed() {
            Phase::Disposed
        } else {
            self.phase.clone()
        }
    }

    pub fn form(&self) -> Option<&FormDescriptor> {
        self.form.as_ref()
    }

    pub fn answers(&self) -> &BTreeMap<FieldId, AnswerValue> {
        &self.answers
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn is_view_only(&self) -> bool {
        self.view_only
    }

    pub fn submission(&self) -> Option<&SubmissionRecord> {
        self.submission.as_ref()
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Every field rendered in its current state, in descriptor order.
    pub fn rendered(&self) -> Vec<RenderedField> {
        let Some(form) = &self.form else {
            return Vec::new();
        };
        let mode = if self.view_only {
            Mode::ViewOnly
        } else {
            Mode::Edit
        };
        form.fields
            .iter()
            .map(|field| {
                let fallback;
                let value = match self.answers.get(&field.id) {
                    Some(v) => v,
                    None => {
                        fallback = AnswerValue::default_for(&field.kind);
                        &fallback
                    }
                };
                render::render(field, value, self.errors.get(&field.id), mode)
            })
            .collect()
    }

    fn is_disposed(&self) -> bool {
        self.phase == Phase::Disposed || self.scope.is_torn_down()
    }

    fn dispose(&mut self) {
        debug!(form = %self.form_id, "session disposed");
        self.phase = Phase::Disposed;
    }

    fn ensure_editable(&self) -> Result<(), SessionError> {
        if self.view_only {
            return Err(SessionError::ReadOnly);
        }
        self.expect_phase(&Phase::Ready)
    }

    fn expect_phase(&self, want: &Phase) -> Result<(), SessionError> {
        let phase = self.phase();
        if phase == *want {
            Ok(())
        } else {
            Err(SessionError::WrongPhase(phase.name()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::backend;

    struct FakeSource {
        form: Option<FormDescriptor>,
        submissions: Vec<SubmissionRecord>,
        delay: Option<Duration>,
    }

    impl FakeSource {
        fn with(form: serde_json::Value) -> Self {
            Self {
                form: Some(serde_json::from_value(form).unwrap()),
                submissions: Vec::new(),
                delay: None,
            }
        }
    }

    #[async_trait]
    impl FormSource for FakeSource {
        async fn fetch_form(&self, _id: FormId) -> backend::Result<FormDescriptor> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.form.clone().ok_or(BackendError::NotFound)
        }

        async fn fetch_submissions(&self, _form: FormId) -> backend::Result<Vec<SubmissionRecord>> {
            Ok(self.submissions.clone())
        }
    }

    #[derive(Default)]
    struct FakeSink {
        calls: Mutex<Vec<SubmissionPayload>>,
        reject_with: Option<String>,
    }

    #[async_trait]
    impl SubmissionSink for FakeSink {
        async fn submit(&self, payload: &SubmissionPayload) -> backend::Result<SubmissionRecord> {
            self.calls.lock().unwrap().push(payload.clone());
            if let Some(message) = &self.reject_with {
                return Err(BackendError::Rejected {
                    message: message.clone(),
                });
            }
            Ok(SubmissionRecord {
                id: Some(1),
                form: payload.form,
                answers: payload.answers_json(),
                is_completed: true,
                submitted_at: None,
                updated_at: None,
                form_version: Default::default(),
            })
        }
    }

    fn name_form() -> serde_json::Value {
        json!({
            "id": 5,
            "title": "Intake",
            "form_fields": [
                {"id": 101, "type": "text", "label": "First Name", "required": true}
            ]
        })
    }

    async fn ready_session(source: &FakeSource) -> FormSession {
        let mut session = FormSession::new(FormId(5));
        session.load(source).await;
        assert_eq!(session.phase(), Phase::Ready);
        session
    }

    #[tokio::test]
    async fn defaults_match_field_kinds_on_the_wire() {
        let source = FakeSource::with(json!({
            "id": 5,
            "title": "Mixed",
            "form_fields": [
                {"id": 1, "type": "checkbox", "label": "Fruit", "options": [{"label": "Apple"}]},
                {"id": 2, "type": "date_range", "label": "Stay"},
                {"id": 3, "type": "text", "label": "Name"}
            ]
        }));
        let session = ready_session(&source).await;
        let payload = SubmissionPayload::completed(FormId(5), session.answers());
        assert_eq!(
            serde_json::to_value(&payload.answers).unwrap(),
            json!({
                "1": [],
                "2": {"startDate": "", "endDate": ""},
                "3": ""
            })
        );
    }

    #[tokio::test]
    async fn invalid_submit_makes_no_call() {
        let source = FakeSource::with(name_form());
        let sink = FakeSink::default();
        let mut session = ready_session(&source).await;

        let attempt = session.request_submit().unwrap();
        let SubmitAttempt::Invalid { errors } = attempt else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(session.phase(), Phase::Ready);

        // Not confirmable without passing validation.
        assert!(session.confirm_submit(&sink).await.is_err());
        assert!(sink.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fill_confirm_and_submit_end_to_end() {
        let source = FakeSource::with(name_form());
        let sink = FakeSink::default();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);

        let mut session = FormSession::new(FormId(5)).on_submitted(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        session.load(&source).await;
        session
            .edit(&FieldId::from(101), FieldEdit::Text("John".into()))
            .unwrap();

        assert_eq!(
            session.request_submit().unwrap(),
            SubmitAttempt::AwaitingConfirmation
        );
        session.confirm_submit(&sink).await.unwrap();

        let calls = sink.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            serde_json::to_value(&calls[0]).unwrap(),
            json!({"form": 5, "answers": {"101": "John"}, "is_completed": true})
        );
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(session.phase(), Phase::Submitted);
        assert_eq!(session.notice(), Some(SUBMITTED_NOTICE));
        assert!(session.is_view_only());
        assert!(matches!(
            session.edit(&FieldId::from(101), FieldEdit::Text("Jane".into())),
            Err(SessionError::ReadOnly)
        ));
    }

    #[tokio::test]
    async fn edit_clears_that_fields_error() {
        let source = FakeSource::with(name_form());
        let mut session = ready_session(&source).await;

        session.request_submit().unwrap();
        assert!(session.errors().contains_key(&FieldId::from(101)));

        session
            .edit(&FieldId::from(101), FieldEdit::Text("J".into()))
            .unwrap();
        assert!(session.errors().is_empty());
    }

    #[tokio::test]
    async fn cancel_returns_to_editing() {
        let source = FakeSource::with(name_form());
        let mut session = ready_session(&source).await;
        session
            .edit(&FieldId::from(101), FieldEdit::Text("John".into()))
            .unwrap();
        session.request_submit().unwrap();
        session.cancel_submit().unwrap();
        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(
            session.answers()[&FieldId::from(101)],
            AnswerValue::Text("John".into())
        );
    }

    #[tokio::test]
    async fn rejected_submit_keeps_answers_and_alerts() {
        let source = FakeSource::with(name_form());
        let sink = FakeSink {
            reject_with: Some("You have already submitted this form".into()),
            ..Default::default()
        };
        let mut session = ready_session(&source).await;
        session
            .edit(&FieldId::from(101), FieldEdit::Text("John".into()))
            .unwrap();
        session.request_submit().unwrap();
        session.confirm_submit(&sink).await.unwrap();

        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(session.alert(), Some("You have already submitted this form"));
        assert!(!session.is_view_only());
        assert_eq!(
            session.answers()[&FieldId::from(101)],
            AnswerValue::Text("John".into())
        );

        session.dismiss_alert();
        assert_eq!(session.alert(), None);
    }

    #[tokio::test]
    async fn missing_form_fails_to_load() {
        let source = FakeSource {
            form: None,
            submissions: Vec::new(),
            delay: None,
        };
        let mut session = FormSession::new(FormId(404));
        session.load(&source).await;
        assert_eq!(session.phase(), Phase::LoadFailed("Form not found".into()));
    }

    #[tokio::test]
    async fn prior_completed_submission_is_replayed_view_only() {
        let mut source = FakeSource::with(json!({
            "id": 12,
            "title": "Fruit",
            "form_fields": [
                {"id": 1, "type": "checkbox", "label": "Fruit",
                 "options": [{"label": "Apple"}, {"label": "Banana"}, {"label": "Cherry"}]}
            ]
        }));
        source.submissions = vec![
            serde_json::from_value(json!({
                "id": 9, "form": 12, "answers": {"1": ["Apple", "Cherry"]}, "is_completed": true
            }))
            .unwrap(),
        ];

        let mut session = FormSession::new(FormId(12));
        session.load_with_prior(&source).await;

        assert!(session.is_view_only());
        assert_eq!(
            session.answers()[&FieldId::from(1)],
            AnswerValue::Selections(vec!["Apple".into(), "Cherry".into()])
        );
        let rendered = session.rendered();
        assert_eq!(
            rendered[0].control,
            render::Control::Static {
                text: "Apple, Cherry".into()
            }
        );
    }

    #[tokio::test]
    async fn teardown_during_load_disposes_session() {
        let mut source = FakeSource::with(name_form());
        source.delay = Some(Duration::from_secs(5));

        let mut session = FormSession::new(FormId(5));
        let handle = session.teardown_handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.teardown();
        });

        session.load(&source).await;
        assert_eq!(session.phase(), Phase::Disposed);
        assert!(session.form().is_none());
        assert!(session.answers().is_empty());
    }

    #[tokio::test]
    async fn unknown_field_edit_is_rejected() {
        let source = FakeSource::with(name_form());
        let mut session = ready_session(&source).await;
        assert!(matches!(
            session.edit(&FieldId::from(999), FieldEdit::Text("x".into())),
            Err(SessionError::UnknownField(_))
        ));
    }
}

//! Submission records and the payload sent to create them.

use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AnswerValue, FieldId, FormDescriptor, FormId, FormVersion};

/// A persisted set of answers for one form.
///
/// Once `is_completed` is set the record is read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    #[serde(default)]
    pub id: Option<u64>,
    pub form: FormId,
    #[serde(default)]
    pub answers: BTreeMap<String, Value>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub submitted_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    /// Fields the answers are keyed by, when those may since have been
    /// recreated. Empty when `answers` is already keyed by current ids.
    #[serde(default, skip_serializing_if = "FormVersion::is_empty")]
    pub form_version: FormVersion,
}

impl SubmissionRecord {
    /// Typed answers for every field of `form`.
    ///
    /// Stored answers are first re-keyed through the submission's form
    /// snapshot (when it has one); fields without a stored answer get their
    /// kind's default.
    pub fn hydrate(&self, form: &FormDescriptor) -> BTreeMap<FieldId, AnswerValue> {
        let remapped;
        let stored = if self.form_version.is_empty() {
            &self.answers
        } else {
            remapped = self.form_version.remap_answers(form, &self.answers);
            &remapped
        };

        form.fields
            .iter()
            .map(|field| {
                let value = stored.get(field.id.as_str()).map_or_else(
                    || AnswerValue::default_for(&field.kind),
                    |raw| AnswerValue::hydrate(&field.kind, raw),
                );
                (field.id.clone(), value)
            })
            .collect()
    }
}

/// What the submit collaborator receives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionPayload {
    pub form: FormId,
    pub answers: BTreeMap<String, AnswerValue>,
    pub is_completed: bool,
}

impl SubmissionPayload {
    /// Build a completed-submission payload, keying answers by string id.
    pub fn completed(form: FormId, answers: &BTreeMap<FieldId, AnswerValue>) -> Self {
        Self {
            form,
            answers: answers
                .iter()
                .map(|(id, value)| (id.to_string(), value.clone()))
                .collect(),
            is_completed: true,
        }
    }

    /// The payload answers as plain JSON, the shape records store them in.
    pub fn answers_json(&self) -> BTreeMap<String, Value> {
        self.answers
            .iter()
            .map(|(id, value)| {
                let json = serde_json::to_value(value).unwrap_or(Value::Null);
                (id.clone(), json)
            })
            .collect()
    }
}

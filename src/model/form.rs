//! Form descriptors and submission-time snapshots of them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{FieldDescriptor, FieldId};

/// Form identifier as assigned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormId(pub u64);

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A form definition: ordered fields plus presentation metadata.
///
/// Fetched once per session and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDescriptor {
    pub id: FormId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "form_fields", alias = "fields", default)]
    pub fields: Vec<FieldDescriptor>,
}

impl FormDescriptor {
    pub fn field(&self, id: &FieldId) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| &f.id == id)
    }

    /// Snapshot the field metadata for storing alongside a submission.
    pub fn version(&self) -> FormVersion {
        FormVersion {
            fields: self
                .fields
                .iter()
                .map(|f| {
                    (
                        f.id.clone(),
                        FieldSnapshot {
                            kind: f.kind.type_name().to_string(),
                            label: f.label.clone(),
                            required: f.required,
                        },
                    )
                })
                .collect(),
        }
    }
}

/// Field metadata as it was when a submission was saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    pub required: bool,
}

/// The shape of a form at submission time.
///
/// Forms can be edited after people have answered them. Field ids may change
/// when a field is recreated, so stored answers are matched back to current
/// fields by label and type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormVersion {
    #[serde(default)]
    pub fields: BTreeMap<FieldId, FieldSnapshot>,
}

impl FormVersion {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Re-key stored answers onto the current form's field ids.
    ///
    /// Answers whose original field no longer exists (by label and type) are
    /// dropped.
    pub fn remap_answers(
        &self,
        form: &FormDescriptor,
        answers: &BTreeMap<String, Value>,
    ) -> BTreeMap<String, Value> {
        let mut remapped = BTreeMap::new();
        for field in &form.fields {
            let original = self.fields.iter().find(|(_, snap)| {
                snap.label == field.label && snap.kind == field.kind.type_name()
            });
            if let Some((orig_id, _)) = original
                && let Some(answer) = answers.get(orig_id.as_str())
            {
                remapped.insert(field.id.to_string(), answer.clone());
            }
        }
        remapped
    }
}

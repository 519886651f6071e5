//! Client-side validation of a form's answers.
//!
//! Pure and synchronous: works only on descriptors and the in-memory answer
//! map, never on the network.

use std::collections::BTreeMap;

use crate::model::{AnswerValue, FieldDescriptor, FieldId, FieldKind};

/// Which sub-inputs of a field an error applies to.
///
/// Only date ranges have more than one sub-input; every other kind uses
/// `Whole`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidPart {
    Whole,
    Start,
    End,
    Both,
}

impl InvalidPart {
    pub fn start(self) -> bool {
        matches!(self, Self::Whole | Self::Start | Self::Both)
    }

    pub fn end(self) -> bool {
        matches!(self, Self::Whole | Self::End | Self::Both)
    }
}

/// A validation failure on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub message: String,
    pub part: InvalidPart,
}

impl FieldError {
    fn whole(message: String) -> Self {
        Self {
            message,
            part: InvalidPart::Whole,
        }
    }
}

/// Per-field validation failures, keyed by field id.
pub type FieldErrors = BTreeMap<FieldId, FieldError>;

/// Validate every field in order and collect the failures.
///
/// A field with no entry in `answers` is treated as holding its default.
pub fn validate_form(
    fields: &[FieldDescriptor],
    answers: &BTreeMap<FieldId, AnswerValue>,
) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for field in fields {
        let fallback;
        let value = match answers.get(&field.id) {
            Some(v) => v,
            None => {
                fallback = AnswerValue::default_for(&field.kind);
                &fallback
            }
        };
        if let Some(error) = validate_field(field, value) {
            errors.insert(field.id.clone(), error);
        }
    }
    errors
}

/// Validate one field's value.
///
/// Required fields must be non-empty. Date ranges must additionally be
/// complete when required, and must never run backwards.
pub fn validate_field(field: &FieldDescriptor, value: &AnswerValue) -> Option<FieldError> {
    let label = &field.label;

    if field.required && value.is_empty() {
        let part = match field.kind {
            FieldKind::DateRange => InvalidPart::Both,
            _ => InvalidPart::Whole,
        };
        return Some(FieldError {
            message: format!("{label} is required"),
            part,
        });
    }

    if !value.fits(&field.kind) {
        return Some(FieldError::whole(format!(
            "{label} does not hold a {} answer",
            field.kind.type_name()
        )));
    }

    match (&field.kind, value) {
        (FieldKind::DateRange, AnswerValue::DateRange(range)) => {
            if field.required && !range.is_complete() {
                let part = if range.start.is_none() {
                    InvalidPart::Start
                } else {
                    InvalidPart::End
                };
                return Some(FieldError {
                    message: format!("{label} must have both start and end dates"),
                    part,
                });
            }
            range.is_reversed().then(|| FieldError {
                message: format!("{label} start date must be before end date"),
                part: InvalidPart::Both,
            })
        }
        (FieldKind::Select { .. } | FieldKind::Radio { .. }, AnswerValue::Text(choice)) => {
            (!choice.is_empty() && !field.kind.has_option(choice))
                .then(|| FieldError::whole(format!("{label} has an unknown option: {choice}")))
        }
        (FieldKind::Checkbox { .. }, AnswerValue::Selections(picks)) => picks
            .iter()
            .find(|p| !field.kind.has_option(p))
            .map(|p| FieldError::whole(format!("{label} has an unknown option: {p}"))),
        (FieldKind::Text | FieldKind::Textarea, _) | (FieldKind::Date, _) => None,
        // Shapes were checked by `fits` above.
        (FieldKind::DateRange | FieldKind::Select { .. } | FieldKind::Radio { .. }, _)
        | (FieldKind::Checkbox { .. }, _) => None,
    }
}

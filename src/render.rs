//! Field renderer: maps a descriptor and its current value to a renderable
//! unit, and applies edits back onto the value.
//!
//! Stateless. Every function here is a pure mapping, so rendering the same
//! inputs twice yields the same output.

use jiff::civil::Date;

use crate::model::{AnswerValue, DateRange, FieldDescriptor, FieldId, FieldKind, iso_or_empty};
use crate::validate::FieldError;

/// Whether a field accepts input or is shown as a static record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Edit,
    ViewOnly,
}

/// One option of a choice control and whether it is currently chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub label: String,
    pub selected: bool,
}

/// The input control for a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    TextInput { value: String, multiline: bool },
    Dropdown { options: Vec<OptionView> },
    RadioGroup { options: Vec<OptionView> },
    CheckboxGroup { options: Vec<OptionView> },
    DateInput { value: String },
    DateRangeInput {
        start: String,
        end: String,
        start_invalid: bool,
        end_invalid: bool,
    },
    /// View-only rendering: formatted text, no interaction.
    Static { text: String },
}

/// Everything needed to display one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedField {
    pub field_id: FieldId,
    pub label: String,
    pub required: bool,
    pub help_text: Option<String>,
    pub control: Control,
    /// Validation message shown next to the control.
    pub error: Option<String>,
}

/// Render one field.
///
/// A value of the wrong shape for the field renders as the field's empty
/// value; the stored value itself is never touched.
pub fn render(
    field: &FieldDescriptor,
    value: &AnswerValue,
    error: Option<&FieldError>,
    mode: Mode,
) -> RenderedField {
    let fallback;
    let value = if value.fits(&field.kind) {
        value
    } else {
        fallback = AnswerValue::default_for(&field.kind);
        &fallback
    };

    let control = match mode {
        Mode::ViewOnly => Control::Static {
            text: value.display_text(),
        },
        Mode::Edit => edit_control(&field.kind, value, error),
    };

    RenderedField {
        field_id: field.id.clone(),
        label: field.label.clone(),
        required: field.required,
        help_text: field.help_text.clone(),
        control,
        error: error.map(|e| e.message.clone()),
    }
}

fn edit_control(kind: &FieldKind, value: &AnswerValue, error: Option<&FieldError>) -> Control {
    let text = match value {
        AnswerValue::Text(s) => s.as_str(),
        _ => "",
    };

    match kind {
        FieldKind::Text => Control::TextInput {
            value: text.to_string(),
            multiline: false,
        },
        FieldKind::Textarea => Control::TextInput {
            value: text.to_string(),
            multiline: true,
        },
        FieldKind::Select { options } => Control::Dropdown {
            options: option_views(options.iter().map(|o| o.label.as_str()), |l| l == text),
        },
        FieldKind::Radio { options } => Control::RadioGroup {
            options: option_views(options.iter().map(|o| o.label.as_str()), |l| l == text),
        },
        FieldKind::Checkbox { options } => {
            let picked: &[String] = match value {
                AnswerValue::Selections(v) => v,
                _ => &[],
            };
            Control::CheckboxGroup {
                options: option_views(options.iter().map(|o| o.label.as_str()), |l| {
                    picked.iter().any(|p| p == l)
                }),
            }
        }
        FieldKind::Date => {
            let day = match value {
                AnswerValue::Date(d) => *d,
                _ => None,
            };
            Control::DateInput {
                value: iso_or_empty(day),
            }
        }
        FieldKind::DateRange => {
            let range = match value {
                AnswerValue::DateRange(r) => *r,
                _ => DateRange::default(),
            };
            Control::DateRangeInput {
                start: iso_or_empty(range.start),
                end: iso_or_empty(range.end),
                start_invalid: error.is_some_and(|e| e.part.start()),
                end_invalid: error.is_some_and(|e| e.part.end()),
            }
        }
    }
}

fn option_views<'a>(
    labels: impl Iterator<Item = &'a str>,
    selected: impl Fn(&str) -> bool,
) -> Vec<OptionView> {
    labels
        .map(|label| OptionView {
            label: label.to_string(),
            selected: selected(label),
        })
        .collect()
}

/// A user edit to one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    /// Replace the text of a `text` or `textarea` field.
    Text(String),

    /// Pick an option of a `select` or `radio` field by label.
    Choose(String),

    /// Add or remove one label of a `checkbox` field.
    Toggle(String),

    /// Set or clear a `date` field.
    Date(Option<Date>),

    /// Set or clear the start of a `date_range` field.
    RangeStart(Option<Date>),

    /// Set or clear the end of a `date_range` field.
    RangeEnd(Option<Date>),
}

/// Why an edit could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("{field} is a {kind} field and cannot take this kind of input")]
    KindMismatch { field: String, kind: &'static str },

    #[error("{field} has no option {label:?}")]
    UnknownOption { field: String, label: String },
}

/// Apply an edit, producing the field's new value.
///
/// Only the edited part changes: toggling keeps the other selections in
/// order, and setting one side of a date range keeps the other side.
pub fn apply_edit(
    field: &FieldDescriptor,
    current: &AnswerValue,
    edit: FieldEdit,
) -> Result<AnswerValue, EditError> {
    let current = if current.fits(&field.kind) {
        current.clone()
    } else {
        AnswerValue::default_for(&field.kind)
    };

    let mismatch = || EditError::KindMismatch {
        field: field.label.clone(),
        kind: field.kind.type_name(),
    };
    let unknown = |label: &str| EditError::UnknownOption {
        field: field.label.clone(),
        label: label.to_string(),
    };

    match (&field.kind, edit) {
        (FieldKind::Text | FieldKind::Textarea, FieldEdit::Text(s)) => Ok(AnswerValue::Text(s)),
        (FieldKind::Select { .. } | FieldKind::Radio { .. }, FieldEdit::Choose(label)) => {
            // Choosing nothing clears the field.
            if label.is_empty() || field.kind.has_option(&label) {
                Ok(AnswerValue::Text(label))
            } else {
                Err(unknown(&label))
            }
        }
        (FieldKind::Checkbox { .. }, FieldEdit::Toggle(label)) => {
            if !field.kind.has_option(&label) {
                return Err(unknown(&label));
            }
            let AnswerValue::Selections(mut picked) = current else {
                return Err(mismatch());
            };
            if let Some(pos) = picked.iter().position(|p| *p == label) {
                picked.remove(pos);
            } else {
                picked.push(label);
            }
            Ok(AnswerValue::Selections(picked))
        }
        (FieldKind::Date, FieldEdit::Date(day)) => Ok(AnswerValue::Date(day)),
        (FieldKind::DateRange, FieldEdit::RangeStart(start)) => {
            let AnswerValue::DateRange(range) = current else {
                return Err(mismatch());
            };
            Ok(AnswerValue::DateRange(DateRange { start, ..range }))
        }
        (FieldKind::DateRange, FieldEdit::RangeEnd(end)) => {
            let AnswerValue::DateRange(range) = current else {
                return Err(mismatch());
            };
            Ok(AnswerValue::DateRange(DateRange { end, ..range }))
        }
        (
            FieldKind::Text
            | FieldKind::Textarea
            | FieldKind::Select { .. }
            | FieldKind::Radio { .. }
            | FieldKind::Checkbox { .. }
            | FieldKind::Date
            | FieldKind::DateRange,
            _,
        ) => Err(mismatch()),
    }
}

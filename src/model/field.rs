//! Field descriptors: the static definition of one form question.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque field identifier, unique within one form.
///
/// The REST API sends integer primary keys; locally imported forms may use
/// strings. Both decode to the same canonical string key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct FieldId(String);

impl FieldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for FieldId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for FieldId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<FieldId> for String {
    fn from(id: FieldId) -> Self {
        id.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl From<RawId> for FieldId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => Self(n.to_string()),
            RawId::Text(s) => Self(s),
        }
    }
}

/// One selectable option of a choice field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub label: String,
}

/// What kind of input a field is.
///
/// Choice kinds own their options, so a text field with options or a select
/// without them cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Textarea,
    Select { options: Vec<FieldOption> },
    Radio { options: Vec<FieldOption> },
    Checkbox { options: Vec<FieldOption> },
    Date,
    DateRange,
}

impl FieldKind {
    /// The wire name of this kind (`"date_range"`, `"select"`, ...).
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Select { .. } => "select",
            Self::Radio { .. } => "radio",
            Self::Checkbox { .. } => "checkbox",
            Self::Date => "date",
            Self::DateRange => "date_range",
        }
    }

    /// The option list for choice kinds; empty for everything else.
    pub fn options(&self) -> &[FieldOption] {
        match self {
            Self::Select { options } | Self::Radio { options } | Self::Checkbox { options } => {
                options
            }
            Self::Text | Self::Textarea | Self::Date | Self::DateRange => &[],
        }
    }

    /// Whether `label` names one of this field's options.
    pub fn has_option(&self, label: &str) -> bool {
        self.options().iter().any(|o| o.label == label)
    }
}

/// Static definition of one form question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawField", into = "RawField")]
pub struct FieldDescriptor {
    pub id: FieldId,
    pub kind: FieldKind,
    pub label: String,
    pub required: bool,
    pub help_text: Option<String>,
}

/// Why a field descriptor was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    #[error("unknown field type: {0}")]
    UnknownType(String),

    #[error("Options are required for {0} type fields")]
    MissingOptions(&'static str),

    #[error("Options are not allowed for {0} fields")]
    UnexpectedOptions(&'static str),

    #[error("duplicate option label {label:?} in field {field}")]
    DuplicateOption { field: String, label: String },
}

/// The field shape as it travels over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawField {
    pub id: FieldId,
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default)]
    pub options: Vec<FieldOption>,
}

impl TryFrom<RawField> for FieldDescriptor {
    type Error = DescriptorError;

    fn try_from(raw: RawField) -> Result<Self, Self::Error> {
        let options = raw.options;
        let kind = match raw.kind.as_str() {
            "text" => FieldKind::Text,
            "textarea" => FieldKind::Textarea,
            "date" => FieldKind::Date,
            "date_range" => FieldKind::DateRange,
            "select" => FieldKind::Select {
                options: options.clone(),
            },
            "radio" => FieldKind::Radio {
                options: options.clone(),
            },
            "checkbox" => FieldKind::Checkbox {
                options: options.clone(),
            },
            other => return Err(DescriptorError::UnknownType(other.to_string())),
        };

        match &kind {
            FieldKind::Select { options }
            | FieldKind::Radio { options }
            | FieldKind::Checkbox { options } => {
                if options.is_empty() {
                    return Err(DescriptorError::MissingOptions(kind.type_name()));
                }
                let mut seen = HashSet::new();
                for option in options {
                    if !seen.insert(option.label.as_str()) {
                        return Err(DescriptorError::DuplicateOption {
                            field: raw.label.clone(),
                            label: option.label.clone(),
                        });
                    }
                }
            }
            FieldKind::Text | FieldKind::Textarea | FieldKind::Date | FieldKind::DateRange => {
                // The API serializes `options: []` for every field.
                if !options.is_empty() {
                    return Err(DescriptorError::UnexpectedOptions(kind.type_name()));
                }
            }
        }

        Ok(Self {
            id: raw.id,
            kind,
            label: raw.label,
            required: raw.required,
            help_text: raw.help_text.filter(|h| !h.trim().is_empty()),
        })
    }
}

impl From<FieldDescriptor> for RawField {
    fn from(field: FieldDescriptor) -> Self {
        Self {
            id: field.id,
            kind: field.kind.type_name().to_string(),
            options: field.kind.options().to_vec(),
            label: field.label,
            required: field.required,
            help_text: field.help_text,
            order: None,
        }
    }
}

//! Answer values: what a form currently holds for one field.

use jiff::civil::Date;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

use super::FieldKind;

/// A start/end pair of calendar dates. Either side may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<Date>,
    pub end: Option<Date>,
}

impl DateRange {
    pub fn new(start: Option<Date>, end: Option<Date>) -> Self {
        Self { start, end }
    }

    /// Both sides present.
    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// Neither side present.
    pub fn is_blank(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Both sides present and the start falls after the end.
    pub fn is_reversed(&self) -> bool {
        matches!((self.start, self.end), (Some(s), Some(e)) if s > e)
    }
}

impl Serialize for DateRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("startDate", &iso_or_empty(self.start))?;
        map.serialize_entry("endDate", &iso_or_empty(self.end))?;
        map.end()
    }
}

/// The value held for one field. The variant always matches the field kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerValue {
    /// `text`, `textarea`, `select` and `radio`.
    Text(String),

    /// `checkbox`: selected option labels in insertion order.
    Selections(Vec<String>),

    /// `date`.
    Date(Option<Date>),

    /// `date_range`.
    DateRange(DateRange),
}

impl AnswerValue {
    /// The empty value for a field kind.
    pub fn default_for(kind: &FieldKind) -> Self {
        match kind {
            FieldKind::Text
            | FieldKind::Textarea
            | FieldKind::Select { .. }
            | FieldKind::Radio { .. } => Self::Text(String::new()),
            FieldKind::Checkbox { .. } => Self::Selections(Vec::new()),
            FieldKind::Date => Self::Date(None),
            FieldKind::DateRange => Self::DateRange(DateRange::default()),
        }
    }

    /// Whether this value has the shape `kind` expects.
    pub fn fits(&self, kind: &FieldKind) -> bool {
        matches!(
            (self, kind),
            (
                Self::Text(_),
                FieldKind::Text
                    | FieldKind::Textarea
                    | FieldKind::Select { .. }
                    | FieldKind::Radio { .. }
            ) | (Self::Selections(_), FieldKind::Checkbox { .. })
                | (Self::Date(_), FieldKind::Date)
                | (Self::DateRange(_), FieldKind::DateRange)
        )
    }

    /// Nothing entered: empty string, no selections, no date, or a range
    /// with neither side set.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::Selections(v) => v.is_empty(),
            Self::Date(d) => d.is_none(),
            Self::DateRange(r) => r.is_blank(),
        }
    }

    /// Decode a stored JSON answer, directed by the field kind.
    ///
    /// Never fails: partial or malformed values degrade to the closest
    /// well-formed value, falling back to the kind's default.
    pub fn hydrate(kind: &FieldKind, value: &Value) -> Self {
        match kind {
            FieldKind::Text
            | FieldKind::Textarea
            | FieldKind::Select { .. }
            | FieldKind::Radio { .. } => match value {
                Value::String(s) => Self::Text(s.clone()),
                Value::Number(n) => Self::Text(n.to_string()),
                Value::Bool(b) => Self::Text(b.to_string()),
                _ => Self::default_for(kind),
            },
            FieldKind::Checkbox { .. } => match value {
                Value::Array(items) => Self::Selections(
                    items
                        .iter()
                        .filter_map(|item| item.as_str().map(String::from))
                        .collect(),
                ),
                _ => Self::default_for(kind),
            },
            FieldKind::Date => Self::Date(parse_stored_date(value.as_str())),
            FieldKind::DateRange => match value {
                Value::Object(map) => Self::DateRange(DateRange {
                    start: parse_stored_date(map.get("startDate").and_then(Value::as_str)),
                    end: parse_stored_date(map.get("endDate").and_then(Value::as_str)),
                }),
                _ => Self::default_for(kind),
            },
        }
    }

    /// Static text for view-only display.
    ///
    /// Checkbox selections are joined with `", "`, dates use the long
    /// calendar form (`June 10, 2025`).
    pub fn display_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Selections(v) => v.join(", "),
            Self::Date(d) => d.map(long_date).unwrap_or_default(),
            Self::DateRange(r) => match (r.start, r.end) {
                (Some(s), Some(e)) => format!("{} – {}", long_date(s), long_date(e)),
                (Some(s), None) => long_date(s),
                (None, Some(e)) => long_date(e),
                (None, None) => String::new(),
            },
        }
    }
}

impl Serialize for AnswerValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Selections(v) => v.serialize(serializer),
            Self::Date(d) => serializer.serialize_str(&iso_or_empty(*d)),
            Self::DateRange(r) => r.serialize(serializer),
        }
    }
}

/// `YYYY-MM-DD`, or `""` when missing.
pub fn iso_or_empty(date: Option<Date>) -> String {
    date.map(|d| d.to_string()).unwrap_or_default()
}

/// `June 10, 2025`.
pub fn long_date(date: Date) -> String {
    format!("{} {}, {}", date.strftime("%B"), date.day(), date.year())
}

fn parse_stored_date(raw: Option<&str>) -> Option<Date> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    // Some stored values carry a time component; only the calendar date matters.
    let day = raw.get(..10).unwrap_or(raw);
    match day.parse::<Date>() {
        Ok(date) => Some(date),
        Err(e) => {
            warn!(value = raw, error = %e, "ignoring unparseable stored date");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil::date;
    use serde_json::json;

    use crate::model::FieldOption;

    fn checkbox() -> FieldKind {
        FieldKind::Checkbox {
            options: ["Apple", "Banana", "Cherry"]
                .into_iter()
                .map(|l| FieldOption { label: l.into() })
                .collect(),
        }
    }

    #[test]
    fn defaults_serialize_to_wire_conventions() {
        let defaults: Vec<Value> = [checkbox(), FieldKind::DateRange, FieldKind::Text]
            .iter()
            .map(|k| serde_json::to_value(AnswerValue::default_for(k)).unwrap())
            .collect();
        assert_eq!(
            defaults,
            vec![json!([]), json!({"startDate": "", "endDate": ""}), json!("")]
        );
    }

    #[test]
    fn every_default_fits_its_kind_and_is_empty() {
        for kind in [
            FieldKind::Text,
            FieldKind::Textarea,
            checkbox(),
            FieldKind::Date,
            FieldKind::DateRange,
        ] {
            let value = AnswerValue::default_for(&kind);
            assert!(value.fits(&kind), "{kind:?}");
            assert!(value.is_empty(), "{kind:?}");
        }
    }

    #[test]
    fn hydrates_checkbox_without_reordering() {
        let value = AnswerValue::hydrate(&checkbox(), &json!(["Cherry", "Apple", "Apple"]));
        assert_eq!(
            value,
            AnswerValue::Selections(vec!["Cherry".into(), "Apple".into(), "Apple".into()])
        );
    }

    #[test]
    fn hydrates_partial_date_range() {
        let value = AnswerValue::hydrate(&FieldKind::DateRange, &json!({"startDate": "2025-06-10"}));
        assert_eq!(
            value,
            AnswerValue::DateRange(DateRange::new(Some(date(2025, 6, 10)), None))
        );

        let nulls = AnswerValue::hydrate(
            &FieldKind::DateRange,
            &json!({"startDate": null, "endDate": null}),
        );
        assert!(nulls.is_empty());
    }

    #[test]
    fn hydrate_wrong_shape_falls_back_to_default() {
        assert_eq!(
            AnswerValue::hydrate(&checkbox(), &json!("Apple")),
            AnswerValue::Selections(vec![])
        );
        assert_eq!(
            AnswerValue::hydrate(&FieldKind::Date, &json!("not a date")),
            AnswerValue::Date(None)
        );
        assert_eq!(
            AnswerValue::hydrate(&FieldKind::Date, &json!("2025-06-10T00:00:00Z")),
            AnswerValue::Date(Some(date(2025, 6, 10)))
        );
    }

    #[test]
    fn display_text_per_kind() {
        let checks = AnswerValue::Selections(vec!["A".into(), "C".into()]);
        assert_eq!(checks.display_text(), "A, C");

        let day = AnswerValue::Date(Some(date(2025, 6, 10)));
        assert_eq!(day.display_text(), "June 10, 2025");

        let range = AnswerValue::DateRange(DateRange::new(
            Some(date(2025, 6, 5)),
            Some(date(2025, 6, 10)),
        ));
        assert_eq!(range.display_text(), "June 5, 2025 – June 10, 2025");
    }

    #[test]
    fn reversed_range_detection() {
        let reversed = DateRange::new(Some(date(2025, 6, 10)), Some(date(2025, 6, 5)));
        assert!(reversed.is_reversed());
        assert!(!DateRange::new(Some(date(2025, 6, 10)), None).is_reversed());
    }
}

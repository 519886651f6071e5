//! Parsing `--answer FIELD=VALUE` and `--visit START..END` arguments.

use jiff::civil::Date;

use crate::model::{DateRange, FieldDescriptor, FieldKind, FormDescriptor};
use crate::render::FieldEdit;

/// Split `FIELD=VALUE` at the first `=`.
pub(super) fn split_assignment(arg: &str) -> Result<(&str, &str), String> {
    let (field, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got {arg:?}"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in {arg:?}"));
    }
    Ok((field, value.trim()))
}

/// Find a field by id, or by label ignoring case.
pub(super) fn resolve_field<'a>(
    form: &'a FormDescriptor,
    key: &str,
) -> Result<&'a FieldDescriptor, String> {
    form.fields
        .iter()
        .find(|f| f.id.as_str() == key)
        .or_else(|| form.fields.iter().find(|f| f.label.eq_ignore_ascii_case(key)))
        .ok_or_else(|| format!("form {} has no field {key:?}", form.id))
}

/// The edits that set `field` to `value` on a blank form.
///
/// Checkbox values are comma-separated labels; dates are `YYYY-MM-DD`;
/// ranges are `START..END` with either side optional.
pub(super) fn edits_for(field: &FieldDescriptor, value: &str) -> Result<Vec<FieldEdit>, String> {
    let edits = match &field.kind {
        FieldKind::Text | FieldKind::Textarea => vec![FieldEdit::Text(value.to_string())],
        FieldKind::Select { .. } | FieldKind::Radio { .. } => {
            vec![FieldEdit::Choose(value.to_string())]
        }
        FieldKind::Checkbox { .. } => {
            let mut labels: Vec<&str> = Vec::new();
            for label in value.split(',').map(str::trim).filter(|l| !l.is_empty()) {
                if !labels.contains(&label) {
                    labels.push(label);
                }
            }
            labels
                .into_iter()
                .map(|l| FieldEdit::Toggle(l.to_string()))
                .collect()
        }
        FieldKind::Date => vec![FieldEdit::Date(parse_date(value)?)],
        FieldKind::DateRange => {
            let range = parse_range(value)?;
            vec![
                FieldEdit::RangeStart(range.start),
                FieldEdit::RangeEnd(range.end),
            ]
        }
    };
    Ok(edits)
}

/// `YYYY-MM-DD`, or nothing for an empty string.
pub(super) fn parse_date(s: &str) -> Result<Option<Date>, String> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    s.parse::<Date>()
        .map(Some)
        .map_err(|e| format!("invalid date {s:?} (expected YYYY-MM-DD): {e}"))
}

/// `START..END`, either side optional.
pub(super) fn parse_range(s: &str) -> Result<DateRange, String> {
    let (start, end) = s
        .split_once("..")
        .ok_or_else(|| format!("expected START..END, got {s:?}"))?;
    Ok(DateRange::new(parse_date(start)?, parse_date(end)?))
}

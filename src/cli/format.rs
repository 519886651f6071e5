//! Output formatting for CLI display.

use crate::model::{FacultyMember, FormDescriptor, ProfilePayload, long_date};
use crate::render::{Control, OptionView, RenderedField};
use crate::wizard::Step;

/// Format a form header: title, description, and whether it is read-only.
pub(super) fn format_form_header(form: &FormDescriptor, view_only: bool) -> String {
    let mut out = format!("{}  (form {})", form.title, form.id);
    if view_only {
        out.push_str("  [submitted]");
    }
    if !form.description.is_empty() {
        out.push('\n');
        out.push_str(&form.description);
    }
    out
}

/// Format one rendered field as an indented block.
pub(super) fn format_field(field: &RenderedField) -> String {
    let marker = if field.required { " *" } else { "" };
    let mut out = format!("{}{marker}  [{}]\n", field.label, field.field_id);
    if let Some(help) = &field.help_text {
        out.push_str(&format!("  {help}\n"));
    }
    out.push_str(&format_control(&field.control));
    if let Some(error) = &field.error {
        out.push_str(&format!("  ! {error}\n"));
    }
    out
}

fn format_control(control: &Control) -> String {
    match control {
        Control::TextInput { value, multiline } => {
            if value.is_empty() {
                "  > \n".to_string()
            } else if *multiline {
                value.lines().map(|l| format!("  > {l}\n")).collect()
            } else {
                format!("  > {value}\n")
            }
        }
        Control::Dropdown { options } | Control::RadioGroup { options } => {
            format!("  {}\n", format_options(options, "( )", "(•)"))
        }
        Control::CheckboxGroup { options } => {
            format!("  {}\n", format_options(options, "[ ]", "[x]"))
        }
        Control::DateInput { value } => format!("  > {}\n", blank_date(value)),
        Control::DateRangeInput {
            start,
            end,
            start_invalid,
            end_invalid,
        } => format!(
            "  > {}{} .. {}{}\n",
            blank_date(start),
            if *start_invalid { " !" } else { "" },
            blank_date(end),
            if *end_invalid { " !" } else { "" },
        ),
        Control::Static { text } => {
            if text.is_empty() {
                "  (no answer)\n".to_string()
            } else {
                format!("  {text}\n")
            }
        }
    }
}

fn format_options(options: &[OptionView], off: &str, on: &str) -> String {
    options
        .iter()
        .map(|o| format!("{} {}", if o.selected { on } else { off }, o.label))
        .collect::<Vec<_>>()
        .join("  ")
}

fn blank_date(value: &str) -> &str {
    if value.is_empty() { "____-__-__" } else { value }
}

/// Format a faculty member as a single listing line.
pub(super) fn format_faculty(member: &FacultyMember) -> String {
    let room = member
        .room_number
        .as_deref()
        .map(|r| format!("  room {r}"))
        .unwrap_or_default();
    format!(
        "{:>4}  {}  <{}>{room}",
        member.id,
        member.display_name(),
        member.email
    )
}

/// Format the missing entries of one wizard step.
pub(super) fn format_step_issues(step: Step, issues: &[String]) -> String {
    let mut out = format!("{}. {}:", step.index() + 1, step.title());
    for issue in issues {
        out.push_str(&format!("\n  - {issue}"));
    }
    out
}

/// Format the profile about to be sent, grouped by wizard step.
pub(super) fn format_review(profile: &ProfilePayload, faculty: &[FacultyMember]) -> String {
    let mut out = String::new();
    let mut section = |step: Step, rows: &[(&str, String)]| {
        out.push_str(step.title());
        out.push('\n');
        for (label, value) in rows {
            let value = if value.is_empty() { "-" } else { value.as_str() };
            out.push_str(&format!("  {label:<24} {value}\n"));
        }
    };

    section(
        Step::PersonalInformation,
        &[
            ("Name", format!("{} {}", profile.first_name, profile.last_name)),
            ("Current title", profile.current_title.clone()),
            ("Department", profile.current_department.clone()),
            ("Institution", profile.current_institution.clone()),
            ("Research interests", profile.research_interests.clone()),
            ("Cell number", profile.cell_number.clone()),
        ],
    );

    let gender = match (&profile.gender, &profile.gender_custom) {
        (_, Some(custom)) => custom.clone(),
        (Some(g), None) => wire_name(g),
        (None, None) => String::new(),
    };
    let visits = profile
        .preferred_visit_dates
        .iter()
        .map(|v| format!("{}..{}", v.start_date, v.end_date))
        .collect::<Vec<_>>()
        .join(", ");
    section(
        Step::TravelDetails,
        &[
            (
                "Travel assistance",
                profile.travel_assistance.as_ref().map(wire_name).unwrap_or_default(),
            ),
            ("Passport name", profile.passport_name.clone()),
            (
                "Date of birth",
                profile
                    .date_of_birth
                    .as_deref()
                    .map(|d| d.parse().map_or_else(|_| d.to_string(), long_date))
                    .unwrap_or_default(),
            ),
            ("Country of residence", profile.country_of_residence.clone()),
            ("Gender", gender),
            ("Preferred airport", profile.preferred_airport.clone()),
            ("Frequent flyer", profile.frequent_flyer_info.clone()),
            ("Known traveler number", profile.known_traveler_number.clone()),
            ("Visit dates", visits),
        ],
    );

    section(
        Step::TalkInformation,
        &[
            ("Talk title", profile.talk_title.clone()),
            ("Abstract", profile.talk_abstract.clone()),
            ("Biography", profile.biography.clone()),
            ("Headshot", profile.headshot_url.clone().unwrap_or_default()),
        ],
    );

    let names = profile
        .preferred_faculty
        .iter()
        .map(|id| {
            faculty
                .iter()
                .find(|m| m.id == *id)
                .map_or_else(|| format!("#{id}"), FacultyMember::display_name)
        })
        .collect::<Vec<_>>()
        .join(", ");
    section(
        Step::Preferences,
        &[
            ("Videotape talk", wire_name(&profile.videotape_permission)),
            ("Advertise talk", wire_name(&profile.advertisement_permission)),
            ("Extra tours", wire_name(&profile.extra_tours)),
            ("Food preferences", profile.food_preferences.join(", ")),
            ("Dietary restrictions", profile.dietary_restrictions.join(", ")),
            ("Faculty to meet", names),
        ],
    );

    out
}

/// The serialized name of a unit enum variant.
fn wire_name<T: serde::Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}

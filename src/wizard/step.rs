//! Wizard steps and the advisory per-step checks.

use crate::model::{Gender, ProfileDraft};

/// The five fixed steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    PersonalInformation,
    TravelDetails,
    TalkInformation,
    Preferences,
    ReviewAndSubmit,
}

impl Step {
    pub const ALL: [Self; 5] = [
        Self::PersonalInformation,
        Self::TravelDetails,
        Self::TalkInformation,
        Self::Preferences,
        Self::ReviewAndSubmit,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::PersonalInformation => "Personal Information",
            Self::TravelDetails => "Travel Details",
            Self::TalkInformation => "Talk Information",
            Self::Preferences => "Preferences",
            Self::ReviewAndSubmit => "Review & Submit",
        }
    }

    /// Zero-based position.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn prev(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }
}

/// Missing required entries on one step, as display messages.
///
/// The review step reports everything missing anywhere.
pub fn issues(step: Step, draft: &ProfileDraft) -> Vec<String> {
    let mut missing = Vec::new();
    let mut need = |present: bool, label: &str| {
        if !present {
            missing.push(format!("{label} is required"));
        }
    };
    let text = |s: &str| !s.trim().is_empty();

    match step {
        Step::PersonalInformation => {
            need(text(&draft.first_name), "First name");
            need(text(&draft.last_name), "Last name");
            need(text(&draft.current_title), "Current title");
            need(text(&draft.current_department), "Current department");
            need(text(&draft.current_institution), "Current institution");
            need(text(&draft.research_interests), "Research interests");
            need(text(&draft.cell_number), "Cell number");
        }
        Step::TravelDetails => {
            need(draft.travel_assistance.is_some(), "Travel assistance");
            need(text(&draft.passport_name), "Name as it appears on passport");
            need(draft.date_of_birth.is_some(), "Date of birth");
            need(text(&draft.country_of_residence), "Country of residence");
            need(draft.gender.is_some(), "Gender");
            if draft.gender == Some(Gender::Other) {
                need(text(&draft.gender_custom), "Gender description");
            }
            need(text(&draft.preferred_airport), "Preferred airport");
        }
        Step::TalkInformation => {
            need(text(&draft.talk_title), "Talk title");
            need(text(&draft.talk_abstract), "Abstract");
            need(text(&draft.biography), "Biography");
        }
        Step::Preferences => {}
        Step::ReviewAndSubmit => {
            return Step::ALL[..step.index()]
                .iter()
                .flat_map(|s| issues(*s, draft))
                .collect();
        }
    }
    missing
}

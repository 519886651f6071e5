//! Candidate profile types collected by the setup wizard.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::DateRange;

/// The signed-in user, as far as the setup wizard cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: u64,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub has_completed_setup: bool,
}

/// A faculty member a candidate can ask to meet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyMember {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub room_number: Option<String>,
}

impl FacultyMember {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelAssistance {
    /// Needs help with all travel arrangements.
    All,
    /// Needs help with some travel arrangements.
    Some,
    /// Books everything and submits for reimbursement.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    PreferNotToSay,
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Yes,
    #[default]
    No,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtraTours {
    #[serde(rename = "Campus Tour")]
    CampusTour,
    #[serde(rename = "Community Tour w/Realtor")]
    CommunityTour,
    #[default]
    #[serde(rename = "Not at this time")]
    NotAtThisTime,
}

/// Number of faculty preference slots.
pub const FACULTY_SLOTS: usize = 4;

/// Number of preferred visit date ranges.
pub const VISIT_DATE_SLOTS: usize = 3;

/// Everything the setup wizard collects, edited in place across steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileDraft {
    // Personal information.
    pub first_name: String,
    pub last_name: String,
    pub current_title: String,
    pub current_department: String,
    pub current_institution: String,
    pub research_interests: String,
    pub cell_number: String,

    // Travel details.
    pub travel_assistance: Option<TravelAssistance>,
    pub passport_name: String,
    pub date_of_birth: Option<Date>,
    pub country_of_residence: String,
    pub gender: Option<Gender>,
    pub gender_custom: String,
    pub preferred_airport: String,
    pub frequent_flyer_info: String,
    pub known_traveler_number: String,
    #[serde(skip)]
    pub preferred_visit_dates: [DateRange; VISIT_DATE_SLOTS],

    // Talk information.
    pub talk_title: String,
    #[serde(rename = "abstract")]
    pub talk_abstract: String,
    pub biography: String,
    pub headshot_url: Option<String>,

    // Preferences.
    pub videotape_permission: Permission,
    pub advertisement_permission: Permission,
    pub extra_tours: ExtraTours,
    pub food_preferences: Vec<String>,
    pub dietary_restrictions: Vec<String>,
}

/// A preferred visit window on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitDates {
    #[serde(rename = "startDate")]
    pub start_date: String,
    #[serde(rename = "endDate")]
    pub end_date: String,
}

/// What the profile-completion collaborator receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePayload {
    pub first_name: String,
    pub last_name: String,
    pub current_title: String,
    pub current_department: String,
    pub current_institution: String,
    pub research_interests: String,
    pub cell_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_assistance: Option<TravelAssistance>,
    pub passport_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    pub country_of_residence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender_custom: Option<String>,
    pub preferred_airport: String,
    pub frequent_flyer_info: String,
    pub known_traveler_number: String,
    pub talk_title: String,
    #[serde(rename = "abstract")]
    pub talk_abstract: String,
    pub biography: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headshot_url: Option<String>,
    pub videotape_permission: Permission,
    pub advertisement_permission: Permission,
    pub extra_tours: ExtraTours,
    pub food_preferences: Vec<String>,
    pub dietary_restrictions: Vec<String>,
    pub preferred_faculty: Vec<u64>,
    pub preferred_visit_dates: Vec<VisitDates>,
}

//! Formats the collected draft for the profile-completion collaborator.

use crate::model::{Gender, ProfileDraft, ProfilePayload, VisitDates, iso_or_empty};

use super::FacultyPicks;

/// Build the payload: dates as `YYYY-MM-DD`, only complete visit ranges,
/// only filled faculty slots.
pub fn build(draft: &ProfileDraft, picks: &FacultyPicks) -> ProfilePayload {
    let preferred_visit_dates = draft
        .preferred_visit_dates
        .iter()
        .filter(|r| r.is_complete())
        .map(|r| VisitDates {
            start_date: iso_or_empty(r.start),
            end_date: iso_or_empty(r.end),
        })
        .collect();

    let gender_custom = (draft.gender == Some(Gender::Other))
        .then(|| draft.gender_custom.trim().to_string())
        .filter(|s| !s.is_empty());

    ProfilePayload {
        first_name: draft.first_name.clone(),
        last_name: draft.last_name.clone(),
        current_title: draft.current_title.clone(),
        current_department: draft.current_department.clone(),
        current_institution: draft.current_institution.clone(),
        research_interests: draft.research_interests.clone(),
        cell_number: draft.cell_number.clone(),
        travel_assistance: draft.travel_assistance,
        passport_name: draft.passport_name.clone(),
        date_of_birth: draft.date_of_birth.map(|d| iso_or_empty(Some(d))),
        country_of_residence: draft.country_of_residence.clone(),
        gender: draft.gender,
        gender_custom,
        preferred_airport: draft.preferred_airport.clone(),
        frequent_flyer_info: draft.frequent_flyer_info.clone(),
        known_traveler_number: draft.known_traveler_number.clone(),
        talk_title: draft.talk_title.clone(),
        talk_abstract: draft.talk_abstract.clone(),
        biography: draft.biography.clone(),
        headshot_url: draft.headshot_url.clone(),
        videotape_permission: draft.videotape_permission,
        advertisement_permission: draft.advertisement_permission,
        extra_tours: draft.extra_tours,
        food_preferences: draft.food_preferences.clone(),
        dietary_restrictions: draft.dietary_restrictions.clone(),
        preferred_faculty: picks.ids(),
        preferred_visit_dates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil::date;
    use serde_json::json;

    use crate::model::{DateRange, FacultyMember};

    #[test]
    fn drops_incomplete_ranges_and_empty_slots() {
        let mut draft = ProfileDraft {
            date_of_birth: Some(date(1990, 4, 1)),
            gender: Some(Gender::Male),
            gender_custom: "ignored".into(),
            ..Default::default()
        };
        draft.preferred_visit_dates = [
            DateRange::new(Some(date(2025, 6, 1)), Some(date(2025, 6, 5))),
            DateRange::new(Some(date(2025, 7, 1)), None),
            DateRange::default(),
        ];
        let pool = vec![FacultyMember {
            id: 8,
            first_name: "Ada".into(),
            last_name: "L".into(),
            email: String::new(),
            room_number: None,
        }];
        let mut picks = FacultyPicks::default();
        picks.pick(1, 8, &pool).unwrap();

        let payload = build(&draft, &picks);
        let wire = serde_json::to_value(&payload).unwrap();

        assert_eq!(wire["date_of_birth"], json!("1990-04-01"));
        assert_eq!(
            wire["preferred_visit_dates"],
            json!([{"startDate": "2025-06-01", "endDate": "2025-06-05"}])
        );
        assert_eq!(wire["preferred_faculty"], json!([8]));
        assert!(wire.get("gender_custom").is_none());
        assert_eq!(wire["extra_tours"], json!("Not at this time"));
    }

    #[test]
    fn custom_gender_only_with_other() {
        let draft = ProfileDraft {
            gender: Some(Gender::Other),
            gender_custom: " Nonbinary ".into(),
            ..Default::default()
        };
        let payload = build(&draft, &FacultyPicks::default());
        assert_eq!(payload.gender_custom.as_deref(), Some("Nonbinary"));
    }
}

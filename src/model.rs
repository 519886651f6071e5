//! Core data model for intake.
//!
//! Form descriptors, typed answers, submission records, and the candidate
//! profile collected by the setup wizard.

mod answer;
mod field;
mod form;
mod profile;
mod submission;

pub use answer::{AnswerValue, DateRange, iso_or_empty, long_date};
pub use field::{DescriptorError, FieldDescriptor, FieldId, FieldKind, FieldOption};
pub use form::{FieldSnapshot, FormDescriptor, FormId, FormVersion};
pub use profile::{
    CurrentUser, ExtraTours, FACULTY_SLOTS, FacultyMember, Gender, Permission, ProfileDraft,
    ProfilePayload, TravelAssistance, VISIT_DATE_SLOTS, VisitDates,
};
pub use submission::{SubmissionPayload, SubmissionRecord};

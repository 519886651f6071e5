//! Intake: a dynamic form engine and candidate setup wizard for
//! recruiting-visit intake.
//!
//! Forms are described at runtime ([`model::FormDescriptor`]), rendered
//! field by field ([`render`]), validated ([`validate`]), and submitted
//! through a [`submission::FormSession`]. The multi-step candidate profile
//! flow lives in [`wizard`]. Both talk to the outside world only through
//! the collaborator traits in [`backend`], implemented by the REST client
//! and by local [`storage`].

pub mod backend;
pub mod cli;
pub mod config;
pub mod identity;
pub mod model;
pub mod render;
pub mod scope;
pub mod storage;
pub mod submission;
pub mod validate;
pub mod wizard;

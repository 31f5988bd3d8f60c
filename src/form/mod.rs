//! Aggregate form state, one record per page.
//!
//! Aggregates are created empty for create flows, hydrated from the entity
//! fetch for edit flows, and mutated only through targeted patches. Repeated
//! sub-entities live in [`TrackedList`]s keyed by entry id, never position.

mod event_form;
mod incident;
mod project;
mod tracked;

pub use event_form::{EventForm, EventPatch, Reminder, ReminderUnit, Shared};
pub use incident::{
    ActionItem, IncidentForm, IncidentPatch, InjuredPerson, Investigator, PropertyDamage,
    RootCause,
};
pub use project::{Address, ProjectForm, ProjectPatch};
pub use tracked::{EntryId, RemoveOutcome, Tracked, TrackedList};

use serde::{Deserialize, Serialize};

/// The aggregate owned by the current page, if any.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum FormState {
    #[default]
    None,
    Incident(Box<IncidentForm>),
    Event(Box<EventForm>),
    Project(Box<ProjectForm>),
}

impl FormState {
    /// Gate for advancing past `step`. Returns the user-facing message of
    /// the first unmet requirement.
    pub fn validate_step(&self, step: usize) -> Result<(), String> {
        match self {
            Self::None => Ok(()),
            Self::Incident(form) => form.validate_step(step),
            Self::Event(form) => form.validate_step(step),
            Self::Project(form) => form.validate_step(step),
        }
    }
}

use serde::{Deserialize, Serialize};

use super::tracked::{EntryId, RemoveOutcome, TrackedList};

/// Audience of a community event; serialized to the backend's 0/1 flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Shared {
    #[default]
    All,
    SelectedGroups,
}

impl Shared {
    #[must_use]
    pub const fn backend_value(self) -> u8 {
        match self {
            Self::All => 0,
            Self::SelectedGroups => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderUnit {
    Days,
    Hours,
    Minutes,
    Weeks,
}

impl ReminderUnit {
    /// Submission key for the unit-specific reminder attribute.
    #[must_use]
    pub const fn attribute(self) -> &'static str {
        match self {
            Self::Days => "days",
            Self::Hours => "hours",
            Self::Minutes => "minutes",
            Self::Weeks => "weeks",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub value: u32,
    pub unit: ReminderUnit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventForm {
    pub event_name: String,
    pub description: String,
    pub venue: String,
    pub start_at: String,
    pub end_at: String,
    pub shared: Shared,
    pub group_ids: Vec<String>,
    pub rsvp_enabled: bool,
    pub reminders: TrackedList<Reminder>,
    /// Set when the user cleared a previously persisted cover image without
    /// replacing it; the submit payload carries an explicit removal marker.
    pub cover_image_cleared: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventPatch {
    Name(String),
    Description(String),
    Venue(String),
    StartAt(String),
    EndAt(String),
    Shared(Shared),
    GroupIds(Vec<String>),
    RsvpEnabled(bool),
    CoverImageCleared(bool),
    ReminderAdded { value: u32, unit: ReminderUnit },
    ReminderRemoved { id: EntryId },
}

impl EventForm {
    /// Apply a targeted field change. Rejections leave the form untouched.
    pub fn apply(&mut self, patch: EventPatch) -> Result<(), String> {
        match patch {
            EventPatch::Name(v) => self.event_name = v,
            EventPatch::Description(v) => self.description = v,
            EventPatch::Venue(v) => self.venue = v,
            EventPatch::StartAt(v) => self.start_at = v,
            EventPatch::EndAt(v) => self.end_at = v,
            EventPatch::Shared(v) => self.shared = v,
            EventPatch::GroupIds(v) => self.group_ids = v,
            EventPatch::RsvpEnabled(v) => self.rsvp_enabled = v,
            EventPatch::CoverImageCleared(v) => self.cover_image_cleared = v,
            EventPatch::ReminderAdded { value, unit } => {
                if value == 0 {
                    return Err("Reminder value must be greater than zero.".into());
                }
                self.reminders.push_new(Reminder { value, unit });
            }
            EventPatch::ReminderRemoved { id } => {
                if self.reminders.remove(&id) == RemoveOutcome::NotFound {
                    return Err("That reminder no longer exists.".into());
                }
            }
        }
        Ok(())
    }

    pub fn validate_step(&self, step: usize) -> Result<(), String> {
        match step {
            0 => {
                if self.event_name.trim().is_empty() {
                    return Err("Event name is required.".into());
                }
                if self.start_at.trim().is_empty() {
                    return Err("Start date is required.".into());
                }
                if self.shared == Shared::SelectedGroups && self.group_ids.is_empty() {
                    return Err("Select at least one group to share with.".into());
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

//! Core state: the current route plus the page-scoped machines it owns.

use serde::{Deserialize, Serialize};

use crate::api::slots;
use crate::assets::{AssetStore, MaxCount, SlotKey};
use crate::form::{EventForm, FormState, IncidentForm, ProjectForm};
use crate::reference::{ReferenceCache, ReferenceKind};
use crate::session::Session;
use crate::wizard::Wizard;
use crate::{AppError, ScrollTarget, DEFAULT_TOAST_DURATION_MS, ERROR_TOAST_DURATION_MS};

/// The admin form screens this core drives. Edit routes carry the record id
/// and hydrate from a fetch; create routes start from an empty aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    IncidentCreate,
    IncidentEdit { id: String },
    EventCreate,
    EventEdit { id: String },
    ProjectEdit { id: String },
}

impl Route {
    #[must_use]
    pub fn step_labels(&self) -> &'static [&'static str] {
        match self {
            Self::IncidentCreate | Self::IncidentEdit { .. } => {
                &["Report", "Investigate", "Provisional", "Final Closure"]
            }
            Self::EventCreate | Self::EventEdit { .. } => &["Basic Info", "Media", "Reminders"],
            Self::ProjectEdit { .. } => &["Details", "Address", "Attachments"],
        }
    }

    /// Backend resource name, also the payload namespace's plural.
    #[must_use]
    pub const fn resource(&self) -> &'static str {
        match self {
            Self::IncidentCreate | Self::IncidentEdit { .. } => "incidents",
            Self::EventCreate | Self::EventEdit { .. } => "events",
            Self::ProjectEdit { .. } => "projects",
        }
    }

    #[must_use]
    pub fn entity_id(&self) -> Option<&str> {
        match self {
            Self::IncidentCreate | Self::EventCreate => None,
            Self::IncidentEdit { id } | Self::EventEdit { id } | Self::ProjectEdit { id } => {
                Some(id)
            }
        }
    }

    #[must_use]
    pub fn is_edit(&self) -> bool {
        self.entity_id().is_some()
    }

    #[must_use]
    pub fn slots(&self) -> Vec<(SlotKey, MaxCount)> {
        match self {
            Self::IncidentCreate | Self::IncidentEdit { .. } => vec![slots::incident_images()],
            Self::EventCreate | Self::EventEdit { .. } => {
                vec![slots::event_cover(), slots::event_gallery()]
            }
            Self::ProjectEdit { .. } => vec![slots::project_creatives()],
        }
    }

    /// Lookup buckets the page's selectors need.
    #[must_use]
    pub fn reference_kinds(&self) -> &'static [ReferenceKind] {
        match self {
            Self::IncidentCreate | Self::IncidentEdit { .. } => &[
                ReferenceKind::Categories,
                ReferenceKind::SubCategories,
                ReferenceKind::Users,
            ],
            Self::EventCreate | Self::EventEdit { .. } => &[ReferenceKind::Groups],
            Self::ProjectEdit { .. } => &[],
        }
    }

    #[must_use]
    pub fn empty_form(&self) -> FormState {
        match self {
            Self::IncidentCreate | Self::IncidentEdit { .. } => {
                FormState::Incident(Box::new(IncidentForm::default()))
            }
            Self::EventCreate | Self::EventEdit { .. } => {
                FormState::Event(Box::new(EventForm::default()))
            }
            Self::ProjectEdit { .. } => FormState::Project(Box::new(ProjectForm::default())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastMessage {
    pub kind: ToastKind,
    pub text: String,
    pub duration_ms: u64,
}

#[derive(Debug, Default)]
pub struct Model {
    pub route: Option<Route>,
    pub session: Session,
    pub wizard: Wizard,
    pub reference: ReferenceCache,
    pub form: FormState,
    pub assets: AssetStore,
    pub toast: Option<ToastMessage>,
    pub active_error: Option<AppError>,
    pub is_loading: bool,
    pub is_submitting: bool,
    /// One-shot view instructions, acknowledged by `ViewEffectsHandled`.
    pub pending_scroll: Option<ScrollTarget>,
    pub revoke_previews: Vec<String>,
}

impl Model {
    /// Reset everything the previous page owned. Session survives.
    pub fn open_route(&mut self, route: Route) {
        self.wizard = Wizard::new(route.step_labels().iter().copied());
        self.form = route.empty_form();

        self.assets = AssetStore::default();
        for (key, max) in route.slots() {
            self.assets.register_slot(key, max);
        }

        self.reference = ReferenceCache::default();
        self.toast = None;
        self.active_error = None;
        self.is_loading = route.is_edit();
        self.is_submitting = false;
        self.pending_scroll = None;
        self.route = Some(route);
    }

    pub fn show_toast(&mut self, kind: ToastKind, text: impl Into<String>) {
        let duration_ms = match kind {
            ToastKind::Error => ERROR_TOAST_DURATION_MS,
            ToastKind::Success | ToastKind::Info => DEFAULT_TOAST_DURATION_MS,
        };
        self.toast = Some(ToastMessage {
            kind,
            text: text.into(),
            duration_ms,
        });
    }

    /// Record an error and surface it both as the active error and a toast.
    pub fn report_error(&mut self, error: AppError) {
        tracing::error!(code = error.code(), "operation failed: {error}");
        self.show_toast(ToastKind::Error, error.user_facing_message());
        self.active_error = Some(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::FetchState;

    #[test]
    fn opening_a_route_resets_page_state_but_not_the_session() {
        let mut model = Model::default();
        model
            .session
            .configure("https://api.example.com", Some("tok".into()))
            .unwrap();
        model.show_toast(ToastKind::Info, "left over");

        model.open_route(Route::EventEdit { id: "42".into() });

        assert!(model.session.is_configured());
        assert!(model.toast.is_none());
        assert!(model.is_loading);
        assert_eq!(model.wizard.total_steps(), 3);
        assert_eq!(
            model.reference.state(ReferenceKind::Groups),
            FetchState::NotRequested
        );
        // Slots are registered up front so single-asset behaviour applies
        // before hydration lands.
        let (cover, _) = crate::api::slots::event_cover();
        assert!(model.assets.is_single(&cover));
    }

    #[test]
    fn create_routes_do_not_start_loading() {
        let mut model = Model::default();
        model.open_route(Route::IncidentCreate);
        assert!(!model.is_loading);
        assert!(matches!(model.form, FormState::Incident(_)));
        assert_eq!(model.wizard.total_steps(), 4);
    }

    #[test]
    fn error_report_sets_both_toast_and_active_error() {
        let mut model = Model::default();
        model.report_error(crate::AppError::new(
            crate::ErrorKind::Network,
            "connection refused",
        ));
        assert!(model.active_error.is_some());
        let toast = model.toast.as_ref().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.duration_ms, ERROR_TOAST_DURATION_MS);
    }
}

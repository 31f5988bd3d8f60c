//! Everything that can happen to the core, from the shell or from a
//! completed capability call. Events are plain data and cross the FFI
//! boundary serialized.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::ApiResponse;
use crate::assets::{SlotKey, StagedUpload};
use crate::form::{EventPatch, IncidentPatch, ProjectPatch};
use crate::model::Route;
use crate::reference::ReferenceKind;
use crate::session::SessionConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Shell-injected request context; must precede any page open.
    SessionConfigured(SessionConfig),
    /// Navigation landed on one of the form screens.
    PageOpened { route: Route },

    // Capability completions. Each carries enough context to detect that
    // the user has navigated away since the request started.
    EntityFetched {
        route: Route,
        response: Box<ApiResponse>,
    },
    ReferenceFetched {
        kind: ReferenceKind,
        response: Box<ApiResponse>,
    },

    // Targeted form mutations.
    IncidentPatched(Box<IncidentPatch>),
    EventFormPatched(Box<EventPatch>),
    ProjectPatched(Box<ProjectPatch>),

    // Wizard navigation.
    AdvanceRequested,
    SaveDraftRequested,
    StepClicked { target: usize },

    // Asset slot operations.
    AssetsStaged {
        slot: SlotKey,
        uploads: Vec<StagedUpload>,
    },
    AssetReplaced {
        slot: SlotKey,
        upload: StagedUpload,
    },
    AssetRemoveRequested {
        slot: SlotKey,
        local_key: Uuid,
    },
    AssetDeleteCompleted {
        route: Route,
        slot: SlotKey,
        local_key: Uuid,
        response: Box<ApiResponse>,
    },

    // Submission.
    SubmitRequested,
    SubmitCompleted {
        route: Route,
        response: Box<ApiResponse>,
    },
    DraftSaveCompleted {
        route: Route,
        response: Box<ApiResponse>,
    },

    // View housekeeping.
    ToastDismissed,
    ErrorDismissed,
    /// The shell performed the pending scroll and released the listed
    /// preview handles.
    ViewEffectsHandled,
}

//! The app: event handling, capability orchestration, and the view model.
//!
//! Every `update` branch mutates the model and relies on the single render
//! at the end; HTTP completions re-enter as events carrying the route they
//! were issued for, so responses that outlive their page are dropped.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{self, paths, ApiResponse, SlotSeed};
use crate::assets::{AssetKind, SlotKey, StagedUpload};
use crate::capabilities::Capabilities;
use crate::event::Event;
use crate::form::{EventPatch, FormState, IncidentPatch, ProjectPatch};
use crate::model::{Model, Route, ToastKind, ToastMessage};
use crate::reference::{RefItem, ReferenceKind};
use crate::session::SessionConfig;
use crate::submit::{self, AssemblyOptions, Payload, SubmitMode};
use crate::wizard::NavOutcome;
use crate::{AppError, AppResult, ErrorKind};

/// One-shot scroll instruction for the shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollTarget {
    Top,
    Anchor(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepState {
    Current,
    Completed,
    Available,
    Locked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepIndicator {
    pub index: usize,
    pub label: String,
    pub anchor: String,
    pub state: StepState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetView {
    pub local_key: Uuid,
    pub name: String,
    pub preview_url: Option<String>,
    pub kind: AssetKind,
    pub is_existing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    pub key: String,
    pub category: String,
    pub ratio: String,
    pub single: bool,
    pub assets: Vec<AssetView>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceView {
    pub categories: Vec<RefItem>,
    pub sub_categories: Vec<RefItem>,
    pub users: Vec<RefItem>,
    pub groups: Vec<RefItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorView {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewState {
    /// No form screen is open.
    Idle,
    Loading,
    Editing { current_step: usize },
    /// Terminal read-only rendering of all steps in one document.
    Preview,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub state: ViewState,
    pub steps: Vec<StepIndicator>,
    pub form: FormState,
    pub slots: Vec<SlotView>,
    pub reference: ReferenceView,
    pub toast: Option<ToastMessage>,
    pub error: Option<ErrorView>,
    pub is_submitting: bool,
    pub pending_scroll: Option<ScrollTarget>,
    /// Blob handles the shell must release, acknowledged via
    /// [`Event::ViewEffectsHandled`].
    pub revoke_previews: Vec<String>,
}

#[derive(Default)]
pub struct App;

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Self::Event, model: &mut Self::Model, caps: &Self::Capabilities) {
        match event {
            Event::SessionConfigured(config) => Self::configure_session(model, &config),
            Event::PageOpened { route } => self.open_page(model, caps, route),

            Event::EntityFetched { route, response } => {
                Self::entity_fetched(model, &route, &response);
            }
            Event::ReferenceFetched { kind, response } => {
                Self::reference_fetched(model, kind, &response);
            }

            Event::IncidentPatched(patch) => Self::patch_incident(model, *patch),
            Event::EventFormPatched(patch) => Self::patch_event(model, *patch),
            Event::ProjectPatched(patch) => Self::patch_project(model, *patch),

            Event::AdvanceRequested => Self::advance(model),
            Event::SaveDraftRequested => self.save_draft(model, caps),
            Event::StepClicked { target } => Self::step_clicked(model, target),

            Event::AssetsStaged { slot, uploads } => Self::stage_assets(model, &slot, uploads),
            Event::AssetReplaced { slot, upload } => Self::replace_asset(model, &slot, upload),
            Event::AssetRemoveRequested { slot, local_key } => {
                self.remove_asset(model, caps, slot, local_key);
            }
            Event::AssetDeleteCompleted {
                route,
                slot,
                local_key,
                response,
            } => Self::asset_delete_completed(model, &route, &slot, local_key, &response),

            Event::SubmitRequested => self.submit(model, caps),
            Event::SubmitCompleted { route, response } => {
                Self::submission_completed(model, &route, &response, "Saved successfully.");
            }
            Event::DraftSaveCompleted { route, response } => {
                Self::submission_completed(model, &route, &response, "Draft saved.");
            }

            Event::ToastDismissed => model.toast = None,
            Event::ErrorDismissed => model.active_error = None,
            Event::ViewEffectsHandled => {
                model.pending_scroll = None;
                model.revoke_previews.clear();
            }
        }

        caps.render.render();
    }

    fn view(&self, model: &Self::Model) -> Self::ViewModel {
        let steps = model
            .wizard
            .steps()
            .iter()
            .map(|step| StepIndicator {
                index: step.index,
                label: step.label.clone(),
                anchor: step.anchor(),
                state: Self::step_state(model, step.index),
            })
            .collect();

        let state = if model.route.is_none() {
            ViewState::Idle
        } else if model.is_loading {
            ViewState::Loading
        } else if model.wizard.is_preview() {
            ViewState::Preview
        } else {
            ViewState::Editing {
                current_step: model.wizard.current_step(),
            }
        };

        let slots = model
            .assets
            .slots()
            .map(|(key, assets)| SlotView {
                key: key.to_string(),
                category: key.category.clone(),
                ratio: key.ratio.clone(),
                single: model.assets.is_single(key),
                assets: assets
                    .iter()
                    .map(|a| AssetView {
                        local_key: a.local_key,
                        name: a.name.clone(),
                        preview_url: a.preview_url.clone(),
                        kind: a.kind,
                        is_existing: a.is_existing,
                    })
                    .collect(),
            })
            .collect();

        let reference = ReferenceView {
            categories: model.reference.items(ReferenceKind::Categories).to_vec(),
            sub_categories: model.reference.items(ReferenceKind::SubCategories).to_vec(),
            users: model.reference.items(ReferenceKind::Users).to_vec(),
            groups: model.reference.items(ReferenceKind::Groups).to_vec(),
        };

        ViewModel {
            state,
            steps,
            form: model.form.clone(),
            slots,
            reference,
            toast: model.toast.clone(),
            error: model.active_error.as_ref().map(|e| ErrorView {
                code: e.code().to_string(),
                message: e.user_facing_message(),
                retryable: e.is_retryable(),
            }),
            is_submitting: model.is_submitting,
            pending_scroll: model.pending_scroll.clone(),
            revoke_previews: model.revoke_previews.clone(),
        }
    }
}

impl App {
    fn configure_session(model: &mut Model, config: &SessionConfig) {
        match model
            .session
            .configure(&config.base_url, config.access_token.clone())
        {
            Ok(()) => tracing::info!(base_url = %config.base_url, "session configured"),
            Err(e) => model.report_error(
                AppError::new(ErrorKind::Internal, "The app is not configured correctly.")
                    .with_internal(e.to_string()),
            ),
        }
    }

    fn open_page(&self, model: &mut Model, caps: &Capabilities, route: Route) {
        tracing::info!(resource = route.resource(), edit = route.is_edit(), "page opened");
        model.open_route(route.clone());

        if route.is_edit() {
            self.fetch_entity(model, caps, route.clone());
        }
        for kind in route.reference_kinds() {
            self.fetch_reference(model, caps, *kind);
        }
    }

    fn fetch_entity(&self, model: &mut Model, caps: &Capabilities, route: Route) {
        let Some(id) = route.entity_id() else {
            return;
        };
        let path = paths::entity(route.resource(), id);
        let Some(url) = model.session.endpoint(&path) else {
            model.is_loading = false;
            model.report_error(session_missing());
            return;
        };

        tracing::debug!(%url, "fetching entity");
        let mut request = caps.http.get(url);
        if let Some(bearer) = model.session.bearer() {
            request = request.header("Authorization", bearer.as_str());
        }
        request.send(move |result| Event::EntityFetched {
            route,
            response: Box::new(ApiResponse::from_result(result)),
        });
    }

    fn fetch_reference(&self, model: &mut Model, caps: &Capabilities, kind: ReferenceKind) {
        let path = paths::reference(kind);
        let Some(url) = model.session.endpoint(&path) else {
            model.reference.mark_failed(kind);
            return;
        };

        model.reference.mark_in_flight(kind);
        let mut request = caps.http.get(url);
        if let Some(bearer) = model.session.bearer() {
            request = request.header("Authorization", bearer.as_str());
        }
        request.send(move |result| Event::ReferenceFetched {
            kind,
            response: Box::new(ApiResponse::from_result(result)),
        });
    }

    fn entity_fetched(model: &mut Model, route: &Route, response: &ApiResponse) {
        if model.route.as_ref() != Some(route) {
            tracing::debug!("dropping entity response for a page no longer open");
            return;
        }

        model.is_loading = false;
        let hydrated = response
            .ok_body()
            .and_then(|body| Self::hydrate_entity(model, route, body));
        if let Err(error) = hydrated {
            model.report_error(error);
        }
    }

    fn hydrate_entity(model: &mut Model, route: &Route, body: &[u8]) -> AppResult<()> {
        match route {
            Route::EventEdit { .. } => {
                let hydration = api::decode_event(body)?;
                model.form = FormState::Event(Box::new(hydration.form));
                Self::seed_slots(model, hydration.slots);
            }
            Route::IncidentEdit { .. } => {
                let hydration = api::decode_incident(body)?;
                model.form = FormState::Incident(Box::new(hydration.form));
                Self::seed_slots(model, hydration.slots);
            }
            Route::ProjectEdit { .. } => {
                let hydration = api::decode_project(body)?;
                model.form = FormState::Project(Box::new(hydration.form));
                Self::seed_slots(model, hydration.slots);
            }
            Route::IncidentCreate | Route::EventCreate => {}
        }
        Ok(())
    }

    fn seed_slots(model: &mut Model, seeds: Vec<SlotSeed>) {
        for seed in seeds {
            model.assets.register_slot(seed.key.clone(), seed.max);
            model.assets.hydrate(&seed.key, seed.existing);
        }
    }

    fn reference_fetched(model: &mut Model, kind: ReferenceKind, response: &ApiResponse) {
        if model.route.is_none() {
            return;
        }

        match response
            .ok_body()
            .and_then(|body| api::decode_reference(kind, body))
        {
            Ok(items) => model.reference.hydrate(kind, items),
            Err(error) => {
                tracing::warn!(kind = kind.as_str(), "reference fetch failed: {error}");
                model.reference.mark_failed(kind);
                model.show_toast(ToastKind::Error, error.user_facing_message());
            }
        }
    }

    fn patch_incident(model: &mut Model, patch: IncidentPatch) {
        let result = if let FormState::Incident(form) = &mut model.form {
            form.apply(patch)
        } else {
            tracing::warn!("incident patch while no incident form is open");
            Ok(())
        };
        if let Err(message) = result {
            model.show_toast(ToastKind::Error, message);
        }
    }

    fn patch_event(model: &mut Model, patch: EventPatch) {
        let result = if let FormState::Event(form) = &mut model.form {
            form.apply(patch)
        } else {
            tracing::warn!("event patch while no event form is open");
            Ok(())
        };
        if let Err(message) = result {
            model.show_toast(ToastKind::Error, message);
        }
    }

    fn patch_project(model: &mut Model, patch: ProjectPatch) {
        let result = if let FormState::Project(form) = &mut model.form {
            form.apply(patch)
        } else {
            tracing::warn!("project patch while no project form is open");
            Ok(())
        };
        if let Err(message) = result {
            model.show_toast(ToastKind::Error, message);
        }
    }

    fn advance(model: &mut Model) {
        let step = model.wizard.current_step();
        if let Err(message) = model.form.validate_step(step) {
            model.report_error(AppError::new(ErrorKind::Validation, message));
            return;
        }

        match model.wizard.advance() {
            Ok(NavOutcome::MovedTo { .. } | NavOutcome::EnteredPreview) => {
                model.active_error = None;
                model.pending_scroll = Some(ScrollTarget::Top);
            }
            Ok(NavOutcome::ScrollTo { .. } | NavOutcome::Stayed { .. }) => {}
            Err(e) => model.report_error(AppError::new(ErrorKind::Validation, e.to_string())),
        }
    }

    fn save_draft(&self, model: &mut Model, caps: &Capabilities) {
        let step = model.wizard.current_step();
        if let Err(message) = model.form.validate_step(step) {
            model.report_error(AppError::new(ErrorKind::Validation, message));
            return;
        }

        match model.wizard.advance_for_draft() {
            Ok(NavOutcome::MovedTo { .. }) => {
                model.active_error = None;
                model.pending_scroll = Some(ScrollTarget::Top);
            }
            Ok(_) => model.active_error = None,
            Err(e) => {
                model.report_error(AppError::new(ErrorKind::Validation, e.to_string()));
                return;
            }
        }

        self.send_submission(model, caps, SubmitMode::Draft);
    }

    fn step_clicked(model: &mut Model, target: usize) {
        match model.wizard.step_click(target) {
            Ok(NavOutcome::MovedTo { .. }) => {
                model.active_error = None;
                model.pending_scroll = Some(ScrollTarget::Top);
            }
            Ok(NavOutcome::ScrollTo { anchor }) => {
                model.pending_scroll = Some(ScrollTarget::Anchor(anchor));
            }
            Ok(NavOutcome::EnteredPreview | NavOutcome::Stayed { .. }) => {}
            Err(e) => model.report_error(AppError::new(ErrorKind::Validation, e.to_string())),
        }
    }

    fn stage_assets(model: &mut Model, slot: &SlotKey, uploads: Vec<StagedUpload>) {
        let released = model.assets.add(slot, uploads);
        model.revoke_previews.extend(released);
        // A fresh cover supersedes any pending cover removal.
        Self::set_cover_cleared(model, slot, false);
    }

    fn replace_asset(model: &mut Model, slot: &SlotKey, upload: StagedUpload) {
        let released = model.assets.replace(slot, upload);
        model.revoke_previews.extend(released);
        Self::set_cover_cleared(model, slot, false);
    }

    fn set_cover_cleared(model: &mut Model, slot: &SlotKey, cleared: bool) {
        if slot.category != "cover_image" {
            return;
        }
        if let FormState::Event(form) = &mut model.form {
            form.cover_image_cleared = cleared;
        }
    }

    fn remove_asset(&self, model: &mut Model, caps: &Capabilities, slot: SlotKey, local_key: Uuid) {
        let Some(asset) = model.assets.get(&slot, local_key) else {
            tracing::warn!(slot = %slot, "removal requested for an unknown asset");
            return;
        };
        let remote_id = asset.remote_id.clone();
        let was_existing = asset.is_existing;

        let target = model
            .route
            .as_ref()
            .and_then(|r| r.entity_id().map(|id| (r.clone(), id.to_string())));

        if let (Some(remote_id), Some((route, entity_id))) = (remote_id, target) {
            // Two-phase: the server deletes first, local state follows on
            // completion so a failed delete never desyncs the slot.
            let path = paths::remove_image(route.resource(), &entity_id, &remote_id);
            let Some(url) = model.session.endpoint(&path) else {
                model.report_error(session_missing());
                return;
            };

            tracing::debug!(%url, "deleting persisted attachment");
            let mut request = caps.http.delete(url);
            if let Some(bearer) = model.session.bearer() {
                request = request.header("Authorization", bearer.as_str());
            }
            request.send(move |result| Event::AssetDeleteCompleted {
                route,
                slot,
                local_key,
                response: Box::new(ApiResponse::from_result(result)),
            });
        } else {
            // Staged upload, or an existing asset the backend exposed no id
            // for: purely local removal.
            if let Some(removed) = model.assets.remove(&slot, local_key) {
                model.revoke_previews.extend(removed.preview_url);
            }
            if was_existing {
                Self::set_cover_cleared(model, &slot, true);
            }
        }
    }

    fn asset_delete_completed(
        model: &mut Model,
        route: &Route,
        slot: &SlotKey,
        local_key: Uuid,
        response: &ApiResponse,
    ) {
        if model.route.as_ref() != Some(route) {
            tracing::debug!("dropping delete response for a page no longer open");
            return;
        }

        // A 404 means the attachment is already gone server-side; the
        // desired end state holds either way.
        let gone = response.is_success()
            || matches!(response, ApiResponse::Status { code: 404, .. });

        if gone {
            if matches!(response, ApiResponse::Status { code: 404, .. }) {
                tracing::debug!(slot = %slot, "attachment was already deleted server-side");
            }
            if let Some(removed) = model.assets.remove(slot, local_key) {
                model.revoke_previews.extend(removed.preview_url);
            }
            Self::set_cover_cleared(model, slot, true);
            model.show_toast(ToastKind::Success, "Attachment removed.");
        } else if let Err(error) = response.ok_body() {
            model.report_error(error);
        }
    }

    fn submit(&self, model: &mut Model, caps: &Capabilities) {
        // Publishing requires every step to hold, not just the visible one.
        for step in 0..model.wizard.total_steps() {
            if let Err(message) = model.form.validate_step(step) {
                model.report_error(AppError::new(ErrorKind::Validation, message));
                return;
            }
        }
        self.send_submission(model, caps, SubmitMode::Publish);
    }

    fn send_submission(&self, model: &mut Model, caps: &Capabilities, mode: SubmitMode) {
        let Some(route) = model.route.clone() else {
            tracing::warn!("submission requested with no page open");
            return;
        };

        let payload = match Self::assemble(model, mode) {
            Ok(payload) => payload,
            Err(error) => {
                model.report_error(error);
                return;
            }
        };

        let path = match route.entity_id() {
            Some(id) => paths::entity(route.resource(), id),
            None => paths::collection(route.resource()),
        };
        let Some(url) = model.session.endpoint(&path) else {
            model.report_error(session_missing());
            return;
        };

        let (content_type, body) = match payload {
            Payload::Json(value) => match serde_json::to_vec(&value) {
                Ok(bytes) => ("application/json".to_string(), bytes),
                Err(e) => {
                    model.report_error(
                        AppError::new(ErrorKind::Serialization, "Could not encode the form")
                            .with_internal(e.to_string()),
                    );
                    return;
                }
            },
            Payload::Multipart { content_type, body } => (content_type, body),
        };

        tracing::info!(resource = route.resource(), ?mode, bytes = body.len(), "submitting");

        let mut request = if route.entity_id().is_some() {
            caps.http.put(url)
        } else {
            caps.http.post(url)
        };
        if let Some(bearer) = model.session.bearer() {
            request = request.header("Authorization", bearer.as_str());
        }
        request = request
            .body(body)
            .header("Content-Type", content_type.as_str());

        match mode {
            SubmitMode::Publish => request.send(move |result| Event::SubmitCompleted {
                route,
                response: Box::new(ApiResponse::from_result(result)),
            }),
            SubmitMode::Draft => request.send(move |result| Event::DraftSaveCompleted {
                route,
                response: Box::new(ApiResponse::from_result(result)),
            }),
        }

        model.is_submitting = true;
    }

    fn assemble(model: &Model, mode: SubmitMode) -> AppResult<Payload> {
        let opts = match mode {
            SubmitMode::Publish => AssemblyOptions::publish(),
            SubmitMode::Draft => AssemblyOptions::draft(),
        };

        match &model.form {
            FormState::Event(form) => submit::assemble_event(form, &model.assets, &opts),
            FormState::Incident(form) => submit::assemble_incident(form, &model.assets, &opts),
            FormState::Project(form) => submit::assemble_project(form, &model.assets, &opts),
            FormState::None => Err(AppError::new(
                ErrorKind::Internal,
                "There is nothing to submit.",
            )),
        }
    }

    fn submission_completed(
        model: &mut Model,
        route: &Route,
        response: &ApiResponse,
        success_text: &str,
    ) {
        if model.route.as_ref() != Some(route) {
            tracing::debug!("dropping submission response for a page no longer open");
            return;
        }

        model.is_submitting = false;
        match response.ok_body() {
            Ok(_) => {
                model.active_error = None;
                model.show_toast(ToastKind::Success, success_text);
            }
            Err(error) => model.report_error(error),
        }
    }

    fn step_state(model: &Model, index: usize) -> StepState {
        if model.wizard.is_preview() {
            StepState::Completed
        } else if index == model.wizard.current_step() {
            StepState::Current
        } else if model.wizard.is_completed(index) {
            StepState::Completed
        } else if model.wizard.is_reachable(index) {
            StepState::Available
        } else {
            StepState::Locked
        }
    }
}

fn session_missing() -> AppError {
    AppError::new(
        ErrorKind::Internal,
        "The app is not configured correctly.",
    )
    .with_internal("session base URL missing")
}

use crux_core::testing::AppTester;

use admin_forms_core::app::{StepState, ViewState};
use admin_forms_core::form::{IncidentPatch, Investigator};
use admin_forms_core::model::Route;
use admin_forms_core::session::SessionConfig;
use admin_forms_core::{App, Effect, Event, Model, ScrollTarget, ToastKind};

fn configured() -> (AppTester<App, Effect>, Model) {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    app.update(
        Event::SessionConfigured(SessionConfig {
            base_url: "https://api.example.com/".into(),
            access_token: Some("tok".into()),
        }),
        &mut model,
    );
    (app, model)
}

#[test]
fn incident_wizard_gates_and_advances() {
    let (app, mut model) = configured();

    let update = app.update(Event::PageOpened { route: Route::IncidentCreate }, &mut model);
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Render(_))));
    assert_eq!(model.wizard.total_steps(), 4);
    assert!(!model.is_loading);

    // Advancing an empty report step fails with a field message, not a move.
    app.update(Event::AdvanceRequested, &mut model);
    assert_eq!(model.wizard.current_step(), 0);
    let toast = model.toast.as_ref().expect("validation toast");
    assert_eq!(toast.kind, ToastKind::Error);
    assert!(toast.text.contains("description"));

    app.update(
        Event::IncidentPatched(Box::new(IncidentPatch::Description("Slip in lobby".into()))),
        &mut model,
    );
    app.update(
        Event::IncidentPatched(Box::new(IncidentPatch::IncidentAt("2026-08-20T10:30".into()))),
        &mut model,
    );
    app.update(
        Event::IncidentPatched(Box::new(IncidentPatch::CategoryId("3".into()))),
        &mut model,
    );

    app.update(Event::AdvanceRequested, &mut model);
    assert_eq!(model.wizard.current_step(), 1);
    assert!(model.wizard.is_completed(0));
    assert_eq!(model.pending_scroll, Some(ScrollTarget::Top));

    // Jumping two steps ahead is rejected and names the prerequisite.
    app.update(Event::StepClicked { target: 3 }, &mut model);
    assert_eq!(model.wizard.current_step(), 1);
    let error = model.active_error.as_ref().expect("step gate error");
    assert_eq!(
        error.message,
        "Please complete step 2 before proceeding to step 4."
    );

    // Backward navigation is always allowed.
    app.update(Event::StepClicked { target: 0 }, &mut model);
    assert_eq!(model.wizard.current_step(), 0);
}

#[test]
fn completing_the_last_step_enters_preview() {
    let (app, mut model) = configured();
    app.update(Event::PageOpened { route: Route::IncidentCreate }, &mut model);

    fill_all_steps(&app, &mut model);

    for _ in 0..4 {
        app.update(Event::AdvanceRequested, &mut model);
    }

    assert!(model.wizard.is_preview());
    let view = app.view(&model);
    assert_eq!(view.state, ViewState::Preview);
    assert!(view.steps.iter().all(|s| s.state == StepState::Completed));

    // In preview, step clicks resolve to section anchors.
    app.update(Event::StepClicked { target: 3 }, &mut model);
    assert_eq!(
        model.pending_scroll,
        Some(ScrollTarget::Anchor("section-final-closure".into()))
    );

    // The shell acknowledges the scroll.
    app.update(Event::ViewEffectsHandled, &mut model);
    assert!(model.pending_scroll.is_none());
}

#[test]
fn view_exposes_step_indicator_states() {
    let (app, mut model) = configured();
    app.update(Event::PageOpened { route: Route::IncidentCreate }, &mut model);

    fill_report_step(&app, &mut model);
    app.update(Event::AdvanceRequested, &mut model);

    let view = app.view(&model);
    assert_eq!(view.steps[0].state, StepState::Completed);
    assert_eq!(view.steps[1].state, StepState::Current);
    assert_eq!(view.steps[2].state, StepState::Locked);
    assert_eq!(view.steps[3].state, StepState::Locked);
}

fn fill_report_step(app: &AppTester<App, Effect>, model: &mut Model) {
    for patch in [
        IncidentPatch::Description("Slip in lobby".into()),
        IncidentPatch::IncidentAt("2026-08-20T10:30".into()),
        IncidentPatch::CategoryId("3".into()),
    ] {
        app.update(Event::IncidentPatched(Box::new(patch)), model);
    }
}

fn fill_all_steps(app: &AppTester<App, Effect>, model: &mut Model) {
    fill_report_step(app, model);
    for patch in [
        IncidentPatch::InvestigatorAdded(Investigator {
            name: "R. Iyer".into(),
            is_internal: false,
            ..Investigator::default()
        }),
        IncidentPatch::RootCauseAdded(admin_forms_core::form::RootCause {
            category_id: "2".into(),
            description: "worn flooring".into(),
        }),
        IncidentPatch::CorrectiveActionAdded(admin_forms_core::form::ActionItem {
            description: "replace flooring".into(),
            ..admin_forms_core::form::ActionItem::default()
        }),
        IncidentPatch::FinalCorrectiveDescription("flooring replaced".into()),
        IncidentPatch::NextReviewDate("2026-09-30".into()),
    ] {
        app.update(Event::IncidentPatched(Box::new(patch)), model);
    }
}

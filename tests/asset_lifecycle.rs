use crux_core::testing::AppTester;
use serde_json::json;

use admin_forms_core::api::{slots, ApiResponse};
use admin_forms_core::assets::{AssetKind, StagedUpload};
use admin_forms_core::form::FormState;
use admin_forms_core::model::Route;
use admin_forms_core::session::SessionConfig;
use admin_forms_core::{App, Effect, Event, Model, ToastKind};

fn edit_route() -> Route {
    Route::EventEdit { id: "42".into() }
}

fn opened_event_page() -> (AppTester<App, Effect>, Model) {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    app.update(
        Event::SessionConfigured(SessionConfig {
            base_url: "https://api.example.com/".into(),
            access_token: Some("tok".into()),
        }),
        &mut model,
    );

    let update = app.update(Event::PageOpened { route: edit_route() }, &mut model);
    assert!(model.is_loading);
    // The page open issues the entity fetch (plus reference fetches).
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Http(_))));

    let body = json!({
        "event": {
            "event_name": "Diwali Gala",
            "from_time": "2026-11-08T18:00",
            "cover_image": { "id": 11, "url": "https://cdn.example.com/c.jpg" },
            "event_images": [
                { "id": 12, "url": "https://cdn.example.com/g1.jpg" },
                { "id": 13, "url": "https://cdn.example.com/g2.jpg" },
            ],
        }
    })
    .to_string();

    app.update(
        Event::EntityFetched {
            route: edit_route(),
            response: Box::new(ApiResponse::Status { code: 200, body: body.into_bytes() }),
        },
        &mut model,
    );
    assert!(!model.is_loading);
    (app, model)
}

#[test]
fn removing_a_persisted_asset_is_two_phase() {
    let (app, mut model) = opened_event_page();
    let (gallery, _) = slots::event_gallery();
    let local_key = model.assets.assets(&gallery)[0].local_key;

    // Phase one: the delete request goes out, local state is untouched.
    let update = app.update(
        Event::AssetRemoveRequested { slot: gallery.clone(), local_key },
        &mut model,
    );
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Http(_))));
    assert_eq!(model.assets.assets(&gallery).len(), 2);

    // Phase two: the completion drops the asset.
    app.update(
        Event::AssetDeleteCompleted {
            route: edit_route(),
            slot: gallery.clone(),
            local_key,
            response: Box::new(ApiResponse::Status { code: 200, body: Vec::new() }),
        },
        &mut model,
    );
    assert_eq!(model.assets.assets(&gallery).len(), 1);
    assert_eq!(model.toast.as_ref().map(|t| t.kind), Some(ToastKind::Success));
}

#[test]
fn not_found_on_delete_counts_as_removed() {
    let (app, mut model) = opened_event_page();
    let (gallery, _) = slots::event_gallery();
    let local_key = model.assets.assets(&gallery)[0].local_key;

    app.update(
        Event::AssetRemoveRequested { slot: gallery.clone(), local_key },
        &mut model,
    );
    app.update(
        Event::AssetDeleteCompleted {
            route: edit_route(),
            slot: gallery.clone(),
            local_key,
            response: Box::new(ApiResponse::Status { code: 404, body: Vec::new() }),
        },
        &mut model,
    );

    assert_eq!(model.assets.assets(&gallery).len(), 1);
    assert!(model.active_error.is_none());
}

#[test]
fn failed_delete_keeps_the_asset_and_reports() {
    let (app, mut model) = opened_event_page();
    let (gallery, _) = slots::event_gallery();
    let local_key = model.assets.assets(&gallery)[0].local_key;

    app.update(
        Event::AssetRemoveRequested { slot: gallery.clone(), local_key },
        &mut model,
    );
    app.update(
        Event::AssetDeleteCompleted {
            route: edit_route(),
            slot: gallery.clone(),
            local_key,
            response: Box::new(ApiResponse::Status { code: 500, body: Vec::new() }),
        },
        &mut model,
    );

    assert_eq!(model.assets.assets(&gallery).len(), 2);
    assert!(model.active_error.is_some());
}

#[test]
fn staged_uploads_are_removed_locally_and_previews_released() {
    let (app, mut model) = opened_event_page();
    let (gallery, _) = slots::event_gallery();

    app.update(
        Event::AssetsStaged {
            slot: gallery.clone(),
            uploads: vec![StagedUpload {
                name: "new.jpg".into(),
                content_type: "image/jpeg".into(),
                kind: AssetKind::Image,
                preview_url: Some("blob:abc".into()),
                bytes: vec![0xFF],
            }],
        },
        &mut model,
    );
    assert_eq!(model.assets.assets(&gallery).len(), 3);

    let staged_key = model
        .assets
        .assets(&gallery)
        .iter()
        .find(|a| !a.is_existing)
        .map(|a| a.local_key)
        .expect("staged asset present");

    // No server round-trip for something never persisted.
    let update = app.update(
        Event::AssetRemoveRequested { slot: gallery.clone(), local_key: staged_key },
        &mut model,
    );
    assert!(!update.effects.iter().any(|e| matches!(e, Effect::Http(_))));
    assert_eq!(model.assets.assets(&gallery).len(), 2);
    assert_eq!(model.revoke_previews, vec!["blob:abc".to_string()]);

    app.update(Event::ViewEffectsHandled, &mut model);
    assert!(model.revoke_previews.is_empty());
}

#[test]
fn clearing_the_cover_sets_the_removal_marker() {
    let (app, mut model) = opened_event_page();
    let (cover, _) = slots::event_cover();
    let local_key = model.assets.assets(&cover)[0].local_key;

    app.update(
        Event::AssetRemoveRequested { slot: cover.clone(), local_key },
        &mut model,
    );
    app.update(
        Event::AssetDeleteCompleted {
            route: edit_route(),
            slot: cover.clone(),
            local_key,
            response: Box::new(ApiResponse::Status { code: 200, body: Vec::new() }),
        },
        &mut model,
    );

    let FormState::Event(form) = &model.form else {
        panic!("expected an event form");
    };
    assert!(form.cover_image_cleared);

    // Staging a replacement cover withdraws the marker.
    app.update(
        Event::AssetReplaced {
            slot: cover.clone(),
            upload: StagedUpload {
                name: "fresh.jpg".into(),
                content_type: "image/jpeg".into(),
                kind: AssetKind::Image,
                preview_url: None,
                bytes: vec![1],
            },
        },
        &mut model,
    );
    let FormState::Event(form) = &model.form else {
        panic!("expected an event form");
    };
    assert!(!form.cover_image_cleared);
}

#[test]
fn stale_delete_response_is_ignored_after_navigation() {
    let (app, mut model) = opened_event_page();
    let (gallery, _) = slots::event_gallery();
    let local_key = model.assets.assets(&gallery)[0].local_key;

    app.update(
        Event::AssetRemoveRequested { slot: gallery.clone(), local_key },
        &mut model,
    );
    app.update(Event::PageOpened { route: Route::IncidentCreate }, &mut model);

    app.update(
        Event::AssetDeleteCompleted {
            route: edit_route(),
            slot: gallery,
            local_key,
            response: Box::new(ApiResponse::Status { code: 200, body: Vec::new() }),
        },
        &mut model,
    );

    // The new page's state is untouched by the old page's completion.
    assert!(model.toast.is_none());
    assert!(model.active_error.is_none());
}

use crux_core::testing::AppTester;

use minaret_core::capabilities::{
    Effect, MapsOperation, PlaceRecord, PlacesStatus, Position, SearchResponse,
};
use minaret_core::model::{
    Coordinate, MapHandle, PlaceId, SearchStatus, SessionId, SessionState,
};
use minaret_core::{App, Event, Model, EMPTY_LIST_MESSAGE};

fn coord(lat: f64, lng: f64) -> Coordinate {
    Coordinate::new(lat, lng).unwrap()
}

fn record(id: &str, name: &str, location: Coordinate) -> PlaceRecord {
    PlaceRecord {
        place_id: Some(id.into()),
        name: name.into(),
        vicinity: Some("Somewhere".into()),
        location,
        rating: None,
        rating_count: None,
    }
}

/// Drive a fresh model to a ready session centered on `center`.
fn ready_session(app: &AppTester<App, Effect>, model: &mut Model, center: Coordinate) {
    app.update(
        Event::AppStarted {
            api_key: "k".into(),
        },
        model,
    );
    app.update(Event::SdkLoadCompleted { result: Ok(()) }, model);
    app.update(
        Event::PositionFixed {
            session: model.session.id,
            result: Ok(Position::new(center)),
        },
        model,
    );
    app.update(
        Event::MapOpened {
            session: model.session.id,
            result: Ok(MapHandle(model.session.id.0)),
        },
        model,
    );
    assert_eq!(model.session.state, SessionState::Ready);
}

#[test]
fn results_place_markers_and_clear_loading() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    let center = coord(0.0, 0.0);
    ready_session(&app, &mut model, center);

    let update = app.update(
        Event::SearchCompleted {
            session: SessionId(1),
            result: Box::new(Ok(SearchResponse::ok(vec![
                record("a", "Grand Mosque", coord(0.0, 0.045)),
                record("b", "Nur Mosque", coord(0.01, 0.01)),
            ]))),
        },
        &mut model,
    );

    assert!(!model.is_loading);
    assert_eq!(model.search_status, SearchStatus::Ok);
    assert_eq!(model.places.len(), 2);
    // Provider order is preserved.
    assert_eq!(model.places[0].id, PlaceId::new("a"));
    assert_eq!(model.places[1].id, PlaceId::new("b"));

    let placed = update.effects.iter().any(|e| match e {
        Effect::Maps(req) => matches!(
            &req.operation,
            MapsOperation::PlaceMarkers { handle, markers }
                if *handle == MapHandle(1) && markers.len() == 2
        ),
        _ => false,
    });
    assert!(placed, "markers go to the session's surface");
}

#[test]
fn stale_search_completion_is_discarded() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    ready_session(&app, &mut model, coord(0.0, 0.0));

    // Supersede the session before the first search resolves.
    app.update(Event::ThemeToggled, &mut model);
    assert_eq!(model.session.id, SessionId(2));

    app.update(
        Event::SearchCompleted {
            session: SessionId(1),
            result: Box::new(Ok(SearchResponse::ok(vec![record(
                "old",
                "Stale Mosque",
                coord(0.0, 0.01),
            )]))),
        },
        &mut model,
    );

    assert!(model.places.is_empty(), "stale results must not land");
    assert_eq!(model.search_status, SearchStatus::Pending);
    assert!(model.is_loading);
}

#[test]
fn stale_map_open_closes_the_leaked_handle() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(
        Event::AppStarted {
            api_key: "k".into(),
        },
        &mut model,
    );
    app.update(Event::SdkLoadCompleted { result: Ok(()) }, &mut model);
    app.update(
        Event::PositionFixed {
            session: SessionId(1),
            result: Ok(Position::new(coord(0.0, 0.0))),
        },
        &mut model,
    );

    // New session starts while the first open is still in flight.
    app.update(Event::ThemeToggled, &mut model);
    assert_eq!(model.session.id, SessionId(2));

    let update = app.update(
        Event::MapOpened {
            session: SessionId(1),
            result: Ok(MapHandle(9)),
        },
        &mut model,
    );

    assert!(model.session.handle.is_none());
    let closed = update.effects.iter().any(|e| match e {
        Effect::Maps(req) => {
            matches!(&req.operation, MapsOperation::CloseMap { handle } if *handle == MapHandle(9))
        }
        _ => false,
    });
    assert!(closed, "a surface opened for a dead session must be torn down");
}

#[test]
fn zero_results_shows_the_empty_message() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    ready_session(&app, &mut model, coord(0.0, 0.0));

    app.update(
        Event::SearchCompleted {
            session: SessionId(1),
            result: Box::new(Ok(SearchResponse::with_status(PlacesStatus::ZeroResults))),
        },
        &mut model,
    );

    assert!(!model.is_loading);
    assert_eq!(model.search_status, SearchStatus::ZeroResults);
    let view = app.view(&model);
    assert_eq!(view.empty_message.as_deref(), Some(EMPTY_LIST_MESSAGE));
    assert!(view.error.is_none());
}

#[test]
fn provider_refusal_becomes_an_empty_failed_list_not_an_error() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    ready_session(&app, &mut model, coord(0.0, 0.0));

    app.update(
        Event::SearchCompleted {
            session: SessionId(1),
            result: Box::new(Ok(SearchResponse::with_status(
                PlacesStatus::OverQueryLimit,
            ))),
        },
        &mut model,
    );

    assert!(!model.is_loading);
    assert_eq!(model.search_status, SearchStatus::Failed);
    assert!(model.places.is_empty());
    // The map session survives; only the list is empty.
    assert_eq!(model.session.state, SessionState::Ready);
    assert!(model.active_error.is_none());

    let view = app.view(&model);
    assert_eq!(view.empty_message.as_deref(), Some(EMPTY_LIST_MESSAGE));
}

#[test]
fn distances_are_measured_from_the_session_center() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    let center = coord(0.0, 0.0);
    ready_session(&app, &mut model, center);

    app.update(
        Event::SearchCompleted {
            session: SessionId(1),
            result: Box::new(Ok(SearchResponse::ok(vec![record(
                "a",
                "Grand Mosque",
                coord(0.0, 0.045),
            )]))),
        },
        &mut model,
    );

    assert!((model.places[0].distance_km - 5.0).abs() < f64::EPSILON);
}

#[test]
fn selection_and_directions_link_through_the_view() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    ready_session(&app, &mut model, coord(1.0, 2.0));

    app.update(
        Event::SearchCompleted {
            session: SessionId(1),
            result: Box::new(Ok(SearchResponse::ok(vec![record(
                "a",
                "Grand Mosque",
                coord(3.5, -4.25),
            )]))),
        },
        &mut model,
    );

    app.update(
        Event::PlaceSelected {
            id: PlaceId::new("a"),
        },
        &mut model,
    );

    let view = app.view(&model);
    let detail = view.selected.unwrap();
    assert_eq!(detail.name, "Grand Mosque");
    assert_eq!(
        detail.directions_url,
        "https://www.google.com/maps/dir/?api=1&origin=1,2&destination=3.5,-4.25"
    );

    assert_eq!(view.selected_directions_url, detail.directions_url);

    app.update(Event::SelectionDismissed, &mut model);
    let view = app.view(&model);
    assert!(view.selected.is_none());
    assert_eq!(view.selected_directions_url, "#");
}

#[test]
fn filter_narrows_the_visible_rows_without_touching_the_model_list() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    ready_session(&app, &mut model, coord(0.0, 0.0));

    app.update(
        Event::SearchCompleted {
            session: SessionId(1),
            result: Box::new(Ok(SearchResponse::ok(vec![
                record("a", "Grand Mosque", coord(0.0, 0.01)),
                record("b", "Nur Mosque", coord(0.0, 0.02)),
            ]))),
        },
        &mut model,
    );

    app.update(
        Event::SearchTermChanged {
            term: "grand".into(),
        },
        &mut model,
    );

    let view = app.view(&model);
    assert_eq!(view.places.len(), 1);
    assert_eq!(view.places[0].name, "Grand Mosque");
    assert_eq!(view.total_places, 2);
    assert_eq!(model.places.len(), 2);
}

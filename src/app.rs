use crate::capabilities::{Capabilities, MapsError, PlacesStatus, SdkConfig};
use crate::event::Event;
use crate::model::{
    MapSession, Model, Place, SdkState, SearchStatus, SessionId, SessionState,
};
use crate::view::{view_model, ViewModel};
use crate::{UserFacingError, DEFAULT_MAP_ZOOM, DEFAULT_RADIUS_M, SEARCH_CATEGORY};

/// The headless application core. All state lives in `Model`; all effects go
/// out through `Capabilities` and come back in as events.
///
/// The heart of the design is the session counter: every map session gets a
/// fresh `SessionId`, every capability completion carries the id it was
/// issued under, and `update` discards any completion whose id no longer
/// matches. Superseded work is never cancelled, only ignored.
#[derive(Default)]
pub struct App;

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Self::Event, model: &mut Self::Model, caps: &Self::Capabilities) {
        caps.telemetry.counter(&format!("event.{}", event.name()), 1);
        if event.is_user_initiated() {
            caps.telemetry.event(
                "user_action",
                vec![("name".to_string(), event.name().to_string())],
            );
        }

        match event {
            Event::AppStarted { api_key } => {
                model.sdk_config = Some(SdkConfig::new(api_key));
                self.start_session(model, caps);
            }

            Event::RetryRequested => {
                self.start_session(model, caps);
            }

            Event::ThemeToggled => {
                model.theme = model.theme.toggle();
                // A live surface is never restyled in place; the whole
                // session is recreated under the new theme.
                if model.session.state.is_live() {
                    self.start_session(model, caps);
                }
            }

            Event::SearchTermChanged { term } => {
                model.search_term = term;
            }

            Event::PlaceSelected { id } => {
                // Selecting an id that is not in the current list keeps the
                // previous selection instead of blanking the detail card.
                if model.places.iter().any(|p| p.id == id) {
                    model.selected_place_id = Some(id);
                }
            }

            Event::SelectionDismissed => {
                model.selected_place_id = None;
            }

            Event::MenuToggled => {
                model.menu_open = !model.menu_open;
            }

            Event::SdkLoadCompleted { result } => match result {
                Ok(()) => {
                    model.sdk = SdkState::Ready;
                    if model.session.state == SessionState::Loading
                        && model.session.center.is_none()
                    {
                        self.request_position(model, caps);
                    }
                }
                Err(error) => {
                    model.sdk = SdkState::Failed;
                    tracing::warn!(%error, "sdk load failed");
                    if model.session.state == SessionState::Loading {
                        self.fail_session(model, caps, (&error).into());
                    }
                }
            },

            Event::PositionFixed { session, result } => {
                if self.is_stale(session, model, "position_fixed") {
                    return;
                }
                match result {
                    Ok(position) => {
                        model.session.center = Some(position.coordinate);
                        let id = model.session.id;
                        caps.maps.open_map(
                            position.coordinate,
                            DEFAULT_MAP_ZOOM,
                            model.session.theme,
                            move |result| Event::MapOpened {
                                session: id,
                                result,
                            },
                        );
                    }
                    Err(error) => {
                        tracing::warn!(%error, "position fix failed");
                        self.fail_session(model, caps, (&error).into());
                    }
                }
            }

            Event::MapOpened { session, result } => {
                if session != model.session.id {
                    // A surface opened for a superseded session would leak
                    // its handle; close it before discarding the event.
                    if let Ok(handle) = result {
                        caps.maps.close_map(handle);
                    }
                    tracing::debug!(%session, live = %model.session.id, "stale map_opened discarded");
                    return;
                }
                match result {
                    Ok(handle) => {
                        model.session.handle = Some(handle);
                        model.session.state = SessionState::Ready;
                        if let Some(center) = model.session.center {
                            let id = model.session.id;
                            caps.maps.nearby_search(
                                center,
                                DEFAULT_RADIUS_M,
                                SEARCH_CATEGORY,
                                move |result| Event::SearchCompleted {
                                    session: id,
                                    result: Box::new(result),
                                },
                            );
                        } else {
                            // Opening without a center cannot happen in the
                            // normal flow; treat it as a surface failure.
                            let error = MapsError::SurfaceUnavailable {
                                reason: "map opened before a position fix".to_string(),
                            };
                            self.fail_session(model, caps, (&error).into());
                        }
                    }
                    Err(error) => {
                        tracing::warn!(%error, "map open failed");
                        self.fail_session(model, caps, (&error).into());
                    }
                }
            }

            Event::SearchCompleted { session, result } => {
                if self.is_stale(session, model, "search_completed") {
                    return;
                }
                self.apply_search_result(model, caps, *result);
            }
        }

        caps.render.render();
    }

    fn view(&self, model: &Self::Model) -> Self::ViewModel {
        view_model(model)
    }
}

impl App {
    /// Begin a fresh map session: close the previous surface, bump the
    /// session counter, and run the bootstrap sequence appropriate to the
    /// current SDK state.
    fn start_session(&self, model: &mut Model, caps: &Capabilities) {
        if let Some(handle) = model.session.handle.take() {
            caps.maps.close_map(handle);
        }

        model.session_seq += 1;
        model.session = MapSession {
            id: SessionId(model.session_seq),
            state: SessionState::Loading,
            theme: model.theme,
            center: None,
            handle: None,
        };
        model.places.clear();
        model.search_status = SearchStatus::Pending;
        model.is_loading = true;
        model.active_error = None;

        match model.sdk {
            SdkState::Ready => self.request_position(model, caps),
            // A load is already in flight; this session picks up its
            // completion via SdkLoadCompleted.
            SdkState::Loading => {}
            SdkState::NotLoaded | SdkState::Failed => {
                if let Some(config) = model.sdk_config.clone() {
                    model.sdk = SdkState::Loading;
                    caps.maps
                        .load_sdk(&config, |result| Event::SdkLoadCompleted { result });
                } else {
                    let error = MapsError::SdkLoadFailed {
                        reason: "no access key configured".to_string(),
                    };
                    tracing::warn!(%error, "session start without configuration");
                    self.fail_session(model, caps, (&error).into());
                }
            }
        }
    }

    fn request_position(&self, model: &Model, caps: &Capabilities) {
        let id = model.session.id;
        caps.geolocation.current_position(move |result| Event::PositionFixed {
            session: id,
            result,
        });
    }

    /// Terminal failure of the live session. Nothing short of a manual
    /// retry or a theme toggle starts a new attempt.
    fn fail_session(&self, model: &mut Model, caps: &Capabilities, error: UserFacingError) {
        caps.telemetry.error(&error.code, &error.message);
        model.session.state = SessionState::Failed;
        model.is_loading = false;
        model.places.clear();
        model.search_status = SearchStatus::Failed;
        model.active_error = Some(error);
    }

    fn apply_search_result(
        &self,
        model: &mut Model,
        caps: &Capabilities,
        result: Result<crate::capabilities::SearchResponse, MapsError>,
    ) {
        model.is_loading = false;

        let response = match result {
            Ok(response) => response,
            Err(error) => {
                // Transport-level search failure. The map stays up; the
                // list is presented as empty with the failure flag set.
                tracing::warn!(%error, "nearby search failed");
                caps.telemetry.error("SEARCH_FAILED", &error.to_string());
                model.places.clear();
                model.search_status = SearchStatus::Failed;
                return;
            }
        };

        match response.status {
            PlacesStatus::Ok => {
                let Some(center) = model.session.center else {
                    model.places.clear();
                    model.search_status = SearchStatus::Failed;
                    return;
                };
                model.places = response
                    .places
                    .into_iter()
                    .map(|record| Place::from_record(record, center))
                    .collect();
                model.search_status = SearchStatus::Ok;

                if let Some(handle) = model.session.handle {
                    if !model.places.is_empty() {
                        let markers = model
                            .places
                            .iter()
                            .map(|p| crate::capabilities::MarkerSpec {
                                title: p.name.clone(),
                                location: p.location,
                            })
                            .collect();
                        caps.maps.place_markers(handle, markers);
                    }
                }
            }
            PlacesStatus::ZeroResults => {
                model.places.clear();
                model.search_status = SearchStatus::ZeroResults;
            }
            status => {
                // Provider-side refusals are data, not exceptions.
                tracing::warn!(status = status.as_str(), "nearby search returned non-ok status");
                caps.telemetry.error("SEARCH_FAILED", status.as_str());
                model.places.clear();
                model.search_status = SearchStatus::Failed;
            }
        }
    }

    fn is_stale(&self, session: SessionId, model: &Model, what: &str) -> bool {
        if session == model.session.id {
            return false;
        }
        tracing::debug!(%session, live = %model.session.id, what, "stale completion discarded");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Effect;
    use crate::model::{PlaceId, ThemeMode};
    use crux_core::testing::AppTester;

    #[test]
    fn theme_toggle_without_session_only_flips_mode() {
        let app = AppTester::<App, Effect>::default();
        let mut model = Model::new();

        app.update(Event::ThemeToggled, &mut model);

        assert_eq!(model.theme, ThemeMode::Dark);
        assert_eq!(model.session.state, SessionState::Uninitialized);
        assert_eq!(model.session_seq, 0);
    }

    #[test]
    fn search_term_is_stored_verbatim() {
        let app = AppTester::<App, Effect>::default();
        let mut model = Model::new();

        app.update(
            Event::SearchTermChanged {
                term: "  Grand  ".into(),
            },
            &mut model,
        );

        assert_eq!(model.search_term, "  Grand  ");
    }

    #[test]
    fn menu_toggle_flips_both_ways() {
        let app = AppTester::<App, Effect>::default();
        let mut model = Model::new();

        app.update(Event::MenuToggled, &mut model);
        assert!(model.menu_open);
        app.update(Event::MenuToggled, &mut model);
        assert!(!model.menu_open);
    }

    #[test]
    fn selecting_unknown_place_keeps_previous_selection() {
        let app = AppTester::<App, Effect>::default();
        let mut model = Model::new();
        model.selected_place_id = Some(PlaceId::new("kept"));

        app.update(
            Event::PlaceSelected {
                id: PlaceId::new("missing"),
            },
            &mut model,
        );

        assert_eq!(model.selected_place_id, Some(PlaceId::new("kept")));
    }

    #[test]
    fn dismissing_selection_clears_it() {
        let app = AppTester::<App, Effect>::default();
        let mut model = Model::new();
        model.selected_place_id = Some(PlaceId::new("a"));

        app.update(Event::SelectionDismissed, &mut model);

        assert!(model.selected_place_id.is_none());
    }

    #[test]
    fn retry_without_configuration_fails_the_session() {
        let app = AppTester::<App, Effect>::default();
        let mut model = Model::new();

        app.update(Event::RetryRequested, &mut model);

        assert_eq!(model.session.state, SessionState::Failed);
        assert!(!model.is_loading);
        let error = model.active_error.as_ref().unwrap();
        assert_eq!(error.code, "SDK_LOAD_FAILED");
    }
}

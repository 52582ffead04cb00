use serde::{Deserialize, Serialize};

use crate::model::{
    Coordinate, Model, Place, PlaceId, SearchStatus, SessionState, ThemeMode,
};
use crate::{
    format_distance_km, UserFacingError, DIRECTIONS_ENDPOINT, DIRECTIONS_PLACEHOLDER,
    EMPTY_LIST_MESSAGE,
};

/// What the shell renders. Fully serializable, derived from `Model` on every
/// render, never mutated in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct ViewModel {
    pub theme: ThemeMode,
    pub session_state: SessionState,
    pub is_loading: bool,
    pub menu_open: bool,
    pub search_term: String,
    pub search_status: SearchStatus,
    pub user_position: Option<Coordinate>,
    pub places: Vec<PlaceRow>,
    pub total_places: usize,
    pub empty_message: Option<String>,
    pub selected: Option<PlaceDetail>,
    /// Href for the directions anchor; `#` while nothing is selected.
    pub selected_directions_url: String,
    pub error: Option<UserFacingError>,
}

/// One row of the place list, filtered and ready to print.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaceRow {
    pub id: PlaceId,
    pub name: String,
    pub address: String,
    pub distance_km: f64,
    pub distance_text: String,
    pub rating: Option<f64>,
    pub rating_count: Option<u32>,
}

impl PlaceRow {
    fn from_place(place: &Place) -> Self {
        Self {
            id: place.id.clone(),
            name: place.name.clone(),
            address: place.address.clone(),
            distance_km: place.distance_km,
            distance_text: format_distance_km(place.distance_km),
            rating: place.rating,
            rating_count: place.rating_count,
        }
    }
}

/// The selected place's detail card, directions link included.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetail {
    pub id: PlaceId,
    pub name: String,
    pub address: String,
    pub distance_text: String,
    pub lat: f64,
    pub lng: f64,
    pub directions_url: String,
}

impl PlaceDetail {
    fn from_place(place: &Place, origin: Option<Coordinate>) -> Self {
        Self {
            id: place.id.clone(),
            name: place.name.clone(),
            address: place.address.clone(),
            distance_text: format_distance_km(place.distance_km),
            lat: place.location.lat(),
            lng: place.location.lng(),
            directions_url: directions_url(origin, place.location),
        }
    }
}

/// Case-insensitive substring match on name or address. An empty (or
/// all-whitespace) term matches everything. Order of the input is preserved.
#[must_use]
pub fn filtered_places<'a>(places: &'a [Place], term: &str) -> Vec<&'a Place> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return places.iter().collect();
    }
    places
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle) || p.address.to_lowercase().contains(&needle)
        })
        .collect()
}

/// External directions deep link. The destination must render as bare
/// `lat,lng` with minimal numeric formatting, so the query string is
/// assembled by hand rather than form-encoded.
#[must_use]
pub fn directions_url(origin: Option<Coordinate>, destination: Coordinate) -> String {
    match origin {
        Some(origin) => {
            format!("{DIRECTIONS_ENDPOINT}?api=1&origin={origin}&destination={destination}")
        }
        None => format!("{DIRECTIONS_ENDPOINT}?api=1&destination={destination}"),
    }
}

pub(crate) fn view_model(model: &Model) -> ViewModel {
    let filtered = filtered_places(&model.places, &model.search_term);
    let rows: Vec<PlaceRow> = filtered.iter().map(|p| PlaceRow::from_place(p)).collect();

    let empty_message = if !model.is_loading
        && rows.is_empty()
        && !matches!(model.search_status, SearchStatus::Idle | SearchStatus::Pending)
    {
        Some(EMPTY_LIST_MESSAGE.to_string())
    } else {
        None
    };

    let selected = model
        .selected_place()
        .map(|p| PlaceDetail::from_place(p, model.session_center()));
    let selected_directions_url = selected
        .as_ref()
        .map_or_else(|| DIRECTIONS_PLACEHOLDER.to_string(), |d| d.directions_url.clone());

    ViewModel {
        theme: model.theme,
        session_state: model.session.state,
        is_loading: model.is_loading,
        menu_open: model.menu_open,
        search_term: model.search_term.clone(),
        search_status: model.search_status,
        user_position: model.session_center(),
        total_places: model.places.len(),
        places: rows,
        empty_message,
        selected,
        selected_directions_url,
        error: model.active_error.clone(),
    }
}

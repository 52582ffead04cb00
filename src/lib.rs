#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod capabilities;
pub mod event;
pub mod model;
pub mod view;

use serde::{Deserialize, Serialize};

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use crux_core::{render::Render, App as CruxApp};
pub use event::Event;
pub use model::Model;
pub use view::ViewModel;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
pub const DEFAULT_RADIUS_M: u32 = 5000;
pub const DEFAULT_MAP_ZOOM: u8 = 14;
pub const SEARCH_CATEGORY: &str = "mosque";
pub const EMPTY_LIST_MESSAGE: &str = "No mosques found";
pub const USER_MARKER_TITLE: &str = "Your Location";
pub const DIRECTIONS_ENDPOINT: &str = "https://www.google.com/maps/dir/";
pub const DIRECTIONS_PLACEHOLDER: &str = "#";

/// Great-circle distance in meters between two coordinates (haversine).
#[must_use]
pub fn haversine_distance(p1: model::Coordinate, p2: model::Coordinate) -> f64 {
    const EPSILON: f64 = 1e-10;

    if (p1.lat() - p2.lat()).abs() < EPSILON && (p1.lng() - p2.lng()).abs() < EPSILON {
        return 0.0;
    }

    let lat1_rad = p1.lat().to_radians();
    let lat2_rad = p2.lat().to_radians();
    let delta_lat = (p2.lat() - p1.lat()).to_radians();
    let delta_lng = (p2.lng() - p1.lng()).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);

    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().asin();
    let result = EARTH_RADIUS_M * c;

    if result.is_finite() {
        result
    } else {
        f64::MAX
    }
}

/// Distance in kilometers between two coordinates, rounded to 2 decimals.
///
/// This is the precision shown in the place list; the rounding happens once,
/// when a `Place` is built against the session center, and is never
/// re-derived afterwards.
#[must_use]
pub fn distance_km(p1: model::Coordinate, p2: model::Coordinate) -> f64 {
    round_km(haversine_distance(p1, p2) / 1000.0)
}

#[must_use]
pub fn round_km(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}

#[must_use]
pub fn format_distance_km(km: f64) -> String {
    if !km.is_finite() || km < 0.0 {
        return "Unknown".to_string();
    }
    format!("{km:.2} km")
}

/// Error projection handed to the shell. The raw capability errors stay in
/// the core; the shell only ever sees a message, a stable code, and whether
/// a manual retry can help.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserFacingError {
    pub code: String,
    pub message: String,
    pub is_retryable: bool,
}

impl UserFacingError {
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>, is_retryable: bool) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            is_retryable,
        }
    }
}

impl From<&capabilities::MapsError> for UserFacingError {
    fn from(e: &capabilities::MapsError) -> Self {
        use capabilities::MapsError;
        match e {
            MapsError::SdkLoadFailed { .. } => Self::new(
                "SDK_LOAD_FAILED",
                "The map could not be loaded. Please reload to try again.",
                true,
            ),
            MapsError::SurfaceUnavailable { .. } => Self::new(
                "MAP_UNAVAILABLE",
                "The map could not be displayed. Please try again.",
                true,
            ),
            MapsError::UnexpectedOutput { .. } => Self::new(
                "INTERNAL_ERROR",
                "An unexpected error occurred. Please try again.",
                true,
            ),
        }
    }
}

impl From<&capabilities::GeolocationError> for UserFacingError {
    fn from(e: &capabilities::GeolocationError) -> Self {
        use capabilities::GeolocationError;
        match e {
            GeolocationError::PermissionDenied => Self::new(
                "LOCATION_PERMISSION_DENIED",
                "Location access is required. Please enable location permissions and retry.",
                true,
            ),
            GeolocationError::PositionUnavailable { .. } => Self::new(
                "LOCATION_UNAVAILABLE",
                "Unable to determine your location. Please check your GPS settings and retry.",
                true,
            ),
        }
    }
}

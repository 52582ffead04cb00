use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::{distance_km, UserFacingError};

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq)]
pub enum CoordinateError {
    #[error("invalid coordinate: lat={0}, lng={1}")]
    InvalidCoordinate(f64, f64),
}

/// Validated lat/lng. Immutable once obtained.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite()
            || !lng.is_finite()
            || !(-90.0..=90.0).contains(&lat)
            || !(-180.0..=180.0).contains(&lng)
        {
            return Err(CoordinateError::InvalidCoordinate(lat, lng));
        }
        Ok(Self { lat, lng })
    }

    #[must_use]
    pub const fn lat(self) -> f64 {
        self.lat
    }

    #[must_use]
    pub const fn lng(self) -> f64 {
        self.lng
    }
}

// Bitwise comparison so the type can sit inside capability operations,
// which must be Eq.
impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.lat.to_bits() == other.lat.to_bits() && self.lng.to_bits() == other.lng.to_bits()
    }
}

impl Eq for Coordinate {}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// Stable identifier for a place. Falls back to the place name when the
/// service supplies no identifier of its own.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaceId(pub String);

impl PlaceId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monotonically increasing session counter; the stale-response guard
/// compares the id carried by a capability completion against the live
/// session before applying it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque token for a shell-side map surface. Closing the handle destroys
/// the surface and every marker attached to it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapHandle(pub u64);

impl fmt::Display for MapHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Lifecycle of the external mapping script. `Loading` is the single-flight
/// latch: while a load is in flight no second load is issued, and whichever
/// session is pending picks up the one completion.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SdkState {
    #[default]
    NotLoaded,
    Loading,
    Ready,
    Failed,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Uninitialized,
    Loading,
    Ready,
    Failed,
}

impl SessionState {
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Loading | Self::Ready)
    }
}

/// Outcome of the last nearby search. "Zero results" and "query failed" are
/// both presented as an empty list, but remain distinguishable here.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    #[default]
    Idle,
    Pending,
    Ok,
    ZeroResults,
    Failed,
}

/// One nearby place, built exactly once from a raw search record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: PlaceId,
    pub name: String,
    pub address: String,
    pub distance_km: f64,
    pub rating: Option<f64>,
    pub rating_count: Option<u32>,
    pub location: Coordinate,
}

impl Place {
    #[must_use]
    pub fn from_record(record: crate::capabilities::PlaceRecord, center: Coordinate) -> Self {
        let id = record
            .place_id
            .map_or_else(|| PlaceId::new(record.name.clone()), PlaceId::new);

        Self {
            id,
            address: record.vicinity.unwrap_or_default(),
            distance_km: distance_km(center, record.location),
            rating: record.rating,
            rating_count: record.rating_count,
            location: record.location,
            name: record.name,
        }
    }
}

/// One lifecycle instance of a map surface bound to a center and theme.
/// At most one session is live; opening a new one closes its predecessor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct MapSession {
    pub id: SessionId,
    pub state: SessionState,
    pub theme: ThemeMode,
    pub center: Option<Coordinate>,
    pub handle: Option<MapHandle>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Model {
    pub sdk: SdkState,
    pub sdk_config: Option<crate::capabilities::SdkConfig>,

    // Sessions
    pub session_seq: u64,
    pub session: MapSession,

    // Search results
    pub places: Vec<Place>,
    pub search_status: SearchStatus,

    // View state; survives session recreation
    pub theme: ThemeMode,
    pub search_term: String,
    pub selected_place_id: Option<PlaceId>,
    pub menu_open: bool,

    // Generic UI state
    pub is_loading: bool,
    pub active_error: Option<UserFacingError>,
}

impl Model {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Center captured at the start of the current session, if the locator
    /// has resolved.
    #[must_use]
    pub const fn session_center(&self) -> Option<Coordinate> {
        self.session.center
    }

    #[must_use]
    pub fn selected_place(&self) -> Option<&Place> {
        let id = self.selected_place_id.as_ref()?;
        self.places.iter().find(|p| &p.id == id)
    }
}

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::{Coordinate, MapHandle, ThemeMode};
use crate::USER_MARKER_TITLE;

pub const SDK_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/js";
pub const SDK_LIBRARIES: &str = "places";

/// The external mapping capability. The shell owns the actual SDK: it loads
/// the script, mounts and unmounts map surfaces, attaches markers, and runs
/// nearby searches. The core only ever sees operations and their outputs.
///
/// Opening a map also places the user-location marker; closing a handle
/// destroys the surface together with every marker attached to it.

pub struct Maps<Ev> {
    context: CapabilityContext<MapsOperation, Ev>,
}

impl<Ev> Capability<Ev> for Maps<Ev> {
    type Operation = MapsOperation;
    type MappedSelf<MappedEv> = Maps<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Maps::new(self.context.map_event(f))
    }
}

impl<Ev> Maps<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<MapsOperation, Ev>) -> Self {
        Self { context }
    }

    /// Ask the shell to fetch and evaluate the SDK script. Callers are
    /// expected to hold their own single-flight latch; the shell itself must
    /// fetch the script at most once per page lifetime.
    pub fn load_sdk<F>(&self, config: &SdkConfig, make_event: F)
    where
        F: FnOnce(Result<(), MapsError>) -> Ev + Send + 'static,
        Ev: Send,
    {
        let operation = MapsOperation::LoadSdk {
            url: config.script_url(),
        };
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            let result = result.and_then(|output| match output {
                MapsOutput::SdkLoaded => Ok(()),
                other => Err(MapsError::unexpected("SdkLoaded", &other)),
            });
            context.update_app(make_event(result));
        });
    }

    /// Mount a map surface centered on `center`, themed for `theme`, with
    /// the user-location marker already placed.
    pub fn open_map<F>(&self, center: Coordinate, zoom: u8, theme: ThemeMode, make_event: F)
    where
        F: FnOnce(Result<MapHandle, MapsError>) -> Ev + Send + 'static,
        Ev: Send,
    {
        let operation = MapsOperation::OpenMap {
            center,
            zoom,
            theme,
            user_marker_title: USER_MARKER_TITLE.to_string(),
        };
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            let result = result.and_then(|output| match output {
                MapsOutput::Opened { handle } => Ok(handle),
                other => Err(MapsError::unexpected("Opened", &other)),
            });
            context.update_app(make_event(result));
        });
    }

    /// Unmount a surface. Fire-and-forget: the shell destroys the surface
    /// and its markers and does not report back.
    pub fn close_map(&self, handle: MapHandle) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context
                .notify_shell(MapsOperation::CloseMap { handle })
                .await;
        });
    }

    /// Attach one marker per place to the surface behind `handle`.
    pub fn place_markers(&self, handle: MapHandle, markers: Vec<MarkerSpec>) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context
                .notify_shell(MapsOperation::PlaceMarkers { handle, markers })
                .await;
        });
    }

    /// One category + radius query against the external places service.
    /// The shell resolves with whatever the service returned, status
    /// included; interpreting non-success statuses is the caller's job.
    pub fn nearby_search<F>(&self, center: Coordinate, radius_m: u32, category: &str, make_event: F)
    where
        F: FnOnce(Result<SearchResponse, MapsError>) -> Ev + Send + 'static,
        Ev: Send,
    {
        let operation = MapsOperation::NearbySearch {
            center,
            radius_m,
            category: category.to_string(),
        };
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            let result = result.and_then(|output| match output {
                MapsOutput::Search(response) => Ok(response),
                other => Err(MapsError::unexpected("Search", &other)),
            });
            context.update_app(make_event(result));
        });
    }
}

/// The single piece of configuration: the provider access key, from which
/// the script URL is derived.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkConfig {
    pub api_key: String,
}

impl SdkConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    #[must_use]
    pub fn script_url(&self) -> String {
        match Url::parse(SDK_ENDPOINT) {
            Ok(mut url) => {
                url.query_pairs_mut()
                    .append_pair("key", &self.api_key)
                    .append_pair("libraries", SDK_LIBRARIES);
                url.into()
            }
            // SDK_ENDPOINT is a constant; this arm is unreachable in practice.
            Err(_) => format!(
                "{SDK_ENDPOINT}?key={}&libraries={SDK_LIBRARIES}",
                self.api_key
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapsOperation {
    LoadSdk {
        url: String,
    },
    OpenMap {
        center: Coordinate,
        zoom: u8,
        theme: ThemeMode,
        user_marker_title: String,
    },
    CloseMap {
        handle: MapHandle,
    },
    PlaceMarkers {
        handle: MapHandle,
        markers: Vec<MarkerSpec>,
    },
    NearbySearch {
        center: Coordinate,
        radius_m: u32,
        category: String,
    },
}

impl Operation for MapsOperation {
    type Output = MapsResult;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerSpec {
    pub title: String,
    pub location: Coordinate,
}

/// Status codes of the external places service, carried through verbatim.
/// Everything other than `Ok` resolves to an empty result list upstream;
/// the distinction only survives as a flag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlacesStatus {
    Ok,
    ZeroResults,
    OverQueryLimit,
    RequestDenied,
    InvalidRequest,
    Unknown,
}

impl PlacesStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::ZeroResults => "ZERO_RESULTS",
            Self::OverQueryLimit => "OVER_QUERY_LIMIT",
            Self::RequestDenied => "REQUEST_DENIED",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::Unknown => "UNKNOWN",
        }
    }

    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// One raw record from the places service. Order is the service's order;
/// duplicates, if the service returns them, are preserved as-is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub place_id: Option<String>,
    pub name: String,
    pub vicinity: Option<String>,
    pub location: Coordinate,
    pub rating: Option<f64>,
    pub rating_count: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub status: PlacesStatus,
    pub places: Vec<PlaceRecord>,
}

impl SearchResponse {
    #[must_use]
    pub fn ok(places: Vec<PlaceRecord>) -> Self {
        Self {
            status: PlacesStatus::Ok,
            places,
        }
    }

    #[must_use]
    pub fn with_status(status: PlacesStatus) -> Self {
        Self {
            status,
            places: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MapsOutput {
    SdkLoaded,
    Opened { handle: MapHandle },
    Search(SearchResponse),
}

#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum MapsError {
    #[error("map sdk failed to load: {reason}")]
    SdkLoadFailed { reason: String },

    #[error("map surface unavailable: {reason}")]
    SurfaceUnavailable { reason: String },

    #[error("expected {expected} output, got {got}")]
    UnexpectedOutput { expected: String, got: String },
}

impl MapsError {
    fn unexpected(expected: &str, got: &MapsOutput) -> Self {
        let got = match got {
            MapsOutput::SdkLoaded => "SdkLoaded",
            MapsOutput::Opened { .. } => "Opened",
            MapsOutput::Search(_) => "Search",
        };
        Self::UnexpectedOutput {
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }
}

pub type MapsResult = Result<MapsOutput, MapsError>;

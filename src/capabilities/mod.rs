mod geolocation;
mod maps;
mod telemetry;

pub use self::geolocation::{Geolocation, GeolocationError, GeolocationOperation, Position};
pub use self::maps::{
    Maps, MapsError, MapsOperation, MapsOutput, MapsResult, MarkerSpec, PlaceRecord, PlacesStatus,
    SdkConfig, SearchResponse, SDK_ENDPOINT, SDK_LIBRARIES,
};
pub use self::telemetry::{Telemetry, TelemetryOperation};

pub use crux_core::render::Render;

use crate::app::App;
use crate::event::Event;

pub type AppRender = Render<Event>;
pub type AppMaps = Maps<Event>;
pub type AppGeolocation = Geolocation<Event>;
pub type AppTelemetry = Telemetry<Event>;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub maps: Maps<Event>,
    pub geolocation: Geolocation<Event>,
    pub telemetry: Telemetry<Event>,
}

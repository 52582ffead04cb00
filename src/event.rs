use serde::{Deserialize, Serialize};

use crate::capabilities::{GeolocationError, MapsError, Position, SearchResponse};
use crate::model::{MapHandle, PlaceId, SessionId};

/// Everything that can drive the core: user interactions from the shell and
/// capability completions resolving back in. Completions that belong to a
/// specific map session carry its `SessionId`; the update loop discards any
/// completion whose id no longer matches the live session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // User / shell initiated
    AppStarted {
        api_key: String,
    },
    RetryRequested,
    ThemeToggled,
    SearchTermChanged {
        term: String,
    },
    PlaceSelected {
        id: PlaceId,
    },
    SelectionDismissed,
    MenuToggled,

    // Capability completions
    SdkLoadCompleted {
        result: Result<(), MapsError>,
    },
    PositionFixed {
        session: SessionId,
        result: Result<Position, GeolocationError>,
    },
    MapOpened {
        session: SessionId,
        result: Result<MapHandle, MapsError>,
    },
    SearchCompleted {
        session: SessionId,
        result: Box<Result<SearchResponse, MapsError>>,
    },
}

impl Event {
    /// Stable name used for telemetry counters and log fields.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AppStarted { .. } => "app_started",
            Self::RetryRequested => "retry_requested",
            Self::ThemeToggled => "theme_toggled",
            Self::SearchTermChanged { .. } => "search_term_changed",
            Self::PlaceSelected { .. } => "place_selected",
            Self::SelectionDismissed => "selection_dismissed",
            Self::MenuToggled => "menu_toggled",
            Self::SdkLoadCompleted { .. } => "sdk_load_completed",
            Self::PositionFixed { .. } => "position_fixed",
            Self::MapOpened { .. } => "map_opened",
            Self::SearchCompleted { .. } => "search_completed",
        }
    }

    /// True for events a person caused directly, as opposed to capability
    /// completions arriving on their own.
    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::AppStarted { .. }
                | Self::RetryRequested
                | Self::ThemeToggled
                | Self::SearchTermChanged { .. }
                | Self::PlaceSelected { .. }
                | Self::SelectionDismissed
                | Self::MenuToggled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_stays_small() {
        // Large payloads are boxed so the enum stays cheap to move around.
        assert!(std::mem::size_of::<Event>() <= 128);
    }

    #[test]
    fn completion_events_are_not_user_initiated() {
        assert!(Event::RetryRequested.is_user_initiated());
        assert!(Event::MenuToggled.is_user_initiated());
        assert!(!Event::SdkLoadCompleted { result: Ok(()) }.is_user_initiated());
        assert!(!Event::SearchCompleted {
            session: SessionId(1),
            result: Box::new(Ok(SearchResponse::ok(Vec::new()))),
        }
        .is_user_initiated());
    }

    #[test]
    fn names_are_unique() {
        let names = [
            Event::RetryRequested.name(),
            Event::ThemeToggled.name(),
            Event::SelectionDismissed.name(),
            Event::MenuToggled.name(),
            Event::SdkLoadCompleted { result: Ok(()) }.name(),
        ];
        let mut deduped = names.to_vec();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), names.len());
    }
}

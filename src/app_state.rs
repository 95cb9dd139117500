//! View state of the viewer, held as one value and changed only through
//! [`reduce`].

use serde::Serialize;
use url::form_urlencoded;

use crate::ids::{RouteId, StopId, TripId};
use crate::schedule::Schedule;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppState {
    pub selected_route: Option<RouteId>,
    /// A specific trip picked from the trip planner; otherwise the route view
    /// shows the route's first trip.
    pub selected_trip: Option<TripId>,
    pub selected_stop: Option<StopId>,
    pub dark_mode: bool,
    pub mobile_sidebar_open: bool,
    pub desktop_sidebar_open: bool,
    pub route_search: String,
}

impl Default for AppState {
    fn default() -> Self {
        AppState {
            selected_route: None,
            selected_trip: None,
            selected_stop: None,
            dark_mode: false,
            mobile_sidebar_open: false,
            desktop_sidebar_open: true,
            route_search: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewport {
    Mobile,
    Desktop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SelectRoute {
        route: RouteId,
        trip: Option<TripId>,
    },
    SelectStop(StopId),
    ClearRoute,
    ToggleDarkMode,
    OpenSidebar(Viewport),
    CloseSidebar(Viewport),
    SetRouteSearch(String),
}

pub fn reduce(state: &AppState, action: Action) -> AppState {
    let mut next = state.clone();
    match action {
        Action::SelectRoute { route, trip } => {
            next.selected_route = Some(route);
            next.selected_trip = trip;
            next.selected_stop = None;
            next.mobile_sidebar_open = false;
        }
        Action::SelectStop(stop) => {
            next.selected_stop = Some(stop);
        }
        Action::ClearRoute => {
            next.selected_route = None;
            next.selected_trip = None;
            next.selected_stop = None;
        }
        Action::ToggleDarkMode => {
            next.dark_mode = !state.dark_mode;
        }
        Action::OpenSidebar(Viewport::Mobile) => next.mobile_sidebar_open = true,
        Action::OpenSidebar(Viewport::Desktop) => next.desktop_sidebar_open = true,
        Action::CloseSidebar(Viewport::Mobile) => next.mobile_sidebar_open = false,
        Action::CloseSidebar(Viewport::Desktop) => next.desktop_sidebar_open = false,
        Action::SetRouteSearch(term) => {
            next.route_search = term;
        }
    }
    next
}

/// Reads the `route` parameter of a query string like `?route=R%3A1&x=y`,
/// percent-decoded.
pub fn route_from_query(query: &str) -> Option<RouteId> {
    form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .find(|(key, _)| key == "route")
        .map(|(_, value)| RouteId::new(&value))
        .filter(|route| !route.as_str().is_empty())
}

pub fn deep_link_query(state: &AppState) -> Option<String> {
    state.selected_route.map(|route| {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("route", route.as_str())
            .finish()
    })
}

impl AppState {
    /// Starts from a deep link, selecting its route only if the feed has it.
    pub fn from_deep_link(schedule: &Schedule, query: &str) -> AppState {
        let state = AppState::default();
        match route_from_query(query).filter(|route| schedule.route(*route).is_some()) {
            Some(route) => reduce(&state, Action::SelectRoute { route, trip: None }),
            None => state,
        }
    }
}

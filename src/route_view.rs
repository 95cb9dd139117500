use serde::Serialize;

use crate::clock::ClockTime;
use crate::feed::{Route, ShapePoint, Stop, Trip};
use crate::ids::{RouteId, TripId};
use crate::interpolate::interpolate_stop_times;
use crate::schedule::Schedule;

/// What the map and the route card show for a selected route.
#[derive(Debug, Clone, Serialize)]
pub struct RouteView<'a> {
    pub route: &'a Route,
    pub trip: &'a Trip,
    /// Empty when the trip has no shape or the shape is unknown.
    pub shape: &'a [ShapePoint],
    pub stops: Vec<RouteStop<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteStop<'a> {
    pub stop: &'a Stop,
    pub stop_sequence: u32,
    pub arrival_time: Option<ClockTime>,
    /// `H:MM AM/PM`, ready for display.
    pub arrival_display: Option<String>,
}

impl<'a> RouteView<'a> {
    pub fn first_stop(&self) -> Option<&RouteStop<'a>> {
        self.stops.first()
    }

    pub fn last_stop(&self) -> Option<&RouteStop<'a>> {
        self.stops.last()
    }
}

/// Shows one trip of the route: `trip_id` if the route has it, otherwise the first trip
/// of the route in feed order. `None` if the route is unknown or has no trips.
pub fn route_view(
    schedule: &Schedule,
    route_id: RouteId,
    trip_id: Option<TripId>,
) -> Option<RouteView<'_>> {
    let route = schedule.route(route_id)?;
    let trip = trip_id
        .and_then(|id| schedule.trip(id))
        .filter(|trip| trip.route_id == route_id)
        .or_else(|| {
            schedule
                .feed
                .trips
                .iter()
                .find(|trip| trip.route_id == route_id)
        })?;

    let shape = trip
        .shape_id
        .and_then(|shape_id| schedule.shape(shape_id))
        .unwrap_or(&[]);

    let stops = interpolate_stop_times(&schedule.stop_times_for_trip(trip.id))
        .into_iter()
        .filter_map(|stop_time| {
            let stop = schedule.stop(stop_time.stop_id)?;
            Some(RouteStop {
                stop,
                stop_sequence: stop_time.stop_sequence,
                arrival_time: stop_time.arrival_time,
                arrival_display: stop_time.arrival_time.map(ClockTime::to_am_pm),
            })
        })
        .collect();

    Some(RouteView {
        route,
        trip,
        shape,
        stops,
    })
}

/// Stops whose name contains `query`, ignoring case, for autocompleting the trip
/// planner. An empty query suggests nothing.
pub fn suggest_stops<'a>(stops: &'a [Stop], query: &str, limit: usize) -> Vec<&'a Stop> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return vec![];
    }
    stops
        .iter()
        .filter(|stop| stop.name.to_lowercase().contains(&query))
        .take(limit)
        .collect()
}

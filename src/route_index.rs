use std::collections::{BTreeSet, HashMap};

use crate::feed::{Route, Stop, StopTime, Trip};
use crate::ids::{RouteId, StopId, TripId};

/// Route id to the space-joined, lowercase names of every stop the route serves.
pub type RouteStopIndex = HashMap<RouteId, String>;

/// Lets route search match any stop a route serves, not just the route's own name.
/// Routes whose stop times can't be resolved are left out.
pub fn build_route_stop_index(
    trips: &[Trip],
    stops: &[Stop],
    stop_times: &[StopTime],
) -> RouteStopIndex {
    let route_by_trip: HashMap<TripId, RouteId> =
        trips.iter().map(|trip| (trip.id, trip.route_id)).collect();
    let name_by_stop: HashMap<StopId, String> = stops
        .iter()
        .map(|stop| (stop.id, stop.name.to_lowercase()))
        .collect();

    let mut names_per_route: HashMap<RouteId, BTreeSet<&str>> = HashMap::new();
    for stop_time in stop_times {
        if let (Some(route_id), Some(name)) = (
            route_by_trip.get(&stop_time.trip_id),
            name_by_stop.get(&stop_time.stop_id),
        ) {
            names_per_route
                .entry(*route_id)
                .or_default()
                .insert(name.as_str());
        }
    }

    names_per_route
        .into_iter()
        .map(|(route_id, names)| (route_id, names.into_iter().collect::<Vec<_>>().join(" ")))
        .collect()
}

/// Routes whose short name, long name or served stop names contain `term`,
/// ignoring case. Feed order is kept; an empty term keeps everything.
pub fn filter_routes<'a>(
    routes: &'a [Route],
    index: &RouteStopIndex,
    term: &str,
) -> Vec<&'a Route> {
    let term = term.trim().to_lowercase();
    routes
        .iter()
        .filter(|route| {
            route.short_name.to_lowercase().contains(&term)
                || route.long_name.to_lowercase().contains(&term)
                || index
                    .get(&route.id)
                    .map_or(false, |stop_names| stop_names.contains(&term))
        })
        .collect()
}

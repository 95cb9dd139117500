use std::collections::HashMap;

use crate::feed::*;
use crate::ids::{RouteId, ShapeId, StopId, TripId};
use crate::route_index::{build_route_stop_index, RouteStopIndex};
use crate::shapes::{group_shapes, ShapeGroups};

/// A loaded feed together with everything derived from it. Built once per load
/// and only read afterwards; a reload builds a new one.
#[derive(Debug)]
pub struct Schedule {
    pub feed: Feed,
    pub shapes: ShapeGroups,
    pub route_stop_index: RouteStopIndex,
    route_index_by_id: HashMap<RouteId, usize>,
    stop_index_by_id: HashMap<StopId, usize>,
    trip_index_by_id: HashMap<TripId, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct FeedStats {
    pub routes: usize,
    pub stops: usize,
    pub trips: usize,
}

impl Schedule {
    pub fn new(feed: Feed) -> Self {
        log::info!("Grouping {} shape points.", feed.shape_points.len());
        let shapes = group_shapes(&feed.shape_points);

        log::info!("Indexing stop names per route.");
        let route_stop_index = build_route_stop_index(&feed.trips, &feed.stops, &feed.stop_times);

        let route_index_by_id = index_by_id(&feed.routes, |route| route.id);
        let stop_index_by_id = index_by_id(&feed.stops, |stop| stop.id);
        let trip_index_by_id = index_by_id(&feed.trips, |trip| trip.id);

        let unresolved = feed
            .stop_times
            .iter()
            .filter(|st| {
                !stop_index_by_id.contains_key(&st.stop_id)
                    || !trip_index_by_id.contains_key(&st.trip_id)
            })
            .count();
        if unresolved > 0 {
            log::warn!(
                "{} stop times reference unknown stops or trips and will be ignored",
                unresolved
            );
        }

        Schedule {
            feed,
            shapes,
            route_stop_index,
            route_index_by_id,
            stop_index_by_id,
            trip_index_by_id,
        }
    }

    pub fn route(&self, id: RouteId) -> Option<&Route> {
        self.route_index_by_id
            .get(&id)
            .map(|i| &self.feed.routes[*i])
    }

    pub fn stop(&self, id: StopId) -> Option<&Stop> {
        self.stop_index_by_id.get(&id).map(|i| &self.feed.stops[*i])
    }

    pub fn trip(&self, id: TripId) -> Option<&Trip> {
        self.trip_index_by_id.get(&id).map(|i| &self.feed.trips[*i])
    }

    pub fn shape(&self, id: ShapeId) -> Option<&[ShapePoint]> {
        self.shapes.get(&id).map(|points| points.as_slice())
    }

    /// All stop times of one trip, sorted by `stop_sequence`. Scans the whole table.
    pub fn stop_times_for_trip(&self, trip_id: TripId) -> Vec<StopTime> {
        let mut stop_times: Vec<StopTime> = self
            .feed
            .stop_times
            .iter()
            .filter(|st| st.trip_id == trip_id)
            .cloned()
            .collect();
        stop_times.sort_by_key(|st| st.stop_sequence);
        stop_times
    }

    /// Every stop id whose name equals `name`, ignoring case. Several platforms
    /// often share one name.
    pub fn stop_ids_named(&self, name: &str) -> Vec<StopId> {
        let name = name.trim().to_lowercase();
        self.feed
            .stops
            .iter()
            .filter(|stop| stop.name.to_lowercase() == name)
            .map(|stop| stop.id)
            .collect()
    }

    pub fn stats(&self) -> FeedStats {
        FeedStats {
            routes: self.feed.routes.len(),
            stops: self.feed.stops.len(),
            trips: self.feed.trips.len(),
        }
    }
}

// Later duplicates win, like a map built from the table in file order.
fn index_by_id<T, K: std::hash::Hash + Eq>(
    items: &[T],
    key: impl Fn(&T) -> K,
) -> HashMap<K, usize> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| (key(item), i))
        .collect()
}

pub mod app_state;
pub mod clock;
pub mod direct_trips;
pub mod feed;
mod gtfs_archive;
pub mod ids;
pub mod interpolate;
pub mod load_feed;
pub mod route_index;
pub mod route_view;
pub mod schedule;
pub mod shapes;

pub use clock::ClockTime;
pub use direct_trips::{find_direct_trips, find_direct_trips_indexed, StopVisitIndex, TripMatch};
pub use feed::{Feed, Route, RouteType, ShapePoint, Stop, StopTime, Trip};
pub use ids::{RouteId, ServiceId, ShapeId, StopId, TripId};
pub use interpolate::interpolate_stop_times;
pub use load_feed::{load_feed, FeedSource, LoadError, Resource, TableSource};
pub use route_index::{build_route_stop_index, filter_routes, RouteStopIndex};
pub use route_view::{route_view, suggest_stops, RouteView};
pub use schedule::{FeedStats, Schedule};
pub use shapes::{group_shapes, ShapeGroups};

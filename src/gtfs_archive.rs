use std::path::{Path, PathBuf};

use crate::clock::ClockTime;
use crate::feed::*;
use crate::ids::{RouteId, ServiceId, ShapeId, StopId, TripId};
use crate::load_feed::{LoadError, Resource};

/// Reads a GTFS zip (or directory) through `gtfs_structures` on a blocking thread.
pub async fn load_archive(path: PathBuf) -> Result<Feed, LoadError> {
    tokio::task::spawn_blocking(move || feed_from_archive(&path)).await?
}

fn feed_from_archive(path: &Path) -> Result<Feed, LoadError> {
    log::info!("Loading GTFS archive from {:?}", path);
    let archive_err = |source| LoadError::Archive {
        path: path.to_path_buf(),
        source,
    };
    let gtfs = gtfs_structures::RawGtfs::from_path(path).map_err(archive_err)?;

    log::info!("Preparing routes.");
    let mut routes = vec![];
    for route in gtfs.routes.map_err(archive_err)? {
        routes.push(Route {
            id: RouteId::new(&route.id),
            short_name: route.short_name.clone().unwrap_or_default(),
            long_name: route.long_name.clone().unwrap_or_default(),
            route_type: match route.route_type {
                gtfs_structures::RouteType::Tramway => RouteType::Tramway,
                gtfs_structures::RouteType::Subway => RouteType::Subway,
                gtfs_structures::RouteType::Rail => RouteType::Rail,
                gtfs_structures::RouteType::Bus => RouteType::Bus,
                gtfs_structures::RouteType::Ferry => RouteType::Ferry,
                gtfs_structures::RouteType::CableCar => RouteType::CableCar,
                gtfs_structures::RouteType::Gondola => RouteType::Gondola,
                gtfs_structures::RouteType::Funicular => RouteType::Funicular,
                gtfs_structures::RouteType::Coach => RouteType::Coach,
                gtfs_structures::RouteType::Air => RouteType::Air,
                gtfs_structures::RouteType::Taxi => RouteType::Taxi,
                gtfs_structures::RouteType::Other(other) => RouteType::from_code(other),
            },
            // Colors are only read from plain route tables.
            color: None,
            text_color: None,
        });
    }

    log::info!("Preparing stops.");
    let mut stops = vec![];
    let mut without_position = 0;
    for stop in gtfs.stops.map_err(archive_err)? {
        let (Some(latitude), Some(longitude)) = (stop.latitude, stop.longitude) else {
            without_position += 1;
            continue;
        };
        stops.push(Stop {
            id: StopId::new(&stop.id),
            name: stop.name.clone().unwrap_or_default(),
            latitude,
            longitude,
            location_type: Some(match stop.location_type {
                gtfs_structures::LocationType::StopPoint => LocationType::StopPoint,
                gtfs_structures::LocationType::StopArea => LocationType::Station,
                gtfs_structures::LocationType::StationEntrance => LocationType::Entrance,
                gtfs_structures::LocationType::GenericNode => LocationType::GenericNode,
                gtfs_structures::LocationType::BoardingArea => LocationType::BoardingArea,
                gtfs_structures::LocationType::Unknown(code) => LocationType::Other(code),
            }),
        });
    }
    if without_position > 0 {
        log::warn!("Skipped {} stops without a position", without_position);
    }

    log::info!("Preparing trips.");
    let mut trips = vec![];
    for trip in gtfs.trips.map_err(archive_err)? {
        trips.push(Trip {
            id: TripId::new(&trip.id),
            route_id: RouteId::new(&trip.route_id),
            service_id: ServiceId::new(&trip.service_id),
            headsign: trip.trip_headsign.clone(),
            direction: trip.direction_id.map(|direction| match direction {
                gtfs_structures::DirectionType::Outbound => Direction::Outbound,
                gtfs_structures::DirectionType::Inbound => Direction::Inbound,
            }),
            shape_id: trip.shape_id.as_deref().map(ShapeId::new),
        });
    }

    log::info!("Preparing stop times.");
    let mut stop_times = vec![];
    for stop_time in gtfs.stop_times.map_err(archive_err)? {
        stop_times.push(StopTime {
            trip_id: TripId::new(&stop_time.trip_id),
            stop_id: StopId::new(&stop_time.stop_id),
            stop_sequence: u32::from(stop_time.stop_sequence),
            arrival_time: stop_time.arrival_time.map(ClockTime::from_seconds),
            departure_time: stop_time.departure_time.map(ClockTime::from_seconds),
        });
    }

    let mut shape_points = vec![];
    if let Some(shapes) = gtfs.shapes {
        log::info!("Preparing shapes.");
        for shape in shapes.map_err(archive_err)? {
            let sequence = u32::try_from(shape.sequence).map_err(|_| LoadError::Invalid {
                resource: Resource::Shapes,
                message: format!("shape_pt_sequence {} is out of range", shape.sequence),
            })?;
            shape_points.push(ShapePoint {
                shape_id: ShapeId::new(&shape.id),
                latitude: shape.latitude,
                longitude: shape.longitude,
                sequence,
            });
        }
    }

    Ok(Feed {
        routes,
        stops,
        trips,
        stop_times,
        shape_points,
    })
}

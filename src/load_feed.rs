use std::{
    fmt,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Deserialize, Deserializer};

use crate::clock::{deserialize_optional_clock, ClockTime};
use crate::feed::*;
use crate::gtfs_archive;
use crate::ids::{RouteId, ServiceId, ShapeId, StopId, TripId};

/// The five tables a feed is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Routes,
    Stops,
    Trips,
    StopTimes,
    Shapes,
}

impl Resource {
    pub fn file_name(self) -> &'static str {
        match self {
            Resource::Routes => "routes.txt",
            Resource::Stops => "stops.txt",
            Resource::Trips => "trips.txt",
            Resource::StopTimes => "stop_times.txt",
            Resource::Shapes => "shapes.txt",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {resource} from {path:?}")]
    Io {
        resource: Resource,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to fetch {resource} from {url}")]
    Http {
        resource: Resource,
        url: String,
        source: reqwest::Error,
    },
    #[error("malformed row in {resource}")]
    Malformed {
        resource: Resource,
        source: csv::Error,
    },
    #[error("invalid value in {resource}: {message}")]
    Invalid { resource: Resource, message: String },
    #[error("failed to read GTFS archive {path:?}")]
    Archive {
        path: PathBuf,
        source: gtfs_structures::Error,
    },
    #[error("feed loading task did not finish")]
    Task(#[from] tokio::task::JoinError),
}

/// Where the five tables come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    /// One CSV file per table, fetched and parsed independently.
    Tables(TableSource),
    /// A GTFS zip file or directory read in one pass through `gtfs_structures`.
    Archive(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    Directory(PathBuf),
    Http(String),
}

impl FeedSource {
    pub fn from_location(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            FeedSource::Tables(TableSource::Http(location.to_string()))
        } else if location.to_ascii_lowercase().ends_with(".zip") {
            FeedSource::Archive(PathBuf::from(location))
        } else {
            FeedSource::Tables(TableSource::Directory(PathBuf::from(location)))
        }
    }
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedSource::Tables(TableSource::Directory(path)) => write!(f, "{}", path.display()),
            FeedSource::Tables(TableSource::Http(url)) => f.write_str(url),
            FeedSource::Archive(path) => write!(f, "{} (archive)", path.display()),
        }
    }
}

impl TableSource {
    async fn fetch(&self, resource: Resource) -> Result<Vec<u8>, LoadError> {
        match self {
            TableSource::Directory(dir) => {
                let path = dir.join(resource.file_name());
                tokio::fs::read(&path)
                    .await
                    .map_err(|source| LoadError::Io {
                        resource,
                        path: path.clone(),
                        source,
                    })
            }
            TableSource::Http(base_url) => {
                let url = format!(
                    "{}/{}",
                    base_url.trim_end_matches('/'),
                    resource.file_name()
                );
                let http_err = |source| LoadError::Http {
                    resource,
                    url: url.clone(),
                    source,
                };
                let response = reqwest::get(&url)
                    .await
                    .and_then(|response| response.error_for_status())
                    .map_err(http_err)?;
                let bytes = response.bytes().await.map_err(http_err)?;
                Ok(bytes.to_vec())
            }
        }
    }
}

/// Loads the whole feed. Either all five tables load or the feed fails.
pub async fn load_feed(source: &FeedSource) -> Result<Feed, LoadError> {
    log::info!("Loading feed from {}", source);
    let feed = match source {
        FeedSource::Archive(path) => gtfs_archive::load_archive(path.clone()).await?,
        FeedSource::Tables(tables) => load_tables(tables).await?,
    };
    log::info!(
        "Loaded {} routes, {} stops, {} trips, {} stop times, {} shape points",
        feed.routes.len(),
        feed.stops.len(),
        feed.trips.len(),
        feed.stop_times.len(),
        feed.shape_points.len()
    );
    Ok(feed)
}

pub async fn load_feed_dir(dir: &Path) -> Result<Feed, LoadError> {
    load_feed(&FeedSource::Tables(TableSource::Directory(dir.to_path_buf()))).await
}

async fn load_tables(tables: &TableSource) -> Result<Feed, LoadError> {
    let (routes, stops, trips, stop_times, shapes) = futures::try_join!(
        load_resource::<RouteRecord>(tables, Resource::Routes),
        load_resource::<StopRecord>(tables, Resource::Stops),
        load_resource::<TripRecord>(tables, Resource::Trips),
        load_resource::<StopTimeRecord>(tables, Resource::StopTimes),
        load_resource::<ShapeRecord>(tables, Resource::Shapes),
    )?;

    Ok(Feed {
        routes: routes.into_iter().map(Route::from).collect(),
        stops: stops.into_iter().map(Stop::from).collect(),
        trips: trips.into_iter().map(Trip::from).collect(),
        stop_times: stop_times.into_iter().map(StopTime::from).collect(),
        shape_points: shapes.into_iter().map(ShapePoint::from).collect(),
    })
}

async fn load_resource<R: DeserializeOwned>(
    tables: &TableSource,
    resource: Resource,
) -> Result<Vec<R>, LoadError> {
    let bytes = tables.fetch(resource).await?;
    let records = parse_records(resource, &bytes)?;
    log::debug!("Parsed {} rows from {}", records.len(), resource);
    Ok(records)
}

/// Parses one table with its fixed schema. Blank lines are skipped; a row that
/// doesn't fit the schema fails the whole table.
pub fn parse_records<R: DeserializeOwned>(
    resource: Resource,
    bytes: &[u8],
) -> Result<Vec<R>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);
    let mut records = vec![];
    for rec in reader.deserialize() {
        let rec: R = rec.map_err(|source| LoadError::Malformed { resource, source })?;
        records.push(rec);
    }
    Ok(records)
}

#[derive(Deserialize)]
struct RouteRecord {
    route_id: RouteId,
    #[serde(default)]
    route_short_name: Option<String>,
    #[serde(default)]
    route_long_name: Option<String>,
    route_type: i16,
    #[serde(default)]
    route_color: Option<String>,
    #[serde(default)]
    route_text_color: Option<String>,
}

impl From<RouteRecord> for Route {
    fn from(rec: RouteRecord) -> Self {
        Route {
            id: rec.route_id,
            short_name: rec.route_short_name.unwrap_or_default(),
            long_name: rec.route_long_name.unwrap_or_default(),
            route_type: RouteType::from_code(rec.route_type),
            color: rec.route_color,
            text_color: rec.route_text_color,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StopRecord {
    stop_id: StopId,
    stop_name: String,
    stop_lat: f64,
    stop_lon: f64,
    #[serde(default)]
    location_type: Option<i16>,
}

impl From<StopRecord> for Stop {
    fn from(rec: StopRecord) -> Self {
        Stop {
            id: rec.stop_id,
            name: rec.stop_name,
            latitude: rec.stop_lat,
            longitude: rec.stop_lon,
            location_type: rec.location_type.map(LocationType::from_code),
        }
    }
}

#[derive(Deserialize)]
struct TripRecord {
    trip_id: TripId,
    route_id: RouteId,
    service_id: ServiceId,
    #[serde(default)]
    trip_headsign: Option<String>,
    #[serde(default, deserialize_with = "deserialize_direction")]
    direction_id: Option<Direction>,
    #[serde(default)]
    shape_id: Option<ShapeId>,
}

impl From<TripRecord> for Trip {
    fn from(rec: TripRecord) -> Self {
        Trip {
            id: rec.trip_id,
            route_id: rec.route_id,
            service_id: rec.service_id,
            headsign: rec.trip_headsign,
            direction: rec.direction_id,
            shape_id: rec.shape_id,
        }
    }
}

fn deserialize_direction<'de, D>(deserializer: D) -> Result<Option<Direction>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<u8>::deserialize(deserializer)? {
        None => Ok(None),
        Some(0) => Ok(Some(Direction::Outbound)),
        Some(1) => Ok(Some(Direction::Inbound)),
        Some(other) => Err(serde::de::Error::custom(format!(
            "unknown direction_id {other}"
        ))),
    }
}

#[derive(Deserialize)]
struct StopTimeRecord {
    trip_id: TripId,
    stop_id: StopId,
    stop_sequence: u32,
    #[serde(default, deserialize_with = "deserialize_optional_clock")]
    arrival_time: Option<ClockTime>,
    #[serde(default, deserialize_with = "deserialize_optional_clock")]
    departure_time: Option<ClockTime>,
}

impl From<StopTimeRecord> for StopTime {
    fn from(rec: StopTimeRecord) -> Self {
        StopTime {
            trip_id: rec.trip_id,
            stop_id: rec.stop_id,
            stop_sequence: rec.stop_sequence,
            arrival_time: rec.arrival_time,
            departure_time: rec.departure_time,
        }
    }
}

#[derive(Deserialize)]
struct ShapeRecord {
    shape_id: ShapeId,
    shape_pt_lat: f64,
    shape_pt_lon: f64,
    shape_pt_sequence: u32,
}

impl From<ShapeRecord> for ShapePoint {
    fn from(rec: ShapeRecord) -> Self {
        ShapePoint {
            shape_id: rec.shape_id,
            latitude: rec.shape_pt_lat,
            longitude: rec.shape_pt_lon,
            sequence: rec.shape_pt_sequence,
        }
    }
}

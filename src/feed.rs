use serde::Serialize;

use crate::clock::ClockTime;
use crate::ids::{RouteId, ServiceId, ShapeId, StopId, TripId};

/// The five raw tables of a static feed, exactly as loaded.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    pub routes: Vec<Route>,
    pub stops: Vec<Stop>,
    pub trips: Vec<Trip>,
    pub stop_times: Vec<StopTime>,
    pub shape_points: Vec<ShapePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub id: RouteId,
    pub short_name: String,
    pub long_name: String,
    pub route_type: RouteType,
    pub color: Option<String>,
    pub text_color: Option<String>,
}

impl Route {
    pub fn describe(&self) -> String {
        match (self.short_name.is_empty(), self.long_name.is_empty()) {
            (false, false) => format!("{} {}", self.short_name, self.long_name),
            (false, true) => self.short_name.clone(),
            (true, false) => self.long_name.clone(),
            (true, true) => self.id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RouteType {
    Tramway,
    Subway,
    Rail,
    Bus,
    Ferry,
    CableCar,
    Gondola,
    Funicular,
    Trolleybus,
    Monorail,
    Coach,
    Air,
    Taxi,
    Other(i16),
}

impl RouteType {
    pub fn from_code(code: i16) -> Self {
        match code {
            0 => RouteType::Tramway,
            1 => RouteType::Subway,
            2 => RouteType::Rail,
            3 => RouteType::Bus,
            4 => RouteType::Ferry,
            5 => RouteType::CableCar,
            6 => RouteType::Gondola,
            7 => RouteType::Funicular,
            11 => RouteType::Trolleybus,
            12 => RouteType::Monorail,
            200..=299 => RouteType::Coach,
            1100..=1199 => RouteType::Air,
            1500..=1599 => RouteType::Taxi,
            other => RouteType::Other(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_type: Option<LocationType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LocationType {
    StopPoint,
    Station,
    Entrance,
    GenericNode,
    BoardingArea,
    Other(i16),
}

impl LocationType {
    pub fn from_code(code: i16) -> Self {
        match code {
            0 => LocationType::StopPoint,
            1 => LocationType::Station,
            2 => LocationType::Entrance,
            3 => LocationType::GenericNode,
            4 => LocationType::BoardingArea,
            other => LocationType::Other(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trip {
    pub id: TripId,
    pub route_id: RouteId,
    pub service_id: ServiceId,
    pub headsign: Option<String>,
    pub direction: Option<Direction>,
    pub shape_id: Option<ShapeId>,
}

/// GTFS `direction_id`: 0 is outbound, 1 is inbound. Which is which is arbitrary per feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    Outbound,
    Inbound,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapePoint {
    pub shape_id: ShapeId,
    pub latitude: f64,
    pub longitude: f64,
    pub sequence: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopTime {
    pub trip_id: TripId,
    pub stop_id: StopId,
    pub stop_sequence: u32,
    pub arrival_time: Option<ClockTime>,
    pub departure_time: Option<ClockTime>,
}

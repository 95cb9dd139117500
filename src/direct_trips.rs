use std::collections::{HashMap, HashSet};

use indicatif::ProgressIterator;
use serde::Serialize;

use crate::clock::ClockTime;
use crate::feed::{Route, StopTime, Trip};
use crate::ids::{StopId, TripId};
use crate::interpolate::interpolate_stop_times;
use crate::schedule::Schedule;

/// One trip that goes from a stop named like the start to a later stop named like
/// the end, without changing vehicles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripMatch<'a> {
    pub route: &'a Route,
    pub trip: &'a Trip,
    pub start_stop: StopId,
    pub end_stop: StopId,
    pub start_time: Option<ClockTime>,
    pub end_time: Option<ClockTime>,
}

/// Finds every direct trip from `start_name` to `end_name` by scanning the stop
/// time table. Each trip is reported at most once, and the end has to come
/// strictly after the start within the trip. Sorted by start time.
pub fn find_direct_trips<'a>(
    schedule: &'a Schedule,
    start_name: &str,
    end_name: &str,
) -> Vec<TripMatch<'a>> {
    let Some((start_ids, end_ids)) = resolve_names(schedule, start_name, end_name) else {
        return vec![];
    };

    let mut matched_trips = HashSet::new();
    let mut matches = vec![];
    for start in schedule
        .feed
        .stop_times
        .iter()
        .filter(|st| start_ids.contains(&st.stop_id))
    {
        if matched_trips.contains(&start.trip_id) {
            continue;
        }
        let trip_stop_times = schedule.stop_times_for_trip(start.trip_id);
        let Some(end) = trip_stop_times
            .iter()
            .find(|st| end_ids.contains(&st.stop_id) && st.stop_sequence > start.stop_sequence)
        else {
            continue;
        };
        if let Some(found) = build_match(schedule, &trip_stop_times, start, end) {
            matched_trips.insert(start.trip_id);
            matches.push(found);
        }
    }

    sort_by_start_time(&mut matches);
    log::debug!(
        "{} direct trips from {:?} to {:?}",
        matches.len(),
        start_name,
        end_name
    );
    matches
}

fn resolve_names(
    schedule: &Schedule,
    start_name: &str,
    end_name: &str,
) -> Option<(HashSet<StopId>, HashSet<StopId>)> {
    let start_ids: HashSet<StopId> = schedule.stop_ids_named(start_name).into_iter().collect();
    let end_ids: HashSet<StopId> = schedule.stop_ids_named(end_name).into_iter().collect();
    if start_ids.is_empty() || end_ids.is_empty() {
        log::debug!(
            "No stops named {:?} ({}) or {:?} ({})",
            start_name,
            start_ids.len(),
            end_name,
            end_ids.len()
        );
        return None;
    }
    Some((start_ids, end_ids))
}

/// Interpolates the whole trip and reads the times of the chosen start and end.
/// `None` if the trip or its route are unknown.
fn build_match<'a>(
    schedule: &'a Schedule,
    trip_stop_times: &[StopTime],
    start: &StopTime,
    end: &StopTime,
) -> Option<TripMatch<'a>> {
    let trip = schedule.trip(start.trip_id)?;
    let route = schedule.route(trip.route_id)?;
    let interpolated = interpolate_stop_times(trip_stop_times);
    let time_at = |sequence: u32| {
        interpolated
            .iter()
            .find(|st| st.stop_sequence == sequence)
            .and_then(|st| st.arrival_time.or(st.departure_time))
    };
    Some(TripMatch {
        route,
        trip,
        start_stop: start.stop_id,
        end_stop: end.stop_id,
        start_time: time_at(start.stop_sequence),
        end_time: time_at(end.stop_sequence),
    })
}

// Stable, so trips leaving at the same time keep the order they were found in.
// Trips without a known start time come first.
fn sort_by_start_time(matches: &mut [TripMatch<'_>]) {
    matches.sort_by_key(|found| found.start_time);
}

/// Precomputed visits per stop, so a search only looks at trips that actually
/// serve the start stop instead of rescanning every stop time.
pub struct StopVisitIndex {
    // Trips in the order they first appear in the stop time table, each with its
    // stop times sorted by sequence.
    trips: Vec<(TripId, Vec<StopTime>)>,
    visits: HashMap<StopId, Vec<StopVisit>>,
}

#[derive(Debug, Clone, Copy)]
struct StopVisit {
    trip_slot: usize,
    /// Position in the trip's sorted stop times.
    position: usize,
    /// Row in the stop time table.
    row: usize,
}

fn progress_style() -> indicatif::ProgressStyle {
    indicatif::ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {human_pos:>7}/{human_len:7} {msg}",
    )
    .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
}

impl StopVisitIndex {
    pub fn build(schedule: &Schedule) -> Self {
        let style = progress_style();

        let mut slot_by_trip = HashMap::new();
        let mut rows_by_trip: Vec<(TripId, Vec<(usize, StopTime)>)> = vec![];
        for (row, stop_time) in schedule
            .feed
            .stop_times
            .iter()
            .enumerate()
            .progress_with_style(style.clone())
            .with_message("Find stop times for each trip.")
            .with_finish(indicatif::ProgressFinish::AndLeave)
        {
            let slot = *slot_by_trip.entry(stop_time.trip_id).or_insert_with(|| {
                rows_by_trip.push((stop_time.trip_id, vec![]));
                rows_by_trip.len() - 1
            });
            rows_by_trip[slot].1.push((row, stop_time.clone()));
        }

        let mut trips = Vec::with_capacity(rows_by_trip.len());
        let mut visits: HashMap<StopId, Vec<StopVisit>> = HashMap::new();
        for (trip_slot, (trip_id, mut rows)) in rows_by_trip
            .into_iter()
            .enumerate()
            .progress_with_style(style)
            .with_message("Remember visits by stop id.")
            .with_finish(indicatif::ProgressFinish::AndLeave)
        {
            rows.sort_by_key(|(_, st)| st.stop_sequence);
            for (position, (row, stop_time)) in rows.iter().enumerate() {
                visits
                    .entry(stop_time.stop_id)
                    .or_default()
                    .push(StopVisit {
                        trip_slot,
                        position,
                        row: *row,
                    });
            }
            trips.push((trip_id, rows.into_iter().map(|(_, st)| st).collect()));
        }

        log::info!(
            "Indexed {} stops visited by {} trips",
            visits.len(),
            trips.len()
        );
        StopVisitIndex { trips, visits }
    }

    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }

    /// The stop times of one trip, sorted by sequence.
    pub fn stop_times(&self, trip_id: TripId) -> Option<&[StopTime]> {
        self.trips
            .iter()
            .find(|(id, _)| *id == trip_id)
            .map(|(_, stop_times)| stop_times.as_slice())
    }
}

/// Same result as [`find_direct_trips`], answered from a [`StopVisitIndex`].
/// Start visits are tried in stop time table order, like the scan does.
pub fn find_direct_trips_indexed<'a>(
    schedule: &'a Schedule,
    index: &StopVisitIndex,
    start_name: &str,
    end_name: &str,
) -> Vec<TripMatch<'a>> {
    let Some((start_ids, end_ids)) = resolve_names(schedule, start_name, end_name) else {
        return vec![];
    };

    let mut start_visits: Vec<StopVisit> = start_ids
        .iter()
        .filter_map(|stop_id| index.visits.get(stop_id))
        .flatten()
        .copied()
        .collect();
    start_visits.sort_by_key(|visit| visit.row);

    let mut matched_slots = HashSet::new();
    let mut matches = vec![];
    for visit in start_visits {
        if matched_slots.contains(&visit.trip_slot) {
            continue;
        }
        let stop_times = &index.trips[visit.trip_slot].1;
        let start = &stop_times[visit.position];
        let Some(end) = stop_times[visit.position + 1..]
            .iter()
            .find(|st| end_ids.contains(&st.stop_id) && st.stop_sequence > start.stop_sequence)
        else {
            continue;
        };
        if let Some(found) = build_match(schedule, stop_times, start, end) {
            matched_slots.insert(visit.trip_slot);
            matches.push(found);
        }
    }

    sort_by_start_time(&mut matches);
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::*;
    use crate::ids::{RouteId, ServiceId};

    fn stop(id: &str, name: &str) -> Stop {
        Stop {
            id: StopId::new(id),
            name: name.to_string(),
            latitude: 15.0,
            longitude: 74.0,
            location_type: None,
        }
    }

    fn trip(id: &str, route_id: &str) -> Trip {
        Trip {
            id: TripId::new(id),
            route_id: RouteId::new(route_id),
            service_id: ServiceId::new("WK"),
            headsign: None,
            direction: None,
            shape_id: None,
        }
    }

    fn stop_time(trip_id: &str, stop_id: &str, sequence: u32, time: Option<&str>) -> StopTime {
        let time = time.map(|t| ClockTime::parse(t).unwrap());
        StopTime {
            trip_id: TripId::new(trip_id),
            stop_id: StopId::new(stop_id),
            stop_sequence: sequence,
            arrival_time: time,
            departure_time: time,
        }
    }

    fn route(id: &str) -> Route {
        Route {
            id: RouteId::new(id),
            short_name: id.to_string(),
            long_name: String::new(),
            route_type: RouteType::Bus,
            color: None,
            text_color: None,
        }
    }

    fn goa() -> Schedule {
        Schedule::new(Feed {
            routes: vec![route("R1"), route("R2")],
            stops: vec![
                stop("P1", "Panaji"),
                stop("P2", "Panaji"),
                stop("X", "Cortalim"),
                stop("M1", "Margao"),
                stop("V", "Vasco"),
            ],
            trips: vec![
                trip("T1", "R1"),
                trip("T2", "R1"),
                trip("T3", "R2"),
                trip("T4", "R2"),
                trip("T5", "R404"),
            ],
            stop_times: vec![
                // Panaji (P1) then Margao, with a gap to interpolate.
                stop_time("T1", "P1", 2, Some("09:00:00")),
                stop_time("T1", "X", 3, None),
                stop_time("T1", "M1", 5, Some("10:00:00")),
                // Only visits them in the reverse order.
                stop_time("T2", "M1", 1, Some("07:00:00")),
                stop_time("T2", "P2", 2, Some("08:00:00")),
                // Other platform, earlier departure.
                stop_time("T3", "P2", 1, Some("06:15:00")),
                stop_time("T3", "V", 2, Some("06:40:00")),
                stop_time("T3", "M1", 3, Some("07:30:00")),
                // Loop: Panaji twice, Margao once.
                stop_time("T4", "P1", 1, Some("11:00:00")),
                stop_time("T4", "M1", 2, Some("11:45:00")),
                stop_time("T4", "P2", 3, Some("12:30:00")),
                // Its route is missing, so it contributes nothing.
                stop_time("T5", "P1", 1, Some("05:00:00")),
                stop_time("T5", "M1", 2, Some("05:30:00")),
            ],
            shape_points: vec![],
        })
    }

    fn trip_ids(matches: &[TripMatch<'_>]) -> Vec<String> {
        matches.iter().map(|m| m.trip.id.to_string()).collect()
    }

    #[test]
    fn finds_trips_across_platforms_sorted_by_start() {
        let schedule = goa();
        let matches = find_direct_trips(&schedule, "Panaji", "Margao");
        assert_eq!(trip_ids(&matches), vec!["T3", "T1", "T4"]);
        assert_eq!(matches[0].start_stop, StopId::new("P2"));
        assert_eq!(matches[1].start_stop, StopId::new("P1"));
        assert_eq!(matches[1].start_time, Some(ClockTime::from_hms(9, 0, 0)));
        assert_eq!(matches[1].end_time, Some(ClockTime::from_hms(10, 0, 0)));
        assert_eq!(matches[1].route.id, RouteId::new("R1"));
    }

    #[test]
    fn end_must_come_after_start() {
        let schedule = goa();
        let matches = find_direct_trips(&schedule, "Margao", "Panaji");
        // T2 goes Margao -> Panaji, T4 loops back to Panaji. T1 and T3 only go the other way.
        assert_eq!(trip_ids(&matches), vec!["T2", "T4"]);
        for found in &matches {
            assert!(found.start_time < found.end_time);
        }
    }

    #[test]
    fn each_trip_matches_once() {
        let schedule = goa();
        let matches = find_direct_trips(&schedule, "Panaji", "Panaji");
        assert_eq!(trip_ids(&matches), vec!["T4"]);
        let unique: HashSet<TripId> = matches.iter().map(|m| m.trip.id).collect();
        assert_eq!(unique.len(), matches.len());
    }

    #[test]
    fn uses_interpolated_times() {
        let schedule = goa();
        let matches = find_direct_trips(&schedule, "Cortalim", "margao");
        assert_eq!(trip_ids(&matches), vec!["T1"]);
        assert_eq!(matches[0].start_time, Some(ClockTime::from_hms(9, 30, 0)));
    }

    #[test]
    fn unknown_names_give_no_matches() {
        let schedule = goa();
        assert!(find_direct_trips(&schedule, "Panaji", "Mapusa").is_empty());
        assert!(find_direct_trips(&schedule, "", "Margao").is_empty());
    }

    #[test]
    fn indexed_search_agrees_with_scan() {
        let schedule = goa();
        let index = StopVisitIndex::build(&schedule);
        assert_eq!(index.trip_count(), 5);
        for (from, to) in [
            ("Panaji", "Margao"),
            ("Margao", "Panaji"),
            ("Panaji", "Panaji"),
            ("Cortalim", "Margao"),
            ("Vasco", "Panaji"),
            ("Panaji", "Mapusa"),
        ] {
            assert_eq!(
                find_direct_trips_indexed(&schedule, &index, from, to),
                find_direct_trips(&schedule, from, to),
                "{from} -> {to}"
            );
        }
    }

    #[test]
    fn index_keeps_trip_stop_times_sorted() {
        let schedule = goa();
        let index = StopVisitIndex::build(&schedule);
        let sequences: Vec<u32> = index
            .stop_times(TripId::new("T1"))
            .unwrap()
            .iter()
            .map(|st| st.stop_sequence)
            .collect();
        assert_eq!(sequences, vec![2, 3, 5]);
        assert!(index.stop_times(TripId::new("nope")).is_none());
    }

    #[test]
    fn indexed_search_follows_table_order_for_interleaved_trips() {
        let schedule = Schedule::new(Feed {
            routes: vec![route("R1")],
            stops: vec![
                stop("Z", "Zuari"),
                stop("A", "Agacaim"),
                stop("B", "Bambolim"),
            ],
            trips: vec![trip("T1", "R1"), trip("T2", "R1")],
            stop_times: vec![
                stop_time("T1", "Z", 1, Some("07:00:00")),
                stop_time("T2", "A", 1, Some("08:00:00")),
                stop_time("T1", "A", 2, Some("08:00:00")),
                stop_time("T2", "B", 2, Some("09:00:00")),
                stop_time("T1", "B", 3, Some("09:00:00")),
            ],
            shape_points: vec![],
        });
        let index = StopVisitIndex::build(&schedule);

        let scanned = find_direct_trips(&schedule, "Agacaim", "Bambolim");
        // Same start time, so the order the start rows appear in decides.
        assert_eq!(trip_ids(&scanned), vec!["T2", "T1"]);
        assert_eq!(
            find_direct_trips_indexed(&schedule, &index, "Agacaim", "Bambolim"),
            scanned
        );
    }

    #[test]
    fn indexed_search_uses_first_start_row_of_unordered_trip() {
        // The trip's rows are out of sequence order in the table.
        let schedule = Schedule::new(Feed {
            routes: vec![route("R1")],
            stops: vec![
                stop("P1", "Panaji"),
                stop("P2", "Panaji"),
                stop("M1", "Margao"),
            ],
            trips: vec![trip("T1", "R1")],
            stop_times: vec![
                stop_time("T1", "P2", 3, Some("09:00:00")),
                stop_time("T1", "M1", 4, Some("10:00:00")),
                stop_time("T1", "P1", 1, Some("07:00:00")),
                stop_time("T1", "M1", 2, Some("08:00:00")),
            ],
            shape_points: vec![],
        });
        let index = StopVisitIndex::build(&schedule);

        let scanned = find_direct_trips(&schedule, "Panaji", "Margao");
        assert_eq!(scanned.len(), 1);
        assert_eq!(scanned[0].start_stop, StopId::new("P2"));
        assert_eq!(scanned[0].start_time, Some(ClockTime::from_hms(9, 0, 0)));
        assert_eq!(
            find_direct_trips_indexed(&schedule, &index, "Panaji", "Margao"),
            scanned
        );
    }

    #[test]
    fn times_come_from_the_chosen_visit_when_a_stop_repeats() {
        // Margao is visited before and after Panaji.
        let schedule = Schedule::new(Feed {
            routes: vec![route("R1")],
            stops: vec![stop("P1", "Panaji"), stop("M1", "Margao")],
            trips: vec![trip("T1", "R1")],
            stop_times: vec![
                stop_time("T1", "M1", 1, Some("06:00:00")),
                stop_time("T1", "P1", 2, None),
                stop_time("T1", "M1", 3, Some("07:00:00")),
            ],
            shape_points: vec![],
        });
        let matches = find_direct_trips(&schedule, "Panaji", "Margao");
        assert_eq!(trip_ids(&matches), vec!["T1"]);
        assert_eq!(matches[0].start_time, Some(ClockTime::from_hms(6, 30, 0)));
        assert_eq!(matches[0].end_time, Some(ClockTime::from_hms(7, 0, 0)));
    }
}

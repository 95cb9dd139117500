use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use transit_schedule::app_state::{deep_link_query, reduce, Action, AppState};
use transit_schedule::{
    filter_routes, find_direct_trips, find_direct_trips_indexed, load_feed, route_view,
    suggest_stops, ClockTime, FeedSource, RouteId, Schedule, StopVisitIndex, TripId, TripMatch,
};

#[derive(Parser, Debug)]
#[command(
    name = "transit-schedule",
    version,
    about = "Browse the static schedule of a transit feed"
)]
struct Args {
    /// A directory with the feed's tables, an http(s) URL they live under, or a GTFS .zip
    #[arg(long, env = "TRANSIT_FEED", default_value = "gtfs")]
    feed: String,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Show debug messages
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count routes, stops and trips
    Stats,
    /// List routes, optionally only those matching a route or stop name
    Routes {
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one trip of a route with its stops and times
    Route {
        route_id: String,
        /// Show this trip instead of the route's first one
        #[arg(long)]
        trip: Option<String>,
    },
    /// Suggest stops by name
    Stops {
        query: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Find direct trips between two stop names
    Trips {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// Build a stop visit index first instead of scanning all stop times
        #[arg(long)]
        indexed: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    simple_logger::SimpleLogger::new()
        .with_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .env()
        .init()?;

    let source = FeedSource::from_location(&args.feed);
    let feed = load_feed(&source)
        .await
        .context("Failed to load data.")?;
    let schedule = Schedule::new(feed);

    match args.command {
        Command::Stats => {
            let stats = schedule.stats();
            if args.json {
                return print_json(&stats);
            }
            println!("Routes: {}", stats.routes);
            println!("Stops:  {}", stats.stops);
            println!("Trips:  {}", stats.trips);
        }
        Command::Routes { search } => {
            let routes = filter_routes(
                &schedule.feed.routes,
                &schedule.route_stop_index,
                search.as_deref().unwrap_or(""),
            );
            if args.json {
                return print_json(&routes);
            }
            for route in routes {
                println!("{:>8}  {}  ({})", route.short_name, route.long_name, route.id);
            }
        }
        Command::Route { route_id, trip } => {
            let state = reduce(
                &AppState::default(),
                Action::SelectRoute {
                    route: RouteId::new(&route_id),
                    trip: trip.as_deref().map(TripId::new),
                },
            );
            let view = state
                .selected_route
                .and_then(|route| route_view(&schedule, route, state.selected_trip))
                .with_context(|| format!("No trips for route {route_id}"))?;
            if args.json {
                return print_json(&view);
            }
            println!("{}", view.route.describe());
            println!(
                "Trip {}{}",
                view.trip.id,
                view.trip
                    .headsign
                    .as_ref()
                    .map(|headsign| format!(" to {headsign}"))
                    .unwrap_or_default()
            );
            if let (Some(first), Some(last)) = (view.first_stop(), view.last_stop()) {
                println!("{} -> {}", first.stop.name, last.stop.name);
            }
            println!("{} shape points", view.shape.len());
            for stop in &view.stops {
                println!(
                    "{:>9}  {}",
                    stop.arrival_display.as_deref().unwrap_or("--"),
                    stop.stop.name
                );
            }
            if let Some(query) = deep_link_query(&state) {
                println!("Link: ?{query}");
            }
        }
        Command::Stops { query, limit } => {
            let stops = suggest_stops(&schedule.feed.stops, &query, limit);
            if args.json {
                return print_json(&stops);
            }
            for stop in stops {
                println!("{}  ({})", stop.name, stop.id);
            }
        }
        Command::Trips { from, to, indexed } => {
            let matches = if indexed {
                let index = StopVisitIndex::build(&schedule);
                find_direct_trips_indexed(&schedule, &index, &from, &to)
            } else {
                find_direct_trips(&schedule, &from, &to)
            };
            if args.json {
                return print_json(&matches);
            }
            if matches.is_empty() {
                println!("No direct trips from {from} to {to}.");
            }
            for found in &matches {
                print_trip_match(found);
            }
        }
    }

    Ok(())
}

fn print_trip_match(found: &TripMatch<'_>) {
    let show = |time: Option<ClockTime>| {
        time.map(ClockTime::to_am_pm)
            .unwrap_or_else(|| "--".to_string())
    };
    println!(
        "{:>9} -> {:<9}  {}  (trip {})",
        show(found.start_time),
        show(found.end_time),
        found.route.describe(),
        found.trip.id
    );
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

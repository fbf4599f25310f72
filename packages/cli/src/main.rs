#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line runner for the citysafe engine.
//!
//! Every command reads hotspots from a JSON file of raw prediction points
//! (or the embedded Chennai sample set) and prints its result as JSON.
//! With no subcommand an interactive menu is shown instead.

mod input;
mod interactive;
mod replay;

use std::{collections::BTreeSet, path::PathBuf};

use chrono::Utc;
use citysafe_config::EngineConfig;
use citysafe_geometry::Coordinate;
use citysafe_hotspot::count_level;
use citysafe_hotspot_models::RiskLevel;
use citysafe_patrol::PatrolRequest;
use citysafe_patrol_models::PatrolShift;
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::input::{load_hotspots, parse_coordinate, parse_shift, resolve_position};

#[derive(Parser)]
#[command(name = "citysafe", about = "Crime hotspot patrol and safe-route engine")]
struct Cli {
    /// Engine configuration file (TOML). Falls back to `CITYSAFE_CONFIG`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Raw hotspot predictions (JSON array). Defaults to the Chennai sample.
    #[arg(long, global = true)]
    hotspots: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the service areas used for patrol filtering
    Areas,
    /// Classify and list hotspots
    Hotspots,
    /// Plan a patrol route from a starting position
    Patrol {
        /// Current position as "lat,lng"
        #[arg(long, value_parser = parse_coordinate)]
        location: Option<Coordinate>,
        /// Position to use when no current position is given
        #[arg(long, value_parser = parse_coordinate)]
        fallback: Option<Coordinate>,
        /// Maximum hotspot stops (defaults to the configured value)
        #[arg(long)]
        max_stops: Option<usize>,
        /// Shift the route is planned for (morning, afternoon, evening, night)
        #[arg(long, default_value = "morning", value_parser = parse_shift)]
        shift: PatrolShift,
        /// Officer or unit to assign (repeatable)
        #[arg(long = "assign")]
        assigned: Vec<String>,
    },
    /// Plan a citizen route that detours around a risky midpoint
    SafeRoute {
        /// Starting position as "lat,lng"
        #[arg(long, value_parser = parse_coordinate)]
        from: Option<Coordinate>,
        /// Position to use when no starting position is given
        #[arg(long, value_parser = parse_coordinate)]
        fallback: Option<Coordinate>,
        /// Destination as "lat,lng"
        #[arg(long, value_parser = parse_coordinate)]
        to: Coordinate,
        /// Also list hotspots near the planned route
        #[arg(long)]
        along: bool,
    },
    /// Replay a recorded position track through the geofence monitor
    Monitor {
        /// Track file: JSON array of `{"atSecs", "lat", "lng"}` polls
        #[arg(long)]
        track: PathBuf,
        /// Monitored subject identifier
        #[arg(long, default_value = "subject")]
        subject: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => EngineConfig::load_from_path(path)?,
        None => EngineConfig::load_from_env()?,
    };

    let Some(command) = cli.command else {
        return interactive::run(&config).await;
    };

    match command {
        Commands::Areas => {
            println!("{:<12} {:<16} {:>10} {:>10} {:>8}", "ID", "NAME", "LAT", "LNG", "KM");
            println!("{}", "-".repeat(60));
            for area in config.service_areas() {
                println!(
                    "{:<12} {:<16} {:>10.4} {:>10.4} {:>8.1}",
                    area.id, area.name, area.center_lat, area.center_lng, area.radius_km
                );
            }
        }
        Commands::Hotspots => {
            let hotspots = load_hotspots(cli.hotspots.as_deref()).await?;
            log::info!(
                "{} hotspots: {} high, {} medium, {} low",
                hotspots.len(),
                count_level(&hotspots, RiskLevel::High),
                count_level(&hotspots, RiskLevel::Medium),
                count_level(&hotspots, RiskLevel::Low),
            );
            print_json(&hotspots)?;
        }
        Commands::Patrol {
            location,
            fallback,
            max_stops,
            shift,
            assigned,
        } => {
            let start = resolve_position(location, fallback).await?;
            let hotspots = load_hotspots(cli.hotspots.as_deref()).await?;
            let request = PatrolRequest {
                max_stops,
                shift,
                assigned_subjects: assigned.into_iter().collect::<BTreeSet<_>>(),
            };
            let route = config
                .patrol_optimizer()
                .optimize(start, &hotspots, &request)?;
            print_json(&route)?;
        }
        Commands::SafeRoute {
            from,
            fallback,
            to,
            along,
        } => {
            let source = resolve_position(from, fallback).await?;
            let hotspots = load_hotspots(cli.hotspots.as_deref()).await?;
            let planner = config.safe_route_planner();
            let route = planner.plan_route(source, to, &hotspots)?;

            if along {
                let nearby = planner.hotspots_along(&route, &hotspots);
                print_json(&serde_json::json!({ "route": route, "hotspotsAlongRoute": nearby }))?;
            } else {
                print_json(&route)?;
            }
        }
        Commands::Monitor { track, subject } => {
            let hotspots = load_hotspots(cli.hotspots.as_deref()).await?;
            let fixes: Vec<replay::TrackFix> =
                serde_json::from_str(&std::fs::read_to_string(&track)?)?;
            let report = replay::replay(&subject, &fixes, &hotspots, &config.geofence, Utc::now());
            for event in &report.events {
                log::warn!("{event}");
            }
            print_json(&report)?;
        }
    }

    Ok(())
}

fn print_json(value: &impl Serialize) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

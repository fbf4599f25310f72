//! Interactive menu for running the engine against the sample hotspots.

use citysafe_config::EngineConfig;
use citysafe_geometry::Coordinate;
use citysafe_hotspot::sample::sample_hotspots;
use citysafe_patrol::PatrolRequest;
use citysafe_patrol_models::PatrolShift;
use dialoguer::{Confirm, Input, Select};

use crate::{input::resolve_position, print_json};

/// Top-level actions available in the interactive menu.
enum Action {
    PlanPatrol,
    PlanSafeRoute,
    ListHotspots,
    ListAreas,
}

impl Action {
    const ALL: &[Self] = &[
        Self::PlanPatrol,
        Self::PlanSafeRoute,
        Self::ListHotspots,
        Self::ListAreas,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::PlanPatrol => "Plan a patrol route",
            Self::PlanSafeRoute => "Plan a safe route",
            Self::ListHotspots => "List sample hotspots",
            Self::ListAreas => "List service areas",
        }
    }
}

const SHIFTS: &[PatrolShift] = &[
    PatrolShift::Morning,
    PatrolShift::Afternoon,
    PatrolShift::Evening,
    PatrolShift::Night,
];

/// Runs the menu once against the embedded sample hotspots.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected computation fails.
pub async fn run(config: &EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Citysafe");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::PlanPatrol => plan_patrol(config).await?,
        Action::PlanSafeRoute => plan_safe_route(config).await?,
        Action::ListHotspots => print_json(&sample_hotspots())?,
        Action::ListAreas => {
            for area in config.service_areas() {
                println!("{:<12} {} ({} km)", area.id, area.name, area.radius_km);
            }
        }
    }

    Ok(())
}

async fn plan_patrol(config: &EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let start = prompt_position("Current location (lat,lng)", "13.0827,80.2707").await?;

    let max_stops: usize = Input::new()
        .with_prompt("Maximum stops")
        .default(config.patrol.max_stops)
        .validate_with(|n: &usize| validate_max_stops(*n))
        .interact_text()?;

    let shift_labels: Vec<String> = SHIFTS.iter().map(ToString::to_string).collect();
    let shift_idx = Select::new()
        .with_prompt("Shift")
        .items(&shift_labels)
        .default(0)
        .interact()?;

    let request = PatrolRequest {
        max_stops: Some(max_stops),
        shift: SHIFTS[shift_idx],
        ..PatrolRequest::default()
    };
    let route = config
        .patrol_optimizer()
        .optimize(start, &sample_hotspots(), &request)?;

    println!(
        "{}: {} stops, {:.2} km, {:.0} min, efficiency {}",
        route.name,
        route.hotspot_stops().count(),
        route.total_distance_km,
        route.estimated_duration_min,
        route.efficiency_score
    );
    if Confirm::new()
        .with_prompt("Print full route as JSON?")
        .default(false)
        .interact()?
    {
        print_json(&route)?;
    }

    Ok(())
}

async fn plan_safe_route(config: &EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let source = prompt_position("From (lat,lng)", "13.0827,80.2707").await?;
    let destination = prompt_position("To (lat,lng)", "13.0064,80.2206").await?;

    let hotspots = sample_hotspots();
    let planner = config.safe_route_planner();
    let route = planner.plan_route(source, destination, &hotspots)?;

    match &route.detour {
        Some(detour) => println!(
            "Detour {} via {} to avoid high-risk hotspots: {:.2} km",
            detour.heading, detour.coordinate, route.distance_km
        ),
        None => println!("Direct route is clear: {:.2} km", route.distance_km),
    }
    for hotspot in planner.hotspots_along(&route, &hotspots) {
        println!(
            "  near route: {} ({}, intensity {:.2})",
            hotspot.area, hotspot.risk_level, hotspot.intensity
        );
    }

    Ok(())
}

async fn prompt_position(
    prompt: &str,
    default: &str,
) -> Result<Coordinate, Box<dyn std::error::Error>> {
    let text: String = Input::new()
        .with_prompt(prompt)
        .default(default.to_string())
        .validate_with(|input: &String| {
            Coordinate::parse(input)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()?;

    resolve_position(Some(Coordinate::parse(&text)?), None).await
}

fn validate_max_stops(max_stops: usize) -> Result<(), String> {
    if max_stops == 0 {
        Err("enter at least 1 stop".to_string())
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_max_stops_is_refused() {
        assert!(validate_max_stops(0).is_err());
        assert!(validate_max_stops(1).is_ok());
        assert!(validate_max_stops(10).is_ok());
    }

    #[test]
    fn every_shift_has_a_label() {
        let labels: Vec<String> = SHIFTS.iter().map(ToString::to_string).collect();
        assert_eq!(labels, ["Morning", "Afternoon", "Evening", "Night"]);
    }
}

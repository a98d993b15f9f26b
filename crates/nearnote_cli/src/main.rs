//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `nearnote_core` linkage.
//! - Offer a distance probe for checking radii against real coordinates.
//!
//! Usage: `nearnote_cli [lat1 lon1 lat2 lon2]`

use nearnote_core::{distance_m, EngineConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("nearnote_core ping={}", nearnote_core::ping());
    println!("nearnote_core version={}", nearnote_core::core_version());

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        return ExitCode::SUCCESS;
    }

    let coords = match parse_coords(&args) {
        Ok(coords) => coords,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("usage: nearnote_cli [lat1 lon1 lat2 lon2]");
            return ExitCode::from(2);
        }
    };

    let config = EngineConfig::default();
    let meters = distance_m(coords[0], coords[1], coords[2], coords[3]);
    println!("distance_m={meters:.2}");
    println!(
        "within_foreground_radius={} within_geofence_radius={}",
        meters < config.foreground_alert_radius_m,
        meters <= config.geofence_radius_m
    );
    ExitCode::SUCCESS
}

fn parse_coords(args: &[String]) -> Result<[f64; 4], String> {
    if args.len() != 4 {
        return Err(format!("expected 4 coordinates, got {}", args.len()));
    }
    let mut coords = [0.0; 4];
    for (slot, raw) in coords.iter_mut().zip(args) {
        *slot = raw
            .parse::<f64>()
            .map_err(|_| format!("not a number: `{raw}`"))?;
    }
    Ok(coords)
}

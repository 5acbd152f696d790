use serde::Serialize;
use serde_json::json;

use yatra_core::catalog::hotels::DestinationEntry;
use yatra_core::domain::hotel::Hotel;

use crate::commands::{load_catalog, load_config, CommandResult, EXIT_NOT_FOUND};

#[derive(Debug, Serialize)]
struct DestinationSummary<'a> {
    name: &'a str,
    hotels: usize,
    available: usize,
}

pub fn run(destination: Option<&str>) -> CommandResult {
    let config = match load_config("catalog") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let catalog = match load_catalog("catalog", &config) {
        Ok(catalog) => catalog,
        Err(failure) => return failure,
    };

    if let Some(requested) = destination {
        return match catalog.hotels.resolve(requested) {
            Some(entry) => destination_detail(entry),
            None => CommandResult::failure(
                "catalog",
                "not_found",
                format!(
                    "unknown destination `{}`; available: {}",
                    requested.trim(),
                    catalog.hotels.destination_names().join(", ")
                ),
                EXIT_NOT_FOUND,
            ),
        };
    }

    let destinations: Vec<DestinationSummary<'_>> = catalog
        .hotels
        .destinations()
        .iter()
        .map(|entry| DestinationSummary {
            name: &entry.name,
            hotels: entry.hotels.len(),
            available: entry.hotels.iter().filter(|hotel| hotel.available).count(),
        })
        .collect();
    let modes: Vec<_> = catalog.fares.fares().collect();

    CommandResult::success_with_data(
        "catalog",
        format!(
            "{} destinations, {} routes, default distance {} km",
            destinations.len(),
            catalog.fares.route_count(),
            catalog.fares.default_distance_km()
        ),
        Some(json!({ "destinations": destinations, "modes": modes })),
    )
}

fn destination_detail(entry: &DestinationEntry) -> CommandResult {
    let hotels: &[Hotel] = &entry.hotels;
    CommandResult::success_with_data(
        "catalog",
        format!("{} hotels in {}", hotels.len(), entry.name),
        Some(json!({ "destination": entry.name, "hotels": hotels })),
    )
}

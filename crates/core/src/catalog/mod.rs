//! Static reference data: city-pair distances, per-mode fares and the
//! per-destination hotel lists.
//!
//! The catalog is parsed once at startup and shared read-only behind an
//! `Arc`. When no path is configured the copy embedded in the binary is used.

pub mod fares;
pub mod hotels;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::domain::travel::TravelMode;
use fares::{FareTable, ModeFare, RouteDistance};
use hotels::{DestinationEntry, HotelCatalog};

const EMBEDDED_CATALOG: &str = include_str!("../../data/catalog.toml");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("catalog validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    default_distance_km: u32,
    #[serde(default)]
    modes: Vec<ModeFare>,
    #[serde(default)]
    distances: Vec<RouteDistance>,
    #[serde(default)]
    destinations: Vec<DestinationEntry>,
}

#[derive(Clone, Debug)]
pub struct ReferenceCatalog {
    pub hotels: HotelCatalog,
    pub fares: FareTable,
}

impl ReferenceCatalog {
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_toml_str(EMBEDDED_CATALOG)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&raw)
    }

    /// Loads `path` when given, otherwise the embedded catalog.
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        let catalog = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::embedded()?,
        };
        let source =
            path.map(|path| path.display().to_string()).unwrap_or_else(|| "embedded".to_string());
        tracing::info!(
            event_name = "catalog.loaded",
            source = %source,
            destinations = catalog.hotels.destinations().len(),
            routes = catalog.fares.route_count(),
            "reference catalog loaded"
        );
        Ok(catalog)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(raw)?;
        validate(&file)?;

        Ok(Self {
            hotels: HotelCatalog::new(file.destinations),
            fares: FareTable::new(file.default_distance_km, file.distances, file.modes),
        })
    }
}

fn validate(file: &CatalogFile) -> Result<(), CatalogError> {
    if file.default_distance_km == 0 {
        return Err(CatalogError::Validation("default_distance_km must be > 0".to_string()));
    }

    for mode in TravelMode::ALL {
        let fare = file
            .modes
            .iter()
            .find(|fare| fare.mode == mode)
            .ok_or_else(|| CatalogError::Validation(format!("no fare defined for mode `{mode}`")))?;
        if fare.speed_kmh <= rust_decimal::Decimal::ZERO {
            return Err(CatalogError::Validation(format!("speed for `{mode}` must be > 0")));
        }
        if fare.cost_per_km.is_sign_negative() {
            return Err(CatalogError::Validation(format!("cost for `{mode}` must not be negative")));
        }
    }

    if file.destinations.is_empty() {
        return Err(CatalogError::Validation("catalog lists no destinations".to_string()));
    }

    let mut seen = HashSet::new();
    for entry in &file.destinations {
        if !seen.insert(entry.name.trim().to_lowercase()) {
            return Err(CatalogError::Validation(format!(
                "destination `{}` is listed twice",
                entry.name
            )));
        }
        if entry.hotels.is_empty() {
            return Err(CatalogError::Validation(format!(
                "destination `{}` has no hotels",
                entry.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{CatalogError, ReferenceCatalog};
    use crate::catalog::fares::DistanceSource;
    use crate::domain::travel::TravelMode;

    #[test]
    fn embedded_catalog_parses_and_validates() {
        let catalog = ReferenceCatalog::embedded().expect("embedded catalog");
        assert_eq!(catalog.hotels.destinations().len(), 11);
        assert!(catalog.hotels.resolve("goa").is_some());
        assert_eq!(catalog.fares.distance("Goa", "Mumbai"), (580, DistanceSource::Table));
        for mode in TravelMode::ALL {
            assert!(catalog.fares.fare(mode).is_some(), "fare for {mode}");
        }
    }

    #[test]
    fn catalog_missing_a_mode_is_rejected() {
        let raw = r#"
default_distance_km = 500

[[modes]]
mode = "bus"
cost_per_km = 2
speed_kmh = 50

[[destinations]]
name = "Goa"

[[destinations.hotels]]
name = "Palm Grove Inn"
price_per_night = 2500
rating = 3
"#;
        let error = ReferenceCatalog::from_toml_str(raw).expect_err("flight fare missing");
        assert!(matches!(
            error,
            CatalogError::Validation(ref message) if message.contains("flight")
        ));
    }

    #[test]
    fn catalog_loads_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalog.toml");
        fs::write(&path, include_str!("../../data/catalog.toml")).expect("write catalog");

        let catalog = ReferenceCatalog::load(Some(&path)).expect("file catalog");
        assert_eq!(catalog.hotels.destination_names().first().map(String::as_str), Some("Goa"));
    }

    #[test]
    fn missing_file_reports_path() {
        let error = ReferenceCatalog::from_path(std::path::Path::new("/nonexistent/catalog.toml"))
            .expect_err("missing file");
        assert!(matches!(error, CatalogError::ReadFile { .. }));
    }
}

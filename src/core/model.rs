//! Input data model: homes and resorts
//!
//! Homes come from a JSON object keyed by home id; resorts from a JSON
//! array. Both are validated at load time; a coordinate outside the valid
//! lat/lon range is a fatal pre-flight error, not something to discover
//! halfway through an acquisition run.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::core::error::{suggest_home_id, Error, Result};

/// A named origin point from the homes file
#[derive(Debug, Clone)]
pub struct Home {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Homes-file entry; the id is the JSON object key
#[derive(Debug, Clone, Deserialize)]
pub struct HomeSpec {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// A destination point (ski area)
#[derive(Debug, Clone, Deserialize)]
pub struct Resort {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Resort {
    /// Stable identity for keying route records: id, else slug, else name
    pub fn key(&self) -> &str {
        self.id
            .as_deref()
            .or(self.slug.as_deref())
            .unwrap_or(&self.name)
    }
}

/// Validate a WGS84 coordinate, naming the offending input on failure
pub fn validate_coord(what: &str, lat: f64, lon: f64) -> Result<()> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(Error::InvalidInput(format!(
            "{what}: latitude {lat} out of range [-90, 90]"
        )));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(Error::InvalidInput(format!(
            "{what}: longitude {lon} out of range [-180, 180]"
        )));
    }
    Ok(())
}

/// Load the homes file: a JSON object mapping home id to {name, lat, lon}
pub fn load_homes(path: &Path) -> Result<BTreeMap<String, HomeSpec>> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        Error::InvalidInput(format!("cannot read homes file {}: {e}", path.display()))
    })?;
    let homes: BTreeMap<String, HomeSpec> = serde_json::from_str(&raw).map_err(|e| {
        Error::InvalidInput(format!("malformed homes file {}: {e}", path.display()))
    })?;

    for (id, spec) in &homes {
        validate_coord(&format!("home '{id}'"), spec.lat, spec.lon)?;
    }
    Ok(homes)
}

/// Pick one home out of the homes file, suggesting a correction when the
/// requested id does not exist
pub fn select_home(homes: &BTreeMap<String, HomeSpec>, id: &str) -> Result<Home> {
    match homes.get(id) {
        Some(spec) => Ok(Home {
            id: id.to_string(),
            name: spec.name.clone(),
            lat: spec.lat,
            lon: spec.lon,
        }),
        None => Err(Error::HomeNotFound {
            id: id.to_string(),
            suggestion: suggest_home_id(id, homes.keys().map(String::as_str)),
        }),
    }
}

/// Load and validate the resorts file: a JSON array of destination points
pub fn load_resorts(path: &Path) -> Result<Vec<Resort>> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        Error::InvalidInput(format!("cannot read resorts file {}: {e}", path.display()))
    })?;
    let resorts: Vec<Resort> = serde_json::from_str(&raw).map_err(|e| {
        Error::InvalidInput(format!("malformed resorts file {}: {e}", path.display()))
    })?;

    for resort in &resorts {
        validate_coord(&format!("resort '{}'", resort.key()), resort.lat, resort.lon)?;
    }
    Ok(resorts)
}

/// Parse an ad-hoc "lat,lon" origin into a Home overriding the homes file
pub fn parse_origin(s: &str) -> Result<Home> {
    let (lat_str, lon_str) = s
        .split_once(',')
        .ok_or_else(|| Error::InvalidInput(format!("origin '{s}' is not 'lat,lon'")))?;
    let lat: f64 = lat_str
        .trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("origin latitude '{lat_str}' is not a number")))?;
    let lon: f64 = lon_str
        .trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("origin longitude '{lon_str}' is not a number")))?;
    validate_coord("origin", lat, lon)?;

    Ok(Home {
        id: "origin".to_string(),
        name: "Origin".to_string(),
        lat,
        lon,
    })
}

//! Route Store: the persisted set of computed routes for one home
//!
//! Written once per acquisition run as a GeoJSON FeatureCollection of
//! LineStrings and read back by the travel-time extractor and the corridor
//! aggregator (or by a later run that skips re-fetching).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};

/// One computed route from a home to a resort; never mutated after creation
#[derive(Debug, Clone)]
pub struct RouteRecord {
    pub home_id: String,
    pub resort_id: String,
    pub name: String,
    /// Ordered (lon, lat) vertices as returned by the routing engine
    pub geometry: Vec<(f64, f64)>,
    /// None when the engine omitted a numeric duration
    pub duration_sec: Option<f64>,
    pub distance_m: f64,
}

impl RouteRecord {
    /// Total route duration in minutes, when known
    pub fn duration_min(&self) -> Option<f64> {
        self.duration_sec.map(|s| s / 60.0)
    }
}

#[derive(Serialize, Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    features: Vec<Feature>,
}

#[derive(Serialize, Deserialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: String,
    geometry: LineString,
    properties: RouteProperties,
}

#[derive(Serialize, Deserialize)]
struct LineString {
    #[serde(rename = "type")]
    kind: String,
    coordinates: Vec<(f64, f64)>,
}

#[derive(Serialize, Deserialize)]
struct RouteProperties {
    home_id: String,
    resort_id: String,
    name: String,
    duration_sec: Option<f64>,
    duration_min: Option<f64>,
    distance_km: f64,
}

/// Write a route store as a GeoJSON FeatureCollection
pub fn write_store(records: &[RouteRecord], path: &Path) -> Result<()> {
    let features = records
        .iter()
        .map(|r| Feature {
            kind: "Feature".to_string(),
            geometry: LineString {
                kind: "LineString".to_string(),
                coordinates: r.geometry.clone(),
            },
            properties: RouteProperties {
                home_id: r.home_id.clone(),
                resort_id: r.resort_id.clone(),
                name: r.name.clone(),
                duration_sec: r.duration_sec,
                duration_min: r.duration_min().map(|m| (m * 100.0).round() / 100.0),
                distance_km: r.distance_m / 1000.0,
            },
        })
        .collect();

    let collection = FeatureCollection {
        kind: "FeatureCollection".to_string(),
        features,
    };
    let body = serde_json::to_string(&collection)?;
    std::fs::write(path, body)?;
    Ok(())
}

/// Read a route store back from disk
pub fn read_store(path: &Path) -> Result<Vec<RouteRecord>> {
    let raw = std::fs::read_to_string(path)?;
    let collection: FeatureCollection = serde_json::from_str(&raw).map_err(|e| {
        Error::InvalidInput(format!("malformed route store {}: {e}", path.display()))
    })?;

    Ok(collection
        .features
        .into_iter()
        .map(|f| RouteRecord {
            home_id: f.properties.home_id,
            resort_id: f.properties.resort_id,
            name: f.properties.name,
            geometry: f.geometry.coordinates,
            duration_sec: f.properties.duration_sec,
            distance_m: f.properties.distance_km * 1000.0,
        })
        .collect())
}

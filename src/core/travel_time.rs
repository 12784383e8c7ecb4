//! Travel-time extraction
//!
//! Reduces a route store to the flat per-resort lookup table the travel-time
//! slider consumes: display name → {hours, km}. Resorts that never made it
//! into the store are simply absent; consumers treat a missing key as
//! "unknown", never as zero.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::core::error::Result;
use crate::core::store::RouteRecord;

/// Fallback average road speed when a record carries no duration, km/h
const FALLBACK_SPEED_KMH: f64 = 70.0;

/// Rounded travel time and road distance for one resort
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TravelTime {
    pub hours: f64,
    pub km: f64,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Build the travel-time table from a route store
///
/// A BTreeMap keyed by display name keeps the serialized output stable, so
/// running the extractor twice over the same store is byte-identical.
pub fn extract(records: &[RouteRecord]) -> BTreeMap<String, TravelTime> {
    let mut table = BTreeMap::new();

    for record in records {
        let km = record.distance_m / 1000.0;
        let hours = match record.duration_sec {
            Some(sec) => sec / 3600.0,
            // Estimate from road distance at a typical average speed
            None => km / FALLBACK_SPEED_KMH,
        };
        table.insert(
            record.name.clone(),
            TravelTime {
                hours: round2(hours),
                km: round1(km),
            },
        );
    }

    table
}

/// Write the table as a flat JSON object
pub fn write_table(table: &BTreeMap<String, TravelTime>, path: &Path) -> Result<()> {
    let body = serde_json::to_string_pretty(table)?;
    std::fs::write(path, body)?;
    Ok(())
}

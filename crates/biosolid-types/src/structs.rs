//! Registry records for plants and farms.
//!
//! These are the static inputs the registry layer builds from. They never
//! change after start-up; the only day-to-day mutable quantity in the system
//! (plant storage) lives in `biosolid-core`.

use serde::{Deserialize, Serialize};

use crate::ids::{FarmId, PlantId, ZoneId};

// ---------------------------------------------------------------------------
// GeoPoint
// ---------------------------------------------------------------------------

/// A geocoordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lon: f64,
}

impl GeoPoint {
    /// Create a point from latitude and longitude in degrees.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether both components are finite and inside the valid degree range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

// ---------------------------------------------------------------------------
// PlantSpec
// ---------------------------------------------------------------------------

/// One row of the plant (STP) registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantSpec {
    /// Plant identifier.
    pub id: PlantId,
    /// Fixed daily production of biosolid material, in tons per day.
    pub daily_output_tons: f64,
    /// Maximum on-site storage, in tons.
    pub max_storage_tons: f64,
    /// Plant location.
    pub location: GeoPoint,
}

// ---------------------------------------------------------------------------
// FarmSpec
// ---------------------------------------------------------------------------

/// One row of the farm registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmSpec {
    /// Farm identifier.
    pub id: FarmId,
    /// Rainfall forecast zone the farm belongs to.
    pub zone: ZoneId,
    /// Cultivated area in hectares.
    pub area_ha: f64,
    /// Farm location.
    pub location: GeoPoint,
}

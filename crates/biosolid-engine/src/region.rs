//! Demonstration region for the engine binary.
//!
//! Builds a complete, reproducible set of inputs from the `region` section
//! of the configuration: five treatment plants at fixed coastal sites,
//! farms scattered around the configured rainfall zones, a synthetic monsoon
//! rainfall table, and a two-season crop demand curve. The same seed always
//! yields the same region.

use biosolid_core::DispatchConfig;
use biosolid_types::{FarmId, FarmSpec, GeoPoint, PlantId, PlantSpec, ZoneId};
use biosolid_world::{DemandTable, MonsoonGenerator, RainfallTable, Registry};
use chrono::{Datelike, Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::error::EngineError;

/// Fixed treatment plants: `(id, lat, lon, tons/day, max storage tons)`.
const PLANTS: &[(&str, f64, f64, f64, f64)] = &[
    ("STP_TVM", 8.46, 76.94, 18.0, 120.0),
    ("STP_KLM", 8.89, 76.61, 9.0, 60.0),
    ("STP_EKM", 9.96, 76.30, 25.0, 150.0),
    ("STP_TSR", 10.52, 76.21, 12.0, 80.0),
    ("STP_KKD", 11.25, 75.78, 14.0, 90.0),
];

/// Southern end of the zone layout.
const SOUTH_LAT: f64 = 8.5;
/// Northern end of the zone layout.
const NORTH_LAT: f64 = 11.3;

/// All inputs of a demonstration run.
#[derive(Debug, Clone)]
pub struct Region {
    /// Plants and farms.
    pub registry: Registry,
    /// Synthetic rainfall per zone.
    pub rainfall: RainfallTable,
    /// Per-farm nitrogen demand over the horizon.
    pub demand: DemandTable,
}

impl Region {
    /// Build the region described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Region`] if `region.zones` is empty, and
    /// [`EngineError::World`] if the generated registry is rejected.
    pub fn build(config: &DispatchConfig) -> Result<Self, EngineError> {
        if config.region.zones.is_empty() {
            return Err(EngineError::Region {
                message: "region.zones must list at least one zone".to_owned(),
            });
        }

        let mut rng = StdRng::seed_from_u64(config.region.seed);
        let zones: Vec<ZoneId> = config.region.zones.iter().map(ZoneId::new).collect();

        let plants = PLANTS
            .iter()
            .map(|&(id, lat, lon, output, max)| PlantSpec {
                id: PlantId::new(id),
                daily_output_tons: output,
                max_storage_tons: max,
                location: GeoPoint::new(lat, lon),
            })
            .collect();

        let mut farms = Vec::new();
        let mut crop_factor: Vec<f64> = Vec::new();
        for i in 0..config.region.farm_count {
            let slot = zone_slot(i, zones.len());
            let zone = zones.get(slot).cloned().ok_or_else(|| EngineError::Region {
                message: "region has no zones".to_owned(),
            })?;
            let (lat, lon) = zone_center(slot, zones.len());
            farms.push(FarmSpec {
                id: FarmId::new(format!("F_{i:04}")),
                zone,
                area_ha: rng.random_range(0.5_f64..5.0),
                location: GeoPoint::new(
                    lat + rng.random_range(-0.2_f64..0.2),
                    lon + rng.random_range(-0.15_f64..0.25),
                ),
            });
            crop_factor.push(rng.random_range(0.8_f64..1.2));
        }

        let registry = Registry::new(plants, farms, config.logistics.earth_radius_km)?;

        // Cover the forecast window past the last simulated day.
        let rainfall_days = config
            .run
            .horizon_days
            .saturating_add(config.environment.forecast_window_days);
        let rainfall = MonsoonGenerator::new(config.region.seed).generate(
            config.run.start_date,
            rainfall_days,
            &zones,
        );

        let mut demand = DemandTable::new();
        for d in 0..config.run.horizon_days {
            let date = config
                .run
                .start_date
                .checked_add_days(Days::new(u64::from(d)))
                .ok_or_else(|| EngineError::Region {
                    message: format!("demand horizon overflows the calendar at day {d}"),
                })?;
            let base = seasonal_demand_kg_per_ha(date);
            for (farm, factor) in registry.farms().iter().zip(&crop_factor) {
                demand.set(date, farm.id.clone(), base * factor);
            }
        }

        info!(
            seed = config.region.seed,
            plants = registry.plant_count(),
            farms = registry.farm_count(),
            zones = zones.len(),
            rainfall_days,
            "Demonstration region built"
        );

        Ok(Self {
            registry,
            rainfall,
            demand,
        })
    }
}

/// Zone index of the `i`-th farm: farms are dealt round-robin.
fn zone_slot(i: u32, zone_count: usize) -> usize {
    usize::try_from(i)
        .ok()
        .and_then(|i| i.checked_rem(zone_count))
        .unwrap_or(0)
}

/// Centre of a zone, zones spaced evenly along the coast south to north.
fn zone_center(slot: usize, zone_count: usize) -> (f64, f64) {
    let slot = u32::try_from(slot).unwrap_or(0);
    let last = u32::try_from(zone_count.saturating_sub(1)).unwrap_or(0);
    let t = if last == 0 {
        0.0
    } else {
        f64::from(slot) / f64::from(last)
    };
    let lat = (NORTH_LAT - SOUTH_LAT).mul_add(t, SOUTH_LAT);
    // The coast runs north-north-west.
    let lon = 0.4_f64.mul_add(-(lat - SOUTH_LAT), 76.9);
    (lat, lon)
}

/// Crop nitrogen demand in kg/ha for a date.
///
/// Two paddy seasons: planting in April-May and again in
/// September-October, with low background demand otherwise.
fn seasonal_demand_kg_per_ha(date: NaiveDate) -> f64 {
    match date.month() {
        4 | 9 => 45.0,
        5 | 10 => 35.0,
        6 | 11 => 15.0,
        _ => 5.0,
    }
}

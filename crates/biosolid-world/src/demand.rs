//! Per-date, per-farm nitrogen demand.
//!
//! Demand is expressed in kg of nitrogen per hectare. A farm without a
//! demand row on a date has zero demand: deliveries there earn no nitrogen
//! offset and all of their nitrogen counts as excess for leaching.

use std::collections::BTreeMap;

use biosolid_types::FarmId;
use chrono::NaiveDate;

use crate::registry::Farm;

/// Nitrogen demand of every farm on one date.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DailyDemand {
    /// kg N per hectare, keyed by farm.
    per_ha: BTreeMap<FarmId, f64>,
}

impl DailyDemand {
    /// Wrap a per-hectare demand map.
    pub const fn new(per_ha: BTreeMap<FarmId, f64>) -> Self {
        Self { per_ha }
    }

    /// Per-hectare demand of a farm; zero when missing or not a number.
    pub fn per_ha(&self, farm: &FarmId) -> f64 {
        self.per_ha
            .get(farm)
            .copied()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    /// Total demand of a farm in kg N (per-hectare demand times area).
    pub fn total_kg(&self, farm: &Farm) -> f64 {
        farm.total_demand_kg(self.per_ha(&farm.id))
    }

    /// Whether no farm has a demand row.
    pub fn is_empty(&self) -> bool {
        self.per_ha.is_empty()
    }
}

/// A source of nitrogen demand rows.
pub trait DemandSource {
    /// Demand of every farm on `date`. Missing dates yield an empty map.
    fn demand_on(&self, date: NaiveDate) -> DailyDemand;
}

/// In-memory demand table keyed by date.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DemandTable {
    /// Rows keyed by date.
    rows: BTreeMap<NaiveDate, BTreeMap<FarmId, f64>>,
}

impl DemandTable {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }

    /// Set the per-hectare demand of one farm on one date.
    pub fn set(&mut self, date: NaiveDate, farm: FarmId, kg_per_ha: f64) {
        self.rows.entry(date).or_default().insert(farm, kg_per_ha);
    }

    /// Number of dated rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl DemandSource for DemandTable {
    fn demand_on(&self, date: NaiveDate) -> DailyDemand {
        self.rows
            .get(&date)
            .cloned()
            .map(DailyDemand::new)
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use biosolid_types::{FarmSpec, GeoPoint, PlantId, PlantSpec, ZoneId};

    use super::*;
    use crate::registry::Registry;

    #[test]
    fn missing_rows_read_as_zero() {
        let mut table = DemandTable::new();
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        table.set(date, FarmId::new("F_1"), 12.5);

        let today = table.demand_on(date);
        assert!((today.per_ha(&FarmId::new("F_1")) - 12.5).abs() < 1e-12);
        assert!(today.per_ha(&FarmId::new("F_2")).abs() < 1e-12);

        let other = table.demand_on(date.succ_opt().unwrap());
        assert!(other.is_empty());
    }

    #[test]
    fn non_finite_demand_reads_as_zero() {
        let mut map = BTreeMap::new();
        map.insert(FarmId::new("F_1"), f64::NAN);
        let demand = DailyDemand::new(map);
        assert!(demand.per_ha(&FarmId::new("F_1")).abs() < 1e-12);
    }

    #[test]
    fn total_scales_with_area() {
        let registry = Registry::new(
            vec![PlantSpec {
                id: PlantId::new("STP_A"),
                daily_output_tons: 1.0,
                max_storage_tons: 10.0,
                location: GeoPoint::new(8.5, 76.9),
            }],
            vec![FarmSpec {
                id: FarmId::new("F_1"),
                zone: ZoneId::new("Z"),
                area_ha: 4.0,
                location: GeoPoint::new(8.6, 76.9),
            }],
            6371.0,
        )
        .unwrap();
        let mut map = BTreeMap::new();
        map.insert(FarmId::new("F_1"), 20.0);
        let demand = DailyDemand::new(map);
        assert!((demand.total_kg(&registry.farms()[0]) - 80.0).abs() < 1e-12);
    }
}

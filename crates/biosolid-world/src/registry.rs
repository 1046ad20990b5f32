//! Static registry of plants and farms.
//!
//! The [`Registry`] is built once at start-up from the plant and farm rows.
//! Construction validates the rows and precomputes the great-circle distance
//! from every farm to every plant, so that each [`Farm`] holds exactly one
//! distance entry per known plant. Nothing in the registry changes after
//! construction.

use std::collections::BTreeMap;

use biosolid_types::{FarmId, FarmSpec, GeoPoint, PlantId, PlantSpec, ZoneId};
use tracing::debug;

use crate::error::WorldError;
use crate::geo::haversine_km;

// ---------------------------------------------------------------------------
// Farm
// ---------------------------------------------------------------------------

/// A farm with its precomputed distances to every plant.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Farm {
    /// Farm identifier.
    pub id: FarmId,
    /// Rainfall forecast zone.
    pub zone: ZoneId,
    /// Cultivated area in hectares. Always positive.
    pub area_ha: f64,
    /// Farm location.
    pub location: GeoPoint,
    /// Distance in km to each plant.
    distances: BTreeMap<PlantId, f64>,
}

impl Farm {
    /// Distance in km from this farm to the given plant.
    pub fn distance_to(&self, plant: &PlantId) -> Option<f64> {
        self.distances.get(plant).copied()
    }

    /// All plant distances, ordered by plant id.
    pub const fn distances(&self) -> &BTreeMap<PlantId, f64> {
        &self.distances
    }

    /// The nearest plant. Ties resolve to the lowest plant id.
    pub fn closest_plant(&self) -> Option<&PlantId> {
        self.distances
            .iter()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(id, _)| id)
    }

    /// Total nitrogen demand in kg for a per-hectare demand.
    pub fn total_demand_kg(&self, demand_kg_per_ha: f64) -> f64 {
        demand_kg_per_ha * self.area_ha
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Immutable registry of plants and farms.
///
/// Plants and farms keep the order of the input rows. That order is the
/// tie-break order wherever the solver sorts candidates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Registry {
    /// Plants in registry order.
    plants: Vec<PlantSpec>,
    /// Farms in registry order.
    farms: Vec<Farm>,
    /// Plant id -> index into `plants`.
    plant_index: BTreeMap<PlantId, usize>,
    /// Farm id -> index into `farms`.
    farm_index: BTreeMap<FarmId, usize>,
}

impl Registry {
    /// Validate the registry rows and precompute farm-to-plant distances.
    ///
    /// # Errors
    ///
    /// Returns a [`WorldError`] when either list is empty, an id repeats, a
    /// farm area is not positive, a plant capacity is negative, a coordinate
    /// is invalid, or the earth radius is not positive.
    pub fn new(
        plants: Vec<PlantSpec>,
        farms: Vec<FarmSpec>,
        earth_radius_km: f64,
    ) -> Result<Self, WorldError> {
        if !(earth_radius_km.is_finite() && earth_radius_km > 0.0) {
            return Err(WorldError::InvalidEarthRadius(earth_radius_km));
        }
        if plants.is_empty() {
            return Err(WorldError::NoPlants);
        }
        if farms.is_empty() {
            return Err(WorldError::NoFarms);
        }

        let mut plant_index = BTreeMap::new();
        for (idx, plant) in plants.iter().enumerate() {
            validate_plant(plant)?;
            if plant_index.insert(plant.id.clone(), idx).is_some() {
                return Err(WorldError::DuplicatePlant(plant.id.clone()));
            }
        }

        let mut farm_index = BTreeMap::new();
        let mut built = Vec::with_capacity(farms.len());
        for (idx, spec) in farms.into_iter().enumerate() {
            validate_farm(&spec)?;
            if farm_index.insert(spec.id.clone(), idx).is_some() {
                return Err(WorldError::DuplicateFarm(spec.id));
            }
            let distances = plants
                .iter()
                .map(|plant| {
                    let km = haversine_km(plant.location, spec.location, earth_radius_km);
                    (plant.id.clone(), km)
                })
                .collect();
            built.push(Farm {
                id: spec.id,
                zone: spec.zone,
                area_ha: spec.area_ha,
                location: spec.location,
                distances,
            });
        }

        debug!(
            plants = plants.len(),
            farms = built.len(),
            earth_radius_km,
            "Registry built"
        );

        Ok(Self {
            plants,
            farms: built,
            plant_index,
            farm_index,
        })
    }

    /// All plants in registry order.
    pub fn plants(&self) -> &[PlantSpec] {
        &self.plants
    }

    /// All farms in registry order.
    pub fn farms(&self) -> &[Farm] {
        &self.farms
    }

    /// Look up a plant by id.
    pub fn plant(&self, id: &PlantId) -> Option<&PlantSpec> {
        self.plant_index
            .get(id)
            .and_then(|&idx| self.plants.get(idx))
    }

    /// Look up a farm by id.
    pub fn farm(&self, id: &FarmId) -> Option<&Farm> {
        self.farm_index.get(id).and_then(|&idx| self.farms.get(idx))
    }

    /// Distance in km between a plant and a farm.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownFarm`] or [`WorldError::UnknownPlant`]
    /// when either id is not registered.
    pub fn distance(&self, plant: &PlantId, farm: &FarmId) -> Result<f64, WorldError> {
        let farm = self
            .farm(farm)
            .ok_or_else(|| WorldError::UnknownFarm(farm.clone()))?;
        farm.distance_to(plant)
            .ok_or_else(|| WorldError::UnknownPlant(plant.clone()))
    }

    /// Number of plants.
    pub fn plant_count(&self) -> usize {
        self.plants.len()
    }

    /// Number of farms.
    pub fn farm_count(&self) -> usize {
        self.farms.len()
    }
}

fn validate_plant(plant: &PlantSpec) -> Result<(), WorldError> {
    let output_ok = plant.daily_output_tons.is_finite() && plant.daily_output_tons >= 0.0;
    let storage_ok = plant.max_storage_tons.is_finite() && plant.max_storage_tons >= 0.0;
    if !(output_ok && storage_ok) {
        return Err(WorldError::InvalidPlantCapacity {
            plant: plant.id.clone(),
            daily_output_tons: plant.daily_output_tons,
            max_storage_tons: plant.max_storage_tons,
        });
    }
    if !plant.location.is_valid() {
        return Err(WorldError::InvalidCoordinate {
            entity: plant.id.to_string(),
            lat: plant.location.lat,
            lon: plant.location.lon,
        });
    }
    Ok(())
}

fn validate_farm(farm: &FarmSpec) -> Result<(), WorldError> {
    if !(farm.area_ha.is_finite() && farm.area_ha > 0.0) {
        return Err(WorldError::InvalidFarmArea {
            farm: farm.id.clone(),
            area_ha: farm.area_ha,
        });
    }
    if !farm.location.is_valid() {
        return Err(WorldError::InvalidCoordinate {
            entity: farm.id.to_string(),
            lat: farm.location.lat,
            lon: farm.location.lon,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::geo::DEFAULT_EARTH_RADIUS_KM;

    fn plant(id: &str, lat: f64, lon: f64) -> PlantSpec {
        PlantSpec {
            id: PlantId::new(id),
            daily_output_tons: 5.0,
            max_storage_tons: 100.0,
            location: GeoPoint::new(lat, lon),
        }
    }

    fn farm(id: &str, lat: f64, lon: f64) -> FarmSpec {
        FarmSpec {
            id: FarmId::new(id),
            zone: ZoneId::new("Z1"),
            area_ha: 2.0,
            location: GeoPoint::new(lat, lon),
        }
    }

    #[test]
    fn every_farm_has_one_distance_per_plant() {
        let registry = Registry::new(
            vec![plant("STP_A", 8.5, 76.9), plant("STP_B", 10.0, 76.3)],
            vec![farm("F_1", 9.0, 76.5), farm("F_2", 11.0, 75.8)],
            DEFAULT_EARTH_RADIUS_KM,
        )
        .unwrap();

        for f in registry.farms() {
            assert_eq!(f.distances().len(), registry.plant_count());
            for p in registry.plants() {
                assert!(f.distance_to(&p.id).is_some());
            }
        }
    }

    #[test]
    fn distances_are_reproducible() {
        let build = || {
            Registry::new(
                vec![plant("STP_A", 8.5, 76.9)],
                vec![farm("F_1", 9.0, 76.5)],
                DEFAULT_EARTH_RADIUS_KM,
            )
            .unwrap()
        };
        let a = build();
        let b = build();
        let id = PlantId::new("STP_A");
        let da = a.farms()[0].distance_to(&id).unwrap();
        let db = b.farms()[0].distance_to(&id).unwrap();
        assert_eq!(da.to_bits(), db.to_bits());
    }

    #[test]
    fn closest_plant_picks_nearest() {
        let registry = Registry::new(
            vec![plant("STP_A", 8.5, 76.9), plant("STP_B", 11.0, 75.9)],
            vec![farm("F_1", 10.8, 75.9)],
            DEFAULT_EARTH_RADIUS_KM,
        )
        .unwrap();
        let closest = registry.farms()[0].closest_plant().unwrap();
        assert_eq!(closest.as_str(), "STP_B");
    }

    #[test]
    fn empty_lists_are_rejected() {
        let no_plants =
            Registry::new(vec![], vec![farm("F_1", 9.0, 76.5)], DEFAULT_EARTH_RADIUS_KM);
        assert!(matches!(no_plants, Err(WorldError::NoPlants)));
        let no_farms =
            Registry::new(vec![plant("STP_A", 8.5, 76.9)], vec![], DEFAULT_EARTH_RADIUS_KM);
        assert!(matches!(no_farms, Err(WorldError::NoFarms)));
    }

    #[test]
    fn zero_area_farm_is_rejected() {
        let mut bad = farm("F_1", 9.0, 76.5);
        bad.area_ha = 0.0;
        let result =
            Registry::new(vec![plant("STP_A", 8.5, 76.9)], vec![bad], DEFAULT_EARTH_RADIUS_KM);
        assert!(matches!(result, Err(WorldError::InvalidFarmArea { .. })));
    }

    #[test]
    fn negative_capacity_is_rejected() {
        let mut bad = plant("STP_A", 8.5, 76.9);
        bad.max_storage_tons = -1.0;
        let result =
            Registry::new(vec![bad], vec![farm("F_1", 9.0, 76.5)], DEFAULT_EARTH_RADIUS_KM);
        assert!(matches!(result, Err(WorldError::InvalidPlantCapacity { .. })));
    }

    #[test]
    fn zero_capacity_plant_is_allowed() {
        let mut empty = plant("STP_A", 8.5, 76.9);
        empty.max_storage_tons = 0.0;
        let result =
            Registry::new(vec![empty], vec![farm("F_1", 9.0, 76.5)], DEFAULT_EARTH_RADIUS_KM);
        assert!(result.is_ok());
    }

    #[test]
    fn duplicates_are_rejected() {
        let result = Registry::new(
            vec![plant("STP_A", 8.5, 76.9), plant("STP_A", 9.5, 76.9)],
            vec![farm("F_1", 9.0, 76.5)],
            DEFAULT_EARTH_RADIUS_KM,
        );
        assert!(matches!(result, Err(WorldError::DuplicatePlant(_))));

        let result = Registry::new(
            vec![plant("STP_A", 8.5, 76.9)],
            vec![farm("F_1", 9.0, 76.5), farm("F_1", 9.1, 76.5)],
            DEFAULT_EARTH_RADIUS_KM,
        );
        assert!(matches!(result, Err(WorldError::DuplicateFarm(_))));
    }

    #[test]
    fn invalid_coordinate_is_rejected() {
        let result = Registry::new(
            vec![plant("STP_A", 95.0, 76.9)],
            vec![farm("F_1", 9.0, 76.5)],
            DEFAULT_EARTH_RADIUS_KM,
        );
        assert!(matches!(result, Err(WorldError::InvalidCoordinate { .. })));
    }

    #[test]
    fn distance_lookup_reports_unknown_ids() {
        let registry = Registry::new(
            vec![plant("STP_A", 8.5, 76.9)],
            vec![farm("F_1", 9.0, 76.5)],
            DEFAULT_EARTH_RADIUS_KM,
        )
        .unwrap();
        assert!(registry.distance(&PlantId::new("STP_A"), &FarmId::new("F_1")).is_ok());
        assert!(matches!(
            registry.distance(&PlantId::new("STP_X"), &FarmId::new("F_1")),
            Err(WorldError::UnknownPlant(_))
        ));
        assert!(matches!(
            registry.distance(&PlantId::new("STP_A"), &FarmId::new("F_9")),
            Err(WorldError::UnknownFarm(_))
        ));
    }
}

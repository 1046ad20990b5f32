//! Plant storage: the only day-to-day mutable state in a run.
//!
//! [`StorageState`] is owned by the driver and mutated only by the
//! simulator's end-of-day settlement. The solver never sees it directly; it
//! receives a [`StorageSnapshot`] taken at the start of the day, so planning
//! and settlement never alias the same state.

use std::collections::BTreeMap;

use biosolid_types::{PlantId, PlantSpec};
use biosolid_world::Registry;

/// Start-of-day view of one plant.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PlantLevel {
    /// Plant identifier.
    pub plant_id: PlantId,
    /// Storage carried over from the previous day, in tons.
    pub current_storage_tons: f64,
    /// Today's production, in tons.
    pub daily_output_tons: f64,
    /// Storage capacity, in tons.
    pub max_storage_tons: f64,
}

impl PlantLevel {
    /// Material the plant can ship today: carried storage plus production.
    pub const fn available_tons(&self) -> f64 {
        self.current_storage_tons + self.daily_output_tons
    }

    /// Carried storage over capacity; zero for a plant with no capacity.
    pub const fn fill_ratio(&self) -> f64 {
        fill_ratio(self.current_storage_tons, self.max_storage_tons)
    }
}

/// Storage over capacity, treating a zero-capacity plant as empty.
pub const fn fill_ratio(storage_tons: f64, max_storage_tons: f64) -> f64 {
    if max_storage_tons > 0.0 {
        storage_tons / max_storage_tons
    } else {
        0.0
    }
}

/// Immutable copy of every plant's level, in registry order.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct StorageSnapshot {
    /// One entry per plant.
    levels: Vec<PlantLevel>,
}

impl StorageSnapshot {
    /// All plant levels in registry order.
    pub fn levels(&self) -> &[PlantLevel] {
        &self.levels
    }

    /// Level of one plant.
    pub fn level(&self, plant: &PlantId) -> Option<&PlantLevel> {
        self.levels.iter().find(|l| &l.plant_id == plant)
    }
}

/// Current storage of every plant.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StorageState {
    /// Tons held per plant.
    levels: BTreeMap<PlantId, f64>,
}

impl StorageState {
    /// All plants start empty.
    pub fn empty(registry: &Registry) -> Self {
        Self {
            levels: registry
                .plants()
                .iter()
                .map(|p| (p.id.clone(), 0.0))
                .collect(),
        }
    }

    /// Seed storage levels for scenario replay.
    ///
    /// Plants missing from `initial` start empty. Values are clamped into
    /// `[0, max_storage]`; ids that are not registered are ignored.
    pub fn from_levels(registry: &Registry, initial: &BTreeMap<PlantId, f64>) -> Self {
        let levels = registry
            .plants()
            .iter()
            .map(|p| {
                let tons = initial.get(&p.id).copied().unwrap_or(0.0);
                (p.id.clone(), clamp_storage(tons, p))
            })
            .collect();
        Self { levels }
    }

    /// Tons currently held by a plant; zero if unknown.
    pub fn level(&self, plant: &PlantId) -> f64 {
        self.levels.get(plant).copied().unwrap_or(0.0)
    }

    /// Replace a plant's level. Used only by the simulator's settlement.
    pub(crate) fn set_level(&mut self, plant: &PlantId, tons: f64) {
        if let Some(slot) = self.levels.get_mut(plant) {
            *slot = tons;
        }
    }

    /// Total tons held across all plants.
    pub fn total_tons(&self) -> f64 {
        self.levels.values().sum()
    }

    /// All levels, ordered by plant id.
    pub const fn levels(&self) -> &BTreeMap<PlantId, f64> {
        &self.levels
    }

    /// Start-of-day snapshot for the solver, in registry order.
    pub fn snapshot(&self, registry: &Registry) -> StorageSnapshot {
        let levels = registry
            .plants()
            .iter()
            .map(|p| PlantLevel {
                plant_id: p.id.clone(),
                current_storage_tons: self.level(&p.id),
                daily_output_tons: p.daily_output_tons,
                max_storage_tons: p.max_storage_tons,
            })
            .collect();
        StorageSnapshot { levels }
    }
}

fn clamp_storage(tons: f64, plant: &PlantSpec) -> f64 {
    if tons.is_finite() {
        tons.clamp(0.0, plant.max_storage_tons)
    } else {
        0.0
    }
}

//! Dispatch solver: greedy, route-scored daily allocation.
//!
//! Each day the solver:
//!
//! 1. **Triages** plants by start-of-day fill ratio, most urgent first.
//! 2. **Scores** every open farm (not rain-locked, not yet served today)
//!    for one load from the plant using [`net_carbon_impact`].
//! 3. **Walks** the candidates best-first, accepting while the score is
//!    positive or the plant is in panic mode. The first rejected candidate
//!    ends the walk for that plant.
//!
//! The walk itself is [`allocate`], a pure function of the triage order, a
//! rain-lock predicate, and a scoring function, so it can be tested without
//! building a whole day.
//!
//! The solver never mutates storage. It reads the [`StorageSnapshot`] taken
//! at the start of the day and proposes [`Action`]s through the
//! [`DispatchSource`] trait; the simulator decides what actually happens.

use std::collections::{BTreeMap, BTreeSet};

use biosolid_types::{Action, FarmId, PlantId, ZoneId};
use biosolid_world::{DailyDemand, Farm, RainLockPolicy, RainfallSource, Registry};
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::config::{AgronomyConfig, DispatchConfig, SolverConfig};
use crate::scoring::{Candidate, net_carbon_impact};
use crate::storage::StorageSnapshot;

/// Errors a dispatch source can report.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The source could not produce a plan for the day.
    #[error("dispatch source failed on {date}: {message}")]
    Internal {
        /// The day being planned.
        date: NaiveDate,
        /// Description of the failure.
        message: String,
    },
}

/// Everything a dispatch source may read when planning one day.
#[derive(Clone, Copy)]
pub struct DayContext<'a> {
    /// The day being planned.
    pub date: NaiveDate,
    /// Plants and farms.
    pub registry: &'a Registry,
    /// Plant storage at the start of the day.
    pub snapshot: &'a StorageSnapshot,
    /// Rainfall forecasts.
    pub rainfall: &'a dyn RainfallSource,
    /// Today's nitrogen demand.
    pub demand: &'a DailyDemand,
}

/// A source of daily dispatch plans.
///
/// [`DispatchSolver`] is the built-in implementation. Other sources (a
/// replayed plan, an external optimizer) may propose anything; the simulator
/// re-checks rain-lock on every action regardless of who proposed it.
pub trait DispatchSource {
    /// Propose the actions for one day.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] if no plan can be produced for the day.
    fn propose(&mut self, day: &DayContext<'_>) -> Result<Vec<Action>, DispatchError>;
}

// ---------------------------------------------------------------------------
// Allocation walk
// ---------------------------------------------------------------------------

/// One plant's entry in the triage order.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PlantPlan {
    /// Plant identifier.
    pub plant_id: PlantId,
    /// Storage plus today's production, in tons.
    pub available_tons: f64,
    /// Start-of-day fill ratio used for triage and panic mode.
    pub fill_ratio: f64,
}

/// Fixed parameters of the allocation walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkRules {
    /// Largest load a single action carries.
    pub truck_capacity_tons: f64,
    /// Fill ratio above which negative-score candidates are accepted.
    pub panic_fill_ratio: f64,
    /// Available material below which a plant stops dispatching.
    pub min_dispatch_tons: f64,
}

/// Record of a day's allocation, built incrementally by [`allocate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Allocation {
    /// Accepted actions in acceptance order.
    pub actions: Vec<Action>,
    /// Farms that already received a delivery today.
    pub served: BTreeSet<FarmId>,
}

impl Allocation {
    /// Total tons allocated from one plant.
    pub fn tons_from(&self, plant: &PlantId) -> f64 {
        self.actions
            .iter()
            .filter(|a| &a.plant_id == plant)
            .map(|a| a.tons)
            .sum()
    }
}

/// Order plants for dispatch: highest fill ratio first.
///
/// The sort is stable, so plants with equal fill ratios keep snapshot order.
pub fn triage(snapshot: &StorageSnapshot) -> Vec<PlantPlan> {
    let mut order: Vec<PlantPlan> = snapshot
        .levels()
        .iter()
        .map(|level| PlantPlan {
            plant_id: level.plant_id.clone(),
            available_tons: level.available_tons(),
            fill_ratio: level.fill_ratio(),
        })
        .collect();
    order.sort_by(|a, b| b.fill_ratio.total_cmp(&a.fill_ratio));
    order
}

/// Run the greedy allocation walk.
///
/// `is_locked` reports whether a farm is closed by rain today. `score`
/// returns the net carbon impact of sending `load_tons` from a plant to a
/// farm, or `None` when the pair cannot be scored; such farms are skipped.
///
/// Per plant, the candidate load is fixed once at `min(available, truck
/// capacity)`. Each accepted action carries `min(remaining, load)` tons, and
/// the walk stops once the remaining material drops below the minimum
/// dispatch amount.
pub fn allocate<L, S>(
    order: &[PlantPlan],
    farms: &[Farm],
    rules: WalkRules,
    is_locked: L,
    score: S,
) -> Allocation
where
    L: Fn(&Farm) -> bool,
    S: Fn(&PlantId, &Farm, f64) -> Option<f64>,
{
    let mut allocation = Allocation::default();

    for plan in order {
        if plan.available_tons < rules.min_dispatch_tons {
            continue;
        }

        let load_tons = plan.available_tons.min(rules.truck_capacity_tons);
        let mut candidates: Vec<(&Farm, f64)> = farms
            .iter()
            .filter(|farm| !allocation.served.contains(&farm.id) && !is_locked(farm))
            .filter_map(|farm| score(&plan.plant_id, farm, load_tons).map(|nci| (farm, nci)))
            .collect();
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

        let panic = plan.fill_ratio > rules.panic_fill_ratio;
        let mut remaining = plan.available_tons;

        for (farm, nci) in candidates {
            if remaining < rules.min_dispatch_tons {
                break;
            }
            if !(nci > 0.0 || panic) {
                debug!(
                    plant = %plan.plant_id,
                    farm = %farm.id,
                    nci,
                    "Greedy cutoff"
                );
                break;
            }

            let tons = remaining.min(load_tons);
            debug!(
                plant = %plan.plant_id,
                farm = %farm.id,
                tons,
                nci,
                panic,
                "Dispatch accepted"
            );
            allocation.actions.push(Action::new(plan.plant_id.clone(), farm.id.clone(), tons));
            allocation.served.insert(farm.id.clone());
            remaining -= tons;
        }
    }

    allocation
}

// ---------------------------------------------------------------------------
// DispatchSolver
// ---------------------------------------------------------------------------

/// The built-in greedy dispatch solver.
#[derive(Debug, Clone)]
pub struct DispatchSolver {
    /// Heuristic weights.
    solver: SolverConfig,
    /// Nitrogen content and buffer used by the heuristic.
    agronomy: AgronomyConfig,
    /// Rain-lock rule, evaluated before proposing.
    rain_lock: RainLockPolicy,
    /// Walk parameters.
    rules: WalkRules,
}

impl DispatchSolver {
    /// Build a solver from the run configuration.
    pub fn new(config: &DispatchConfig) -> Self {
        let rules = WalkRules {
            truck_capacity_tons: config.logistics.truck_capacity_tons,
            panic_fill_ratio: config.solver.panic_fill_ratio,
            min_dispatch_tons: config.solver.min_dispatch_tons,
        };
        info!(
            advisory_radius_km = config.solver.advisory_radius_km(),
            panic_fill_ratio = rules.panic_fill_ratio,
            soil_credit_multiplier = config.solver.soil_credit_multiplier,
            "Dispatch solver ready"
        );
        Self {
            solver: config.solver.clone(),
            agronomy: config.agronomy.clone(),
            rain_lock: config.environment.rain_lock(),
            rules,
        }
    }

    /// Plan one day.
    pub fn plan_day(&self, day: &DayContext<'_>) -> Vec<Action> {
        let locked = locked_zones(day.registry.farms(), &self.rain_lock, day.rainfall, day.date);
        let order = triage(day.snapshot);

        let allocation = allocate(
            &order,
            day.registry.farms(),
            self.rules,
            |farm| locked.get(&farm.zone).copied().unwrap_or(false),
            |plant, farm, load_tons| {
                let distance_km = farm.distance_to(plant)?;
                let candidate = Candidate {
                    load_tons,
                    distance_km,
                    demand_kg: day.demand.total_kg(farm),
                };
                let score = net_carbon_impact(
                    candidate,
                    &self.solver,
                    &self.agronomy,
                    self.rules.truck_capacity_tons,
                );
                Some(score.net())
            },
        );

        debug!(
            date = %day.date,
            actions = allocation.actions.len(),
            locked_zones = locked.values().filter(|&&l| l).count(),
            "Day planned"
        );
        allocation.actions
    }
}

impl DispatchSource for DispatchSolver {
    fn propose(&mut self, day: &DayContext<'_>) -> Result<Vec<Action>, DispatchError> {
        Ok(self.plan_day(day))
    }
}

/// Rain-lock status of every zone that has at least one farm.
pub fn locked_zones(
    farms: &[Farm],
    policy: &RainLockPolicy,
    rainfall: &dyn RainfallSource,
    date: NaiveDate,
) -> BTreeMap<ZoneId, bool> {
    let mut zones = BTreeMap::new();
    for farm in farms {
        if !zones.contains_key(&farm.zone) {
            zones.insert(farm.zone.clone(), policy.is_locked(rainfall, date, &farm.zone));
        }
    }
    zones
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::BTreeMap;

    use biosolid_types::{FarmSpec, GeoPoint, PlantSpec};
    use biosolid_world::RainfallTable;

    use super::*;
    use crate::storage::StorageState;

    const PLANT_LAT: f64 = 10.0;
    const LON: f64 = 76.0;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()
    }

    fn plant(id: &str, output: f64, max: f64) -> PlantSpec {
        PlantSpec {
            id: PlantId::new(id),
            daily_output_tons: output,
            max_storage_tons: max,
            location: GeoPoint::new(PLANT_LAT, LON),
        }
    }

    /// A farm `lat_offset` degrees north of the plants.
    fn farm(id: &str, zone: &str, lat_offset: f64) -> FarmSpec {
        FarmSpec {
            id: FarmId::new(id),
            zone: ZoneId::new(zone),
            area_ha: 1.0,
            location: GeoPoint::new(PLANT_LAT + lat_offset, LON),
        }
    }

    /// Farms about 333 km away. With no demand each candidate scores about
    /// 240 - 300 = -60.
    /// One empty 100 t plant serving `farms` distant farms.
    fn one_plant(farms: usize) -> Registry {
        Registry::new(vec![plant("STP_A", 0.0, 100.0)], far_farms(farms), 6371.0).unwrap()
    }

    fn far_farms(count: usize) -> Vec<FarmSpec> {
        (0..count)
            .map(|i| farm(&format!("F_{i:03}"), "Z", 3.0))
            .collect()
    }

    fn storage(registry: &Registry, levels: &[(&str, f64)]) -> StorageSnapshot {
        let initial: BTreeMap<PlantId, f64> = levels
            .iter()
            .map(|(id, tons)| (PlantId::new(*id), *tons))
            .collect();
        StorageState::from_levels(registry, &initial).snapshot(registry)
    }

    fn plan(
        registry: &Registry,
        snapshot: &StorageSnapshot,
        rainfall: &RainfallTable,
        demand: &DailyDemand,
    ) -> Vec<Action> {
        let solver = DispatchSolver::new(&DispatchConfig::default());
        solver.plan_day(&DayContext {
            date: date(),
            registry,
            snapshot,
            rainfall,
            demand,
        })
    }

    fn dry() -> RainfallTable {
        RainfallTable::new(date())
    }

    #[test]
    fn panic_mode_dispatches_negative_score_loads() {
        let registry = one_plant(3);
        let snapshot = storage(&registry, &[("STP_A", 95.0)]);
        let actions = plan(&registry, &snapshot, &dry(), &DailyDemand::default());
        assert_eq!(actions.len(), 3);
        assert!(actions.iter().all(|a| (a.tons - 10.0).abs() < 1e-9));
    }

    #[test]
    fn low_fill_with_negative_scores_dispatches_nothing() {
        let registry = one_plant(3);
        let snapshot = storage(&registry, &[("STP_A", 10.0)]);
        let actions = plan(&registry, &snapshot, &dry(), &DailyDemand::default());
        assert!(actions.is_empty());
    }

    #[test]
    fn higher_fill_never_dispatches_less() {
        let registry = one_plant(4);
        let half_full = storage(&registry, &[("STP_A", 50.0)]);
        let nearly_full = storage(&registry, &[("STP_A", 90.0)]);
        let half = plan(&registry, &half_full, &dry(), &DailyDemand::default());
        let panic = plan(&registry, &nearly_full, &dry(), &DailyDemand::default());
        assert!(panic.len() >= half.len());
        assert!(panic.len() > half.len());
    }

    #[test]
    fn farm_without_demand_still_gets_soil_benefit_delivery() {
        // About 11 km away: 240 - 10 > 0.
        let registry = Registry::new(
            vec![plant("STP_A", 0.0, 100.0)],
            vec![farm("F_1", "Z", 0.1)],
            6371.0,
        )
        .unwrap();
        let snapshot = storage(&registry, &[("STP_A", 20.0)]);
        let actions = plan(&registry, &snapshot, &dry(), &DailyDemand::default());
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].farm_id.as_str(), "F_1");
    }

    #[test]
    fn each_farm_served_at_most_once() {
        let registry = Registry::new(
            vec![plant("STP_A", 0.0, 100.0), plant("STP_B", 0.0, 100.0)],
            vec![farm("F_1", "Z", 0.1)],
            6371.0,
        )
        .unwrap();
        let snapshot = storage(&registry, &[("STP_A", 95.0), ("STP_B", 90.0)]);
        let actions = plan(&registry, &snapshot, &dry(), &DailyDemand::default());
        assert_eq!(actions.len(), 1);
        // The fuller plant is triaged first.
        assert_eq!(actions[0].plant_id.as_str(), "STP_A");
    }

    #[test]
    fn rain_locked_farms_are_skipped() {
        let registry = Registry::new(
            vec![plant("STP_A", 0.0, 100.0)],
            vec![farm("F_1", "Wet", 0.1), farm("F_2", "Dry", 0.2)],
            6371.0,
        )
        .unwrap();
        let rainfall = RainfallTable::new(date()).with_zone(ZoneId::new("Wet"), vec![40.0]);
        let snapshot = storage(&registry, &[("STP_A", 95.0)]);
        let actions = plan(&registry, &snapshot, &rainfall, &DailyDemand::default());
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].farm_id.as_str(), "F_2");
    }

    #[test]
    fn walk_splits_available_into_loads_and_stops_below_minimum() {
        let farms = (0..5).map(|i| farm(&format!("F_{i}"), "Z", 0.1)).collect();
        let registry = Registry::new(vec![plant("STP_A", 0.0, 100.0)], farms, 6371.0).unwrap();
        let snapshot = storage(&registry, &[("STP_A", 25.0)]);
        let actions = plan(&registry, &snapshot, &dry(), &DailyDemand::default());
        let tons: Vec<f64> = actions.iter().map(|a| a.tons).collect();
        assert_eq!(tons.len(), 3);
        assert!((tons[0] - 10.0).abs() < 1e-9);
        assert!((tons[1] - 10.0).abs() < 1e-9);
        assert!((tons[2] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn plant_below_minimum_is_skipped() {
        let registry = Registry::new(
            vec![plant("STP_A", 0.5, 100.0)],
            vec![farm("F_1", "Z", 0.1)],
            6371.0,
        )
        .unwrap();
        let snapshot = storage(&registry, &[("STP_A", 0.4)]);
        let actions = plan(&registry, &snapshot, &dry(), &DailyDemand::default());
        assert!(actions.is_empty());
    }

    #[test]
    fn never_exceeds_available_material() {
        let farms = (0..8).map(|i| farm(&format!("F_{i}"), "Z", 0.1)).collect();
        let registry = Registry::new(vec![plant("STP_A", 3.0, 100.0)], farms, 6371.0).unwrap();
        let snapshot = storage(&registry, &[("STP_A", 94.0)]);
        let actions = plan(&registry, &snapshot, &dry(), &DailyDemand::default());
        let total: f64 = actions.iter().map(|a| a.tons).sum();
        assert!(total <= 97.0 + 1e-9);
        assert_eq!(actions.len(), 8);
    }

    #[test]
    fn zero_capacity_plant_is_never_urgent() {
        let registry = Registry::new(
            vec![plant("STP_EMPTY", 5.0, 0.0), plant("STP_HALF", 0.0, 100.0)],
            vec![farm("F_1", "Z", 0.1)],
            6371.0,
        )
        .unwrap();
        let snapshot = storage(&registry, &[("STP_HALF", 50.0)]);
        let order = triage(&snapshot);
        assert_eq!(order[0].plant_id.as_str(), "STP_HALF");
        assert!(order[1].fill_ratio.abs() < 1e-12);
        assert!((order[1].available_tons - 5.0).abs() < 1e-12);
    }

    #[test]
    fn triage_is_stable_for_equal_fill() {
        let registry = Registry::new(
            vec![plant("STP_B", 0.0, 100.0), plant("STP_A", 0.0, 100.0)],
            vec![farm("F_1", "Z", 0.1)],
            6371.0,
        )
        .unwrap();
        let snapshot = storage(&registry, &[("STP_A", 40.0), ("STP_B", 40.0)]);
        let order = triage(&snapshot);
        assert_eq!(order[0].plant_id.as_str(), "STP_B");
    }

    #[test]
    fn allocate_is_pure_over_its_inputs() {
        let registry = Registry::new(
            vec![plant("STP_A", 0.0, 100.0)],
            vec![farm("F_1", "Z", 0.1), farm("F_2", "Z", 0.2), farm("F_3", "Z", 0.3)],
            6371.0,
        )
        .unwrap();
        let order = vec![PlantPlan {
            plant_id: PlantId::new("STP_A"),
            available_tons: 30.0,
            fill_ratio: 0.3,
        }];
        let rules = WalkRules {
            truck_capacity_tons: 10.0,
            panic_fill_ratio: 0.8,
            min_dispatch_tons: 1.0,
        };
        // F_2 is locked; F_3 scores best; F_1 scores negative and ends the walk.
        let scores: BTreeMap<&str, f64> = [("F_1", -1.0), ("F_2", 500.0), ("F_3", 100.0)].into();
        let allocation = allocate(
            &order,
            registry.farms(),
            rules,
            |farm| farm.id.as_str() == "F_2",
            |_, farm, _| scores.get(farm.id.as_str()).copied(),
        );
        assert_eq!(allocation.actions.len(), 1);
        assert_eq!(allocation.actions[0].farm_id.as_str(), "F_3");
        assert!(allocation.served.contains(&FarmId::new("F_3")));
        assert!((allocation.tons_from(&PlantId::new("STP_A")) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn demand_makes_distant_farms_worthwhile() {
        let registry = one_plant(1);
        let snapshot = storage(&registry, &[("STP_A", 10.0)]);
        let mut per_ha = BTreeMap::new();
        per_ha.insert(FarmId::new("F_000"), 250.0);
        let actions = plan(&registry, &snapshot, &dry(), &DailyDemand::new(per_ha));
        assert_eq!(actions.len(), 1);
    }
}

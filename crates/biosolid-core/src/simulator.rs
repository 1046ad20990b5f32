//! Simulation engine: applies one day of actions and scores the result.
//!
//! The simulator is the only component that mutates plant storage. A day
//! proceeds in three steps:
//!
//! 1. **Resolve** every action into an [`ActionOutcome`]. Rain-lock is
//!    re-checked here regardless of who proposed the action. A locked
//!    destination turns the load into a dumped one: emissions and a dump
//!    penalty are charged and the material still leaves the plant.
//! 2. **Account** each farm once, on the tons it received in total.
//! 3. **Settle** every plant: add production, subtract what left, clamp at
//!    zero, and discard anything above capacity as overflow.
//!
//! Actions naming unregistered plants or farms are the only errors. They are
//! detected before storage is touched, so a failed day leaves storage as it
//! was.

use std::collections::BTreeMap;

use biosolid_types::{Action, ActionOutcome, DailyResult, FarmId, PenaltyBreakdown, PlantId, ZoneId};
use biosolid_world::{DailyDemand, RainLockPolicy, RainfallSource, Registry};
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::config::{AgronomyConfig, DispatchConfig, EnvironmentConfig, LogisticsConfig};
use crate::scoring::{overflow_penalty, score_farm_delivery, transport_emissions};
use crate::storage::StorageState;

/// Errors that can occur while simulating a day.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// An action names a plant that is not registered.
    #[error("action on {date} references unknown plant {plant}")]
    UnknownPlant {
        /// The simulated day.
        date: NaiveDate,
        /// The unknown plant.
        plant: PlantId,
    },

    /// An action names a farm that is not registered.
    #[error("action on {date} references unknown farm {farm}")]
    UnknownFarm {
        /// The simulated day.
        date: NaiveDate,
        /// The unknown farm.
        farm: FarmId,
    },
}

/// End-of-day state change of one plant.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PlantSettlement {
    /// Plant identifier.
    pub plant_id: PlantId,
    /// Storage plus production before dispatch.
    pub available_tons: f64,
    /// Tons that left the plant, dumped loads included.
    pub dispatched_tons: f64,
    /// Storage carried into the next day.
    pub storage_tons: f64,
    /// Tons discarded for exceeding capacity.
    pub overflow_tons: f64,
    /// Whether more left the plant than it had.
    pub clamped: bool,
}

/// Everything the simulator produced for one day.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DaySettlement {
    /// The day's score record.
    pub result: DailyResult,
    /// One outcome per action, in action order.
    pub outcomes: Vec<ActionOutcome>,
    /// One settlement per plant, in registry order.
    pub plants: Vec<PlantSettlement>,
}

/// The authoritative daily state transition.
#[derive(Debug, Clone)]
pub struct Simulator {
    /// Truck capacity and emission factor.
    logistics: LogisticsConfig,
    /// Nitrogen and soil accounting constants.
    agronomy: AgronomyConfig,
    /// Overflow penalty.
    environment: EnvironmentConfig,
    /// Rain-lock rule.
    rain_lock: RainLockPolicy,
}

impl Simulator {
    /// Build a simulator from the run configuration.
    pub fn new(config: &DispatchConfig) -> Self {
        Self {
            logistics: config.logistics.clone(),
            agronomy: config.agronomy.clone(),
            environment: config.environment.clone(),
            rain_lock: config.environment.rain_lock(),
        }
    }

    /// Apply one day's actions to `storage` and score the day.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError`] if an action references an unknown plant
    /// or farm. Storage is left unchanged in that case.
    pub fn run_day(
        &self,
        date: NaiveDate,
        actions: &[Action],
        registry: &Registry,
        storage: &mut StorageState,
        rainfall: &dyn RainfallSource,
        demand: &DailyDemand,
    ) -> Result<DaySettlement, SimulationError> {
        let mut locked: BTreeMap<ZoneId, bool> = BTreeMap::new();
        let mut outcomes = Vec::with_capacity(actions.len());
        let mut dispatched: BTreeMap<PlantId, f64> = BTreeMap::new();
        let mut received: BTreeMap<FarmId, f64> = BTreeMap::new();
        let mut emissions = 0.0;
        let mut dumping = 0.0;
        let mut delivered_tons = 0.0;
        let mut rejected: u32 = 0;

        // Resolve.
        for action in actions {
            if registry.plant(&action.plant_id).is_none() {
                return Err(SimulationError::UnknownPlant {
                    date,
                    plant: action.plant_id.clone(),
                });
            }
            let farm = registry.farm(&action.farm_id).ok_or_else(|| SimulationError::UnknownFarm {
                date,
                farm: action.farm_id.clone(),
            })?;
            let distance_km = farm.distance_to(&action.plant_id).ok_or_else(|| {
                SimulationError::UnknownPlant {
                    date,
                    plant: action.plant_id.clone(),
                }
            })?;

            let trip_emissions = transport_emissions(distance_km, action.tons, &self.logistics);
            emissions += trip_emissions;
            *dispatched.entry(action.plant_id.clone()).or_insert(0.0) += action.tons;

            let is_locked = *locked
                .entry(farm.zone.clone())
                .or_insert_with(|| self.rain_lock.is_locked(rainfall, date, &farm.zone));

            if is_locked {
                let penalty = overflow_penalty(action.tons, &self.environment);
                dumping += penalty;
                rejected = rejected.saturating_add(1);
                debug!(
                    date = %date,
                    plant = %action.plant_id,
                    farm = %action.farm_id,
                    zone = %farm.zone,
                    tons = action.tons,
                    penalty,
                    "Action rejected: zone rain-locked, load dumped"
                );
                outcomes.push(ActionOutcome::Dumped {
                    action: action.clone(),
                    emissions: trip_emissions,
                    penalty,
                });
            } else {
                *received.entry(action.farm_id.clone()).or_insert(0.0) += action.tons;
                delivered_tons += action.tons;
                outcomes.push(ActionOutcome::Delivered {
                    action: action.clone(),
                    emissions: trip_emissions,
                });
            }
        }

        // Account.
        let mut credits = 0.0;
        let mut leaching = 0.0;
        for (farm_id, tons) in &received {
            let demand_kg = registry
                .farm(farm_id)
                .map_or(0.0, |farm| demand.total_kg(farm));
            let account = score_farm_delivery(*tons, demand_kg, &self.agronomy);
            credits += account.credits();
            leaching += account.leaching_penalty;
        }

        // Settle.
        let mut plants = Vec::with_capacity(registry.plant_count());
        let mut overflow_tons = 0.0;
        let mut overflow = 0.0;
        for plant in registry.plants() {
            let available_tons = storage.level(&plant.id) + plant.daily_output_tons;
            let dispatched_tons = dispatched.get(&plant.id).copied().unwrap_or(0.0);
            let remaining = available_tons - dispatched_tons;
            let clamped = remaining < 0.0;
            if clamped {
                warn!(
                    date = %date,
                    plant = %plant.id,
                    available_tons,
                    dispatched_tons,
                    "Dispatched more than available; storage clamped at zero"
                );
            }

            let mut storage_tons = remaining.max(0.0);
            let mut plant_overflow = 0.0;
            if storage_tons > plant.max_storage_tons {
                plant_overflow = storage_tons - plant.max_storage_tons;
                storage_tons = plant.max_storage_tons;
                overflow += overflow_penalty(plant_overflow, &self.environment);
                overflow_tons += plant_overflow;
                warn!(
                    date = %date,
                    plant = %plant.id,
                    overflow_tons = plant_overflow,
                    max_storage_tons = plant.max_storage_tons,
                    "Storage overflow; excess discarded"
                );
            }

            storage.set_level(&plant.id, storage_tons);
            plants.push(PlantSettlement {
                plant_id: plant.id.clone(),
                available_tons,
                dispatched_tons,
                storage_tons,
                overflow_tons: plant_overflow,
                clamped,
            });
        }

        let result = DailyResult::new(
            date,
            credits,
            emissions,
            PenaltyBreakdown {
                leaching,
                overflow,
                dumping,
            },
            delivered_tons,
            overflow_tons,
            rejected,
        );

        Ok(DaySettlement {
            result,
            outcomes,
            plants,
        })
    }
}

//! Annual driver.
//!
//! [`run_horizon`] runs the closed loop once per calendar day: snapshot
//! storage, ask the dispatch source for a plan, let the simulator apply it.
//! Days are strictly sequential because storage carries forward.
//!
//! The run produces the per-day [`DailyResult`] series and a dense
//! [`DeliveryTable`] with one row per farm per day.

use std::collections::BTreeMap;

use biosolid_types::{ActionOutcome, DailyResult, FarmId, PenaltyBreakdown, PlantId};
use biosolid_world::{DemandSource, RainfallSource, Registry, WorldError};
use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use tracing::info;

use crate::config::{ConfigError, DispatchConfig};
use crate::simulator::{SimulationError, Simulator};
use crate::solver::{DayContext, DispatchError, DispatchSource};
use crate::storage::StorageState;

/// Errors that can occur during an annual run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The configuration failed validation.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The registry could not answer a structural lookup.
    #[error("registry error: {source}")]
    World {
        /// The underlying registry error.
        #[from]
        source: WorldError,
    },

    /// The dispatch source failed.
    #[error("dispatch error: {source}")]
    Dispatch {
        /// The underlying dispatch error.
        #[from]
        source: DispatchError,
    },

    /// A simulated day failed.
    #[error("simulation error: {source}")]
    Simulation {
        /// The underlying simulation error.
        #[from]
        source: SimulationError,
    },

    /// The horizon runs past the last representable date.
    #[error("horizon overflows the calendar: {start} + {day_index} days")]
    DateOverflow {
        /// First date of the run.
        start: NaiveDate,
        /// Day offset that could not be represented.
        day_index: u32,
    },
}

// ---------------------------------------------------------------------------
// Delivery table
// ---------------------------------------------------------------------------

/// One row of the dense delivery table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryRow {
    /// Row number, consecutive from zero.
    pub id: u64,
    /// Calendar date.
    pub date: NaiveDate,
    /// Delivering plant, or the farm's closest plant when nothing arrived.
    pub plant_id: PlantId,
    /// Receiving farm.
    pub farm_id: FarmId,
    /// Tons delivered, zero when nothing arrived.
    pub tons: f64,
}

/// Dense table of deliveries: every farm, every day of the horizon.
///
/// Rows are grouped by farm (sorted by id), then ordered by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DeliveryTable {
    /// All rows.
    rows: Vec<DeliveryRow>,
}

impl DeliveryTable {
    /// All rows.
    pub fn rows(&self) -> &[DeliveryRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row for one farm on one date.
    pub fn row(&self, date: NaiveDate, farm: &FarmId) -> Option<&DeliveryRow> {
        self.rows.iter().find(|r| r.date == date && &r.farm_id == farm)
    }

    /// Tons delivered on the given date across all farms.
    pub fn tons_on(&self, date: NaiveDate) -> f64 {
        self.rows.iter().filter(|r| r.date == date).map(|r| r.tons).sum()
    }
}

/// Delivered loads of one farm on one date.
#[derive(Debug, Clone)]
struct Received {
    /// First plant that delivered.
    plant_id: PlantId,
    /// Tons delivered in total.
    tons: f64,
}

/// Build the dense table from the delivered loads of the run.
fn build_delivery_table(
    registry: &Registry,
    dates: &[NaiveDate],
    received: &BTreeMap<(FarmId, NaiveDate), Received>,
) -> Result<DeliveryTable, RunnerError> {
    let mut farms: Vec<_> = registry.farms().iter().collect();
    farms.sort_by(|a, b| a.id.cmp(&b.id));

    let mut rows = Vec::with_capacity(farms.len().saturating_mul(dates.len()));
    let mut next_id: u64 = 0;
    for farm in farms {
        let closest = farm.closest_plant().ok_or(WorldError::NoPlants)?;
        for &date in dates {
            let (plant_id, tons) = received
                .get(&(farm.id.clone(), date))
                .map_or_else(|| (closest.clone(), 0.0), |r| (r.plant_id.clone(), r.tons));
            rows.push(DeliveryRow {
                id: next_id,
                date,
                plant_id,
                farm_id: farm.id.clone(),
                tons,
            });
            next_id = next_id.saturating_add(1);
        }
    }
    Ok(DeliveryTable { rows })
}

// ---------------------------------------------------------------------------
// Annual run
// ---------------------------------------------------------------------------

/// Sums of every score component over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunTotals {
    /// Days simulated.
    pub days: u32,
    /// Total credits.
    pub credits: f64,
    /// Total transport emissions.
    pub emissions: f64,
    /// Total penalties.
    pub penalties: f64,
    /// Penalty components.
    pub penalty_breakdown: PenaltyBreakdown,
    /// Total net score.
    pub net_score: f64,
    /// Total tons applied at farms.
    pub delivered_tons: f64,
    /// Total tons discarded for overflow.
    pub overflow_tons: f64,
    /// Total rain-locked rejections.
    pub rejected_actions: u64,
}

/// The outcome of a full run.
#[derive(Debug, Clone, Serialize)]
pub struct AnnualRun {
    /// One result per simulated day.
    pub daily: Vec<DailyResult>,
    /// Dense delivery table.
    pub deliveries: DeliveryTable,
    /// Storage after the last day.
    pub final_storage: StorageState,
}

impl AnnualRun {
    /// Sum every component of the daily results.
    pub fn totals(&self) -> RunTotals {
        self.daily.iter().fold(RunTotals::default(), |mut acc, day| {
            acc.days = acc.days.saturating_add(1);
            acc.credits += day.credits;
            acc.emissions += day.emissions;
            acc.penalties += day.penalties;
            acc.penalty_breakdown.leaching += day.penalty_breakdown.leaching;
            acc.penalty_breakdown.overflow += day.penalty_breakdown.overflow;
            acc.penalty_breakdown.dumping += day.penalty_breakdown.dumping;
            acc.net_score += day.net_score;
            acc.delivered_tons += day.delivered_tons;
            acc.overflow_tons += day.overflow_tons;
            acc.rejected_actions = acc
                .rejected_actions
                .saturating_add(u64::from(day.rejected_actions));
            acc
        })
    }

    /// Running total of the net score, one point per day.
    pub fn cumulative_net_score(&self) -> Vec<(NaiveDate, f64)> {
        self.daily
            .iter()
            .scan(0.0, |total, day| {
                *total += day.net_score;
                Some((day.date, *total))
            })
            .collect()
    }
}

/// Reference data a run reads from.
#[derive(Clone, Copy)]
pub struct RunInputs<'a> {
    /// Plants and farms.
    pub registry: &'a Registry,
    /// Rainfall forecasts.
    pub rainfall: &'a dyn RainfallSource,
    /// Nitrogen demand.
    pub demand: &'a dyn DemandSource,
}

/// Run the closed loop over the configured horizon.
///
/// # Errors
///
/// Returns [`RunnerError`] if the configuration is invalid, the dispatch
/// source fails, an action names an unknown plant or farm, or the horizon
/// runs off the calendar.
pub fn run_horizon(
    config: &DispatchConfig,
    inputs: RunInputs<'_>,
    source: &mut dyn DispatchSource,
    mut storage: StorageState,
) -> Result<AnnualRun, RunnerError> {
    config.validate()?;

    let simulator = Simulator::new(config);
    let start = config.run.start_date;
    let horizon = config.run.horizon_days;

    info!(
        %start,
        horizon_days = horizon,
        plants = inputs.registry.plant_count(),
        farms = inputs.registry.farm_count(),
        "Run starting"
    );

    let mut daily = Vec::with_capacity(usize::try_from(horizon).unwrap_or(0));
    let mut dates = Vec::with_capacity(daily.capacity());
    let mut received: BTreeMap<(FarmId, NaiveDate), Received> = BTreeMap::new();
    let mut month_net = 0.0;

    for day_index in 0..horizon {
        let date = start
            .checked_add_days(Days::new(u64::from(day_index)))
            .ok_or(RunnerError::DateOverflow { start, day_index })?;

        if day_index > 0 && date.day() == 1 {
            info!(
                month_ending = %date.pred_opt().unwrap_or(date),
                net_score = month_net,
                storage_tons = storage.total_tons(),
                "Month complete"
            );
            month_net = 0.0;
        }

        let snapshot = storage.snapshot(inputs.registry);
        let demand = inputs.demand.demand_on(date);
        let actions = source.propose(&DayContext {
            date,
            registry: inputs.registry,
            snapshot: &snapshot,
            rainfall: inputs.rainfall,
            demand: &demand,
        })?;

        let settlement = simulator.run_day(
            date,
            &actions,
            inputs.registry,
            &mut storage,
            inputs.rainfall,
            &demand,
        )?;

        for outcome in &settlement.outcomes {
            if let ActionOutcome::Delivered { action, .. } = outcome {
                received
                    .entry((action.farm_id.clone(), date))
                    .and_modify(|r| r.tons += action.tons)
                    .or_insert_with(|| Received {
                        plant_id: action.plant_id.clone(),
                        tons: action.tons,
                    });
            }
        }

        month_net += settlement.result.net_score;
        daily.push(settlement.result);
        dates.push(date);
    }

    let deliveries = build_delivery_table(inputs.registry, &dates, &received)?;
    let run = AnnualRun {
        daily,
        deliveries,
        final_storage: storage,
    };

    let totals = run.totals();
    info!(
        days = totals.days,
        net_score = totals.net_score,
        credits = totals.credits,
        emissions = totals.emissions,
        penalties = totals.penalties,
        delivered_tons = totals.delivered_tons,
        overflow_tons = totals.overflow_tons,
        rejected_actions = totals.rejected_actions,
        "Run complete"
    );

    Ok(run)
}

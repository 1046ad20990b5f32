//! Dispatch engine binary.
//!
//! Runs one annual dispatch loop over a demonstration region and prints a
//! JSON summary to stdout.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `biosolid-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build the demonstration region (plants, farms, rainfall, demand)
//! 4. Run the solver and simulator for every day of the horizon
//! 5. Write the delivery table if `output.deliveries_path` is set
//! 6. Log the totals and print the summary

mod error;
mod region;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use biosolid_core::runner::RunTotals;
use biosolid_core::{
    DeliveryTable, DispatchConfig, DispatchSolver, RunInputs, StorageState, run_horizon,
};
use biosolid_types::{DailyResult, PlantId};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::region::Region;

/// Path of the configuration file, relative to the working directory.
const CONFIG_PATH: &str = "biosolid-config.yaml";

/// Printed at the end of a run.
#[derive(Debug, Serialize)]
struct Summary {
    /// First simulated date.
    start_date: NaiveDate,
    /// Sums over the whole run.
    totals: RunTotals,
    /// Storage per plant after the last day.
    final_storage: Vec<(PlantId, f64)>,
    /// Rows in the dense delivery table.
    delivery_rows: usize,
    /// Rows with a non-zero delivery.
    nonzero_deliveries: usize,
    /// Day with the highest net score.
    best_day: Option<(NaiveDate, f64)>,
    /// Day with the lowest net score.
    worst_day: Option<(NaiveDate, f64)>,
}

/// Application entry point for the dispatch engine.
///
/// # Errors
///
/// Returns an error if configuration, region construction, or the run
/// fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("biosolid-engine starting");
    info!(
        from_file,
        start_date = %config.run.start_date,
        horizon_days = config.run.horizon_days,
        truck_capacity_tons = config.logistics.truck_capacity_tons,
        rain_lock_threshold_mm = config.environment.rain_lock_threshold_mm,
        "Configuration loaded"
    );

    // 3. Build the region.
    let region = Region::build(&config)?;

    // 4. Run.
    let mut solver = DispatchSolver::new(&config);
    let run = run_horizon(
        &config,
        RunInputs {
            registry: &region.registry,
            rainfall: &region.rainfall,
            demand: &region.demand,
        },
        &mut solver,
        StorageState::empty(&region.registry),
    )
    .map_err(EngineError::from)?;

    // 5. Write the delivery table.
    if let Some(path) = &config.output.deliveries_path {
        write_deliveries(path, &run.deliveries)?;
        info!(path = %path.display(), rows = run.deliveries.len(), "Delivery table written");
    }

    // 6. Report.
    let totals = run.totals();
    let by_net = |a: &&DailyResult, b: &&DailyResult| a.net_score.total_cmp(&b.net_score);
    let summary = Summary {
        start_date: config.run.start_date,
        totals,
        final_storage: run
            .final_storage
            .levels()
            .iter()
            .map(|(id, tons)| (id.clone(), *tons))
            .collect(),
        delivery_rows: run.deliveries.len(),
        nonzero_deliveries: run.deliveries.rows().iter().filter(|r| r.tons > 0.0).count(),
        best_day: run.daily.iter().max_by(by_net).map(|d| (d.date, d.net_score)),
        worst_day: run.daily.iter().min_by(by_net).map(|d| (d.date, d.net_score)),
    };

    let json = serde_json::to_string_pretty(&summary).map_err(EngineError::from)?;
    println!("{json}");

    info!(
        net_score = totals.net_score,
        delivered_tons = totals.delivered_tons,
        "biosolid-engine shutdown complete"
    );

    Ok(())
}

/// Load the configuration from `biosolid-config.yaml`.
///
/// Looks for the config file relative to the current working directory and
/// falls back to defaults when it does not exist. Returns whether the file
/// was read.
fn load_config() -> Result<(DispatchConfig, bool), EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        let config = DispatchConfig::from_file(config_path)?;
        Ok((config, true))
    } else {
        Ok((DispatchConfig::default(), false))
    }
}

/// Write the dense delivery table to `path` as a JSON array, creating
/// parent directories as needed.
fn write_deliveries(path: &Path, table: &DeliveryTable) -> Result<(), EngineError> {
    let output = |source: std::io::Error| EngineError::Output {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(output)?;
    }
    let mut writer = BufWriter::new(File::create(path).map_err(output)?);
    serde_json::to_writer_pretty(&mut writer, table)?;
    writer.flush().map_err(output)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn delivery_table_is_written_as_json() {
        let mut config = DispatchConfig::default();
        config.region.farm_count = 4;
        config.run.horizon_days = 3;
        let region = Region::build(&config).unwrap();
        let mut solver = DispatchSolver::new(&config);
        let run = run_horizon(
            &config,
            RunInputs {
                registry: &region.registry,
                rainfall: &region.rainfall,
                demand: &region.demand,
            },
            &mut solver,
            StorageState::empty(&region.registry),
        )
        .unwrap();

        let unique = format!(
            "biosolid_test_deliveries_{}_{:?}",
            std::process::id(),
            std::thread::current().id(),
        );
        let path = std::env::temp_dir().join(unique).join("deliveries.json");
        write_deliveries(&path, &run.deliveries).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let rows = written.as_array().unwrap();
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0]["id"], 0);
        assert_eq!(rows[0]["farm_id"], "F_0000");

        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }
}

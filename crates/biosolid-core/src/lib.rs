//! Daily dispatch decisions and state transitions for biosolid logistics.
//!
//! This crate owns the closed loop that drives a run: each day the solver
//! observes plant storage and proposes deliveries, and the simulator applies
//! them, enforces the rain-lock rule, scores the day, and produces the next
//! day's storage.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `biosolid-config.yaml` into
//!   strongly-typed structs.
//! - [`runner`] -- [`run_horizon`], the annual loop and dense delivery table.
//! - [`scoring`] -- The solver's heuristic and the simulator's accounting.
//! - [`simulator`] -- [`Simulator`], the authoritative daily transition.
//! - [`solver`] -- [`DispatchSource`] trait and the greedy
//!   [`DispatchSolver`].
//! - [`storage`] -- [`StorageState`] and the day-start
//!   [`StorageSnapshot`].

pub mod config;
pub mod runner;
pub mod scoring;
pub mod simulator;
pub mod solver;
pub mod storage;

pub use config::{ConfigError, DispatchConfig};
pub use runner::{
    AnnualRun, DeliveryRow, DeliveryTable, RunInputs, RunTotals, RunnerError, run_horizon,
};
pub use simulator::{DaySettlement, PlantSettlement, SimulationError, Simulator};
pub use solver::{DayContext, DispatchError, DispatchSolver, DispatchSource};
pub use storage::{StorageSnapshot, StorageState};

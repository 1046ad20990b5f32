//! Shared type definitions for the biosolid dispatch engine.
//!
//! This crate is the single source of truth for the value types that flow
//! between the registry layer, the dispatch solver, the simulator, and the
//! annual driver.
//!
//! # Modules
//!
//! - [`ids`] -- Newtype identifiers for plants, farms, and rainfall zones
//! - [`structs`] -- Registry records (`PlantSpec`, `FarmSpec`, `GeoPoint`)
//! - [`actions`] -- Planned deliveries and their resolved outcomes
//! - [`results`] -- Per-day score records

pub mod actions;
pub mod ids;
pub mod results;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use actions::{Action, ActionOutcome};
pub use ids::{FarmId, PlantId, ZoneId};
pub use results::{DailyResult, PenaltyBreakdown};
pub use structs::{FarmSpec, GeoPoint, PlantSpec};

//! Registry, geography, rainfall, and demand for the biosolid dispatch engine.
//!
//! This crate is the reference-data layer. It holds everything that does not
//! change while a run is in progress: plant and farm records, the
//! farm-to-plant distance table, rainfall forecasts, and nitrogen demand.
//!
//! # Modules
//!
//! - [`climate`] -- Deterministic monsoon rainfall generator for
//!   demonstration regions.
//! - [`demand`] -- [`DemandSource`] trait, per-date [`DailyDemand`], and the
//!   in-memory [`DemandTable`].
//! - [`error`] -- Error types for registry construction.
//! - [`geo`] -- Haversine great-circle distance.
//! - [`rainfall`] -- [`RainfallSource`] trait, [`RainfallTable`], and the
//!   [`RainLockPolicy`] rule.
//! - [`registry`] -- [`Registry`] of plants and farms with precomputed
//!   distances.

pub mod climate;
pub mod demand;
pub mod error;
pub mod geo;
pub mod rainfall;
pub mod registry;

// Re-export primary types at crate root.
pub use climate::MonsoonGenerator;
pub use demand::{DailyDemand, DemandSource, DemandTable};
pub use error::WorldError;
pub use geo::{DEFAULT_EARTH_RADIUS_KM, haversine_km};
pub use rainfall::{RainLockPolicy, RainfallSource, RainfallTable, exceeds_threshold};
pub use registry::{Farm, Registry};

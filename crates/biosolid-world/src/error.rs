//! Error types for the `biosolid-world` crate.
//!
//! Registry construction is the only fallible step in this crate. Every
//! variant here is a structural problem with the reference data that must
//! stop the run at start-up, before any day is simulated.

use biosolid_types::{FarmId, PlantId};

/// Errors that can occur while building or querying the registry.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The plant registry is empty.
    #[error("no plants defined")]
    NoPlants,

    /// The farm registry is empty.
    #[error("no farms defined")]
    NoFarms,

    /// Two plant rows share an identifier.
    #[error("duplicate plant id: {0}")]
    DuplicatePlant(PlantId),

    /// Two farm rows share an identifier.
    #[error("duplicate farm id: {0}")]
    DuplicateFarm(FarmId),

    /// A farm has a zero, negative, or non-finite area.
    #[error("farm {farm} has invalid area {area_ha} ha")]
    InvalidFarmArea {
        /// The offending farm.
        farm: FarmId,
        /// The area read from the registry.
        area_ha: f64,
    },

    /// A plant has a negative or non-finite output or storage capacity.
    #[error("plant {plant} has invalid capacity ({daily_output_tons} t/day, {max_storage_tons} t)")]
    InvalidPlantCapacity {
        /// The offending plant.
        plant: PlantId,
        /// Daily output read from the registry.
        daily_output_tons: f64,
        /// Storage capacity read from the registry.
        max_storage_tons: f64,
    },

    /// A coordinate is non-finite or outside the valid degree range.
    #[error("invalid coordinate for {entity}: ({lat}, {lon})")]
    InvalidCoordinate {
        /// Identifier of the plant or farm.
        entity: String,
        /// Latitude in degrees.
        lat: f64,
        /// Longitude in degrees.
        lon: f64,
    },

    /// The earth radius used for distances is not a positive finite number.
    #[error("invalid earth radius: {0} km")]
    InvalidEarthRadius(f64),

    /// A plant identifier is not in the registry.
    #[error("plant not found: {0}")]
    UnknownPlant(PlantId),

    /// A farm identifier is not in the registry.
    #[error("farm not found: {0}")]
    UnknownFarm(FarmId),
}

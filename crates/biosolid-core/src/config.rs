//! Configuration loading and typed config structures for the dispatch engine.
//!
//! The canonical configuration lives in `biosolid-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file.
//!
//! Every field has a default equal to the constant used by the scoring
//! rules, so an empty file yields a fully working configuration.

use std::path::{Path, PathBuf};

use biosolid_world::{DEFAULT_EARTH_RADIUS_KM, RainLockPolicy};
use chrono::NaiveDate;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is outside its valid range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level dispatch configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DispatchConfig {
    /// Trucks and transport emissions.
    #[serde(default)]
    pub logistics: LogisticsConfig,

    /// Nitrogen and soil-carbon accounting.
    #[serde(default)]
    pub agronomy: AgronomyConfig,

    /// Rain-lock and overflow rules.
    #[serde(default)]
    pub environment: EnvironmentConfig,

    /// Heuristic constants of the dispatch solver.
    #[serde(default)]
    pub solver: SolverConfig,

    /// Simulated horizon.
    #[serde(default)]
    pub run: RunConfig,

    /// Demonstration region used by the engine binary.
    #[serde(default)]
    pub region: RegionConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Files written by the engine binary.
    #[serde(default)]
    pub output: OutputConfig,
}

impl DispatchConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document means all defaults.
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("logistics.truck_capacity_tons", self.logistics.truck_capacity_tons),
            ("logistics.emission_factor_per_truck_km", self.logistics.emission_factor_per_truck_km),
            ("logistics.earth_radius_km", self.logistics.earth_radius_km),
            ("agronomy.nitrogen_content_kg_per_ton", self.agronomy.nitrogen_content_kg_per_ton),
            (
                "agronomy.synthetic_offset_credit_per_kg_n",
                self.agronomy.synthetic_offset_credit_per_kg_n,
            ),
            ("agronomy.soil_credit_per_kg_biosolid", self.agronomy.soil_credit_per_kg_biosolid),
            (
                "agronomy.leaching_penalty_per_kg_excess_n",
                self.agronomy.leaching_penalty_per_kg_excess_n,
            ),
            ("agronomy.application_buffer_percent", self.agronomy.application_buffer_percent),
            ("environment.rain_lock_threshold_mm", self.environment.rain_lock_threshold_mm),
            ("environment.overflow_penalty_per_ton", self.environment.overflow_penalty_per_ton),
            ("solver.soil_credit_per_ton", self.solver.soil_credit_per_ton),
            ("solver.soil_credit_multiplier", self.solver.soil_credit_multiplier),
            ("solver.nitrogen_offset_weight", self.solver.nitrogen_offset_weight),
            ("solver.transport_cost_per_truck_km", self.solver.transport_cost_per_truck_km),
            ("solver.leaching_weight", self.solver.leaching_weight),
            ("solver.leaching_reference_penalty", self.solver.leaching_reference_penalty),
            ("solver.panic_fill_ratio", self.solver.panic_fill_ratio),
            ("solver.min_dispatch_tons", self.solver.min_dispatch_tons),
        ];
        if let Some((name, value)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(invalid(format!("{name} must be finite, got {value}")));
        }

        if self.logistics.truck_capacity_tons <= 0.0 {
            return Err(invalid("logistics.truck_capacity_tons must be positive"));
        }
        if self.logistics.earth_radius_km <= 0.0 {
            return Err(invalid("logistics.earth_radius_km must be positive"));
        }
        if self.environment.forecast_window_days == 0 {
            return Err(invalid("environment.forecast_window_days must be at least 1"));
        }
        if self.run.horizon_days == 0 {
            return Err(invalid("run.horizon_days must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.into(),
    }
}

/// Truck and transport-emission constants.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogisticsConfig {
    /// Tons carried by one truck.
    #[serde(default = "default_truck_capacity_tons")]
    pub truck_capacity_tons: f64,

    /// Emissions charged per truck per km of one-way distance.
    #[serde(default = "default_emission_factor")]
    pub emission_factor_per_truck_km: f64,

    /// Earth radius used for great-circle distances.
    #[serde(default = "default_earth_radius_km")]
    pub earth_radius_km: f64,
}

impl Default for LogisticsConfig {
    fn default() -> Self {
        Self {
            truck_capacity_tons: default_truck_capacity_tons(),
            emission_factor_per_truck_km: default_emission_factor(),
            earth_radius_km: default_earth_radius_km(),
        }
    }
}

/// Nitrogen and soil-carbon accounting constants.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgronomyConfig {
    /// kg of nitrogen per ton of biosolid.
    #[serde(default = "default_nitrogen_content")]
    pub nitrogen_content_kg_per_ton: f64,

    /// Credit per kg of nitrogen taken up in place of synthetic fertilizer.
    #[serde(default = "default_synthetic_offset_credit")]
    pub synthetic_offset_credit_per_kg_n: f64,

    /// Soil sequestration credit per kg of biosolid applied.
    #[serde(default = "default_soil_credit_per_kg")]
    pub soil_credit_per_kg_biosolid: f64,

    /// Penalty per kg of nitrogen applied beyond demand plus buffer.
    #[serde(default = "default_leaching_penalty")]
    pub leaching_penalty_per_kg_excess_n: f64,

    /// Allowed over-application, as a percentage of demand.
    #[serde(default = "default_buffer_percent")]
    pub application_buffer_percent: f64,
}

impl AgronomyConfig {
    /// The application buffer as a fraction (10% -> 0.1).
    pub fn buffer_fraction(&self) -> f64 {
        self.application_buffer_percent / 100.0
    }
}

impl Default for AgronomyConfig {
    fn default() -> Self {
        Self {
            nitrogen_content_kg_per_ton: default_nitrogen_content(),
            synthetic_offset_credit_per_kg_n: default_synthetic_offset_credit(),
            soil_credit_per_kg_biosolid: default_soil_credit_per_kg(),
            leaching_penalty_per_kg_excess_n: default_leaching_penalty(),
            application_buffer_percent: default_buffer_percent(),
        }
    }
}

/// Rain-lock and overflow constants.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnvironmentConfig {
    /// Summed forecast rainfall above which a zone is locked, in mm.
    #[serde(default = "default_rain_lock_threshold")]
    pub rain_lock_threshold_mm: f64,

    /// Days in the forecast window, the delivery date included.
    #[serde(default = "default_forecast_window_days")]
    pub forecast_window_days: u32,

    /// Penalty per ton of overflowed or dumped material.
    #[serde(default = "default_overflow_penalty")]
    pub overflow_penalty_per_ton: f64,
}

impl EnvironmentConfig {
    /// The rain-lock rule described by this section.
    pub const fn rain_lock(&self) -> RainLockPolicy {
        RainLockPolicy::new(self.rain_lock_threshold_mm, self.forecast_window_days)
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            rain_lock_threshold_mm: default_rain_lock_threshold(),
            forecast_window_days: default_forecast_window_days(),
            overflow_penalty_per_ton: default_overflow_penalty(),
        }
    }
}

/// Heuristic constants of the dispatch solver.
///
/// These only rank and gate candidate deliveries. They are deliberately
/// separate from the scoring constants in [`AgronomyConfig`] and do not
/// have to agree with them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SolverConfig {
    /// Soil benefit per ton delivered.
    #[serde(default = "default_solver_soil_credit")]
    pub soil_credit_per_ton: f64,

    /// Tuning multiplier on the soil benefit.
    #[serde(default = "default_soil_credit_multiplier")]
    pub soil_credit_multiplier: f64,

    /// Benefit per kg of nitrogen that meets demand.
    #[serde(default = "default_nitrogen_offset_weight")]
    pub nitrogen_offset_weight: f64,

    /// Cost per truck per km.
    #[serde(default = "default_transport_cost")]
    pub transport_cost_per_truck_km: f64,

    /// Cost per kg of nitrogen beyond demand plus buffer.
    #[serde(default = "default_leaching_weight")]
    pub leaching_weight: f64,

    /// Leaching penalty used only to derive the advisory delivery radius.
    #[serde(default = "default_leaching_reference_penalty")]
    pub leaching_reference_penalty: f64,

    /// Fill ratio above which negative-score deliveries are accepted.
    #[serde(default = "default_panic_fill_ratio")]
    pub panic_fill_ratio: f64,

    /// Available material below which a plant is not dispatched.
    #[serde(default = "default_min_dispatch_tons")]
    pub min_dispatch_tons: f64,
}

impl SolverConfig {
    /// Distance at which transport cost cancels the soil benefit.
    ///
    /// Logged for reference; the per-candidate score already encodes the
    /// same trade-off, so the radius is never enforced.
    pub fn advisory_radius_km(&self) -> f64 {
        (self.soil_credit_per_ton + self.leaching_reference_penalty)
            / self.transport_cost_per_truck_km
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            soil_credit_per_ton: default_solver_soil_credit(),
            soil_credit_multiplier: default_soil_credit_multiplier(),
            nitrogen_offset_weight: default_nitrogen_offset_weight(),
            transport_cost_per_truck_km: default_transport_cost(),
            leaching_weight: default_leaching_weight(),
            leaching_reference_penalty: default_leaching_reference_penalty(),
            panic_fill_ratio: default_panic_fill_ratio(),
            min_dispatch_tons: default_min_dispatch_tons(),
        }
    }
}

/// Simulated horizon.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// First simulated date.
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,

    /// Number of consecutive days to simulate.
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            start_date: default_start_date(),
            horizon_days: default_horizon_days(),
        }
    }
}

/// Demonstration region parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegionConfig {
    /// Seed for farm placement and synthetic rainfall.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of farms to place.
    #[serde(default = "default_farm_count")]
    pub farm_count: u32,

    /// Rainfall zone names.
    #[serde(default = "default_zones")]
    pub zones: Vec<String>,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            farm_count: default_farm_count(),
            zones: default_zones(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default log level when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Files written by the engine binary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OutputConfig {
    /// Where to write the dense delivery table as JSON. Not written when
    /// unset.
    #[serde(default)]
    pub deliveries_path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_truck_capacity_tons() -> f64 {
    10.0
}

const fn default_emission_factor() -> f64 {
    0.9
}

const fn default_earth_radius_km() -> f64 {
    DEFAULT_EARTH_RADIUS_KM
}

const fn default_nitrogen_content() -> f64 {
    25.0
}

const fn default_synthetic_offset_credit() -> f64 {
    5.0
}

const fn default_soil_credit_per_kg() -> f64 {
    0.2
}

const fn default_leaching_penalty() -> f64 {
    10.0
}

const fn default_buffer_percent() -> f64 {
    10.0
}

const fn default_rain_lock_threshold() -> f64 {
    30.0
}

const fn default_forecast_window_days() -> u32 {
    5
}

const fn default_overflow_penalty() -> f64 {
    1000.0
}

const fn default_solver_soil_credit() -> f64 {
    200.0
}

const fn default_soil_credit_multiplier() -> f64 {
    1.37
}

const fn default_nitrogen_offset_weight() -> f64 {
    5.0
}

const fn default_transport_cost() -> f64 {
    0.9
}

const fn default_leaching_weight() -> f64 {
    10.0
}

const fn default_leaching_reference_penalty() -> f64 {
    50.0
}

const fn default_panic_fill_ratio() -> f64 {
    0.8
}

const fn default_min_dispatch_tons() -> f64 {
    1.0
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default()
}

const fn default_horizon_days() -> u32 {
    365
}

const fn default_seed() -> u64 {
    42
}

const fn default_farm_count() -> u32 {
    60
}

fn default_zones() -> Vec<String> {
    [
        "Thiruvananthapuram",
        "Kollam",
        "Ernakulam",
        "Thrissur",
        "Kozhikode",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_log_level() -> String {
    "info".to_owned()
}

//! Scoring rules.
//!
//! Two independent credit formulas live here:
//!
//! - [`net_carbon_impact`] is the solver's per-ton ranking heuristic. It
//!   uses [`SolverConfig`] weights, including the soil credit multiplier, and
//!   only decides which deliveries to attempt.
//! - [`score_farm_delivery`] is the per-kg accounting the simulator scores a
//!   day with. Its numbers are the reported result.
//!
//! The two do not agree numerically and must not be merged.

use crate::config::{AgronomyConfig, EnvironmentConfig, LogisticsConfig, SolverConfig};

/// Number of trucks needed for a load: `ceil(tons / capacity)`.
///
/// A non-positive capacity yields zero trucks; configuration validation
/// rejects such capacities before a run starts.
pub fn truck_count(tons: f64, truck_capacity_tons: f64) -> f64 {
    if truck_capacity_tons > 0.0 {
        (tons / truck_capacity_tons).ceil()
    } else {
        0.0
    }
}

/// Transport emissions of one action: `distance * trucks * factor`.
pub fn transport_emissions(distance_km: f64, tons: f64, logistics: &LogisticsConfig) -> f64 {
    distance_km
        * truck_count(tons, logistics.truck_capacity_tons)
        * logistics.emission_factor_per_truck_km
}

/// Penalty for tons discarded, either as overflow or as a dumped load.
pub fn overflow_penalty(tons: f64, environment: &EnvironmentConfig) -> f64 {
    tons * environment.overflow_penalty_per_ton
}

// ---------------------------------------------------------------------------
// Solver heuristic
// ---------------------------------------------------------------------------

/// Components of the solver's net carbon impact for one candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct HeuristicScore {
    /// Soil benefit of the load, multiplier included.
    pub soil_benefit: f64,
    /// Benefit of nitrogen that meets the farm's demand.
    pub nitrogen_offset: f64,
    /// Cost of the trucks for the trip.
    pub transport_cost: f64,
    /// Cost of nitrogen beyond demand plus buffer.
    pub leaching_cost: f64,
}

impl HeuristicScore {
    /// Net carbon impact: benefits minus costs.
    pub fn net(&self) -> f64 {
        self.soil_benefit + self.nitrogen_offset - self.transport_cost - self.leaching_cost
    }
}

/// Inputs of the heuristic that do not come from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Tons the truck would carry.
    pub load_tons: f64,
    /// One-way distance from plant to farm.
    pub distance_km: f64,
    /// Farm's total nitrogen demand today, in kg.
    pub demand_kg: f64,
}

/// The solver's net carbon impact of delivering a candidate load.
pub fn net_carbon_impact(
    candidate: Candidate,
    solver: &SolverConfig,
    agronomy: &AgronomyConfig,
    truck_capacity_tons: f64,
) -> HeuristicScore {
    let Candidate {
        load_tons,
        distance_km,
        demand_kg,
    } = candidate;
    let nitrogen_kg = load_tons * agronomy.nitrogen_content_kg_per_ton;
    let allowed_kg = demand_kg * (1.0 + agronomy.buffer_fraction());

    HeuristicScore {
        soil_benefit: load_tons * solver.soil_credit_multiplier * solver.soil_credit_per_ton,
        nitrogen_offset: nitrogen_kg.min(demand_kg) * solver.nitrogen_offset_weight,
        transport_cost: distance_km
            * solver.transport_cost_per_truck_km
            * truck_count(load_tons, truck_capacity_tons),
        leaching_cost: (nitrogen_kg - allowed_kg).max(0.0) * solver.leaching_weight,
    }
}

// ---------------------------------------------------------------------------
// Authoritative farm accounting
// ---------------------------------------------------------------------------

/// Scored credits and penalty for everything a farm received in one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct FarmAccount {
    /// Nitrogen applied, in kg.
    pub nitrogen_kg: f64,
    /// Nitrogen the crop takes up (capped at demand), in kg.
    pub uptake_kg: f64,
    /// Credit for synthetic fertilizer displaced by the uptake.
    pub offset_credit: f64,
    /// Soil sequestration credit.
    pub soil_credit: f64,
    /// Penalty for nitrogen beyond demand plus buffer.
    pub leaching_penalty: f64,
}

impl FarmAccount {
    /// Offset credit plus soil credit.
    pub fn credits(&self) -> f64 {
        self.offset_credit + self.soil_credit
    }
}

/// Score `tons` applied at a farm whose total demand is `demand_kg`.
pub fn score_farm_delivery(tons: f64, demand_kg: f64, agronomy: &AgronomyConfig) -> FarmAccount {
    let nitrogen_kg = tons * agronomy.nitrogen_content_kg_per_ton;
    let uptake_kg = nitrogen_kg.min(demand_kg);
    let allowed_kg = demand_kg * (1.0 + agronomy.buffer_fraction());
    let leaching_penalty = if nitrogen_kg > allowed_kg {
        (nitrogen_kg - allowed_kg) * agronomy.leaching_penalty_per_kg_excess_n
    } else {
        0.0
    };

    FarmAccount {
        nitrogen_kg,
        uptake_kg,
        offset_credit: uptake_kg * agronomy.synthetic_offset_credit_per_kg_n,
        soil_credit: tons * 1000.0 * agronomy.soil_credit_per_kg_biosolid,
        leaching_penalty,
    }
}

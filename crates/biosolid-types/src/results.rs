//! Per-day score records produced by the simulator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Penalty components of one simulated day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PenaltyBreakdown {
    /// Nitrogen applied beyond demand plus buffer.
    pub leaching: f64,
    /// Material discarded because storage exceeded capacity.
    pub overflow: f64,
    /// Loads dumped because their destination was rain-locked.
    pub dumping: f64,
}

impl PenaltyBreakdown {
    /// Sum of all penalty components.
    pub fn total(&self) -> f64 {
        self.leaching + self.overflow + self.dumping
    }
}

/// The score record of one simulated day. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyResult {
    /// Calendar date of the day.
    pub date: NaiveDate,
    /// Credits earned (nitrogen offset plus soil sequestration).
    pub credits: f64,
    /// Transport emissions of every truck that left a plant.
    pub emissions: f64,
    /// Aggregate penalties (leaching, overflow, dumping).
    pub penalties: f64,
    /// Components of [`Self::penalties`].
    pub penalty_breakdown: PenaltyBreakdown,
    /// `credits - emissions - penalties`.
    pub net_score: f64,
    /// Tons applied at open farms.
    pub delivered_tons: f64,
    /// Tons discarded at plants for exceeding storage capacity.
    pub overflow_tons: f64,
    /// Number of actions rejected for targeting a rain-locked zone.
    pub rejected_actions: u32,
}

impl DailyResult {
    /// Build a result, deriving the penalty total and net score.
    pub fn new(
        date: NaiveDate,
        credits: f64,
        emissions: f64,
        penalty_breakdown: PenaltyBreakdown,
        delivered_tons: f64,
        overflow_tons: f64,
        rejected_actions: u32,
    ) -> Self {
        let penalties = penalty_breakdown.total();
        Self {
            date,
            credits,
            emissions,
            penalties,
            penalty_breakdown,
            net_score: credits - emissions - penalties,
            delivered_tons,
            overflow_tons,
            rejected_actions,
        }
    }
}

//! Planned deliveries and their resolved outcomes.
//!
//! An [`Action`] is what the dispatch solver proposes for one day. The
//! simulator resolves every action into exactly one [`ActionOutcome`]:
//!
//! - [`ActionOutcome::Delivered`] -- the farm's zone was open; the material
//!   is applied and scored for credits and leaching.
//! - [`ActionOutcome::Dumped`] -- the farm's zone was rain-locked; the truck
//!   still travelled, the load is treated as dumped waste and penalized at
//!   the overflow rate, and the material is lost to the source plant.
//!
//! A third path, where a rejected load is returned to plant storage, is
//! never taken: once a truck leaves, the material has left the plant.

use serde::{Deserialize, Serialize};

use crate::ids::{FarmId, PlantId};

/// A single planned delivery from one plant to one farm on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Source plant.
    pub plant_id: PlantId,
    /// Destination farm.
    pub farm_id: FarmId,
    /// Tons loaded at the plant. Expected to be positive.
    pub tons: f64,
}

impl Action {
    /// Create a new action.
    pub fn new(plant_id: PlantId, farm_id: FarmId, tons: f64) -> Self {
        Self {
            plant_id,
            farm_id,
            tons,
        }
    }
}

/// The resolved result of one [`Action`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The load reached an open farm and counts toward delivered tons.
    Delivered {
        /// The resolved action.
        action: Action,
        /// Transport emissions charged for the trip.
        emissions: f64,
    },
    /// The destination was rain-locked; the load was dumped.
    Dumped {
        /// The resolved action.
        action: Action,
        /// Transport emissions charged for the trip.
        emissions: f64,
        /// Dump penalty charged at the overflow rate.
        penalty: f64,
    },
}

impl ActionOutcome {
    /// The action this outcome resolves.
    pub const fn action(&self) -> &Action {
        match self {
            Self::Delivered { action, .. } | Self::Dumped { action, .. } => action,
        }
    }

    /// Transport emissions charged for this action.
    pub const fn emissions(&self) -> f64 {
        match self {
            Self::Delivered { emissions, .. } | Self::Dumped { emissions, .. } => *emissions,
        }
    }

    /// Whether the load was applied at the farm.
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn outcome_accessors() {
        let action = Action::new(PlantId::new("STP_A"), FarmId::new("F_1"), 10.0);
        let delivered = ActionOutcome::Delivered {
            action: action.clone(),
            emissions: 9.0,
        };
        let dumped = ActionOutcome::Dumped {
            action,
            emissions: 9.0,
            penalty: 10_000.0,
        };
        assert!(delivered.is_delivered());
        assert!(!dumped.is_delivered());
        assert_eq!(dumped.action().farm_id.as_str(), "F_1");
        assert!((dumped.emissions() - 9.0).abs() < 1e-12);
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let outcome = ActionOutcome::Dumped {
            action: Action::new(PlantId::new("STP_A"), FarmId::new("F_1"), 5.0),
            emissions: 1.5,
            penalty: 5000.0,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "dumped");
        assert_eq!(json["action"]["plant_id"], "STP_A");
    }
}

//! Synthetic monsoon rainfall for demonstration regions.
//!
//! Real runs consume a measured rainfall table. When none is available (the
//! demonstration binary, scenario tests), this module generates one with
//! month-weighted rainfall classes and deterministic randomness, so the same
//! seed always produces the same table.
//!
//! # Rainfall classes
//!
//! | Month     | Dry | Showers | Heavy | Torrential |
//! |-----------|-----|---------|-------|------------|
//! | Jan-Mar   | 85% | 12%     |  3%   |  0%        |
//! | Apr-May   | 55% | 30%     | 12%   |  3%        |
//! | Jun-Sep   | 15% | 35%     | 35%   | 15%        |
//! | Oct-Nov   | 40% | 35%     | 20%   |  5%        |
//! | Dec       | 75% | 20%     |  5%   |  0%        |
//!
//! Each wet class has a base amount that is scaled by a jitter factor in
//! `[0.5, 1.5)`.

use biosolid_types::ZoneId;
use chrono::{Datelike, Days, NaiveDate};

use crate::rainfall::RainfallTable;

/// Daily rainfall class before jitter is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RainClass {
    /// No rain.
    Dry,
    /// Light showers.
    Showers,
    /// Heavy rain.
    Heavy,
    /// Monsoon downpour.
    Torrential,
}

impl RainClass {
    /// Base rainfall of the class in mm.
    pub const fn base_mm(self) -> f64 {
        match self {
            Self::Dry => 0.0,
            Self::Showers => 4.0,
            Self::Heavy => 15.0,
            Self::Torrential => 40.0,
        }
    }
}

/// Class weights for one calendar month.
#[derive(Debug, Clone)]
pub struct MonthWeights {
    /// `(class, weight)` entries.
    entries: [(RainClass, u32); 4],
}

impl MonthWeights {
    /// Return the weights for a calendar month (1-12).
    pub const fn for_month(month: u32) -> Self {
        let (dry, showers, heavy, torrential) = match month {
            1..=3 => (85, 12, 3, 0),
            4 | 5 => (55, 30, 12, 3),
            6..=9 => (15, 35, 35, 15),
            10 | 11 => (40, 35, 20, 5),
            _ => (75, 20, 5, 0),
        };
        Self {
            entries: [
                (RainClass::Dry, dry),
                (RainClass::Showers, showers),
                (RainClass::Heavy, heavy),
                (RainClass::Torrential, torrential),
            ],
        }
    }

    /// Select a class given a roll in `[0, total_weight())`.
    fn select(&self, roll: u32) -> RainClass {
        let mut cumulative: u32 = 0;
        for &(class, weight) in &self.entries {
            cumulative = cumulative.saturating_add(weight);
            if roll < cumulative {
                return class;
            }
        }
        RainClass::Dry
    }

    /// Sum of all weights.
    fn total_weight(&self) -> u32 {
        self.entries
            .iter()
            .fold(0_u32, |acc, &(_, weight)| acc.saturating_add(weight))
    }
}

/// Deterministic monsoon rainfall generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonsoonGenerator {
    /// Seed from which every per-zone, per-day value derives.
    seed: u64,
}

impl MonsoonGenerator {
    /// Create a generator with the given seed.
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Rainfall in mm for one zone (by index) on one date.
    pub fn rainfall(&self, zone_index: u64, day_index: u64, date: NaiveDate) -> f64 {
        let weights = MonthWeights::for_month(date.month());
        let total = weights.total_weight();
        if total == 0 {
            return 0.0;
        }

        let zone_seed = self
            .seed
            .wrapping_add(zone_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        let random = deterministic_random(zone_seed, day_index);
        let roll = u32::try_from(random.checked_rem(u64::from(total)).unwrap_or(0)).unwrap_or(0);
        let class = weights.select(roll);

        let jitter_raw = u32::try_from((random >> 32).checked_rem(1000).unwrap_or(0)).unwrap_or(0);
        let jitter = 0.5 + f64::from(jitter_raw) / 1000.0;
        class.base_mm() * jitter
    }

    /// Generate a table covering `days` dates from `start` for each zone.
    pub fn generate(&self, start: NaiveDate, days: u32, zones: &[ZoneId]) -> RainfallTable {
        let mut table = RainfallTable::new(start);
        for (zone_index, zone) in (0_u64..).zip(zones) {
            let series = (0..days)
                .map_while(|d| {
                    start
                        .checked_add_days(Days::new(u64::from(d)))
                        .map(|date| self.rainfall(zone_index, u64::from(d), date))
                })
                .collect();
            table.insert_zone(zone.clone(), series);
        }
        table
    }
}

/// Deterministic pseudo-random value from `(seed, day)` using `xorshift64`.
const fn deterministic_random(seed: u64, day: u64) -> u64 {
    let mut state = seed.wrapping_add(day.wrapping_mul(0x517c_c1b7_2722_0a95));

    // xorshift requires non-zero state
    if state == 0 {
        state = 0xdead_beef_cafe_babe;
    }

    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;

    state
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::rainfall::RainfallSource;

    fn jan_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    #[test]
    fn weights_total_is_100() {
        for month in 1..=12 {
            assert_eq!(MonthWeights::for_month(month).total_weight(), 100, "month {month}");
        }
    }

    #[test]
    fn same_seed_same_table() {
        let zones = [ZoneId::new("A"), ZoneId::new("B")];
        let a = MonsoonGenerator::new(7).generate(jan_first(), 365, &zones);
        let b = MonsoonGenerator::new(7).generate(jan_first(), 365, &zones);
        assert_eq!(a, b);
        assert_eq!(a.days(), 365);
    }

    #[test]
    fn zones_differ() {
        let zones = [ZoneId::new("A"), ZoneId::new("B")];
        let table = MonsoonGenerator::new(7).generate(jan_first(), 365, &zones);
        let a = table.forecast(jan_first(), &zones[0], 365);
        let b = table.forecast(jan_first(), &zones[1], 365);
        assert_ne!(a, b);
    }

    #[test]
    fn monsoon_is_wetter_than_winter() {
        let zone = ZoneId::new("A");
        let table =
            MonsoonGenerator::new(42).generate(jan_first(), 365, std::slice::from_ref(&zone));
        let jan: f64 = table.forecast(jan_first(), &zone, 31).iter().sum();
        let july_first = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let july: f64 = table.forecast(july_first, &zone, 31).iter().sum();
        assert!(july > jan, "july {july} should exceed january {jan}");
    }

    #[test]
    fn rainfall_is_non_negative() {
        let generator = MonsoonGenerator::new(3);
        for d in 0_u64..365 {
            let date = jan_first().checked_add_days(Days::new(d)).unwrap();
            assert!(generator.rainfall(0, d, date) >= 0.0);
        }
    }
}

//! Rainfall forecasts and the rain-lock rule.
//!
//! Application of biosolids is banned in a zone when the rain forecast over
//! a lookahead window, starting on the delivery date, sums to more than a
//! threshold. The comparison is strict: a window summing to exactly the
//! threshold is still open.
//!
//! Forecast values the data does not cover are zero. That covers dates past
//! the end of the table (the window is padded), dates before or after the
//! table entirely, and zones the table does not list.

use std::collections::BTreeMap;

use biosolid_types::ZoneId;
use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// RainfallSource
// ---------------------------------------------------------------------------

/// A source of per-date, per-zone rainfall amounts in millimetres.
pub trait RainfallSource {
    /// Rainfall for `zone` on each of `days` consecutive dates starting at
    /// `date`. Always returns exactly `days` values.
    fn forecast(&self, date: NaiveDate, zone: &ZoneId, days: u32) -> Vec<f64>;
}

// ---------------------------------------------------------------------------
// RainfallTable
// ---------------------------------------------------------------------------

/// In-memory rainfall table: one series per zone, indexed by day offset
/// from a start date.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RainfallTable {
    /// Date of the first row.
    start: NaiveDate,
    /// Number of dated rows in the table.
    days: usize,
    /// Rainfall series per zone.
    zones: BTreeMap<ZoneId, Vec<f64>>,
}

impl RainfallTable {
    /// Create an empty table whose first row is `start`.
    pub const fn new(start: NaiveDate) -> Self {
        Self {
            start,
            days: 0,
            zones: BTreeMap::new(),
        }
    }

    /// Insert or replace the series for a zone.
    ///
    /// The table spans as many dates as its longest series. Shorter series
    /// read as zero past their end.
    pub fn insert_zone(&mut self, zone: ZoneId, series: Vec<f64>) {
        self.days = self.days.max(series.len());
        self.zones.insert(zone, series);
    }

    /// Builder form of [`Self::insert_zone`].
    #[must_use]
    pub fn with_zone(mut self, zone: ZoneId, series: Vec<f64>) -> Self {
        self.insert_zone(zone, series);
        self
    }

    /// First date covered by the table.
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Number of dates covered by the table.
    pub const fn days(&self) -> usize {
        self.days
    }

    /// Zones present in the table.
    pub fn zones(&self) -> impl Iterator<Item = &ZoneId> {
        self.zones.keys()
    }

    /// Rainfall for one zone on one date, zero when not covered.
    pub fn rainfall(&self, date: NaiveDate, zone: &ZoneId) -> f64 {
        self.row_index(date)
            .and_then(|idx| self.zones.get(zone).and_then(|series| series.get(idx)))
            .copied()
            .unwrap_or(0.0)
    }

    /// Row index of `date`, if the table covers it.
    fn row_index(&self, date: NaiveDate) -> Option<usize> {
        let offset = date.signed_duration_since(self.start).num_days();
        let idx = usize::try_from(offset).ok()?;
        (idx < self.days).then_some(idx)
    }
}

impl RainfallSource for RainfallTable {
    fn forecast(&self, date: NaiveDate, zone: &ZoneId, days: u32) -> Vec<f64> {
        let len = usize::try_from(days).unwrap_or(usize::MAX);
        let Some(first) = self.row_index(date) else {
            return vec![0.0; len];
        };
        let series = self.zones.get(zone).map_or(&[][..], Vec::as_slice);
        let last = first.saturating_add(len).min(self.days);
        let mut window: Vec<f64> = (first..last)
            .map(|idx| series.get(idx).copied().unwrap_or(0.0))
            .collect();
        window.resize(len, 0.0);
        window
    }
}

// ---------------------------------------------------------------------------
// RainLockPolicy
// ---------------------------------------------------------------------------

/// The regulatory rain-lock rule.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RainLockPolicy {
    /// Cumulative forecast rainfall above which a zone is locked, in mm.
    pub threshold_mm: f64,
    /// Number of days in the forecast window, the delivery date included.
    pub window_days: u32,
}

impl RainLockPolicy {
    /// Create a policy.
    pub const fn new(threshold_mm: f64, window_days: u32) -> Self {
        Self {
            threshold_mm,
            window_days,
        }
    }

    /// Whether deliveries to `zone` on `date` are banned.
    pub fn is_locked(&self, source: &dyn RainfallSource, date: NaiveDate, zone: &ZoneId) -> bool {
        let forecast = source.forecast(date, zone, self.window_days);
        exceeds_threshold(&forecast, self.threshold_mm)
    }
}

impl Default for RainLockPolicy {
    fn default() -> Self {
        Self::new(30.0, 5)
    }
}

/// Whether the summed forecast is strictly above the threshold.
pub fn exceeds_threshold(forecast: &[f64], threshold_mm: f64) -> bool {
    forecast.iter().sum::<f64>() > threshold_mm
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn zone() -> ZoneId {
        ZoneId::new("Ernakulam")
    }

    fn close_slice(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-12)
    }

    #[test]
    fn forecast_returns_window_from_date() {
        let table =
            RainfallTable::new(day(1)).with_zone(zone(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let window = table.forecast(day(2), &zone(), 5);
        assert!(close_slice(&window, &[2.0, 3.0, 4.0, 5.0, 6.0]));
    }

    #[test]
    fn forecast_pads_past_end_of_data() {
        let table = RainfallTable::new(day(1)).with_zone(zone(), vec![1.0, 2.0, 3.0]);
        let window = table.forecast(day(2), &zone(), 5);
        assert!(close_slice(&window, &[2.0, 3.0, 0.0, 0.0, 0.0]));
    }

    #[test]
    fn forecast_for_uncovered_date_is_zero() {
        let table = RainfallTable::new(day(10)).with_zone(zone(), vec![50.0; 3]);
        assert!(close_slice(&table.forecast(day(1), &zone(), 5), &[0.0; 5]));
        assert!(close_slice(&table.forecast(day(20), &zone(), 5), &[0.0; 5]));
    }

    #[test]
    fn forecast_for_unknown_zone_is_zero() {
        let table = RainfallTable::new(day(1)).with_zone(zone(), vec![50.0; 10]);
        let window = table.forecast(day(1), &ZoneId::new("Idukki"), 5);
        assert!(close_slice(&window, &[0.0; 5]));
    }

    #[test]
    fn threshold_is_strict() {
        // Exactly 30 mm is open; 30.01 mm is locked.
        let open = RainfallTable::new(day(1)).with_zone(zone(), vec![10.0, 5.0, 5.0, 5.0, 5.0]);
        let locked = RainfallTable::new(day(1)).with_zone(zone(), vec![10.0, 5.0, 5.0, 5.0, 5.01]);
        let policy = RainLockPolicy::new(30.0, 5);
        assert!(!policy.is_locked(&open, day(1), &zone()));
        assert!(policy.is_locked(&locked, day(1), &zone()));
    }

    #[test]
    fn rain_outside_window_does_not_lock() {
        let table =
            RainfallTable::new(day(1)).with_zone(zone(), vec![0.0, 0.0, 0.0, 0.0, 0.0, 100.0]);
        let policy = RainLockPolicy::new(30.0, 5);
        assert!(!policy.is_locked(&table, day(1), &zone()));
        assert!(policy.is_locked(&table, day(2), &zone()));
    }

    #[test]
    fn table_survives_json_and_keeps_padding() {
        let table = RainfallTable::new(day(3))
            .with_zone(zone(), vec![12.0, 8.0])
            .with_zone(ZoneId::new("Kollam"), vec![1.0, 2.0, 3.0]);
        let json = serde_json::to_string(&table).unwrap();
        let restored: RainfallTable = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, table);
        assert_eq!(restored.start(), day(3));
        assert_eq!(restored.days(), 3);
        let zones: Vec<&str> = restored.zones().map(ZoneId::as_str).collect();
        assert_eq!(zones, ["Ernakulam", "Kollam"]);
        // The shorter series still reads as zero past its end.
        assert!(close_slice(&restored.forecast(day(4), &zone(), 3), &[8.0, 0.0, 0.0]));
    }

    #[test]
    fn exceeds_threshold_sums() {
        assert!(!exceeds_threshold(&[], 0.0));
        assert!(exceeds_threshold(&[0.5], 0.0));
        assert!(!exceeds_threshold(&[15.0, 15.0], 30.0));
    }
}

//! Bounded reading history and summary statistics.
//!
//! [`ReadingHistory`] keeps readings most-recent-first and evicts the oldest
//! entry once the retention limit is reached. [`Period`] selects a recent time
//! window and [`HistoryStats`] summarises a selection.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use tds_types::{ParseError, Reading};

/// Default number of readings kept in history.
pub const DEFAULT_RETENTION: usize = 100;

/// Readings ordered most-recent-first, bounded by a retention limit.
#[derive(Debug, Clone)]
pub struct ReadingHistory {
    readings: VecDeque<Reading>,
    capacity: usize,
}

impl Default for ReadingHistory {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}

impl ReadingHistory {
    /// Create an empty history holding at most `capacity` readings.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            readings: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of readings kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of readings currently held.
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Whether the history is empty.
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Add a reading at the head, evicting the oldest when full.
    ///
    /// Returns the evicted reading, if any.
    pub fn push(&mut self, reading: Reading) -> Option<Reading> {
        self.readings.push_front(reading);
        if self.readings.len() > self.capacity {
            self.readings.pop_back()
        } else {
            None
        }
    }

    /// Remove every reading, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.readings.len();
        self.readings.clear();
        removed
    }

    /// Iterate most-recent-first.
    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter()
    }

    /// Copy the readings out, most-recent-first.
    pub fn to_vec(&self) -> Vec<Reading> {
        self.iter().cloned().collect()
    }
}

/// Time window used to filter history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1h")]
    LastHour,
    #[serde(rename = "6h")]
    LastSixHours,
    #[default]
    #[serde(rename = "24h")]
    LastDay,
    #[serde(rename = "7d")]
    LastWeek,
    #[serde(rename = "30d")]
    LastMonth,
}

impl Period {
    /// Length of the window.
    pub fn duration(&self) -> Duration {
        match self {
            Period::LastHour => Duration::hours(1),
            Period::LastSixHours => Duration::hours(6),
            Period::LastDay => Duration::hours(24),
            Period::LastWeek => Duration::days(7),
            Period::LastMonth => Duration::days(30),
        }
    }

    /// Whether `timestamp` falls strictly after `now - period`.
    pub fn includes(&self, timestamp: OffsetDateTime, now: OffsetDateTime) -> bool {
        timestamp > now - self.duration()
    }

    /// Keep only the readings inside this window, preserving order.
    pub fn select<'a, I>(
        self,
        readings: I,
        now: OffsetDateTime,
    ) -> impl Iterator<Item = &'a Reading>
    where
        I: IntoIterator<Item = &'a Reading>,
    {
        readings
            .into_iter()
            .filter(move |r| self.includes(r.timestamp(), now))
    }

    /// Short label ("1h", "24h", "7d", ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::LastHour => "1h",
            Period::LastSixHours => "6h",
            Period::LastDay => "24h",
            Period::LastWeek => "7d",
            Period::LastMonth => "30d",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1h" => Ok(Period::LastHour),
            "6h" => Ok(Period::LastSixHours),
            "24h" | "1d" => Ok(Period::LastDay),
            "7d" => Ok(Period::LastWeek),
            "30d" => Ok(Period::LastMonth),
            _ => Err(ParseError::UnknownPeriod(s.to_string())),
        }
    }
}

/// Summary statistics over a set of readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Number of readings summarised.
    pub count: usize,
    pub min_tds: f64,
    pub max_tds: f64,
    pub avg_tds: f64,
    pub min_temp: f64,
    pub max_temp: f64,
    pub avg_temp: f64,
}

impl HistoryStats {
    /// Summarise the given readings, or `None` if there are none.
    pub fn from_readings<'a>(readings: impl IntoIterator<Item = &'a Reading>) -> Option<Self> {
        let mut iter = readings.into_iter();
        let first = iter.next()?;

        let mut stats = HistoryStats {
            count: 1,
            min_tds: first.value(),
            max_tds: first.value(),
            avg_tds: 0.0,
            min_temp: first.temperature(),
            max_temp: first.temperature(),
            avg_temp: 0.0,
        };
        let mut tds_sum = first.value();
        let mut temp_sum = first.temperature();

        for reading in iter {
            stats.count += 1;
            stats.min_tds = stats.min_tds.min(reading.value());
            stats.max_tds = stats.max_tds.max(reading.value());
            stats.min_temp = stats.min_temp.min(reading.temperature());
            stats.max_temp = stats.max_temp.max(reading.temperature());
            tds_sum += reading.value();
            temp_sum += reading.temperature();
        }

        stats.avg_tds = tds_sum / stats.count as f64;
        stats.avg_temp = temp_sum / stats.count as f64;
        Some(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn reading_at(value: f64, ts: OffsetDateTime) -> Reading {
        Reading::new(value, 20.0, ts)
    }

    #[test]
    fn test_push_is_most_recent_first() {
        let mut history = ReadingHistory::new(10);
        let ts = OffsetDateTime::UNIX_EPOCH;
        history.push(reading_at(1.0, ts));
        history.push(reading_at(2.0, ts));
        history.push(reading_at(3.0, ts));

        let values: Vec<f64> = history.iter().map(|r| r.value()).collect();
        assert_eq!(values, vec![3.0, 2.0, 1.0]);
        assert_eq!(history.iter().next().map(|r| r.value()), Some(3.0));
    }

    #[test]
    fn test_push_evicts_oldest() {
        let mut history = ReadingHistory::new(3);
        let ts = OffsetDateTime::UNIX_EPOCH;
        for v in 1..=3 {
            assert!(history.push(reading_at(v as f64, ts)).is_none());
        }
        let evicted = history.push(reading_at(4.0, ts));
        assert_eq!(evicted.map(|r| r.value()), Some(1.0));
        assert_eq!(history.len(), 3);

        let values: Vec<f64> = history.iter().map(|r| r.value()).collect();
        assert_eq!(values, vec![4.0, 3.0, 2.0]);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let mut history = ReadingHistory::new(0);
        assert_eq!(history.capacity(), 1);
        history.push(reading_at(1.0, OffsetDateTime::UNIX_EPOCH));
        history.push(reading_at(2.0, OffsetDateTime::UNIX_EPOCH));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut history = ReadingHistory::default();
        history.push(reading_at(1.0, OffsetDateTime::UNIX_EPOCH));
        history.push(reading_at(2.0, OffsetDateTime::UNIX_EPOCH));
        assert_eq!(history.clear(), 2);
        assert!(history.is_empty());
        assert!(history.iter().next().is_none());
    }

    #[test]
    fn test_select_period() {
        let now = datetime!(2024-06-10 12:00:00 UTC);
        let mut history = ReadingHistory::default();
        history.push(reading_at(1.0, now - Duration::days(8)));
        history.push(reading_at(2.0, now - Duration::hours(5)));
        history.push(reading_at(3.0, now - Duration::minutes(30)));

        let values = |p: Period| -> Vec<f64> {
            p.select(history.iter(), now).map(|r| r.value()).collect()
        };
        assert_eq!(values(Period::LastHour), vec![3.0]);
        assert_eq!(values(Period::LastSixHours), vec![3.0, 2.0]);
        assert_eq!(values(Period::LastWeek), vec![3.0, 2.0]);
        assert_eq!(values(Period::LastMonth), vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_select_excludes_cutoff() {
        let now = datetime!(2024-06-10 12:00:00 UTC);
        let mut history = ReadingHistory::default();
        history.push(reading_at(1.0, now - Duration::hours(1)));
        assert_eq!(Period::LastHour.select(history.iter(), now).count(), 0);
    }

    #[test]
    fn test_period_parsing() {
        assert_eq!("1h".parse::<Period>(), Ok(Period::LastHour));
        assert_eq!("24H".parse::<Period>(), Ok(Period::LastDay));
        assert_eq!("30d".parse::<Period>(), Ok(Period::LastMonth));
        assert!("2w".parse::<Period>().is_err());
        assert_eq!(Period::default(), Period::LastDay);
        assert_eq!(Period::LastWeek.to_string(), "7d");
    }

    #[test]
    fn test_stats_empty() {
        assert!(HistoryStats::from_readings(&Vec::<Reading>::new()).is_none());
    }

    #[test]
    fn test_stats_values() {
        let ts = OffsetDateTime::UNIX_EPOCH;
        let readings = vec![
            Reading::new(100.0, 20.0, ts),
            Reading::new(200.0, 24.0, ts),
            Reading::new(300.0, 22.0, ts),
        ];
        let stats = HistoryStats::from_readings(&readings).unwrap();

        assert_eq!(stats.count, 3);
        assert_eq!(stats.min_tds, 100.0);
        assert_eq!(stats.max_tds, 300.0);
        assert!((stats.avg_tds - 200.0).abs() < 1e-9);
        assert_eq!(stats.min_temp, 20.0);
        assert_eq!(stats.max_temp, 24.0);
        assert!((stats.avg_temp - 22.0).abs() < 1e-9);
    }
}

//! Reading sources and the reading generator.
//!
//! A [`ReadingSource`] produces raw samples; the [`ReadingGenerator`] turns
//! them into [`Reading`]s by applying calibration, classifying the value, and
//! stamping the capture time.
//!
//! # Features
//!
//! - **Random samples**: [`RandomSource`] draws value and temperature
//!   independently from configurable ranges, optionally from a fixed seed
//! - **Scripted samples**: [`SequenceSource`] replays a fixed list
//! - **Custom behavior**: any `FnMut() -> Sample + Send` closure is a source
//!
//! # Example
//!
//! ```
//! use tds_core::source::{ReadingGenerator, Sample, SequenceSource};
//! use tds_types::Quality;
//! use time::OffsetDateTime;
//!
//! let source = SequenceSource::new(vec![Sample::new(40.0, 21.0), Sample::new(200.0, 22.0)]);
//! let mut generator = ReadingGenerator::new(Box::new(source));
//!
//! let now = OffsetDateTime::now_utc();
//! assert_eq!(generator.generate(now).quality(), Quality::Excellent);
//! assert_eq!(generator.generate(now).quality(), Quality::Fair);
//! ```

use std::fmt;
use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use time::OffsetDateTime;

use tds_types::Reading;

use crate::calibration::Calibration;

/// Default range of simulated TDS values (ppm).
pub const DEFAULT_VALUE_RANGE: RangeInclusive<f64> = 0.0..=500.0;

/// Default range of simulated water temperatures (°C).
pub const DEFAULT_TEMPERATURE_RANGE: RangeInclusive<f64> = 20.0..=30.0;

/// One raw sample from a meter, before calibration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sample {
    /// Raw TDS value (ppm).
    pub value: f64,
    /// Water temperature (°C).
    pub temperature: f64,
}

impl Sample {
    /// Create a sample.
    pub fn new(value: f64, temperature: f64) -> Self {
        Self { value, temperature }
    }
}

/// Strategy producing raw samples.
///
/// Implementations must not fail; generation is infallible.
pub trait ReadingSource: Send {
    /// Produce the next sample.
    fn next_sample(&mut self) -> Sample;
}

impl<F> ReadingSource for F
where
    F: FnMut() -> Sample + Send,
{
    fn next_sample(&mut self) -> Sample {
        self()
    }
}

/// Source drawing uniformly distributed samples.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: StdRng,
    value_range: RangeInclusive<f64>,
    temperature_range: RangeInclusive<f64>,
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource {
    /// Create a source seeded from the operating system.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Create a reproducible source from a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            value_range: DEFAULT_VALUE_RANGE,
            temperature_range: DEFAULT_TEMPERATURE_RANGE,
        }
    }

    /// Set the range of TDS values.
    ///
    /// Reversed bounds are swapped. Non-finite bounds, or bounds too far apart
    /// to sample between, keep the default range.
    #[must_use]
    pub fn value_range(mut self, min: f64, max: f64) -> Self {
        self.value_range = normalize_range(min, max, DEFAULT_VALUE_RANGE);
        self
    }

    /// Set the range of temperatures.
    ///
    /// Reversed bounds are swapped. Non-finite bounds, or bounds too far apart
    /// to sample between, keep the default range.
    #[must_use]
    pub fn temperature_range(mut self, min: f64, max: f64) -> Self {
        self.temperature_range = normalize_range(min, max, DEFAULT_TEMPERATURE_RANGE);
        self
    }
}

fn normalize_range(a: f64, b: f64, fallback: RangeInclusive<f64>) -> RangeInclusive<f64> {
    if !a.is_finite() || !b.is_finite() || !(b - a).is_finite() {
        return fallback;
    }
    if a <= b { a..=b } else { b..=a }
}

impl ReadingSource for RandomSource {
    fn next_sample(&mut self) -> Sample {
        let value = self.rng.random_range(self.value_range.clone());
        let temperature = self.rng.random_range(self.temperature_range.clone());
        Sample { value, temperature }
    }
}

/// Source replaying a fixed list of samples, wrapping around at the end.
///
/// An empty list yields [`Sample::default`] forever.
#[derive(Debug, Clone, Default)]
pub struct SequenceSource {
    samples: Vec<Sample>,
    position: usize,
}

impl SequenceSource {
    /// Create a source from a list of samples.
    pub fn new(samples: impl IntoIterator<Item = Sample>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
            position: 0,
        }
    }

    /// Create a source from TDS values at a constant temperature.
    pub fn from_values(values: impl IntoIterator<Item = f64>, temperature: f64) -> Self {
        Self::new(values.into_iter().map(|v| Sample::new(v, temperature)))
    }
}

impl ReadingSource for SequenceSource {
    fn next_sample(&mut self) -> Sample {
        if self.samples.is_empty() {
            return Sample::default();
        }
        let sample = self.samples[self.position % self.samples.len()];
        self.position = (self.position + 1) % self.samples.len();
        sample
    }
}

/// Turns raw samples into classified, calibrated readings.
pub struct ReadingGenerator {
    source: Box<dyn ReadingSource>,
    calibration: Calibration,
}

impl fmt::Debug for ReadingGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadingGenerator")
            .field("calibration", &self.calibration)
            .finish_non_exhaustive()
    }
}

impl Default for ReadingGenerator {
    fn default() -> Self {
        Self::new(Box::new(RandomSource::new()))
    }
}

impl ReadingGenerator {
    /// Create a generator without calibration.
    pub fn new(source: Box<dyn ReadingSource>) -> Self {
        Self::with_calibration(source, Calibration::default())
    }

    /// Create a generator applying `calibration` to every raw value.
    pub fn with_calibration(source: Box<dyn ReadingSource>, calibration: Calibration) -> Self {
        Self {
            source,
            calibration,
        }
    }

    /// Calibration applied to raw values.
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Produce one reading captured at `now`.
    pub fn generate(&mut self, now: OffsetDateTime) -> Reading {
        let sample = self.source.next_sample();
        let value = self.calibration.apply(sample.value);
        Reading::new(value, sample.temperature, now)
    }
}

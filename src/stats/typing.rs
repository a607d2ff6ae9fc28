use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::partial;

/// Raw samples collected before the estimator calibrates.
pub const CALIBRATION_SAMPLES: usize = 100;
/// A keystroke delay this many times the running average counts as a pause.
pub const OUTLIER_FACTOR: f64 = 15.0;
const CHARS_PER_WORD: f64 = 5.0;

/// Characters per second or words per minute. `Unknown` until calibrated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypingSpeed {
    Unknown,
    Known(f64),
}

impl fmt::Display for TypingSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypingSpeed::Unknown => f.write_str("unknown"),
            TypingSpeed::Known(speed) => write!(f, "{speed:.2}"),
        }
    }
}

impl Serialize for TypingSpeed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TypingSpeed::Unknown => serializer.serialize_str("unknown"),
            TypingSpeed::Known(speed) => serializer.serialize_f64(*speed),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Estimate {
    Collecting(Vec<f64>),
    Ready { total_char: u64, total_time: f64 },
}

impl Estimate {
    /// Rejects every sample at or above `OUTLIER_FACTOR` times the median and
    /// keeps the sum of the rest.
    fn calibrate(samples: &[f64]) -> Self {
        let threshold = calculate_median(samples).unwrap_or(0.0) * OUTLIER_FACTOR;
        let mut total_char = 0;
        let mut total_time = 0.0;
        for &sample in samples.iter().filter(|&&sample| sample < threshold) {
            total_char += 1;
            total_time += sample;
        }
        Estimate::Ready {
            total_char,
            total_time,
        }
    }

    /// Folds unready samples into ready totals, using the totals' average as the
    /// rejection threshold.
    fn fold(total_char: u64, total_time: f64, samples: &[f64]) -> Self {
        let threshold = total_time / total_char as f64 * OUTLIER_FACTOR;
        let mut total_char = total_char;
        let mut total_time = total_time;
        for &sample in samples.iter().filter(|&&sample| sample < threshold) {
            total_char += 1;
            total_time += sample;
        }
        Estimate::Ready {
            total_char,
            total_time,
        }
    }
}

/// Streaming estimate of the delay between keystrokes.
///
/// The first samples are buffered. Once more than [`CALIBRATION_SAMPLES`]
/// arrive, the buffer is reduced to running totals using its median to drop
/// pauses, and from then on each new delay is checked against the running
/// average instead.
#[derive(Debug, Clone, PartialEq)]
pub struct TypingStats {
    estimate: Estimate,
}

impl Default for TypingStats {
    fn default() -> Self {
        Self::new()
    }
}

impl TypingStats {
    pub fn new() -> Self {
        Self {
            estimate: Estimate::Collecting(Vec::new()),
        }
    }

    pub fn ready(total_char: u64, total_time: f64) -> Self {
        Self {
            estimate: Estimate::Ready {
                total_char,
                total_time,
            },
        }
    }

    /// Delays that are not finite or are negative are dropped.
    pub fn with_samples(mut samples: Vec<f64>) -> Self {
        samples.retain(|&delta| is_valid_delay(delta));
        let mut stats = Self {
            estimate: Estimate::Collecting(samples),
        };
        stats.calibrate_if_full();
        stats
    }

    /// Persisted totals are `-1` (or absent) while uncalibrated; the stats are
    /// ready only when both totals are present and positive.
    pub fn from_partial(value: &Value) -> Self {
        let total_char = partial::number(value.get("totalChar")).unwrap_or(-1.0);
        let total_time = partial::number(value.get("totalTime")).unwrap_or(-1.0);
        if total_char > 0.0 && total_time > 0.0 {
            return Self::ready(total_char as u64, total_time);
        }
        let samples = match value.get("samples") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| partial::number(Some(item)))
                .collect(),
            _ => Vec::new(),
        };
        Self::with_samples(samples)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.estimate, Estimate::Ready { .. })
    }

    /// Buffered samples; always empty once calibrated.
    pub fn samples(&self) -> &[f64] {
        match &self.estimate {
            Estimate::Collecting(samples) => samples,
            Estimate::Ready { .. } => &[],
        }
    }

    pub fn totals(&self) -> Option<(u64, f64)> {
        match self.estimate {
            Estimate::Ready {
                total_char,
                total_time,
            } => Some((total_char, total_time)),
            Estimate::Collecting(_) => None,
        }
    }

    /// Records the delay in milliseconds since the previous keystroke.
    /// Non-finite and negative delays are ignored.
    pub fn typed_character(&mut self, delta: f64) {
        if !is_valid_delay(delta) {
            return;
        }
        match &mut self.estimate {
            Estimate::Ready {
                total_char,
                total_time,
            } => {
                let threshold = *total_time / *total_char as f64 * OUTLIER_FACTOR;
                if delta >= threshold {
                    return;
                }
                *total_char += 1;
                *total_time += delta;
            }
            Estimate::Collecting(samples) => {
                samples.push(delta);
                self.calibrate_if_full();
            }
        }
    }

    pub fn combine(&mut self, other: &TypingStats) {
        self.estimate = match (&self.estimate, &other.estimate) {
            (
                Estimate::Ready {
                    total_char,
                    total_time,
                },
                Estimate::Ready {
                    total_char: other_char,
                    total_time: other_time,
                },
            ) => Estimate::Ready {
                total_char: total_char.saturating_add(*other_char),
                total_time: total_time + other_time,
            },
            (Estimate::Collecting(samples), Estimate::Collecting(other_samples)) => {
                let mut merged = samples.clone();
                merged.extend_from_slice(other_samples);
                if merged.len() > CALIBRATION_SAMPLES {
                    Estimate::calibrate(&merged)
                } else {
                    Estimate::Collecting(merged)
                }
            }
            (
                Estimate::Ready {
                    total_char,
                    total_time,
                },
                Estimate::Collecting(samples),
            )
            | (
                Estimate::Collecting(samples),
                Estimate::Ready {
                    total_char,
                    total_time,
                },
            ) => Estimate::fold(*total_char, *total_time, samples),
        };
    }

    pub fn cps(&self) -> TypingSpeed {
        match self.average_delay() {
            Some(average) => TypingSpeed::Known(1000.0 / average),
            None => TypingSpeed::Unknown,
        }
    }

    pub fn wpm(&self) -> TypingSpeed {
        match self.average_delay() {
            Some(average) => TypingSpeed::Known(60_000.0 / (average * CHARS_PER_WORD)),
            None => TypingSpeed::Unknown,
        }
    }

    fn average_delay(&self) -> Option<f64> {
        match self.estimate {
            Estimate::Ready {
                total_char,
                total_time,
            } if total_char > 0 => Some(total_time / total_char as f64),
            _ => None,
        }
    }

    fn calibrate_if_full(&mut self) {
        if let Estimate::Collecting(samples) = &self.estimate {
            if samples.len() > CALIBRATION_SAMPLES {
                self.estimate = Estimate::calibrate(samples);
            }
        }
    }
}

impl Serialize for TypingStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Record<'a> {
            samples: &'a [f64],
            samples_ready: bool,
            total_char: i64,
            total_time: f64,
        }

        let (total_char, total_time) = match self.totals() {
            Some((total_char, total_time)) => (i64::try_from(total_char).unwrap_or(i64::MAX), total_time),
            None => (-1, -1.0),
        };
        Record {
            samples: self.samples(),
            samples_ready: self.is_ready(),
            total_char,
            total_time,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TypingStats {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_partial(&value))
    }
}

pub fn is_valid_delay(delta: f64) -> bool {
    delta.is_finite() && delta >= 0.0
}

/// Median of `data`, averaging the two middle values for even lengths.
pub fn calculate_median(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

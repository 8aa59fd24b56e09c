//! Sampled signals
//!
//! A [`Signal`] is a magnitude sequence paired with its time axis and sample rate. Fitted
//! signals also carry the coefficients of the polynomial that produced them, highest power
//! first, so a collaborator can display the equation of any chunk.
//!
//! Magnitude, time and sample rate are only ever rewritten together; a failed mutation
//! leaves the signal as it was.
use std::{fmt, ops::Range, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    value::Value,
};

/// Which end of a signal an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The start of the signal
    Left,

    /// The end of the signal
    Right,
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(Error::InvalidDirection(s.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// A sampled signal: magnitude over time at a fixed sample rate.
///
/// # Example
/// ```
/// # use chunkfit::{Signal, Direction};
/// let mut signal = Signal::new(vec![0.0, 2.0, 4.0, 6.0], 1.0).unwrap();
/// assert_eq!(signal.time(), &[0.0, 1.0, 2.0, 3.0]);
///
/// signal.clip(Direction::Right, 50.0).unwrap();
/// assert_eq!(signal.magnitude(), &[0.0, 2.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal<T: Value = f64> {
    magnitude: Vec<T>,
    time: Vec<T>,
    fsample: T,

    #[serde(default)]
    coefficients: Vec<T>,
}

impl<T: Value> Signal<T> {
    /// Creates a signal sampled at `fsample` Hz, starting at `t = 0`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidSampleRate`] if `fsample` is not positive and finite.
    pub fn new(magnitude: Vec<T>, fsample: T) -> Result<Self> {
        Self::from_parts(magnitude, Some(fsample), None, Vec::new())
    }

    /// Creates a signal over an explicit time axis.
    ///
    /// The sample rate is derived as `len / time[last]`.
    ///
    /// # Errors
    /// - [`Error::LengthMismatch`] if `time` and `magnitude` differ in length.
    /// - [`Error::InvalidSampleRate`] if the last time value is not positive.
    pub fn with_time(magnitude: Vec<T>, time: Vec<T>) -> Result<Self> {
        Self::from_parts(magnitude, None, Some(time), Vec::new())
    }

    /// Creates a signal from any combination of sample rate and time axis.
    ///
    /// - Time given: it is used as-is, and the sample rate is derived from it when absent.
    /// - Time absent: it is derived as `index / fsample`.
    ///
    /// # Errors
    /// - [`Error::LengthMismatch`] if `time` is given with a different length than `magnitude`.
    /// - [`Error::InvalidSampleRate`] if neither is given, or the rate is unusable.
    pub fn from_parts(
        magnitude: Vec<T>,
        fsample: Option<T>,
        time: Option<Vec<T>>,
        coefficients: Vec<T>,
    ) -> Result<Self> {
        let (time, fsample) = match (time, fsample) {
            (Some(time), fsample) => {
                check_lengths(&magnitude, &time)?;
                let fsample = match fsample {
                    Some(fs) => validate_fsample(fs)?,
                    None => derive_fsample(&time)?,
                };
                (time, fsample)
            }
            (None, Some(fs)) => {
                let fs = validate_fsample(fs)?;
                (sample_times(magnitude.len(), fs), fs)
            }
            (None, None) => return Err(Error::InvalidSampleRate),
        };

        Ok(Self {
            magnitude,
            time,
            fsample,
            coefficients,
        })
    }

    /// Returns the signal with the given coefficients attached, highest power first.
    #[must_use]
    pub fn with_coefficients(mut self, coefficients: Vec<T>) -> Self {
        self.coefficients = coefficients;
        self
    }

    /// Magnitude samples.
    #[must_use]
    pub fn magnitude(&self) -> &[T] {
        &self.magnitude
    }

    /// Time of each sample.
    #[must_use]
    pub fn time(&self) -> &[T] {
        &self.time
    }

    /// Sample rate in Hz.
    #[must_use]
    pub fn fsample(&self) -> T {
        self.fsample
    }

    /// Coefficients of the polynomial this signal was fitted with, highest power first.
    ///
    /// Empty for signals that were not produced by a polynomial fit.
    #[must_use]
    pub fn coefficients(&self) -> &[T] {
        &self.coefficients
    }

    /// Replaces the attached coefficients.
    pub fn set_coefficients(&mut self, coefficients: Vec<T>) {
        self.coefficients = coefficients;
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.magnitude.len()
    }

    /// True if the signal holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.magnitude.is_empty()
    }

    /// The signal as `(time, magnitude)` points.
    #[must_use]
    pub fn points(&self) -> Vec<(T, T)> {
        self.time
            .iter()
            .copied()
            .zip(self.magnitude.iter().copied())
            .collect()
    }

    /// Drops `percentage`% of the samples from one end.
    ///
    /// The kept count is `floor(len * (1 - percentage / 100))`:
    /// - [`Direction::Right`] keeps that many leading samples.
    /// - [`Direction::Left`] keeps that many trailing samples.
    ///
    /// The sample rate is left unchanged.
    ///
    /// # Errors
    /// Returns [`Error::InvalidClipPercentage`] unless `0 <= percentage < 100`.
    pub fn clip(&mut self, direction: Direction, percentage: f64) -> Result<()> {
        let keep = kept_samples(self.len(), percentage)?;
        match direction {
            Direction::Right => {
                self.magnitude.truncate(keep);
                self.time.truncate(keep);
            }
            Direction::Left => {
                let dropped = self.len() - keep;
                self.magnitude.drain(..dropped);
                self.time.drain(..dropped);
            }
        }

        tracing::trace!(%direction, percentage, kept = keep, "clipped signal");
        Ok(())
    }

    /// Replaces magnitude and time together, re-deriving the sample rate from the new time axis.
    ///
    /// # Errors
    /// - [`Error::LengthMismatch`] if the two differ in length.
    /// - [`Error::InvalidSampleRate`] if the new time axis does not end after zero.
    ///
    /// The signal is unchanged on error.
    pub fn set_data(&mut self, magnitude: Vec<T>, time: Vec<T>) -> Result<()> {
        check_lengths(&magnitude, &time)?;
        let fsample = derive_fsample(&time)?;

        self.magnitude = magnitude;
        self.time = time;
        self.fsample = fsample;
        Ok(())
    }

    /// Keeps at most `max_samples` leading samples.
    pub fn truncate(&mut self, max_samples: usize) {
        self.magnitude.truncate(max_samples);
        self.time.truncate(max_samples);
    }

    /// Copies a range of samples into a new signal with the same sample rate.
    ///
    /// Coefficients are not carried over; they described the whole signal.
    ///
    /// # Errors
    /// Returns [`Error::SliceOutOfRange`] if the range does not lie inside the signal.
    pub fn slice(&self, range: Range<usize>) -> Result<Self> {
        if range.start > range.end || range.end > self.len() {
            return Err(Error::SliceOutOfRange {
                start: range.start,
                end: range.end,
                len: self.len(),
            });
        }

        Ok(Self {
            magnitude: self.magnitude[range.clone()].to_vec(),
            time: self.time[range].to_vec(),
            fsample: self.fsample,
            coefficients: Vec::new(),
        })
    }

    /// Sample-by-sample sum of two signals over this signal's time axis.
    ///
    /// # Errors
    /// - [`Error::SampleRateMismatch`] if the sample rates differ.
    /// - [`Error::SignalLengthMismatch`] if the lengths differ.
    pub fn try_add(&self, other: &Self) -> Result<Self> {
        self.combine(other, |a, b| a + b)
    }

    /// Sample-by-sample difference of two signals over this signal's time axis.
    ///
    /// # Errors
    /// - [`Error::SampleRateMismatch`] if the sample rates differ.
    /// - [`Error::SignalLengthMismatch`] if the lengths differ.
    pub fn try_sub(&self, other: &Self) -> Result<Self> {
        self.combine(other, |a, b| a - b)
    }

    /// Appends the samples of `other`, magnitude and time alike.
    ///
    /// # Errors
    /// Returns [`Error::SampleRateMismatch`] if the sample rates differ.
    pub fn append(&mut self, other: &Self) -> Result<()> {
        self.check_fsample(other)?;
        self.magnitude.extend_from_slice(&other.magnitude);
        self.time.extend_from_slice(&other.time);
        Ok(())
    }

    fn combine(&self, other: &Self, op: impl Fn(T, T) -> T) -> Result<Self> {
        self.check_fsample(other)?;
        if self.len() != other.len() {
            return Err(Error::SignalLengthMismatch {
                left: self.len(),
                right: other.len(),
            });
        }

        let magnitude = self
            .magnitude
            .iter()
            .zip(&other.magnitude)
            .map(|(&a, &b)| op(a, b))
            .collect();

        Ok(Self {
            magnitude,
            time: self.time.clone(),
            fsample: self.fsample,
            coefficients: Vec::new(),
        })
    }

    fn check_fsample(&self, other: &Self) -> Result<()> {
        if self.fsample.approx_eq(other.fsample) {
            Ok(())
        } else {
            Err(Error::SampleRateMismatch(
                self.fsample.to_string(),
                other.fsample.to_string(),
            ))
        }
    }
}

/// Number of samples left after clipping `percentage`% of `len`.
pub(crate) fn kept_samples(len: usize, percentage: f64) -> Result<usize> {
    if !(0.0..100.0).contains(&percentage) {
        return Err(Error::InvalidClipPercentage(percentage));
    }

    let keep = (len as f64 * (1.0 - percentage / 100.0)).floor();
    Ok(num_traits::cast::<f64, usize>(keep)
        .unwrap_or(len)
        .min(len))
}

/// Times of `n` samples taken at `fsample` Hz from zero.
pub(crate) fn sample_times<T: Value>(n: usize, fsample: T) -> Vec<T> {
    (0..n).map(|i| T::from_positive_int(i) / fsample).collect()
}

fn check_lengths<T>(magnitude: &[T], time: &[T]) -> Result<()> {
    if magnitude.len() == time.len() {
        Ok(())
    } else {
        Err(Error::LengthMismatch {
            magnitude: magnitude.len(),
            time: time.len(),
        })
    }
}

fn validate_fsample<T: Value>(fsample: T) -> Result<T> {
    if fsample > T::zero() && num_traits::float::FloatCore::is_finite(fsample) {
        Ok(fsample)
    } else {
        Err(Error::InvalidSampleRate)
    }
}

fn derive_fsample<T: Value>(time: &[T]) -> Result<T> {
    match time.last() {
        None => Ok(T::zero()),
        Some(&last) => validate_fsample(T::from_positive_int(time.len()) / last),
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::assert_all_close;

    #[test]
    fn test_time_from_sample_rate() {
        let signal = Signal::new(vec![1.0; 5], 4.0).unwrap();
        assert_eq!(signal.len(), signal.time().len());
        for (i, t) in signal.time().iter().enumerate() {
            assert_eq!(*t, i as f64 / 4.0);
        }
        assert!(signal.coefficients().is_empty());
    }

    #[test]
    fn test_sample_rate_from_time() {
        let signal = Signal::with_time(vec![1.0, 2.0, 3.0, 4.0], vec![0.5, 1.0, 1.5, 2.0]).unwrap();
        assert_eq!(signal.fsample(), 2.0);

        let empty = Signal::<f64>::with_time(vec![], vec![]).unwrap();
        assert_eq!(empty.fsample(), 0.0);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_construction_errors() {
        assert_eq!(Signal::new(vec![1.0], 0.0), Err(Error::InvalidSampleRate));
        assert_eq!(Signal::new(vec![1.0], f64::NAN), Err(Error::InvalidSampleRate));
        assert_eq!(
            Signal::with_time(vec![1.0, 2.0], vec![0.0]),
            Err(Error::LengthMismatch {
                magnitude: 2,
                time: 1
            })
        );
        assert_eq!(
            Signal::with_time(vec![1.0], vec![0.0]),
            Err(Error::InvalidSampleRate)
        );
        assert_eq!(
            Signal::<f64>::from_parts(vec![1.0], None, None, vec![]),
            Err(Error::InvalidSampleRate)
        );
    }

    #[test]
    fn test_from_parts_keeps_explicit_rate() {
        let signal =
            Signal::from_parts(vec![1.0, 2.0], Some(10.0), Some(vec![3.0, 3.1]), vec![2.0, 0.0])
                .unwrap();
        assert_eq!(signal.fsample(), 10.0);
        assert_eq!(signal.time(), &[3.0, 3.1]);
        assert_eq!(signal.coefficients(), &[2.0, 0.0]);
    }

    #[test]
    fn test_clip() {
        let magnitude: Vec<f64> = (0..10).map(f64::from).collect();
        let signal = Signal::new(magnitude, 1.0).unwrap();

        let mut right = signal.clone();
        right.clip(Direction::Right, 50.0).unwrap();
        assert_eq!(right.magnitude(), &[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(right.fsample(), 1.0);

        let mut left = signal.clone();
        left.clip(Direction::Left, 30.0).unwrap();
        assert_eq!(left.magnitude(), &[3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(left.time()[0], 3.0);

        let mut full = signal.clone();
        assert_eq!(
            full.clip(Direction::Right, 100.0),
            Err(Error::InvalidClipPercentage(100.0))
        );
        assert_eq!(full, signal);

        full.clip(Direction::Right, 0.0).unwrap();
        assert_eq!(full, signal);
    }

    #[test]
    fn test_set_data_is_atomic() {
        let mut signal = Signal::new(vec![1.0, 2.0], 1.0).unwrap();
        let before = signal.clone();

        assert!(signal.set_data(vec![1.0, 2.0, 3.0], vec![0.0, 1.0]).is_err());
        assert_eq!(signal, before);

        signal
            .set_data(vec![5.0, 6.0, 7.0, 8.0], vec![0.25, 0.5, 0.75, 1.0])
            .unwrap();
        assert_eq!(signal.len(), 4);
        assert_eq!(signal.fsample(), 4.0);
    }

    #[test]
    fn test_slice_and_truncate() {
        let mut signal = Signal::new(vec![1.0, 2.0, 3.0, 4.0], 2.0)
            .unwrap()
            .with_coefficients(vec![1.0]);

        let middle = signal.slice(1..3).unwrap();
        assert_eq!(middle.magnitude(), &[2.0, 3.0]);
        assert_eq!(middle.time(), &[0.5, 1.0]);
        assert_eq!(middle.fsample(), 2.0);
        assert!(middle.coefficients().is_empty());

        assert_eq!(
            signal.slice(2..5),
            Err(Error::SliceOutOfRange {
                start: 2,
                end: 5,
                len: 4
            })
        );

        signal.truncate(2);
        assert_eq!(signal.magnitude(), &[1.0, 2.0]);
        signal.truncate(10);
        assert_eq!(signal.len(), 2);
    }

    #[test]
    fn test_arithmetic() {
        let a = Signal::new(vec![1.0, 2.0, 3.0], 1.0).unwrap();
        let b = Signal::new(vec![0.5, 0.5, 0.5], 1.0).unwrap();

        assert_all_close!(a.try_add(&b).unwrap().magnitude(), &[1.5, 2.5, 3.5]);
        assert_all_close!(a.try_sub(&b).unwrap().magnitude(), &[0.5, 1.5, 2.5]);

        let faster = Signal::new(vec![0.5, 0.5, 0.5], 2.0).unwrap();
        assert!(matches!(
            a.try_add(&faster),
            Err(Error::SampleRateMismatch(_, _))
        ));

        let shorter = Signal::new(vec![0.5], 1.0).unwrap();
        assert_eq!(
            a.try_sub(&shorter),
            Err(Error::SignalLengthMismatch { left: 3, right: 1 })
        );
    }

    #[test]
    fn test_append() {
        let mut a = Signal::new(vec![1.0, 2.0], 1.0).unwrap();
        let b = Signal::new(vec![3.0], 1.0).unwrap();
        a.append(&b).unwrap();
        assert_eq!(a.magnitude(), &[1.0, 2.0, 3.0]);
        assert_eq!(a.time(), &[0.0, 1.0, 0.0]);

        let c = Signal::new(vec![3.0], 5.0).unwrap();
        assert!(a.append(&c).is_err());
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("left".parse::<Direction>(), Ok(Direction::Left));
        assert_eq!(" Right ".parse::<Direction>(), Ok(Direction::Right));
        assert_eq!(
            "up".parse::<Direction>(),
            Err(Error::InvalidDirection("up".to_string()))
        );
        assert_eq!(Direction::Left.to_string(), "left");
    }

    #[test]
    fn test_points() {
        let signal = Signal::new(vec![4.0, 5.0], 1.0).unwrap();
        assert_eq!(signal.points(), vec![(0.0, 4.0), (1.0, 5.0)]);
    }
}

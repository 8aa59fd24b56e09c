//! Parameter sweeps over two fit settings
//!
//! An [`ErrorMap`] refits the clipped signal of a [`SignalProcessor`] for every pair of values
//! `1..=9` on two chosen [`Axis`], holding the remaining setting at the processor's current
//! value. Each cell records the fitted magnitudes and their mean absolute percentage error
//! against the original signal.
//!
//! # Example
//! ```
//! # use chunkfit::{error_map::{Axis, ErrorMap}, InterpolationConfig, InterpolationKind, Signal, SignalProcessor};
//! let magnitude = (0..90).map(|i| 1.0 + (f64::from(i) / 15.0).sin()).collect();
//! let mut processor = SignalProcessor::new(Signal::new(magnitude, 10.0).unwrap());
//! processor.init_interpolation(InterpolationConfig::new(InterpolationKind::Polynomial, 1)).unwrap();
//!
//! let map = ErrorMap::compute(&processor, Axis::ChunkCount, Axis::PolynomialOrder).unwrap();
//! assert_eq!(map.errors().shape(), (9, 9));
//!
//! let (chunks, order, error) = map.best().unwrap();
//! println!("{chunks} chunks of order {order}: {error:.3}%");
//! ```
use std::{fmt, ops::RangeInclusive, str::FromStr};

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    processor::{fit, InterpolationConfig, SignalProcessor},
    statistics,
    value::Value,
};

/// Values swept along each axis.
pub const AXIS_VALUES: RangeInclusive<usize> = 1..=9;

/// A fit setting an [`ErrorMap`] can sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// [`InterpolationConfig::max_chunks`]
    ChunkCount,

    /// [`InterpolationConfig::order`]
    PolynomialOrder,

    /// [`InterpolationConfig::overlap_percent`]
    OverlapPercent,
}

impl Axis {
    /// Label for displaying the axis.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::ChunkCount => "No. Of Chunks",
            Self::PolynomialOrder => "Poly. Order",
            Self::OverlapPercent => "% Overlap",
        }
    }

    fn apply(self, config: &mut InterpolationConfig, value: usize) {
        match self {
            Self::ChunkCount => config.max_chunks = value,
            Self::PolynomialOrder => config.order = value,
            Self::OverlapPercent => config.overlap_percent = value as f64,
        }
    }
}

impl FromStr for Axis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chunks" | "chunk_count" | "no. of chunks" => Ok(Self::ChunkCount),
            "order" | "polynomial_order" | "poly. order" => Ok(Self::PolynomialOrder),
            "overlap" | "overlap_percent" | "% overlap" => Ok(Self::OverlapPercent),
            _ => Err(Error::InvalidAxis(s.to_string())),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChunkCount => write!(f, "chunks"),
            Self::PolynomialOrder => write!(f, "order"),
            Self::OverlapPercent => write!(f, "overlap"),
        }
    }
}

/// A cell of an [`ErrorMap`] whose fit failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellFailure {
    /// Index into [`ErrorMap::x_values`]
    pub x_index: usize,

    /// Index into [`ErrorMap::y_values`]
    pub y_index: usize,

    /// The fitting error
    pub message: String,
}

/// Serializable view of an [`ErrorMap`] without the fitted signals.
///
/// Errors are indexed `errors[x_index][y_index]`; failed cells serialize as `null` in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMapSummary {
    /// Setting swept along x
    pub x_axis: Axis,

    /// Setting swept along y
    pub y_axis: Axis,

    /// Values of the x setting
    pub x_values: Vec<usize>,

    /// Values of the y setting
    pub y_values: Vec<usize>,

    /// Mean absolute percentage error per cell
    pub errors: Vec<Vec<f64>>,

    /// Cells that could not be fitted
    pub failures: Vec<CellFailure>,
}

/// Fit error over a grid of two settings.
///
/// Cell `(i, j)` holds the fit for `x_values[i]` and `y_values[j]`. Cells whose fit failed
/// hold `NaN` and are listed in [`ErrorMap::failures`].
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorMap<T: Value = f64> {
    x_axis: Axis,
    y_axis: Axis,
    x_values: Vec<usize>,
    y_values: Vec<usize>,
    fitted: Vec<Vec<Vec<T>>>,
    errors: DMatrix<T>,
    failures: Vec<CellFailure>,
}

impl<T: Value> ErrorMap<T> {
    /// Sweeps `x_axis` and `y_axis` over [`AXIS_VALUES`].
    ///
    /// The processor is not modified; each cell fits a copy of its configuration.
    ///
    /// With the `parallel` feature, cells are fitted across the rayon thread pool.
    ///
    /// # Errors
    /// - [`Error::SameAxis`] if both axes are the same setting.
    /// - [`Error::NotConfigured`] if the processor has no configuration to start from.
    #[tracing::instrument(level = "debug", skip(processor), fields(x = %x_axis, y = %y_axis))]
    pub fn compute(processor: &SignalProcessor<T>, x_axis: Axis, y_axis: Axis) -> Result<Self> {
        if x_axis == y_axis {
            return Err(Error::SameAxis(x_axis.to_string()));
        }
        let base = processor.config().ok_or(Error::NotConfigured)?;

        let x_values: Vec<usize> = AXIS_VALUES.collect();
        let y_values: Vec<usize> = AXIS_VALUES.collect();
        let cells: Vec<(usize, usize)> = (0..x_values.len())
            .flat_map(|i| (0..y_values.len()).map(move |j| (i, j)))
            .collect();

        let evaluate = |&(i, j): &(usize, usize)| -> Result<Vec<T>> {
            let mut config = base.clone();
            x_axis.apply(&mut config, x_values[i]);
            y_axis.apply(&mut config, y_values[j]);
            let interpolation = fit(processor.clipped(), &config)?;
            Ok(interpolation.signal().magnitude().to_vec())
        };

        #[cfg(not(feature = "parallel"))]
        let results: Vec<Result<Vec<T>>> = cells.iter().map(evaluate).collect();

        #[cfg(feature = "parallel")]
        let results: Vec<Result<Vec<T>>> = {
            use rayon::prelude::*;
            cells.par_iter().map(evaluate).collect()
        };

        let original = processor.original().magnitude();
        let mut fitted = vec![vec![Vec::new(); y_values.len()]; x_values.len()];
        let mut errors = DMatrix::from_element(
            x_values.len(),
            y_values.len(),
            num_traits::float::FloatCore::nan(),
        );
        let mut failures = Vec::new();

        for ((i, j), result) in cells.into_iter().zip(results) {
            match result {
                Ok(magnitude) => {
                    errors[(i, j)] =
                        statistics::mean_absolute_percentage_error(original, &magnitude);
                    fitted[i][j] = magnitude;
                }
                Err(e) => {
                    tracing::warn!(
                        x = x_values[i],
                        y = y_values[j],
                        error = %e,
                        "error map cell could not be fitted"
                    );
                    failures.push(CellFailure {
                        x_index: i,
                        y_index: j,
                        message: e.to_string(),
                    });
                }
            }
        }

        tracing::debug!(failures = failures.len(), "computed error map");
        Ok(Self {
            x_axis,
            y_axis,
            x_values,
            y_values,
            fitted,
            errors,
            failures,
        })
    }

    /// Setting swept along x.
    #[must_use]
    pub fn x_axis(&self) -> Axis {
        self.x_axis
    }

    /// Setting swept along y.
    #[must_use]
    pub fn y_axis(&self) -> Axis {
        self.y_axis
    }

    /// Values of the x setting, one per row.
    #[must_use]
    pub fn x_values(&self) -> &[usize] {
        &self.x_values
    }

    /// Values of the y setting, one per column.
    #[must_use]
    pub fn y_values(&self) -> &[usize] {
        &self.y_values
    }

    /// Mean absolute percentage error of every cell.
    #[must_use]
    pub fn errors(&self) -> &DMatrix<T> {
        &self.errors
    }

    /// Error of cell `(i, j)`, or `None` outside of the grid.
    #[must_use]
    pub fn error(&self, i: usize, j: usize) -> Option<T> {
        self.errors.get((i, j)).copied()
    }

    /// Fitted magnitudes of cell `(i, j)`. Empty for failed cells.
    #[must_use]
    pub fn fitted(&self, i: usize, j: usize) -> Option<&[T]> {
        self.fitted.get(i)?.get(j).map(Vec::as_slice)
    }

    /// Cells whose fit failed.
    #[must_use]
    pub fn failures(&self) -> &[CellFailure] {
        &self.failures
    }

    /// The x value, y value and error of the cell with the lowest error.
    ///
    /// Returns `None` if no cell has a finite error.
    #[must_use]
    pub fn best(&self) -> Option<(usize, usize, T)> {
        let mut best: Option<(usize, usize, T)> = None;
        for i in 0..self.errors.nrows() {
            for j in 0..self.errors.ncols() {
                let error = self.errors[(i, j)];
                if !num_traits::float::FloatCore::is_finite(error) {
                    continue;
                }
                match best {
                    Some((_, _, lowest)) if lowest <= error => {}
                    _ => best = Some((self.x_values[i], self.y_values[j], error)),
                }
            }
        }
        best
    }

    /// A serializable copy of the axes, errors and failures.
    #[must_use]
    pub fn summary(&self) -> ErrorMapSummary {
        let errors = (0..self.errors.nrows())
            .map(|i| {
                (0..self.errors.ncols())
                    .map(|j| num_traits::ToPrimitive::to_f64(&self.errors[(i, j)]).unwrap_or(f64::NAN))
                    .collect()
            })
            .collect();

        ErrorMapSummary {
            x_axis: self.x_axis,
            y_axis: self.y_axis,
            x_values: self.x_values.clone(),
            y_values: self.y_values.clone(),
            errors,
            failures: self.failures.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert_close, function, sampled_signal, InterpolationKind, Signal};

    fn processor(samples: usize) -> SignalProcessor {
        function!(quadratic(x) = 3.0 + 0.5 x^1 - 0.2 x^2);
        let mut processor =
            SignalProcessor::new(sampled_signal!(quadratic, samples = samples, fsample = 10.0));
        processor
            .init_interpolation(InterpolationConfig::new(InterpolationKind::Polynomial, 1))
            .unwrap();
        processor
    }

    #[test]
    fn test_axis_parsing() {
        assert_eq!("No. Of Chunks".parse(), Ok(Axis::ChunkCount));
        assert_eq!("order".parse(), Ok(Axis::PolynomialOrder));
        assert_eq!(" % Overlap".parse(), Ok(Axis::OverlapPercent));
        assert_eq!(
            "degree".parse::<Axis>(),
            Err(Error::InvalidAxis("degree".to_string()))
        );
        assert_eq!(Axis::PolynomialOrder.label(), "Poly. Order");
    }

    #[test]
    fn test_same_axis() {
        assert_eq!(
            ErrorMap::compute(&processor(30), Axis::OverlapPercent, Axis::OverlapPercent),
            Err(Error::SameAxis("overlap".to_string()))
        );
    }

    #[test]
    fn test_unconfigured() {
        let processor = SignalProcessor::new(Signal::new(vec![1.0, 2.0], 1.0).unwrap());
        assert_eq!(
            ErrorMap::compute(&processor, Axis::ChunkCount, Axis::PolynomialOrder),
            Err(Error::NotConfigured)
        );
    }

    #[test]
    fn test_chunks_by_order() {
        let processor = processor(90);
        let map = ErrorMap::compute(&processor, Axis::ChunkCount, Axis::PolynomialOrder).unwrap();

        assert_eq!(map.errors().shape(), (9, 9));
        assert_eq!(map.x_values(), &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert!(map.failures().is_empty());
        assert!(map.errors().iter().all(|e| e.is_finite()));

        // One chunk of order 2 reproduces the quadratic
        assert_close!(map.error(0, 1).unwrap(), 0.0, tol = 1e-6);
        assert!(map.error(0, 0).unwrap() > map.error(0, 1).unwrap());
        assert_eq!(map.fitted(0, 1).unwrap().len(), 90);

        let (_, _, best) = map.best().unwrap();
        assert_close!(best, 0.0, tol = 1e-6);

        // The processor itself is untouched
        assert_eq!(processor.config().unwrap().order, 1);
    }

    #[test]
    fn test_failed_cells() {
        // 5 samples cannot be split into 6 or more chunks
        let map = ErrorMap::compute(&processor(5), Axis::ChunkCount, Axis::PolynomialOrder).unwrap();

        assert_eq!(map.failures().len(), 4 * 9);
        assert!(map.error(5, 0).unwrap().is_nan());
        assert!(map.fitted(5, 0).unwrap().is_empty());
        assert!(map.error(4, 0).unwrap().is_finite());
        assert!(map.error(9, 0).is_none());
    }

    #[test]
    fn test_summary() {
        let map = ErrorMap::compute(&processor(30), Axis::OverlapPercent, Axis::ChunkCount).unwrap();
        let summary = map.summary();
        assert_eq!(summary.errors.len(), 9);
        assert_eq!(summary.errors[0].len(), 9);

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains(r#""x_axis":"overlap_percent""#));
        assert!(json.contains(r#""y_axis":"chunk_count""#));
    }
}

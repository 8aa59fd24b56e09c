//! Smoothing splines
//!
//! A [`SmoothingSpline`] of order `k` is a piecewise polynomial of degree `k` with `k - 1`
//! continuous derivatives at its interior knots. It is fitted by least squares against the
//! data and the number of knots grows until the sum of squared residuals drops to the
//! smoothing bound `s`:
//!
//! - `s = 0` places one knot per data point (minus the boundary conditions) and interpolates.
//! - A large `s` keeps no interior knots, which is a plain least-squares polynomial of degree `k`.
//!
//! Knots are added at data points inside the knot intervals carrying the largest share of the
//! residual. When no more knots can be placed the spline falls back to interpolating knots.
//!
//! Outside of the data range the spline continues its first or last polynomial piece, so it
//! can be used to extrapolate.
use nalgebra::{DMatrix, DVector};

use crate::{
    error::{Error, Result},
    fit::solve_matrix,
    value::Value,
};

/// Highest supported spline order.
pub const MAX_ORDER: usize = 5;

/// Relative tolerance on the smoothing bound when estimating how many knots to add.
const KNOT_TOLERANCE: f64 = 1e-3;

/// A fitted smoothing spline in B-spline form.
///
/// # Example
/// ```
/// # use chunkfit::SmoothingSpline;
/// let x: Vec<f64> = (0..20).map(f64::from).collect();
/// let y: Vec<f64> = x.iter().map(|x| (x / 3.0).sin()).collect();
///
/// let spline = SmoothingSpline::fit(&x, &y, 3, 0.01).unwrap();
/// assert!(spline.residual() <= 0.01);
/// let at_half = spline.y(0.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothingSpline<T: Value = f64> {
    order: usize,
    knots: Vec<T>,
    coefficients: Vec<T>,
    residual: T,
}

impl<T: Value> SmoothingSpline<T> {
    /// Fits a spline of order `order` through `(x, y)` with a residual bound of `smoothing`.
    ///
    /// # Errors
    /// - [`Error::InvalidOrder`] unless `1 <= order <= 5`.
    /// - [`Error::LengthMismatch`] if `x` and `y` differ in length.
    /// - [`Error::DegreeTooHigh`] if there are not more data points than `order`.
    /// - [`Error::UnsortedData`] if `x` is not strictly increasing.
    /// - [`Error::InvalidSmoothing`] if `smoothing` is negative or not finite.
    /// - [`Error::Algebra`] if a least-squares system could not be solved.
    pub fn fit(x: &[T], y: &[T], order: usize, smoothing: T) -> Result<Self> {
        if order == 0 || order > MAX_ORDER {
            return Err(Error::InvalidOrder(order));
        }
        if x.len() != y.len() {
            return Err(Error::LengthMismatch {
                magnitude: y.len(),
                time: x.len(),
            });
        }
        if x.len() <= order {
            return Err(Error::DegreeTooHigh(order));
        }
        if x.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::UnsortedData);
        }
        if smoothing < T::zero() || !num_traits::float::FloatCore::is_finite(smoothing) {
            let s = num_traits::cast::<T, f64>(smoothing).unwrap_or(f64::NAN);
            return Err(Error::InvalidSmoothing(s));
        }

        let k = order;
        let max_interior = x.len() - k - 1;

        let mut interior = if smoothing.is_zero() {
            interpolating_knots(x, k)
        } else {
            Vec::new()
        };

        let mut nplus = 1;
        let mut fp_old: Option<T> = None;
        let mut spline = Self::least_squares(x, y, k, &interior)?;
        while spline.residual > smoothing && interior.len() < max_interior {
            nplus = knots_to_add(nplus, spline.residual, fp_old, smoothing);
            fp_old = Some(spline.residual);

            let residuals: Vec<T> = x.iter().zip(y).map(|(&x, &y)| y - spline.y(x)).collect();
            let placed = place_knots(x, &residuals, &mut interior, nplus, max_interior);
            if placed == 0 || interior.len() >= max_interior {
                interior = interpolating_knots(x, k);
            }

            tracing::trace!(
                knots = interior.len(),
                residual = %spline.residual,
                "refining spline knots"
            );
            spline = Self::least_squares(x, y, k, &interior)?;
        }

        tracing::debug!(
            order,
            samples = x.len(),
            interior_knots = interior.len(),
            residual = %spline.residual,
            smoothing = %smoothing,
            "fitted smoothing spline"
        );
        Ok(spline)
    }

    /// Least-squares spline with the given interior knots.
    fn least_squares(x: &[T], y: &[T], k: usize, interior: &[T]) -> Result<Self> {
        let (xb, xe) = (x[0], x[x.len() - 1]);
        let mut knots = Vec::with_capacity(interior.len() + 2 * (k + 1));
        knots.extend(std::iter::repeat(xb).take(k + 1));
        knots.extend_from_slice(interior);
        knots.extend(std::iter::repeat(xe).take(k + 1));

        let n = interior.len() + k + 1;
        let mut matrix = DMatrix::zeros(x.len(), n);
        let mut basis = [T::zero(); MAX_ORDER + 1];
        for (mut row, &xj) in matrix.row_iter_mut().zip(x) {
            let span = find_span(&knots, k, xj);
            basis_functions(&knots, k, span, xj, &mut basis);
            for r in 0..=k {
                row[span - k + r] = basis[r];
            }
        }

        let b = DVector::from_column_slice(y);
        let coefficients = solve_matrix(matrix, &b)?;

        let mut spline = Self {
            order: k,
            knots,
            coefficients,
            residual: T::zero(),
        };
        spline.residual = x
            .iter()
            .zip(y)
            .map(|(&x, &y)| Value::powi(y - spline.y(x), 2))
            .fold(T::zero(), |acc, r| acc + r);
        Ok(spline)
    }

    /// Order (polynomial degree of each piece) of the spline.
    #[must_use]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Full knot vector, boundary knots repeated `order + 1` times.
    #[must_use]
    pub fn knots(&self) -> &[T] {
        &self.knots
    }

    /// B-spline coefficients, one per basis function.
    #[must_use]
    pub fn coefficients(&self) -> &[T] {
        &self.coefficients
    }

    /// Sum of squared residuals of the fit against its data.
    #[must_use]
    pub fn residual(&self) -> T {
        self.residual
    }

    /// Evaluates the spline at `x`.
    ///
    /// Values outside of the fitted range continue the first or last polynomial piece.
    #[must_use]
    pub fn y(&self, x: T) -> T {
        let k = self.order;
        let span = find_span(&self.knots, k, x);

        let mut basis = [T::zero(); MAX_ORDER + 1];
        basis_functions(&self.knots, k, span, x, &mut basis);

        let mut y = T::zero();
        for r in 0..=k {
            y += self.coefficients[span - k + r] * basis[r];
        }
        y
    }

    /// Evaluates the spline at each of `x`.
    pub fn solve(&self, x: impl IntoIterator<Item = T>) -> Vec<T> {
        x.into_iter().map(|x| self.y(x)).collect()
    }
}

/// Index `i` of the knot span `knots[i] <= x < knots[i + 1]`, clamped to the polynomial pieces.
fn find_span<T: Value>(knots: &[T], k: usize, x: T) -> usize {
    let n = knots.len() - k - 1;
    k + knots[k + 1..n].partition_point(|&t| t <= x)
}

/// The `k + 1` B-splines that are non-zero on span `span`, evaluated at `x`.
///
/// `out[r]` holds basis function `span - k + r`.
fn basis_functions<T: Value>(knots: &[T], k: usize, span: usize, x: T, out: &mut [T]) {
    let mut left = [T::zero(); MAX_ORDER + 1];
    let mut right = [T::zero(); MAX_ORDER + 1];

    out[0] = T::one();
    for j in 1..=k {
        left[j] = x - knots[span + 1 - j];
        right[j] = knots[span + j] - x;

        let mut saved = T::zero();
        for r in 0..j {
            let temp = out[r] / (right[r + 1] + left[j - r]);
            out[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        out[j] = saved;
    }
}

/// Interior knots that make the least-squares spline interpolate the data.
///
/// Odd orders put knots on data points, even orders between them.
fn interpolating_knots<T: Value>(x: &[T], k: usize) -> Vec<T> {
    let count = x.len() - k - 1;
    let offset = (k + 1) / 2;
    if k % 2 == 1 {
        x[offset..offset + count].to_vec()
    } else {
        (offset..offset + count)
            .map(|j| (x[j] + x[j + 1]) / T::two())
            .collect()
    }
}

/// Number of knots to add next, from how much the last batch reduced the residual.
fn knots_to_add<T: Value>(nplus: usize, fp: T, fp_old: Option<T>, smoothing: T) -> usize {
    let acc = T::try_cast(KNOT_TOLERANCE).unwrap_or_else(|_| T::epsilon()) * smoothing;

    let estimate = match fp_old {
        Some(old) if old - fp > acc => {
            let estimate = T::from_positive_int(nplus) * (fp - smoothing) / (old - fp);
            num_traits::float::FloatCore::floor(estimate)
                .as_usize()
                .unwrap_or(nplus * 2)
        }
        _ => nplus * 2,
    };

    (nplus * 2).min(estimate.max(nplus / 2).max(1))
}

/// A knot interval with its share of the squared residual.
struct Interval<T> {
    lo: T,
    hi: T,
    fp: T,
}

/// Adds up to `count` knots, each at the middle data point of the interval with the largest residual.
///
/// Returns how many knots were placed.
fn place_knots<T: Value>(
    x: &[T],
    residuals: &[T],
    interior: &mut Vec<T>,
    count: usize,
    max: usize,
) -> usize {
    let (xb, xe) = (x[0], x[x.len() - 1]);
    let bounds: Vec<T> = std::iter::once(xb)
        .chain(interior.iter().copied())
        .chain(std::iter::once(xe))
        .collect();

    let mut intervals: Vec<Interval<T>> = bounds
        .windows(2)
        .map(|w| Interval {
            lo: w[0],
            hi: w[1],
            fp: T::zero(),
        })
        .collect();
    for (&xj, &r) in x.iter().zip(residuals) {
        let index = interior.partition_point(|&t| t <= xj);
        intervals[index].fp += r * r;
    }

    let mut placed = 0;
    while placed < count && interior.len() < max {
        let best = intervals
            .iter()
            .enumerate()
            .filter(|(_, iv)| !candidates(x, iv).is_empty())
            .max_by(|(_, a), (_, b)| {
                a.fp.partial_cmp(&b.fp)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i);
        let Some(best) = best else {
            break;
        };

        let inside = candidates(x, &intervals[best]);
        let knot = x[(inside.start + inside.end) / 2];

        let hi = intervals[best].hi;
        intervals[best].hi = knot;
        intervals[best].fp = T::zero();
        intervals.insert(
            best + 1,
            Interval {
                lo: knot,
                hi,
                fp: T::zero(),
            },
        );

        let at = interior.partition_point(|&t| t < knot);
        interior.insert(at, knot);
        placed += 1;
    }

    placed
}

/// Indices of the data points strictly inside an interval.
fn candidates<T: Value>(x: &[T], interval: &Interval<T>) -> std::ops::Range<usize> {
    let start = x.partition_point(|&v| v <= interval.lo);
    let end = x.partition_point(|&v| v < interval.hi);
    start..end.max(start)
}

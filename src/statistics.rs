//! Functions for evaluating how well an interpolation reproduces a signal
//!
//! # Model Fit
//! - [`r_squared`]: Proportion of variance explained by the model. Higher is better (0 to 1).
//!
//! # Error Metrics
//! - [`mean_absolute_error`]: Average absolute difference between observed and predicted values. Lower is better.
//! - [`mean_squared_error`]: Average squared difference between observed and predicted values. Lower is better.
//! - [`root_mean_squared_error`]: Square root of MSE, giving error in same units as observed values. Lower is better.
//! - [`percentage_error`]: Mean signed difference relative to the mean of the original signal, in percent.
//! - [`mean_absolute_percentage_error`]: Per-sample relative error, averaged, in percent.
//!
//! # Descriptive Statistics
//! - [`mean`]: Arithmetic mean of a dataset.
//!
//! # Examples
//!
//! ```rust
//! use chunkfit::statistics::{percentage_error, r_squared};
//!
//! let y = vec![1.0, 2.0, 3.0];
//! let y_fit = vec![1.1, 1.9, 3.05];
//!
//! let r2 = r_squared(y.iter().copied(), y_fit.iter().copied());
//! let pct = percentage_error(&y, &y_fit).unwrap();
//! println!("R² = {r2}, error = {pct}%");
//! ```
use crate::{
    error::{Error, Result},
    value::Value,
};

/// Computes the R² (coefficient of determination) between two sets of values.
///
/// <div class="warning">
///
/// **Technical Details**
///
/// ```math
/// R² = 1 - (SS_res / SS_tot)
/// where
///   SS_res = Σ (y_i - y_fit_i)²
///   SS_tot = Σ (y_i - y_mean)²
/// ```
/// </div>
///
/// A constant `y` gives `SS_tot = 0`, and so a non-finite result unless the fit is exact.
///
/// # Example
/// ```rust
/// # use chunkfit::statistics::r_squared;
/// let y = vec![1.0, 2.0, 3.0];
/// let y_fit = vec![1.1, 1.9, 3.05];
/// let r2 = r_squared(y.into_iter(), y_fit.into_iter());
/// ```
pub fn r_squared<T: Value>(y: impl Iterator<Item = T>, y_fit: impl Iterator<Item = T>) -> T {
    let y: Vec<T> = y.collect();
    let y_mean = mean(y.iter().copied());

    let mut ss_total = T::zero();
    let mut ss_residual = T::zero();
    for (y, y_fit) in y.into_iter().zip(y_fit) {
        ss_total += Value::powi(y - y_mean, 2);
        ss_residual += Value::powi(y - y_fit, 2);
    }

    T::one() - (ss_residual / ss_total)
}

/// Computes the arithmetic mean of a sequence of values.
///
/// Returns `NaN` if the iterator yields no elements.
///
/// # Examples
/// ```rust
/// let values = vec![1.0, 2.0, 3.0];
/// let m = chunkfit::statistics::mean(values.into_iter());
/// assert_eq!(m, 2.0);
/// ```
pub fn mean<T: Value>(data: impl Iterator<Item = T>) -> T {
    let mut sum = T::zero();
    let mut count = T::zero();
    for value in data {
        sum += value;
        count += T::one();
    }
    sum / count
}

/// Computes the mean absolute error (MAE) between two sets of values.
///
/// ```math
/// MAE = (Σ |y_i - y_fit_i|) / N
/// ```
///
/// # Example
/// ```rust
/// # use chunkfit::statistics::mean_absolute_error;
/// let y = vec![1.0, 2.0, 3.0];
/// let y_fit = vec![1.1, 1.9, 3.05];
/// let mae = mean_absolute_error(y.into_iter(), y_fit.into_iter());
/// ```
pub fn mean_absolute_error<T: Value>(
    y: impl Iterator<Item = T>,
    y_fit: impl Iterator<Item = T>,
) -> T {
    let mut total = T::zero();
    let mut n = T::zero();
    for (y, y_fit) in y.zip(y_fit) {
        total += Value::abs(y - y_fit);
        n += T::one();
    }
    total / n
}

/// Computes the root mean squared error (RMSE) between two sets of values.
///
/// # Example
/// ```
/// # use chunkfit::statistics::root_mean_squared_error;
/// let y = vec![1.0, 2.0, 3.0];
/// let y_fit = vec![1.1, 1.9, 3.05];
/// let rmse = root_mean_squared_error(y.into_iter(), y_fit.into_iter());
/// ```
pub fn root_mean_squared_error<T: Value>(
    y: impl Iterator<Item = T>,
    y_fit: impl Iterator<Item = T>,
) -> T {
    mean_squared_error(y, y_fit).sqrt()
}

/// Computes the mean squared error (MSE) between two sets of values.
///
/// ```math
/// MSE = (Σ (y_i - y_fit_i)²) / N
/// ```
///
/// # Example
/// ```
/// # use chunkfit::statistics::mean_squared_error;
/// let y = vec![1.0, 2.0, 3.0];
/// let y_fit = vec![1.1, 1.9, 3.05];
/// let mse = mean_squared_error(y.into_iter(), y_fit.into_iter());
/// ```
pub fn mean_squared_error<T: Value>(
    y: impl Iterator<Item = T>,
    y_fit: impl Iterator<Item = T>,
) -> T {
    let mut total = T::zero();
    let mut n = T::zero();
    for (y, y_fit) in y.zip(y_fit) {
        total += Value::powi(y - y_fit, 2);
        n += T::one();
    }
    total / n
}

/// Percentage error of an interpolated signal against the original.
///
/// <div class="warning">
///
/// **Technical Details**
///
/// ```math
/// E = |mean(o_i - f_i)| / |mean(o_i)| * 100
/// ```
/// </div>
///
/// Signed differences are averaged before taking the magnitude, so errors of opposite sign
/// cancel out: a fit that overshoots and undershoots by the same amount scores 0%. This is a
/// bias measure, not a quality score. It also differs from averaging `|o_i - f_i|`, which
/// never cancels. Use [`mean_absolute_percentage_error`] or
/// [`mean_absolute_error`] to judge how closely a fit follows the signal.
///
/// Both slices are compared up to the length of the shorter one.
///
/// # Errors
/// - [`Error::NoData`] if either slice is empty.
/// - [`Error::ZeroMean`] if the mean of `original` is zero.
///
/// # Example
/// ```
/// # use chunkfit::statistics::percentage_error;
/// let pct = percentage_error::<f64>(&[2.0, 4.0], &[1.0, 3.0]).unwrap();
/// assert!((pct - 100.0 / 3.0).abs() < 1e-9);
/// ```
pub fn percentage_error<T: Value>(original: &[T], fitted: &[T]) -> Result<T> {
    let n = original.len().min(fitted.len());
    if n == 0 {
        return Err(Error::NoData);
    }

    let reference = mean(original[..n].iter().copied());
    if reference.is_zero() {
        return Err(Error::ZeroMean);
    }

    let diff = mean(
        original[..n]
            .iter()
            .zip(&fitted[..n])
            .map(|(&o, &f)| o - f),
    );
    Ok(Value::abs(diff) / Value::abs(reference) * T::hundred())
}

/// Mean absolute percentage error of `fitted` against `original`.
///
/// ```math
/// MAPE = mean(|o_i - f_i| / |o_i|) * 100
/// ```
///
/// Samples where the original is exactly zero have no defined relative error and are
/// skipped. Returns `NaN` if no sample remains.
///
/// # Example
/// ```
/// # use chunkfit::statistics::mean_absolute_percentage_error;
/// let mape = mean_absolute_percentage_error(&[2.0, 0.0, 4.0], &[1.0, 7.0, 5.0]);
/// assert_eq!(mape, 37.5);
/// ```
pub fn mean_absolute_percentage_error<T: Value>(original: &[T], fitted: &[T]) -> T {
    mean(
        original
            .iter()
            .zip(fitted)
            .filter(|(o, _)| !o.is_zero())
            .map(|(&o, &f)| Value::abs(o - f) / Value::abs(o) * T::hundred()),
    )
}

use std::{borrow::Cow, ops::RangeInclusive};

use nalgebra::{DMatrix, DVector, SVD};

use crate::{
    basis::Basis,
    display::PolynomialDisplay,
    error::{Error, Result},
    statistics,
    value::{CoordExt, Value},
    Polynomial,
};

/// Polynomial curve in the monomial basis.
///
/// Chunk fits use this alias; its coefficients read directly as `y = a + bx + cx² + …`.
pub type MonomialFit<'data, T = f64> = CurveFit<'data, crate::basis::MonomialBasis<T>, T>;

/// Represents a least-squares polynomial curve fit for a set of data points.
///
/// `CurveFit` computes the polynomial of a given degree that best fits a dataset using a
/// specified polynomial basis. It stores both the source data and the resulting coefficients.
/// Every chunk of a chunked signal gets its own `CurveFit`.
///
/// # How it works
/// - Builds a **basis matrix** with shape `[rows, k]` where `rows`
///   is the number of data points and `k` is the number of basis functions.
/// - Scales every column to unit length, so that high powers of large `x` values do not
///   swamp the decomposition.
/// - Solves the linear system `A * x = b` using the **SVD** of the scaled basis matrix,
///   then undoes the column scaling on the solution.
///
/// # Example
/// ```
/// # use chunkfit::MonomialFit;
/// let data = &[(0.0, 1.0), (1.0, 3.0), (2.0, 7.0)];
/// let fit = MonomialFit::new(data, 2).unwrap();
/// println!("Coefficients: {:?}", fit.coefficients());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CurveFit<'data, B, T: Value = f64>
where
    B: Basis<T>,
    B: PolynomialDisplay<T>,
{
    data: Cow<'data, [(T, T)]>,
    x_range: RangeInclusive<T>,
    function: Polynomial<'static, B, T>,
}
impl<'data, T: Value, B> CurveFit<'data, B, T>
where
    B: Basis<T>,
    B: PolynomialDisplay<T>,
{
    /// Turns a dataset into a basis matrix and y-values vector.
    fn create_matrix(data: &[(T, T)], basis: &B, k: usize) -> (DMatrix<T>, DVector<T>) {
        let mut bigx = DMatrix::zeros(data.len(), k);
        let b = DVector::from_iterator(data.len(), data.iter().map(|&(_, y)| y));

        for (row, (x, _)) in bigx.row_iter_mut().zip(data.iter()) {
            let x = basis.normalize_x(*x);
            basis.fill_matrix_row(x, row);
        }

        (bigx, b)
    }

    /// Divides each column by its euclidean norm, returning the norms.
    ///
    /// All-zero columns are left alone and report a norm of one.
    fn scale_columns(matrix: &mut DMatrix<T>) -> Vec<T> {
        let mut norms = Vec::with_capacity(matrix.ncols());
        for mut column in matrix.column_iter_mut() {
            let norm = column.norm();
            let norm = if norm > T::zero() { norm } else { T::one() };
            column /= norm;
            norms.push(norm);
        }
        norms
    }

    /// Creates a new polynomial curve fit for the given data and degree.
    ///
    /// # Errors
    /// Returns an [`Error`] in the following cases:
    /// - `Error::NoData`: `data` is empty.
    /// - `Error::DegreeTooHigh`: `degree >= data.len()`.
    /// - `Error::Algebra`: the linear system could not be solved.
    /// - `Error::CastFailed`: a numeric value could not be cast to the target type.
    ///
    /// # Example
    /// ```
    /// # use chunkfit::MonomialFit;
    /// let data: &[(f64, f64)] = &[(0.0, 0.0), (1.0, 2.0), (2.0, 4.0), (3.0, 6.0)];
    /// let fit = MonomialFit::new(data, 1).unwrap();
    /// assert!((fit.coefficients()[1] - 2.0).abs() < 1e-9);
    /// ```
    pub fn new(data: impl Into<Cow<'data, [(T, T)]>>, degree: usize) -> Result<Self> {
        let data: Cow<_> = data.into();

        if data.is_empty() {
            return Err(Error::NoData);
        } else if degree >= data.len() {
            return Err(Error::DegreeTooHigh(degree));
        }

        let x_range = data.as_ref().x_range().ok_or(Error::NoData)?;
        let basis = B::from_range(x_range.clone());
        let k = basis.k(degree);

        let (mut m, b) = Self::create_matrix(&data, &basis, k);
        let norms = Self::scale_columns(&mut m);
        let mut coefs = solve_matrix(m, &b)?;
        for (c, norm) in coefs.iter_mut().zip(norms) {
            *c /= norm;
        }

        // Safety: The coefs were generated by the basis
        let function = unsafe { Polynomial::from_raw(basis, coefs.into(), degree) };
        Ok(Self {
            data,
            x_range,
            function,
        })
    }

    /// Returns the degree of the polynomial.
    pub fn degree(&self) -> usize {
        self.function.degree()
    }

    /// Returns the fitted coefficients, one per basis function.
    ///
    /// For example in a monomial expression `y(x) = 2x^2 - 3x + 1`;
    /// coefficients = [1.0, -3.0, 2.0]
    pub fn coefficients(&self) -> &[T] {
        self.function.coefficients()
    }

    /// Returns the data points used for fitting.
    pub fn data(&self) -> &[(T, T)] {
        &self.data
    }

    /// Returns the inclusive range of x-values in the dataset.
    pub fn x_range(&self) -> RangeInclusive<T> {
        self.x_range.clone()
    }

    /// Evaluates the fitted polynomial at a given x-value.
    ///
    /// Values outside of [`CurveFit::x_range`] are extrapolated; the fit gives no
    /// guarantee of quality there.
    pub fn y(&self, x: T) -> T {
        self.function.y(x)
    }

    /// Evaluates the curve at multiple x-values.
    pub fn solve(&self, x: impl IntoIterator<Item = T>) -> Vec<(T, T)> {
        self.function.solve(x)
    }

    /// Returns the fitted y-values at the original x-values.
    pub fn solution(&self) -> Vec<(T, T)> {
        self.solve(self.data.as_ref().x_iter())
    }

    /// Mean absolute difference between the source data and the fit.
    pub fn mean_absolute_error(&self) -> T {
        statistics::mean_absolute_error(self.data.as_ref().y_iter(), self.solution().y_iter())
    }

    /// R² of the fit against the source data.
    pub fn r_squared(&self) -> T {
        statistics::r_squared(self.data.as_ref().y_iter(), self.solution().y_iter())
    }

    /// Returns the fitted polynomial.
    pub fn as_polynomial(&self) -> &Polynomial<'_, B, T> {
        &self.function
    }

    /// Returns a human-readable string of the fitted equation.
    pub fn equation(&self) -> String {
        self.function.equation()
    }
}

impl<B, T: Value> AsRef<Polynomial<'static, B, T>> for CurveFit<'_, B, T>
where
    B: Basis<T>,
    B: PolynomialDisplay<T>,
{
    fn as_ref(&self) -> &Polynomial<'static, B, T> {
        &self.function
    }
}

impl<T: Value, B> std::fmt::Display for CurveFit<'_, B, T>
where
    B: Basis<T>,
    B: PolynomialDisplay<T>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.equation())
    }
}

/// Solves the least-squares system `matrix * x = b` using SVD.
///
/// Singular values below `machine_epsilon * max(rows, cols) * sigma_max` are treated as zero,
/// so rank-deficient systems resolve to the minimum-norm solution.
pub(crate) fn solve_matrix<T: Value>(matrix: DMatrix<T>, b: &DVector<T>) -> Result<Vec<T>> {
    let size = matrix.shape();
    let decomp = SVD::new_unordered(matrix, true, true);

    let machine_epsilon = T::epsilon();
    let max_size = size.0.max(size.1);
    let sigma_max = decomp.singular_values.max();
    let epsilon = machine_epsilon * T::try_cast(max_size)? * sigma_max;

    let big_x = decomp.solve(b, epsilon).map_err(Error::Algebra)?;
    let coefficients: Vec<_> = big_x.data.into();

    if coefficients.iter().any(|c| c.is_nan()) {
        return Err(Error::Algebra("NaN in coefficients"));
    }

    Ok(coefficients)
}

#[cfg(test)]
mod tests {
    use crate::{assert_all_close, assert_close, assert_y, function};

    use super::*;

    #[test]
    fn test_linear_fit() {
        let data = &[(0.0, 0.0), (1.0, 2.0), (2.0, 4.0), (3.0, 6.0)];
        let fit = MonomialFit::new(data, 1).unwrap();
        assert_all_close!(fit.coefficients(), &[0.0, 2.0], tol = 1e-12);
        assert_close!(fit.mean_absolute_error(), 0.0, tol = 1e-12);
        assert_eq!(fit.degree(), 1);
        assert_y!(fit, 0.0, fit.coefficients()[0]);
    }

    #[test]
    fn test_recovers_cubic_far_from_origin() {
        function!(poly(x) = 4.0 - 3.0 x^1 + 0.5 x^2 + 0.01 x^3);
        let data = poly.solve((1000..=1100).map(f64::from));
        let fit = MonomialFit::new(&data, 3).unwrap();
        for &(x, y) in &data {
            assert_close!(fit.y(x), y, tol = 1e-6 * y.abs());
        }
        assert!(fit.r_squared() > 0.999_999);
    }

    #[test]
    fn test_extrapolates_outside_range() {
        function!(poly(x) = 1.0 + 2.0 x^1);
        let data = poly.solve((0..=4).map(f64::from));
        let fit = MonomialFit::new(&data, 1).unwrap();
        assert_close!(fit.y(10.0), 21.0, tol = 1e-9);
        assert_close!(fit.y(-1.0), -1.0, tol = 1e-9, "fitted polynomial should continue the line");
    }

    #[test]
    fn test_metrics_on_owned_data() {
        function!(poly(x) = 3.0 - 1.5 x^1);
        let data = poly.solve((0..8).map(f64::from));
        let fit = MonomialFit::new(data.clone(), 1).unwrap();

        assert_all_close!(fit.solution().y(), data.y(), tol = 1e-9);
        assert_close!(fit.mean_absolute_error(), 0.0, tol = 1e-9);
        assert_close!(fit.r_squared(), 1.0, tol = 1e-9);
    }

    #[test]
    fn test_errors() {
        let empty: &[(f64, f64)] = &[];
        assert_eq!(MonomialFit::new(empty, 1), Err(Error::NoData));

        let data = &[(0.0, 1.0), (1.0, 3.0)];
        assert_eq!(MonomialFit::new(data, 2), Err(Error::DegreeTooHigh(2)));
    }

    #[test]
    fn test_solution_and_equation() {
        let data = &[(0.0, 1.0), (1.0, 3.0), (2.0, 7.0)];
        let fit = MonomialFit::new(data, 2).unwrap();
        assert_eq!(fit.solution().len(), data.len());
        assert_eq!(fit.x_range(), 0.0..=2.0);
        assert!(fit.equation().starts_with("y(x) = "));
        assert_eq!(fit.to_string(), fit.equation());
    }
}

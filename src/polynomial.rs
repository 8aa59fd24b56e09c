use std::borrow::Cow;

use crate::{
    basis::Basis,
    display::PolynomialDisplay,
    error::{Error, Result},
    value::Value,
};

/// Represents a polynomial function in a given basis.
///
/// Unlike [`crate::CurveFit`], this struct is **not tied to any dataset or matrix**, making it a canonical function that
/// can be evaluated for **any x-value** without range restrictions. Extrapolation past the end of a clipped signal
/// evaluates the last chunk's fit as one of these.
///
/// # Type Parameters
/// - `'a`: Lifetime for borrowed coefficients, if used.
/// - `B`: The polynomial basis (e.g., [`crate::basis::MonomialBasis`]).
/// - `T`: Numeric type for the coefficients, default is `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial<'a, B, T: Value = f64>
where
    B: Basis<T>,
    B: PolynomialDisplay<T>,
{
    degree: usize,
    basis: B,
    coefficients: Cow<'a, [T]>,
}
impl<'a, B, T: Value> Polynomial<'a, B, T>
where
    B: Basis<T>,
    B: PolynomialDisplay<T>,
{
    /// Creates a [`Polynomial`] from a given basis, coefficients, and degree.
    ///
    /// # Safety
    /// This constructor does not check that the number of coefficients matches
    /// the degree. The length of coefficients must be equal to `Basis::k(degree)`
    pub const unsafe fn from_raw(basis: B, coefficients: Cow<'a, [T]>, degree: usize) -> Self {
        Self {
            degree,
            basis,
            coefficients,
        }
    }

    /// Creates a new polynomial from a basis and coefficients, inferring the degree.
    ///
    /// # Errors
    /// Returns an error if the number of coefficients does not correspond to a valid degree for the given basis.
    pub fn from_basis(basis: B, coefficients: impl Into<Cow<'a, [T]>>) -> Result<Self> {
        let coefficients = coefficients.into();
        let degree = basis
            .degree(coefficients.len())
            .ok_or(Error::InvalidNumberOfParameters(coefficients.len()))?;
        Ok(unsafe { Self::from_raw(basis, coefficients, degree) })
    }

    /// Returns a reference to the polynomial’s coefficients.
    ///
    /// The index of each coefficient is the index of its basis function.
    ///
    /// For example in a monomial expression `y(x) = 2x^2 - 3x + 1`;
    /// coefficients = [1.0, -3.0, 2.0]
    #[must_use]
    pub fn coefficients(&self) -> &[T] {
        &self.coefficients
    }

    /// Returns the degree of the polynomial.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Evaluates the polynomial at a given x-value.
    ///
    /// <div class="warning">
    ///
    /// **Technical Details**
    ///
    /// Given [`Basis::k`] coefficients and basis functions, and for each pair of coefficients *`c_j`* and basis function *`B_j(x)`*, this function returns:
    /// ```math
    /// y(x) = Σ (c_j * B_j(x))
    /// ```
    /// </div>
    ///
    /// # Example
    /// ```
    /// # use chunkfit::MonomialPolynomial;
    /// let poly = MonomialPolynomial::borrowed(&[1.0, 2.0, 3.0]); // Represents 1 + 2x + 3x^2
    /// let y = poly.y(2.0); // evaluates 1 + 2*2 + 3*2^2 = 17.0
    /// ```
    pub fn y(&self, x: T) -> T {
        let mut y = T::zero();
        let x = self.basis.normalize_x(x);
        for (i, &coef) in self.coefficients.iter().enumerate() {
            y += coef * self.basis.solve_function(i, x);
        }

        y
    }

    /// Evaluates the polynomial at multiple x-values, returning `(x, y)` pairs.
    pub fn solve(&self, x: impl IntoIterator<Item = T>) -> Vec<(T, T)> {
        x.into_iter().map(|x| (x, self.y(x))).collect()
    }

    /// Returns a human-readable string of the polynomial equation.
    ///
    /// ```text
    /// y(x) = 1.00x³ + 2.00x² + 3.00x + 4.00
    /// ```
    #[must_use]
    pub fn equation(&self) -> String {
        let mut output = String::new();
        // Writing into a String cannot fail
        let _ = self.basis.format_polynomial(&mut output, self.coefficients());
        output
    }
}

impl<'a, B, T: Value> AsRef<Polynomial<'a, B, T>> for Polynomial<'a, B, T>
where
    B: Basis<T>,
    B: PolynomialDisplay<T>,
{
    fn as_ref(&self) -> &Polynomial<'a, B, T> {
        self
    }
}

impl<B, T: Value> std::fmt::Display for Polynomial<'_, B, T>
where
    B: Basis<T>,
    B: PolynomialDisplay<T>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.equation())
    }
}

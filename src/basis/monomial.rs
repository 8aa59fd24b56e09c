use std::borrow::Cow;

use nalgebra::MatrixViewMut;

use crate::{
    basis::Basis,
    display::{self, Sign, DEFAULT_PRECISION},
    value::Value,
    Polynomial,
};

/// Standard (non-normalized) monomial basis for polynomials.
///
/// ```text
/// 1, x, x², …, xⁿ
/// ```
///
/// Chunks are short and the fit degree is low, so the lack of normalization
/// is not a stability concern for chunk fits. Coefficients in this basis are the
/// ones reported on fitted chunk signals.
#[derive(Debug, Clone, PartialEq)]
pub struct MonomialBasis<T: Value = f64>(pub std::marker::PhantomData<T>);
impl<T: Value> MonomialBasis<T> {
    /// Creates a new monomial basis.
    #[must_use]
    pub const fn default() -> Self {
        Self(std::marker::PhantomData)
    }
}
impl<T: Value> Basis<T> for MonomialBasis<T> {
    fn from_range(_x_range: std::ops::RangeInclusive<T>) -> Self {
        Self::default()
    }

    #[inline(always)]
    fn normalize_x(&self, x: T) -> T {
        x
    }

    #[inline(always)]
    fn fill_matrix_row<R: nalgebra::Dim, C: nalgebra::Dim, RS: nalgebra::Dim, CS: nalgebra::Dim>(
        &self,
        x: T,
        mut row: MatrixViewMut<T, R, C, RS, CS>,
    ) {
        for j in 0..row.ncols() {
            row[j] = self.solve_function(j, x);
        }
    }

    #[inline(always)]
    fn solve_function(&self, j: usize, x: T) -> T {
        match j {
            0 => T::one(),
            1 => x,
            _ => Value::powi(x, i32::try_from(j).unwrap_or(i32::MAX)),
        }
    }
}
impl<T: Value> display::PolynomialDisplay<T> for MonomialBasis<T> {
    fn format_term(&self, degree: i32, coef: T) -> Option<display::Term> {
        let sign = Sign::from_coef(coef);

        let base = display::format_variable("x", degree);
        let coef = display::format_coefficient(coef, degree, DEFAULT_PRECISION)?;

        let body = format!("{coef}{base}");
        Some(display::Term::new(sign, body))
    }
}

/// A monomial polynomial of the form `y = a_n * x^n + ... + a_1 * x + a_0`.
///
/// # Type Parameters
/// - `'a`: Lifetime of borrowed coefficients (if used).
/// - `T`: Numeric type (default `f64`).
pub type MonomialPolynomial<'a, T = f64> = Polynomial<'a, MonomialBasis<T>, T>;

impl<'a, T: Value> MonomialPolynomial<'a, T> {
    /// Creates a new borrowed monomial polynomial from a slice of coefficients.
    ///
    /// # Parameters
    /// - `coefficients`: Slice of coefficients, starting from the constant term.
    ///
    /// # Example
    /// ```
    /// # use chunkfit::MonomialPolynomial;
    /// let poly = MonomialPolynomial::borrowed(&[1.0, 2.0, 3.0]); // 1 + 2x + 3x^2
    /// ```
    pub const fn borrowed(coefficients: &'a [T]) -> Self {
        let degree = coefficients.len().saturating_sub(1);
        // Safety: Monomials expect k+1 coefficients
        unsafe {
            Self::from_raw(
                MonomialBasis::default(),
                Cow::Borrowed(coefficients),
                degree,
            )
        }
    }

    /// Creates a new owned monomial polynomial from a vector of coefficients.
    ///
    /// # Parameters
    /// - `coefficients`: Vec of coefficients, starting from the constant term.
    #[must_use]
    pub const fn owned(coefficients: Vec<T>) -> Self {
        let degree = coefficients.len().saturating_sub(1);
        // Safety: Monomials expect k+1 coefficients
        unsafe { Self::from_raw(MonomialBasis::default(), Cow::Owned(coefficients), degree) }
    }

    /// Creates an owned monomial polynomial from coefficients ordered highest power first.
    ///
    /// This is the order fitted chunk signals carry their coefficients in.
    ///
    /// # Example
    /// ```
    /// # use chunkfit::MonomialPolynomial;
    /// let poly = MonomialPolynomial::from_descending(&[3.0, 2.0, 1.0]); // 3x^2 + 2x + 1
    /// assert_eq!(poly.y(1.0), 6.0);
    /// ```
    #[must_use]
    pub fn from_descending(coefficients: &[T]) -> MonomialPolynomial<'static, T> {
        MonomialPolynomial::owned(coefficients.iter().rev().copied().collect())
    }

    /// Returns the coefficients ordered highest power first.
    #[must_use]
    pub fn descending_coefficients(&self) -> Vec<T> {
        self.coefficients().iter().rev().copied().collect()
    }
}

//! Polynomial basis functions for chunk fitting
//!
//! This module defines the [`Basis`] trait, which abstracts the functions a chunk's
//! least-squares fit is expressed in. Every chunk of a signal is fitted independently,
//! so the basis only needs to describe how one row of the design matrix is filled and
//! how a single basis function is evaluated.
//!
//! # Provided Bases
//! - [`MonomialBasis`]: The standard monomial basis, i.e., 1, x, x², … xⁿ.
//!   Chunk coefficients are reported in this basis, so they can be displayed directly
//!   as `y = ax² + bx + c`.

use nalgebra::MatrixViewMut;

use crate::value::Value;

pub(crate) mod monomial;
pub use monomial::MonomialBasis;

/// A polynomial basis defines the set of functions used to represent a polynomial.
///
/// It is not meant to be used on its own, but through [`crate::Polynomial`] or
/// [`crate::CurveFit`], which are generic over basis.
///
/// # Type Parameters
/// - `T`: The numeric type used for coefficients and evaluation (e.g., `f64`).
pub trait Basis<T: Value>: Sized + Clone + std::fmt::Debug + Send + Sync {
    /// Create a new basis from the given data
    ///
    /// Initializes any needed metadata for normalization
    fn from_range(x_range: std::ops::RangeInclusive<T>) -> Self;

    /// Returns the number of basis functions needed for a polynomial of a given degree.
    ///
    /// - Degree 0 → 1 function (constant)
    /// - Degree 2 → 3 functions (constant + x¹ + x²)
    #[inline(always)]
    fn k(&self, degree: usize) -> usize {
        degree + 1
    }

    /// Returns the polynomial degree corresponding to a given number of basis functions.
    ///
    /// Returns `None` if the number of functions does not correspond to a valid degree.
    #[inline(always)]
    fn degree(&self, k: usize) -> Option<usize> {
        k.checked_sub(1)
    }

    /// Populates one row of the design matrix with every basis function evaluated at `x`.
    ///
    /// `x` is normalized by the caller using [`Basis::normalize_x`].
    fn fill_matrix_row<R: nalgebra::Dim, C: nalgebra::Dim, RS: nalgebra::Dim, CS: nalgebra::Dim>(
        &self,
        x: T,
        row: MatrixViewMut<T, R, C, RS, CS>,
    );

    /// Normalizes the input value `x` for this basis.
    ///
    /// This is a no-op for the monomial basis.
    fn normalize_x(&self, x: T) -> T;

    /// Evaluates the jth function of this basis at a given point.
    ///
    /// Formally, the basis provides functions φ₀, φ₁, …, φₙ, and solves `φⱼ(x)`
    fn solve_function(&self, j: usize, x: T) -> T;
}

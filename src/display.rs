//! Utilities for displaying and formatting chunk equations
//!
//! Fitted chunks carry their polynomial coefficients so a collaborator can show the
//! equation of whichever chunk a user selected. This module turns those coefficients
//! into strings such as `y(x) = 2.00x² - 1.50x + 3.00`.
//!
//! # Key Concepts
//! - **[`PolynomialDisplay`]**: Trait to define how a polynomial basis renders terms.
//! - **[`Term`]**: A single rendered term with its sign.
//! - **[`Sign`]**: Whether a term is joined with `+` or `-`.
#![allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]

use crate::value::Value;

pub mod unicode;

/// Default number of decimals used by the provided implementations of [`PolynomialDisplay`]
pub const DEFAULT_PRECISION: usize = 2;

/// Magnitudes inside this range are written in fixed notation, all others in scientific notation
#[must_use]
pub fn default_fixed_range<T: Value>() -> Option<std::ops::Range<T>> {
    const RANGE: std::ops::Range<f64> = 1e-3..1e3;
    let s = T::try_cast(RANGE.start).ok()?;
    let e = T::try_cast(RANGE.end).ok()?;
    Some(s..e)
}

/// Trait for rendering polynomial expressions.
///
/// Implementors only decide how one term looks; [`PolynomialDisplay::format_polynomial`]
/// joins the terms, highest power first, into a `y(x) = ...` equation.
///
/// # Example
/// ```rust
/// # use chunkfit::display::{format_variable, format_coefficient, DEFAULT_PRECISION, PolynomialDisplay, Term, Sign};
/// pub struct TimeBasis;
/// impl<T: chunkfit::value::Value> PolynomialDisplay<T> for TimeBasis {
///     fn format_term(&self, degree: i32, coef: T) -> Option<Term> {
///         let sign = Sign::from_coef(coef);
///         let base = format_variable("t", degree);
///         let coef = format_coefficient(coef, degree, DEFAULT_PRECISION)?;
///         Some(Term::new(sign, format!("{coef}{base}")))
///     }
/// }
/// ```
pub trait PolynomialDisplay<T: Value> {
    /// Formats a single polynomial term for display.
    ///
    /// Returning `None` skips the term (typically when the coefficient is zero).
    fn format_term(&self, degree: i32, coef: T) -> Option<Term>;

    /// Writes the full polynomial expression into the provided buffer.
    ///
    /// `coefficients[i]` is the coefficient of the `i`th basis function. Terms are written
    /// from the highest degree down, zero terms are skipped, and a polynomial with no
    /// remaining terms is written as `y(x) = 0`.
    ///
    /// # Errors
    /// Returns an error if writing to `buffer` fails.
    fn format_polynomial<B: std::fmt::Write>(
        &self,
        buffer: &mut B,
        coefficients: &[T],
    ) -> std::fmt::Result {
        let mut terms = coefficients
            .iter()
            .enumerate()
            .rev()
            .filter_map(|(degree, &coef)| self.format_term(degree as i32, coef));

        write!(buffer, "y(x) = ")?;
        let Some(first) = terms.next() else {
            return write!(buffer, "0");
        };

        if first.sign == Sign::Negative {
            write!(buffer, "{}", first.sign.char())?;
        }
        write!(buffer, "{}", first.body)?;

        for term in terms {
            write!(buffer, " {} {}", term.sign.char(), term.body)?;
        }

        Ok(())
    }
}

/// The sign a term is joined to the equation with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    /// Positive sign (`+` when displayed).
    Positive,

    /// Negative sign (`-` when displayed).
    Negative,
}

impl Sign {
    /// Determines the sign from a numeric coefficient. Zero is positive.
    pub fn from_coef<T: Value>(coef: T) -> Self {
        if coef.is_sign_negative() {
            Self::Negative
        } else {
            Self::Positive
        }
    }

    /// Returns `+` for `Positive` and `-` for `Negative`.
    #[must_use]
    pub fn char(&self) -> char {
        match self {
            Sign::Positive => '+',
            Sign::Negative => '-',
        }
    }
}

/// One rendered term of an equation, such as `2.00x²`, with the sign kept apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    /// The sign of the term.
    pub sign: Sign,

    /// The unsigned body of the term.
    pub body: String,
}

impl Term {
    /// Creates a new polynomial term with the given sign and body.
    #[must_use]
    pub fn new(sign: Sign, body: String) -> Self {
        Self { sign, body }
    }
}

/// Formats the magnitude of a coefficient for display in a term.
///
/// - Returns `None` if the coefficient is zero or within epsilon of it.
/// - Returns an empty string for a unit coefficient on a non-constant term, so `1x` shows as `x`.
/// - Uses fixed notation inside [`default_fixed_range`] and scientific notation outside it.
///
/// # Example
/// ```
/// # use chunkfit::display::format_coefficient;
/// assert_eq!(format_coefficient(0.0, 1, 2), None);
/// assert_eq!(format_coefficient(-2.5, 1, 2), Some("2.50".to_string()));
/// assert_eq!(format_coefficient(1e5, 1, 2), Some("1.00e5".to_string()));
/// ```
pub fn format_coefficient<T: Value>(coef: T, degree: i32, precision: usize) -> Option<String> {
    let abs = Value::abs(coef);

    if coef.is_zero() || abs <= T::epsilon() {
        return None;
    }

    if abs.abs_sub(T::one()) <= T::epsilon() && degree != 0 {
        return Some(String::new());
    }

    Some(unicode::float(abs, default_fixed_range(), precision))
}

/// Formats the variable part of a term, such as `x²`.
///
/// An exponent of zero gives an empty string and an exponent of one the bare name.
///
/// # Examples
/// ```
/// # use chunkfit::display::format_variable;
/// assert_eq!(format_variable("x", 0), "");
/// assert_eq!(format_variable("x", 1), "x");
/// assert_eq!(format_variable("t", 12), "t¹²");
/// ```
#[must_use]
pub fn format_variable(base: &str, exp: i32) -> String {
    match exp {
        0 => String::new(),
        1 => base.to_string(),
        _ => format!("{base}{}", unicode::superscript(&exp.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::MonomialBasis;

    fn render(coefficients: &[f64]) -> String {
        let mut buf = String::new();
        MonomialBasis::<f64>::default()
            .format_polynomial(&mut buf, coefficients)
            .unwrap();
        buf
    }

    #[test]
    fn test_sign() {
        assert_eq!(Sign::from_coef(1.0), Sign::Positive);
        assert_eq!(Sign::from_coef(-1.0), Sign::Negative);
        assert_eq!(Sign::from_coef(0.0), Sign::Positive);
        assert_eq!(Sign::Negative.char(), '-');
    }

    #[test]
    fn test_format_coefficient() {
        assert_eq!(format_coefficient(2.5, 1, 2), Some("2.50".to_string()));
        assert_eq!(format_coefficient(1e-20, 1, 2), None);
        assert_eq!(format_coefficient(-1.0, 2, 2), Some(String::new()));
        assert_eq!(format_coefficient(1.0, 0, 2), Some("1.00".to_string()));
        assert_eq!(format_coefficient(1e-5, 2, 2), Some("1.00e-5".to_string()));
    }

    #[test]
    fn test_format_variable() {
        assert_eq!(format_variable("t", 3), "t³");
        assert_eq!(format_variable("x", -2), "x⁻²");
    }

    #[test]
    fn test_chunk_equations() {
        assert_eq!(render(&[2.0, -3.0, 0.0, 4.0]), "y(x) = 4.00x³ - 3.00x + 2.00");
        assert_eq!(render(&[0.0, 0.0, 0.0]), "y(x) = 0");
        assert_eq!(render(&[]), "y(x) = 0");
        assert_eq!(render(&[-1.0, 2.0]), "y(x) = 2.00x - 1.00");
        assert_eq!(render(&[0.0, -1.0]), "y(x) = -x");
        assert_eq!(render(&[0.0, 0.0, 5.0]), "y(x) = 5.00x²");
    }
}

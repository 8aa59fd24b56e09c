//! Test helpers for signals, chunk fits and interpolation error.
//!
//! # Features
//!
//! ## General Purpose Macros
//!
//! ### [`crate::function!`]
//!
//! DSL for generating monomial polynomials. Great for generating synthetic signals!
//! ```rust
//! chunkfit::function!(const f(x) = 5 x^4 - 4 x^3 + 2.5);
//! let data = f.solve((0..=100).map(f64::from));
//! ```
//!
//! ## Closeness assertions
//!
//! ### [`crate::assert_close`]
//! Asserts that two floating-point values are approximately equal.
//! - Uses the machine epsilon for the floating-point type as the tolerance, or `tol = <expr>` if given.
//! - `assert_eq!` equivalent for floats.
//!
//! ### [`crate::assert_all_close`]
//! Element-wise [`crate::assert_close`] over two sequences of the same length.
//!
//! ### [`crate::assert_y`]
//! Asserts that a fit or polynomial produces an expected 'y' value at a given 'x' input.
//!
//! ## Fit quality assertions
//!
//! ### [`crate::assert_r_squared`]
//! Asserts that the fit's r² value relative to the source data is above a certain threshold.
//! See [`crate::CurveFit::r_squared`] for more details.
//!
//! ### [`crate::assert_percentage_error`]
//! Asserts that an interpolated [`crate::SignalProcessor`] reproduces the original signal
//! within a given percentage error.
//! See [`crate::SignalProcessor::percentage_error`] for more details.


/// Macro to generate a monomial polynomial function.
///
/// This is good for using as a data source for testing
/// - Terms can be listed in any order
/// - Same-power terms are summed
/// - Missing terms are 0
///
/// The only major limitation is that it needs a space between the coefficient and the variable:
/// - `20.0 x^3` is valid, but `20.0x^3` is not.
///
/// Syntax:
/// ```text
/// function!(
///     [const | static]?
///     [<name>(<x>) = ]?
///     [ [+]? <coef> [ x [ ^ <deg> ]? ]? ]+
/// )
/// ```
///
/// # Example
/// ```
/// # use chunkfit::function;
/// function!(test(x) = 20.0 x^3 + 3.0 x^2 - 2.0 x + 4.0);
/// function!(const test2(x) = 20.0 x^3 + 3.0 x^2 - 2.0 x + 4.0);
/// let test3 = function!(20.0 x^3 + 3.0 x^2 - 2.0);
///
/// // Sample it at 10 Hz
/// let magnitude: Vec<f64> = (0..50).map(|i| test.y(i as f64 / 10.0)).collect();
/// ```
#[macro_export]
macro_rules! function {
    ($( $(+)? $c0:literal $(x $( ^ $d0:literal )?)? )+) => { {
        const LEN: usize = {
            let mut degree = 0; $(
                let d2 = 1 $(+ 1 $(* $d0 as usize)?)?;
                if d2 > degree { degree = d2; }
            )+
            degree
        };

        const COEFS: [f64; LEN] = {
            let mut coefs = [0.0; LEN];
            // coef alone is degree 0, 1 if just x, or the power if specified
            $( coefs[ 0 $(+ 1 $(* $d0 as usize)?)? ] += $c0 as f64; )+
            coefs
        };

        $crate::MonomialPolynomial::borrowed(&COEFS)
    }};

    ($name:ident (x) = $($rest:tt)+ ) => {
        let $name: $crate::MonomialPolynomial = $crate::function!($($rest)+);
    };

    (const $name:ident (x) = $($rest:tt)+ ) => {
        const $name: $crate::MonomialPolynomial<'static> = $crate::function!($($rest)+);
    };

    (static $name:ident (x) = $($rest:tt)+ ) => {
        static $name: $crate::MonomialPolynomial<'static> = $crate::function!($($rest)+);
    };
}

/// Builds a [`crate::Signal`] by sampling a function at a fixed rate.
///
/// Intended for tests and benchmarks; panics if `fsample` is not a valid sample rate.
///
/// # Example
/// ```
/// # use chunkfit::{function, sampled_signal};
/// function!(line(x) = 2.0 x^1);
/// let signal = sampled_signal!(line, samples = 10, fsample = 1.0);
/// assert_eq!(signal.magnitude()[3], 6.0);
/// ```
#[macro_export]
macro_rules! sampled_signal {
    ($function:expr, samples = $n:expr, fsample = $fs:expr) => {{
        let function = &$function;
        let fsample: f64 = $fs;
        let magnitude: Vec<f64> = (0..$n)
            .map(|i| function.y(i as f64 / fsample))
            .collect();
        $crate::Signal::new(magnitude, fsample).expect("sampled_signal! needs a valid sample rate")
    }};
}

#[cfg(test)]
mod tests {
    use crate::{assert_close, value::CoordExt};

    #[test]
    fn test_function_macro() {
        function!(test(x) = 20.0 x^3 + 3.0 x^2 - 2.0 x + 4.0);
        assert_eq!(test.coefficients(), &[4.0, -2.0, 3.0, 20.0]);
        assert_close!(test.y(1.0), 25.0);

        let points = test.solve([0.0, 1.0, 2.0]);
        assert_eq!(points.x(), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_sampled_signal_macro() {
        function!(line(x) = 1.0 + 0.5 x^1);
        let signal = sampled_signal!(line, samples = 4, fsample = 2.0);
        assert_eq!(signal.len(), 4);
        assert_eq!(signal.time(), &[0.0, 0.5, 1.0, 1.5]);
        assert_eq!(signal.magnitude(), &[1.0, 1.25, 1.5, 1.75]);
    }
}

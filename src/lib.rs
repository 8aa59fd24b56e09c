//! # Chunkfit
//! ## Piecewise curve fitting for sampled signals
//!
//! Long recordings are rarely described well by one polynomial. This crate splits a signal
//! into overlapping chunks, fits each chunk by least squares, and stitches the fitted chunks
//! back together, averaging the samples where neighbours overlap. A global smoothing spline
//! is available as an alternative model.
//!
//! I provide a set of tools designed to help you:
//! - Clip the end off a signal, fit the rest, and extrapolate over what was clipped
//! - Measure how far a fit strays from the recorded signal
//! - Sweep two fit settings at once to see which combination works best
//! - Write easy to understand tests for all of the above
//!
//! The simplest use-case is to fit a signal and look at the equation of each chunk:
//! ```rust
//! # use chunkfit::{InterpolationConfig, InterpolationKind, Signal, SignalProcessor};
//! chunkfit::function!(f(x) = 2 x^2 + 3 x - 5);
//! let magnitude = (0..100).map(|i| f.y(f64::from(i) / 10.0)).collect();
//! let signal = Signal::new(magnitude, 10.0).unwrap();
//!
//! let mut processor = SignalProcessor::new(signal);
//! processor.set_clipping(20.0).unwrap();
//! processor
//!     .init_interpolation(
//!         InterpolationConfig::new(InterpolationKind::Polynomial, 2)
//!             .with_chunks(4)
//!             .with_overlap(10.0),
//!     )
//!     .unwrap();
//!
//! println!("{}", processor.chunk_equation(0).unwrap());
//! chunkfit::assert_percentage_error!(processor, 1e-6);
//! ```
//!
//! # Core Concepts
//! - A [`Signal`] is a sequence of magnitudes sampled at a fixed rate, with its time axis.
//!     - Fitted signals also carry the coefficients of the polynomial that produced them.
//! - A [`ChunkedSignal`] is a signal split into windows of equal length.
//!     - Consecutive windows share [`ChunkedSignal::overlap_length`] samples.
//!     - The last window is zero-padded to full length.
//!     - [`merge_chunks`] rebuilds one signal from the windows, averaging every overlap.
//! - A [`SignalProcessor`] is a fitting session over one signal:
//!     - [`SignalProcessor::set_clipping`] keeps only the head of the signal for fitting.
//!     - [`SignalProcessor::init_interpolation`] fits that head as an [`InterpolationConfig`] describes.
//!     - [`SignalProcessor::extrapolate`] continues the fit over the clipped tail.
//! - An [`error_map::ErrorMap`] repeats the fit over a 9×9 grid of two settings.
//!
//! # Implementation Details
//!
//! Chunk fits are solved with the `nalgebra` SVD on a column-scaled design matrix, so chunks
//! far from `t = 0` stay well conditioned. The spline is a least-squares B-spline whose knots
//! are added until the residual falls under the smoothing bound.
//!
//! The library logs through `tracing` and never installs a subscriber itself.
//!
//! # Testing utilities
//!
//! This crate includes a set of testing utilities to check fits and interpolations. See [`test`].
//!
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::needless_range_loop)] // The worst clippy lint
#![allow(clippy::cast_precision_loss)] // I don't care about this one
#![allow(clippy::similar_names)] //       Clippy does not get to decide what names are similar
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod test;

pub mod basis;
pub mod chunk;
pub mod display;
pub mod error;
pub mod error_map;
pub mod processor;
pub mod signal;
pub mod spline;
pub mod statistics;
pub mod value;

mod fit;
mod polynomial;

pub use basis::monomial::MonomialPolynomial;
pub use chunk::{merge_chunks, ChunkLayout, ChunkedSignal};
pub use fit::*;
pub use polynomial::Polynomial;
pub use processor::{
    fit, Interpolation, InterpolationConfig, InterpolationKind, Model, SignalProcessor,
};
pub use signal::{Direction, Signal};
pub use spline::SmoothingSpline;

pub use nalgebra;

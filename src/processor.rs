//! Clipping, fitting and extrapolating signals
//!
//! An [`InterpolationConfig`] is a plain record describing one fit. [`fit`] applies it to a
//! signal and returns an [`Interpolation`], leaving the signal untouched:
//! - [`InterpolationKind::Polynomial`] splits the signal into chunks, fits each chunk by least
//!   squares, and merges the fitted chunks back into one signal.
//! - [`InterpolationKind::Spline`] fits one smoothing spline through the whole signal.
//!
//! [`SignalProcessor`] holds the session around it: the original signal, the clipped part
//! that gets fitted, and the latest interpolation and extrapolation.
//!
//! # Example
//! ```
//! # use chunkfit::{InterpolationConfig, InterpolationKind, Signal, SignalProcessor};
//! let magnitude = (0..20).map(|i| 3.0 * f64::from(i) + 1.0).collect();
//! let mut processor = SignalProcessor::new(Signal::new(magnitude, 1.0).unwrap());
//!
//! processor.set_clipping(25.0).unwrap();
//! processor
//!     .init_interpolation(InterpolationConfig::new(InterpolationKind::Polynomial, 1).with_chunks(3))
//!     .unwrap();
//!
//! let tail = processor.extrapolate().unwrap();
//! assert_eq!(tail.len(), 5);
//! assert!((tail.magnitude()[4] - 58.0).abs() < 1e-6);
//! ```
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    basis::monomial::MonomialPolynomial,
    chunk::ChunkedSignal,
    error::{Error, Result},
    fit::MonomialFit,
    signal::{Direction, Signal},
    spline::{SmoothingSpline, MAX_ORDER},
    statistics,
    value::Value,
};

/// The model used to interpolate a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationKind {
    /// Chunked least-squares polynomials
    Polynomial,

    /// One global smoothing spline
    Spline,
}

impl FromStr for InterpolationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "polynomial" => Ok(Self::Polynomial),
            "spline" => Ok(Self::Spline),
            _ => Err(Error::UnsupportedInterpolation(s.to_string())),
        }
    }
}

impl fmt::Display for InterpolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Polynomial => write!(f, "polynomial"),
            Self::Spline => write!(f, "spline"),
        }
    }
}

fn default_chunks() -> usize {
    1
}

/// Parameters of one interpolation.
///
/// Which fields matter depends on [`InterpolationConfig::kind`]:
/// - Polynomial: `order`, `max_chunks`, `overlap_percent`
/// - Spline: `order`, `smoothing_factor`
///
/// # Example
/// ```
/// # use chunkfit::{InterpolationConfig, InterpolationKind};
/// let config: InterpolationConfig = serde_json::from_str(r#"{"kind": "spline", "order": 3}"#).unwrap();
/// assert_eq!(config.kind, InterpolationKind::Spline);
/// assert_eq!(config.max_chunks, 1);
/// assert_eq!(config.spline_smoothing(), 10.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpolationConfig {
    /// Model to fit
    pub kind: InterpolationKind,

    /// Polynomial degree, or spline order
    pub order: usize,

    /// Number of chunks the signal is split into
    #[serde(default = "default_chunks")]
    pub max_chunks: usize,

    /// Share of each chunk, in percent, that overlaps its neighbours
    #[serde(default)]
    pub overlap_percent: f64,

    /// Smoothing dial in `[0, 100]`. Higher values follow the data more closely.
    #[serde(default)]
    pub smoothing_factor: f64,
}

impl InterpolationConfig {
    /// A configuration with one chunk, no overlap and the smoothing dial at 0.
    #[must_use]
    pub fn new(kind: InterpolationKind, order: usize) -> Self {
        Self {
            kind,
            order,
            max_chunks: default_chunks(),
            overlap_percent: 0.0,
            smoothing_factor: 0.0,
        }
    }

    /// Builds a validated configuration from user input.
    ///
    /// # Errors
    /// - [`Error::MissingInterpolationType`] if `kind` is `None`.
    /// - [`Error::UnsupportedInterpolation`] if `kind` names no known model.
    /// - Any error of [`InterpolationConfig::validate`].
    pub fn parse(
        kind: Option<&str>,
        order: usize,
        max_chunks: usize,
        overlap_percent: f64,
        smoothing_factor: f64,
    ) -> Result<Self> {
        let kind: InterpolationKind = kind.ok_or(Error::MissingInterpolationType)?.parse()?;
        let config = Self::new(kind, order)
            .with_chunks(max_chunks)
            .with_overlap(overlap_percent)
            .with_smoothing(smoothing_factor);
        config.validate()?;
        Ok(config)
    }

    /// Sets the number of chunks.
    #[must_use]
    pub fn with_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    /// Sets the overlap percentage.
    #[must_use]
    pub fn with_overlap(mut self, overlap_percent: f64) -> Self {
        self.overlap_percent = overlap_percent;
        self
    }

    /// Sets the smoothing dial.
    #[must_use]
    pub fn with_smoothing(mut self, smoothing_factor: f64) -> Self {
        self.smoothing_factor = smoothing_factor;
        self
    }

    /// Residual bound handed to the spline fit: `10 - smoothing_factor / 10`.
    #[must_use]
    pub fn spline_smoothing(&self) -> f64 {
        10.0 - self.smoothing_factor / 10.0
    }

    /// Checks the parameters that matter for [`InterpolationConfig::kind`].
    ///
    /// Chunk layout against a concrete signal is only checked when fitting.
    ///
    /// # Errors
    /// - [`Error::InvalidOrder`] if the order is 0, or above [`MAX_ORDER`] for splines.
    /// - [`Error::InvalidChunkCount`] / [`Error::InvalidOverlap`] for polynomial chunking.
    /// - [`Error::InvalidSmoothing`] if the smoothing dial is outside `[0, 100]`.
    pub fn validate(&self) -> Result<()> {
        if self.order == 0 {
            return Err(Error::InvalidOrder(self.order));
        }

        match self.kind {
            InterpolationKind::Polynomial => {
                if self.max_chunks == 0 {
                    return Err(Error::InvalidChunkCount);
                }
                if !(0.0..100.0).contains(&self.overlap_percent) {
                    return Err(Error::InvalidOverlap(self.overlap_percent));
                }
            }
            InterpolationKind::Spline => {
                if self.order > MAX_ORDER {
                    return Err(Error::InvalidOrder(self.order));
                }
                if !(0.0..=100.0).contains(&self.smoothing_factor) {
                    return Err(Error::InvalidSmoothing(self.smoothing_factor));
                }
            }
        }

        Ok(())
    }
}

/// The fitted model behind an [`Interpolation`].
#[derive(Debug, Clone, PartialEq)]
pub enum Model<T: Value = f64> {
    /// Fitted chunks, each carrying its polynomial coefficients
    Chunked(ChunkedSignal<T>),

    /// A smoothing spline over the whole signal
    Spline(SmoothingSpline<T>),
}

/// Result of [`fit`]: the fitted signal and the model that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpolation<T: Value = f64> {
    signal: Signal<T>,
    model: Model<T>,
    config: InterpolationConfig,
}

impl<T: Value> Interpolation<T> {
    /// The fitted signal, sample for sample aligned with the input.
    #[must_use]
    pub fn signal(&self) -> &Signal<T> {
        &self.signal
    }

    /// Consumes the interpolation, returning the fitted signal.
    #[must_use]
    pub fn into_signal(self) -> Signal<T> {
        self.signal
    }

    /// The fitted model.
    #[must_use]
    pub fn model(&self) -> &Model<T> {
        &self.model
    }

    /// The configuration this interpolation was fitted with.
    #[must_use]
    pub fn config(&self) -> &InterpolationConfig {
        &self.config
    }

    /// Evaluates the model at arbitrary times.
    ///
    /// Chunked fits use the polynomial of the last chunk; splines use their boundary
    /// pieces past the fitted range.
    #[must_use]
    pub fn extrapolate(&self, times: &[T]) -> Vec<T> {
        match &self.model {
            Model::Chunked(chunked) => {
                let coefficients = chunked
                    .chunks()
                    .last()
                    .map(Signal::coefficients)
                    .unwrap_or_default();
                let polynomial = MonomialPolynomial::from_descending(coefficients);
                times.iter().map(|&t| polynomial.y(t)).collect()
            }
            Model::Spline(spline) => spline.solve(times.iter().copied()),
        }
    }

    /// Coefficients of chunk `index`, highest power first.
    ///
    /// # Errors
    /// Returns [`Error::ChunkIndex`] if there is no such chunk. Spline fits have no chunks.
    pub fn chunk_coefficients(&self, index: usize) -> Result<&[T]> {
        match &self.model {
            Model::Chunked(chunked) => chunked.coefficients(index),
            Model::Spline(_) => Err(Error::ChunkIndex { index, chunks: 0 }),
        }
    }

    /// Equation of chunk `index`, such as `y(x) = 2.00x + 1.00`.
    ///
    /// # Errors
    /// Returns [`Error::ChunkIndex`] if there is no such chunk.
    pub fn chunk_equation(&self, index: usize) -> Result<String> {
        let coefficients = self.chunk_coefficients(index)?;
        Ok(MonomialPolynomial::from_descending(coefficients).equation())
    }
}

/// Fits `signal` as described by `config`.
///
/// # Errors
/// - Any error of [`InterpolationConfig::validate`].
/// - Chunking errors, such as [`Error::TooManyChunks`], for polynomial fits.
/// - Spline errors, such as [`Error::DegreeTooHigh`], for spline fits.
/// - [`Error::NoData`] if the signal is empty.
#[tracing::instrument(level = "debug", skip(signal, config), fields(samples = signal.len(), kind = %config.kind))]
pub fn fit<T: Value>(signal: &Signal<T>, config: &InterpolationConfig) -> Result<Interpolation<T>> {
    config.validate()?;

    let (fitted, model) = match config.kind {
        InterpolationKind::Polynomial => fit_chunks(signal, config)?,
        InterpolationKind::Spline => fit_spline(signal, config)?,
    };

    Ok(Interpolation {
        signal: fitted,
        model,
        config: config.clone(),
    })
}

fn fit_chunks<T: Value>(
    signal: &Signal<T>,
    config: &InterpolationConfig,
) -> Result<(Signal<T>, Model<T>)> {
    let mut chunked = ChunkedSignal::new(signal, config.max_chunks, config.overlap_percent)?;

    let layout = *chunked.layout();
    let fitted = chunked
        .chunks()
        .iter()
        .enumerate()
        .map(|(index, chunk)| fit_chunk(chunk, layout.valid_len(index), config.order))
        .collect::<Result<Vec<_>>>()?;
    chunked.replace_chunks(fitted)?;

    tracing::debug!(
        chunks = layout.count(),
        chunk_length = layout.chunk_length(),
        order = config.order,
        "fitted polynomial chunks"
    );

    Ok((chunked.merged().clone(), Model::Chunked(chunked)))
}

// Padding samples past `valid` are evaluated but never fitted.
fn fit_chunk<T: Value>(chunk: &Signal<T>, valid: usize, order: usize) -> Result<Signal<T>> {
    let points: Vec<(T, T)> = chunk.points().into_iter().take(valid).collect();
    let degree = order.min(points.len().saturating_sub(1));
    let fit = MonomialFit::new(points, degree)?;

    let magnitude = chunk.time().iter().map(|&t| fit.y(t)).collect();
    let coefficients = fit.as_polynomial().descending_coefficients();
    tracing::trace!(valid, degree, coefficients = ?coefficients, "fitted chunk");

    Signal::from_parts(
        magnitude,
        Some(chunk.fsample()),
        Some(chunk.time().to_vec()),
        coefficients,
    )
}

fn fit_spline<T: Value>(
    signal: &Signal<T>,
    config: &InterpolationConfig,
) -> Result<(Signal<T>, Model<T>)> {
    let smoothing = T::try_cast(config.spline_smoothing())?;
    let spline = SmoothingSpline::fit(signal.time(), signal.magnitude(), config.order, smoothing)?;

    let magnitude = spline.solve(signal.time().iter().copied());
    let fitted = Signal::from_parts(
        magnitude,
        Some(signal.fsample()),
        Some(signal.time().to_vec()),
        Vec::new(),
    )?;

    tracing::debug!(
        order = config.order,
        knots = spline.knots().len(),
        residual = ?spline.residual(),
        "fitted smoothing spline"
    );
    Ok((fitted, Model::Spline(spline)))
}

/// A fitting session over one original signal.
///
/// The processor fits the clipped head of the original, and can extrapolate the fit over
/// the clipped-off tail to compare against what was really recorded.
///
/// Reconfiguration is atomic: when [`SignalProcessor::set_clipping`] or
/// [`SignalProcessor::init_interpolation`] fails, the previous clipping, configuration and
/// interpolation all remain in place.
///
/// # Example
/// ```
/// # use chunkfit::{InterpolationConfig, InterpolationKind, Signal, SignalProcessor};
/// let signal = Signal::new(vec![1.0, 3.0, 5.0, 7.0], 1.0).unwrap();
/// let mut processor = SignalProcessor::new(signal);
/// processor.init_interpolation(InterpolationConfig::new(InterpolationKind::Polynomial, 1)).unwrap();
///
/// assert_eq!(processor.chunk_equation(0).unwrap(), "y(x) = 2.00x + 1.00");
/// assert!(processor.percentage_error().unwrap() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SignalProcessor<T: Value = f64> {
    original: Signal<T>,
    clipped: Signal<T>,
    clip_percentage: f64,
    config: Option<InterpolationConfig>,
    interpolation: Option<Interpolation<T>>,
    extrapolated: Option<Signal<T>>,
}

impl<T: Value> SignalProcessor<T> {
    /// Starts a session with no clipping and no interpolation.
    #[must_use]
    pub fn new(original: Signal<T>) -> Self {
        Self {
            clipped: original.clone(),
            original,
            clip_percentage: 0.0,
            config: None,
            interpolation: None,
            extrapolated: None,
        }
    }

    /// The signal as given.
    #[must_use]
    pub fn original(&self) -> &Signal<T> {
        &self.original
    }

    /// The part of the original that gets fitted.
    #[must_use]
    pub fn clipped(&self) -> &Signal<T> {
        &self.clipped
    }

    /// Percentage of the original clipped off its end.
    #[must_use]
    pub fn clip_percentage(&self) -> f64 {
        self.clip_percentage
    }

    /// The active configuration, if any.
    #[must_use]
    pub fn config(&self) -> Option<&InterpolationConfig> {
        self.config.as_ref()
    }

    /// The latest interpolation, if any.
    #[must_use]
    pub fn interpolation(&self) -> Option<&Interpolation<T>> {
        self.interpolation.as_ref()
    }

    /// The latest interpolated signal, if any.
    #[must_use]
    pub fn interpolated(&self) -> Option<&Signal<T>> {
        self.interpolation.as_ref().map(Interpolation::signal)
    }

    /// The latest extrapolated signal, if any.
    #[must_use]
    pub fn extrapolated(&self) -> Option<&Signal<T>> {
        self.extrapolated.as_ref()
    }

    /// Whether an interpolation is available.
    #[must_use]
    pub fn is_interpolated(&self) -> bool {
        self.interpolation.is_some()
    }

    /// Whether an extrapolation is available.
    #[must_use]
    pub fn is_extrapolated(&self) -> bool {
        self.extrapolated.is_some()
    }

    /// Clips `percentage`% of samples off the end of the original.
    ///
    /// Clipping always starts again from the original. A configured interpolation is
    /// re-fitted to the new clipped signal, and any extrapolation is discarded.
    ///
    /// # Errors
    /// - [`Error::InvalidClipPercentage`] if `percentage` is outside of `[0, 100)`.
    /// - Any fitting error of the re-fit.
    pub fn set_clipping(&mut self, percentage: f64) -> Result<()> {
        let mut clipped = self.original.clone();
        clipped.clip(Direction::Right, percentage)?;

        let interpolation = match &self.config {
            Some(config) => Some(fit(&clipped, config)?),
            None => None,
        };

        self.clipped = clipped;
        self.clip_percentage = percentage;
        self.interpolation = interpolation;
        self.extrapolated = None;
        Ok(())
    }

    /// Replaces the configuration and interpolates with it.
    ///
    /// # Errors
    /// Returns any error of [`fit`].
    pub fn init_interpolation(&mut self, config: InterpolationConfig) -> Result<()> {
        let interpolation = fit(&self.clipped, &config)?;

        self.config = Some(config);
        self.interpolation = Some(interpolation);
        self.extrapolated = None;
        Ok(())
    }

    /// Returns the interpolated signal, fitting it first if needed.
    ///
    /// # Errors
    /// - [`Error::NotConfigured`] if no configuration was set.
    /// - Any error of [`fit`].
    pub fn interpolate(&mut self) -> Result<&Signal<T>> {
        if self.interpolation.is_none() {
            let config = self.config.as_ref().ok_or(Error::NotConfigured)?;
            self.interpolation = Some(fit(&self.clipped, config)?);
        }
        self.interpolated().ok_or(Error::NotInterpolated)
    }

    /// Extends the fit over the clipped-off tail of the original.
    ///
    /// The result covers exactly the samples removed by clipping, at their original times.
    ///
    /// # Errors
    /// Returns [`Error::NotInterpolated`] if there is no interpolation yet.
    pub fn extrapolate(&mut self) -> Result<&Signal<T>> {
        let interpolation = self.interpolation.as_ref().ok_or(Error::NotInterpolated)?;

        let tail = self
            .original
            .slice(self.clipped.len()..self.original.len())?;
        let magnitude = interpolation.extrapolate(tail.time());
        let coefficients = match interpolation.model() {
            Model::Chunked(chunked) => chunked
                .chunks()
                .last()
                .map(|chunk| chunk.coefficients().to_vec())
                .unwrap_or_default(),
            Model::Spline(_) => Vec::new(),
        };

        let extrapolated = Signal::from_parts(
            magnitude,
            Some(self.original.fsample()),
            Some(tail.time().to_vec()),
            coefficients,
        )?;
        tracing::debug!(samples = extrapolated.len(), "extrapolated clipped tail");

        Ok(&*self.extrapolated.insert(extrapolated))
    }

    /// Percentage error of the interpolation against the original.
    ///
    /// See [`statistics::percentage_error`]; only the interpolated prefix is compared.
    /// Residuals of opposite sign cancel, so a low value does not by itself mean a close fit.
    ///
    /// # Errors
    /// - [`Error::NotInterpolated`] if there is no interpolation yet.
    /// - [`Error::ZeroMean`] if the original has a zero mean over that prefix.
    pub fn percentage_error(&self) -> Result<T> {
        let interpolated = self.interpolated().ok_or(Error::NotInterpolated)?;
        statistics::percentage_error(self.original.magnitude(), interpolated.magnitude())
    }

    /// Coefficients of chunk `index` of the latest interpolation, highest power first.
    ///
    /// # Errors
    /// - [`Error::NotInterpolated`] if there is no interpolation yet.
    /// - [`Error::ChunkIndex`] if there is no such chunk.
    pub fn chunk_coefficients(&self, index: usize) -> Result<&[T]> {
        self.interpolation
            .as_ref()
            .ok_or(Error::NotInterpolated)?
            .chunk_coefficients(index)
    }

    /// Equation of chunk `index` of the latest interpolation.
    ///
    /// # Errors
    /// - [`Error::NotInterpolated`] if there is no interpolation yet.
    /// - [`Error::ChunkIndex`] if there is no such chunk.
    pub fn chunk_equation(&self, index: usize) -> Result<String> {
        self.interpolation
            .as_ref()
            .ok_or(Error::NotInterpolated)?
            .chunk_equation(index)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};
    use rand_distr::{Distribution, Normal};

    use super::*;
    use crate::{assert_all_close, assert_close, assert_percentage_error, function};

    fn line(n: usize) -> Signal {
        Signal::new((0..n).map(|i| 2.0 * i as f64).collect(), 1.0).unwrap()
    }

    fn polynomial(order: usize) -> InterpolationConfig {
        InterpolationConfig::new(InterpolationKind::Polynomial, order)
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("Spline".parse(), Ok(InterpolationKind::Spline));
        assert_eq!(" polynomial ".parse(), Ok(InterpolationKind::Polynomial));
        assert_eq!(
            "cubic".parse::<InterpolationKind>(),
            Err(Error::UnsupportedInterpolation("cubic".to_string()))
        );
        assert_eq!(InterpolationKind::Spline.to_string(), "spline");
    }

    #[test]
    fn test_config_parse() {
        assert_eq!(
            InterpolationConfig::parse(None, 1, 1, 0.0, 0.0),
            Err(Error::MissingInterpolationType)
        );
        assert_eq!(
            InterpolationConfig::parse(Some("linear"), 1, 1, 0.0, 0.0),
            Err(Error::UnsupportedInterpolation("linear".to_string()))
        );

        let config = InterpolationConfig::parse(Some("polynomial"), 3, 4, 20.0, 0.0).unwrap();
        assert_eq!(config.max_chunks, 4);
        assert_eq!(config.overlap_percent, 20.0);
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(polynomial(0).validate(), Err(Error::InvalidOrder(0)));
        assert_eq!(
            polynomial(2).with_chunks(0).validate(),
            Err(Error::InvalidChunkCount)
        );
        assert_eq!(
            polynomial(2).with_overlap(100.0).validate(),
            Err(Error::InvalidOverlap(100.0))
        );

        let spline = InterpolationConfig::new(InterpolationKind::Spline, 3);
        assert_eq!(spline.clone().validate(), Ok(()));
        assert_eq!(
            spline.clone().with_smoothing(150.0).validate(),
            Err(Error::InvalidSmoothing(150.0))
        );
        assert_eq!(
            InterpolationConfig::new(InterpolationKind::Spline, 6).validate(),
            Err(Error::InvalidOrder(6))
        );

        // Only meaningful for splines
        assert_eq!(polynomial(2).with_smoothing(150.0).validate(), Ok(()));
        assert_eq!(spline.with_smoothing(50.0).spline_smoothing(), 5.0);
    }

    #[test]
    fn test_linear_fit() {
        let mut processor = SignalProcessor::new(line(4));
        processor.init_interpolation(polynomial(1)).unwrap();

        assert!(processor.is_interpolated());
        assert_all_close!(processor.chunk_coefficients(0).unwrap(), [2.0, 0.0], tol = 1e-9);
        assert_all_close!(
            processor.interpolated().unwrap().magnitude(),
            [0.0, 2.0, 4.0, 6.0],
            tol = 1e-9
        );
        assert_close!(processor.percentage_error().unwrap(), 0.0, tol = 1e-9);
        assert_percentage_error!(processor, 1e-9);
    }

    #[test]
    fn test_chunked_quadratic() {
        function!(quadratic(x) = 4.0 - 1.5 x^1 + 0.25 x^2);
        let magnitude = (0..40).map(|i| quadratic.y(f64::from(i) / 10.0)).collect();
        let signal = Signal::new(magnitude, 10.0).unwrap();

        let config = polynomial(2).with_chunks(4).with_overlap(20.0);
        let interpolation = fit(&signal, &config).unwrap();

        assert_eq!(interpolation.signal().len(), 40);
        assert_all_close!(
            interpolation.signal().magnitude(),
            signal.magnitude(),
            tol = 1e-8
        );

        // 5 windows of 10 with a stride of 8, each a piece of the same quadratic
        for index in 0..5 {
            assert_all_close!(
                interpolation.chunk_coefficients(index).unwrap(),
                [0.25, -1.5, 4.0],
                tol = 1e-6,
                "chunk {index}"
            );
        }
        assert_eq!(
            interpolation.chunk_coefficients(5),
            Err(Error::ChunkIndex {
                index: 5,
                chunks: 5
            })
        );
    }

    #[test]
    fn test_degree_capped_by_short_chunk() {
        // Chunks of 3 over 10 samples: the fourth window holds a single real sample
        let interpolation = fit(&line(10), &polynomial(2).with_chunks(3)).unwrap();
        assert_eq!(interpolation.chunk_coefficients(3).unwrap().len(), 1);
        assert_eq!(interpolation.signal().len(), 10);
    }

    #[test]
    fn test_clipping() {
        let mut processor = SignalProcessor::new(line(10));
        processor.set_clipping(50.0).unwrap();
        assert_eq!(processor.clipped().len(), 5);
        assert_eq!(processor.original().len(), 10);

        assert_eq!(
            processor.set_clipping(100.0),
            Err(Error::InvalidClipPercentage(100.0))
        );
        assert_eq!(processor.clipped().len(), 5);
        assert_eq!(processor.clip_percentage(), 50.0);

        // Clipping restarts from the original
        processor.set_clipping(20.0).unwrap();
        assert_eq!(processor.clipped().len(), 8);
    }

    #[test]
    fn test_clipping_refits() {
        let mut processor = SignalProcessor::new(line(20));
        processor.init_interpolation(polynomial(1)).unwrap();
        processor.extrapolate().unwrap();

        processor.set_clipping(50.0).unwrap();
        assert_eq!(processor.interpolated().unwrap().len(), 10);
        assert!(!processor.is_extrapolated());
    }

    #[test]
    fn test_extrapolation() {
        let mut processor = SignalProcessor::new(line(20));
        processor.set_clipping(25.0).unwrap();
        assert_eq!(processor.extrapolate(), Err(Error::NotInterpolated));

        processor
            .init_interpolation(polynomial(1).with_chunks(3))
            .unwrap();
        let tail = processor.extrapolate().unwrap().clone();

        assert_eq!(
            tail.len(),
            processor.original().len() - processor.clipped().len()
        );
        assert_eq!(tail.time(), &processor.original().time()[15..]);
        assert_all_close!(tail.magnitude(), processor.original().magnitude()[15..], tol = 1e-8);
        assert_all_close!(tail.coefficients(), [2.0, 0.0], tol = 1e-8);
        assert!(processor.is_extrapolated());
    }

    #[test]
    fn test_extrapolation_without_clipping_is_empty() {
        let mut processor = SignalProcessor::new(line(8));
        processor.init_interpolation(polynomial(1)).unwrap();
        assert!(processor.extrapolate().unwrap().is_empty());
    }

    #[test]
    fn test_spline() {
        let mut rng = StdRng::seed_from_u64(7);
        let noise = Normal::new(0.0, 0.05).unwrap();
        let magnitude: Vec<f64> = (0..60)
            .map(|i| 5.0 + (f64::from(i) / 8.0).sin() + noise.sample(&mut rng))
            .collect();

        let mut processor = SignalProcessor::new(Signal::new(magnitude, 1.0).unwrap());
        processor.set_clipping(10.0).unwrap();
        processor
            .init_interpolation(
                InterpolationConfig::new(InterpolationKind::Spline, 3).with_smoothing(99.0),
            )
            .unwrap();

        assert_eq!(processor.interpolated().unwrap().len(), 54);
        assert_percentage_error!(processor, 1.0);
        assert!(processor.chunk_coefficients(0).is_err());

        let tail = processor.extrapolate().unwrap();
        assert_eq!(tail.len(), 6);
        assert!(tail.magnitude().iter().all(|m| m.is_finite()));
    }

    #[test]
    fn test_unconfigured() {
        let mut processor = SignalProcessor::new(line(4));
        assert_eq!(processor.interpolate(), Err(Error::NotConfigured));
        assert_eq!(processor.percentage_error(), Err(Error::NotInterpolated));
        assert_eq!(processor.chunk_equation(0), Err(Error::NotInterpolated));
    }

    #[test]
    fn test_interpolate_is_idempotent() {
        let mut processor = SignalProcessor::new(line(6));
        processor.init_interpolation(polynomial(1)).unwrap();
        let first = processor.interpolate().unwrap().clone();
        assert_eq!(processor.interpolate().unwrap(), &first);
    }

    #[test]
    fn test_failed_reconfiguration_keeps_state() {
        let mut processor = SignalProcessor::new(line(10));
        processor.init_interpolation(polynomial(1)).unwrap();
        let before = processor.clone();

        assert_eq!(
            processor.init_interpolation(polynomial(1).with_chunks(11)),
            Err(Error::TooManyChunks {
                chunks: 11,
                samples: 10
            })
        );
        assert_eq!(processor, before);

        // A re-fit that fails rolls back the clipping too
        processor
            .init_interpolation(polynomial(1).with_chunks(10))
            .unwrap();
        let before = processor.clone();
        assert!(processor.set_clipping(50.0).is_err());
        assert_eq!(processor, before);
    }
}

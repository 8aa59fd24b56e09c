//! Error types for chunked curve fitting
//!
//! This module defines the failures encountered when building signals, chunking them,
//! fitting them, or sweeping fit parameters, along with a convenient `Result` alias.
//!
//! Every variant is reported synchronously. Operations that fail leave the state they
//! were called on untouched.

/// Errors that can occur while building, chunking, fitting or sweeping signals.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Cannot perform curve fitting because there is no data.
    #[error("No data available for fitting")]
    NoData,

    /// The specified basis cannot have the given number of coefficients.
    #[error("Specified basis cannot have exactly {0} coefficients")]
    InvalidNumberOfParameters(usize),

    /// The requested polynomial degree is too high for the dataset.
    ///
    /// The degree must be less than the number of data points.
    #[error("Polynomial degree `{0}` is too high for the dataset")]
    DegreeTooHigh(usize),

    /// A numeric value could not be cast to the target type. This is usually a custom type much smaller than f64/f32
    #[error("Failed to cast value to target type")]
    CastFailed,

    /// Failed to solve the algebraic system during fitting.
    ///
    /// Contains a static string describing the solver error.
    #[error("Failed to solve: {0}")]
    Algebra(&'static str),

    /// A magnitude and time sequence of different lengths were combined.
    #[error("Magnitude has {magnitude} samples but time has {time}")]
    LengthMismatch {
        /// Number of magnitude samples
        magnitude: usize,
        /// Number of time samples
        time: usize,
    },

    /// A sample rate was missing, zero, negative or not finite.
    #[error("Sample rate must be a positive, finite number")]
    InvalidSampleRate,

    /// Two signals with different sample rates were combined.
    #[error("Signals must share a sample rate ({0} != {1})")]
    SampleRateMismatch(String, String),

    /// Two signals of different lengths were combined sample by sample.
    #[error("Cannot combine signals of {left} and {right} samples")]
    SignalLengthMismatch {
        /// Length of the receiving signal
        left: usize,
        /// Length of the other signal
        right: usize,
    },

    /// A direction other than `left` or `right` was given.
    #[error("Direction must be `left` or `right`, got `{0}`")]
    InvalidDirection(String),

    /// A clip percentage outside of `[0, 100)` was requested.
    #[error("Clip percentage must be in [0, 100), got {0}")]
    InvalidClipPercentage(f64),

    /// A range outside of the signal was requested.
    #[error("Range {start}..{end} is out of bounds for a signal of {len} samples")]
    SliceOutOfRange {
        /// Start of the requested range
        start: usize,
        /// End of the requested range
        end: usize,
        /// Length of the signal
        len: usize,
    },

    /// Zero chunks were requested.
    #[error("Chunk count must be at least 1")]
    InvalidChunkCount,

    /// More chunks were requested than there are samples, which would make every chunk empty.
    #[error("Cannot split {samples} samples into {chunks} chunks")]
    TooManyChunks {
        /// Requested chunk count
        chunks: usize,
        /// Number of samples in the signal
        samples: usize,
    },

    /// An overlap percentage outside of `[0, 100)` was requested.
    #[error("Overlap percentage must be in [0, 100), got {0}")]
    InvalidOverlap(f64),

    /// The overlap is so long that the two overlaps of a chunk would cross.
    #[error("Overlap of {overlap} samples does not fit twice in a chunk of {chunk_length}")]
    OverlapTooLarge {
        /// Overlap length in samples
        overlap: usize,
        /// Chunk length in samples
        chunk_length: usize,
    },

    /// A chunk index past the end of the chunk list.
    #[error("Chunk {index} does not exist, there are {chunks} chunks")]
    ChunkIndex {
        /// Requested index
        index: usize,
        /// Number of chunks
        chunks: usize,
    },

    /// A chunk list does not match the number of windows in its layout.
    #[error("Layout has {expected} chunks, got {actual}")]
    ChunkCount {
        /// Number of windows in the layout
        expected: usize,
        /// Number of chunks given
        actual: usize,
    },

    /// A replacement chunk does not have the chunk length.
    #[error("Chunk must hold exactly {expected} samples, got {actual}")]
    ChunkLength {
        /// Chunk length of the layout
        expected: usize,
        /// Length of the replacement
        actual: usize,
    },

    /// No interpolation kind was given.
    #[error("Interpolation type must be set")]
    MissingInterpolationType,

    /// An interpolation kind other than `polynomial` or `spline` was given.
    #[error("Interpolation type must be `polynomial` or `spline`, got `{0}`")]
    UnsupportedInterpolation(String),

    /// The fit order is not usable for the interpolation kind.
    #[error("Order {0} is not supported for this interpolation")]
    InvalidOrder(usize),

    /// A smoothing factor outside of `[0, 100]` was given.
    #[error("Smoothing factor must be in [0, 100], got {0}")]
    InvalidSmoothing(f64),

    /// Spline sample points must be strictly increasing.
    #[error("Spline x values must be strictly increasing")]
    UnsortedData,

    /// Fitting was requested before any interpolation was configured.
    #[error("No interpolation has been configured")]
    NotConfigured,

    /// Extrapolation was requested before a successful fit.
    #[error("Signal has not been interpolated")]
    NotInterpolated,

    /// The reference signal has a zero mean, so a relative error is undefined.
    #[error("Reference signal has a zero mean")]
    ZeroMean,

    /// An axis name other than chunk count, polynomial order or overlap percentage.
    #[error("Unknown error map axis `{0}`")]
    InvalidAxis(String),

    /// The same parameter was chosen for both error map axes.
    #[error("Error map axes must differ, both are `{0}`")]
    SameAxis(String),
}

/// Result type for chunked curve fitting
pub type Result<T> = std::result::Result<T, Error>;

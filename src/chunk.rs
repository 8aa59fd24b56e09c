//! Overlapping segmentation and overlap-averaged reconstruction
//!
//! A signal of `N` samples is cut into windows of `chunk_length = N / max_chunks` samples.
//! Consecutive windows share `overlap_length` samples, so the stride between window starts
//! is `chunk_length - overlap_length`. If the windows do not reach the end of the signal, one
//! more window is added and zero-padded on the right.
//!
//! [`merge_chunks`] reverses the split. Every chunk contributes its left overlap (averaged with
//! the right overlap of the chunk before it) and its core; the last chunk also contributes its
//! right overlap. The result is cut back to `N` samples.
//!
//! ```text
//! chunk 0: [ L0 | core 0 | R0 ]
//! chunk 1:            [ L1 | core 1 | R1 ]
//! merged:  [ L0 | core 0 | (R0+L1)/2 | core 1 | R1 ]
//! ```
use crate::{
    error::{Error, Result},
    signal::{Direction, Signal},
    value::Value,
};

/// Window geometry for splitting a signal into overlapping chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLayout {
    samples: usize,
    chunk_length: usize,
    overlap_length: usize,
    count: usize,
}

impl ChunkLayout {
    /// Computes the layout for `samples` samples split into at most `max_chunks` chunks.
    ///
    /// # Errors
    /// - [`Error::InvalidChunkCount`] if `max_chunks` is zero.
    /// - [`Error::TooManyChunks`] if `max_chunks > samples`, leaving no sample per chunk.
    /// - [`Error::InvalidOverlap`] unless `0 <= overlap_percent < 100`.
    /// - [`Error::OverlapTooLarge`] if the two overlaps of a chunk would cross.
    ///
    /// The overlap length is `overlap_percent` of the chunk length rounded up, and the
    /// crossing check applies to that rounded length. On short chunks an overlap well under
    /// 50% can therefore fail: a 3-sample chunk at 34% rounds to 2 overlap samples.
    ///
    /// # Example
    /// ```
    /// # use chunkfit::ChunkLayout;
    /// let layout = ChunkLayout::new(20, 4, 20.0).unwrap();
    /// assert_eq!(layout.chunk_length(), 5);
    /// assert_eq!(layout.overlap_length(), 1);
    /// assert_eq!(layout.count(), 5); // the 5th window is padded
    /// ```
    pub fn new(samples: usize, max_chunks: usize, overlap_percent: f64) -> Result<Self> {
        if max_chunks == 0 {
            return Err(Error::InvalidChunkCount);
        }

        let chunk_length = samples / max_chunks;
        if chunk_length == 0 {
            return Err(Error::TooManyChunks {
                chunks: max_chunks,
                samples,
            });
        }

        if !(0.0..100.0).contains(&overlap_percent) {
            return Err(Error::InvalidOverlap(overlap_percent));
        }

        let overlap = (chunk_length as f64 * overlap_percent / 100.0).ceil();
        let overlap_length = num_traits::cast::<f64, usize>(overlap).unwrap_or(chunk_length);
        if 2 * overlap_length > chunk_length {
            return Err(Error::OverlapTooLarge {
                overlap: overlap_length,
                chunk_length,
            });
        }

        let stride = chunk_length - overlap_length;
        let full = (samples - chunk_length) / stride + 1;
        let covered = (full - 1) * stride + chunk_length;
        let count = if covered < samples { full + 1 } else { full };

        Ok(Self {
            samples,
            chunk_length,
            overlap_length,
            count,
        })
    }

    /// Number of samples in the signal being split.
    #[must_use]
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Number of samples in every chunk, padding included.
    #[must_use]
    pub fn chunk_length(&self) -> usize {
        self.chunk_length
    }

    /// Number of samples shared by consecutive chunks.
    #[must_use]
    pub fn overlap_length(&self) -> usize {
        self.overlap_length
    }

    /// Number of chunks.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Distance between the starts of consecutive chunks.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.chunk_length - self.overlap_length
    }

    /// Index in the parent signal of the first sample of chunk `index`.
    #[must_use]
    pub fn start(&self, index: usize) -> usize {
        index * self.stride()
    }

    /// Number of samples of chunk `index` that come from the parent signal; the rest is padding.
    #[must_use]
    pub fn valid_len(&self, index: usize) -> usize {
        self.chunk_length
            .min(self.samples.saturating_sub(self.start(index)))
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.count {
            Ok(())
        } else {
            Err(Error::ChunkIndex {
                index,
                chunks: self.count,
            })
        }
    }
}

/// Cuts a signal into the chunks described by `layout`.
///
/// Padding samples have zero magnitude; their times continue the parent's time axis at its
/// sample rate. Every chunk carries the parent's coefficients.
fn split<T: Value>(signal: &Signal<T>, layout: &ChunkLayout) -> Result<Vec<Signal<T>>> {
    let fsample = signal.fsample();
    let last_time = signal.time().last().copied().unwrap_or_else(T::zero);

    let mut chunks = Vec::with_capacity(layout.count());
    for index in 0..layout.count() {
        let start = layout.start(index);
        let valid = layout.valid_len(index);
        let padding = layout.chunk_length() - valid;

        let mut magnitude = signal.magnitude()[start..start + valid].to_vec();
        let mut time = signal.time()[start..start + valid].to_vec();
        magnitude.resize(layout.chunk_length(), T::zero());
        time.extend((1..=padding).map(|k| last_time + T::from_positive_int(k) / fsample));

        tracing::trace!(index, start, valid, padding, "cut chunk");
        chunks.push(Signal::from_parts(
            magnitude,
            Some(fsample),
            Some(time),
            signal.coefficients().to_vec(),
        )?);
    }

    Ok(chunks)
}

/// Rebuilds a signal from its chunks by averaging the samples where consecutive chunks overlap.
///
/// Chunk `i` contributes, in order:
/// - its left overlap: as-is for the first chunk, otherwise the mean with the right overlap of chunk `i - 1`,
/// - its core, between the two overlaps,
/// - its right overlap, for the last chunk only.
///
/// Time is merged the same way, and the result is cut to `layout.samples()`.
///
/// # Errors
/// - [`Error::ChunkCount`] if there are not exactly `layout.count()` chunks.
/// - [`Error::ChunkLength`] if a chunk does not hold `layout.chunk_length()` samples.
/// - [`Error::InvalidSampleRate`] if `fsample` is unusable.
///
/// # Example
/// ```
/// # use chunkfit::{merge_chunks, ChunkLayout, Signal};
/// let layout = ChunkLayout::new(6, 2, 30.0).unwrap(); // 3 samples per chunk, 1 shared
/// let a = Signal::new(vec![1.0, 1.0, 2.0], 1.0).unwrap();
/// let b = Signal::with_time(vec![4.0, 3.0, 3.0], vec![2.0, 3.0, 4.0]).unwrap();
/// let c = Signal::with_time(vec![3.0, 5.0, 5.0], vec![4.0, 5.0, 6.0]).unwrap();
///
/// let merged = merge_chunks(&[a, b, c], &layout, 1.0).unwrap();
/// assert_eq!(merged.magnitude(), &[1.0, 1.0, 3.0, 3.0, 3.0, 5.0]);
/// ```
pub fn merge_chunks<T: Value>(
    chunks: &[Signal<T>],
    layout: &ChunkLayout,
    fsample: T,
) -> Result<Signal<T>> {
    if chunks.len() != layout.count() {
        return Err(Error::ChunkCount {
            expected: layout.count(),
            actual: chunks.len(),
        });
    }
    if let Some(chunk) = chunks.iter().find(|c| c.len() != layout.chunk_length()) {
        return Err(Error::ChunkLength {
            expected: layout.chunk_length(),
            actual: chunk.len(),
        });
    }

    let cl = layout.chunk_length();
    let ol = layout.overlap_length();
    let capacity = layout.start(layout.count()) + ol;

    let mut magnitude = Vec::with_capacity(capacity);
    let mut time = Vec::with_capacity(capacity);
    for (i, chunk) in chunks.iter().enumerate() {
        let (m, t) = (chunk.magnitude(), chunk.time());

        match i.checked_sub(1).map(|p| &chunks[p]) {
            None => {
                magnitude.extend_from_slice(&m[..ol]);
                time.extend_from_slice(&t[..ol]);
            }
            Some(prev) => {
                magnitude.extend(average(&prev.magnitude()[cl - ol..], &m[..ol]));
                time.extend(average(&prev.time()[cl - ol..], &t[..ol]));
            }
        }

        magnitude.extend_from_slice(&m[ol..cl - ol]);
        time.extend_from_slice(&t[ol..cl - ol]);

        if i + 1 == chunks.len() {
            magnitude.extend_from_slice(&m[cl - ol..]);
            time.extend_from_slice(&t[cl - ol..]);
        }
    }

    magnitude.truncate(layout.samples());
    time.truncate(layout.samples());

    tracing::trace!(chunks = chunks.len(), samples = magnitude.len(), "merged chunks");
    Signal::from_parts(magnitude, Some(fsample), Some(time), Vec::new())
}

fn average<'a, T: Value>(a: &'a [T], b: &'a [T]) -> impl Iterator<Item = T> + 'a {
    a.iter().zip(b).map(|(&a, &b)| (a + b) / T::two())
}

/// A signal together with its overlapping chunks and their merged reconstruction.
///
/// The chunks can be replaced one at a time, typically by a fitted version of themselves;
/// every replacement re-runs the full merge.
///
/// # Example
/// ```
/// # use chunkfit::{ChunkedSignal, Signal};
/// let signal = Signal::new((0..12).map(f64::from).collect(), 1.0).unwrap();
/// let chunked = ChunkedSignal::new(&signal, 3, 0.0).unwrap();
/// assert_eq!(chunked.chunks().len(), 3);
/// assert_eq!(chunked.merged().magnitude(), signal.magnitude());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkedSignal<T: Value = f64> {
    merged: Signal<T>,
    chunks: Vec<Signal<T>>,
    layout: ChunkLayout,
    overlap_percent: f64,
}

impl<T: Value> ChunkedSignal<T> {
    /// Splits `signal` into at most `max_chunks` chunks sharing `overlap_percent`% of their samples.
    ///
    /// # Errors
    /// - [`Error::NoData`] if the signal is empty.
    /// - Any layout error from [`ChunkLayout::new`].
    pub fn new(signal: &Signal<T>, max_chunks: usize, overlap_percent: f64) -> Result<Self> {
        if signal.is_empty() {
            return Err(Error::NoData);
        }

        let layout = ChunkLayout::new(signal.len(), max_chunks, overlap_percent)?;
        let chunks = split(signal, &layout)?;
        let merged = merge_chunks(&chunks, &layout, signal.fsample())?
            .with_coefficients(signal.coefficients().to_vec());

        tracing::debug!(
            samples = layout.samples(),
            chunks = layout.count(),
            chunk_length = layout.chunk_length(),
            overlap_length = layout.overlap_length(),
            "chunked signal"
        );

        Ok(Self {
            merged,
            chunks,
            layout,
            overlap_percent,
        })
    }

    /// The signal reconstructed from the current chunks.
    #[must_use]
    pub fn merged(&self) -> &Signal<T> {
        &self.merged
    }

    /// Consumes the chunked signal, returning the merged reconstruction.
    #[must_use]
    pub fn into_merged(self) -> Signal<T> {
        self.merged
    }

    /// All chunks, in order.
    #[must_use]
    pub fn chunks(&self) -> &[Signal<T>] {
        &self.chunks
    }

    /// The chunk at `index`, if it exists.
    #[must_use]
    pub fn chunk(&self, index: usize) -> Option<&Signal<T>> {
        self.chunks.get(index)
    }

    /// The window geometry.
    #[must_use]
    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    /// Overlap percentage the signal was split with.
    #[must_use]
    pub fn overlap_percent(&self) -> f64 {
        self.overlap_percent
    }

    /// Samples per chunk.
    #[must_use]
    pub fn chunk_length(&self) -> usize {
        self.layout.chunk_length()
    }

    /// Samples shared by consecutive chunks.
    #[must_use]
    pub fn overlap_length(&self) -> usize {
        self.layout.overlap_length()
    }

    /// Replaces chunk `index` and re-merges.
    ///
    /// # Errors
    /// - [`Error::ChunkIndex`] if there is no chunk at `index`.
    /// - [`Error::ChunkLength`] if `signal` does not hold exactly [`ChunkedSignal::chunk_length`] samples.
    ///
    /// Nothing changes on error.
    pub fn set_chunk(&mut self, index: usize, signal: Signal<T>) -> Result<()> {
        self.layout.check_index(index)?;
        if signal.len() != self.layout.chunk_length() {
            return Err(Error::ChunkLength {
                expected: self.layout.chunk_length(),
                actual: signal.len(),
            });
        }

        let mut chunks = self.chunks.clone();
        chunks[index] = signal;
        let merged = merge_chunks(&chunks, &self.layout, self.merged.fsample())?
            .with_coefficients(self.merged.coefficients().to_vec());

        self.chunks = chunks;
        self.merged = merged;
        Ok(())
    }

    /// Replaces every chunk at once and re-merges.
    ///
    /// # Errors
    /// - [`Error::ChunkCount`] if `chunks` does not hold one signal per window.
    /// - [`Error::ChunkLength`] if any of them does not hold exactly [`ChunkedSignal::chunk_length`] samples.
    ///
    /// Nothing changes on error.
    pub fn replace_chunks(&mut self, chunks: Vec<Signal<T>>) -> Result<()> {
        let merged = merge_chunks(&chunks, &self.layout, self.merged.fsample())?
            .with_coefficients(self.merged.coefficients().to_vec());

        self.chunks = chunks;
        self.merged = merged;
        Ok(())
    }

    /// The left or right overlap region of chunk `index`.
    ///
    /// # Errors
    /// Returns [`Error::ChunkIndex`] if there is no chunk at `index`.
    pub fn overlap(&self, index: usize, direction: Direction) -> Result<Signal<T>> {
        self.layout.check_index(index)?;
        let (cl, ol) = (self.layout.chunk_length(), self.layout.overlap_length());
        let range = match direction {
            Direction::Left => 0..ol,
            Direction::Right => cl - ol..cl,
        };
        self.chunks[index].slice(range)
    }

    /// The left overlap of chunk `index` as it appears in the merged signal.
    ///
    /// For the first chunk this is its own left overlap, for every other chunk the mean of
    /// its left overlap and the right overlap of the chunk before it.
    ///
    /// # Errors
    /// Returns [`Error::ChunkIndex`] if there is no chunk at `index`.
    pub fn averaged_overlap(&self, index: usize) -> Result<Signal<T>> {
        let left = self.overlap(index, Direction::Left)?;
        let Some(previous) = index.checked_sub(1) else {
            return Ok(left);
        };

        let right = self.overlap(previous, Direction::Right)?;
        let magnitude = average(right.magnitude(), left.magnitude()).collect();
        Signal::from_parts(
            magnitude,
            Some(left.fsample()),
            Some(left.time().to_vec()),
            Vec::new(),
        )
    }

    /// The samples of chunk `index` that lie outside both of its overlaps.
    ///
    /// # Errors
    /// Returns [`Error::ChunkIndex`] if there is no chunk at `index`.
    pub fn core(&self, index: usize) -> Result<Signal<T>> {
        self.layout.check_index(index)?;
        let (cl, ol) = (self.layout.chunk_length(), self.layout.overlap_length());
        self.chunks[index].slice(ol..cl - ol)
    }

    /// Coefficients attached to chunk `index`, highest power first.
    ///
    /// # Errors
    /// Returns [`Error::ChunkIndex`] if there is no chunk at `index`.
    pub fn coefficients(&self, index: usize) -> Result<&[T]> {
        self.layout.check_index(index)?;
        Ok(self.chunks[index].coefficients())
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::assert_all_close;

    fn ramp(n: usize) -> Signal {
        Signal::new((0..n).map(|i| i as f64 + 1.0).collect(), 1.0).unwrap()
    }

    #[test]
    fn test_layout() {
        let layout = ChunkLayout::new(10, 3, 0.0).unwrap();
        assert_eq!(layout.chunk_length(), 3);
        assert_eq!(layout.stride(), 3);
        assert_eq!(layout.count(), 4);
        assert_eq!(layout.valid_len(3), 1);

        let layout = ChunkLayout::new(8, 2, 50.0).unwrap();
        assert_eq!(layout.overlap_length(), 2);
        assert_eq!(layout.count(), 3);
        assert_eq!(layout.start(2), 4);
        assert_eq!(layout.valid_len(2), 4);

        let single = ChunkLayout::new(5, 1, 0.0).unwrap();
        assert_eq!(single.count(), 1);
        assert_eq!(single.chunk_length(), 5);
    }

    #[test]
    fn test_layout_errors() {
        assert_eq!(ChunkLayout::new(10, 0, 0.0), Err(Error::InvalidChunkCount));
        assert_eq!(
            ChunkLayout::new(3, 4, 0.0),
            Err(Error::TooManyChunks {
                chunks: 4,
                samples: 3
            })
        );
        assert_eq!(
            ChunkLayout::new(10, 2, 100.0),
            Err(Error::InvalidOverlap(100.0))
        );
        assert_eq!(
            ChunkLayout::new(10, 2, -1.0),
            Err(Error::InvalidOverlap(-1.0))
        );
        assert_eq!(
            ChunkLayout::new(8, 2, 60.0),
            Err(Error::OverlapTooLarge {
                overlap: 3,
                chunk_length: 4
            })
        );
    }

    #[test]
    fn test_overlap_bound_after_rounding() {
        // 3 samples per chunk: 33% rounds up to 1 overlap sample, 34% to 2
        let layout = ChunkLayout::new(9, 3, 33.0).unwrap();
        assert_eq!(layout.overlap_length(), 1);

        assert_eq!(
            ChunkLayout::new(9, 3, 34.0),
            Err(Error::OverlapTooLarge {
                overlap: 2,
                chunk_length: 3
            })
        );
    }

    #[test]
    fn test_no_overlap_reproduces_signal() {
        let signal = ramp(12);
        let chunked = ChunkedSignal::new(&signal, 3, 0.0).unwrap();
        assert_eq!(chunked.chunks().len(), 3);
        assert_eq!(chunked.merged(), &signal);
    }

    #[test]
    fn test_padded_chunk() {
        let signal = ramp(10);
        let chunked = ChunkedSignal::new(&signal, 3, 0.0).unwrap();

        let last = chunked.chunk(3).unwrap();
        assert_eq!(last.magnitude(), &[10.0, 0.0, 0.0]);
        assert_eq!(last.time(), &[9.0, 10.0, 11.0]);
        assert_eq!(chunked.merged(), &signal);
    }

    #[test]
    fn test_overlap_of_unchanged_chunks_reproduces_signal() {
        let signal = ramp(20);
        let chunked = ChunkedSignal::new(&signal, 4, 20.0).unwrap();
        assert_eq!(chunked.chunks().len(), 5);
        assert_eq!(chunked.merged(), &signal);
    }

    #[test]
    fn test_overlap_is_averaged() {
        let signal = ramp(8);
        let mut chunked = ChunkedSignal::new(&signal, 2, 50.0).unwrap();

        let first = chunked.chunk(0).unwrap().time().to_vec();
        let second = chunked.chunk(1).unwrap().time().to_vec();
        chunked
            .set_chunk(0, Signal::from_parts(vec![0.0, 0.0, 2.0, 4.0], Some(1.0), Some(first), vec![]).unwrap())
            .unwrap();
        chunked
            .set_chunk(1, Signal::from_parts(vec![6.0, 8.0, 0.0, 0.0], Some(1.0), Some(second), vec![]).unwrap())
            .unwrap();

        let merged = chunked.merged();
        assert_eq!(merged.len(), 8);
        assert_eq!(&merged.magnitude()[2..4], &[4.0, 6.0]);
        assert_eq!(merged.time(), signal.time());

        let averaged = chunked.averaged_overlap(1).unwrap();
        assert_eq!(averaged.magnitude(), &[4.0, 6.0]);
    }

    #[test]
    fn test_set_chunk_errors_leave_state() {
        let signal = ramp(8);
        let mut chunked = ChunkedSignal::new(&signal, 2, 0.0).unwrap();
        let before = chunked.clone();

        assert_eq!(
            chunked.set_chunk(5, ramp(4)),
            Err(Error::ChunkIndex {
                index: 5,
                chunks: 2
            })
        );
        assert_eq!(
            chunked.set_chunk(0, ramp(3)),
            Err(Error::ChunkLength {
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(chunked, before);
    }

    #[test]
    fn test_replace_chunks() {
        let signal = ramp(8);
        let mut chunked = ChunkedSignal::new(&signal, 2, 0.0).unwrap();

        let doubled: Vec<Signal> = chunked
            .chunks()
            .iter()
            .map(|c| c.try_add(c).unwrap())
            .collect();
        chunked.replace_chunks(doubled).unwrap();
        assert_eq!(
            chunked.merged().magnitude(),
            &[2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0]
        );

        let before = chunked.clone();
        assert!(chunked.replace_chunks(vec![ramp(4)]).is_err());
        assert_eq!(chunked, before);
    }

    #[test]
    fn test_overlap_lookups() {
        let signal = ramp(20);
        let chunked = ChunkedSignal::new(&signal, 4, 20.0).unwrap();

        assert_eq!(chunked.overlap(1, Direction::Left).unwrap().magnitude(), &[5.0]);
        assert_eq!(chunked.overlap(1, Direction::Right).unwrap().magnitude(), &[9.0]);
        assert_eq!(chunked.core(1).unwrap().magnitude(), &[6.0, 7.0, 8.0]);
        assert_eq!(chunked.averaged_overlap(0).unwrap().magnitude(), &[1.0]);
        assert!(chunked.coefficients(1).unwrap().is_empty());
        assert!(chunked.core(9).is_err());
    }

    #[test]
    fn test_merge_checks_chunks() {
        let layout = ChunkLayout::new(8, 2, 0.0).unwrap();
        let chunk = ramp(4);
        assert_eq!(
            merge_chunks(&[chunk.clone()], &layout, 1.0),
            Err(Error::ChunkCount {
                expected: 2,
                actual: 1
            })
        );

        let merged = merge_chunks(&[chunk.clone(), chunk], &layout, 1.0).unwrap();
        assert_all_close!(merged.magnitude(), &[1.0, 2.0, 3.0, 4.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_empty_signal() {
        let empty = Signal::<f64>::with_time(vec![], vec![]).unwrap();
        assert_eq!(ChunkedSignal::new(&empty, 1, 0.0), Err(Error::NoData));
    }
}

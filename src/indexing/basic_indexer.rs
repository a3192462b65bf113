use std::iter::FusedIterator;

use itertools::izip;
use thiserror::Error;

use crate::array::{ArrayIndices, ArrayShape};

use super::{
    normalize_index, BoundsCheckError, DimSelection, InvalidSliceError, NormalizedSlice, Selection,
    Slice,
};

/// A selection along one axis in concrete, loop-ready form.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DimProjection {
    /// A strided run: the indices `start + k * step` for `k` in `0..count`.
    Slice {
        /// The first index.
        start: u64,
        /// The signed step between indices.
        step: i64,
        /// The number of indices.
        count: u64,
    },
    /// A single index. The axis is dropped from the output.
    Index(u64),
}

impl DimProjection {
    /// Return the number of selected elements along the axis.
    #[must_use]
    pub const fn num_elements(&self) -> u64 {
        match self {
            Self::Slice { count, .. } => *count,
            Self::Index(_) => 1,
        }
    }

    /// Return the first selected index along the axis.
    #[must_use]
    pub const fn start(&self) -> u64 {
        match self {
            Self::Slice { start, .. } => *start,
            Self::Index(index) => *index,
        }
    }
}

/// The projection of a selection onto a single chunk.
///
/// The number of elements implied by `chunk_selection` equals the number implied by
/// `out_selection`; over a full [`BasicIndexer`] stream the output selections tile the
/// output exactly, with no overlap and no gaps.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChunkProjection {
    /// The coordinates of the chunk in the chunk grid.
    pub chunk_indices: ArrayIndices,
    /// The selection within the chunk, one entry per array axis.
    pub chunk_selection: Vec<DimProjection>,
    /// The selection within the output, one entry per surviving (non-dropped) axis.
    ///
    /// Always contiguous ascending runs (`step == 1`).
    pub out_selection: Vec<DimProjection>,
}

/// The projection of a selection onto a single chunk, along one axis.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct ChunkDimProjection {
    chunk_index: u64,
    chunk_sel: DimProjection,
    out_sel: Option<DimProjection>,
}

fn div_ceil(numerator: i64, denominator: i64) -> i64 {
    debug_assert!(numerator >= 0 && denominator > 0);
    (numerator + denominator - 1) / denominator
}

/// Indexes one sliced axis, decomposing the slice over the chunks it touches.
#[derive(Clone, Debug)]
struct SliceDimIndexer {
    slice: NormalizedSlice,
    chunk_len: i64,
}

impl SliceDimIndexer {
    fn new(slice: &Slice, dim_len: u64, chunk_len: u64) -> Result<Self, InvalidSliceError> {
        debug_assert!(chunk_len > 0);
        Ok(Self {
            slice: slice.normalize(dim_len)?,
            chunk_len: i64::try_from(chunk_len).unwrap(),
        })
    }

    fn num_items(&self) -> u64 {
        self.slice.count
    }

    /// Enumerate the chunks touched by the slice, in step order.
    ///
    /// Chunks containing no selected indices are skipped; output offsets are contiguous
    /// ascending.
    fn projections(&self) -> Vec<ChunkDimProjection> {
        let mut projections = Vec::new();
        if self.slice.count == 0 {
            return projections;
        }
        let NormalizedSlice {
            start, stop, step, ..
        } = self.slice;
        let count = i64::try_from(self.slice.count).unwrap();
        let last = start + step * (count - 1);
        let len = self.chunk_len;
        let mut out_offset = 0;

        let mut push = |chunk: i64, first: i64, n: i64| {
            let n = n.unsigned_abs();
            projections.push(ChunkDimProjection {
                chunk_index: chunk.unsigned_abs(),
                chunk_sel: DimProjection::Slice {
                    start: (first - chunk * len).unsigned_abs(),
                    step,
                    count: n,
                },
                out_sel: Some(DimProjection::Slice {
                    start: out_offset,
                    step: 1,
                    count: n,
                }),
            });
            out_offset += n;
        };

        if step > 0 {
            for chunk in (start / len)..=(last / len) {
                let chunk_start = chunk * len;
                // First progression point at or after the start of this chunk.
                let first = if start >= chunk_start {
                    start
                } else {
                    start + step * div_ceil(chunk_start - start, step)
                };
                let end = stop.min(chunk_start + len);
                if first < end {
                    push(chunk, first, div_ceil(end - first, step));
                }
            }
        } else {
            let mut chunk = start / len;
            let last_chunk = last / len;
            while chunk >= last_chunk {
                let chunk_end = (chunk + 1) * len - 1;
                // First progression point at or before the end of this chunk.
                let first = if start <= chunk_end {
                    start
                } else {
                    start + step * div_ceil(start - chunk_end, -step)
                };
                let bound = (chunk * len).max(stop + 1);
                if first >= bound {
                    push(chunk, first, (first - bound) / -step + 1);
                }
                chunk -= 1;
            }
        }
        projections
    }
}

/// Indexes one integer-indexed axis. The axis is dropped from the output.
#[derive(Clone, Copy, Debug)]
struct IndexDimIndexer {
    chunk_index: u64,
    local_index: u64,
}

impl IndexDimIndexer {
    fn new(index: i64, dim_len: u64, chunk_len: u64) -> Result<Self, BoundsCheckError> {
        let index = normalize_index(index, dim_len)?;
        Ok(Self {
            chunk_index: index / chunk_len,
            local_index: index % chunk_len,
        })
    }

    fn projections(&self) -> Vec<ChunkDimProjection> {
        vec![ChunkDimProjection {
            chunk_index: self.chunk_index,
            chunk_sel: DimProjection::Index(self.local_index),
            out_sel: None,
        }]
    }
}

#[derive(Clone, Debug)]
enum DimIndexer {
    Slice(SliceDimIndexer),
    Index(IndexDimIndexer),
}

impl DimIndexer {
    fn projections(&self) -> Vec<ChunkDimProjection> {
        match self {
            Self::Slice(indexer) => indexer.projections(),
            Self::Index(indexer) => indexer.projections(),
        }
    }
}

/// A selection length error.
#[derive(Clone, Copy, Debug, Error)]
#[error("selection has {_0} dimension selections, array dimensionality is {_1}")]
pub struct TooManyIndicesError(usize, usize);

/// An indexing error.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// An out of bounds index.
    #[error(transparent)]
    Bounds(#[from] BoundsCheckError),
    /// An invalid slice.
    #[error(transparent)]
    InvalidSlice(#[from] InvalidSliceError),
    /// Too many dimension selections.
    #[error(transparent)]
    TooManyIndices(#[from] TooManyIndicesError),
}

/// Translates a [`Selection`] against an array shape and chunk grid into a stream of
/// [`ChunkProjection`]s.
///
/// Chunks are visited in lexicographic order over their grid coordinates (axis 0
/// outermost). The stream is empty if any axis selects zero elements, while
/// [`out_shape`](BasicIndexer::out_shape) still reports the zero-sized dimension.
#[derive(Debug)]
pub struct BasicIndexer {
    dim_projections: Vec<Vec<ChunkDimProjection>>,
    out_shape: ArrayShape,
    drop_axes: Vec<usize>,
}

impl BasicIndexer {
    /// Create a new indexer for `selection` against an array with `shape` and chunks of
    /// `chunk_shape`.
    ///
    /// A selection shorter than the array dimensionality is right-padded with full axes.
    ///
    /// # Errors
    /// Returns an [`IndexerError`] if the selection has more dimension selections than the
    /// array has dimensions, an integer index is out of bounds, or a slice has a zero step.
    ///
    /// # Panics
    /// Panics if the length of `chunk_shape` does not match the length of `shape` or a
    /// chunk dimension is zero.
    pub fn new(
        selection: &Selection,
        shape: &[u64],
        chunk_shape: &[u64],
    ) -> Result<Self, IndexerError> {
        assert_eq!(shape.len(), chunk_shape.len());
        if selection.dims().len() > shape.len() {
            return Err(TooManyIndicesError(selection.dims().len(), shape.len()).into());
        }

        let mut dim_indexers = Vec::with_capacity(shape.len());
        let mut out_shape = Vec::with_capacity(shape.len());
        let mut drop_axes = Vec::new();
        for (axis, (&dim_len, &chunk_len)) in std::iter::zip(shape, chunk_shape).enumerate() {
            assert_ne!(chunk_len, 0);
            let dim_selection = selection
                .dims()
                .get(axis)
                .copied()
                .unwrap_or(DimSelection::Full);
            let indexer = match dim_selection {
                DimSelection::Full => {
                    DimIndexer::Slice(SliceDimIndexer::new(&Slice::full(), dim_len, chunk_len)?)
                }
                DimSelection::Slice(slice) => {
                    DimIndexer::Slice(SliceDimIndexer::new(&slice, dim_len, chunk_len)?)
                }
                DimSelection::Index(index) => {
                    DimIndexer::Index(IndexDimIndexer::new(index, dim_len, chunk_len)?)
                }
            };
            match &indexer {
                DimIndexer::Slice(slice_indexer) => out_shape.push(slice_indexer.num_items()),
                DimIndexer::Index(_) => drop_axes.push(axis),
            }
            dim_indexers.push(indexer);
        }

        Ok(Self {
            dim_projections: dim_indexers
                .iter()
                .map(DimIndexer::projections)
                .collect(),
            out_shape,
            drop_axes,
        })
    }

    /// Return the shape of the output, excluding dropped axes.
    #[must_use]
    pub fn out_shape(&self) -> &[u64] {
        &self.out_shape
    }

    /// Return the axes dropped from the output because an integer index was supplied.
    #[must_use]
    pub fn drop_axes(&self) -> &[usize] {
        &self.drop_axes
    }

    /// Return the number of elements selected.
    ///
    /// Equal to the product of the components of the output shape.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.out_shape.iter().product()
    }

    /// Returns an iterator over the projections of the selection onto each chunk touched.
    #[must_use]
    pub fn iter(&self) -> ChunkProjectionsIterator<'_> {
        ChunkProjectionsIterator::new(&self.dim_projections)
    }
}

impl<'a> IntoIterator for &'a BasicIndexer {
    type Item = ChunkProjection;
    type IntoIter = ChunkProjectionsIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the [`ChunkProjection`]s of a [`BasicIndexer`].
///
/// The row-major Cartesian product of the per-axis projections (axis 0 outermost).
/// A zero-dimensional selection yields a single empty projection.
pub struct ChunkProjectionsIterator<'a> {
    dim_projections: &'a [Vec<ChunkDimProjection>],
    odometer: Vec<usize>,
    remaining: usize,
}

impl<'a> ChunkProjectionsIterator<'a> {
    fn new(dim_projections: &'a [Vec<ChunkDimProjection>]) -> Self {
        let remaining = dim_projections
            .iter()
            .map(Vec::len)
            .product::<usize>();
        Self {
            dim_projections,
            odometer: vec![0; dim_projections.len()],
            remaining,
        }
    }
}

impl Iterator for ChunkProjectionsIterator<'_> {
    type Item = ChunkProjection;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let dimensionality = self.dim_projections.len();
        let mut chunk_indices = Vec::with_capacity(dimensionality);
        let mut chunk_selection = Vec::with_capacity(dimensionality);
        let mut out_selection = Vec::with_capacity(dimensionality);
        for (projections, &i) in izip!(self.dim_projections, &self.odometer) {
            let projection = &projections[i];
            chunk_indices.push(projection.chunk_index);
            chunk_selection.push(projection.chunk_sel);
            if let Some(out_sel) = projection.out_sel {
                out_selection.push(out_sel);
            }
        }

        // Advance the odometer, last axis fastest.
        for axis in (0..dimensionality).rev() {
            self.odometer[axis] += 1;
            if self.odometer[axis] < self.dim_projections[axis].len() {
                break;
            }
            self.odometer[axis] = 0;
        }

        Some(ChunkProjection {
            chunk_indices,
            chunk_selection,
            out_selection,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ChunkProjectionsIterator<'_> {}

impl FusedIterator for ChunkProjectionsIterator<'_> {}

/// Returns true if `selection` selects the whole of a chunk with `chunk_shape`, in order.
///
/// A selection is total iff along every axis it is a slice with `start == 0`, `step == 1`
/// and `count` equal to the chunk length.
///
/// # Panics
/// Panics if the length of `selection` does not match the length of `chunk_shape`.
#[must_use]
pub fn is_total_slice(selection: &[DimProjection], chunk_shape: &[u64]) -> bool {
    assert_eq!(selection.len(), chunk_shape.len());
    izip!(selection, chunk_shape).all(|(projection, &len)| match projection {
        DimProjection::Slice { start, step, count } => {
            *start == 0 && *step == 1 && *count == len
        }
        DimProjection::Index(_) => false,
    })
}

/// Returns true if `selection` selects a single contiguous byte run of a C-order array
/// with `out_shape`.
///
/// Contiguous iff all steps are 1 and, scanning from the outermost axis, every axis before
/// the first axis selecting more than one element selects exactly one, and every axis
/// after it is full.
///
/// # Panics
/// Panics if the length of `selection` does not match the length of `out_shape`.
#[must_use]
pub fn is_contiguous_selection(selection: &[DimProjection], out_shape: &[u64]) -> bool {
    assert_eq!(selection.len(), out_shape.len());
    let mut run_seen = false;
    for (projection, &len) in izip!(selection, out_shape) {
        let DimProjection::Slice { start, step, count } = projection else {
            return false;
        };
        if *step != 1 {
            return false;
        }
        let full = *start == 0 && *count == len;
        if run_seen && !full {
            return false;
        }
        if *count != 1 {
            run_seen = true;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice_projection(start: u64, step: i64, count: u64) -> DimProjection {
        DimProjection::Slice { start, step, count }
    }

    #[test]
    fn slice_dim_indexer_forward() {
        let indexer = SliceDimIndexer::new(&Slice::from(1..5), 6, 2).unwrap();
        assert_eq!(indexer.num_items(), 4);
        let projections = indexer.projections();
        assert_eq!(projections.len(), 3);
        assert_eq!(projections[0].chunk_index, 0);
        assert_eq!(projections[0].chunk_sel, slice_projection(1, 1, 1));
        assert_eq!(projections[0].out_sel, Some(slice_projection(0, 1, 1)));
        assert_eq!(projections[1].chunk_index, 1);
        assert_eq!(projections[1].chunk_sel, slice_projection(0, 1, 2));
        assert_eq!(projections[1].out_sel, Some(slice_projection(1, 1, 2)));
        assert_eq!(projections[2].chunk_index, 2);
        assert_eq!(projections[2].chunk_sel, slice_projection(0, 1, 1));
        assert_eq!(projections[2].out_sel, Some(slice_projection(3, 1, 1)));
    }

    #[test]
    fn slice_dim_indexer_strided_skips_chunks() {
        // Indices 0 and 4 of a dimension of length 6 with chunks of 2: chunk 1 is untouched.
        let indexer = SliceDimIndexer::new(&Slice::full().with_step(4), 6, 2).unwrap();
        assert_eq!(indexer.num_items(), 2);
        let projections = indexer.projections();
        assert_eq!(projections.len(), 2);
        assert_eq!(projections[0].chunk_index, 0);
        assert_eq!(projections[0].chunk_sel, slice_projection(0, 4, 1));
        assert_eq!(projections[1].chunk_index, 2);
        assert_eq!(projections[1].chunk_sel, slice_projection(0, 4, 1));
        assert_eq!(projections[1].out_sel, Some(slice_projection(1, 1, 1)));
    }

    #[test]
    fn slice_dim_indexer_reverse() {
        // Indices 4, 3, 2, 1, 0 of a dimension of length 5 with chunks of 2.
        let indexer =
            SliceDimIndexer::new(&Slice::full().with_step(-1), 5, 2).unwrap();
        assert_eq!(indexer.num_items(), 5);
        let projections = indexer.projections();
        assert_eq!(projections.len(), 3);
        assert_eq!(projections[0].chunk_index, 2);
        assert_eq!(projections[0].chunk_sel, slice_projection(0, -1, 1));
        assert_eq!(projections[0].out_sel, Some(slice_projection(0, 1, 1)));
        assert_eq!(projections[1].chunk_index, 1);
        assert_eq!(projections[1].chunk_sel, slice_projection(1, -1, 2));
        assert_eq!(projections[1].out_sel, Some(slice_projection(1, 1, 2)));
        assert_eq!(projections[2].chunk_index, 0);
        assert_eq!(projections[2].chunk_sel, slice_projection(1, -1, 2));
        assert_eq!(projections[2].out_sel, Some(slice_projection(3, 1, 2)));
    }

    #[test]
    fn slice_dim_indexer_reverse_strided() {
        // Indices 4, 2 of a dimension of length 5 with chunks of 2.
        let indexer =
            SliceDimIndexer::new(&Slice::new(Some(4), Some(0), Some(-2)), 5, 2).unwrap();
        assert_eq!(indexer.num_items(), 2);
        let projections = indexer.projections();
        assert_eq!(projections.len(), 2);
        assert_eq!(projections[0].chunk_index, 2);
        assert_eq!(projections[0].chunk_sel, slice_projection(0, -2, 1));
        assert_eq!(projections[1].chunk_index, 1);
        assert_eq!(projections[1].chunk_sel, slice_projection(0, -2, 1));
    }

    #[test]
    fn index_dim_indexer() {
        let indexer = IndexDimIndexer::new(-1, 5, 2).unwrap();
        let projections = indexer.projections();
        assert_eq!(projections.len(), 1);
        assert_eq!(projections[0].chunk_index, 2);
        assert_eq!(projections[0].chunk_sel, DimProjection::Index(0));
        assert_eq!(projections[0].out_sel, None);
        assert!(IndexDimIndexer::new(5, 5, 2).is_err());
    }

    #[test]
    fn basic_indexer_2d() {
        // 4x4 array, 2x2 chunks, rows 1..3 of column 1.
        let selection = Selection::from(vec![
            DimSelection::from(1..3),
            DimSelection::Index(1),
        ]);
        let indexer = BasicIndexer::new(&selection, &[4, 4], &[2, 2]).unwrap();
        assert_eq!(indexer.out_shape(), [2]);
        assert_eq!(indexer.drop_axes(), [1]);
        assert_eq!(indexer.num_elements(), 2);
        let projections: Vec<ChunkProjection> = indexer.iter().collect();
        assert_eq!(projections.len(), 2);
        assert_eq!(projections[0].chunk_indices, [0, 0]);
        assert_eq!(
            projections[0].chunk_selection,
            [slice_projection(1, 1, 1), DimProjection::Index(1)]
        );
        assert_eq!(projections[0].out_selection, [slice_projection(0, 1, 1)]);
        assert_eq!(projections[1].chunk_indices, [1, 0]);
        assert_eq!(
            projections[1].chunk_selection,
            [slice_projection(0, 1, 1), DimProjection::Index(1)]
        );
        assert_eq!(projections[1].out_selection, [slice_projection(1, 1, 1)]);
    }

    #[test]
    fn basic_indexer_pads_trailing_axes() {
        let indexer = BasicIndexer::new(&Selection::from(0), &[2, 3], &[2, 3]).unwrap();
        assert_eq!(indexer.out_shape(), [3]);
        assert_eq!(indexer.drop_axes(), [0]);
        let projections: Vec<ChunkProjection> = indexer.iter().collect();
        assert_eq!(projections.len(), 1);
        assert_eq!(
            projections[0].chunk_selection,
            [DimProjection::Index(0), slice_projection(0, 1, 3)]
        );
    }

    #[test]
    fn basic_indexer_too_many_indices() {
        let selection = Selection::from(vec![DimSelection::Full; 3]);
        assert!(BasicIndexer::new(&selection, &[2, 3], &[2, 3]).is_err());
    }

    #[test]
    fn basic_indexer_empty_selection() {
        let indexer =
            BasicIndexer::new(&Selection::from(Slice::from(0..0)), &[2, 3], &[2, 3]).unwrap();
        assert_eq!(indexer.out_shape(), [0, 3]);
        assert_eq!(indexer.num_elements(), 0);
        assert_eq!(indexer.iter().count(), 0);
    }

    #[test]
    fn basic_indexer_zero_dimensional() {
        let indexer = BasicIndexer::new(&Selection::all(), &[], &[]).unwrap();
        assert!(indexer.out_shape().is_empty());
        assert_eq!(indexer.num_elements(), 1);
        let projections: Vec<ChunkProjection> = indexer.iter().collect();
        assert_eq!(projections.len(), 1);
        assert!(projections[0].chunk_indices.is_empty());
        assert!(projections[0].chunk_selection.is_empty());
        assert!(projections[0].out_selection.is_empty());
    }

    #[test]
    fn basic_indexer_lexicographic_order() {
        let selection = Selection::all();
        let indexer = BasicIndexer::new(&selection, &[4, 4], &[2, 2]).unwrap();
        let chunks: Vec<ArrayIndices> =
            indexer.iter().map(|p| p.chunk_indices).collect();
        assert_eq!(
            chunks,
            [vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]
        );
    }

    #[test]
    fn total_slice_detection() {
        assert!(is_total_slice(&[slice_projection(0, 1, 2)], &[2]));
        assert!(!is_total_slice(&[slice_projection(0, 1, 1)], &[2]));
        assert!(!is_total_slice(&[slice_projection(1, 1, 2)], &[2]));
        assert!(!is_total_slice(&[slice_projection(0, 2, 2)], &[2]));
        assert!(!is_total_slice(&[DimProjection::Index(0)], &[1]));
        assert!(is_total_slice(
            &[slice_projection(0, 1, 2), slice_projection(0, 1, 3)],
            &[2, 3]
        ));
    }

    #[test]
    fn contiguous_selection_detection() {
        // A band of whole rows is contiguous.
        assert!(is_contiguous_selection(
            &[slice_projection(1, 1, 2), slice_projection(0, 1, 4)],
            &[4, 4]
        ));
        // A column sub-range of every row is not.
        assert!(!is_contiguous_selection(
            &[slice_projection(0, 1, 4), slice_projection(1, 1, 2)],
            &[4, 4]
        ));
        // A single row prefix is contiguous.
        assert!(is_contiguous_selection(
            &[slice_projection(2, 1, 1), slice_projection(0, 1, 2)],
            &[4, 4]
        ));
        // Strides are not.
        assert!(!is_contiguous_selection(&[slice_projection(0, 2, 2)], &[4]));
    }
}

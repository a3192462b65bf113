//! Selections and chunk indexing.
//!
//! A [`Selection`] describes a hyper-rectangular region of an array with one
//! [`DimSelection`] per axis: a [`Slice`] with NumPy semantics, an integer index
//! (which drops the axis from the result), or the full axis.
//!
//! A [`BasicIndexer`] translates a selection against an array shape and chunk grid into a
//! stream of [`ChunkProjection`]s: for every chunk touched by the selection, the
//! coordinates of the chunk in the chunk grid, the selection within the chunk, and the
//! selection within the output.

mod basic_indexer;
mod selection;
mod slice;

pub use basic_indexer::{
    is_contiguous_selection, is_total_slice, BasicIndexer, ChunkProjection,
    ChunkProjectionsIterator, DimProjection, IndexerError, TooManyIndicesError,
};
pub use selection::{DimSelection, Selection};
pub use slice::{normalize_index, BoundsCheckError, InvalidSliceError, NormalizedSlice, Slice};

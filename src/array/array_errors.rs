use thiserror::Error;

use crate::{
    codec::{CodecCreateError, CodecError},
    indexing::{BoundsCheckError, IndexerError, InvalidSliceError, TooManyIndicesError},
    storage::{NodePathError, StorageError, StoreKey},
};

use super::{
    data_type::{IncompatibleFillValueMetadataError, UnsupportedDataTypeError},
    ArrayIndices, ArrayShape, DataType,
};

/// An array creation error.
#[derive(Debug, Error)]
pub enum ArrayCreateError {
    /// Array metadata is missing from the store.
    #[error("array metadata is missing")]
    MissingMetadata,
    /// An invalid node path.
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// Unsupported data type.
    #[error(transparent)]
    UnsupportedDataType(#[from] UnsupportedDataTypeError),
    /// Invalid fill value.
    #[error(transparent)]
    InvalidFillValue(#[from] IncompatibleFillValueMetadataError),
    /// Error creating the compressor.
    #[error(transparent)]
    CodecCreateError(#[from] CodecCreateError),
    /// The dimensionality of the chunk grid does not match the array shape.
    #[error("chunk grid dimensionality {_0} does not match array dimensionality {_1}")]
    InvalidChunkGridDimensionality(usize, usize),
    /// `F`-order chunks are not supported.
    #[error("F-order chunks are not supported")]
    UnsupportedOrder,
    /// Filters are not supported.
    #[error("filters are not supported")]
    UnsupportedFilters,
    /// Storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
}

/// Array errors.
#[derive(Debug, Error)]
pub enum ArrayError {
    /// A store error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// A codec error.
    #[error(transparent)]
    CodecError(#[from] CodecError),
    /// An out of bounds index.
    #[error(transparent)]
    Bounds(#[from] BoundsCheckError),
    /// An invalid slice.
    #[error(transparent)]
    InvalidSlice(#[from] InvalidSliceError),
    /// Too many dimension selections.
    #[error(transparent)]
    TooManyIndices(#[from] TooManyIndicesError),
    /// A write operation against a read-only array.
    #[error("the array is read-only")]
    ReadOnly,
    /// A chunk expected to exist is missing and the array has no fill value.
    #[error("chunk at {_0} is missing and the array has no fill value")]
    MissingChunk(StoreKey),
    /// Invalid chunk grid indices.
    #[error("invalid chunk grid indices {_0:?}")]
    InvalidChunkGridIndices(ArrayIndices),
    /// An unexpected chunk decoded size.
    #[error("got chunk decoded size {_0}, expected {_1}")]
    UnexpectedChunkDecodedSize(usize, u64),
    /// An unexpected bytes input size.
    #[error("got bytes with size {_0}, expected {_1}")]
    InvalidBytesInputSize(usize, u64),
    /// The shape of a value does not match the output shape of a selection.
    #[error("value shape {_0:?} does not match selection output shape {_1:?}")]
    InvalidValueShape(ArrayShape, ArrayShape),
    /// Incompatible element size.
    #[error("got element size {_0}, expected {_1}")]
    IncompatibleElementSize(usize, usize),
    /// Incompatible data type.
    #[error("got data type {_0}, expected {_1}")]
    IncompatibleDataType(DataType, DataType),
}

impl From<IndexerError> for ArrayError {
    fn from(error: IndexerError) -> Self {
        match error {
            IndexerError::Bounds(error) => Self::Bounds(error),
            IndexerError::InvalidSlice(error) => Self::InvalidSlice(error),
            IndexerError::TooManyIndices(error) => Self::TooManyIndices(error),
        }
    }
}

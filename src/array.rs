//! Zarr arrays.
//!
//! An array is defined by the parameters encoded in its `.zarray` JSON metadata:
//!  - **shape**: the length of the array dimensions,
//!  - **chunks**: the shape of the grid cells the array is subdivided into,
//!  - **dtype**: the numerical representation of array elements,
//!  - **fill_value**: an element value to use for uninitialised portions of the array,
//!  - **compressor**: the codec used to encode and decode chunks, and
//!  - **order**, **filters**, **dimension_separator**.
//!
//! See <https://zarr-specs.readthedocs.io/en/latest/v2/v2.0.html#arrays>.
//!
//! An *existing* array is initialised with [`Array::open`] or [`Array::open_read_only`]
//! with metadata read from the store; [`Array::new_with_metadata`] constructs an array
//! over a store from an in-memory [`ArrayMetadata`] (store it explicitly with
//! [`store_metadata`](Array::store_metadata)).
//!
//! Array data is accessed with [`retrieve_selection`](Array::retrieve_selection) and
//! [`store_selection`](Array::store_selection) and their `_elements`, `_ndarray` and
//! scalar variants, or chunk-at-a-time with [`retrieve_chunk`](Array::retrieve_chunk) and
//! [`store_chunk`](Array::store_chunk). Data is interchanged as [`NestedArray`] values.
//!
//! Within one operation, chunks are visited in lexicographic order over their grid
//! coordinates and store operations are issued strictly in that order. A single
//! [`Array`] makes no guarantees for concurrent callers mutating overlapping regions;
//! external synchronisation is required.

mod array_errors;
mod array_sync_readable;
mod array_sync_writable;
mod chunk_shape;
mod data_type;
mod fill_value;
mod nested_array;

use std::sync::Arc;

use thiserror::Error;

pub use self::{
    array_errors::{ArrayCreateError, ArrayError},
    chunk_shape::ChunkShape,
    data_type::{
        DataType, Endianness, IncompatibleFillValueMetadataError, UnsupportedDataTypeError,
    },
    fill_value::FillValue,
    nested_array::NestedArray,
};
pub use crate::metadata::ArrayMetadata;

use crate::{
    codec::Codec,
    metadata::{ChunkKeySeparator, Order},
    storage::{data_key, NodePath, StoreKey},
};

/// An ND index to an element in an array.
pub type ArrayIndices = Vec<u64>;

/// The shape of an array.
pub type ArrayShape = Vec<u64>;

/// A non zero error.
///
/// Returned when a zero value is converted to a non-zero type, as in the [`ChunkShape`]
/// `try_from` methods.
#[derive(Debug, Error)]
#[error("value must be non-zero")]
pub struct NonZeroError;

/// A Zarr V2 array.
///
/// The array metadata is parsed once at initialisation; shape and chunk grid are fixed
/// for the lifetime of the instance.
#[derive(Debug)]
pub struct Array<TStorage: ?Sized> {
    /// The storage backing the array.
    storage: Arc<TStorage>,
    /// The path of the array in the store.
    path: NodePath,
    /// The length of each dimension of the array.
    shape: ArrayShape,
    /// The shape of the chunk grid cells.
    chunks: ChunkShape,
    /// The element type of the array.
    data_type: DataType,
    /// The byte order of the stored elements. [`None`] for single byte elements.
    endianness: Option<Endianness>,
    /// The element value for uninitialised portions of the array, if any.
    fill_value: Option<FillValue>,
    /// The compressor applied to encoded chunks, if any.
    compressor: Option<Codec>,
    /// The separator between chunk grid coordinates in chunk keys.
    dimension_separator: ChunkKeySeparator,
    /// Whether write operations are rejected.
    read_only: bool,
    /// The underlying metadata, retained for round-tripping.
    metadata: ArrayMetadata,
}

impl<TStorage: ?Sized> Array<TStorage> {
    /// Create an array in `storage` at `path` from `metadata`.
    ///
    /// The metadata is validated but not written to the store; use
    /// [`store_metadata`](Array::store_metadata) to store it.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if the path is invalid or the metadata names an
    /// unsupported data type, codec or order, has an incompatible fill value, or has a
    /// chunk grid dimensionality mismatching the shape.
    pub fn new_with_metadata(
        storage: Arc<TStorage>,
        path: &str,
        metadata: ArrayMetadata,
    ) -> Result<Self, ArrayCreateError> {
        let path = NodePath::new(path)?;
        if metadata.shape.len() != metadata.chunks.len() {
            return Err(ArrayCreateError::InvalidChunkGridDimensionality(
                metadata.chunks.len(),
                metadata.shape.len(),
            ));
        }
        if metadata.order == Order::F {
            return Err(ArrayCreateError::UnsupportedOrder);
        }
        if metadata.filters.as_ref().is_some_and(|f| !f.is_empty()) {
            return Err(ArrayCreateError::UnsupportedFilters);
        }
        let (data_type, endianness) = DataType::from_dtype(&metadata.dtype)?;
        let fill_value = data_type.fill_value_from_metadata(&metadata.fill_value)?;
        let compressor = metadata
            .compressor
            .as_ref()
            .map(Codec::from_metadata)
            .transpose()?;
        Ok(Self {
            storage,
            path,
            shape: metadata.shape.clone(),
            chunks: metadata.chunks.clone(),
            data_type,
            endianness,
            fill_value,
            compressor,
            dimension_separator: metadata.dimension_separator,
            read_only: false,
            metadata,
        })
    }

    /// Return the shape of the array.
    #[must_use]
    pub fn shape(&self) -> &ArrayShape {
        &self.shape
    }

    /// Return the dimensionality of the array.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.shape.len()
    }

    /// Return the shape of the chunk grid cells.
    #[must_use]
    pub fn chunk_shape(&self) -> &ChunkShape {
        &self.chunks
    }

    /// Return the data type of the array.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Return the byte order of the stored elements. [`None`] for single byte elements.
    #[must_use]
    pub fn endianness(&self) -> Option<Endianness> {
        self.endianness
    }

    /// Return the fill value of the array, if any.
    #[must_use]
    pub fn fill_value(&self) -> Option<&FillValue> {
        self.fill_value.as_ref()
    }

    /// Return the path of the array in the store.
    #[must_use]
    pub fn path(&self) -> &NodePath {
        &self.path
    }

    /// Return the underlying metadata of the array.
    #[must_use]
    pub fn metadata(&self) -> &ArrayMetadata {
        &self.metadata
    }

    /// Returns true if the array rejects write operations.
    #[must_use]
    pub fn read_only(&self) -> bool {
        self.read_only
    }

    /// Return the shape of the chunk grid: `ceil(shape / chunks)` per axis.
    #[must_use]
    pub fn chunk_grid_shape(&self) -> ArrayShape {
        std::iter::zip(&self.shape, self.chunks.iter())
            .map(|(&shape, chunk)| shape.div_ceil(chunk.get()))
            .collect()
    }

    /// Return the store key of the chunk at `chunk_indices`.
    #[must_use]
    pub fn chunk_key(&self, chunk_indices: &[u64]) -> StoreKey {
        data_key(&self.path, chunk_indices, self.dimension_separator)
    }

    /// Validate that `chunk_indices` lie within the chunk grid.
    fn validate_chunk_indices(&self, chunk_indices: &[u64]) -> Result<(), ArrayError> {
        let grid_shape = self.chunk_grid_shape();
        if chunk_indices.len() == grid_shape.len()
            && std::iter::zip(chunk_indices, &grid_shape).all(|(index, len)| index < len)
        {
            Ok(())
        } else {
            Err(ArrayError::InvalidChunkGridIndices(chunk_indices.to_vec()))
        }
    }

    /// The number of bytes of a decoded chunk.
    fn chunk_byte_length(&self) -> u64 {
        self.chunks.num_elements() * self.data_type.size() as u64
    }

    /// A fill-value-initialised (or zeroed, if the fill value is null) chunk buffer.
    fn new_chunk_buffer(&self) -> Vec<u8> {
        let mut buffer = vec![0u8; usize::try_from(self.chunk_byte_length()).unwrap()];
        if let Some(fill_value) = &self.fill_value {
            for element in buffer.chunks_exact_mut(self.data_type.size()) {
                element.copy_from_slice(fill_value.as_le_bytes());
            }
        }
        buffer
    }
}

/// Validate that the size of `T` matches the element size of `data_type`.
pub(crate) fn validate_element_size<T>(data_type: DataType) -> Result<(), ArrayError> {
    if core::mem::size_of::<T>() == data_type.size() {
        Ok(())
    } else {
        Err(ArrayError::IncompatibleElementSize(
            core::mem::size_of::<T>(),
            data_type.size(),
        ))
    }
}

use std::sync::Arc;

use itertools::izip;

use crate::{
    indexing::{is_contiguous_selection, is_total_slice, BasicIndexer, Selection},
    metadata::ArrayMetadata,
    storage::{meta_key, NodePath, ReadableStorageTraits, StorageError, StoreKey},
};

use super::{
    data_type::reverse_endianness,
    nested_array::{c_order_strides, copy_region, fill_region},
    validate_element_size, Array, ArrayCreateError, ArrayError, Endianness, NestedArray,
};

impl<TStorage: ?Sized + ReadableStorageTraits> Array<TStorage> {
    /// Create an array in `storage` at `path`. The metadata is read from the store.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if there is a storage error, the metadata is missing,
    /// or the metadata is invalid.
    pub fn open(storage: Arc<TStorage>, path: &str) -> Result<Self, ArrayCreateError> {
        let node_path = NodePath::new(path)?;
        let key = meta_key(&node_path);
        let metadata_bytes = storage
            .get(&key)?
            .ok_or(ArrayCreateError::MissingMetadata)?;
        let metadata: ArrayMetadata = serde_json::from_slice(&metadata_bytes)
            .map_err(|err| StorageError::InvalidMetadata(key, err.to_string()))?;
        Self::new_with_metadata(storage, path, metadata)
    }

    /// Create a read-only array in `storage` at `path`. The metadata is read from the
    /// store.
    ///
    /// Write operations against the array fail with [`ArrayError::ReadOnly`].
    ///
    /// # Errors
    /// See [`Array::open`].
    pub fn open_read_only(storage: Arc<TStorage>, path: &str) -> Result<Self, ArrayCreateError> {
        let mut array = Self::open(storage, path)?;
        array.read_only = true;
        Ok(array)
    }

    /// Read and decode the region of the array selected by `selection`.
    ///
    /// Absent chunks read as the fill value; if the fill value is null, the corresponding
    /// output elements are left zero-initialised. Integer dimension selections drop the
    /// corresponding axis from the result; a selection of integers along every axis (or
    /// any selection against a zero-dimensional array) yields a rank-0 (scalar) result.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the selection is incompatible with the array shape,
    ///  - a chunk decodes to an unexpected size,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    ///
    /// # Panics
    /// Panics if the number of bytes of the output exceeds [`usize::MAX`].
    pub fn retrieve_selection(&self, selection: &Selection) -> Result<NestedArray, ArrayError> {
        let chunk_shape = self.chunks.to_array_shape();
        let indexer = BasicIndexer::new(selection, &self.shape, &chunk_shape)?;
        let out_shape = indexer.out_shape().to_vec();
        let mut out = NestedArray::new(self.data_type, out_shape.clone());
        if indexer.num_elements() == 0 {
            return Ok(out);
        }
        let element_size = self.data_type.size();
        let out_strides = c_order_strides(&out_shape);
        for projection in &indexer {
            let key = self.chunk_key(&projection.chunk_indices);
            match self.retrieve_and_decode_chunk_bytes(&key)? {
                None => {
                    if let Some(fill_value) = &self.fill_value {
                        fill_region(
                            out.bytes_mut(),
                            &out_shape,
                            &projection.out_selection,
                            fill_value.as_le_bytes(),
                        );
                    }
                }
                Some(chunk_bytes) => {
                    if is_total_slice(&projection.chunk_selection, &chunk_shape)
                        && is_contiguous_selection(&projection.out_selection, &out_shape)
                    {
                        // The whole decoded chunk lands on one contiguous output run.
                        let offset: u64 = izip!(&projection.out_selection, &out_strides)
                            .map(|(out_sel, stride)| out_sel.start() * stride)
                            .sum();
                        let offset = usize::try_from(offset).unwrap() * element_size;
                        out.bytes_mut()[offset..offset + chunk_bytes.len()]
                            .copy_from_slice(&chunk_bytes);
                    } else {
                        copy_region(
                            &chunk_bytes,
                            &chunk_shape,
                            &projection.chunk_selection,
                            out.bytes_mut(),
                            &out_shape,
                            &projection.out_selection,
                            element_size,
                        );
                    }
                }
            }
        }
        Ok(out)
    }

    /// Read and decode the region selected by `selection` into a vector of its elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data type size or
    /// an error condition in [`Array::retrieve_selection`].
    pub fn retrieve_selection_elements<T: bytemuck::Pod>(
        &self,
        selection: &Selection,
    ) -> Result<Vec<T>, ArrayError> {
        validate_element_size::<T>(self.data_type)?;
        self.retrieve_selection(selection)?.into_elements()
    }

    #[cfg(feature = "ndarray")]
    /// Read and decode the region selected by `selection` into an [`ndarray::ArrayD`].
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data type size or
    /// an error condition in [`Array::retrieve_selection`].
    pub fn retrieve_selection_ndarray<T: bytemuck::Pod>(
        &self,
        selection: &Selection,
    ) -> Result<ndarray::ArrayD<T>, ArrayError> {
        validate_element_size::<T>(self.data_type)?;
        self.retrieve_selection(selection)?.into_ndarray()
    }

    /// Read and decode the chunk at `chunk_indices`, or the fill value if it does not
    /// exist.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the chunk indices are invalid,
    ///  - the chunk does not exist and the array has no fill value,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_chunk(&self, chunk_indices: &[u64]) -> Result<NestedArray, ArrayError> {
        if let Some(chunk) = self.retrieve_chunk_if_exists(chunk_indices)? {
            Ok(chunk)
        } else if let Some(fill_value) = &self.fill_value {
            Ok(NestedArray::new_with_fill(
                self.data_type,
                self.chunks.to_array_shape(),
                fill_value,
            ))
        } else {
            Err(ArrayError::MissingChunk(self.chunk_key(chunk_indices)))
        }
    }

    /// Read and decode the chunk at `chunk_indices` if it exists.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the chunk indices are invalid,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_chunk_if_exists(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Option<NestedArray>, ArrayError> {
        self.validate_chunk_indices(chunk_indices)?;
        let key = self.chunk_key(chunk_indices);
        self.retrieve_and_decode_chunk_bytes(&key)?
            .map(|bytes| NestedArray::from_bytes(self.data_type, self.chunks.to_array_shape(), bytes))
            .transpose()
    }

    /// Read and decode the chunk at `chunk_indices` into a vector of its elements, or the
    /// fill value if it does not exist.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data type size or
    /// an error condition in [`Array::retrieve_chunk`].
    pub fn retrieve_chunk_elements<T: bytemuck::Pod>(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Vec<T>, ArrayError> {
        validate_element_size::<T>(self.data_type)?;
        self.retrieve_chunk(chunk_indices)?.into_elements()
    }

    /// Fetch a chunk and pass it through the compressor (identity if none), byte-swapping
    /// big-endian elements into little-endian order.
    pub(crate) fn retrieve_and_decode_chunk_bytes(
        &self,
        key: &StoreKey,
    ) -> Result<Option<Vec<u8>>, ArrayError> {
        let Some(encoded) = self.storage.get(key)? else {
            return Ok(None);
        };
        let mut bytes = match &self.compressor {
            Some(codec) => codec.decode(encoded.to_vec())?,
            None => encoded.to_vec(),
        };
        if self.endianness == Some(Endianness::Big) {
            reverse_endianness(&mut bytes, self.data_type.size());
        }
        if bytes.len() as u64 == self.chunk_byte_length() {
            Ok(Some(bytes))
        } else {
            Err(ArrayError::UnexpectedChunkDecodedSize(
                bytes.len(),
                self.chunk_byte_length(),
            ))
        }
    }
}

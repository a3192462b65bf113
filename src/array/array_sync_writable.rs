use crate::{
    indexing::{is_total_slice, BasicIndexer, Selection},
    storage::{meta_key, ReadableWritableStorageTraits, StorageError, WritableStorageTraits},
};

use super::{
    data_type::reverse_endianness,
    nested_array::{copy_region, fill_region},
    validate_element_size, Array, ArrayError, Endianness, NestedArray,
};

impl<TStorage: ?Sized + WritableStorageTraits> Array<TStorage> {
    /// Serialize the array metadata and store it under the `.zarray` key.
    ///
    /// # Errors
    /// Returns [`StorageError`] if the array is read-only or there is an underlying store
    /// error.
    pub fn store_metadata(&self) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::ReadOnly);
        }
        let metadata_bytes = serde_json::to_vec_pretty(&self.metadata)
            .map_err(|err| StorageError::Other(err.to_string()))?;
        self.storage.set(&meta_key(&self.path), metadata_bytes.into())
    }

    /// Encode `chunk` and store it at `chunk_indices`, replacing the whole chunk.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the array is read-only,
    ///  - the chunk indices are invalid,
    ///  - the chunk has a mismatching shape or data type,
    ///  - there is a codec encoding error, or
    ///  - an underlying store error.
    pub fn store_chunk(&self, chunk_indices: &[u64], chunk: &NestedArray) -> Result<(), ArrayError> {
        if self.read_only {
            return Err(ArrayError::ReadOnly);
        }
        self.validate_chunk_indices(chunk_indices)?;
        if chunk.data_type() != self.data_type {
            return Err(ArrayError::IncompatibleDataType(
                chunk.data_type(),
                self.data_type,
            ));
        }
        let chunk_shape = self.chunks.to_array_shape();
        if chunk.shape() != &chunk_shape {
            return Err(ArrayError::InvalidValueShape(
                chunk.shape().clone(),
                chunk_shape,
            ));
        }
        let encoded = self.encode_chunk_bytes(chunk.flatten())?;
        self.storage
            .set(&self.chunk_key(chunk_indices), encoded.into())?;
        Ok(())
    }

    /// Encode `elements` as a chunk and store it at `chunk_indices`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data type size or
    /// an error condition in [`Array::store_chunk`].
    pub fn store_chunk_elements<T: bytemuck::Pod>(
        &self,
        chunk_indices: &[u64],
        elements: &[T],
    ) -> Result<(), ArrayError> {
        let chunk =
            NestedArray::from_elements(self.data_type, self.chunks.to_array_shape(), elements)?;
        self.store_chunk(chunk_indices, &chunk)
    }

    /// Erase the chunk at `chunk_indices`.
    ///
    /// Succeeds if the chunk does not exist.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the array is read-only, the chunk indices are invalid,
    /// or there is an underlying store error.
    pub fn erase_chunk(&self, chunk_indices: &[u64]) -> Result<(), ArrayError> {
        if self.read_only {
            return Err(ArrayError::ReadOnly);
        }
        self.validate_chunk_indices(chunk_indices)?;
        self.storage.erase(&self.chunk_key(chunk_indices))?;
        Ok(())
    }

    /// Byte-swap little-endian elements into the stored byte order if required, then pass
    /// the chunk through the compressor (identity if none).
    pub(crate) fn encode_chunk_bytes(&self, mut bytes: Vec<u8>) -> Result<Vec<u8>, ArrayError> {
        if self.endianness == Some(Endianness::Big) {
            reverse_endianness(&mut bytes, self.data_type.size());
        }
        match &self.compressor {
            Some(codec) => Ok(codec.encode(bytes)?),
            None => Ok(bytes),
        }
    }
}

/// The source of the elements of a `store_selection` operation.
enum SelectionValue<'a> {
    /// An array of the selection's output shape.
    Array(&'a NestedArray),
    /// A single element broadcast over the whole selection.
    Scalar(Vec<u8>),
}

impl<TStorage: ?Sized + ReadableWritableStorageTraits> Array<TStorage> {
    /// Encode and store the region of the array selected by `selection` from `value`.
    ///
    /// The shape of `value` must equal the output shape of the selection (after integer
    /// selections drop axes). Chunks covered in their entirety are replaced without
    /// reading; partially covered chunks are read (or initialised from the fill value if
    /// absent), modified and written back.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the array is read-only,
    ///  - the selection is incompatible with the array shape,
    ///  - the value has a mismatching shape or data type,
    ///  - there is a codec error, or
    ///  - an underlying store error.
    pub fn store_selection(
        &self,
        selection: &Selection,
        value: &NestedArray,
    ) -> Result<(), ArrayError> {
        if value.data_type() != self.data_type {
            return Err(ArrayError::IncompatibleDataType(
                value.data_type(),
                self.data_type,
            ));
        }
        self.store_selection_inner(selection, &SelectionValue::Array(value))
    }

    /// Encode and store the region selected by `selection` from a flat C-order slice of
    /// elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data type size, the
    /// number of elements does not match the selection, or an error condition in
    /// [`Array::store_selection`].
    pub fn store_selection_elements<T: bytemuck::Pod>(
        &self,
        selection: &Selection,
        elements: Vec<T>,
    ) -> Result<(), ArrayError> {
        let chunk_shape = self.chunks.to_array_shape();
        let indexer = BasicIndexer::new(selection, &self.shape, &chunk_shape)?;
        let value =
            NestedArray::from_elements(self.data_type, indexer.out_shape().to_vec(), &elements)?;
        self.store_selection(selection, &value)
    }

    #[cfg(feature = "ndarray")]
    /// Encode and store the region selected by `selection` from an [`ndarray::ArrayD`].
    ///
    /// # Errors
    /// See [`Array::store_selection`].
    pub fn store_selection_ndarray<T: bytemuck::Pod>(
        &self,
        selection: &Selection,
        value: &ndarray::ArrayD<T>,
    ) -> Result<(), ArrayError> {
        let value = NestedArray::from_ndarray(self.data_type, value)?;
        self.store_selection(selection, &value)
    }

    /// Encode and store the region selected by `selection` with every element set to
    /// `value`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data type size or
    /// an error condition in [`Array::store_selection`].
    pub fn store_selection_scalar<T: bytemuck::Pod>(
        &self,
        selection: &Selection,
        value: T,
    ) -> Result<(), ArrayError> {
        validate_element_size::<T>(self.data_type)?;
        self.store_selection_inner(
            selection,
            &SelectionValue::Scalar(bytemuck::bytes_of(&value).to_vec()),
        )
    }

    fn store_selection_inner(
        &self,
        selection: &Selection,
        value: &SelectionValue,
    ) -> Result<(), ArrayError> {
        if self.read_only {
            return Err(ArrayError::ReadOnly);
        }
        let chunk_shape = self.chunks.to_array_shape();
        let indexer = BasicIndexer::new(selection, &self.shape, &chunk_shape)?;
        if let SelectionValue::Array(array) = value {
            if array.shape().as_slice() != indexer.out_shape() {
                return Err(ArrayError::InvalidValueShape(
                    array.shape().clone(),
                    indexer.out_shape().to_vec(),
                ));
            }
        }
        if indexer.num_elements() == 0 {
            return Ok(());
        }
        let element_size = self.data_type.size();
        for projection in &indexer {
            let key = self.chunk_key(&projection.chunk_indices);
            let chunk_bytes = if is_total_slice(&projection.chunk_selection, &chunk_shape) {
                // Whole chunk replacement: build a fresh buffer without reading.
                let mut buffer = vec![0u8; usize::try_from(self.chunk_byte_length()).unwrap()];
                match value {
                    SelectionValue::Array(array) => copy_region(
                        array.bytes(),
                        array.shape(),
                        &projection.out_selection,
                        &mut buffer,
                        &chunk_shape,
                        &projection.chunk_selection,
                        element_size,
                    ),
                    SelectionValue::Scalar(element) => {
                        for target in buffer.chunks_exact_mut(element_size) {
                            target.copy_from_slice(element);
                        }
                    }
                }
                buffer
            } else {
                // Read-modify-write; an absent chunk starts from the fill value.
                let mut buffer = match self.retrieve_and_decode_chunk_bytes(&key)? {
                    Some(bytes) => bytes,
                    None => self.new_chunk_buffer(),
                };
                match value {
                    SelectionValue::Array(array) => copy_region(
                        array.bytes(),
                        array.shape(),
                        &projection.out_selection,
                        &mut buffer,
                        &chunk_shape,
                        &projection.chunk_selection,
                        element_size,
                    ),
                    SelectionValue::Scalar(element) => fill_region(
                        &mut buffer,
                        &chunk_shape,
                        &projection.chunk_selection,
                        element,
                    ),
                }
                buffer
            };
            let encoded = self.encode_chunk_bytes(chunk_bytes)?;
            self.storage.set(&key, encoded.into())?;
        }
        Ok(())
    }
}

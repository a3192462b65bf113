use itertools::izip;

use crate::indexing::{BasicIndexer, DimProjection, Selection};

use super::{validate_element_size, ArrayError, ArrayShape, DataType, FillValue};

/// An in-memory n-dimensional array used as the data interchange type.
///
/// Elements are held in a single contiguous little-endian buffer in C order (the last
/// dimension varies fastest). A rank-0 array holds a single element and represents a
/// scalar; extract it with [`scalar`](NestedArray::scalar).
#[derive(Clone, Debug, PartialEq)]
pub struct NestedArray {
    data: Vec<u8>,
    shape: ArrayShape,
    data_type: DataType,
}

impl NestedArray {
    /// Create a new zero-initialised array.
    ///
    /// # Panics
    /// Panics if the number of bytes exceeds [`usize::MAX`].
    #[must_use]
    pub fn new(data_type: DataType, shape: ArrayShape) -> Self {
        let num_bytes = shape.iter().product::<u64>() * data_type.size() as u64;
        Self {
            data: vec![0; usize::try_from(num_bytes).unwrap()],
            shape,
            data_type,
        }
    }

    /// Create a new array with every element set to `fill_value`.
    ///
    /// # Panics
    /// Panics if the size of the fill value does not match the element size of
    /// `data_type` or the number of bytes exceeds [`usize::MAX`].
    #[must_use]
    pub fn new_with_fill(data_type: DataType, shape: ArrayShape, fill_value: &FillValue) -> Self {
        assert_eq!(fill_value.size(), data_type.size());
        let mut array = Self::new(data_type, shape);
        for element in array.data.chunks_exact_mut(data_type.size()) {
            element.copy_from_slice(fill_value.as_le_bytes());
        }
        array
    }

    /// Create an array wrapping a flat little-endian C-order buffer.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidBytesInputSize`] if the buffer length does not equal
    /// the product of the shape and the element size.
    pub fn from_bytes(
        data_type: DataType,
        shape: ArrayShape,
        data: Vec<u8>,
    ) -> Result<Self, ArrayError> {
        let expected = shape.iter().product::<u64>() * data_type.size() as u64;
        if data.len() as u64 == expected {
            Ok(Self {
                data,
                shape,
                data_type,
            })
        } else {
            Err(ArrayError::InvalidBytesInputSize(data.len(), expected))
        }
    }

    /// Create an array from a flat C-order slice of elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the element size of
    /// `data_type` or the number of elements does not equal the product of the shape.
    pub fn from_elements<T: bytemuck::Pod>(
        data_type: DataType,
        shape: ArrayShape,
        elements: &[T],
    ) -> Result<Self, ArrayError> {
        validate_element_size::<T>(data_type)?;
        Self::from_bytes(data_type, shape, bytemuck::cast_slice(elements).to_vec())
    }

    /// Return the shape of the array.
    #[must_use]
    pub fn shape(&self) -> &ArrayShape {
        &self.shape
    }

    /// Return the data type of the array.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Return the number of elements of the array.
    ///
    /// Equal to the product of the components of its shape; 1 for a rank-0 array.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.iter().product()
    }

    /// Return the underlying little-endian C-order bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the array and return the underlying bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Return a freshly allocated copy of the elements in C order.
    #[must_use]
    pub fn flatten(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// Return a copy of the elements in C order.
    ///
    /// # Errors
    /// Returns [`ArrayError::IncompatibleElementSize`] if the size of `T` does not match
    /// the element size of the array data type.
    pub fn to_elements<T: bytemuck::Pod>(&self) -> Result<Vec<T>, ArrayError> {
        validate_element_size::<T>(self.data_type)?;
        Ok(bytemuck::pod_collect_to_vec(&self.data))
    }

    /// Consume the array and return the elements in C order.
    ///
    /// # Errors
    /// Returns [`ArrayError::IncompatibleElementSize`] if the size of `T` does not match
    /// the element size of the array data type.
    pub fn into_elements<T: bytemuck::Pod>(self) -> Result<Vec<T>, ArrayError> {
        self.to_elements()
    }

    /// Return the single element of a rank-0 array.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the array is not rank-0 or the size of `T` does not
    /// match the element size of the array data type.
    pub fn scalar<T: bytemuck::Pod>(&self) -> Result<T, ArrayError> {
        validate_element_size::<T>(self.data_type)?;
        if self.shape.is_empty() {
            Ok(bytemuck::pod_read_unaligned(&self.data))
        } else {
            Err(ArrayError::InvalidValueShape(self.shape.clone(), vec![]))
        }
    }

    /// Return the region of the array selected by `selection`.
    ///
    /// Integer dimension selections drop the corresponding axis from the result; a
    /// selection of integers along every axis yields a rank-0 (scalar) array.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the selection is incompatible with the array shape.
    pub fn get(&self, selection: &Selection) -> Result<Self, ArrayError> {
        let chunk_shape = single_chunk_shape(&self.shape);
        let indexer = BasicIndexer::new(selection, &self.shape, &chunk_shape)?;
        let mut out = Self::new(self.data_type, indexer.out_shape().to_vec());
        let out_shape = out.shape.clone();
        for projection in &indexer {
            copy_region(
                &self.data,
                &self.shape,
                &projection.chunk_selection,
                &mut out.data,
                &out_shape,
                &projection.out_selection,
                self.data_type.size(),
            );
        }
        Ok(out)
    }

    /// Set the region of the array selected by `selection` from `value`.
    ///
    /// The shape of `value` must equal the output shape of the selection (after integer
    /// selections drop axes).
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the selection is incompatible with the array shape or
    /// the value has a mismatching shape or data type.
    pub fn set(&mut self, selection: &Selection, value: &NestedArray) -> Result<(), ArrayError> {
        if value.data_type != self.data_type {
            return Err(ArrayError::IncompatibleDataType(
                value.data_type,
                self.data_type,
            ));
        }
        let chunk_shape = single_chunk_shape(&self.shape);
        let indexer = BasicIndexer::new(selection, &self.shape, &chunk_shape)?;
        if value.shape != indexer.out_shape() {
            return Err(ArrayError::InvalidValueShape(
                value.shape.clone(),
                indexer.out_shape().to_vec(),
            ));
        }
        let shape = self.shape.clone();
        for projection in &indexer {
            copy_region(
                &value.data,
                &value.shape,
                &projection.out_selection,
                &mut self.data,
                &shape,
                &projection.chunk_selection,
                self.data_type.size(),
            );
        }
        Ok(())
    }

    /// Set every element of the region selected by `selection` to `value`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the selection is incompatible with the array shape or
    /// the size of `T` does not match the element size of the array data type.
    pub fn set_scalar<T: bytemuck::Pod>(
        &mut self,
        selection: &Selection,
        value: T,
    ) -> Result<(), ArrayError> {
        validate_element_size::<T>(self.data_type)?;
        let chunk_shape = single_chunk_shape(&self.shape);
        let indexer = BasicIndexer::new(selection, &self.shape, &chunk_shape)?;
        let shape = self.shape.clone();
        for projection in &indexer {
            fill_region(
                &mut self.data,
                &shape,
                &projection.chunk_selection,
                bytemuck::bytes_of(&value),
            );
        }
        Ok(())
    }

    #[cfg(feature = "ndarray")]
    /// Consume the array and return an [`ndarray::ArrayD`].
    ///
    /// # Errors
    /// Returns [`ArrayError::IncompatibleElementSize`] if the size of `T` does not match
    /// the element size of the array data type.
    ///
    /// # Panics
    /// Panics if a dimension exceeds [`usize::MAX`].
    pub fn into_ndarray<T: bytemuck::Pod>(self) -> Result<ndarray::ArrayD<T>, ArrayError> {
        let shape: Vec<usize> = self
            .shape
            .iter()
            .map(|&dimension| usize::try_from(dimension).unwrap())
            .collect();
        let elements = self.into_elements()?;
        Ok(ndarray::ArrayD::from_shape_vec(shape, elements)
            .expect("the buffer length matches the shape"))
    }

    #[cfg(feature = "ndarray")]
    /// Create an array from an [`ndarray::ArrayD`].
    ///
    /// # Errors
    /// Returns [`ArrayError::IncompatibleElementSize`] if the size of `T` does not match
    /// the element size of `data_type`.
    pub fn from_ndarray<T: bytemuck::Pod>(
        data_type: DataType,
        array: &ndarray::ArrayD<T>,
    ) -> Result<Self, ArrayError> {
        let shape: ArrayShape = array.shape().iter().map(|&dimension| dimension as u64).collect();
        let elements: Vec<T> = array.iter().copied().collect();
        Self::from_elements(data_type, shape, &elements)
    }
}

/// A chunk shape making a whole array a single chunk.
fn single_chunk_shape(shape: &[u64]) -> ArrayShape {
    shape.iter().map(|&dimension| dimension.max(1)).collect()
}

/// The C-order element strides of an array with `shape`.
pub(crate) fn c_order_strides(shape: &[u64]) -> Vec<u64> {
    let mut strides = vec![1; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }
    strides
}

/// Resolve a per-axis selection into a base element offset and the per-surviving-axis
/// (element step, count) pairs.
fn selected_axes(shape: &[u64], selection: &[DimProjection]) -> (i64, Vec<(i64, u64)>) {
    debug_assert_eq!(shape.len(), selection.len());
    let strides = c_order_strides(shape);
    let mut base = 0;
    let mut axes = Vec::with_capacity(selection.len());
    for (projection, &stride) in izip!(selection, &strides) {
        match projection {
            DimProjection::Index(index) => base += i64::try_from(index * stride).unwrap(),
            DimProjection::Slice { start, step, count } => {
                base += i64::try_from(start * stride).unwrap();
                axes.push((step * i64::try_from(stride).unwrap(), *count));
            }
        }
    }
    (base, axes)
}

fn copy_element(src: &[u8], src_index: i64, dst: &mut [u8], dst_index: i64, element_size: usize) {
    let src_offset = usize::try_from(src_index).unwrap() * element_size;
    let dst_offset = usize::try_from(dst_index).unwrap() * element_size;
    dst[dst_offset..dst_offset + element_size]
        .copy_from_slice(&src[src_offset..src_offset + element_size]);
}

/// Copy the elements selected by `src_selection` in `src` into the elements selected by
/// `dst_selection` in `dst`, in selection order.
///
/// The surviving axes of the two selections must pair up with equal counts. Contiguous
/// innermost runs on both sides are copied as single byte runs.
pub(crate) fn copy_region(
    src: &[u8],
    src_shape: &[u64],
    src_selection: &[DimProjection],
    dst: &mut [u8],
    dst_shape: &[u64],
    dst_selection: &[DimProjection],
    element_size: usize,
) {
    let (src_base, src_axes) = selected_axes(src_shape, src_selection);
    let (dst_base, dst_axes) = selected_axes(dst_shape, dst_selection);
    debug_assert_eq!(src_axes.len(), dst_axes.len());
    debug_assert!(izip!(&src_axes, &dst_axes).all(|(src, dst)| src.1 == dst.1));

    let counts: Vec<u64> = src_axes.iter().map(|&(_, count)| count).collect();
    if counts.contains(&0) {
        return;
    }
    let rank = counts.len();
    if rank == 0 {
        copy_element(src, src_base, dst, dst_base, element_size);
        return;
    }

    let inner_count = counts[rank - 1];
    let src_inner = src_axes[rank - 1].0;
    let dst_inner = dst_axes[rank - 1].0;
    let mut odometer = vec![0u64; rank - 1];
    loop {
        let mut src_offset = src_base;
        let mut dst_offset = dst_base;
        for (&index, &(src_step, _), &(dst_step, _)) in
            izip!(&odometer, &src_axes[..rank - 1], &dst_axes[..rank - 1])
        {
            src_offset += i64::try_from(index).unwrap() * src_step;
            dst_offset += i64::try_from(index).unwrap() * dst_step;
        }

        if src_inner == 1 && dst_inner == 1 {
            let src_offset = usize::try_from(src_offset).unwrap() * element_size;
            let dst_offset = usize::try_from(dst_offset).unwrap() * element_size;
            let num_bytes = usize::try_from(inner_count).unwrap() * element_size;
            dst[dst_offset..dst_offset + num_bytes]
                .copy_from_slice(&src[src_offset..src_offset + num_bytes]);
        } else {
            let mut src_index = src_offset;
            let mut dst_index = dst_offset;
            for _ in 0..inner_count {
                copy_element(src, src_index, dst, dst_index, element_size);
                src_index += src_inner;
                dst_index += dst_inner;
            }
        }

        // Advance the outer odometer, last axis fastest.
        let mut axis = rank - 1;
        loop {
            if axis == 0 {
                return;
            }
            axis -= 1;
            odometer[axis] += 1;
            if odometer[axis] < counts[axis] {
                break;
            }
            odometer[axis] = 0;
        }
    }
}

/// Set every element selected by `dst_selection` in `dst` to `element`.
pub(crate) fn fill_region(
    dst: &mut [u8],
    dst_shape: &[u64],
    dst_selection: &[DimProjection],
    element: &[u8],
) {
    let element_size = element.len();
    let (dst_base, dst_axes) = selected_axes(dst_shape, dst_selection);
    let counts: Vec<u64> = dst_axes.iter().map(|&(_, count)| count).collect();
    if counts.contains(&0) {
        return;
    }
    let rank = counts.len();
    if rank == 0 {
        let offset = usize::try_from(dst_base).unwrap() * element_size;
        dst[offset..offset + element_size].copy_from_slice(element);
        return;
    }

    let inner_count = counts[rank - 1];
    let dst_inner = dst_axes[rank - 1].0;
    let mut odometer = vec![0u64; rank - 1];
    loop {
        let mut dst_offset = dst_base;
        for (&index, &(dst_step, _)) in izip!(&odometer, &dst_axes[..rank - 1]) {
            dst_offset += i64::try_from(index).unwrap() * dst_step;
        }

        if dst_inner == 1 {
            let offset = usize::try_from(dst_offset).unwrap() * element_size;
            let num_bytes = usize::try_from(inner_count).unwrap() * element_size;
            for target in dst[offset..offset + num_bytes].chunks_exact_mut(element_size) {
                target.copy_from_slice(element);
            }
        } else {
            let mut dst_index = dst_offset;
            for _ in 0..inner_count {
                let offset = usize::try_from(dst_index).unwrap() * element_size;
                dst[offset..offset + element_size].copy_from_slice(element);
                dst_index += dst_inner;
            }
        }

        let mut axis = rank - 1;
        loop {
            if axis == 0 {
                return;
            }
            axis -= 1;
            odometer[axis] += 1;
            if odometer[axis] < counts[axis] {
                break;
            }
            odometer[axis] = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::indexing::{DimSelection, Slice};

    use super::*;

    fn iota(shape: &[u64]) -> NestedArray {
        let num_elements = shape.iter().product::<u64>();
        let elements: Vec<i32> = (0..i32::try_from(num_elements).unwrap()).collect();
        NestedArray::from_elements(DataType::Int32, shape.to_vec(), &elements).unwrap()
    }

    #[test]
    fn nested_array_construction() {
        let array = NestedArray::new(DataType::UInt16, vec![2, 3]);
        assert_eq!(array.num_elements(), 6);
        assert_eq!(array.bytes().len(), 12);
        let array = NestedArray::new_with_fill(DataType::UInt16, vec![2], &FillValue::from(7u16));
        assert_eq!(array.to_elements::<u16>().unwrap(), [7, 7]);
        assert!(NestedArray::from_bytes(DataType::UInt16, vec![2], vec![0; 3]).is_err());
        assert!(
            NestedArray::from_elements(DataType::UInt16, vec![2], &[1u8, 2]).is_err()
        );
    }

    #[test]
    fn get_1d_slice() {
        let array = iota(&[3]);
        let out = array.get(&Slice::from(1..3).into()).unwrap();
        assert_eq!(out.shape(), &[2]);
        assert_eq!(out.to_elements::<i32>().unwrap(), [1, 2]);
    }

    #[test]
    fn get_1d_reversed() {
        let array = iota(&[5]);
        let out = array
            .get(&Slice::full().with_step(-1).into())
            .unwrap();
        assert_eq!(out.shape(), &[5]);
        assert_eq!(out.to_elements::<i32>().unwrap(), [4, 3, 2, 1, 0]);
    }

    #[test]
    fn get_1d_reversed_strided() {
        let array = iota(&[5]);
        let out = array
            .get(&Slice::new(Some(4), Some(0), Some(-2)).into())
            .unwrap();
        assert_eq!(out.shape(), &[2]);
        assert_eq!(out.to_elements::<i32>().unwrap(), [4, 2]);
    }

    #[test]
    fn get_2d_drops_integer_axis() {
        let array = iota(&[2, 3]);
        let out = array
            .get(&Selection::from(vec![
                DimSelection::Index(0),
                DimSelection::Slice(Slice::full().with_step(-1)),
            ]))
            .unwrap();
        assert_eq!(out.shape(), &[3]);
        assert_eq!(out.to_elements::<i32>().unwrap(), [2, 1, 0]);
    }

    #[test]
    fn get_2d_scalar() {
        let array = iota(&[2, 3]);
        let out = array
            .get(&Selection::from(vec![
                DimSelection::Index(-2),
                DimSelection::Index(-1),
            ]))
            .unwrap();
        assert!(out.shape().is_empty());
        assert_eq!(out.scalar::<i32>().unwrap(), 2);
        assert!(array.get(&Selection::from(0)).unwrap().scalar::<i32>().is_err());
    }

    #[test]
    fn get_4d_mixed() {
        let array = iota(&[1, 2, 2, 4]);
        let out = array
            .get(&Selection::from(vec![
                DimSelection::Full,
                DimSelection::Slice(Slice::full().with_step(-5)),
                DimSelection::Full,
                DimSelection::Slice(Slice::from(0..2)),
            ]))
            .unwrap();
        assert_eq!(out.shape(), &[1, 1, 2, 2]);
        assert_eq!(out.to_elements::<i32>().unwrap(), [8, 9, 12, 13]);
    }

    #[test]
    fn get_empty_slice() {
        let array = iota(&[2, 3]);
        let out = array.get(&Slice::from(0..0).into()).unwrap();
        assert_eq!(out.shape(), &[0, 3]);
        assert_eq!(out.num_elements(), 0);
    }

    #[test]
    fn get_empty_slice_4d() {
        let array = iota(&[1, 2, 2, 4]);
        let out = array
            .get(&Selection::from(vec![
                DimSelection::Index(0),
                DimSelection::Slice(Slice::from(5..5)),
                DimSelection::Full,
            ]))
            .unwrap();
        assert_eq!(out.shape(), &[0, 2, 4]);
        assert_eq!(out.num_elements(), 0);
    }

    #[test]
    fn get_out_of_bounds_index() {
        let array = iota(&[2, 3]);
        assert!(array.get(&Selection::from(2)).is_err());
        assert!(array.get(&Selection::from(-3)).is_err());
    }

    #[test]
    fn set_subregion_preserves_rest() {
        let mut array = iota(&[2, 3]);
        let value = NestedArray::from_elements(DataType::Int32, vec![2, 1], &[7, 8]).unwrap();
        array
            .set(
                &Selection::from(vec![DimSelection::Full, DimSelection::from(1..2)]),
                &value,
            )
            .unwrap();
        assert_eq!(array.to_elements::<i32>().unwrap(), [0, 7, 2, 3, 8, 5]);
    }

    #[test]
    fn set_shape_mismatch() {
        let mut array = iota(&[2, 3]);
        let value = NestedArray::from_elements(DataType::Int32, vec![2], &[7, 8]).unwrap();
        assert!(array
            .set(
                &Selection::from(vec![DimSelection::Full, DimSelection::from(1..2)]),
                &value,
            )
            .is_err());
    }

    #[test]
    fn set_scalar_broadcast() {
        let mut array = iota(&[2, 3]);
        array
            .set_scalar(&Selection::from(Slice::from(..2)), -1i32)
            .unwrap();
        assert_eq!(array.to_elements::<i32>().unwrap(), [-1, -1, -1, -1, -1, -1]);
        let mut array = iota(&[2, 3]);
        array
            .set_scalar(
                &Selection::from(vec![DimSelection::Index(1), DimSelection::from(..2)]),
                -1i32,
            )
            .unwrap();
        assert_eq!(array.to_elements::<i32>().unwrap(), [0, 1, 2, -1, -1, 5]);
    }

    #[test]
    fn set_reversed_matches_get() {
        // Writing through a reversed selection then reading it back round-trips.
        let mut array = iota(&[5]);
        let value = NestedArray::from_elements(DataType::Int32, vec![5], &[10, 11, 12, 13, 14])
            .unwrap();
        let selection = Selection::from(Slice::full().with_step(-1));
        array.set(&selection, &value).unwrap();
        assert_eq!(array.to_elements::<i32>().unwrap(), [14, 13, 12, 11, 10]);
        let out = array.get(&selection).unwrap();
        assert_eq!(out.to_elements::<i32>().unwrap(), [10, 11, 12, 13, 14]);
    }

    #[test]
    fn get_does_not_alias() {
        let mut array = iota(&[3]);
        let out = array.get(&Selection::all()).unwrap();
        array.set_scalar(&Selection::all(), 9i32).unwrap();
        assert_eq!(out.to_elements::<i32>().unwrap(), [0, 1, 2]);
    }

    #[cfg(feature = "ndarray")]
    #[test]
    fn ndarray_round_trip() {
        let array = iota(&[2, 3]);
        let nd = array.clone().into_ndarray::<i32>().unwrap();
        assert_eq!(nd, ndarray::array![[0, 1, 2], [3, 4, 5]].into_dyn());
        let back = NestedArray::from_ndarray(DataType::Int32, &nd).unwrap();
        assert_eq!(back, array);
    }
}

use std::num::NonZeroU64;

use derive_more::{Deref, From};
use serde::{Deserialize, Serialize};

use super::{ArrayShape, NonZeroError};

/// The shape of a chunk grid cell. All dimensions are non-zero.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, Deref, From)]
#[serde(transparent)]
pub struct ChunkShape(Vec<NonZeroU64>);

impl ChunkShape {
    /// Convert to an [`ArrayShape`].
    #[must_use]
    pub fn to_array_shape(&self) -> ArrayShape {
        self.0.iter().map(|dimension| dimension.get()).collect()
    }

    /// Return the number of elements of a chunk.
    ///
    /// Equal to the product of the components of the shape.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.0.iter().map(|dimension| dimension.get()).product()
    }
}

impl TryFrom<Vec<u64>> for ChunkShape {
    type Error = NonZeroError;

    fn try_from(shape: Vec<u64>) -> Result<Self, Self::Error> {
        shape
            .into_iter()
            .map(|dimension| NonZeroU64::new(dimension).ok_or(NonZeroError))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl TryFrom<&[u64]> for ChunkShape {
    type Error = NonZeroError;

    fn try_from(shape: &[u64]) -> Result<Self, Self::Error> {
        shape.to_vec().try_into()
    }
}

impl<const N: usize> TryFrom<[u64; N]> for ChunkShape {
    type Error = NonZeroError;

    fn try_from(shape: [u64; N]) -> Result<Self, Self::Error> {
        shape.to_vec().try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_shape_try_from() {
        let shape = ChunkShape::try_from(vec![2, 3]).unwrap();
        assert_eq!(shape.to_array_shape(), vec![2, 3]);
        assert_eq!(shape.num_elements(), 6);
        assert!(ChunkShape::try_from(vec![2, 0]).is_err());
        assert_eq!(ChunkShape::try_from(Vec::<u64>::new()).unwrap().num_elements(), 1);
    }
}

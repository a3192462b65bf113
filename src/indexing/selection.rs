use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use super::Slice;

/// A selection of one array dimension.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DimSelection {
    /// The full extent of the dimension.
    Full,
    /// A single index. Negative values count back from the end of the dimension.
    ///
    /// The dimension is dropped from the result.
    Index(i64),
    /// A [`Slice`] of the dimension.
    Slice(Slice),
}

impl From<i64> for DimSelection {
    fn from(index: i64) -> Self {
        Self::Index(index)
    }
}

impl From<Slice> for DimSelection {
    fn from(slice: Slice) -> Self {
        Self::Slice(slice)
    }
}

impl From<Range<i64>> for DimSelection {
    fn from(range: Range<i64>) -> Self {
        Self::Slice(range.into())
    }
}

impl From<RangeFrom<i64>> for DimSelection {
    fn from(range: RangeFrom<i64>) -> Self {
        Self::Slice(range.into())
    }
}

impl From<RangeTo<i64>> for DimSelection {
    fn from(range: RangeTo<i64>) -> Self {
        Self::Slice(range.into())
    }
}

impl From<RangeFull> for DimSelection {
    fn from(_: RangeFull) -> Self {
        Self::Full
    }
}

/// An n-dimensional selection: one [`DimSelection`] per axis.
///
/// A selection may have fewer dimension selections than the array it is applied to;
/// trailing axes are treated as [`DimSelection::Full`].
/// A bare integer or a bare [`Slice`] converts into a single entry selection.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Selection(Vec<DimSelection>);

impl Selection {
    /// Create a new selection from dimension selections.
    #[must_use]
    pub fn new(dims: Vec<DimSelection>) -> Self {
        Self(dims)
    }

    /// Create a selection covering a whole array of any dimensionality.
    #[must_use]
    pub fn all() -> Self {
        Self(vec![])
    }

    /// Return the dimension selections.
    #[must_use]
    pub fn dims(&self) -> &[DimSelection] {
        &self.0
    }
}

impl From<Vec<DimSelection>> for Selection {
    fn from(dims: Vec<DimSelection>) -> Self {
        Self(dims)
    }
}

impl<const N: usize> From<[DimSelection; N]> for Selection {
    fn from(dims: [DimSelection; N]) -> Self {
        Self(dims.to_vec())
    }
}

impl FromIterator<DimSelection> for Selection {
    fn from_iter<T: IntoIterator<Item = DimSelection>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<DimSelection> for Selection {
    fn from(dim: DimSelection) -> Self {
        Self(vec![dim])
    }
}

impl From<i64> for Selection {
    fn from(index: i64) -> Self {
        Self(vec![index.into()])
    }
}

impl From<Slice> for Selection {
    fn from(slice: Slice) -> Self {
        Self(vec![slice.into()])
    }
}

impl From<Range<i64>> for Selection {
    fn from(range: Range<i64>) -> Self {
        Self(vec![range.into()])
    }
}

impl From<RangeFrom<i64>> for Selection {
    fn from(range: RangeFrom<i64>) -> Self {
        Self(vec![range.into()])
    }
}

impl From<RangeTo<i64>> for Selection {
    fn from(range: RangeTo<i64>) -> Self {
        Self(vec![range.into()])
    }
}

impl From<RangeFull> for Selection {
    fn from(_: RangeFull) -> Self {
        Self(vec![DimSelection::Full])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_conversions() {
        assert_eq!(Selection::from(1).dims(), [DimSelection::Index(1)]);
        assert_eq!(
            Selection::from(Slice::from(1..3)).dims(),
            [DimSelection::Slice(Slice::from(1..3))]
        );
        assert_eq!(
            Selection::from(vec![DimSelection::Index(0), DimSelection::Full]).dims(),
            [DimSelection::Index(0), DimSelection::Full]
        );
        assert_eq!(
            Selection::from([DimSelection::from(..), DimSelection::from(1..)]).dims(),
            [DimSelection::Full, DimSelection::Slice(Slice::from(1..))]
        );
        assert!(Selection::all().dims().is_empty());
    }
}

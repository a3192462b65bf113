use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use thiserror::Error;

/// A slice of one array dimension with NumPy semantics.
///
/// Fields left as [`None`] take their defaults on [`normalization`](Slice::normalize):
/// `step` defaults to `1`; `start` and `stop` default to the whole dimension in the
/// direction of `step`. Negative `start`/`stop` count back from the end of the dimension
/// and out-of-range values are clamped, not rejected.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Slice {
    /// The first index of the slice.
    pub start: Option<i64>,
    /// The exclusive end index of the slice.
    pub stop: Option<i64>,
    /// The step between indices. Must not be zero. Negative steps iterate in reverse.
    pub step: Option<i64>,
}

impl core::fmt::Display for Slice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let field = |v: Option<i64>| v.map_or(String::new(), |v| v.to_string());
        write!(
            f,
            "{}:{}:{}",
            field(self.start),
            field(self.stop),
            field(self.step)
        )
    }
}

impl Slice {
    /// Create a new slice.
    #[must_use]
    pub const fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        Self { start, stop, step }
    }

    /// Create a slice covering a whole dimension.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            start: None,
            stop: None,
            step: None,
        }
    }

    /// Return this slice with `step`.
    #[must_use]
    pub const fn with_step(mut self, step: i64) -> Self {
        self.step = Some(step);
        self
    }

    /// Normalize the slice against a dimension of length `len`.
    ///
    /// Produces the concrete `(start, stop, step)` triple and the number of yielded
    /// elements, directly usable as a for-loop descriptor.
    ///
    /// # Errors
    /// Returns [`InvalidSliceError`] if the step is zero.
    ///
    /// # Panics
    /// Panics if `len` exceeds [`i64::MAX`].
    pub fn normalize(&self, len: u64) -> Result<NormalizedSlice, InvalidSliceError> {
        let len = i64::try_from(len).unwrap();
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(InvalidSliceError(*self));
        }

        let wrap = |index: i64| if index < 0 { index + len } else { index };
        let (start, stop, count);
        if step > 0 {
            start = self.start.map_or(0, wrap).clamp(0, len);
            stop = self.stop.map_or(len, wrap).clamp(0, len);
            count = if stop > start {
                ((stop - start + step - 1) / step).unsigned_abs()
            } else {
                0
            };
        } else {
            start = self.start.map_or(len - 1, wrap).clamp(-1, len - 1);
            stop = self.stop.map_or(-1, wrap).clamp(-1, len - 1);
            count = if start > stop {
                ((start - stop - step - 1) / -step).unsigned_abs()
            } else {
                0
            };
        }
        Ok(NormalizedSlice {
            start,
            stop,
            step,
            count,
        })
    }
}

impl From<Range<i64>> for Slice {
    fn from(range: Range<i64>) -> Self {
        Self::new(Some(range.start), Some(range.end), None)
    }
}

impl From<RangeFrom<i64>> for Slice {
    fn from(range: RangeFrom<i64>) -> Self {
        Self::new(Some(range.start), None, None)
    }
}

impl From<RangeTo<i64>> for Slice {
    fn from(range: RangeTo<i64>) -> Self {
        Self::new(None, Some(range.end), None)
    }
}

impl From<RangeFull> for Slice {
    fn from(_: RangeFull) -> Self {
        Self::full()
    }
}

/// A slice in concrete, sign-aware form.
///
/// The selected indices are `start + k * step` for `k` in `0..count`, all within
/// `[0, len)` of the dimension the slice was normalized against.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NormalizedSlice {
    /// The first index.
    pub start: i64,
    /// The exclusive end index. `-1` for a negative step reaching the start of the dimension.
    pub stop: i64,
    /// The step. Non-zero.
    pub step: i64,
    /// The number of yielded elements.
    pub count: u64,
}

/// Normalize an integer index against a dimension of length `len`.
///
/// A negative index counts back from the end of the dimension.
///
/// # Errors
/// Returns [`BoundsCheckError`] if the index is outside `[-len, len)`.
///
/// # Panics
/// Panics if `len` exceeds [`i64::MAX`].
pub fn normalize_index(index: i64, len: u64) -> Result<u64, BoundsCheckError> {
    let len = i64::try_from(len).unwrap();
    let wrapped = if index < 0 { index + len } else { index };
    if (0..len).contains(&wrapped) {
        Ok(wrapped.unsigned_abs())
    } else {
        Err(BoundsCheckError(index, len.unsigned_abs()))
    }
}

/// An out of bounds index error.
#[derive(Clone, Copy, Debug, Error)]
#[error("index {_0} is out of bounds for a dimension of length {_1}")]
pub struct BoundsCheckError(i64, u64);

impl BoundsCheckError {
    /// Create a new bounds check error.
    #[must_use]
    pub const fn new(index: i64, len: u64) -> Self {
        Self(index, len)
    }
}

/// An invalid slice error.
#[derive(Clone, Copy, Debug, Error)]
#[error("invalid slice {_0}: step must be non-zero")]
pub struct InvalidSliceError(Slice);

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(slice: Slice, len: u64) -> (i64, i64, i64, u64) {
        let n = slice.normalize(len).unwrap();
        (n.start, n.stop, n.step, n.count)
    }

    #[test]
    fn slice_normalize_defaults() {
        assert_eq!(normalized(Slice::full(), 5), (0, 5, 1, 5));
        assert_eq!(normalized(Slice::full().with_step(-1), 5), (4, -1, -1, 5));
        assert_eq!(normalized(Slice::full(), 0), (0, 0, 1, 0));
        assert_eq!(normalized(Slice::full().with_step(-1), 0), (-1, -1, -1, 0));
    }

    #[test]
    fn slice_normalize_forward() {
        assert_eq!(normalized(Slice::from(1..3), 3), (1, 3, 1, 2));
        assert_eq!(normalized(Slice::from(0..0), 3), (0, 0, 1, 0));
        assert_eq!(normalized(Slice::from(2..), 5), (2, 5, 1, 3));
        assert_eq!(normalized(Slice::from(..2), 5), (0, 2, 1, 2));
        assert_eq!(normalized(Slice::from(0..5).with_step(2), 5), (0, 5, 2, 3));
        assert_eq!(normalized(Slice::from(0..4).with_step(2), 5), (0, 4, 2, 2));
    }

    #[test]
    fn slice_normalize_negative_indices() {
        assert_eq!(normalized(Slice::from(-2..), 5), (3, 5, 1, 2));
        assert_eq!(normalized(Slice::from(..-1), 5), (0, 4, 1, 4));
        assert_eq!(
            normalized(Slice::new(Some(-1), None, Some(-1)), 5),
            (4, -1, -1, 5)
        );
        assert_eq!(
            normalized(Slice::new(Some(-1), Some(-3), Some(-1)), 5),
            (4, 2, -1, 2)
        );
    }

    #[test]
    fn slice_normalize_clamping() {
        assert_eq!(normalized(Slice::from(0..100), 5), (0, 5, 1, 5));
        assert_eq!(normalized(Slice::from(-100..100), 5), (0, 5, 1, 5));
        assert_eq!(normalized(Slice::from(7..9), 5), (5, 5, 1, 0));
        assert_eq!(
            normalized(Slice::new(Some(100), None, Some(-1)), 5),
            (4, -1, -1, 5)
        );
        assert_eq!(
            normalized(Slice::new(Some(-100), None, Some(-1)), 5),
            (-1, -1, -1, 0)
        );
    }

    #[test]
    fn slice_normalize_negative_step() {
        assert_eq!(
            normalized(Slice::new(Some(4), Some(0), Some(-2)), 5),
            (4, 0, -2, 2)
        );
        assert_eq!(
            normalized(Slice::new(None, None, Some(-5)), 2),
            (1, -1, -5, 1)
        );
    }

    #[test]
    fn slice_zero_step() {
        assert!(Slice::full().with_step(0).normalize(5).is_err());
    }

    #[test]
    fn index_normalize() {
        assert_eq!(normalize_index(0, 3).unwrap(), 0);
        assert_eq!(normalize_index(2, 3).unwrap(), 2);
        assert_eq!(normalize_index(-1, 3).unwrap(), 2);
        assert_eq!(normalize_index(-3, 3).unwrap(), 0);
        assert!(normalize_index(3, 3).is_err());
        assert!(normalize_index(-4, 3).is_err());
        assert_eq!(
            normalize_index(3, 3).unwrap_err().to_string(),
            "index 3 is out of bounds for a dimension of length 3"
        );
    }
}

//! A Rust library for the [Zarr V2](https://zarr-specs.readthedocs.io/en/latest/v2/v2.0.html) storage format for chunked, compressed, multidimensional arrays.
//!
//! An array is backed by a key-value store: a JSON `.zarray` document describes its shape,
//! chunk grid, element type, fill value and compressor, and the bulk data lives in per-chunk
//! byte blobs addressed by chunk grid coordinates.
//! Clients read and write arbitrary hyper-rectangular regions with NumPy-compatible
//! selections (slices with negative steps and negative indices, integer indices that drop
//! dimensions) and the library translates those requests into the minimal set of chunk
//! loads, decodes, partial writes and encodes.
//!
//! ## Features
//! All features are enabled by default.
//!  - Compressors: `zlib`, `gzip`.
//!  - `ndarray`: adds [`ndarray`] utility functions to [`Array`](crate::array::Array) and
//!    [`NestedArray`](crate::array::NestedArray).
//!
//! ## Implementation Status
//! - [x] Selections: slices (positive and negative steps), integer indices, full axes.
//! - [x] Data types: `u1`, `i1`, `u2`, `i2`, `u4`, `i4`, `f4`, `f8` (little- or big-endian).
//! - [x] Fill values: numbers, `NaN`, `Infinity`, `-Infinity`, null.
//! - [x] Stores: [`memory`](crate::storage::store::MemoryStore).
//! - [ ] Groups, `.zattrs` attributes, consolidated metadata.
//! - [ ] Filters, `F`-order chunks.
//!
//! ## Example
//! ```
//! # use std::sync::Arc;
//! use zarr2::array::{Array, ArrayMetadata};
//! use zarr2::indexing::{Selection, Slice};
//! use zarr2::metadata::FillValueMetadata;
//! use zarr2::storage::store::MemoryStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let metadata = ArrayMetadata::new(
//!     vec![8, 8],
//!     vec![4, 4].try_into()?,
//!     "<i4",
//!     FillValueMetadata::Number(0.into()),
//! );
//! let array = Array::new_with_metadata(store, "/array", metadata)?;
//! array.store_metadata()?;
//!
//! array.store_selection_elements::<i32>(
//!     &Selection::from(vec![Slice::from(0..2).into(), Slice::from(0..2).into()]),
//!     vec![1, 2, 3, 4],
//! )?;
//! let elements = array.retrieve_selection_elements::<i32>(&Selection::from(0))?;
//! assert_eq!(&elements[..2], [1, 2]);
//! # Ok(())
//! # }
//! ```

#![warn(unused_variables)]
#![warn(dead_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![deny(clippy::missing_panics_doc)]

pub mod array;
pub mod codec;
pub mod indexing;
pub mod metadata;
pub mod storage;

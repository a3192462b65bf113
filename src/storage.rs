//! The storage API for accessing the key-value stores backing arrays.
//!
//! Narrowly scoped traits define the storage operations the array engine consumes:
//! [`ReadableStorageTraits`], [`WritableStorageTraits`] and [`ListableStorageTraits`].
//! Keys are slash-delimited strings validated by [`StoreKey`] and [`StorePrefix`].
//!
//! This crate bundles a single store implementation, the in-memory
//! [`MemoryStore`](store::MemoryStore).

pub mod store;

mod store_key;
mod store_prefix;

pub use store_key::{StoreKey, StoreKeyError, StoreKeys};
pub use store_prefix::{StorePrefix, StorePrefixError, StorePrefixes};

use derive_more::Display;
use thiserror::Error;

use crate::metadata::ChunkKeySeparator;

/// The byte value of a store key.
pub type Bytes = bytes::Bytes;

/// [`Bytes`] or [`None`] for a missing store key.
pub type MaybeBytes = Option<Bytes>;

/// Readable storage traits.
pub trait ReadableStorageTraits: Send + Sync {
    /// Retrieve the value (bytes) associated with a given [`StoreKey`].
    ///
    /// Returns [`None`] if the key is not found.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying error with the store.
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError>;

    /// Returns true if the store contains `key`.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying error with the store.
    fn contains(&self, key: &StoreKey) -> Result<bool, StorageError> {
        Ok(self.get(key)?.is_some())
    }

    /// Return the size in bytes of the value at `key`.
    ///
    /// Returns [`None`] if the key is not found.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying error with the store.
    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        Ok(self.get(key)?.map(|bytes| bytes.len() as u64))
    }
}

/// Writable storage traits.
pub trait WritableStorageTraits: Send + Sync {
    /// Store bytes at a [`StoreKey`].
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying error with the store.
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError>;

    /// Erase a [`StoreKey`].
    ///
    /// Succeeds if the key does not exist.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying error with the store.
    fn erase(&self, key: &StoreKey) -> Result<(), StorageError>;
}

/// Readable and writable storage traits.
///
/// Implemented for any store that is both readable and writable; required for
/// read-modify-write operations such as
/// [`store_selection`](crate::array::Array::store_selection).
pub trait ReadableWritableStorageTraits: ReadableStorageTraits + WritableStorageTraits {}

impl<T: ?Sized + ReadableStorageTraits + WritableStorageTraits> ReadableWritableStorageTraits
    for T
{
}

/// Listable storage traits.
pub trait ListableStorageTraits: Send + Sync {
    /// Retrieve all [`StoreKeys`] in the store.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying error with the store.
    fn list(&self) -> Result<StoreKeys, StorageError>;

    /// Retrieve all [`StoreKeys`] with a given [`StorePrefix`].
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying error with the store.
    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError>;

    /// Retrieve the keys and prefixes of a directory, non-recursively.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying error with the store.
    fn list_dir(&self, prefix: &StorePrefix) -> Result<StoreKeysPrefixes, StorageError>;
}

/// The [`StoreKeys`] and [`StorePrefixes`] of a directory.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StoreKeysPrefixes {
    pub(crate) keys: StoreKeys,
    pub(crate) prefixes: StorePrefixes,
}

impl StoreKeysPrefixes {
    /// Returns the keys.
    #[must_use]
    pub fn keys(&self) -> &StoreKeys {
        &self.keys
    }

    /// Returns the prefixes.
    #[must_use]
    pub fn prefixes(&self) -> &StorePrefixes {
        &self.prefixes
    }
}

/// A storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A write operation was attempted on a read only store.
    #[error("a write operation was attempted on a read only store")]
    ReadOnly,
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// An error parsing the metadata for a key.
    #[error("error parsing metadata for {_0}: {_1}")]
    InvalidMetadata(StoreKey, String),
    /// An invalid store prefix.
    #[error(transparent)]
    StorePrefixError(#[from] StorePrefixError),
    /// An invalid store key.
    #[error(transparent)]
    InvalidStoreKey(#[from] StoreKeyError),
    /// An invalid node path.
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// Any other error.
    #[error("{_0}")]
    Other(String),
}

impl From<&str> for StorageError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for StorageError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

/// The path of an array node in a store.
///
/// A path is `/` (the root node) or a `/` separated sequence of non-empty components,
/// starting with `/` and not ending with one.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub struct NodePath(String);

/// An invalid node path.
#[derive(Debug, Error)]
#[error("invalid node path {_0}")]
pub struct NodePathError(String);

impl NodePath {
    /// Create a new node path from `path`.
    ///
    /// # Errors
    /// Returns [`NodePathError`] if `path` is not valid.
    pub fn new(path: &str) -> Result<Self, NodePathError> {
        if Self::validate(path) {
            Ok(Self(path.to_string()))
        } else {
            Err(NodePathError(path.to_string()))
        }
    }

    /// The root node path.
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Extracts a string slice of the underlying path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validates a node path.
    #[must_use]
    pub fn validate(path: &str) -> bool {
        path == "/"
            || (path.starts_with('/') && !path.ends_with('/') && !path.contains("//"))
    }
}

impl TryFrom<&str> for NodePath {
    type Error = NodePathError;

    fn try_from(path: &str) -> Result<Self, Self::Error> {
        Self::new(path)
    }
}

/// Return the `.zarray` array metadata key for the array at `path`.
#[must_use]
pub fn meta_key(path: &NodePath) -> StoreKey {
    let path = path.as_str().strip_prefix('/').unwrap_or(path.as_str());
    if path.is_empty() {
        unsafe { StoreKey::new_unchecked(".zarray".to_string()) }
    } else {
        unsafe { StoreKey::new_unchecked(format!("{path}/.zarray")) }
    }
}

/// Return the data key for the chunk at `chunk_indices` of the array at `path`.
///
/// The chunk part of the key is the `separator` joined grid coordinates, or `0` for a
/// zero-dimensional array.
#[must_use]
pub fn data_key(
    path: &NodePath,
    chunk_indices: &[u64],
    separator: ChunkKeySeparator,
) -> StoreKey {
    let chunk_key = if chunk_indices.is_empty() {
        "0".to_string()
    } else {
        chunk_indices
            .iter()
            .map(std::string::ToString::to_string)
            .collect::<Vec<String>>()
            .join(&separator.to_string())
    };
    let path = path.as_str().strip_prefix('/').unwrap_or(path.as_str());
    if path.is_empty() {
        unsafe { StoreKey::new_unchecked(chunk_key) }
    } else {
        unsafe { StoreKey::new_unchecked(format!("{path}/{chunk_key}")) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_paths() {
        assert!(NodePath::new("/").is_ok());
        assert!(NodePath::new("/array").is_ok());
        assert!(NodePath::new("/group/array").is_ok());
        assert!(NodePath::new("array").is_err());
        assert!(NodePath::new("/array/").is_err());
        assert!(NodePath::new("/group//array").is_err());
    }

    #[test]
    fn meta_keys() {
        assert_eq!(meta_key(&NodePath::root()), StoreKey::new(".zarray").unwrap());
        assert_eq!(
            meta_key(&NodePath::new("/group/array").unwrap()),
            StoreKey::new("group/array/.zarray").unwrap()
        );
    }

    #[test]
    fn data_keys() {
        let path = NodePath::new("/array").unwrap();
        assert_eq!(
            data_key(&path, &[1, 23, 45], ChunkKeySeparator::Dot),
            StoreKey::new("array/1.23.45").unwrap()
        );
        assert_eq!(
            data_key(&path, &[1, 23, 45], ChunkKeySeparator::Slash),
            StoreKey::new("array/1/23/45").unwrap()
        );
        assert_eq!(
            data_key(&NodePath::root(), &[], ChunkKeySeparator::Dot),
            StoreKey::new("0").unwrap()
        );
    }
}

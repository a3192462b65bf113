//! A synchronous in-memory store.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::RwLock;

use crate::storage::{
    Bytes, ListableStorageTraits, MaybeBytes, ReadableStorageTraits, StorageError, StoreKey,
    StoreKeys, StoreKeysPrefixes, StorePrefix, WritableStorageTraits,
};

/// A synchronous in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data_map: RwLock<BTreeMap<StoreKey, Bytes>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReadableStorageTraits for MemoryStore {
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        Ok(self.data_map.read().get(key).cloned())
    }

    fn contains(&self, key: &StoreKey) -> Result<bool, StorageError> {
        Ok(self.data_map.read().contains_key(key))
    }

    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        Ok(self.data_map.read().get(key).map(|bytes| bytes.len() as u64))
    }
}

impl WritableStorageTraits for MemoryStore {
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        self.data_map.write().insert(key.clone(), value);
        Ok(())
    }

    fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        self.data_map.write().remove(key);
        Ok(())
    }
}

impl ListableStorageTraits for MemoryStore {
    fn list(&self) -> Result<StoreKeys, StorageError> {
        Ok(self.data_map.read().keys().cloned().collect())
    }

    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError> {
        Ok(self
            .data_map
            .read()
            .keys()
            .filter(|key| key.has_prefix(prefix))
            .cloned()
            .collect())
    }

    fn list_dir(&self, prefix: &StorePrefix) -> Result<StoreKeysPrefixes, StorageError> {
        let mut keys: StoreKeys = vec![];
        let mut prefixes: BTreeSet<StorePrefix> = BTreeSet::default();
        for key in self.data_map.read().keys() {
            if key.has_prefix(prefix) {
                let key_strip = key.as_str().strip_prefix(prefix.as_str()).unwrap_or("");
                let components: Vec<_> = key_strip.split('/').collect();
                if components.len() > 1 {
                    prefixes.insert(StorePrefix::new(
                        prefix.as_str().to_string() + components[0] + "/",
                    )?);
                } else {
                    keys.push(key.clone());
                }
            }
        }
        let prefixes: Vec<StorePrefix> = prefixes.into_iter().collect();
        Ok(StoreKeysPrefixes { keys, prefixes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_read_write() -> Result<(), Box<dyn std::error::Error>> {
        let store = MemoryStore::new();
        let key = StoreKey::new("a/b")?;
        assert_eq!(store.get(&key)?, None);
        assert!(!store.contains(&key)?);
        store.set(&key, vec![0, 1, 2].into())?;
        assert_eq!(store.get(&key)?, Some(vec![0, 1, 2].into()));
        assert!(store.contains(&key)?);
        assert_eq!(store.size_key(&key)?, Some(3));
        store.erase(&key)?;
        assert_eq!(store.get(&key)?, None);
        store.erase(&key)?;
        Ok(())
    }

    #[test]
    fn memory_store_list() -> Result<(), Box<dyn std::error::Error>> {
        let store = MemoryStore::new();
        store.set(&StoreKey::new("a/b")?, vec![0].into())?;
        store.set(&StoreKey::new("a/c/d")?, vec![0].into())?;
        store.set(&StoreKey::new("e")?, vec![0].into())?;
        assert_eq!(
            store.list()?,
            [
                StoreKey::new("a/b")?,
                StoreKey::new("a/c/d")?,
                StoreKey::new("e")?
            ]
        );
        assert_eq!(
            store.list_prefix(&StorePrefix::new("a/")?)?,
            [StoreKey::new("a/b")?, StoreKey::new("a/c/d")?]
        );
        let dir = store.list_dir(&StorePrefix::new("a/")?)?;
        assert_eq!(dir.keys(), &[StoreKey::new("a/b")?]);
        assert_eq!(dir.prefixes(), &[StorePrefix::new("a/c/")?]);
        Ok(())
    }
}

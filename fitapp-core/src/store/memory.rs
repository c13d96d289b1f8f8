use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};

use super::{Storage, StorageWrite};

/// In-process storage. Clones share the same map, so a clone can stand in for
/// the same store after a simulated reload.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.lock().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self
            .items
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        items.remove(key);
        Ok(())
    }

    fn write_batch(&self, writes: &[StorageWrite<'_>]) -> Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        for write in writes {
            match write {
                StorageWrite::Set(key, value) => {
                    items.insert(key.to_string(), value.to_string());
                }
                StorageWrite::Remove(key) => {
                    items.remove(*key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_items() {
        let storage = MemoryStorage::new();
        let reloaded = storage.clone();
        storage.set_item("slot", "1").unwrap();
        assert_eq!(reloaded.get_item("slot").unwrap().as_deref(), Some("1"));

        reloaded.remove_item("slot").unwrap();
        assert!(storage.is_empty());
        reloaded.remove_item("slot").unwrap();
    }

    #[test]
    fn batch_sets_and_removes() {
        let storage = MemoryStorage::new();
        storage.set_item("old", "1").unwrap();
        storage
            .write_batch(&[StorageWrite::Set("new", "2"), StorageWrite::Remove("old")])
            .unwrap();
        assert_eq!(storage.get_item("new").unwrap().as_deref(), Some("2"));
        assert_eq!(storage.get_item("old").unwrap(), None);
        assert_eq!(storage.len(), 1);
    }
}

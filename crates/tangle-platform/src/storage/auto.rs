//! Storage backend selection.
//!
//! Honors the configured preference and falls back to memory when the
//! persistent backend cannot be opened, so the app always starts.

use std::rc::Rc;

use tangle_core::ports::StoragePort;
use tangle_types::config::StorageBackendType;

use super::{IndexedDbStorage, MemoryStorage};

/// Open the storage backend for the given preference.
pub async fn open_storage(preference: StorageBackendType) -> Rc<dyn StoragePort> {
    match preference {
        StorageBackendType::Memory => {
            log::info!("Storage backend: memory");
            Rc::new(MemoryStorage::new())
        }
        StorageBackendType::IndexedDb | StorageBackendType::Auto => {
            match IndexedDbStorage::open().await {
                Ok(idb) => {
                    log::info!("Storage backend: IndexedDB");
                    Rc::new(idb)
                }
                Err(e) => {
                    log::warn!("IndexedDB unavailable ({}), falling back to memory", e);
                    Rc::new(MemoryStorage::new())
                }
            }
        }
    }
}

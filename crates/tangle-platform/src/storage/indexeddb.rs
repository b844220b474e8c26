//! IndexedDB storage backend.
//! Persistent across page reloads; available in all modern browsers.
//! The callback-based IDB API is bridged to futures by wrapping each
//! request in a JS Promise.

use async_trait::async_trait;
use js_sys::{Array, Promise, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{IdbDatabase, IdbRequest, IdbTransactionMode};

use tangle_core::ports::StoragePort;
use tangle_types::{ChatError, Result};

const DB_NAME: &str = "tangle";
const STORE_NAME: &str = "kv";
const DB_VERSION: u32 = 1;

fn idb_err(context: &str, e: impl std::fmt::Debug) -> ChatError {
    ChatError::Storage(format!("{}: {:?}", context, e))
}

pub struct IndexedDbStorage {
    db: IdbDatabase,
}

impl IndexedDbStorage {
    /// Open (or create) the database and its key-value object store.
    pub async fn open() -> Result<Self> {
        let window =
            web_sys::window().ok_or_else(|| ChatError::Storage("no window object".to_string()))?;
        let factory = window
            .indexed_db()
            .map_err(|e| idb_err("indexedDB", e))?
            .ok_or_else(|| ChatError::Storage("IndexedDB not available".to_string()))?;

        let open_req = factory
            .open_with_u32(DB_NAME, DB_VERSION)
            .map_err(|e| idb_err("open", e))?;

        // First open (or version bump) creates the object store.
        let upgrade_req = open_req.clone();
        let onupgrade = Closure::once(move |_: web_sys::Event| {
            if let Ok(result) = upgrade_req.result() {
                if let Ok(db) = result.dyn_into::<IdbDatabase>() {
                    let _ = db.create_object_store(STORE_NAME);
                }
            }
        });
        open_req.set_onupgradeneeded(Some(onupgrade.as_ref().unchecked_ref()));
        onupgrade.forget();

        let db = JsFuture::from(promisify(open_req.unchecked_into()))
            .await
            .map_err(|e| idb_err("open await", e))?
            .dyn_into::<IdbDatabase>()
            .map_err(|e| idb_err("open result", e))?;

        Ok(Self { db })
    }

    fn object_store(&self, mode: IdbTransactionMode) -> Result<web_sys::IdbObjectStore> {
        let tx = self
            .db
            .transaction_with_str_and_mode(STORE_NAME, mode)
            .map_err(|e| idb_err("transaction", e))?;
        tx.object_store(STORE_NAME)
            .map_err(|e| idb_err("object_store", e))
    }
}

#[async_trait(?Send)]
impl StoragePort for IndexedDbStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let store = self.object_store(IdbTransactionMode::Readonly)?;
        let req = store
            .get(&JsValue::from_str(key))
            .map_err(|e| idb_err("get", e))?;

        let result = JsFuture::from(promisify(req))
            .await
            .map_err(|e| idb_err("get await", e))?;
        if result.is_undefined() || result.is_null() {
            return Ok(None);
        }
        Ok(Some(Uint8Array::new(&result).to_vec()))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let store = self.object_store(IdbTransactionMode::Readwrite)?;
        let req = store
            .put_with_key(&Uint8Array::from(value), &JsValue::from_str(key))
            .map_err(|e| idb_err("put", e))?;
        JsFuture::from(promisify(req))
            .await
            .map_err(|e| idb_err("put await", e))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let store = self.object_store(IdbTransactionMode::Readwrite)?;
        let req = store
            .delete(&JsValue::from_str(key))
            .map_err(|e| idb_err("delete", e))?;
        JsFuture::from(promisify(req))
            .await
            .map_err(|e| idb_err("delete await", e))?;
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let store = self.object_store(IdbTransactionMode::Readonly)?;
        let req = store.get_all_keys().map_err(|e| idb_err("keys", e))?;

        let result = JsFuture::from(promisify(req))
            .await
            .map_err(|e| idb_err("keys await", e))?;
        let array: Array = result.dyn_into().map_err(|e| idb_err("keys result", e))?;

        let mut keys = Vec::new();
        for i in 0..array.length() {
            if let Some(key) = array.get(i).as_string() {
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }

    fn backend_name(&self) -> &str {
        "indexeddb"
    }
}

/// Bridge one IdbRequest to a Promise resolving with its result.
fn promisify(req: IdbRequest) -> Promise {
    let success_req = req.clone();
    let wired_req = req;

    Promise::new(&mut move |resolve, reject| {
        let inner = success_req.clone();
        let onsuccess = Closure::once(move |_: web_sys::Event| {
            let _ = resolve.call1(
                &JsValue::NULL,
                &inner.result().unwrap_or(JsValue::UNDEFINED),
            );
        });
        let onerror = Closure::once(move |_: web_sys::Event| {
            let _ = reject.call1(&JsValue::NULL, &JsValue::from_str("IDB request failed"));
        });
        wired_req.set_onsuccess(Some(onsuccess.as_ref().unchecked_ref()));
        wired_req.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onsuccess.forget();
        onerror.forget();
    })
}

//! `chrome.storage` behind the core's `KeyValueStore`.
//!
//! Both areas are read once at start-up into a snapshot. Reads are served
//! from the snapshot, writes update it and go out asynchronously.

use std::collections::HashMap;

use js_sys::{Object, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use wecomment_core::config::{BACKEND_KEY, TOKEN_KEY};
use wecomment_core::storage::{KeyValueStore, Scope};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "sync"], js_name = get)]
    fn sync_get(keys: &JsValue) -> Result<Promise, JsValue>;
    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "sync"], js_name = set)]
    fn sync_set(items: &JsValue) -> Result<Promise, JsValue>;
    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "sync"], js_name = remove)]
    fn sync_remove(keys: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = get)]
    fn local_get(keys: &JsValue) -> Result<Promise, JsValue>;
    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = set)]
    fn local_set(items: &JsValue) -> Result<Promise, JsValue>;
    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = remove)]
    fn local_remove(keys: &JsValue) -> Result<Promise, JsValue>;
}

fn area_get(scope: Scope, keys: &JsValue) -> Result<Promise, JsValue> {
    match scope {
        Scope::Sync => sync_get(keys),
        Scope::Local => local_get(keys),
    }
}

fn area_set(scope: Scope, items: &JsValue) -> Result<Promise, JsValue> {
    match scope {
        Scope::Sync => sync_set(items),
        Scope::Local => local_set(items),
    }
}

fn area_remove(scope: Scope, keys: &JsValue) -> Result<Promise, JsValue> {
    match scope {
        Scope::Sync => sync_remove(keys),
        Scope::Local => local_remove(keys),
    }
}

async fn read(scope: Scope, key: &str) -> Result<Option<String>, JsValue> {
    let items = JsFuture::from(area_get(scope, &JsValue::from_str(key))?).await?;
    Ok(Reflect::get(&items, &JsValue::from_str(key))?.as_string())
}

fn write_through(key: &str, pending: Result<Promise, JsValue>) {
    let key = key.to_string();
    match pending {
        Ok(promise) => spawn_local(async move {
            if let Err(err) = JsFuture::from(promise).await {
                log::warn!("storage write {key} failed: {err:?}");
            }
        }),
        Err(err) => log::warn!("storage write {key} failed: {err:?}"),
    }
}

#[derive(Debug, Default)]
pub struct ChromeStorage {
    snapshot: HashMap<(Scope, String), String>,
}

impl ChromeStorage {
    pub async fn load() -> Self {
        let mut store = Self::default();
        for (scope, key) in [(Scope::Sync, BACKEND_KEY), (Scope::Local, TOKEN_KEY)] {
            match read(scope, key).await {
                Ok(Some(value)) => {
                    store.snapshot.insert((scope, key.to_string()), value);
                }
                Ok(None) => {}
                Err(err) => log::warn!("storage read {key} failed: {err:?}"),
            }
        }
        store
    }
}

impl KeyValueStore for ChromeStorage {
    fn get(&self, scope: Scope, key: &str) -> Option<String> {
        self.snapshot.get(&(scope, key.to_string())).cloned()
    }

    fn set(&mut self, scope: Scope, key: &str, value: &str) {
        self.snapshot.insert((scope, key.to_string()), value.to_string());
        let items = Object::new();
        if let Err(err) = Reflect::set(&items, &JsValue::from_str(key), &JsValue::from_str(value)) {
            log::warn!("storage write {key} failed: {err:?}");
            return;
        }
        write_through(key, area_set(scope, &items));
    }

    fn remove(&mut self, scope: Scope, key: &str) {
        self.snapshot.remove(&(scope, key.to_string()));
        write_through(key, area_remove(scope, &JsValue::from_str(key)));
    }
}
